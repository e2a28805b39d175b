//! Settings/secrets ports (`spec.md` §6: `system/settings.yaml`, `system/secrets.yaml`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAliasConfig {
    pub alias: String,
    pub provider: String,
    pub required_secret: String,
    pub default_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub required_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub default_api_timeout_secs: u64,
    pub passthrough_runs_default: Option<u32>,
    pub week_start_day: Option<String>,
    pub models: Vec<ModelAliasConfig>,
    pub tools: Vec<ToolConfig>,
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, AppError>;
}

#[async_trait]
pub trait SecretsStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<String>, AppError>;
}
