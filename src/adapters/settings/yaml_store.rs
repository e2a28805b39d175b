//! YAML-backed settings/secrets adapters (`spec.md` §6:
//! `system/settings.yaml`, `system/secrets.yaml`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::domain::AppError;
use crate::ports::{SecretsStore, Settings, SettingsStore};

pub struct YamlSettingsStore {
    path: PathBuf,
}

impl YamlSettingsStore {
    pub fn new(system_root: PathBuf) -> Self {
        Self { path: system_root.join("settings.yaml") }
    }
}

#[async_trait]
impl SettingsStore for YamlSettingsStore {
    async fn load(&self) -> Result<Settings, AppError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => serde_yaml::from_str(&content).map_err(|err| AppError::config_error(format!("invalid settings.yaml: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(AppError::from(err)),
        }
    }
}

pub struct YamlSecretsStore {
    path: PathBuf,
}

impl YamlSecretsStore {
    pub fn new(system_root: PathBuf) -> Self {
        Self { path: system_root.join("secrets.yaml") }
    }
}

#[async_trait]
impl SecretsStore for YamlSecretsStore {
    async fn get(&self, name: &str) -> Result<Option<String>, AppError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AppError::from(err)),
        };
        let map: BTreeMap<String, String> =
            serde_yaml::from_str(&content).map_err(|err| AppError::config_error(format!("invalid secrets.yaml: {err}")))?;
        Ok(map.get(name).cloned())
    }
}
