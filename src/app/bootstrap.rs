//! Bootstrap: resolves data/system roots and assembles the adapters behind
//! every port before any other module touches a path (`spec.md` §5
//! "Bootstrap/teardown", §6 "Environment").

use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::filesystem::FilesystemVaultRepository;
use crate::adapters::llm::RoutingLlmClient;
use crate::adapters::settings::{YamlSecretsStore, YamlSettingsStore};
use crate::adapters::store::{FileContextStore, FileFileStateStore, FileJobStore};
use crate::domain::AppError;
use crate::ports::{LlmClient, Settings, SettingsStore};

pub struct AppContext {
    pub data_root: PathBuf,
    pub system_root: PathBuf,
    pub repo: FilesystemVaultRepository,
    pub secrets_store: YamlSecretsStore,
    pub context_store: FileContextStore,
    pub file_state_store: FileFileStateStore,
    pub job_store: FileJobStore,
    pub llm: Arc<dyn LlmClient>,
    pub settings: Settings,
}

/// Reads `CONTAINER_DATA_ROOT`/`CONTAINER_SYSTEM_ROOT`, builds every
/// adapter, and loads `settings.yaml` once. Fails loudly if either root is
/// unset; there is no env-based fallback at runtime.
pub async fn bootstrap() -> Result<AppContext, AppError> {
    let data_root = required_env("CONTAINER_DATA_ROOT")?;
    let system_root = required_env("CONTAINER_SYSTEM_ROOT")?;

    let settings_store = YamlSettingsStore::new(system_root.clone());
    let settings = settings_store.load().await?;
    let secrets_store = YamlSecretsStore::new(system_root.clone());
    let llm: Arc<dyn LlmClient> = Arc::new(RoutingLlmClient::build(&settings.models, &secrets_store).await?);

    Ok(AppContext {
        repo: FilesystemVaultRepository::new(data_root.clone()),
        context_store: FileContextStore::new(system_root.clone()),
        file_state_store: FileFileStateStore::new(system_root.clone()),
        job_store: FileJobStore::new(system_root.clone()),
        secrets_store,
        llm,
        settings,
        data_root,
        system_root,
    })
}

pub fn required_env(name: &str) -> Result<PathBuf, AppError> {
    std::env::var(name).map(PathBuf::from).map_err(|_| AppError::ConfigurationError(format!("{name} must be set before bootstrap")))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;

    /// Guarded with `serial` since env vars are process-global state shared
    /// across tests in this binary.
    #[tokio::test]
    #[serial]
    async fn missing_system_root_fails_loudly() {
        std::env::remove_var("CONTAINER_DATA_ROOT");
        std::env::remove_var("CONTAINER_SYSTEM_ROOT");

        let result = bootstrap().await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[tokio::test]
    #[serial]
    async fn roots_present_with_no_settings_file_yields_defaults() {
        let data_dir = tempdir().unwrap();
        let system_dir = tempdir().unwrap();
        std::env::set_var("CONTAINER_DATA_ROOT", data_dir.path());
        std::env::set_var("CONTAINER_SYSTEM_ROOT", system_dir.path());

        let ctx = bootstrap().await.unwrap();
        assert_eq!(ctx.data_root, data_dir.path());
        assert!(ctx.settings.models.is_empty());

        std::env::remove_var("CONTAINER_DATA_ROOT");
        std::env::remove_var("CONTAINER_SYSTEM_ROOT");
    }
}
