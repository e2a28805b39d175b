//! `VaultRepository` implementation backed by the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::domain::pattern::VaultFileMeta;
use crate::domain::AppError;
use crate::ports::{VaultDescriptor, VaultRepository};

use super::path_safety::resolve_within_root;

const VAULTIGNORE_MARKER: &str = ".vaultignore";
const WORKFLOWS_DIR: &str = "Workflows";

/// Filesystem-backed vault repository rooted at the configured data root.
#[derive(Debug, Clone)]
pub struct FilesystemVaultRepository {
    data_root: PathBuf,
}

impl FilesystemVaultRepository {
    pub fn new(data_root: PathBuf) -> Self {
        Self { data_root }
    }

    fn vault_root(&self, vault_id: &str) -> PathBuf {
        self.data_root.join(vault_id)
    }

    async fn resolve(&self, vault_id: &str, path: &str) -> Result<PathBuf, AppError> {
        resolve_within_root(&self.vault_root(vault_id), path)
    }

    async fn metadata_for(root: &Path, full_path: &Path) -> Result<VaultFileMeta, AppError> {
        let meta = fs::metadata(full_path).await?;
        let modified: DateTime<Utc> = meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());
        let created: DateTime<Utc> = meta.created().map(DateTime::<Utc>::from).unwrap_or(modified);
        let relative_path = full_path.strip_prefix(root).unwrap_or(full_path).to_string_lossy().replace('\\', "/");
        Ok(VaultFileMeta { relative_path, created, modified })
    }
}

#[async_trait]
impl VaultRepository for FilesystemVaultRepository {
    async fn list_vaults(&self) -> Result<Vec<VaultDescriptor>, AppError> {
        let mut vaults = Vec::new();
        let mut entries = match fs::read_dir(&self.data_root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(vaults),
            Err(err) => return Err(AppError::from(err)),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if fs::try_exists(entry.path().join(VAULTIGNORE_MARKER)).await.unwrap_or(false) {
                continue;
            }
            vaults.push(VaultDescriptor { vault_id: name.clone(), root_relative_name: name });
        }

        vaults.sort_by(|a, b| a.vault_id.cmp(&b.vault_id));
        Ok(vaults)
    }

    async fn read_file(&self, vault_id: &str, path: &str) -> Result<String, AppError> {
        let full_path = self.resolve(vault_id, path).await?;
        fs::read_to_string(full_path).await.map_err(AppError::from)
    }

    async fn write_file(&self, vault_id: &str, path: &str, content: &str) -> Result<(), AppError> {
        let full_path = self.resolve(vault_id, path).await?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(full_path, content).await.map_err(AppError::from)
    }

    async fn file_exists(&self, vault_id: &str, path: &str) -> bool {
        match self.resolve(vault_id, path).await {
            Ok(full_path) => fs::try_exists(full_path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn file_metadata(&self, vault_id: &str, path: &str) -> Result<VaultFileMeta, AppError> {
        let full_path = self.resolve(vault_id, path).await?;
        Self::metadata_for(&self.vault_root(vault_id), &full_path).await
    }

    async fn list_dir(&self, vault_id: &str, dir: &str) -> Result<Vec<VaultFileMeta>, AppError> {
        let root = self.vault_root(vault_id);
        let full_dir = self.resolve(vault_id, dir).await?;

        let mut entries = match fs::read_dir(&full_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(AppError::from(err)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(Self::metadata_for(&root, &entry.path()).await?);
            }
        }
        Ok(files)
    }

    async fn list_workflow_files(&self, vault_id: &str) -> Result<Vec<String>, AppError> {
        let root = self.vault_root(vault_id);
        let workflows_dir = root.join(WORKFLOWS_DIR);
        let mut files = Vec::new();

        let top = match fs::read_dir(&workflows_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(err) => return Err(AppError::from(err)),
        };
        collect_workflow_files(top, &root, &mut files, 0).await?;
        files.sort();
        Ok(files)
    }

    fn content_hash(&self, content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Recursively walks `Workflows/` to depth 1 beneath it (root + one
/// subfolder), skipping `_`-prefixed subfolders (`spec.md` §4.4).
async fn collect_workflow_files(
    mut entries: fs::ReadDir,
    vault_root: &Path,
    out: &mut Vec<String>,
    depth: u8,
) -> Result<(), AppError> {
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_file() {
            if entry.path().extension().and_then(|e| e.to_str()) == Some("md") {
                let relative = entry.path().strip_prefix(vault_root).unwrap_or(&entry.path()).to_string_lossy().replace('\\', "/");
                out.push(relative);
            }
        } else if file_type.is_dir() && depth < 1 {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('_') {
                continue;
            }
            let sub = fs::read_dir(entry.path()).await?;
            Box::pin(collect_workflow_files(sub, vault_root, out, depth + 1)).await?;
        }
    }
    Ok(())
}
