//! Vault-rooted filesystem port.
//!
//! All `path` arguments are vault-relative. Implementations must reject
//! paths that escape the vault root boundary.

use async_trait::async_trait;

use crate::domain::pattern::{VaultDirLookup, VaultFileMeta};
use crate::domain::AppError;

#[derive(Debug, Clone)]
pub struct VaultDescriptor {
    pub vault_id: String,
    pub root_relative_name: String,
}

#[async_trait]
pub trait VaultRepository: Send + Sync {
    /// Enumerate top-level vault directories under the data root, skipping
    /// any directory containing `.vaultignore` (`spec.md` §4.4).
    async fn list_vaults(&self) -> Result<Vec<VaultDescriptor>, AppError>;

    async fn read_file(&self, vault_id: &str, path: &str) -> Result<String, AppError>;

    async fn write_file(&self, vault_id: &str, path: &str, content: &str) -> Result<(), AppError>;

    async fn file_exists(&self, vault_id: &str, path: &str) -> bool;

    async fn file_metadata(&self, vault_id: &str, path: &str) -> Result<VaultFileMeta, AppError>;

    /// List `.md` files directly in `dir` (non-recursive), vault-relative.
    async fn list_dir(&self, vault_id: &str, dir: &str) -> Result<Vec<VaultFileMeta>, AppError>;

    /// Scan `Workflows/` at depth <= 2 (root + one subfolder), skipping
    /// subfolders whose name begins with `_` (`spec.md` §4.4).
    async fn list_workflow_files(&self, vault_id: &str) -> Result<Vec<String>, AppError>;

    fn content_hash(&self, content: &str) -> String;
}

/// Adapts a synchronous, single-vault view of a `VaultRepository` to the
/// pattern resolver's `VaultDirLookup`, used once the vault root and
/// `ref_date` are already fixed for a run.
pub struct VaultLookupView<'a> {
    pub entries: &'a [VaultFileMeta],
}

impl VaultDirLookup for VaultLookupView<'_> {
    fn list_dir(&self, dir: &str) -> Result<Vec<VaultFileMeta>, crate::domain::pattern::PatternError> {
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
        Ok(self
            .entries
            .iter()
            .filter(|meta| {
                meta.relative_path
                    .strip_prefix(prefix.as_str())
                    .map(|rest| !rest.contains('/'))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn file_exists(&self, path: &str) -> bool {
        self.entries.iter().any(|meta| meta.relative_path == path)
    }
}
