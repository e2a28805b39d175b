//! Abstraction the pattern resolver uses to list vault directory contents.
//!
//! Kept local to `domain::pattern` (rather than depending on `ports`) so the
//! resolver stays a pure, independently testable module; `ports::VaultRepository`
//! adapters implement this trait directly.

use chrono::{DateTime, Utc};

use super::error::PatternError;

/// Metadata for one file discovered while resolving a file-collection token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFileMeta {
    /// Path relative to the vault root.
    pub relative_path: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Non-recursive directory listing within a vault.
pub trait VaultDirLookup {
    /// List the direct children (files only) of `dir` (a vault-relative
    /// directory path, `""` for the vault root). Returns an empty list if
    /// the directory does not exist.
    fn list_dir(&self, dir: &str) -> Result<Vec<VaultFileMeta>, PatternError>;

    /// Whether a vault-relative file path exists.
    fn file_exists(&self, path: &str) -> bool;
}
