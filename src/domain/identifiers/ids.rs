//! Validated identifier newtypes.

use serde::{Deserialize, Serialize};

use crate::domain::error::AppError;
use crate::impl_validated_id;

/// A vault's identity: its directory name relative to the data root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VaultId(String);
impl_validated_id!(VaultId, true, AppError::InvalidIdentifier);

/// A workflow's global identity: `{vault}/{relative-path-without-extension}`.
///
/// Stable for a given file path; a rename produces a new `WorkflowGlobalId`
/// and therefore resets `{pending}` state and requires a scheduler resync
/// (`spec.md` §3 invariant, and the Open Question resolution in `DESIGN.md`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowGlobalId(String);

impl WorkflowGlobalId {
    /// Build a global id from a vault id and a vault-relative path with the
    /// `.md` extension already stripped.
    pub fn new(vault: &VaultId, relative_path_no_ext: &str) -> Self {
        Self(format!("{}/{}", vault.as_str(), relative_path_no_ext))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkflowGlobalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A buffer/variable name within a single workflow run or chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferName(String);
impl_validated_id!(BufferName, false, AppError::InvalidIdentifier);

/// A chat session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);
impl_validated_id!(SessionId, true, AppError::InvalidIdentifier);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
