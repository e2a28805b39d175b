//! `FileStateRecord` and the processed/pending invariants (`spec.md` §3, §4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identifiers::WorkflowGlobalId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStateRecord {
    pub workflow_id: WorkflowGlobalId,
    pub pattern_literal: String,
    pub content_sha256: String,
    pub path: String,
    pub marked_at: DateTime<Utc>,
}

/// A file is processed for a pattern if either the stored hash matches the
/// current hash, OR the stored `(path, marked_at)` matches and the file's
/// mtime is at or before `marked_at` (`spec.md` §3, §4.9).
///
/// The mtime leg is what keeps an in-run self-edit from re-queuing a file:
/// the stored hash is the pre-edit content, but `marked_at` is recorded
/// after the mutation, so `mtime <= marked_at` still holds.
pub fn is_processed(record: Option<&FileStateRecord>, path: &str, current_hash: &str, mtime: DateTime<Utc>) -> bool {
    let Some(record) = record else { return false };

    if record.content_sha256 == current_hash {
        return true;
    }

    record.path == path && mtime <= record.marked_at
}
