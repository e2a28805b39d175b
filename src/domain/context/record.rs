//! `ContextSummaryRecord` (`spec.md` §3) and the context-step cache key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identifiers::SessionId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSummaryRecord {
    pub session_id: SessionId,
    pub section_index: usize,
    pub section_name: String,
    pub template_hash: String,
    pub model_alias: String,
    pub input_payload: String,
    pub rendered_prompt: String,
    pub raw_output: String,
    pub parsed_output: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Cache key = `(vault, template_path, section_index, section_name,
/// template_source_hash)` (`spec.md` §4.2 and §4.7). Miss if the stored hash
/// no longer matches the template's current hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextCacheKey {
    pub vault: String,
    pub template_path: String,
    pub section_index: usize,
    pub section_name: String,
    pub template_source_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextCacheEntry {
    pub summary: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Set once the summary has been persisted as a `ContextSummaryRecord`
    /// for this run, preventing duplicate persistence (`spec.md` §4.7 step 3d).
    pub persisted: bool,
}

impl ContextCacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }
}
