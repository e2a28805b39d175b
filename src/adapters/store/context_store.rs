//! File-backed `ContextStore` (`system/context_summaries.json`,
//! `system/context_cache.json`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::context::{ContextCacheEntry, ContextCacheKey, ContextSummaryRecord};
use crate::domain::identifiers::SessionId;
use crate::domain::AppError;
use crate::ports::ContextStore;

use super::json_file::JsonFile;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SummaryTable(Vec<ContextSummaryRecord>);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntryRecord {
    key: ContextCacheKeyRecord,
    entry: ContextCacheEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ContextCacheKeyRecord {
    vault: String,
    template_path: String,
    section_index: usize,
    section_name: String,
    template_source_hash: String,
}

impl From<&ContextCacheKey> for ContextCacheKeyRecord {
    fn from(key: &ContextCacheKey) -> Self {
        Self {
            vault: key.vault.clone(),
            template_path: key.template_path.clone(),
            section_index: key.section_index,
            section_name: key.section_name.clone(),
            template_source_hash: key.template_source_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheTable(BTreeMap<String, CacheEntryRecord>);

fn cache_slot(key: &ContextCacheKey) -> String {
    format!("{}\u{1}{}\u{1}{}\u{1}{}\u{1}{}", key.vault, key.template_path, key.section_index, key.section_name, key.template_source_hash)
}

pub struct FileContextStore {
    summaries: JsonFile,
    cache: JsonFile,
}

impl FileContextStore {
    pub fn new(system_root: PathBuf) -> Self {
        Self {
            summaries: JsonFile::new(system_root.join("context_summaries.json")),
            cache: JsonFile::new(system_root.join("context_cache.json")),
        }
    }
}

#[async_trait]
impl ContextStore for FileContextStore {
    async fn persist_summary(&self, record: ContextSummaryRecord) -> Result<(), AppError> {
        let mut table: SummaryTable = self.summaries.read().await?;
        table.0.push(record);
        self.summaries.write(&table).await
    }

    async fn cache_get(&self, key: &ContextCacheKey) -> Result<Option<ContextCacheEntry>, AppError> {
        let table: CacheTable = self.cache.read().await?;
        Ok(table.0.get(&cache_slot(key)).map(|record| record.entry.clone()))
    }

    async fn cache_put(&self, key: ContextCacheKey, entry: ContextCacheEntry) -> Result<(), AppError> {
        let mut table: CacheTable = self.cache.read().await?;
        table.0.insert(cache_slot(&key), CacheEntryRecord { key: ContextCacheKeyRecord::from(&key), entry });
        self.cache.write(&table).await
    }

    async fn recent_summaries(&self, session_id: &SessionId, section_name: &str, limit: u32) -> Result<Vec<ContextSummaryRecord>, AppError> {
        let table: SummaryTable = self.summaries.read().await?;
        let mut matching: Vec<ContextSummaryRecord> =
            table.0.into_iter().filter(|r| &r.session_id == session_id && r.section_name == section_name).collect();
        matching.sort_by_key(|r| r.created_at);
        let keep_from = matching.len().saturating_sub(limit as usize);
        Ok(matching.split_off(keep_from))
    }
}
