//! File-backed `FileStateStore` (`system/file_state.json`).
//!
//! `record_consumed` is serialized per `(workflow_id, pattern_literal)` via a
//! keyed mutex set, satisfying the concurrency invariant in `spec.md` §5
//! even though the backing store itself has no row-level locking.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::file_state::FileStateRecord;
use crate::domain::identifiers::WorkflowGlobalId;
use crate::domain::AppError;
use crate::ports::FileStateStore;

use super::json_file::JsonFile;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct FileStateTable(BTreeMap<String, FileStateRecord>);

fn table_key(workflow_id: &WorkflowGlobalId, pattern_literal: &str, path: &str) -> String {
    format!("{}\u{1}{pattern_literal}\u{1}{path}", workflow_id.as_str())
}

pub struct FileFileStateStore {
    file: JsonFile,
    site_locks: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

impl FileFileStateStore {
    pub fn new(system_root: PathBuf) -> Self {
        Self { file: JsonFile::new(system_root.join("file_state.json")), site_locks: Mutex::new(BTreeMap::new()) }
    }

    fn lock_for(&self, workflow_id: &WorkflowGlobalId, pattern_literal: &str) -> Arc<Mutex<()>> {
        let key = format!("{}\u{1}{pattern_literal}", workflow_id.as_str());
        let mut locks = self.site_locks.lock();
        locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

#[async_trait]
impl FileStateStore for FileFileStateStore {
    async fn record_consumed(
        &self,
        workflow_id: &WorkflowGlobalId,
        pattern_literal: &str,
        entries: Vec<(String, String, DateTime<Utc>)>,
    ) -> Result<(), AppError> {
        let site_lock = self.lock_for(workflow_id, pattern_literal);
        let _guard = site_lock.lock();

        let mut table: FileStateTable = self.file.read().await?;
        for (path, content_sha256, marked_at) in entries {
            let record = FileStateRecord {
                workflow_id: workflow_id.clone(),
                pattern_literal: pattern_literal.to_string(),
                content_sha256,
                path: path.clone(),
                marked_at,
            };
            table.0.insert(table_key(workflow_id, pattern_literal, &path), record);
        }
        self.file.write(&table).await
    }

    async fn lookup(
        &self,
        workflow_id: &WorkflowGlobalId,
        pattern_literal: &str,
        path: &str,
    ) -> Result<Option<FileStateRecord>, AppError> {
        let table: FileStateTable = self.file.read().await?;
        Ok(table.0.get(&table_key(workflow_id, pattern_literal, path)).cloned())
    }
}
