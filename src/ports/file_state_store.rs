//! File State Tracker persistence port (`spec.md` §4.9).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::file_state::FileStateRecord;
use crate::domain::identifiers::WorkflowGlobalId;
use crate::domain::AppError;

#[async_trait]
pub trait FileStateStore: Send + Sync {
    /// Batched write at step end (`spec.md` §4.9).
    async fn record_consumed(
        &self,
        workflow_id: &WorkflowGlobalId,
        pattern_literal: &str,
        entries: Vec<(String, String, DateTime<Utc>)>,
    ) -> Result<(), AppError>;

    async fn lookup(
        &self,
        workflow_id: &WorkflowGlobalId,
        pattern_literal: &str,
        path: &str,
    ) -> Result<Option<FileStateRecord>, AppError>;
}
