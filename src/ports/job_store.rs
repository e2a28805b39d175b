//! Scheduler job persistence port (`spec.md` §3, §4.5).

use async_trait::async_trait;

use crate::domain::scheduler::SchedulerJob;
use crate::domain::AppError;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SchedulerJob>, AppError>;
    async fn upsert(&self, job: SchedulerJob, source_hash: String) -> Result<(), AppError>;
    async fn remove(&self, job_id: &str) -> Result<(), AppError>;
    /// `source_hash` recorded as of the last upsert for this job, used by
    /// the synchronizer to detect template drift independent of the trigger.
    async fn source_hash_of(&self, job_id: &str) -> Result<Option<String>, AppError>;
}
