//! File-backed `JobStore` (`system/jobs.json`).

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::scheduler::SchedulerJob;
use crate::domain::AppError;
use crate::ports::JobStore;

use super::json_file::JsonFile;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JobRecord {
    job: SchedulerJob,
    source_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct JobTable(BTreeMap<String, JobRecord>);

pub struct FileJobStore {
    file: JsonFile,
}

impl FileJobStore {
    pub fn new(system_root: PathBuf) -> Self {
        Self { file: JsonFile::new(system_root.join("jobs.json")) }
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn list(&self) -> Result<Vec<SchedulerJob>, AppError> {
        let table: JobTable = self.file.read().await?;
        Ok(table.0.into_values().map(|record| record.job).collect())
    }

    async fn upsert(&self, job: SchedulerJob, source_hash: String) -> Result<(), AppError> {
        let mut table: JobTable = self.file.read().await?;
        table.0.insert(job.job_id.as_str().to_string(), JobRecord { job, source_hash });
        self.file.write(&table).await
    }

    async fn remove(&self, job_id: &str) -> Result<(), AppError> {
        let mut table: JobTable = self.file.read().await?;
        table.0.remove(job_id);
        self.file.write(&table).await
    }

    async fn source_hash_of(&self, job_id: &str) -> Result<Option<String>, AppError> {
        let table: JobTable = self.file.read().await?;
        Ok(table.0.get(job_id).map(|r| r.source_hash.clone()))
    }
}
