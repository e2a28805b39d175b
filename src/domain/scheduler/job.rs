//! Persisted scheduler job record (`spec.md` §3, "Scheduler Job").

use serde::{Deserialize, Serialize};

use crate::domain::identifiers::WorkflowGlobalId;

/// Job args are lightweight: serializable primitives only, never large
/// objects (`spec.md` §4.5 step 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobArgs {
    pub workflow_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerJob {
    pub job_id: WorkflowGlobalId,
    pub trigger_string: String,
    pub callable_ref: String,
    pub args: JobArgs,
}

impl SchedulerJob {
    pub fn new(job_id: WorkflowGlobalId, trigger_string: String) -> Self {
        let args = JobArgs { workflow_id: job_id.as_str().to_string() };
        Self { job_id, trigger_string, callable_ref: "run_step_workflow".to_string(), args }
    }
}
