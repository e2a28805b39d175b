//! Pure job-table diffing (`spec.md` §4.5 "Sync algorithm").
//!
//! Takes the persisted job table and the current set of enabled workflows
//! with their prepared triggers, and computes a minimal set of actions. No
//! I/O here; the engine applies the plan against the real scheduler and job
//! store.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::identifiers::WorkflowGlobalId;

use super::job::SchedulerJob;
use super::trigger::TriggerSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Add { job_id: WorkflowGlobalId, trigger: TriggerSpec },
    /// `reschedule_only = true` when only the trigger changed (preserves
    /// next-fire time); `false` when `source_hash` changed too (remove+add).
    Update { job_id: WorkflowGlobalId, trigger: TriggerSpec, reschedule_only: bool },
    Remove { job_id: WorkflowGlobalId },
}

/// One enabled, triggerable workflow as seen by the synchronizer.
pub struct EnabledWorkflow {
    pub global_id: WorkflowGlobalId,
    pub trigger: TriggerSpec,
    pub source_hash: String,
}

/// Compute the minimal diff between the persisted job table and the current
/// set of enabled workflows. `hash_of_job` supplies the `source_hash` that
/// was in effect when each persisted job was created/updated, so trigger and
/// source-hash drift can be distinguished.
pub fn plan(
    persisted: &[SchedulerJob],
    persisted_hashes: &BTreeMap<WorkflowGlobalId, String>,
    enabled: &[EnabledWorkflow],
) -> Vec<SyncAction> {
    let mut actions = Vec::new();
    let persisted_by_id: BTreeMap<&WorkflowGlobalId, &SchedulerJob> =
        persisted.iter().map(|job| (&job.job_id, job)).collect();
    let enabled_ids: BTreeSet<&WorkflowGlobalId> = enabled.iter().map(|w| &w.global_id).collect();

    for workflow in enabled {
        match persisted_by_id.get(&workflow.global_id) {
            None => actions.push(SyncAction::Add { job_id: workflow.global_id.clone(), trigger: workflow.trigger.clone() }),
            Some(existing) => {
                let trigger_changed = existing.trigger_string != workflow.trigger.as_trigger_string();
                let hash_changed = persisted_hashes
                    .get(&workflow.global_id)
                    .map(|stored| stored != &workflow.source_hash)
                    .unwrap_or(true);
                if trigger_changed || hash_changed {
                    actions.push(SyncAction::Update {
                        job_id: workflow.global_id.clone(),
                        trigger: workflow.trigger.clone(),
                        reschedule_only: trigger_changed && !hash_changed,
                    });
                }
            }
        }
    }

    for job in persisted {
        if !enabled_ids.contains(&job.job_id) {
            actions.push(SyncAction::Remove { job_id: job.job_id.clone() });
        }
    }

    actions
}
