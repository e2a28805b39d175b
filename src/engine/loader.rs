//! Workflow Loader & Vault Scanner (`spec.md` §4.4).

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::identifiers::{VaultId, WorkflowGlobalId};
use crate::domain::workflow::{build_workflow, Workflow, WorkflowParseError};
use crate::domain::AppError;
use crate::ports::VaultRepository;

/// A file-level parse failure, recorded per workflow and surfaced through
/// the status command rather than aborting the scan (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub global_id: WorkflowGlobalId,
    pub error: WorkflowParseError,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub workflows: Vec<Workflow>,
    pub failures: Vec<LoadFailure>,
}

/// Cache keyed by global id, refreshed wholesale on rescan via an atomic
/// pointer swap under a short-held write lock; readers never block on a
/// rescan in progress longer than the swap itself (`spec.md` §5).
#[derive(Default)]
pub struct WorkflowCache {
    inner: RwLock<Arc<BTreeMap<WorkflowGlobalId, Workflow>>>,
}

impl WorkflowCache {
    pub fn get(&self, id: &WorkflowGlobalId) -> Option<Workflow> {
        self.inner.read().get(id).cloned()
    }

    pub fn snapshot(&self) -> Arc<BTreeMap<WorkflowGlobalId, Workflow>> {
        self.inner.read().clone()
    }

    pub(crate) fn replace(&self, workflows: &[Workflow]) {
        let map: BTreeMap<WorkflowGlobalId, Workflow> =
            workflows.iter().map(|w| (w.global_id.clone(), w.clone())).collect();
        *self.inner.write() = Arc::new(map);
    }
}

/// Scan the data root for vaults, parse every `.md` file under `Workflows/`,
/// and refresh `cache` with the result (`spec.md` §4.4).
pub async fn scan_and_load(repo: &dyn VaultRepository, cache: &WorkflowCache) -> Result<LoadReport, AppError> {
    let mut report = LoadReport::default();

    for descriptor in repo.list_vaults().await? {
        let Ok(vault_id) = VaultId::new(&descriptor.vault_id) else { continue };

        for relative_path in repo.list_workflow_files(&descriptor.vault_id).await? {
            let without_ext = relative_path.strip_suffix(".md").unwrap_or(&relative_path);
            let global_id = WorkflowGlobalId::new(&vault_id, without_ext);

            let content = repo.read_file(&descriptor.vault_id, &relative_path).await?;
            match build_workflow(global_id.clone(), &content) {
                Ok(workflow) => report.workflows.push(workflow),
                Err(error) => report.failures.push(LoadFailure { global_id, error }),
            }
        }
    }

    report.workflows.sort_by(|a, b| a.global_id.cmp(&b.global_id));
    cache.replace(&report.workflows);
    Ok(report)
}
