//! Step Workflow Engine: per-run orchestrator (`spec.md` §4.6).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::buffer::{BufferStore, WriteMode as BufferWriteMode};
use crate::domain::directive::{
    normalize_md_extension, parse_section_directives, DirectiveMap, InputDirective, Scheme, ToolsDirective, WriteMode as DirectiveWriteMode,
};
use crate::domain::file_state::{is_processed, FileStateRecord};
use crate::domain::identifiers::{BufferName, VaultId, WorkflowGlobalId};
use crate::domain::pattern::{resolve_dir_prefix, resolve_many, resolve_single, PendingFilter, VaultFileMeta, WeekStart};
use crate::domain::workflow::{Section, Workflow};
use crate::domain::AppError;
use crate::ports::{CompletionRequest, FileStateStore, LlmClient, SecretsStore, Settings, ToolDescriptor, VaultLookupView, VaultRepository};

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Outcome of a single section's evaluation within a run.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Skipped { reason: String },
    RanNoOutput,
    RanWithOutput { path: Option<String>, buffer: Option<String> },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct SectionReport {
    pub section_name: String,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub workflow_id: WorkflowGlobalId,
    pub started_at: DateTime<Utc>,
    pub sections: Vec<SectionReport>,
}

/// A cached `(global_id, source_hash) -> parsed sections` entry, avoiding a
/// reparse of unchanged directive blocks across runs (`spec.md` §4.6 step 1).
#[derive(Default)]
struct DirectiveCache {
    inner: RwLock<BTreeMap<(WorkflowGlobalId, String), Vec<Section>>>,
}

impl DirectiveCache {
    fn get_or_parse(&self, workflow: &Workflow) -> Result<Vec<Section>, AppError> {
        let key = (workflow.global_id.clone(), workflow.source_hash.clone());
        if let Some(cached) = self.inner.read().get(&key) {
            return Ok(cached.clone());
        }

        let mut parsed = Vec::with_capacity(workflow.sections.len());
        for raw in &workflow.sections {
            let (directives, body_template) = parse_section_directives(&raw.name, &raw.body)?;
            parsed.push(Section { name: raw.name.clone(), directives, body_template });
        }
        self.inner.write().insert(key, parsed.clone());
        Ok(parsed)
    }
}

/// Synchronous pending filter built from data fetched ahead of time, since
/// `domain::pattern::PendingFilter` cannot perform async I/O itself.
struct PrefetchedPendingFilter<'a> {
    records: &'a BTreeMap<String, Option<FileStateRecord>>,
    hashes: &'a BTreeMap<String, String>,
}

impl PendingFilter for PrefetchedPendingFilter<'_> {
    fn filter_unprocessed(&self, candidates: Vec<VaultFileMeta>) -> Vec<VaultFileMeta> {
        candidates
            .into_iter()
            .filter(|candidate| {
                let record = self.records.get(&candidate.relative_path).and_then(|r| r.as_ref());
                let hash = self.hashes.get(&candidate.relative_path).cloned().unwrap_or_default();
                !is_processed(record, &candidate.relative_path, &hash, candidate.modified)
            })
            .collect()
    }
}

pub struct StepEngine<'a> {
    pub repo: &'a dyn VaultRepository,
    pub file_state: &'a dyn FileStateStore,
    pub secrets: &'a dyn SecretsStore,
    pub llm: &'a dyn LlmClient,
    directive_cache: DirectiveCache,
}

impl<'a> StepEngine<'a> {
    pub fn new(repo: &'a dyn VaultRepository, file_state: &'a dyn FileStateStore, secrets: &'a dyn SecretsStore, llm: &'a dyn LlmClient) -> Self {
        Self { repo, file_state, secrets, llm, directive_cache: DirectiveCache::default() }
    }

    /// Run one workflow end to end (`spec.md` §4.6).
    pub async fn run(&self, workflow: &Workflow, vault_id: &VaultId, settings: &Settings, now: DateTime<Utc>) -> RunReport {
        let week_start = WeekStart::from(workflow.week_start_day);
        let ref_date = now.date_naive();
        let mut buffers = BufferStore::new();
        let mut created_outputs: BTreeSet<String> = BTreeSet::new();
        let mut report = RunReport { workflow_id: workflow.global_id.clone(), started_at: now, sections: Vec::new() };

        let parsed = match self.directive_cache.get_or_parse(workflow) {
            Ok(parsed) => parsed,
            Err(err) => {
                report.sections.push(SectionReport { section_name: "<parse>".to_string(), outcome: StepOutcome::Failed { error: err.to_string() } });
                return report;
            }
        };

        for section in &parsed {
            let outcome = self
                .run_section(&workflow.global_id, vault_id, section, ref_date, week_start, now, settings, &mut buffers, &mut created_outputs)
                .await;

            match &outcome {
                StepOutcome::Failed { error } => warn!(workflow_id = %workflow.global_id, section = %section.name, error, "step_failed"),
                StepOutcome::Skipped { reason } => info!(workflow_id = %workflow.global_id, section = %section.name, reason, "step_skipped"),
                _ => info!(workflow_id = %workflow.global_id, section = %section.name, "step_ran"),
            }
            report.sections.push(SectionReport { section_name: section.name.clone(), outcome });
        }

        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_section(
        &self,
        workflow_id: &WorkflowGlobalId,
        vault_id: &VaultId,
        section: &Section,
        ref_date: NaiveDate,
        week_start: WeekStart,
        now: DateTime<Utc>,
        settings: &Settings,
        buffers: &mut BufferStore,
        created_outputs: &mut BTreeSet<String>,
    ) -> StepOutcome {
        let directives = &section.directives;
        let body_template = section.body_template.as_str();

        if !section.runs_on(ref_date.weekday()) {
            return StepOutcome::Skipped { reason: "run-on does not match today".to_string() };
        }

        let mut rendered_inputs = Vec::new();
        let mut pending_consumptions: BTreeMap<String, Vec<(String, String, DateTime<Utc>)>> = BTreeMap::new();

        for input in &directives.inputs {
            match self.resolve_input(workflow_id, vault_id, input, ref_date, week_start, now, buffers).await {
                Ok(ResolvedInput::Skip) => return StepOutcome::Skipped { reason: format!("required input '{}' resolved to nothing", input.target) },
                Ok(ResolvedInput::Rendered { text, consumed }) => {
                    rendered_inputs.push(text);
                    if let Some((paths_and_hashes, marked_at)) = consumed {
                        pending_consumptions
                            .entry(input.target.clone())
                            .or_default()
                            .extend(paths_and_hashes.into_iter().map(|(path, hash)| (path, hash, marked_at)));
                    }
                }
                Err(err) => return StepOutcome::Failed { error: err.to_string() },
            }
        }

        let has_output = directives.output.is_some();
        let invokes_llm = !body_template.trim().is_empty() || has_output || !directives.inputs.is_empty();
        if !invokes_llm {
            return StepOutcome::RanNoOutput;
        }

        let model = match directives.model.as_ref() {
            Some(model) => model,
            None => return StepOutcome::Failed { error: "step has no @model directive".to_string() },
        };
        let model_config = match settings.models.iter().find(|m| m.alias == model.alias) {
            Some(config) => config,
            None => return StepOutcome::Failed { error: format!("unknown model alias '{}'", model.alias) },
        };
        match self.secrets.get(&model_config.required_secret).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return StepOutcome::Failed { error: format!("configure {} (required by model alias '{}')", model_config.required_secret, model.alias) }
            }
            Err(err) => return StepOutcome::Failed { error: err.to_string() },
        }

        let tools = match self.resolve_tools(settings, directives.tools.as_ref()).await {
            Ok(tools) => tools,
            Err(err) => return StepOutcome::Failed { error: err.to_string() },
        };

        let mut prompt = body_template.trim().to_string();
        if !rendered_inputs.is_empty() {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str(&rendered_inputs.join("\n\n"));
        }

        let timeout_secs = if model_config.default_timeout_secs > 0 { model_config.default_timeout_secs } else { DEFAULT_LLM_TIMEOUT_SECS };
        let request = CompletionRequest {
            model_alias: model.alias.clone(),
            thinking: model.thinking,
            system_prompt: None,
            prompt,
            tools,
            timeout: std::time::Duration::from_secs(timeout_secs),
        };

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(err) => return StepOutcome::Failed { error: err.to_string() },
        };

        for (pattern_literal, entries) in pending_consumptions {
            if let Err(err) = self.file_state.record_consumed(workflow_id, &pattern_literal, entries).await {
                warn!(workflow_id = %workflow_id, pattern = %pattern_literal, error = %err, "file_state_record_consumed_failed");
            }
        }

        let mut outcome_path = None;
        let mut outcome_buffer = None;

        if let Some(output) = &directives.output {
            match output.scheme {
                Scheme::File => match self
                    .route_file_output(vault_id, &output.target, directives.write_mode.unwrap_or(DirectiveWriteMode::Append), directives.header.as_deref(), &response.raw_text, ref_date, week_start, created_outputs)
                    .await
                {
                    Ok(path) => outcome_path = Some(path),
                    Err(err) => return StepOutcome::Failed { error: err.to_string() },
                },
                Scheme::Variable => match BufferName::new(&output.target) {
                    Ok(name) => {
                        let mode = match directives.write_mode {
                            Some(DirectiveWriteMode::Replace) => BufferWriteMode::Replace,
                            _ => BufferWriteMode::Append,
                        };
                        buffers.put(&name, &response.raw_text, mode, None);
                        outcome_buffer = Some(output.target.clone());
                    }
                    Err(err) => return StepOutcome::Failed { error: err.to_string() },
                },
            }
        }

        StepOutcome::RanWithOutput { path: outcome_path, buffer: outcome_buffer }
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_input(
        &self,
        workflow_id: &WorkflowGlobalId,
        vault_id: &VaultId,
        input: &InputDirective,
        ref_date: NaiveDate,
        week_start: WeekStart,
        now: DateTime<Utc>,
        buffers: &BufferStore,
    ) -> Result<ResolvedInput, AppError> {
        match input.scheme {
            Scheme::Variable => {
                let name = BufferName::new(&input.target)?;
                let content = buffers.get(&name).map(|entry| entry.content.clone()).unwrap_or_default();
                if content.is_empty() {
                    if input.required {
                        return Ok(ResolvedInput::Skip);
                    }
                    warn!(variable = %input.target, "input variable unset, proceeding with empty string");
                }
                Ok(ResolvedInput::Rendered { text: format!("### variable:{}\n{}", input.target, content), consumed: None })
            }
            Scheme::File => self.resolve_file_input(workflow_id, vault_id, input, ref_date, week_start, now).await,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_file_input(
        &self,
        workflow_id: &WorkflowGlobalId,
        vault_id: &VaultId,
        input: &InputDirective,
        ref_date: NaiveDate,
        week_start: WeekStart,
        now: DateTime<Utc>,
    ) -> Result<ResolvedInput, AppError> {
        let is_pending_pattern = input.target.contains("{pending");
        let is_collection = is_pending_pattern || input.target.contains("{latest") || input.target.contains('*');

        let dir = resolve_dir_prefix(&input.target, ref_date, week_start)?;
        let candidates = self.repo.list_dir(vault_id.as_str(), &dir).await?;

        let (records, hashes) = if is_pending_pattern {
            self.prefetch_pending_state(workflow_id, vault_id, &input.target, &candidates).await?
        } else {
            (BTreeMap::new(), BTreeMap::new())
        };
        let pending_filter = PrefetchedPendingFilter { records: &records, hashes: &hashes };

        let lookup = VaultLookupView { entries: &candidates };
        let paths = resolve_many(&input.target, ref_date, week_start, &lookup, is_pending_pattern.then_some(&pending_filter as _))?;

        if paths.is_empty() {
            if input.required {
                return Ok(ResolvedInput::Skip);
            }
            if is_collection {
                return Ok(ResolvedInput::Rendered { text: String::new(), consumed: None });
            }
            return Ok(ResolvedInput::Rendered { text: format!("(missing: {})", input.target), consumed: None });
        }

        if input.refs_only {
            let list = paths.iter().map(|p| format!("- {p}")).collect::<Vec<_>>().join("\n");
            return Ok(ResolvedInput::Rendered { text: format!("### {}\n{}", input.target, list), consumed: None });
        }

        let mut sections = Vec::new();
        let mut consumed = Vec::new();
        for path in &paths {
            let content = self.repo.read_file(vault_id.as_str(), path).await?;
            sections.push(format!("### {path}\n{content}"));
            if is_pending_pattern {
                let hash = self.repo.content_hash(&content);
                consumed.push((path.clone(), hash));
            }
        }

        Ok(ResolvedInput::Rendered { text: sections.join("\n\n"), consumed: is_pending_pattern.then_some((consumed, now)) })
    }

    async fn prefetch_pending_state(
        &self,
        workflow_id: &WorkflowGlobalId,
        vault_id: &VaultId,
        pattern_literal: &str,
        candidates: &[VaultFileMeta],
    ) -> Result<(BTreeMap<String, Option<FileStateRecord>>, BTreeMap<String, String>), AppError> {
        let mut records = BTreeMap::new();
        let mut hashes = BTreeMap::new();

        for candidate in candidates {
            let content = self.repo.read_file(vault_id.as_str(), &candidate.relative_path).await?;
            hashes.insert(candidate.relative_path.clone(), self.repo.content_hash(&content));
        }
        for candidate in candidates {
            let record = self.file_state.lookup(workflow_id, pattern_literal, &candidate.relative_path).await?;
            records.insert(candidate.relative_path.clone(), record);
        }
        Ok((records, hashes))
    }

    async fn resolve_tools(&self, settings: &Settings, directive: Option<&ToolsDirective>) -> Result<Vec<ToolDescriptor>, AppError> {
        let directive = directive.cloned().unwrap_or(ToolsDirective::None);
        let mut resolved = Vec::new();

        for tool in &settings.tools {
            let included = match &directive {
                ToolsDirective::None => false,
                ToolsDirective::All => true,
                ToolsDirective::Named(names) => names.contains(&tool.name),
            };
            if !included {
                continue;
            }
            if let Some(secret) = &tool.required_secret {
                if self.secrets.get(secret).await?.is_none() {
                    warn!(tool = %tool.name, secret, "tool unavailable, excluding from this step");
                    continue;
                }
            }
            resolved.push(ToolDescriptor { name: tool.name.clone() });
        }
        Ok(resolved)
    }

    #[allow(clippy::too_many_arguments)]
    async fn route_file_output(
        &self,
        vault_id: &VaultId,
        target_pattern: &str,
        write_mode: DirectiveWriteMode,
        header_template: Option<&str>,
        content: &str,
        ref_date: NaiveDate,
        week_start: WeekStart,
        created_outputs: &mut BTreeSet<String>,
    ) -> Result<String, AppError> {
        let resolved = resolve_single(target_pattern, ref_date, week_start)?;
        let normalized = normalize_md_extension(&resolved);

        let final_path = match write_mode {
            DirectiveWriteMode::New => self.allocate_new_mode_path(vault_id, &normalized).await?,
            _ => normalized,
        };

        let first_write_this_run = created_outputs.insert(final_path.clone());

        let mut section_content = content.to_string();
        if first_write_this_run {
            if let Some(header_template) = header_template {
                let resolved_header = resolve_single(header_template, ref_date, week_start)?;
                section_content = format!("# {resolved_header}\n\n{section_content}");
            }
        }

        match write_mode {
            DirectiveWriteMode::Replace | DirectiveWriteMode::New => {
                self.repo.write_file(vault_id.as_str(), &final_path, &section_content).await?;
            }
            DirectiveWriteMode::Append => {
                let mut combined = if self.repo.file_exists(vault_id.as_str(), &final_path).await {
                    self.repo.read_file(vault_id.as_str(), &final_path).await?
                } else {
                    String::new()
                };
                if !combined.is_empty() {
                    combined.push('\n');
                    combined.push('\n');
                }
                combined.push_str(&section_content);
                self.repo.write_file(vault_id.as_str(), &final_path, &combined).await?;
            }
        }

        Ok(final_path)
    }

    /// `new` mode: lowest unused `_NNN` (3-digit, zero-padded) suffix for the
    /// resolved base path (`spec.md` §4.2, §8 boundary behavior).
    async fn allocate_new_mode_path(&self, vault_id: &VaultId, normalized_base: &str) -> Result<String, AppError> {
        let base = normalized_base.strip_suffix(".md").unwrap_or(normalized_base);
        for n in 1..=999u32 {
            let candidate = format!("{base}_{n:03}.md");
            if !self.repo.file_exists(vault_id.as_str(), &candidate).await {
                return Ok(candidate);
            }
        }
        Err(AppError::Store(format!("no unused '_NNN' suffix available for '{normalized_base}'")))
    }
}

enum ResolvedInput {
    Skip,
    Rendered { text: String, consumed: Option<(Vec<(String, String)>, DateTime<Utc>)> },
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::domain::workflow::build_workflow;
    use crate::ports::{ModelAliasConfig, ToolConfig};

    struct FakeRepo {
        files: Mutex<BTreeMap<String, String>>,
    }

    impl FakeRepo {
        fn with(files: &[(&str, &str)]) -> Self {
            Self { files: Mutex::new(files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect()) }
        }
    }

    #[async_trait]
    impl VaultRepository for FakeRepo {
        async fn list_vaults(&self) -> Result<Vec<crate::ports::VaultDescriptor>, AppError> {
            unimplemented!("not exercised by step_engine tests")
        }

        async fn read_file(&self, _vault_id: &str, path: &str) -> Result<String, AppError> {
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| AppError::NotFound(path.to_string()))
        }

        async fn write_file(&self, _vault_id: &str, path: &str, content: &str) -> Result<(), AppError> {
            self.files.lock().unwrap().insert(path.to_string(), content.to_string());
            Ok(())
        }

        async fn file_exists(&self, _vault_id: &str, path: &str) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        async fn file_metadata(&self, _vault_id: &str, _path: &str) -> Result<VaultFileMeta, AppError> {
            unimplemented!("not exercised by step_engine tests")
        }

        async fn list_dir(&self, _vault_id: &str, dir: &str) -> Result<Vec<VaultFileMeta>, AppError> {
            let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
            let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|p| p.strip_prefix(prefix.as_str()).map(|rest| !rest.contains('/')).unwrap_or(false))
                .map(|p| VaultFileMeta { relative_path: p.clone(), created: now, modified: now })
                .collect())
        }

        async fn list_workflow_files(&self, _vault_id: &str) -> Result<Vec<String>, AppError> {
            unimplemented!("not exercised by step_engine tests")
        }

        fn content_hash(&self, content: &str) -> String {
            content.to_string()
        }
    }

    struct NoSecrets;
    #[async_trait]
    impl SecretsStore for NoSecrets {
        async fn get(&self, _name: &str) -> Result<Option<String>, AppError> {
            Ok(Some("configured".to_string()))
        }
    }

    struct NoFileState;
    #[async_trait]
    impl FileStateStore for NoFileState {
        async fn record_consumed(&self, _workflow_id: &WorkflowGlobalId, _pattern_literal: &str, _entries: Vec<(String, String, DateTime<Utc>)>) -> Result<(), AppError> {
            Ok(())
        }

        async fn lookup(&self, _workflow_id: &WorkflowGlobalId, _pattern_literal: &str, _path: &str) -> Result<Option<FileStateRecord>, AppError> {
            Ok(None)
        }
    }

    fn settings() -> Settings {
        Settings {
            default_api_timeout_secs: 60,
            passthrough_runs_default: None,
            week_start_day: None,
            models: vec![ModelAliasConfig { alias: "opus".to_string(), provider: "anthropic".to_string(), required_secret: "ANTHROPIC_API_KEY".to_string(), default_timeout_secs: 60 }],
            tools: vec![ToolConfig { name: "web-search".to_string(), required_secret: None }],
        }
    }

    fn vault() -> VaultId {
        VaultId::new("notes").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn runs_a_single_section_writing_to_a_file_output() {
        let repo = FakeRepo::with(&[]);
        let file_state = NoFileState;
        let secrets = NoSecrets;
        let llm = crate::ports::MockLlmClient;
        let engine = StepEngine::new(&repo, &file_state, &secrets, &llm);

        let body = "---\ncron: \"0 9 * * *\"\n---\n## Summary\n@model opus\n@output file:daily/{today}\nWrite a summary.\n";
        let vault = vault();
        let workflow = build_workflow(WorkflowGlobalId::new(&vault, "Workflows/summary"), body).unwrap();

        let report = engine.run(&workflow, &vault, &settings(), now()).await;

        assert_eq!(report.sections.len(), 1);
        match &report.sections[0].outcome {
            StepOutcome::RanWithOutput { path, .. } => assert_eq!(path.as_deref(), Some("daily/2026-02-10.md")),
            other => panic!("expected RanWithOutput, got {other:?}"),
        }
        let written = repo.files.lock().unwrap().get("daily/2026-02-10.md").cloned().unwrap();
        assert!(written.contains("[echo:opus]"));
    }

    #[tokio::test]
    async fn a_required_input_with_no_matches_skips_the_section() {
        let repo = FakeRepo::with(&[]);
        let file_state = NoFileState;
        let secrets = NoSecrets;
        let llm = crate::ports::MockLlmClient;
        let engine = StepEngine::new(&repo, &file_state, &secrets, &llm);

        let body = "---\ncron: \"0 9 * * *\"\n---\n## Summary\n@input file:journal/{today} (required)\n@model opus\n@output file:out\nSummarize.\n";
        let vault = vault();
        let workflow = build_workflow(WorkflowGlobalId::new(&vault, "Workflows/summary"), body).unwrap();

        let report = engine.run(&workflow, &vault, &settings(), now()).await;

        assert!(matches!(report.sections[0].outcome, StepOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn new_write_mode_allocates_the_lowest_unused_suffix() {
        let repo = FakeRepo::with(&[("out_001.md", "old")]);
        let file_state = NoFileState;
        let secrets = NoSecrets;
        let llm = crate::ports::MockLlmClient;
        let engine = StepEngine::new(&repo, &file_state, &secrets, &llm);

        let body = "---\ncron: \"0 9 * * *\"\n---\n## Summary\n@model opus\n@output file:out\n@write-mode new\nWrite.\n";
        let vault = vault();
        let workflow = build_workflow(WorkflowGlobalId::new(&vault, "Workflows/summary"), body).unwrap();

        let report = engine.run(&workflow, &vault, &settings(), now()).await;

        match &report.sections[0].outcome {
            StepOutcome::RanWithOutput { path, .. } => assert_eq!(path.as_deref(), Some("out_002.md")),
            other => panic!("expected RanWithOutput, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_secret_fails_the_step_not_the_run() {
        struct NoSecretsConfigured;
        #[async_trait]
        impl SecretsStore for NoSecretsConfigured {
            async fn get(&self, _name: &str) -> Result<Option<String>, AppError> {
                Ok(None)
            }
        }

        let repo = FakeRepo::with(&[]);
        let file_state = NoFileState;
        let secrets = NoSecretsConfigured;
        let llm = crate::ports::MockLlmClient;
        let engine = StepEngine::new(&repo, &file_state, &secrets, &llm);

        let body = "---\ncron: \"0 9 * * *\"\n---\n## Summary\n@model opus\n@output file:out\nWrite.\n";
        let vault = vault();
        let workflow = build_workflow(WorkflowGlobalId::new(&vault, "Workflows/summary"), body).unwrap();

        let report = engine.run(&workflow, &vault, &settings(), now()).await;

        assert!(matches!(report.sections[0].outcome, StepOutcome::Failed { .. }));
    }
}
