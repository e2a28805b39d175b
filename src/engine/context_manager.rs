//! Context Manager: per-chat-turn history reshaping pipeline (`spec.md` §4.7).
//!
//! A history processor attached to the chat agent. Each turn it evaluates the
//! template's context steps in order, injects a compiled summary message for
//! each one ahead of the passthrough slice, and returns the reshaped history.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::buffer::{BufferStore, WriteMode as BufferWriteMode};
use crate::domain::chat::{ChatSession, Message, Role};
use crate::domain::context::{
    compiled_summary_message, last_non_tool_turns, render_manager_prompt, should_skip_for_threshold, ContextCacheEntry, ContextCacheKey,
    ContextSummaryRecord, ContextTemplate,
};
use crate::domain::directive::{normalize_md_extension, parse_section_directives, CacheDirective, DirectiveMap, InputDirective, OutputDirective, PassthroughRuns, Scheme};
use crate::domain::identifiers::{BufferName, VaultId};
use crate::domain::pattern::{resolve_dir_prefix, resolve_many, resolve_single, WeekStart};
use crate::domain::AppError;
use crate::ports::{CompletionRequest, ContextStore, LlmClient, SecretsStore, Settings, ToolDescriptor, VaultLookupView, VaultRepository};

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

pub struct ContextManager<'a> {
    pub repo: &'a dyn VaultRepository,
    pub context_store: &'a dyn ContextStore,
    pub secrets: &'a dyn SecretsStore,
    pub llm: &'a dyn LlmClient,
}

impl<'a> ContextManager<'a> {
    pub fn new(repo: &'a dyn VaultRepository, context_store: &'a dyn ContextStore, secrets: &'a dyn SecretsStore, llm: &'a dyn LlmClient) -> Self {
        Self { repo, context_store, secrets, llm }
    }

    /// Reshape `session`'s history for the current turn (`spec.md` §4.7).
    ///
    /// `template_path` identifies the template for cache-key purposes; it
    /// need not resolve to a real file for ad-hoc/anonymous templates.
    pub async fn process(
        &self,
        session: &ChatSession,
        template: &ContextTemplate,
        template_path: &str,
        latest_user_input: &str,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Vec<Message> {
        let mut parsed_steps = Vec::with_capacity(template.steps.len());
        for section in &template.steps {
            match parse_section_directives(&section.name, &section.body) {
                Ok((map, body)) => parsed_steps.push((section.name.clone(), map, body)),
                Err(err) => warn!(section = %section.name, error = %err, "context_manager_step_parse_failed"),
            }
        }

        let passthrough_n = resolve_passthrough_n(&parsed_steps, settings);
        let passthrough = session.passthrough_slice(passthrough_n);
        let week_start = settings.week_start_day.as_deref().and_then(WeekStart::from_name).unwrap_or_default();

        let mut injected = Vec::new();
        let mut buffers = BufferStore::new();

        for (index, (section_name, directives, body)) in parsed_steps.iter().enumerate() {
            let threshold = directives.token_threshold.unwrap_or(0);
            if should_skip_for_threshold(&session.messages, threshold) {
                continue;
            }

            let recent_turns = last_non_tool_turns(&session.messages, directives.recent_runs.unwrap_or(0));
            let prior_summaries = self.load_prior_summaries(session, section_name, directives.recent_summaries.unwrap_or(0)).await;

            let mut body_with_inputs = body.clone();
            for input in &directives.inputs {
                match self.resolve_input(&session.vault, input, now, week_start, &buffers).await {
                    Ok(text) if !text.is_empty() => {
                        body_with_inputs.push_str("\n\n");
                        body_with_inputs.push_str(&text);
                    }
                    Ok(_) => {}
                    Err(err) => warn!(section = %section_name, error = %err, "context_manager_input_resolution_failed"),
                }
            }

            let prompt = render_manager_prompt(template.context_instructions.as_deref(), &prior_summaries, &body_with_inputs, &recent_turns, latest_user_input);

            let cache_key = ContextCacheKey {
                vault: session.vault.as_str().to_string(),
                template_path: template_path.to_string(),
                section_index: index,
                section_name: section_name.clone(),
                template_source_hash: template.source_hash.clone(),
            };

            let summary = match self.resolve_summary(session, directives, &prompt, &cache_key, settings, now).await {
                Some(summary) => summary,
                None => continue, // manager LLM failed or is uncached-and-unreachable: fail open, skip this step
            };

            if let Some(output) = &directives.output {
                if let Err(err) = self.route_output(session, output, &summary, week_start, now, &mut buffers).await {
                    warn!(section = %section_name, error = %err, "context_manager_output_routing_failed");
                }
            }

            injected.push(Message::new(Role::System, compiled_summary_message(&summary), now));
        }

        injected.into_iter().chain(passthrough.iter().cloned()).collect()
    }

    async fn load_prior_summaries(&self, session: &ChatSession, section_name: &str, recent_summaries: u32) -> Vec<String> {
        if recent_summaries == 0 {
            return Vec::new();
        }
        match self.context_store.recent_summaries(&session.session_id, section_name, recent_summaries).await {
            Ok(records) => records.into_iter().map(|r| r.parsed_output.unwrap_or(r.raw_output)).collect(),
            Err(err) => {
                warn!(section = %section_name, error = %err, "context_manager_recent_summaries_unavailable");
                Vec::new()
            }
        }
    }

    /// Cache lookup, falling back to a fresh manager-LLM call on a miss or
    /// expired entry (`spec.md` §4.7 steps 3c-3d). A step with no `@cache`
    /// directive always invokes the manager LLM fresh.
    async fn resolve_summary(&self, session: &ChatSession, directives: &DirectiveMap, prompt: &str, cache_key: &ContextCacheKey, settings: &Settings, now: DateTime<Utc>) -> Option<String> {
        if let Some(cache_directive) = directives.cache {
            if let Ok(Some(entry)) = self.context_store.cache_get(cache_key).await {
                if entry.is_fresh(now) {
                    if !entry.persisted {
                        self.persist_summary(session, cache_key, directives, prompt, &entry.summary, now).await;
                        let _ = self.context_store.cache_put(cache_key.clone(), ContextCacheEntry { persisted: true, ..entry.clone() }).await;
                    }
                    return Some(entry.summary);
                }
            }

            let summary = self.invoke_manager(directives, prompt, settings).await.ok()?;
            self.persist_summary(session, cache_key, directives, prompt, &summary, now).await;
            let entry = ContextCacheEntry { summary: summary.clone(), cached_at: now, expires_at: expiry_for(cache_directive, now), persisted: true };
            if let Err(err) = self.context_store.cache_put(cache_key.clone(), entry).await {
                warn!(section = %cache_key.section_name, error = %err, "context_manager_cache_put_failed");
            }
            return Some(summary);
        }

        let summary = match self.invoke_manager(directives, prompt, settings).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(section = %cache_key.section_name, error = %err, "context_manager_step_failed_fail_open");
                return None;
            }
        };
        self.persist_summary(session, cache_key, directives, prompt, &summary, now).await;
        Some(summary)
    }

    async fn persist_summary(&self, session: &ChatSession, cache_key: &ContextCacheKey, directives: &DirectiveMap, prompt: &str, summary: &str, now: DateTime<Utc>) {
        let record = ContextSummaryRecord {
            session_id: session.session_id.clone(),
            section_index: cache_key.section_index,
            section_name: cache_key.section_name.clone(),
            template_hash: cache_key.template_source_hash.clone(),
            model_alias: directives.model.as_ref().map(|m| m.alias.clone()).unwrap_or_default(),
            input_payload: prompt.to_string(),
            rendered_prompt: prompt.to_string(),
            raw_output: summary.to_string(),
            parsed_output: None,
            created_at: now,
        };
        if let Err(err) = self.context_store.persist_summary(record).await {
            warn!(section = %cache_key.section_name, error = %err, "context_manager_persist_summary_failed");
        }
    }

    async fn invoke_manager(&self, directives: &DirectiveMap, prompt: &str, settings: &Settings) -> Result<String, AppError> {
        let selected = match &directives.model {
            Some(m) => {
                let config = settings.models.iter().find(|c| c.alias == m.alias).ok_or_else(|| AppError::ConfigurationError(format!("unknown model alias '{}'", m.alias)))?;
                (m.alias.clone(), m.thinking, config)
            }
            None => {
                let config = settings.models.first().ok_or_else(|| AppError::ConfigurationError("no model aliases configured".to_string()))?;
                (config.alias.clone(), false, config)
            }
        };
        let (model_alias, thinking, config) = selected;
        if self.secrets.get(&config.required_secret).await?.is_none() {
            return Err(AppError::MissingSecret { alias: model_alias, secret: config.required_secret.clone() });
        }
        let timeout_secs = if config.default_timeout_secs > 0 { config.default_timeout_secs } else { DEFAULT_LLM_TIMEOUT_SECS };

        let tools = self.resolve_tools(settings, directives).await?;
        let request = CompletionRequest {
            model_alias,
            thinking,
            system_prompt: None,
            prompt: prompt.to_string(),
            tools,
            timeout: std::time::Duration::from_secs(timeout_secs),
        };
        let response = self.llm.complete(request).await?;
        Ok(response.raw_text)
    }

    async fn resolve_tools(&self, settings: &Settings, directives: &DirectiveMap) -> Result<Vec<ToolDescriptor>, AppError> {
        use crate::domain::directive::ToolsDirective;

        let directive = directives.tools.clone().unwrap_or(ToolsDirective::None);
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
                    warn!(tool = %tool.name, secret, "context_manager_tool_unavailable");
                    continue;
                }
            }
            resolved.push(ToolDescriptor { name: tool.name.clone() });
        }
        Ok(resolved)
    }

    /// Resolve one context step's `@input` against the vault (file patterns)
    /// or this turn's buffers (`@input variable:`, fed by an earlier step's
    /// `@output variable:`). Unlike the step engine, context-step inputs
    /// carry no `{pending}` file-state consumption.
    async fn resolve_input(&self, vault: &VaultId, input: &InputDirective, now: DateTime<Utc>, week_start: WeekStart, buffers: &BufferStore) -> Result<String, AppError> {
        match input.scheme {
            Scheme::Variable => {
                let name = BufferName::new(&input.target)?;
                Ok(buffers.get(&name).map(|entry| entry.content.clone()).unwrap_or_default())
            }
            Scheme::File => {
                let ref_date = now.date_naive();
                let dir = resolve_dir_prefix(&input.target, ref_date, week_start)?;
                let candidates = self.repo.list_dir(vault.as_str(), &dir).await?;
                let lookup = VaultLookupView { entries: &candidates };
                let paths = resolve_many(&input.target, ref_date, week_start, &lookup, None)?;

                let mut sections = Vec::new();
                for path in &paths {
                    let content = self.repo.read_file(vault.as_str(), path).await?;
                    sections.push(format!("### {path}\n{content}"));
                }
                Ok(sections.join("\n\n"))
            }
        }
    }

    async fn route_output(
        &self,
        session: &ChatSession,
        output: &crate::domain::directive::OutputDirective,
        summary: &str,
        week_start: WeekStart,
        now: DateTime<Utc>,
        buffers: &mut BufferStore,
    ) -> Result<(), AppError> {
        match output.scheme {
            Scheme::Variable => {
                let name = BufferName::new(&output.target)?;
                buffers.put(&name, summary, BufferWriteMode::Replace, None);
                Ok(())
            }
            Scheme::File => {
                let resolved = resolve_single(&output.target, now.date_naive(), week_start)?;
                let path = normalize_md_extension(&resolved);
                self.write_vault_file(&session.vault, &path, summary).await
            }
        }
    }

    async fn write_vault_file(&self, vault: &VaultId, path: &str, content: &str) -> Result<(), AppError> {
        let mut combined = if self.repo.file_exists(vault.as_str(), path).await { self.repo.read_file(vault.as_str(), path).await? } else { String::new() };
        if !combined.is_empty() {
            combined.push_str("\n\n");
        }
        combined.push_str(content);
        self.repo.write_file(vault.as_str(), path, &combined).await
    }
}

/// `passthrough_runs` is resolved once per turn: the first context step
/// carrying `@passthrough-runs` wins, falling back to the vault's configured
/// default, falling back to no truncation (`spec.md` §4.7 step 1).
fn resolve_passthrough_n(parsed_steps: &[(String, DirectiveMap, String)], settings: &Settings) -> Option<usize> {
    let from_step = parsed_steps.iter().find_map(|(_, directives, _)| directives.passthrough_runs);
    match from_step {
        Some(PassthroughRuns::All) => None,
        Some(PassthroughRuns::N(n)) => Some(n as usize),
        None => settings.passthrough_runs_default.map(|n| n as usize),
    }
}

fn expiry_for(cache: CacheDirective, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match cache {
        CacheDirective::TtlSeconds(secs) => Some(now + chrono::Duration::seconds(secs as i64)),
        CacheDirective::Session => None,
        CacheDirective::Daily => {
            let next_midnight = (now.date_naive() + chrono::Duration::days(1)).and_hms_opt(0, 0, 0).expect("midnight is always valid");
            Some(DateTime::<Utc>::from_naive_utc_and_offset(next_midnight, Utc))
        }
        CacheDirective::Weekly => Some(now + chrono::Duration::days(7)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::domain::context::parse_context_template;
    use crate::domain::identifiers::SessionId;
    use crate::domain::pattern::VaultFileMeta;
    use crate::ports::{ModelAliasConfig, VaultDescriptor};

    struct FakeRepo {
        files: Mutex<BTreeMap<String, String>>,
    }

    impl FakeRepo {
        fn empty() -> Self {
            Self { files: Mutex::new(BTreeMap::new()) }
        }
    }

    #[async_trait]
    impl VaultRepository for FakeRepo {
        async fn list_vaults(&self) -> Result<Vec<VaultDescriptor>, AppError> {
            unimplemented!()
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
            unimplemented!()
        }
        async fn list_dir(&self, _vault_id: &str, _dir: &str) -> Result<Vec<VaultFileMeta>, AppError> {
            Ok(Vec::new())
        }
        async fn list_workflow_files(&self, _vault_id: &str) -> Result<Vec<String>, AppError> {
            unimplemented!()
        }
        fn content_hash(&self, content: &str) -> String {
            content.to_string()
        }
    }

    #[derive(Default)]
    struct FakeContextStore {
        summaries: Mutex<Vec<ContextSummaryRecord>>,
        cache: Mutex<BTreeMap<(String, String, usize, String, String), ContextCacheEntry>>,
    }

    fn slot(key: &ContextCacheKey) -> (String, String, usize, String, String) {
        (key.vault.clone(), key.template_path.clone(), key.section_index, key.section_name.clone(), key.template_source_hash.clone())
    }

    #[async_trait]
    impl ContextStore for FakeContextStore {
        async fn persist_summary(&self, record: ContextSummaryRecord) -> Result<(), AppError> {
            self.summaries.lock().unwrap().push(record);
            Ok(())
        }
        async fn cache_get(&self, key: &ContextCacheKey) -> Result<Option<ContextCacheEntry>, AppError> {
            Ok(self.cache.lock().unwrap().get(&slot(key)).cloned())
        }
        async fn cache_put(&self, key: ContextCacheKey, entry: ContextCacheEntry) -> Result<(), AppError> {
            self.cache.lock().unwrap().insert(slot(&key), entry);
            Ok(())
        }
        async fn recent_summaries(&self, session_id: &SessionId, section_name: &str, limit: u32) -> Result<Vec<ContextSummaryRecord>, AppError> {
            let mut matching: Vec<_> =
                self.summaries.lock().unwrap().iter().filter(|r| &r.session_id == session_id && r.section_name == section_name).cloned().collect();
            matching.sort_by_key(|r| r.created_at);
            let keep_from = matching.len().saturating_sub(limit as usize);
            Ok(matching.split_off(keep_from))
        }
    }

    struct AlwaysSecrets;
    #[async_trait]
    impl SecretsStore for AlwaysSecrets {
        async fn get(&self, _name: &str) -> Result<Option<String>, AppError> {
            Ok(Some("configured".to_string()))
        }
    }

    fn settings() -> Settings {
        Settings {
            default_api_timeout_secs: 60,
            passthrough_runs_default: None,
            week_start_day: None,
            models: vec![ModelAliasConfig { alias: "opus".to_string(), provider: "anthropic".to_string(), required_secret: "KEY".to_string(), default_timeout_secs: 60 }],
            tools: vec![],
        }
    }

    fn session_with(messages: Vec<Message>) -> ChatSession {
        let mut s = ChatSession::new(SessionId::generate(), VaultId::new("notes").unwrap(), "opus");
        s.messages = messages;
        s
    }

    fn msg(role: Role, content: &str) -> Message {
        Message::new(role, content, Utc.with_ymd_and_hms(2026, 2, 10, 9, 0, 0).unwrap())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn injects_a_compiled_summary_ahead_of_the_passthrough_slice() {
        let repo = FakeRepo::empty();
        let store = FakeContextStore::default();
        let secrets = AlwaysSecrets;
        let llm = crate::ports::MockLlmClient;
        let manager = ContextManager::new(&repo, &store, &secrets, &llm);

        let template = parse_context_template("## Recent Activity\n@model opus\nSummarize recent activity.\n").unwrap();
        let session = session_with(vec![msg(Role::User, "hi"), msg(Role::Assistant, "hello")]);

        let reshaped = manager.process(&session, &template, "templates/default.md", "what's new?", &settings(), now()).await;

        assert_eq!(reshaped.len(), 3);
        assert!(matches!(reshaped[0].role, Role::System));
        assert!(reshaped[0].content.starts_with("Context summary (compiled): [echo:opus]"));
        assert_eq!(reshaped[1].content, "hi");
        assert_eq!(reshaped[2].content, "hello");
    }

    #[tokio::test]
    async fn below_threshold_skips_the_step_entirely() {
        let repo = FakeRepo::empty();
        let store = FakeContextStore::default();
        let secrets = AlwaysSecrets;
        let llm = crate::ports::MockLlmClient;
        let manager = ContextManager::new(&repo, &store, &secrets, &llm);

        let template = parse_context_template("## Recent Activity\n@model opus\n@token-threshold 100000\nSummarize.\n").unwrap();
        let session = session_with(vec![msg(Role::User, "hi")]);

        let reshaped = manager.process(&session, &template, "templates/default.md", "anything new?", &settings(), now()).await;

        assert_eq!(reshaped.len(), 1);
        assert_eq!(reshaped[0].content, "hi");
    }

    #[tokio::test]
    async fn fresh_cache_entry_is_reused_without_invoking_the_manager_llm() {
        let repo = FakeRepo::empty();
        let store = FakeContextStore::default();
        let secrets = AlwaysSecrets;
        let llm = crate::ports::MockLlmClient;
        let manager = ContextManager::new(&repo, &store, &secrets, &llm);

        let template = parse_context_template("## Recent Activity\n@model opus\n@cache 3600s\nSummarize.\n").unwrap();
        let session = session_with(vec![msg(Role::User, "hi")]);

        let cache_key = ContextCacheKey {
            vault: "notes".to_string(),
            template_path: "templates/default.md".to_string(),
            section_index: 0,
            section_name: "Recent Activity".to_string(),
            template_source_hash: template.source_hash.clone(),
        };
        store
            .cache_put(cache_key, ContextCacheEntry { summary: "stale-but-fresh summary".to_string(), cached_at: now(), expires_at: None, persisted: true })
            .await
            .unwrap();

        let reshaped = manager.process(&session, &template, "templates/default.md", "anything new?", &settings(), now()).await;

        assert_eq!(reshaped[0].content, "Context summary (compiled): stale-but-fresh summary");
        assert!(store.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn manager_llm_failure_fails_open_and_skips_the_step() {
        struct FailingLlm;
        #[async_trait]
        impl LlmClient for FailingLlm {
            async fn complete(&self, _request: CompletionRequest) -> Result<crate::ports::CompletionResponse, AppError> {
                Err(AppError::Llm("provider unavailable".to_string()))
            }
        }

        let repo = FakeRepo::empty();
        let store = FakeContextStore::default();
        let secrets = AlwaysSecrets;
        let llm = FailingLlm;
        let manager = ContextManager::new(&repo, &store, &secrets, &llm);

        let template = parse_context_template("## Recent Activity\n@model opus\nSummarize.\n").unwrap();
        let session = session_with(vec![msg(Role::User, "hi")]);

        let reshaped = manager.process(&session, &template, "templates/default.md", "anything new?", &settings(), now()).await;

        assert_eq!(reshaped.len(), 1);
        assert_eq!(reshaped[0].content, "hi");
    }

    #[tokio::test]
    async fn passthrough_runs_directive_truncates_the_slice() {
        let repo = FakeRepo::empty();
        let store = FakeContextStore::default();
        let secrets = AlwaysSecrets;
        let llm = crate::ports::MockLlmClient;
        let manager = ContextManager::new(&repo, &store, &secrets, &llm);

        let template = parse_context_template("## Recent Activity\n@model opus\n@passthrough-runs 2\nSummarize.\n").unwrap();
        let session = session_with(vec![msg(Role::User, "old"), msg(Role::Assistant, "old reply"), msg(Role::User, "new"), msg(Role::Assistant, "new reply")]);

        let reshaped = manager.process(&session, &template, "templates/default.md", "anything new?", &settings(), now()).await;

        let contents: Vec<&str> = reshaped.iter().skip(1).map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["new", "new reply"]);
    }
}
