//! Chat Executor: per-turn orchestrator tying `ChatSession`, the Context
//! Manager, and the chat LLM together (`spec.md` §4.7, §6).
//!
//! The Context Manager only reshapes what is *sent* to the model; the
//! canonical `ChatSession.messages` log records the real user/assistant
//! turns and is what gets persisted as the transcript.

use chrono::{DateTime, Utc};

use crate::domain::chat::{ChatSession, Message, Role};
use crate::domain::context::ContextTemplate;
use crate::domain::AppError;
use crate::engine::context_manager::ContextManager;
use crate::ports::{CompletionRequest, ContextStore, LlmClient, SecretsStore, Settings, VaultRepository};

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Underscore-prefixed so vault scanning skips it (`spec.md` §6).
const TRANSCRIPTS_DIR: &str = "AssistantMD/_chat-sessions";

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub transcript_path: String,
}

pub struct ChatExecutor<'a> {
    pub repo: &'a dyn VaultRepository,
    pub context_store: &'a dyn ContextStore,
    pub secrets: &'a dyn SecretsStore,
    pub llm: &'a dyn LlmClient,
}

impl<'a> ChatExecutor<'a> {
    pub fn new(repo: &'a dyn VaultRepository, context_store: &'a dyn ContextStore, secrets: &'a dyn SecretsStore, llm: &'a dyn LlmClient) -> Self {
        Self { repo, context_store, secrets, llm }
    }

    /// Run one chat turn: append the user's input, reshape history through
    /// the Context Manager (if a template is attached), invoke the chat
    /// model, append its reply, and persist the full transcript.
    pub async fn run_turn(
        &self,
        session: &mut ChatSession,
        template: Option<(&ContextTemplate, &str)>,
        user_input: &str,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome, AppError> {
        session.messages.push(Message::new(Role::User, user_input, now));

        let (system_prompt, reshaped) = match template {
            Some((template, template_path)) => {
                let manager = ContextManager::new(self.repo, self.context_store, self.secrets, self.llm);
                let reshaped = manager.process(session, template, template_path, user_input, settings, now).await;
                (template.chat_instructions.clone(), reshaped)
            }
            None => (None, session.messages.clone()),
        };

        let model_config = settings
            .models
            .iter()
            .find(|m| m.alias == session.model_alias)
            .ok_or_else(|| AppError::ConfigurationError(format!("unknown model alias '{}'", session.model_alias)))?;
        if self.secrets.get(&model_config.required_secret).await?.is_none() {
            return Err(AppError::MissingSecret { alias: session.model_alias.clone(), secret: model_config.required_secret.clone() });
        }

        let timeout_secs = if model_config.default_timeout_secs > 0 { model_config.default_timeout_secs } else { DEFAULT_LLM_TIMEOUT_SECS };
        let request = CompletionRequest {
            model_alias: session.model_alias.clone(),
            thinking: false,
            system_prompt,
            prompt: render_prompt(&reshaped),
            tools: Vec::new(),
            timeout: std::time::Duration::from_secs(timeout_secs),
        };

        let response = self.llm.complete(request).await?;
        session.messages.push(Message::new(Role::Assistant, response.raw_text.clone(), response.completed_at));

        let transcript_path = format!("{TRANSCRIPTS_DIR}/{}.md", session.session_id.as_str());
        self.repo.write_file(session.vault.as_str(), &transcript_path, &render_transcript(session)).await?;

        Ok(TurnOutcome { reply: response.raw_text, transcript_path })
    }
}

fn render_prompt(messages: &[Message]) -> String {
    messages.iter().map(|m| format!("{:?}: {}", m.role, m.content)).collect::<Vec<_>>().join("\n")
}

fn role_heading(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
        Role::ToolCall => "Tool Call",
        Role::ToolResult => "Tool Result",
        Role::System => "System",
    }
}

fn render_transcript(session: &ChatSession) -> String {
    let mut out = format!("# Chat session {}\n", session.session_id.as_str());
    for message in &session.messages {
        out.push_str(&format!("\n## {} — {}\n\n{}\n", role_heading(message.role), message.ts.to_rfc3339(), message.content));
    }
    out
}
