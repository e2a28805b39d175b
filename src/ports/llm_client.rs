//! LLM invocation port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::AppError;

#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text(String),
    /// Structured multimodal content from a tool call; bypasses
    /// text-oriented auto-buffering and stays inline (`spec.md` §4.6 step 6).
    Multimodal { mime_type: String, data: String },
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model_alias: String,
    pub thinking: bool,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub tools: Vec<ToolDescriptor>,
    pub timeout: std::time::Duration,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: Vec<ContentBlock>,
    pub raw_text: String,
    pub completed_at: DateTime<Utc>,
}

/// Port for invoking a configured model alias. Implementations must map
/// provider timeouts/errors onto `AppError::Llm`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AppError>;
}

/// Deterministic echo model for tests (`spec.md` §4.6 "Idempotence": tests
/// use a deterministic echo model).
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AppError> {
        let raw_text = format!("[echo:{}] {}", request.model_alias, request.prompt);
        Ok(CompletionResponse { content: vec![ContentBlock::Text(raw_text.clone())], raw_text, completed_at: Utc::now() })
    }
}
