//! HTTP transport for model providers, mirroring the shape of the teacher's
//! `HttpJulesClient`: a single request per call, provider errors mapped onto
//! the engine's error type, retries left to a dedicated wrapper if needed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::AppError;
use crate::ports::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient};

#[derive(Clone)]
pub struct HttpLlmClient {
    api_key: String,
    api_url: Url,
    client: Client,
}

impl std::fmt::Debug for HttpLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLlmClient").field("api_url", &self.api_url).field("api_key", &"[REDACTED]").finish()
    }
}

impl HttpLlmClient {
    pub fn new(api_key: String, api_url: Url) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|err| AppError::Llm(format!("failed to construct HTTP client: {err}")))?;
        Ok(Self { api_key, api_url, client })
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    thinking: bool,
    system: Option<&'a str>,
    prompt: &'a str,
    tools: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AppError> {
        let tool_names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
        let api_request = ApiRequest {
            model: &request.model_alias,
            thinking: request.thinking,
            system: request.system_prompt.as_deref(),
            prompt: &request.prompt,
            tools: tool_names,
        };

        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.api_key)
            .timeout(request.timeout.max(Duration::from_secs(1)))
            .json(&api_request)
            .send()
            .await
            .map_err(|err| AppError::Llm(format!("request failed: {err}")))?;

        let status = response.status();
        let body: ApiResponse = response.json().await.map_err(|err| AppError::Llm(format!("invalid response body: {err}")))?;

        if !status.is_success() {
            let message = body.error.map(|e| e.message).unwrap_or_else(|| format!("provider returned HTTP {status}"));
            return Err(AppError::Llm(message));
        }

        let raw_text = body.text.unwrap_or_default();
        Ok(CompletionResponse { content: vec![ContentBlock::Text(raw_text.clone())], raw_text, completed_at: chrono::Utc::now() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_response_is_parsed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "hello"}"#)
            .create_async()
            .await;

        let client = HttpLlmClient::new("key".to_string(), Url::parse(&server.url()).unwrap()).unwrap();
        let request = CompletionRequest {
            model_alias: "default".to_string(),
            thinking: false,
            system_prompt: None,
            prompt: "hi".to_string(),
            tools: vec![],
            timeout: Duration::from_secs(5),
        };

        let response = client.complete(request).await.unwrap();
        assert_eq!(response.raw_text, "hello");
    }

    #[tokio::test]
    async fn server_error_is_mapped_to_llm_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"message": "overloaded"}}"#)
            .create_async()
            .await;

        let client = HttpLlmClient::new("key".to_string(), Url::parse(&server.url()).unwrap()).unwrap();
        let request = CompletionRequest {
            model_alias: "default".to_string(),
            thinking: false,
            system_prompt: None,
            prompt: "hi".to_string(),
            tools: vec![],
            timeout: Duration::from_secs(5),
        };

        let err = client.complete(request).await.unwrap_err();
        match err {
            AppError::Llm(message) => assert_eq!(message, "overloaded"),
            other => panic!("unexpected error variant: {other}"),
        }
    }
}
