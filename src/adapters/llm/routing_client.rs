//! Routes a `CompletionRequest` to the `HttpLlmClient` configured for its
//! `model_alias`, mirroring the teacher's wrapper-over-client shape
//! (`RetryingJulesClient` wrapping `JulesClient`).

use std::collections::BTreeMap;

use async_trait::async_trait;
use url::Url;

use crate::domain::AppError;
use crate::ports::{CompletionRequest, CompletionResponse, LlmClient, ModelAliasConfig, SecretsStore};

use super::http_client::HttpLlmClient;

fn provider_base_url(provider: &str) -> Result<Url, AppError> {
    let raw = match provider {
        "anthropic" => "https://api.anthropic.com/v1/complete",
        "openai" => "https://api.openai.com/v1/chat/completions",
        other => return Err(AppError::ConfigurationError(format!("unknown provider '{other}', no default endpoint configured"))),
    };
    Url::parse(raw).map_err(|err| AppError::ConfigurationError(format!("invalid provider endpoint: {err}")))
}

/// One `HttpLlmClient` per model alias whose secret is currently configured.
/// Aliases with a missing secret are simply absent, surfacing as
/// `AppError::ConfigurationError` the first time they're requested rather
/// than at construction time.
pub struct RoutingLlmClient {
    clients: BTreeMap<String, HttpLlmClient>,
}

impl RoutingLlmClient {
    pub async fn build(models: &[ModelAliasConfig], secrets: &dyn SecretsStore) -> Result<Self, AppError> {
        let mut clients = BTreeMap::new();
        for model in models {
            let Some(api_key) = secrets.get(&model.required_secret).await? else {
                continue;
            };
            let url = provider_base_url(&model.provider)?;
            clients.insert(model.alias.clone(), HttpLlmClient::new(api_key, url)?);
        }
        Ok(Self { clients })
    }
}

#[async_trait]
impl LlmClient for RoutingLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AppError> {
        let client = self
            .clients
            .get(&request.model_alias)
            .ok_or_else(|| AppError::ConfigurationError(format!("model alias '{}' unavailable (missing secret or unconfigured)", request.model_alias)))?;
        client.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct FakeSecrets(BTreeMap<String, String>);
    #[async_trait]
    impl SecretsStore for FakeSecrets {
        async fn get(&self, name: &str) -> Result<Option<String>, AppError> {
            Ok(self.0.get(name).cloned())
        }
    }

    #[tokio::test]
    async fn a_model_with_no_configured_secret_is_absent_from_the_router() {
        let models = vec![ModelAliasConfig { alias: "opus".to_string(), provider: "anthropic".to_string(), required_secret: "ANTHROPIC_API_KEY".to_string(), default_timeout_secs: 60 }];
        let secrets = FakeSecrets(BTreeMap::new());
        let router = RoutingLlmClient::build(&models, &secrets).await.unwrap();

        let request = CompletionRequest { model_alias: "opus".to_string(), thinking: false, system_prompt: None, prompt: "hi".to_string(), tools: vec![], timeout: Duration::from_secs(5) };
        let result = router.complete(request).await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn an_unknown_provider_fails_the_build() {
        let models = vec![ModelAliasConfig { alias: "custom".to_string(), provider: "acme".to_string(), required_secret: "ACME_KEY".to_string(), default_timeout_secs: 60 }];
        let secrets = FakeSecrets(BTreeMap::from([("ACME_KEY".to_string(), "k".to_string())]));
        let result = RoutingLlmClient::build(&models, &secrets).await;
        assert!(matches!(result, Err(AppError::ConfigurationError(_))));
    }
}
