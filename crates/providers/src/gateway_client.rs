//! HTTP client for a running Sitewright gateway.
//!
//! Implements [`Generator`] by posting to `{base}/generate`, so the chat
//! client can run against a shared proxy instead of holding provider keys.

use async_trait::async_trait;
use sitewright_core::error::GenerationError;
use sitewright_core::generation::{Generation, GenerationRequest, Generator};
use sitewright_core::model::TokenCounting;
use sitewright_core::wire::{ErrorReply, GenerateBody, GenerateReply, UNSUPPORTED_MODEL};
use std::time::Duration;
use tracing::{debug, warn};

/// A [`Generator`] backed by a remote `POST /generate` endpoint.
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: crate::http_client(timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Generator for GatewayClient {
    fn name(&self) -> &str {
        "gateway"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let model = request.model;
        let body = GenerateBody {
            model: model.as_str().to_string(),
            prompt: request.prompt,
            openai_api_key: request.credentials.openai,
            anthropic_api_key: request.credentials.anthropic,
        };

        let url = format!("{}/generate", self.base_url);
        debug!(url = %url, model = %model, "Posting to gateway");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::failed(format!("Gateway unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reply: Option<ErrorReply> = serde_json::from_str(&text).ok();
            warn!(status = status.as_u16(), body = %text, "Gateway returned error");

            return Err(match reply {
                Some(reply) if status.as_u16() == 400 && reply.error == UNSUPPORTED_MODEL => {
                    GenerationError::UnsupportedModel(model.as_str().to_string())
                }
                Some(reply) => GenerationError::failed(reply.details.unwrap_or(reply.error)),
                None => GenerationError::failed(format!("Gateway returned status {status}")),
            });
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| GenerationError::failed(format!("Malformed gateway response: {e}")))?;

        Ok(Generation {
            model,
            content: reply.content,
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            estimated: model.token_counting() == TokenCounting::Estimated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewright_core::model::ModelId;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new("http://127.0.0.1:3003/", Duration::from_secs(5));
        assert_eq!(client.base_url(), "http://127.0.0.1:3003");
        assert_eq!(client.name(), "gateway");
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_failure() {
        // Port 9 (discard) is not listening in test environments.
        let client = GatewayClient::new("http://127.0.0.1:9", Duration::from_secs(2));
        let err = client
            .generate(GenerationRequest::new(ModelId::Fast, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Failed { .. }));
    }
}
