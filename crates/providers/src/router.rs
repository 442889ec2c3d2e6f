//! Provider router — maps a model id to its upstream provider.
//!
//! The router is the in-process [`Generator`]: it picks the provider for the
//! model, applies per-request key overrides, sends the prompt, and turns the
//! provider response into a uniform [`Generation`] with token counts.

use async_trait::async_trait;
use sitewright_core::error::GenerationError;
use sitewright_core::generation::{Generation, GenerationRequest, Generator};
use sitewright_core::mask_api_key;
use sitewright_core::model::{ModelId, TokenCounting};
use sitewright_core::provider::{Provider, ProviderRequest};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::tokens::estimate_tokens;

/// Routes generation requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// The provider serving `model`.
    pub fn resolve(&self, model: ModelId) -> Option<Arc<dyn Provider>> {
        self.get(model.provider().as_str())
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for ProviderRouter {
    fn name(&self) -> &str {
        "router"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let model = request.model;
        let kind = model.provider();
        let provider = self.resolve(model).ok_or_else(|| {
            GenerationError::failed(format!("Provider not configured: {kind}"))
        })?;

        let override_key = request.credentials.for_provider(kind).map(str::to_string);
        let (key_source, key_hint) = match &override_key {
            Some(key) => ("custom", mask_api_key(key)),
            None => ("environment", provider.key_hint()),
        };
        info!(
            model = %model,
            provider = %kind,
            key_source,
            key = %key_hint,
            "Generating content"
        );

        let response = provider
            .complete(ProviderRequest {
                model: model.upstream_model().to_string(),
                prompt: request.prompt.clone(),
                temperature: model.temperature(),
                max_tokens: model.max_tokens(),
                api_key: override_key,
            })
            .await
            .map_err(|e| {
                error!(model = %model, provider = %kind, error = %e, "Generation failed");
                GenerationError::from(e)
            })?;

        let (input_tokens, output_tokens, estimated) = match model.token_counting() {
            TokenCounting::Reported => {
                let usage = response.usage.ok_or_else(|| {
                    error!(model = %model, "Provider response carried no token usage");
                    GenerationError::failed("Provider response did not include token usage")
                })?;
                (usage.prompt_tokens, usage.completion_tokens, false)
            }
            TokenCounting::Estimated => (
                estimate_tokens(&request.prompt),
                estimate_tokens(&response.content),
                true,
            ),
        };

        debug!(
            model = %model,
            input_tokens,
            output_tokens,
            estimated,
            "Generation complete"
        );

        Ok(Generation {
            model,
            content: response.content,
            input_tokens,
            output_tokens,
            estimated,
        })
    }
}

/// Build both providers from configuration.
///
/// Providers are registered even without an operator key, since a request
/// may bring its own.
pub fn build_from_config(config: &sitewright_config::AppConfig) -> ProviderRouter {
    use sitewright_config::{ANTHROPIC, OPENAI};

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut router = ProviderRouter::new();

    let openai_url = config
        .api_url(OPENAI)
        .map(str::to_string)
        .unwrap_or_else(|| default_base_url(OPENAI));
    let openai = OpenAiCompatProvider::new(
        OPENAI,
        openai_url,
        config.api_key(OPENAI).unwrap_or_default(),
    )
    .with_timeout(timeout);
    router.register(OPENAI, Arc::new(openai));

    let mut anthropic =
        AnthropicProvider::new(config.api_key(ANTHROPIC).unwrap_or_default()).with_timeout(timeout);
    if let Some(url) = config.api_url(ANTHROPIC) {
        anthropic = anthropic.with_base_url(url);
    }
    router.register(ANTHROPIC, Arc::new(anthropic));

    router
}

/// Get the default base URL for a known provider.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "anthropic" => "https://api.anthropic.com".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewright_core::error::ProviderError;
    use sitewright_core::generation::Credentials;
    use sitewright_core::provider::{ProviderResponse, Usage};
    use std::sync::Mutex;

    /// A provider that returns a scripted response and records requests.
    struct ScriptedProvider {
        name: String,
        response: Result<ProviderResponse, ProviderError>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn ok(name: &str, content: &str, usage: Option<Usage>) -> Self {
            Self {
                name: name.into(),
                response: Ok(ProviderResponse {
                    content: content.into(),
                    usage,
                    model: "scripted".into(),
                }),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &str, err: ProviderError) -> Self {
            Self {
                name: name.into(),
                response: Err(err),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn key_hint(&self) -> String {
            mask_api_key("sk-operator-key-0000")
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn usage(prompt: u32, completion: u32) -> Option<Usage> {
        Some(Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        })
    }

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new();
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test")));

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.resolve(ModelId::Fast).is_some());
        assert!(router.resolve(ModelId::Quality).is_none());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("anthropic").contains("api.anthropic.com"));
    }

    #[test]
    fn build_from_default_config() {
        let config = sitewright_config::AppConfig::default();
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["anthropic", "openai"]);
    }

    #[tokio::test]
    async fn openai_counts_come_from_usage() {
        let provider = Arc::new(ScriptedProvider::ok("openai", "Hello!", usage(42, 7)));
        let mut router = ProviderRouter::new();
        router.register("openai", provider.clone());

        let generation = router
            .generate(GenerationRequest::new(ModelId::Fast, "one two three"))
            .await
            .unwrap();

        assert_eq!(generation.content, "Hello!");
        assert_eq!(generation.input_tokens, 42);
        assert_eq!(generation.output_tokens, 7);
        assert!(!generation.estimated);

        let sent = provider.requests.lock().unwrap();
        assert_eq!(sent[0].model, "gpt-4o-mini");
        assert!((sent[0].temperature - 0.7).abs() < f32::EPSILON);
        assert!(sent[0].max_tokens.is_none());
    }

    #[tokio::test]
    async fn anthropic_counts_are_word_estimates() {
        let provider = Arc::new(ScriptedProvider::ok(
            "anthropic",
            "Here is your page now",
            usage(999, 999),
        ));
        let mut router = ProviderRouter::new();
        router.register("anthropic", provider.clone());

        let generation = router
            .generate(GenerationRequest::new(ModelId::Quality, "Build a landing page"))
            .await
            .unwrap();

        assert_eq!(generation.input_tokens, 4);
        assert_eq!(generation.output_tokens, 5);
        assert!(generation.estimated);

        let sent = provider.requests.lock().unwrap();
        assert_eq!(sent[0].model, "claude-3-5-sonnet-20240620");
        assert_eq!(sent[0].max_tokens, Some(8192));
        assert!(sent[0].temperature.abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn missing_usage_is_a_failure() {
        let mut router = ProviderRouter::new();
        router.register("openai", Arc::new(ScriptedProvider::ok("openai", "Hi", None)));

        let err = router
            .generate(GenerationRequest::new(ModelId::Fast, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Failed { .. }));
    }

    #[tokio::test]
    async fn provider_errors_collapse_into_failed() {
        let mut router = ProviderRouter::new();
        router.register(
            "openai",
            Arc::new(ScriptedProvider::failing(
                "openai",
                ProviderError::Timeout("deadline elapsed".into()),
            )),
        );

        let err = router
            .generate(GenerationRequest::new(ModelId::Fast, "hi"))
            .await
            .unwrap_err();
        match err {
            GenerationError::Failed { details } => assert!(details.contains("deadline elapsed")),
            other => panic!("Expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unregistered_provider_is_a_failure() {
        let router = ProviderRouter::new();
        let err = router
            .generate(GenerationRequest::new(ModelId::Quality, "hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("anthropic"));
    }

    #[tokio::test]
    async fn custom_key_is_forwarded_only_to_its_provider() {
        let provider = Arc::new(ScriptedProvider::ok("openai", "ok", usage(1, 1)));
        let mut router = ProviderRouter::new();
        router.register("openai", provider.clone());

        let creds = Credentials::new(Some("sk-custom-abcdef".into()), Some("sk-ant-other".into()));
        router
            .generate(GenerationRequest::new(ModelId::Fast, "hi").with_credentials(creds))
            .await
            .unwrap();
        router
            .generate(GenerationRequest::new(ModelId::Fast, "hi"))
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 2);
        let sent = provider.requests.lock().unwrap();
        assert_eq!(sent[0].api_key.as_deref(), Some("sk-custom-abcdef"));
        assert!(sent[1].api_key.is_none());
    }
}
