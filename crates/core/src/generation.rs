//! Generation requests, results, and the `Generator` seam.
//!
//! A `Generator` turns `(model, prompt)` into generated text plus token
//! counts. The in-process provider router and the HTTP gateway client both
//! implement it, so the chat session never knows which one it talks to.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::model::{ModelId, ProviderKind};

/// Per-request API keys supplied by the caller.
///
/// Blank keys count as absent, so an empty form field falls back to the
/// operator's key.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<String>,
}

impl Credentials {
    pub fn new(openai: Option<String>, anthropic: Option<String>) -> Self {
        Self {
            openai: non_blank(openai),
            anthropic: non_blank(anthropic),
        }
    }

    /// The override key for a provider, if any.
    pub fn for_provider(&self, provider: ProviderKind) -> Option<&str> {
        let key = match provider {
            ProviderKind::OpenAi => self.openai.as_deref(),
            ProviderKind::Anthropic => self.anthropic.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai", &self.openai.as_deref().map(mask_api_key))
            .field("anthropic", &self.anthropic.as_deref().map(mask_api_key))
            .finish()
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

/// Mask an API key for logs: first four and last four characters.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return "Not provided".into();
    }
    if chars.len() <= 8 {
        return "***".into();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: ModelId,
    pub prompt: String,
    pub credentials: Credentials,
}

impl GenerationRequest {
    pub fn new(model: ModelId, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            credentials: Credentials::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub model: ModelId,
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// True when counts are word-count estimates rather than provider usage.
    pub estimated: bool,
}

/// Anything that can run a generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for logs (e.g., "router", "gateway").
    fn name(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_shows_head_and_tail() {
        assert_eq!(mask_api_key("sk-abcdefghijklmnop"), "sk-a...mnop");
    }

    #[test]
    fn mask_hides_short_and_empty_keys() {
        assert_eq!(mask_api_key(""), "Not provided");
        assert_eq!(mask_api_key("short"), "***");
    }

    #[test]
    fn blank_overrides_are_dropped() {
        let creds = Credentials::new(Some("   ".into()), Some("sk-ant-123456789".into()));
        assert!(creds.for_provider(ProviderKind::OpenAi).is_none());
        assert_eq!(
            creds.for_provider(ProviderKind::Anthropic),
            Some("sk-ant-123456789")
        );
    }

    #[test]
    fn credentials_debug_is_masked() {
        let creds = Credentials::new(Some("sk-abcdefghijklmnop".into()), None);
        let debug = format!("{creds:?}");
        assert!(!debug.contains("sk-abcdefghijklmnop"));
        assert!(debug.contains("sk-a...mnop"));
    }
}
