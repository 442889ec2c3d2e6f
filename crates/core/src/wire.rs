//! JSON bodies of the `POST /generate` endpoint.
//!
//! Field names are camelCase on the wire. Both the gateway and the gateway
//! client use these types, so the two sides cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::generation::Credentials;

/// Error label returned with 400 for an unrecognised model.
pub const UNSUPPORTED_MODEL: &str = "Unsupported model";

/// Error label returned with 400 for a body that is not a valid request.
pub const INVALID_REQUEST: &str = "Invalid request";

/// Error label returned with 500 for every other failure.
pub const GENERATION_FAILED: &str = "An error occurred while generating content";

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
}

impl GenerateBody {
    /// The per-request key overrides, with blank values dropped.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.openai_api_key.clone(), self.anthropic_api_key.clone())
    }
}

impl std::fmt::Debug for GenerateBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateBody")
            .field("model", &self.model)
            .field("prompt_len", &self.prompt.len())
            .field("credentials", &self.credentials())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReply {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProviderKind;

    #[test]
    fn body_uses_camel_case_keys() {
        let body: GenerateBody = serde_json::from_str(
            r#"{"model":"gpt-4o-mini","prompt":"hi","openaiApiKey":"sk-custom-123456","anthropicApiKey":""}"#,
        )
        .unwrap();
        let creds = body.credentials();
        assert_eq!(creds.for_provider(ProviderKind::OpenAi), Some("sk-custom-123456"));
        assert!(creds.for_provider(ProviderKind::Anthropic).is_none());
    }

    #[test]
    fn reply_serializes_token_counts() {
        let reply = GenerateReply {
            content: "ok".into(),
            input_tokens: 3,
            output_tokens: 1,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["inputTokens"], 3);
        assert_eq!(json["outputTokens"], 1);
    }

    #[test]
    fn error_details_are_optional() {
        let err: ErrorReply = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(err.details.is_none());
    }
}
