//! The catalog of supported models.
//!
//! Exactly two model ids are recognised. Each one pins an upstream provider,
//! the upstream model name, sampling settings, and how token usage is counted.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GenerationError;

/// A recognised model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    /// Fast, cheap default (`gpt-4o-mini`).
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Fast,
    /// Slower, higher-quality model (`claude-3-5-sonnet`).
    #[serde(rename = "claude-3-5-sonnet")]
    Quality,
}

/// Which upstream API serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How input/output token counts are obtained for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCounting {
    /// Counts come from the provider's usage block.
    Reported,
    /// Counts are whitespace word counts. Approximate on purpose.
    Estimated,
}

impl ModelId {
    /// Every recognised model, default first.
    pub const ALL: [ModelId; 2] = [ModelId::Fast, ModelId::Quality];

    /// The public identifier clients send.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "gpt-4o-mini",
            Self::Quality => "claude-3-5-sonnet",
        }
    }

    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Fast => ProviderKind::OpenAi,
            Self::Quality => ProviderKind::Anthropic,
        }
    }

    /// Model name sent to the upstream API.
    pub fn upstream_model(&self) -> &'static str {
        match self {
            Self::Fast => "gpt-4o-mini",
            Self::Quality => "claude-3-5-sonnet-20240620",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            Self::Fast => 0.7,
            Self::Quality => 0.0,
        }
    }

    /// Response length cap; `None` leaves the provider default.
    pub fn max_tokens(&self) -> Option<u32> {
        match self {
            Self::Fast => None,
            Self::Quality => Some(8192),
        }
    }

    pub fn token_counting(&self) -> TokenCounting {
        match self {
            Self::Fast => TokenCounting::Reported,
            Self::Quality => TokenCounting::Estimated,
        }
    }
}

impl FromStr for ModelId {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| GenerationError::UnsupportedModel(s.to_string()))
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
