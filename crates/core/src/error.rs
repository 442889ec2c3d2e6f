//! Error types for the Sitewright domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// Failures reported by a single upstream provider adapter.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Map a `reqwest`-style transport failure message into a provider error,
    /// keeping timeouts distinguishable in logs.
    pub fn transport(timed_out: bool, message: impl Into<String>) -> Self {
        if timed_out {
            Self::Timeout(message.into())
        } else {
            Self::Network(message.into())
        }
    }
}

/// The error surface of a generation attempt.
///
/// Callers only ever see two outcomes: the model id was not recognised, or
/// the generation failed. Transport, status and payload problems all collapse
/// into `Failed` so no caller branches on transient vs. permanent failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Generation failed: {details}")]
    Failed { details: String },
}

impl GenerationError {
    pub fn failed(details: impl Into<String>) -> Self {
        Self::Failed {
            details: details.into(),
        }
    }
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        Self::failed(err.to_string())
    }
}
