//! LLM Provider implementations for Sitewright.
//!
//! All providers implement the `sitewright_core::Provider` trait.
//! The router maps a model id to its provider and implements
//! `sitewright_core::Generator`; the gateway client implements the same
//! trait over HTTP.

pub mod anthropic;
pub mod gateway_client;
pub mod openai_compat;
pub mod router;
pub mod tokens;

pub use anthropic::AnthropicProvider;
pub use gateway_client::GatewayClient;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
pub use tokens::estimate_tokens;

use std::time::Duration;

/// Build an HTTP client bounded by `timeout`.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}
