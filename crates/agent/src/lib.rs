//! The chat assistant core for Sitewright.
//!
//! A session accumulates conversation turns, builds a prompt from them,
//! sends it to a generation backend and meters the cost:
//!
//! 1. **Accumulate** user and assistant turns plus attached files
//! 2. **Build** the prompt from a window over the history
//! 3. **Generate** through the in-process provider router or the gateway
//! 4. **Record** token counts and cost in the session ledger
//!
//! Artifact tasks (HTML, CSS, JavaScript, README, questions, advice) use the
//! same pipeline with structured prompts and post-processing.

pub mod chat;
pub mod extract;
pub mod invoker;
pub mod prompt;
pub mod tasks;
pub mod window;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use sitewright_config::AppConfig;
use sitewright_core::Generator;
use sitewright_providers::{GatewayClient, build_from_config};

pub use chat::{ChatSession, FAILURE_NOTICE, Failure, Reply, SendOutcome, SessionHandle};
pub use extract::{CodeBlock, extract_code_blocks};
pub use invoker::GenerationInvoker;
pub use tasks::{GeneratedProject, TaskKind, UnknownTask};
pub use window::ContextWindow;

/// The generation backend a session should use: the gateway when one is
/// configured, otherwise the providers directly.
pub fn backend_from_config(config: &AppConfig) -> Arc<dyn Generator> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match config
        .chat
        .gateway_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    {
        Some(url) => {
            tracing::info!(gateway = %url, "Using gateway backend");
            Arc::new(GatewayClient::new(url, timeout))
        }
        None => {
            let router = build_from_config(config);
            tracing::info!(providers = ?router.list(), "Using in-process provider router");
            Arc::new(router)
        }
    }
}
