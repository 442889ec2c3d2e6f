//! # Sitewright Core
//!
//! Domain types, traits, and error definitions for the Sitewright
//! web-project assistant. This crate has **no framework dependencies**: it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined as a trait here. Implementations live in their
//! respective crates:
//! - [`Provider`] is one upstream LLM API (OpenAI, Anthropic)
//! - [`Generator`] turns a model id and prompt into text plus token counts,
//!   either in-process or through the HTTP gateway

pub mod error;
pub mod message;
pub mod model;
pub mod provider;
pub mod generation;
pub mod session;
pub mod wire;

// Re-export key types at crate root for ergonomics
pub use error::{GenerationError, ProviderError};
pub use message::{Role, Turn};
pub use model::{ModelId, ProviderKind, TokenCounting};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use generation::{Credentials, Generation, GenerationRequest, Generator, mask_api_key};
pub use session::{Attachment, SessionId, SessionState, language_for};
