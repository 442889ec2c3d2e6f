//! Generation Invoker: validates the model id and hands the prompt to a
//! generation backend.

use std::sync::Arc;

use sitewright_core::{Credentials, Generation, GenerationError, GenerationRequest, Generator, ModelId};
use tracing::{debug, warn};

/// Sends prompts to whichever backend the session was built with.
#[derive(Clone)]
pub struct GenerationInvoker {
    backend: Arc<dyn Generator>,
    credentials: Credentials,
}

impl GenerationInvoker {
    pub fn new(backend: Arc<dyn Generator>) -> Self {
        Self {
            backend,
            credentials: Credentials::default(),
        }
    }

    /// Per-request key overrides sent with every call.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate text for `prompt` with the model named `model_id`.
    ///
    /// An unrecognised id fails before the backend is called.
    pub async fn generate(&self, model_id: &str, prompt: &str) -> Result<Generation, GenerationError> {
        let model: ModelId = model_id.parse().inspect_err(|e| {
            warn!(model = %model_id, error = %e, "Rejected generation request");
        })?;
        self.generate_with(model, prompt).await
    }

    /// Generate with an already-validated model.
    pub async fn generate_with(&self, model: ModelId, prompt: &str) -> Result<Generation, GenerationError> {
        debug!(
            model = %model,
            backend = self.backend.name(),
            prompt_len = prompt.len(),
            "Invoking generation"
        );
        let request = GenerationRequest::new(model, prompt).with_credentials(self.credentials.clone());
        self.backend.generate(request).await
    }
}

impl std::fmt::Debug for GenerationInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationInvoker")
            .field("backend", &self.backend.name())
            .field("credentials", &self.credentials)
            .finish()
    }
}
