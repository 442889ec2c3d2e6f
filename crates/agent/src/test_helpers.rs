//! Shared test helpers for session tests.

use async_trait::async_trait;
use sitewright_core::{Generation, GenerationError, GenerationRequest, Generator};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Token counts every scripted reply reports.
pub const SCRIPTED_INPUT_TOKENS: u32 = 10;
pub const SCRIPTED_OUTPUT_TOKENS: u32 = 5;

/// A mock generator that returns a sequence of scripted results.
///
/// Each call to `generate` returns the next result in the queue.
/// Panics if more calls are made than results provided.
pub struct ScriptedGenerator {
    results: Mutex<Vec<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    call_count: Mutex<usize>,
    gate: Option<Gate>,
}

/// Holds a call in flight until released.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ScriptedGenerator {
    pub fn new(results: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            results: Mutex::new(results),
            requests: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
            gate: None,
        }
    }

    /// Create a generator that succeeds with each text in turn.
    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    /// Every call waits for `gate.release` after signalling `gate.entered`.
    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> String {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|r| r.prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let model = request.model;
        let result = {
            let mut count = self.call_count.lock().unwrap();
            let results = self.results.lock().unwrap();
            if *count >= results.len() {
                panic!(
                    "ScriptedGenerator: no more results (call #{}, have {})",
                    *count,
                    results.len()
                );
            }
            let result = results[*count].clone();
            *count += 1;
            self.requests.lock().unwrap().push(request);
            result
        };

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        result.map(|content| Generation {
            model,
            content,
            input_tokens: SCRIPTED_INPUT_TOKENS,
            output_tokens: SCRIPTED_OUTPUT_TOKENS,
            estimated: false,
        })
    }
}
