//! The chat session: ties the transcript, prompt building, generation and
//! cost tracking together.
//!
//! ```text
//! input ──► prompt::build ──► GenerationInvoker ──► transcript + CostMeter
//! ```
//!
//! A session runs one generation at a time. `ChatSession` enforces that
//! through `&mut self`; `SessionHandle` shares a session and turns an
//! overlapping call into [`SendOutcome::Busy`].

use std::sync::Arc;

use sitewright_config::AppConfig;
use sitewright_core::{Generation, GenerationError, ModelId, Role, SessionState, Turn};
use sitewright_telemetry::{CostLedger, CostMeter};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::extract::{self, CodeBlock};
use crate::invoker::GenerationInvoker;
use crate::prompt;
use crate::tasks::{self, GeneratedProject, TaskKind};
use crate::window::ContextWindow;

/// Shown to the user when a chat generation fails.
pub const FAILURE_NOTICE: &str = "An error occurred while generating the response. Please try again.";

/// A successful generation as seen by the session's user.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Assistant text, or the post-processed artifact for tasks.
    pub content: String,
    pub model: ModelId,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated: bool,
    /// Cost of this generation; `None` when it could not be priced.
    pub cost_usd: Option<f64>,
}

/// A failed generation. The notice is for display and is not part of the
/// transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub notice: Turn,
    pub error: GenerationError,
}

impl Failure {
    fn new(error: GenerationError) -> Self {
        Self {
            notice: Turn::assistant(FAILURE_NOTICE),
            error,
        }
    }
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input; nothing changed.
    Skipped,
    /// Another generation is in flight; nothing changed.
    Busy,
    Replied(Reply),
    Failed(Failure),
}

/// One user's conversation with the assistant.
#[derive(Debug)]
pub struct ChatSession {
    state: SessionState,
    window: ContextWindow,
    model: ModelId,
    include_attachments: bool,
    project: GeneratedProject,
    invoker: GenerationInvoker,
    meter: CostMeter,
}

impl ChatSession {
    pub fn new(invoker: GenerationInvoker, meter: CostMeter) -> Self {
        Self {
            state: SessionState::new(),
            window: ContextWindow::default(),
            model: ModelId::default(),
            include_attachments: true,
            project: GeneratedProject::default(),
            invoker,
            meter,
        }
    }

    /// A session with the model and chat preferences from configuration.
    pub fn from_config(config: &AppConfig, invoker: GenerationInvoker, meter: CostMeter) -> Self {
        let mut session = Self::new(invoker, meter);
        session.model = config.model();
        session.window = ContextWindow::new(config.chat.limit_context, config.chat.context_depth);
        session.include_attachments = config.chat.include_attachments;
        session
    }

    /// Submit a chat message.
    pub async fn send(&mut self, input: &str) -> SendOutcome {
        let input = input.trim();
        if input.is_empty() {
            return SendOutcome::Skipped;
        }

        // The input is recorded before the call, so it is also the last
        // history line of its own prompt.
        self.state.append_turn(Role::User, input);

        let attachments = if self.include_attachments {
            self.state.selected_attachments()
        } else {
            Vec::new()
        };
        let prompt = prompt::build(&self.window, self.state.turns(), input, &attachments);

        match self.invoker.generate_with(self.model, &prompt).await {
            Ok(generation) => {
                self.state.append_turn(Role::Assistant, generation.content.clone());
                let cost_usd = self.record_cost(&generation);
                SendOutcome::Replied(reply(generation, cost_usd))
            }
            Err(e) => {
                error!(session = %self.state.id(), model = %self.model, error = %e, "Chat generation failed");
                SendOutcome::Failed(Failure::new(e))
            }
        }
    }

    /// Run an artifact task. Unlike `send`, blank input still runs.
    pub async fn run_task(&mut self, kind: TaskKind, input: &str) -> SendOutcome {
        let input = input.trim();
        if !input.is_empty() {
            self.state.append_turn(Role::User, input);
        }

        let prompt = tasks::prompt(kind, self.state.transcript(), &self.project, input);

        match self.invoker.generate_with(self.model, &prompt).await {
            Ok(generation) => {
                let artifact = tasks::post_process(kind, &generation.content);
                self.project.apply(kind, &artifact);
                for turn in tasks::transcript_turns(kind, &artifact) {
                    self.state.append_turn(Role::Assistant, turn);
                }
                let cost_usd = self.record_cost(&generation);
                info!(task = %kind, chars = artifact.len(), "Task completed");
                SendOutcome::Replied(reply(Generation { content: artifact, ..generation }, cost_usd))
            }
            Err(e) => {
                error!(session = %self.state.id(), task = %kind, error = %e, "Task generation failed");
                SendOutcome::Failed(Failure::new(e))
            }
        }
    }

    fn record_cost(&mut self, generation: &Generation) -> Option<f64> {
        match self
            .meter
            .record(generation.model, generation.input_tokens, generation.output_tokens)
        {
            Ok(cost) => Some(cost),
            Err(e) => {
                error!(model = %generation.model, error = %e, "Could not price generation");
                None
            }
        }
    }

    /// Switch models. An unsupported id leaves the session untouched.
    pub fn set_model(&mut self, model_id: &str) -> Result<ModelId, GenerationError> {
        let model: ModelId = model_id.parse()?;
        debug!(from = %self.model, to = %model, "Model changed");
        self.model = model;
        Ok(model)
    }

    pub fn set_window(&mut self, window: ContextWindow) {
        self.window = window;
    }

    pub fn set_include_attachments(&mut self, include: bool) {
        self.include_attachments = include;
    }

    pub fn attach_file(&mut self, name: &str, content: impl Into<String>, language: Option<&str>) {
        self.state.attach_file(name, content, language);
    }

    pub fn set_selected(&mut self, name: &str, included: bool) {
        self.state.set_selected(name, included);
    }

    /// Start over: new session id, empty transcript, attachments, project
    /// and ledger. Model and preferences are kept.
    pub fn reset(&mut self) {
        let previous = self.state.id().clone();
        self.state = SessionState::new();
        self.project = GeneratedProject::default();
        self.meter.reset();
        info!(previous = %previous, session = %self.state.id(), "Session reset");
    }

    /// Fenced code blocks of the most recent assistant turn.
    pub fn latest_code_blocks(&self) -> Vec<CodeBlock> {
        self.state
            .turns()
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
            .map(|turn| extract::extract_code_blocks(&turn.content))
            .unwrap_or_default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn window(&self) -> ContextWindow {
        self.window
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn include_attachments(&self) -> bool {
        self.include_attachments
    }

    pub fn project(&self) -> &GeneratedProject {
        &self.project
    }

    pub fn ledger(&self) -> &CostLedger {
        self.meter.ledger()
    }

    pub fn meter(&self) -> &CostMeter {
        &self.meter
    }

    pub fn invoker(&self) -> &GenerationInvoker {
        &self.invoker
    }
}

fn reply(generation: Generation, cost_usd: Option<f64>) -> Reply {
    Reply {
        content: generation.content,
        model: generation.model,
        input_tokens: generation.input_tokens,
        output_tokens: generation.output_tokens,
        estimated: generation.estimated,
        cost_usd,
    }
}

/// A shareable session that refuses overlapping generations.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<ChatSession>>,
}

impl SessionHandle {
    pub fn new(session: ChatSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Like [`ChatSession::send`], but returns `Busy` at once while another
    /// generation holds the session.
    pub async fn send(&self, input: &str) -> SendOutcome {
        if input.trim().is_empty() {
            return SendOutcome::Skipped;
        }
        match self.inner.try_lock() {
            Ok(mut session) => session.send(input).await,
            Err(_) => {
                debug!("Generation already in flight, refusing send");
                SendOutcome::Busy
            }
        }
    }

    pub async fn run_task(&self, kind: TaskKind, input: &str) -> SendOutcome {
        match self.inner.try_lock() {
            Ok(mut session) => session.run_task(kind, input).await,
            Err(_) => {
                debug!(task = %kind, "Generation already in flight, refusing task");
                SendOutcome::Busy
            }
        }
    }

    /// Wait for the session, for reads and configuration changes.
    pub async fn lock(&self) -> MutexGuard<'_, ChatSession> {
        self.inner.lock().await
    }
}
