//! Session state: the running transcript, attachments and selection.
//!
//! A `SessionState` is created when a session starts and dropped when it
//! ends. Every mutation is additive except attachment replacement and
//! selection toggling.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::message::{Role, Turn};

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named text artifact the user can select for inclusion in prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub content: String,
    /// Fence tag used when the attachment is rendered into a prompt.
    pub language: String,
}

impl Attachment {
    /// Build an attachment, deriving the language from the file extension
    /// when none is given.
    pub fn new(name: impl Into<String>, content: impl Into<String>, language: Option<&str>) -> Self {
        let name = name.into();
        let language = match language.map(str::trim) {
            Some(lang) if !lang.is_empty() => lang.to_string(),
            _ => language_for(&name).to_string(),
        };
        Self {
            name,
            content: content.into(),
            language,
        }
    }
}

/// Fence language for a file name.
pub fn language_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "html",
        "css" => "css",
        "js" => "javascript",
        _ => "plaintext",
    }
}

/// The Context Accumulator for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    id: SessionId,
    turns: Vec<Turn>,
    transcript: String,
    attachments: HashMap<String, Attachment>,
    selected: Vec<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Append a turn and extend the flattened transcript.
    pub fn append_turn(&mut self, role: Role, content: impl Into<String>) {
        let turn = Turn::new(role, content);
        self.transcript.push_str(&turn.transcript_line());
        self.turns.push(turn);
    }

    /// Add or replace an attachment by name.
    pub fn attach_file(&mut self, name: impl Into<String>, content: impl Into<String>, language: Option<&str>) {
        let attachment = Attachment::new(name, content, language);
        self.attachments.insert(attachment.name.clone(), attachment);
    }

    /// Mark `name` for inclusion in prompts, or clear the mark.
    ///
    /// Names without an attachment are still recorded; they simply produce
    /// nothing when prompts are built.
    pub fn set_selected(&mut self, name: &str, included: bool) {
        let position = self.selected.iter().position(|n| n == name);
        match (included, position) {
            (true, None) => self.selected.push(name.to_string()),
            (false, Some(idx)) => {
                self.selected.remove(idx);
            }
            _ => {}
        }
    }

    /// Selected attachments in selection order. Unknown names are skipped.
    pub fn selected_attachments(&self) -> Vec<&Attachment> {
        self.selected
            .iter()
            .filter_map(|name| self.attachments.get(name))
            .collect()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The flattened `"<Role>: <content>\n"` transcript.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn attachment(&self, name: &str) -> Option<&Attachment> {
        self.attachments.get(name)
    }

    /// All attachments, sorted by name.
    pub fn attachments(&self) -> Vec<&Attachment> {
        let mut all: Vec<&Attachment> = self.attachments.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
