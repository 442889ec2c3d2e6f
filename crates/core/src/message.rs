//! Turn and Role domain types.
//!
//! A turn is one message in a session, in send order:
//! User types a request → it becomes a user turn → the model's answer becomes an assistant turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person driving the session
    User,
    /// The language model
    Assistant,
}

impl Role {
    /// Raw role token, as used in prompt history lines (`user`, `assistant`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Capitalized role label, as used in the flattened transcript (`User`, `Assistant`).
    pub fn title(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who sent this turn
    pub role: Role,

    /// The text content (may be empty)
    pub content: String,

    /// When the turn was created
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// `"<role>: <content>"` with the raw lowercase role token.
    pub fn history_line(&self) -> String {
        format!("{}: {}", self.role.as_str(), self.content)
    }

    /// `"<Role>: <content>\n"` with the capitalized label.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}\n", self.role.title(), self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Build me a landing page");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Build me a landing page");
    }

    #[test]
    fn role_labels_differ_only_in_case() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::User.title(), "User");
        assert_eq!(Role::Assistant.as_str(), "assistant");
        assert_eq!(Role::Assistant.title(), "Assistant");
    }

    #[test]
    fn two_renderings_of_the_same_turn() {
        let turn = Turn::assistant("Here you go");
        assert_eq!(turn.history_line(), "assistant: Here you go");
        assert_eq!(turn.transcript_line(), "Assistant: Here you go\n");
    }

    #[test]
    fn empty_content_is_allowed() {
        let turn = Turn::user("");
        assert_eq!(turn.history_line(), "user: ");
        assert_eq!(turn.transcript_line(), "User: \n");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
