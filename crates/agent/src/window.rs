//! Context window policy: how much history goes into a prompt.

use sitewright_core::Turn;
use tracing::warn;

/// Default number of user/assistant turn pairs kept when limiting is on.
pub const DEFAULT_DEPTH: usize = 5;

/// Limits prompts to the most recent `depth` turn pairs when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    enabled: bool,
    depth: usize,
}

impl ContextWindow {
    /// A window over `depth` turn pairs. Values below 1 clamp to 1.
    pub fn new(enabled: bool, depth: i64) -> Self {
        let clamped = if depth < 1 {
            warn!(depth, "Context depth must be at least 1, clamping");
            1
        } else {
            usize::try_from(depth).unwrap_or(usize::MAX)
        };
        Self {
            enabled,
            depth: clamped,
        }
    }

    /// Parse a user-supplied depth. Anything that is not a positive integer
    /// clamps to 1.
    pub fn parse(enabled: bool, raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(depth) => Self::new(enabled, depth),
            Err(_) => {
                warn!(value = %raw, "Context depth is not an integer, clamping to 1");
                Self::new(enabled, 1)
            }
        }
    }

    /// Use the whole conversation.
    pub fn unlimited() -> Self {
        Self {
            enabled: false,
            depth: DEFAULT_DEPTH,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The turns a prompt should include: the last `2 * depth` when enabled,
    /// otherwise all of them.
    pub fn slice<'a>(&self, turns: &'a [Turn]) -> &'a [Turn] {
        if !self.enabled {
            return turns;
        }
        let keep = self.depth.saturating_mul(2);
        &turns[turns.len().saturating_sub(keep)..]
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl std::fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.enabled {
            write!(f, "last {} exchanges", self.depth)
        } else {
            write!(f, "full conversation")
        }
    }
}
