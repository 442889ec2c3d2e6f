//! Whitespace token estimation.
//!
//! Used for providers whose counts are not taken from the response. The
//! result is a word count, not a tokenizer count, and callers flag it as
//! estimated.

/// Number of whitespace-separated words in `text`.
pub fn estimate_tokens(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}
