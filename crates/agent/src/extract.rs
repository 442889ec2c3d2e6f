//! Text clean-up applied to generated artifacts.

use regex::Regex;
use std::sync::LazyLock;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

// A `//` right after `:` is a URL scheme, not a comment.
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|[^:])//.*$").expect("valid regex"));

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([\w+-]*)[^\n]*\n(.*?)```").expect("valid regex"));

/// A fenced block found in model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Fence tag, empty when the fence had none.
    pub language: String,
    pub code: String,
}

/// Drop a leading fence line and a trailing fence line, then trim.
pub fn strip_fences(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.first().is_some_and(|l| l.trim().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

pub fn strip_html_comments(html: &str) -> String {
    HTML_COMMENT.replace_all(html, "").into_owned()
}

/// Drop anything before `<!DOCTYPE html>`. Text without a doctype is kept.
pub fn strip_doctype_preamble(html: &str) -> String {
    // ASCII lowercasing keeps byte offsets stable.
    match html.to_ascii_lowercase().find("<!doctype html>") {
        Some(start) => html[start..].to_string(),
        None => html.to_string(),
    }
}

/// Remove `/* */` block comments and `//` line comments.
pub fn strip_c_comments(code: &str) -> String {
    let without_blocks = BLOCK_COMMENT.replace_all(code, "");
    LINE_COMMENT.replace_all(&without_blocks, "$1").into_owned()
}

/// Every fenced block in `text`, in order.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    CODE_BLOCK
        .captures_iter(text)
        .map(|caps| CodeBlock {
            language: caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            code: caps
                .get(2)
                .map(|m| m.as_str().trim_end_matches('\n').to_string())
                .unwrap_or_default(),
        })
        .collect()
}
