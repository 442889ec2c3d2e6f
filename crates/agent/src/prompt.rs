//! Prompt Builder: turns history, input and attachments into the exact text
//! sent to the model.
//!
//! The layout is part of the observable contract. The model is steered only
//! by these prose conventions, so every separator below is load-bearing.

use sitewright_core::{Attachment, Turn};

use crate::window::ContextWindow;

/// Closing instruction appended to every chat prompt.
pub const TRAILER: &str = "Assistant: Please provide your response. If you include any code snippets, always wrap them in triple backticks (```) for proper formatting.";

/// Build a chat prompt.
///
/// `history` is the conversation so far, normally already ending with the
/// turn for `user_input`. Blank input is not rejected here; callers skip it.
pub fn build(
    window: &ContextWindow,
    history: &[Turn],
    user_input: &str,
    attachments: &[&Attachment],
) -> String {
    let context = window
        .slice(history)
        .iter()
        .map(Turn::history_line)
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!("{context}\n\nHuman: {user_input}\n\n");

    if !attachments.is_empty() {
        prompt.push_str("Selected Files:\n");
        for attachment in attachments {
            prompt.push_str(&render_attachment(attachment));
        }
    }

    prompt.push_str(TRAILER);
    prompt
}

fn render_attachment(attachment: &Attachment) -> String {
    format!(
        "File: {}\nContent:\n```{}\n{}\n```\n\n",
        attachment.name, attachment.language, attachment.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitewright_core::Role;

    #[test]
    fn empty_history_layout() {
        let prompt = build(&ContextWindow::default(), &[], "make a todo app", &[]);
        assert_eq!(prompt, format!("\n\nHuman: make a todo app\n\n{TRAILER}"));
    }

    #[test]
    fn history_uses_lowercase_roles() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let prompt = build(&ContextWindow::default(), &history, "next", &[]);
        assert!(prompt.starts_with("user: hi\nassistant: hello\n\nHuman: next\n\n"));
    }

    #[test]
    fn attachment_block_format() {
        let a = Attachment::new("a.js", "x=1;", Some("javascript"));
        let prompt = build(&ContextWindow::default(), &[], "fix it", &[&a]);
        assert!(prompt.contains("Selected Files:\nFile: a.js\nContent:\n```javascript\nx=1;\n```"));
        assert!(prompt.contains("```\n\nAssistant: Please provide"));
    }

    #[test]
    fn attachments_keep_given_order() {
        let a = Attachment::new("b.css", "b{}", None);
        let b = Attachment::new("a.html", "<p></p>", None);
        let prompt = build(&ContextWindow::default(), &[], "go", &[&a, &b]);
        let first = prompt.find("File: b.css").unwrap();
        let second = prompt.find("File: a.html").unwrap();
        assert!(first < second);
        assert!(prompt.contains("```css\nb{}\n```"));
        assert!(prompt.contains("```html\n<p></p>\n```"));
    }

    #[test]
    fn trailer_is_always_last() {
        let history: Vec<Turn> = (0..7).map(|i| Turn::user(format!("m{i}"))).collect();
        let a = Attachment::new("notes.txt", "todo", None);
        for window in [ContextWindow::default(), ContextWindow::new(true, 1)] {
            for attachments in [vec![], vec![&a]] {
                let prompt = build(&window, &history, "q", &attachments);
                assert!(prompt.ends_with(TRAILER));
            }
        }
    }

    #[test]
    fn window_limits_rendered_history() {
        let history: Vec<Turn> = (0..8)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                Turn::new(role, format!("t{i}"))
            })
            .collect();
        let prompt = build(&ContextWindow::new(true, 1), &history, "q", &[]);
        assert!(prompt.starts_with("user: t6\nassistant: t7\n\nHuman: q"));
        assert!(!prompt.contains("t5"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let history = vec![Turn::user("a"), Turn::assistant("b")];
        let att = Attachment::new("x.js", "1", None);
        let one = build(&ContextWindow::new(true, 3), &history, "c", &[&att]);
        let two = build(&ContextWindow::new(true, 3), &history, "c", &[&att]);
        assert_eq!(one, two);
    }
}
