//! Artifact tasks: structured prompts that produce or revise one piece of
//! the generated project.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::extract;

/// What a task asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Html,
    Css,
    JavaScript,
    Readme,
    Question,
    ImplementationAdvice,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Html,
        TaskKind::Css,
        TaskKind::JavaScript,
        TaskKind::Readme,
        TaskKind::Question,
        TaskKind::ImplementationAdvice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::JavaScript => "javascript",
            Self::Readme => "readme",
            Self::Question => "question",
            Self::ImplementationAdvice => "advice",
        }
    }

    /// Kinds whose result replaces a project artifact.
    pub fn is_code(&self) -> bool {
        matches!(self, Self::Html | Self::Css | Self::JavaScript | Self::Readme)
    }

    /// Fence tag used when the artifact is echoed into the transcript.
    fn fence(&self) -> Option<&'static str> {
        match self {
            Self::Html => Some("html"),
            Self::Css => Some("css"),
            Self::JavaScript => Some("javascript"),
            Self::Readme => Some("markdown"),
            Self::Question | Self::ImplementationAdvice => None,
        }
    }

    fn heading(&self) -> Option<&'static str> {
        match self {
            Self::Html => Some("Updated HTML:"),
            Self::Css => Some("Updated CSS:"),
            Self::JavaScript => Some("Updated JavaScript:"),
            Self::Readme => Some("Generated README.md:"),
            Self::ImplementationAdvice => Some("Implementation Advice:"),
            Self::Question => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised task name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task: {0}")]
pub struct UnknownTask(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "css" => Ok(Self::Css),
            "js" | "javascript" => Ok(Self::JavaScript),
            "readme" => Ok(Self::Readme),
            "question" => Ok(Self::Question),
            "advice" | "implementation-advice" => Ok(Self::ImplementationAdvice),
            _ => Err(UnknownTask(s.to_string())),
        }
    }
}

/// The artifacts generated so far in a session. Each starts empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub html: String,
    pub css: String,
    pub javascript: String,
    pub readme: String,
}

impl GeneratedProject {
    /// Store a post-processed result. Non-code kinds leave the project alone.
    pub fn apply(&mut self, kind: TaskKind, artifact: &str) {
        let slot = match kind {
            TaskKind::Html => &mut self.html,
            TaskKind::Css => &mut self.css,
            TaskKind::JavaScript => &mut self.javascript,
            TaskKind::Readme => &mut self.readme,
            TaskKind::Question | TaskKind::ImplementationAdvice => return,
        };
        *slot = artifact.to_string();
    }

    /// Files to write on export: `(file name, content)` for every non-empty
    /// artifact.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        [
            ("index.html", self.html.as_str()),
            ("styles.css", self.css.as_str()),
            ("script.js", self.javascript.as_str()),
            ("README.md", self.readme.as_str()),
        ]
        .into_iter()
        .filter(|(_, content)| !content.is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }
}

const INDENT: &str = "            ";

/// Build the prompt for a task.
///
/// `context` is the flattened transcript, which already holds the task's own
/// input when that input was non-blank.
pub fn prompt(kind: TaskKind, context: &str, project: &GeneratedProject, input: &str) -> String {
    match kind {
        TaskKind::Html => format!(
            "Project context:\n{context}\n\nCurrent HTML:\n{}\n\nUser input: {input}\n\n\
             Please update or generate HTML based on the project context, current HTML, and user input. \
             If starting fresh, create a complete HTML structure for the project described. \
             Return only the HTML code without any explanation, comments, or markdown formatting. \
             Do not include any text outside the HTML code.",
            project.html
        ),
        TaskKind::Css => format!(
            "Project context:\n{context}\n\nCurrent CSS:\n{}\n\nUser input: {input}\n\n\
             Please update or generate CSS based on the project context, current CSS, and user input. \
             If starting fresh, create complete styles for the project described. \
             Return only the CSS code without any explanation, comments, or markdown formatting. \
             Do not include any text outside the CSS code.",
            project.css
        ),
        TaskKind::JavaScript => format!(
            "Project context:\n{context}\n\nCurrent JavaScript:\n{}\n\nUser input: {input}\n\n\
             Please update or generate JavaScript based on the project context, current JavaScript, and user input. \
             If starting fresh, create complete functionality for the project described. \
             Ensure all necessary functions and event listeners are included. \
             Return only the JavaScript code without any explanation, comments, or markdown formatting. \
             Do not include any text outside the JavaScript code.",
            project.javascript
        ),
        TaskKind::Readme => format!(
            "Project context:\n{context}\n\nCurrent HTML:\n{}\n\nCurrent CSS:\n{}\n\n\
             Current JavaScript:\n{}\n\nUser input: {input}\n\n\
             Please generate a README.md file for this project. \
             Include sections such as project description, installation instructions, usage, features, \
             and any other relevant information. Format the content in Markdown. \
             Return only the README content without any additional explanation or formatting.",
            project.html, project.css, project.javascript
        ),
        TaskKind::Question => format!(
            "Based on the following project context and user input, \
             generate a relevant clarifying question about the project:\n\n\
             {INDENT}Project context:\n{INDENT}{context}\n\n\
             {INDENT}User input:\n{INDENT}{input}\n\n\
             {INDENT}Clarifying question:"
        ),
        TaskKind::ImplementationAdvice => format!(
            "Based on the following project context, generated code, and user input, \
             provide advice on how to implement and run this project. \
             Include information about whether a local server is needed, any necessary setup steps, \
             and how to view or interact with the project. \
             If there are multiple files, explain how they should be organized and linked.\n\n\
             {INDENT}Project context:\n{INDENT}{context}\n\n\
             {INDENT}Current HTML:\n{INDENT}{}\n\n\
             {INDENT}Current CSS:\n{INDENT}{}\n\n\
             {INDENT}Current JavaScript:\n{INDENT}{}\n\n\
             {INDENT}User input:\n{INDENT}{input}\n\
             {INDENT}Implementation advice:",
            project.html, project.css, project.javascript
        ),
    }
}

/// Clean a raw model result for `kind`.
pub fn post_process(kind: TaskKind, raw: &str) -> String {
    match kind {
        TaskKind::Html => {
            let html = extract::strip_fences(raw);
            let html = extract::strip_html_comments(&html);
            extract::strip_doctype_preamble(&html)
        }
        TaskKind::Css | TaskKind::JavaScript => {
            let code = extract::strip_fences(raw);
            extract::strip_c_comments(&code)
        }
        TaskKind::Readme => extract::strip_fences(raw),
        TaskKind::Question | TaskKind::ImplementationAdvice => raw.to_string(),
    }
}

/// Assistant turns appended after a successful task, in order.
pub fn transcript_turns(kind: TaskKind, result: &str) -> Vec<String> {
    match (kind.heading(), kind.fence()) {
        (Some(heading), Some(fence)) => {
            vec![heading.to_string(), format!("```{fence}\n{result}\n```")]
        }
        (Some(heading), None) => vec![heading.to_string(), result.to_string()],
        (None, _) => vec![result.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_task_names() {
        assert_eq!("HTML".parse::<TaskKind>().unwrap(), TaskKind::Html);
        assert_eq!("js".parse::<TaskKind>().unwrap(), TaskKind::JavaScript);
        assert_eq!("advice".parse::<TaskKind>().unwrap(), TaskKind::ImplementationAdvice);
        assert!("deploy".parse::<TaskKind>().is_err());
        for kind in TaskKind::ALL {
            assert_eq!(kind.as_str().parse::<TaskKind>().unwrap(), kind);
        }
    }

    #[test]
    fn html_prompt_layout() {
        let project = GeneratedProject {
            html: "<p>old</p>".into(),
            ..Default::default()
        };
        let prompt = prompt(TaskKind::Html, "User: a todo app\n", &project, "add a footer");
        assert!(prompt.starts_with(
            "Project context:\nUser: a todo app\n\n\nCurrent HTML:\n<p>old</p>\n\nUser input: add a footer\n\nPlease update or generate HTML"
        ));
        assert!(prompt.ends_with("Do not include any text outside the HTML code."));
    }

    #[test]
    fn readme_prompt_includes_all_code() {
        let project = GeneratedProject {
            html: "H".into(),
            css: "C".into(),
            javascript: "J".into(),
            readme: String::new(),
        };
        let prompt = prompt(TaskKind::Readme, "ctx", &project, "");
        assert!(prompt.contains("Current HTML:\nH\n\nCurrent CSS:\nC\n\nCurrent JavaScript:\nJ\n\nUser input: \n\n"));
    }

    #[test]
    fn question_prompt_keeps_indentation() {
        let prompt = prompt(TaskKind::Question, "ctx", &GeneratedProject::default(), "why");
        assert!(prompt.contains("about the project:\n\n            Project context:\n            ctx\n\n"));
        assert!(prompt.ends_with("            User input:\n            why\n\n            Clarifying question:"));
    }

    #[test]
    fn advice_prompt_ends_without_blank_line() {
        let prompt = prompt(TaskKind::ImplementationAdvice, "ctx", &GeneratedProject::default(), "how");
        assert!(prompt.ends_with("            how\n            Implementation advice:"));
    }

    #[test]
    fn html_post_processing() {
        let raw = "```html\nSure!\n<!DOCTYPE html>\n<html><!-- note --><body></body></html>\n```";
        assert_eq!(
            post_process(TaskKind::Html, raw),
            "<!DOCTYPE html>\n<html><body></body></html>"
        );
    }

    #[test]
    fn css_post_processing() {
        let raw = "```css\n/* theme */\nbody { background: url(https://x.io/a.png); } // bg\n```";
        assert_eq!(
            post_process(TaskKind::Css, raw),
            "\nbody { background: url(https://x.io/a.png); } "
        );
    }

    #[test]
    fn non_code_results_are_untouched() {
        let raw = "```\nWhat colour scheme?\n```";
        assert_eq!(post_process(TaskKind::Question, raw), raw);
        assert_eq!(post_process(TaskKind::Readme, "```markdown\n# App\n```"), "# App");
    }

    #[test]
    fn transcript_turns_per_kind() {
        assert_eq!(
            transcript_turns(TaskKind::Css, "a{}"),
            vec!["Updated CSS:".to_string(), "```css\na{}\n```".to_string()]
        );
        assert_eq!(
            transcript_turns(TaskKind::Readme, "# R"),
            vec!["Generated README.md:".to_string(), "```markdown\n# R\n```".to_string()]
        );
        assert_eq!(
            transcript_turns(TaskKind::ImplementationAdvice, "use a server"),
            vec!["Implementation Advice:".to_string(), "use a server".to_string()]
        );
        assert_eq!(transcript_turns(TaskKind::Question, "Why?"), vec!["Why?".to_string()]);
    }

    #[test]
    fn project_apply_and_files() {
        let mut project = GeneratedProject::default();
        assert!(project.is_empty());
        project.apply(TaskKind::JavaScript, "run();");
        project.apply(TaskKind::Question, "ignored");
        assert_eq!(project.files(), vec![("script.js", "run();")]);
    }
}
