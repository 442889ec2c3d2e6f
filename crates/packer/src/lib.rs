//! Codebase packer: flattens a project directory into one Markdown document
//! (a file-structure tree, then every file in a fenced block) that can be
//! pasted into a model's context.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Paths left out of every pack.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".env",
    ".git",
    "node_modules",
    "package-lock.json",
    ".DS_Store",
    "*.log",
    "*.tmp",
    "*.temp",
    "*.swp",
    "*.swo",
    "thumbs.db",
    ".vscode",
    ".idea",
    "*.png",
    "*.ico",
    ".breakpoints",
    ".cache",
    ".local",
    ".config",
    ".upm",
    ".gitattributes",
    ".gitignore",
    "*.sqlite",
    "dist/**/*",
];

const STRUCTURE_HEADING: &str = "# Current Project File Structure";

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PackError + '_ {
    move |source| PackError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Exclusion rules over root-relative, `/`-separated paths.
///
/// - wildcard patterns without `/` match the file name;
/// - wildcard patterns with `/` match the whole relative path;
/// - plain patterns match a path that starts with them or has them as a
///   directory component.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    names: GlobSet,
    paths: GlobSet,
    plain: Vec<String>,
}

impl ExcludeRules {
    /// The default list plus `extra`.
    pub fn new(extra: &[String]) -> Result<Self, PackError> {
        let mut names = GlobSetBuilder::new();
        let mut paths = GlobSetBuilder::new();
        let mut plain = Vec::new();

        let patterns = DEFAULT_EXCLUDES.iter().copied().chain(extra.iter().map(String::as_str));
        for pattern in patterns {
            if pattern.contains(['*', '?', '[']) {
                if pattern.contains('/') {
                    paths.add(Glob::new(pattern)?);
                } else {
                    names.add(Glob::new(pattern)?);
                }
            } else {
                plain.push(pattern.trim_matches('/').to_string());
            }
        }

        Ok(Self {
            names: names.build()?,
            paths: paths.build()?,
            plain,
        })
    }

    pub fn is_excluded(&self, rel: &str) -> bool {
        let name = rel.rsplit('/').next().unwrap_or(rel);
        if self.names.is_match(name) || self.paths.is_match(rel) {
            return true;
        }
        let wrapped = format!("/{rel}/");
        self.plain
            .iter()
            .any(|p| rel.starts_with(p.as_str()) || wrapped.contains(&format!("/{p}/")))
    }
}

/// Summary of a finished pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub output: PathBuf,
    /// Files whose content was written.
    pub files: usize,
    /// Files listed in the tree but left out for not being UTF-8.
    pub skipped: Vec<String>,
    pub bytes: usize,
}

#[derive(Debug)]
enum Node {
    Dir { name: String, children: Vec<Node> },
    File { name: String, rel: String, path: PathBuf },
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::Dir { name, .. } | Node::File { name, .. } => name,
        }
    }
}

/// Packs one directory tree.
#[derive(Debug)]
pub struct Packer {
    root: PathBuf,
    rules: ExcludeRules,
}

impl Packer {
    pub fn new(root: impl Into<PathBuf>, extra_excludes: &[String]) -> Result<Self, PackError> {
        Ok(Self {
            root: root.into(),
            rules: ExcludeRules::new(extra_excludes)?,
        })
    }

    /// Render the pack document. `skip` is a path (usually the output file)
    /// left out of both the tree and the contents.
    pub fn render(&self, skip: Option<&Path>) -> Result<(String, PackReport), PackError> {
        let nodes = self.walk(&self.root, "", skip)?;

        let mut tree = String::new();
        render_tree(&nodes, "", &mut tree);
        let structure = format!("{STRUCTURE_HEADING}\n```\n{tree}```\n");

        let mut report = PackReport {
            output: skip.map(Path::to_path_buf).unwrap_or_default(),
            files: 0,
            skipped: Vec::new(),
            bytes: 0,
        };

        let mut document = String::new();
        document.push_str(&structure);
        document.push('\n');
        render_files(&nodes, &mut document, &mut report);
        document.push('\n');
        document.push_str(&structure);

        report.bytes = document.len();
        Ok((document, report))
    }

    fn walk(&self, dir: &Path, rel_dir: &str, skip: Option<&Path>) -> Result<Vec<Node>, PackError> {
        let mut nodes = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let entry = entry.map_err(io_err(dir))?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = if rel_dir.is_empty() {
                name.clone()
            } else {
                format!("{rel_dir}/{name}")
            };

            if skip.is_some_and(|s| s == path) || self.rules.is_excluded(&rel) {
                debug!(path = %rel, "Excluded");
                continue;
            }

            let file_type = entry.file_type().map_err(io_err(&path))?;
            if file_type.is_symlink() {
                debug!(path = %rel, "Skipping symlink");
                continue;
            }

            if file_type.is_dir() {
                let children = self.walk(&path, &rel, skip)?;
                nodes.push(Node::Dir { name, children });
            } else {
                nodes.push(Node::File { name, rel, path });
            }
        }
        nodes.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(nodes)
    }
}

fn render_tree(nodes: &[Node], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(node.name());
        out.push('\n');
        if let Node::Dir { children, .. } = node {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_tree(children, &child_prefix, out);
        }
    }
}

fn render_files(nodes: &[Node], out: &mut String, report: &mut PackReport) {
    for node in nodes {
        match node {
            Node::Dir { children, .. } => render_files(children, out, report),
            Node::File { name, rel, path } => match fs::read_to_string(path) {
                Ok(content) => {
                    let ext = Path::new(name)
                        .extension()
                        .map(|e| e.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    out.push_str(&format!("# {rel}\n\n```{ext}\n{content}\n```\n\n"));
                    report.files += 1;
                }
                Err(e) => {
                    warn!(path = %rel, error = %e, "Skipping unreadable file");
                    report.skipped.push(rel.clone());
                }
            },
        }
    }
}

/// Pack `root` into `output`. A relative `output` is resolved against
/// `root`.
pub fn pack(root: &Path, output: &Path, extra_excludes: &[String]) -> Result<PackReport, PackError> {
    let output = if output.is_absolute() {
        output.to_path_buf()
    } else {
        root.join(output)
    };

    let packer = Packer::new(root, extra_excludes)?;
    let (document, report) = packer.render(Some(&output))?;
    fs::write(&output, &document).map_err(io_err(&output))?;

    info!(
        output = %output.display(),
        files = report.files,
        skipped = report.skipped.len(),
        "Codebase packaged"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn default_exclusions() {
        let rules = ExcludeRules::new(&[]).unwrap();
        assert!(rules.is_excluded(".env"));
        assert!(rules.is_excluded("node_modules"));
        assert!(rules.is_excluded("src/node_modules/pkg/index.js"));
        assert!(rules.is_excluded("logs/server.log"));
        assert!(rules.is_excluded("assets/logo.png"));
        assert!(rules.is_excluded("dist/bundle.js"));
        assert!(rules.is_excluded("dist/js/app.js"));
        assert!(!rules.is_excluded("src/main.js"));
        assert!(!rules.is_excluded("index.html"));
        assert!(!rules.is_excluded("src/distance.js"));
    }

    #[test]
    fn extra_patterns_are_added() {
        let rules = ExcludeRules::new(&["*.md".into(), "vendor".into()]).unwrap();
        assert!(rules.is_excluded("README.md"));
        assert!(rules.is_excluded("vendor/lib.js"));
        assert!(!rules.is_excluded("src/app.js"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = ExcludeRules::new(&["src/[".into()]).unwrap_err();
        assert!(matches!(err, PackError::Pattern(_)));
    }

    #[test]
    fn pack_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "index.html", b"<p>hi</p>");
        write(root, "js/app.js", b"run();");
        write(root, "debug.log", b"noise");

        let report = pack(root, Path::new("codebase.md"), &[]).unwrap();
        assert_eq!(report.files, 2);

        let doc = fs::read_to_string(root.join("codebase.md")).unwrap();
        let structure = "# Current Project File Structure\n```\n├── index.html\n└── js\n    └── app.js\n```\n";
        assert!(doc.starts_with(&format!("{structure}\n# index.html\n\n```html\n<p>hi</p>\n```\n\n")));
        assert!(doc.contains("# js/app.js\n\n```js\nrun();\n```\n\n"));
        assert!(doc.ends_with(&format!("```\n\n\n{structure}")));
        assert!(!doc.contains("debug.log"));
    }

    #[test]
    fn last_connector_ignores_excluded_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a.js", b"1");
        write(root, "z.png", b"binary");

        let (doc, _) = Packer::new(root, &[]).unwrap().render(None).unwrap();
        assert!(doc.contains("```\n└── a.js\n```"));
    }

    #[test]
    fn output_file_is_not_packed_twice() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "main.css", b"body{}");

        pack(root, Path::new("out.md"), &[]).unwrap();
        let report = pack(root, Path::new("out.md"), &[]).unwrap();
        assert_eq!(report.files, 1);
        let doc = fs::read_to_string(root.join("out.md")).unwrap();
        assert!(!doc.contains("out.md"));
    }

    #[test]
    fn non_utf8_files_are_listed_but_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "font.woff", &[0xff, 0xfe, 0x00, 0x9f]);
        write(root, "app.js", b"ok");

        let (doc, report) = Packer::new(root, &[]).unwrap().render(None).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.skipped, vec!["font.woff".to_string()]);
        assert!(doc.contains("└── font.woff"));
        assert!(!doc.contains("# font.woff"));
    }
}
