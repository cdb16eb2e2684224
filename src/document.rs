//! Markdown rendering of the collected project.

use crate::{
    error::{Error, Result},
    file::{CollectedFile, FileContent},
};
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "document";

/// The project tree and collected files, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDocument {
    /// Base name of the project root
    pub project_name: String,

    /// Box-drawn directory tree, one entry per line
    pub tree_text: String,

    /// Collected files in traversal order
    pub files: Vec<CollectedFile>,
}

impl ProjectDocument {
    /// Creates a document.
    #[must_use]
    pub fn new(
        project_name: impl Into<String>,
        tree_text: impl Into<String>,
        files: Vec<CollectedFile>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            tree_text: tree_text.into(),
            files,
        }
    }

    /// Renders the document as Markdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if rendering fails.
    pub fn to_markdown(&self) -> Result<String> {
        MarkdownRenderer::new()?.render(self)
    }

    /// Number of collected files marked unreadable.
    #[must_use]
    pub fn unreadable_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_unreadable()).count()
    }
}

#[derive(Serialize)]
struct DocumentView<'a> {
    project_name: &'a str,
    tree: &'a str,
    tree_fence: String,
    files: Vec<FileView<'a>>,
}

#[derive(Serialize)]
struct FileView<'a> {
    path_code: String,
    tag: &'a str,
    fence: String,
    readable: bool,
    body: &'a str,
    reason: &'a str,
}

impl<'a> FileView<'a> {
    fn new(file: &'a CollectedFile) -> Self {
        match &file.content {
            FileContent::Text(text) => {
                let body = text
                    .strip_suffix("\r\n")
                    .or_else(|| text.strip_suffix('\n'))
                    .unwrap_or(text.as_str());
                Self {
                    path_code: inline_code(&file.relative_path),
                    tag: &file.language_tag,
                    fence: fence_for(body),
                    readable: true,
                    body,
                    reason: "",
                }
            }
            FileContent::Unreadable { reason } => Self {
                path_code: inline_code(&file.relative_path),
                tag: &file.language_tag,
                fence: fence_for(reason),
                readable: false,
                body: "",
                reason: reason.as_str(),
            },
        }
    }
}

/// Renders [`ProjectDocument`]s with the built-in Markdown template.
pub(crate) struct MarkdownRenderer {
    tera: Tera,
}

impl MarkdownRenderer {
    /// Creates a renderer with the built-in template registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to parse.
    pub(crate) fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_template(TEMPLATE_NAME, include_str!("../templates/document.md.tera"))
            .map_err(|e| Error::template(TEMPLATE_NAME, &e))?;

        Ok(Self { tera })
    }

    /// Renders a document.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub(crate) fn render(&self, document: &ProjectDocument) -> Result<String> {
        let view = DocumentView {
            project_name: &document.project_name,
            tree: &document.tree_text,
            tree_fence: fence_for(&document.tree_text),
            files: document.files.iter().map(FileView::new).collect(),
        };

        let context =
            Context::from_serialize(&view).map_err(|e| Error::template(TEMPLATE_NAME, &e))?;

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| Error::template(TEMPLATE_NAME, &e))
    }
}

/// Returns a backtick fence longer than any backtick run in `content`.
fn fence_for(content: &str) -> String {
    "`".repeat((longest_backtick_run(content) + 1).max(3))
}

/// Wraps `text` in a code span that survives embedded backticks.
fn inline_code(text: &str) -> String {
    let fence = "`".repeat(longest_backtick_run(text) + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn longest_backtick_run(content: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}
