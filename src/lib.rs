//! # proj2md
//!
//! Turns a project directory into a single Markdown document for use as
//! context with large language models.
//!
//! ## Features
//!
//! - Box-drawn directory tree with deterministic ordering
//! - Content sections for files whose extension is in the registry
//! - Hidden entries skipped unless requested
//! - Unreadable files marked in place instead of aborting the run
//! - Atomic output write with optional backup
//!
//! ## Quick Start
//!
//! ```no_run
//! use proj2md::{Config, ExtensionRegistry, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .root_dir("./my-project")
//!     .registry(ExtensionRegistry::parse("*.rs(rust),*.md(markdown)")?)
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Registry**: parses `*.ext(tag)` rules
//! 2. **Scanner**: walks the tree and collects registered files
//! 3. **Document**: renders the Markdown
//! 4. **Writer**: replaces `project_document.md` in the project root

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod document;
mod error;
mod file;
mod filter;
mod pipeline;
mod registry;
mod scanner;
mod writer;

pub use config::{Config, ConfigBuilder, DEFAULT_OUTPUT_FILE_NAME};
pub use document::ProjectDocument;
pub use error::{Error, Result};
pub use file::{CollectedFile, FileContent};
pub use pipeline::{Pipeline, PipelineStats};
pub use registry::{ExtensionRegistry, ExtensionRule, REGISTRY_FILE_NAME};
pub use scanner::DirectoryEntry;

use std::path::Path;

/// Parses registry configuration text into an [`ExtensionRegistry`].
///
/// # Errors
///
/// Returns [`Error::ConfigFormat`] for the first malformed entry.
pub fn build_registry(config_text: &str) -> Result<ExtensionRegistry> {
    ExtensionRegistry::parse(config_text)
}

/// Walks `root` and returns the tree and collected files without writing
/// anything.
///
/// # Errors
///
/// Returns an error if the root does not exist, is not a directory, or
/// cannot be listed.
///
/// # Examples
///
/// ```no_run
/// use proj2md::{build_registry, render};
///
/// # fn main() -> anyhow::Result<()> {
/// let registry = build_registry("*.py(python)")?;
/// let document = render("./my-project", &registry, false)?;
/// println!("{}", document.to_markdown()?);
/// # Ok(())
/// # }
/// ```
pub fn render(
    root: impl AsRef<Path>,
    registry: &ExtensionRegistry,
    include_hidden: bool,
) -> Result<ProjectDocument> {
    let scanner = scanner::Scanner::with_registry(root.as_ref(), registry.clone(), include_hidden)?;
    Ok(scanner.scan()?.document)
}

/// Runs the complete pipeline with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - Root directory doesn't exist or is inaccessible
/// - The output document cannot be written
pub fn run(config: Config) -> Result<PipelineStats> {
    Pipeline::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_render_without_writing() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.py").write_str("print(1)").unwrap();
        temp.child("b.txt").write_str("b").unwrap();

        let registry = build_registry("*.py(python)").unwrap();
        let document = render(temp.path(), &registry, false).unwrap();

        assert_eq!(document.files.len(), 1);
        assert_eq!(document.files[0].relative_path, "a.py");
        assert!(document.tree_text.ends_with("├── a.py\n└── b.txt"));
        assert!(!temp.child(DEFAULT_OUTPUT_FILE_NAME).exists());
    }

    #[test]
    fn test_render_missing_root() {
        let registry = ExtensionRegistry::default();
        let err = render("/definitely/not/here", &registry, false).unwrap_err();
        assert!(err.is_invalid_root());
    }

    #[test]
    fn test_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("main.rs").write_str("fn main() {}\n").unwrap();

        let stats = run(Config::builder().root_dir(temp.path()).build().unwrap()).unwrap();

        assert_eq!(stats.collected_files, 1);
        let written = std::fs::read_to_string(temp.child(DEFAULT_OUTPUT_FILE_NAME).path()).unwrap();
        assert!(written.contains("```rust\nfn main() {}\n```"));
    }
}
