use crate::{
    config::{Config, project_name},
    document::ProjectDocument,
    error::{Error, Result},
    file::CollectedFile,
    filter::PathFilter,
    registry::ExtensionRegistry,
};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// One node visited during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Final path component
    pub name: String,

    /// True for directories
    pub is_directory: bool,

    /// Nesting level; children of the root are at depth 0
    pub depth: usize,

    /// Path relative to the project root, `/`-separated
    pub relative_path: String,
}

/// Counters collected during scanning.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ScanStats {
    /// Directories listed in the tree (root excluded)
    pub directories: usize,

    /// Files listed in the tree
    pub files: usize,

    /// Files with a content section
    pub collected: usize,

    /// Collected files marked unreadable
    pub unreadable: usize,

    /// Subdirectories that could not be listed
    pub walk_errors: usize,
}

/// Result of one scan.
#[derive(Debug)]
pub(crate) struct ScanOutcome {
    pub document: ProjectDocument,
    pub stats: ScanStats,
}

/// Walks the project root and collects the tree and registered files.
pub(crate) struct Scanner {
    root_dir: PathBuf,
    registry: ExtensionRegistry,
    filter: PathFilter,
    output_file_name: Option<String>,
    follow_links: bool,
    max_file_size: u64,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// The configured output file at the root is never part of the walk.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclusion pattern is invalid.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            root_dir: config.root_dir.clone(),
            registry: config.registry.clone(),
            filter: PathFilter::new(config.include_hidden, &config.exclude_patterns)?,
            output_file_name: Some(config.output_file_name.clone()),
            follow_links: config.follow_links,
            max_file_size: config.max_file_size,
        })
    }

    /// Creates a scanner with default limits and no output exclusion.
    pub(crate) fn with_registry(
        root_dir: impl Into<PathBuf>,
        registry: ExtensionRegistry,
        include_hidden: bool,
    ) -> Result<Self> {
        let defaults = Config::default();
        Ok(Self {
            root_dir: root_dir.into(),
            registry,
            filter: PathFilter::new(include_hidden, &[])?,
            output_file_name: None,
            follow_links: defaults.follow_links,
            max_file_size: defaults.max_file_size,
        })
    }

    /// Walks the root depth-first and builds the project document.
    ///
    /// Siblings are ordered directories first, then by case-insensitive
    /// name, so the output does not depend on the filesystem's listing
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, not a directory, or cannot
    /// be listed. Failures below the root are logged and skipped.
    pub(crate) fn scan(&self) -> Result<ScanOutcome> {
        if !self.root_dir.exists() {
            return Err(Error::path_not_found(&self.root_dir));
        }
        if !self.root_dir.is_dir() {
            return Err(Error::not_a_directory(&self.root_dir));
        }

        debug!("Starting scan of {}", self.root_dir.display());

        let mut entries = Vec::new();
        let mut files = Vec::new();
        let mut stats = ScanStats::default();

        let walker = WalkDir::new(&self.root_dir)
            .follow_links(self.follow_links)
            .sort_by(compare_entries)
            .into_iter()
            .filter_entry(|entry| self.should_visit(entry));

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    let path = err.path().unwrap_or(self.root_dir.as_path()).to_path_buf();
                    let io_err = std::io::Error::from(err);
                    return Err(Error::io(path, &io_err));
                }
                Err(err) => {
                    warn!("Skipping unreadable entry: {}", err);
                    stats.walk_errors += 1;
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let node = self.to_directory_entry(&entry);
            trace!("Visiting {}", node.relative_path);

            if node.is_directory {
                stats.directories += 1;
            } else {
                stats.files += 1;
                if let Some(tag) = self.registry.tag_for_path(entry.path()) {
                    let collected = CollectedFile::read(
                        entry.path(),
                        node.relative_path.clone(),
                        tag,
                        self.max_file_size,
                    );
                    if collected.is_unreadable() {
                        stats.unreadable += 1;
                    }
                    stats.collected += 1;
                    files.push(collected);
                }
            }

            entries.push(node);
        }

        let name = project_name(&self.root_dir);
        let tree_text = render_tree(&name, &entries);

        debug!(
            "Scan complete: {} directories, {} files, {} collected, {} unreadable, {} walk errors",
            stats.directories, stats.files, stats.collected, stats.unreadable, stats.walk_errors
        );

        Ok(ScanOutcome {
            document: ProjectDocument::new(name, tree_text, files),
            stats,
        })
    }

    fn should_visit(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let name = entry.file_name().to_string_lossy();

        if entry.depth() == 1 && !entry.file_type().is_dir() {
            if let Some(output) = &self.output_file_name {
                if *name == **output {
                    trace!("Skipping output document {}", name);
                    return false;
                }
            }
        }

        let relative = relative_to(entry.path(), &self.root_dir);
        self.filter.should_visit(&relative, &name)
    }

    fn to_directory_entry(&self, entry: &DirEntry) -> DirectoryEntry {
        let relative = relative_to(entry.path(), &self.root_dir);

        DirectoryEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_directory: entry.file_type().is_dir(),
            depth: entry.depth() - 1,
            relative_path: slash_path(&relative),
        }
    }
}

fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_name = a.file_name().to_string_lossy();
    let b_name = b.file_name().to_string_lossy();

    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
        .then_with(|| a_name.cmp(&b_name))
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Draws the tree with box connectors, starting with `<root_name>/`.
///
/// `entries` must be in pre-order with each node's depth relative to the
/// root's children.
pub(crate) fn render_tree(root_name: &str, entries: &[DirectoryEntry]) -> String {
    // A node is the last of its siblings when no later node shares its
    // depth before the walk climbs above it.
    let mut is_last = vec![false; entries.len()];
    let mut seen: Vec<bool> = Vec::new();
    for (i, entry) in entries.iter().enumerate().rev() {
        if seen.len() <= entry.depth {
            seen.resize(entry.depth + 1, false);
        }
        is_last[i] = !seen[entry.depth];
        seen[entry.depth] = true;
        seen.truncate(entry.depth + 1);
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(format!("{root_name}/"));

    let mut indent: Vec<&str> = Vec::new();
    for (entry, last) in entries.iter().zip(is_last) {
        indent.truncate(entry.depth);

        let connector = if last { LAST_BRANCH } else { BRANCH };
        let suffix = if entry.is_directory { "/" } else { "" };
        lines.push(format!("{}{connector}{}{suffix}", indent.concat(), entry.name));

        if entry.is_directory {
            indent.push(if last { SPACE } else { PIPE });
        }
    }

    lines.join("\n")
}
