//! Path filtering for the directory walk.
//!
//! Decides which entries are visited: hidden-entry handling and user
//! supplied exclusion globs. An excluded directory prunes its whole subtree.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

#[derive(Debug, Clone)]
pub(crate) struct PathFilter {
    include_hidden: bool,
    exclude: GlobSet,
}

impl PathFilter {
    /// Creates a filter from the hidden flag and exclusion globs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if a glob does not compile.
    pub(crate) fn new(include_hidden: bool, patterns: &[String]) -> Result<Self> {
        Ok(Self {
            include_hidden,
            exclude: Self::build_globset(patterns)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob =
                Glob::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
            builder.add(glob);
        }

        builder
            .build()
            .map_err(|e| Error::invalid_pattern(patterns.join(","), e.to_string()))
    }

    /// Returns true if an entry should be visited.
    ///
    /// `relative` is the entry's path relative to the project root and
    /// `name` its final component.
    pub(crate) fn should_visit(&self, relative: &Path, name: &str) -> bool {
        if !self.include_hidden && is_hidden(name) {
            return false;
        }

        !self.exclude.is_match(relative)
    }
}

/// Dot-entries are hidden.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
