use crate::error::{Error, Result};
use crate::registry::ExtensionRegistry;
use std::path::{Path, PathBuf};

/// Name of the generated document inside the project root.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "project_document.md";

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for a proj2md run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Project root to document
    pub root_dir: PathBuf,

    /// Include entries whose name starts with `.`
    pub include_hidden: bool,

    /// Extension to language tag lookup
    pub registry: ExtensionRegistry,

    /// File name of the generated document, written into `root_dir`
    pub output_file_name: String,

    /// Glob patterns (relative to the root) excluded from the traversal
    pub exclude_patterns: Vec<String>,

    /// Registered files larger than this are recorded as unreadable
    pub max_file_size: u64,

    /// Follow symbolic links while walking
    pub follow_links: bool,

    /// Dry run mode (no file writes)
    pub dry_run: bool,

    /// Copy an existing output file aside before replacing it
    pub backup_existing: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use proj2md::{Config, ExtensionRegistry};
    ///
    /// let config = Config::builder()
    ///     .root_dir("./my-project")
    ///     .registry(ExtensionRegistry::parse("*.rs(rust)").unwrap())
    ///     .include_hidden(true)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist ([`Error::PathNotFound`])
    /// - Root path is not a directory ([`Error::NotADirectory`])
    /// - Output file name is empty or contains a path separator
    /// - `max_file_size` is zero
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::path_not_found(&self.root_dir));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::not_a_directory(&self.root_dir));
        }

        let name = Path::new(&self.output_file_name);
        if self.output_file_name.is_empty()
            || name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true)
        {
            return Err(Error::config(format!(
                "output file name must be a plain file name: '{}'",
                self.output_file_name
            )));
        }

        if self.max_file_size == 0 {
            return Err(Error::config("max_file_size must be greater than 0"));
        }

        if self.registry.is_empty() {
            tracing::warn!("Extension registry is empty; no file contents will be collected");
        }

        Ok(())
    }

    /// Full path of the generated document.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.root_dir.join(&self.output_file_name)
    }

    /// Project name shown in the document title (the root's base name).
    #[must_use]
    pub fn project_name(&self) -> String {
        project_name(&self.root_dir)
    }
}

/// Base name of a directory, resolving `.` and `..` through the filesystem.
pub(crate) fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| root.display().to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            include_hidden: false,
            registry: ExtensionRegistry::builtin(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            exclude_patterns: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            follow_links: false,
            dry_run: false,
            backup_existing: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    include_hidden: bool,
    registry: Option<ExtensionRegistry>,
    output_file_name: Option<String>,
    exclude_patterns: Vec<String>,
    max_file_size: Option<u64>,
    follow_links: bool,
    dry_run: bool,
    backup_existing: bool,
}

impl ConfigBuilder {
    /// Sets the project root.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Includes or hides dot-entries.
    #[must_use]
    pub fn include_hidden(mut self, enabled: bool) -> Self {
        self.include_hidden = enabled;
        self
    }

    /// Sets the extension registry.
    #[must_use]
    pub fn registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the name of the generated document.
    #[must_use]
    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.output_file_name = Some(name.into());
        self
    }

    /// Sets the exclusion globs.
    #[must_use]
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Sets the size above which a registered file is not read.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Enables or disables following symbolic links.
    #[must_use]
    pub fn follow_links(mut self, enabled: bool) -> Self {
        self.follow_links = enabled;
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            include_hidden: self.include_hidden,
            registry: self.registry.unwrap_or_else(ExtensionRegistry::builtin),
            output_file_name: self
                .output_file_name
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE_NAME.to_string()),
            exclude_patterns: self.exclude_patterns,
            max_file_size: self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE),
            follow_links: self.follow_links,
            dry_run: self.dry_run,
            backup_existing: self.backup_existing,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder().root_dir(temp.path()).build().unwrap();

        assert!(!config.include_hidden);
        assert!(!config.dry_run);
        assert_eq!(config.output_file_name, DEFAULT_OUTPUT_FILE_NAME);
        assert_eq!(config.output_path(), temp.path().join("project_document.md"));
        assert_eq!(config.registry, ExtensionRegistry::builtin());
    }

    #[test]
    fn test_missing_root_dir() {
        let err = Config::builder()
            .root_dir("/nonexistent/path/that/should/not/exist")
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_root_is_a_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("file.txt");
        file.write_str("x").unwrap();

        let err = Config::builder().root_dir(file.path()).build().unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[test]
    fn test_invalid_output_file_name() {
        let temp = assert_fs::TempDir::new().unwrap();

        for name in ["", "docs/out.md", ".."] {
            let result = Config::builder()
                .root_dir(temp.path())
                .output_file_name(name)
                .build();
            assert!(result.unwrap_err().is_config(), "accepted '{name}'");
        }
    }

    #[test]
    fn test_zero_max_file_size() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder()
            .root_dir(temp.path())
            .max_file_size(0)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_project_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let proj = temp.child("my-proj");
        proj.create_dir_all().unwrap();

        let config = Config::builder().root_dir(proj.path()).build().unwrap();
        assert_eq!(config.project_name(), "my-proj");
        assert_eq!(project_name(&proj.path().join(".")), "my-proj");
    }
}
