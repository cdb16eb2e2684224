use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the proj2md library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Malformed extension rule in the registry configuration.
    #[error("Invalid extension rule '{entry}': {reason} (expected '*.ext(tag)')")]
    ConfigFormat {
        /// Offending entry text
        entry: String,
        /// What is wrong with it
        reason: String,
    },

    /// Project root does not exist.
    #[error("Project path '{path}' does not exist")]
    PathNotFound {
        /// Requested root path
        path: PathBuf,
    },

    /// Project root exists but is not a directory.
    #[error("Project path '{path}' is not a directory")]
    NotADirectory {
        /// Requested root path
        path: PathBuf,
    },

    /// A single file could not be read.
    #[error("Could not read file '{path}': {message}")]
    FileRead {
        /// Path to the file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Invalid UTF-8 encountered in file.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// The output document could not be written.
    #[error("Failed to write output '{path}': {message}")]
    OutputWrite {
        /// Output path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Invalid exclusion glob.
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },
}

impl Error {
    /// Creates a registry format error for the given entry.
    #[must_use]
    pub fn config_format(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigFormat {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    /// Creates a path-not-found error.
    #[must_use]
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Creates a not-a-directory error.
    #[must_use]
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    /// Creates a per-file read error.
    #[must_use]
    pub fn file_read(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a per-file read error from a plain reason.
    #[must_use]
    pub fn file_skipped(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileRead {
            path: path.into(),
            message: reason.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Creates an output write error.
    #[must_use]
    pub fn output_write(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::OutputWrite {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut message = source.to_string();
        let mut cause = std::error::Error::source(source);
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }

        Self::Template {
            template: template.into(),
            message,
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a registry format error.
    #[must_use]
    pub const fn is_config_format(&self) -> bool {
        matches!(self, Self::ConfigFormat { .. })
    }

    /// Returns true if the project root is missing or not a directory.
    #[must_use]
    pub const fn is_invalid_root(&self) -> bool {
        matches!(self, Self::PathNotFound { .. } | Self::NotADirectory { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if this is a per-file read failure.
    #[must_use]
    pub const fn is_file_read(&self) -> bool {
        matches!(self, Self::FileRead { .. } | Self::InvalidUtf8 { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config {
            message: format!("Serialization error: {e}"),
        }
    }
}
