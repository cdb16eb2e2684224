use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "exe", "dll", "so", "dylib", "a", "o", "obj", "png", "jpg", "jpeg", "gif", "bmp", "ico",
        "webp", "mp3", "mp4", "avi", "mkv", "mov", "wav", "flac", "pdf", "doc", "docx", "xls",
        "xlsx", "ppt", "pptx", "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "wasm", "pyc",
        "class",
    ]
    .into_iter()
    .collect()
});

/// A registered file destined for a content section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// Path relative to the project root, `/`-separated
    pub relative_path: String,

    /// Language tag from the registry
    pub language_tag: String,

    /// File text, or the reason it could not be read
    pub content: FileContent,
}

/// Content of a collected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Full UTF-8 text
    Text(String),

    /// The file was not read as text
    Unreadable {
        /// Human-readable reason
        reason: String,
    },
}

impl CollectedFile {
    /// Creates a collected file with text content.
    #[must_use]
    pub fn new_text(
        relative_path: impl Into<String>,
        language_tag: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            language_tag: language_tag.into(),
            content: FileContent::Text(content.into()),
        }
    }

    /// Creates a collected file marked unreadable.
    #[must_use]
    pub fn new_unreadable(
        relative_path: impl Into<String>,
        language_tag: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            language_tag: language_tag.into(),
            content: FileContent::Unreadable {
                reason: reason.into(),
            },
        }
    }

    /// Reads a registered file, containing any failure in the result.
    ///
    /// Binary extensions, files over `max_size` bytes, content with NUL
    /// bytes, invalid UTF-8 and IO errors all yield
    /// [`FileContent::Unreadable`].
    #[must_use]
    pub fn read(
        path: &Path,
        relative_path: impl Into<String>,
        language_tag: impl Into<String>,
        max_size: u64,
    ) -> Self {
        let relative_path = relative_path.into();
        let language_tag = language_tag.into();

        match read_text(path, max_size) {
            Ok(text) => Self::new_text(relative_path, language_tag, text),
            Err(err) => {
                tracing::warn!("{}", err);
                Self::new_unreadable(relative_path, language_tag, unreadable_reason(&err))
            }
        }
    }

    /// Returns true if the content was read.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.content, FileContent::Text(_))
    }

    /// Returns true if the file is marked unreadable.
    #[must_use]
    pub const fn is_unreadable(&self) -> bool {
        matches!(self.content, FileContent::Unreadable { .. })
    }

    /// Returns the text content if it was read.
    #[must_use]
    pub fn content_str(&self) -> Option<&str> {
        match &self.content {
            FileContent::Text(s) => Some(s),
            FileContent::Unreadable { .. } => None,
        }
    }

    /// Returns the size of the text content in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.content_str().map_or(0, |s| s.len() as u64)
    }
}

/// Reads a whole file as text after size and binary gating.
///
/// # Errors
///
/// Returns [`Error::FileRead`] for gated or failed reads and
/// [`Error::InvalidUtf8`] when the content does not decode.
fn read_text(path: &Path, max_size: u64) -> Result<String> {
    if has_binary_extension(path) {
        return Err(Error::file_skipped(path, "binary file (by extension)"));
    }

    let metadata = std::fs::metadata(path).map_err(|e| Error::file_read(path, &e))?;
    if metadata.len() > max_size {
        return Err(Error::file_skipped(
            path,
            format!(
                "file too large ({} bytes, limit {} bytes)",
                metadata.len(),
                max_size
            ),
        ));
    }

    if is_likely_binary(path)? {
        return Err(Error::file_skipped(path, "binary content"));
    }

    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::invalid_utf8(path)
        } else {
            Error::file_read(path, &e)
        }
    })
}

/// Short reason shown in the unreadable marker, without the path.
fn unreadable_reason(err: &Error) -> String {
    match err {
        Error::FileRead { message, .. } => message.clone(),
        Error::InvalidUtf8 { .. } => "invalid UTF-8".to_string(),
        other => other.to_string(),
    }
}

/// Determines if a file is binary by looking for a NUL byte in its first 8KB.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub(crate) fn is_likely_binary(path: &Path) -> Result<bool> {
    const BUFFER_SIZE: usize = 8192;

    let file = File::open(path).map_err(|e| Error::file_read(path, &e))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buffer = [0u8; BUFFER_SIZE];

    let bytes_read = reader
        .read(&mut buffer)
        .map_err(|e| Error::file_read(path, &e))?;

    Ok(memchr::memchr(0, &buffer[..bytes_read]).is_some())
}

/// Checks if a file extension suggests a binary file.
#[must_use]
pub(crate) fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| BINARY_EXTENSIONS.contains(ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
