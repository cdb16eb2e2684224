use crate::{
    config::Config,
    error::{Error, Result},
};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info};

/// Writes the rendered document into the project root.
pub(crate) struct Writer {
    output_path: PathBuf,
    backup_existing: bool,
}

impl Writer {
    /// Creates a new writer from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            output_path: config.output_path(),
            backup_existing: config.backup_existing,
        }
    }

    /// Target path of the document.
    pub(crate) fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Writes the document, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputWrite`] if the backup, the temporary file or
    /// the final rename fails.
    pub(crate) fn write(&self, content: &str) -> Result<()> {
        if self.output_path.exists() {
            if self.backup_existing {
                self.backup_file(&self.output_path)?;
            } else {
                debug!("Overwriting {}", self.output_path.display());
            }
        }

        write_file_atomic(&self.output_path, content)?;

        info!(
            "Wrote {} bytes to {}",
            content.len(),
            self.output_path.display()
        );
        Ok(())
    }

    /// Creates a timestamped backup of an existing file.
    fn backup_file(&self, path: &Path) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid output path"))?
            .to_string_lossy();

        let backup_path = path.with_file_name(format!("{filename}.backup.{timestamp}"));

        fs::copy(path, &backup_path).map_err(|e| Error::output_write(&backup_path, &e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }
}

/// Writes a file atomically.
///
/// Content goes to a temporary sibling which is synced and then renamed
/// over the target, so an interrupted run never leaves a truncated
/// document behind. The sibling is hidden, tagged with the process id and
/// created exclusively, so an existing file is never clobbered.
fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path)?;
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| Error::output_write(&temp_path, &e))?;

    let written = temp_file
        .write_all(content.as_bytes())
        .and_then(|()| temp_file.sync_all());

    drop(temp_file);

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::output_write(&temp_path, &e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::output_write(path, &e)
    })
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let filename = path
        .file_name()
        .ok_or_else(|| Error::config("Invalid output path"))?
        .to_string_lossy();

    Ok(path.with_file_name(format!(".{filename}.{}.tmp", std::process::id())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn writer_for(root: &Path, backup: bool) -> Writer {
        let config = Config::builder()
            .root_dir(root)
            .backup_existing(backup)
            .build()
            .unwrap();
        Writer::new(&config)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writer_creates_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = writer_for(temp.path(), false);

        writer.write("# Project: x\n").unwrap();

        temp.child("project_document.md").assert("# Project: x\n");
        assert_eq!(entries(temp.path()), vec!["project_document.md"]);
    }

    #[test]
    fn test_writer_overwrites_without_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("project_document.md").write_str("old").unwrap();

        let writer = writer_for(temp.path(), false);
        writer.write("new").unwrap();

        temp.child("project_document.md").assert("new");
        assert_eq!(entries(temp.path()), vec!["project_document.md"]);
    }

    #[test]
    fn test_writer_leaves_similar_names_alone() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("project_document.tmp").write_str("user data").unwrap();
        temp.child("project_document.md").write_str("old").unwrap();

        let writer = writer_for(temp.path(), false);
        writer.write("doc").unwrap();

        temp.child("project_document.tmp").assert("user data");
        temp.child("project_document.md").assert("doc");
        assert_eq!(
            entries(temp.path()),
            vec!["project_document.md", "project_document.tmp"]
        );
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp_path = temp_path_for(Path::new("/proj/project_document.md")).unwrap();

        assert_eq!(temp_path.parent(), Some(Path::new("/proj")));
        assert_eq!(
            temp_path.file_name().unwrap().to_string_lossy(),
            format!(".project_document.md.{}.tmp", std::process::id())
        );
    }

    #[test]
    fn test_writer_creates_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("project_document.md").write_str("old content").unwrap();

        let writer = writer_for(temp.path(), true);
        writer.write("new content").unwrap();

        let names = entries(temp.path());
        let backup = names
            .iter()
            .find(|name| name.starts_with("project_document.md.backup."))
            .expect("backup file");

        temp.child(backup).assert("old content");
        temp.child("project_document.md").assert("new content");
    }

    #[test]
    fn test_output_path() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = writer_for(temp.path(), false);

        assert_eq!(writer.output_path(), temp.path().join("project_document.md"));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_into_read_only_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let temp = assert_fs::TempDir::new().unwrap();
        let writer = writer_for(temp.path(), false);

        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o555)).unwrap();
        let result = writer.write("content");
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o755)).unwrap();

        // root ignores directory permissions
        if let Err(err) = result {
            assert!(matches!(err, Error::OutputWrite { .. }));
        }
    }
}
