//! Backed-up file writes
//!
//! Before a settings file is rewritten, its current content is copied next to
//! it (`<file>~` by default). A successful write removes the copy; a failed
//! one moves it back over the target. A brand-new file that fails to write is
//! removed, so a failed first save never leaves a half-written file behind.

use crate::{Error, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default suffix appended to a file name to form its backup path.
pub const DEFAULT_BACKUP_SUFFIX: &str = "~";

/// Knobs for [`BackedUpWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Appended to the target path to name the backup copy.
    pub backup_suffix: String,
    /// Call `sync_all` on the target before dropping the backup.
    pub sync_on_commit: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            sync_on_commit: true,
        }
    }
}

impl WriterConfig {
    /// Backup path for `target` under this configuration.
    pub fn backup_path(&self, target: &Path) -> PathBuf {
        let mut name = OsString::from(target.as_os_str());
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }
}

/// Write handle for a target file that rolls back unless committed.
///
/// Dropping the writer without calling [`BackedUpWriter::commit`] (an early
/// `?` return, a panic unwinding through the caller) restores the previous
/// content of the target, or removes the target if it did not exist before.
#[derive(Debug)]
pub struct BackedUpWriter {
    target: PathBuf,
    backup: Option<PathBuf>,
    file: Option<BufWriter<File>>,
    sync_on_commit: bool,
    finished: bool,
}

impl BackedUpWriter {
    /// Open `path` for writing with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &WriterConfig::default())
    }

    /// Back up `path` if it exists, then open it for writing.
    pub fn open_with(path: impl AsRef<Path>, config: &WriterConfig) -> Result<Self> {
        let target = path.as_ref().to_path_buf();

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let backup = if target.is_file() {
            let backup_path = config.backup_path(&target);
            fs::copy(&target, &backup_path).map_err(|e| Error::io(&backup_path, e))?;
            tracing::debug!(path = ?target, backup = ?backup_path, "Backed up settings file");
            Some(backup_path)
        } else {
            None
        };

        let file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&target)
        {
            Ok(file) => file,
            Err(e) => {
                // The target was never truncated, so the copy is redundant.
                if let Some(backup_path) = &backup {
                    let _ = fs::remove_file(backup_path);
                }
                return Err(Error::io(&target, e));
            }
        };

        Ok(Self {
            target,
            backup,
            file: Some(BufWriter::new(file)),
            sync_on_commit: config.sync_on_commit,
            finished: false,
        })
    }

    /// Path being written.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Backup copy made on open, if the target already existed.
    pub fn backup(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Flush and close the target, then delete the backup.
    ///
    /// If flushing fails the previous content is restored and the error is
    /// returned. A backup that cannot be deleted is only logged: the new
    /// content is already on disk.
    pub fn commit(mut self) -> Result<()> {
        if let Err(e) = self.flush_and_close() {
            self.rollback();
            return Err(Error::io(&self.target, e));
        }
        self.finished = true;

        if let Some(backup_path) = self.backup.take() {
            if let Err(e) = fs::remove_file(&backup_path) {
                tracing::warn!(
                    path = ?self.target,
                    backup = ?backup_path,
                    "Settings file written but backup could not be removed: {}",
                    e
                );
            }
        }
        tracing::debug!(path = ?self.target, "Committed settings file");
        Ok(())
    }

    /// Close the target and undo the write.
    pub fn rollback(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        drop(self.file.take());

        match self.backup.take() {
            Some(backup_path) => {
                if let Err(e) = fs::rename(&backup_path, &self.target) {
                    tracing::warn!(
                        path = ?self.target,
                        backup = ?backup_path,
                        "Failed to restore settings backup: {}",
                        e
                    );
                } else {
                    tracing::warn!(path = ?self.target, "Write failed, restored previous settings file");
                }
            }
            None => match fs::remove_file(&self.target) {
                Ok(()) => {
                    tracing::warn!(path = ?self.target, "Write failed, removed new settings file");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = ?self.target, "Failed to remove partial settings file: {}", e);
                }
            },
        }
    }

    fn flush_and_close(&mut self) -> io::Result<()> {
        if let Some(writer) = self.file.take() {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            if self.sync_on_commit {
                file.sync_all()?;
            }
        }
        Ok(())
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("settings writer is already closed"))
    }
}

impl Write for BackedUpWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

impl Drop for BackedUpWriter {
    fn drop(&mut self) {
        self.rollback();
    }
}

/// Write `path` through a [`BackedUpWriter`], committing only if `write`
/// succeeds.
///
/// An error from `write` rolls the file back and is returned as
/// [`Error::Io`] for `path`.
pub fn write_backed_up<F>(path: impl AsRef<Path>, config: &WriterConfig, write: F) -> Result<()>
where
    F: FnOnce(&mut BackedUpWriter) -> io::Result<()>,
{
    let path = path.as_ref();
    let mut writer = BackedUpWriter::open_with(path, config)?;
    match write(&mut writer) {
        Ok(()) => writer.commit(),
        Err(e) => {
            writer.rollback();
            Err(Error::io(path, e))
        }
    }
}

/// Write text content through a [`BackedUpWriter`].
pub fn write_text(path: impl AsRef<Path>, content: &str, config: &WriterConfig) -> Result<()> {
    write_backed_up(path, config, |w| w.write_all(content.as_bytes()))
}

/// Read text content from a file.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Read text content, returning `None` if the file does not exist.
pub fn read_text_if_exists(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}
