//! File-backed, format-agnostic settings mapping

use crate::format::{Mapping, SettingsFormat};
use crate::io::{self, WriterConfig};
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Returns the first candidate that exists on disk.
///
/// If none exist the first candidate is returned, so a new file ends up at the
/// preferred location. An empty list yields `None`.
pub fn preferred_file<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    for candidate in candidates {
        let path: &Path = candidate.as_ref();
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }
    candidates.first().map(|candidate| {
        let path: &Path = candidate.as_ref();
        path.to_path_buf()
    })
}

/// A string-keyed mapping that loads from and saves to a file in format `F`.
///
/// Loading merges: keys read from disk overwrite in-memory values, keys that
/// only exist in memory are kept. Saving goes through a backed-up write, so a
/// failed save leaves the previous file in place.
#[derive(Debug, Clone)]
pub struct FileBackedMapping<F: SettingsFormat> {
    format: F,
    data: Mapping<F::Value>,
    path: Option<PathBuf>,
    writer: WriterConfig,
}

impl<F: SettingsFormat + Default> Default for FileBackedMapping<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<F: SettingsFormat> FileBackedMapping<F> {
    /// Create an empty mapping with no associated file.
    pub fn new(format: F) -> Self {
        Self {
            format,
            data: Mapping::new(),
            path: None,
            writer: WriterConfig::default(),
        }
    }

    /// Associate a file path without touching the disk.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Seed the mapping with initial entries.
    pub fn with_data(mut self, data: Mapping<F::Value>) -> Self {
        self.data = data;
        self
    }

    /// Use custom backed-up write settings.
    pub fn with_writer_config(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Create a mapping from an existing file.
    ///
    /// A missing file is reported as [`Error::Io`] with a `NotFound` source.
    pub fn from_file(format: F, path: impl Into<PathBuf>) -> Result<Self> {
        let mut mapping = Self::new(format).with_path(path);
        mapping.load(None)?;
        Ok(mapping)
    }

    /// Load `path` if it exists, then fill in `defaults` for keys it lacks.
    ///
    /// For a missing file the result holds only the defaults, with `path`
    /// associated for a later save.
    pub fn load_or_default<I, K>(format: F, path: impl Into<PathBuf>, defaults: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, F::Value)>,
        K: Into<String>,
    {
        let mut mapping = Self::new(format).with_path(path);
        let defaults: Mapping<F::Value> = defaults
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();
        let defaults = mapping.format.on_load(defaults);

        match mapping.load(None) {
            Ok(()) => {
                for (key, value) in defaults {
                    mapping.data.entry(key).or_insert(value);
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = ?mapping.path, "No settings file yet, using defaults");
                mapping.data = defaults;
            }
            Err(e) => return Err(e),
        }
        Ok(mapping)
    }

    /// Associated file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Change the associated file path.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    /// The format codec in use.
    pub fn format(&self) -> &F {
        &self.format
    }

    /// Borrow the underlying entries.
    pub fn data(&self) -> &Mapping<F::Value> {
        &self.data
    }

    fn resolve_path(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = path {
            self.path = Some(path.to_path_buf());
        }
        self.path.clone().ok_or(Error::NoConfigFile)
    }

    /// Read and decode `path` (or the associated file), merging the result.
    ///
    /// An explicit `path` becomes the associated file.
    pub fn load(&mut self, path: Option<&Path>) -> Result<()> {
        let path = self.resolve_path(path)?;
        let content = io::read_text(&path)?;
        let decoded = self.format.decode(&content).map_err(|message| Error::ConfigParse {
            path: path.clone(),
            format: F::NAME.into(),
            message,
        })?;
        let decoded = self.format.on_load(decoded);
        tracing::debug!(?path, entries = decoded.len(), format = F::NAME, "Loaded settings");
        self.data.extend(decoded);
        Ok(())
    }

    /// Encode and write the mapping to `path` (or the associated file).
    ///
    /// An explicit `path` becomes the associated file.
    pub fn save(&mut self, path: Option<&Path>) -> Result<()> {
        let path = self.resolve_path(path)?;
        let prepared = self.format.on_save(&self.data);
        let content = self.format.encode(&prepared).map_err(|message| Error::ConfigSerialize {
            path: path.clone(),
            format: F::NAME.into(),
            message,
        })?;
        io::write_backed_up(&path, &self.writer, |w| w.write_all(content.as_bytes()))?;
        tracing::debug!(?path, entries = self.data.len(), format = F::NAME, "Saved settings");
        Ok(())
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&F::Value> {
        self.data.get(key)
    }

    /// Value for `key`, or `default` if absent.
    pub fn get_or(&self, key: &str, default: F::Value) -> F::Value {
        self.data.get(key).cloned().unwrap_or(default)
    }

    /// Value for `key`, failing with [`Error::KeyNotFound`] if absent.
    pub fn require(&self, key: &str) -> Result<&F::Value> {
        self.data.get(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Insert or overwrite a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<F::Value>) -> &mut Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// `set` followed by `save` to the associated file.
    pub fn set_and_save(&mut self, key: impl Into<String>, value: impl Into<F::Value>) -> Result<()> {
        self.set(key, value);
        self.save(None)
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<F::Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Copy every entry of `other` into this mapping, overwriting.
    pub fn merge<I, K>(&mut self, other: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, F::Value)>,
        K: Into<String>,
    {
        for (key, value) in other {
            self.data.insert(key.into(), value);
        }
        self
    }

    /// Merge another file of the same format into this mapping.
    ///
    /// A missing file is skipped when `optional`, otherwise it fails with
    /// [`Error::MissingFile`].
    pub fn add_file(&mut self, path: impl AsRef<Path>, optional: bool) -> Result<&mut Self> {
        let path = path.as_ref();
        let Some(content) = io::read_text_if_exists(path)? else {
            if optional {
                tracing::debug!(?path, "Skipping missing optional settings file");
                return Ok(self);
            }
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        };
        let decoded = self.format.decode(&content).map_err(|message| Error::ConfigParse {
            path: path.to_path_buf(),
            format: F::NAME.into(),
            message,
        })?;
        let decoded = self.format.on_load(decoded);
        Ok(self.merge(decoded))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &F::Value)> {
        self.data.iter().map(|(key, value)| (key.as_str(), value))
    }
}
