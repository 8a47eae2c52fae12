//! File plumbing for EasySettings
//!
//! Provides backed-up writes (backup, write, restore on failure) and a
//! generic file-backed mapping for the JSON, TOML and YAML formats.

pub mod error;
pub mod format;
pub mod io;
pub mod mapping;

pub use error::{Error, Result};
pub use format::{JsonFormat, Mapping, SettingsFormat, TomlFormat, YamlFormat};
pub use io::{BackedUpWriter, WriterConfig};
pub use mapping::{FileBackedMapping, preferred_file};
