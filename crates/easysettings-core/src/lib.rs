//! EasySettings
//!
//! An in-memory settings mapping persisted to a line-based text file:
//!
//! ```text
//! # Configuration for myapp v. 1.0
//! user=cjw
//! window={"map":{"height":{"int":600},"width":{"int":800}}}
//! ```
//!
//! Plain strings are stored as-is, dates in ISO-8601 form, everything else in
//! a tagged serialized form. Saves go through a backed-up write so a failed
//! save never clobbers the previous file.
//!
//! The JSON, TOML and YAML mappings live in `easysettings-fs` and are
//! re-exported here.

pub mod codec;
pub mod compare;
pub mod error;
pub mod line_format;
pub mod store;
pub mod value;

pub use compare::SettingsView;
pub use error::{Error, Result};
pub use store::SettingsStore;
pub use value::{SettingValue, Settings};

pub use easysettings_fs::{
    FileBackedMapping, JsonFormat, SettingsFormat, TomlFormat, WriterConfig, YamlFormat,
    preferred_file,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
