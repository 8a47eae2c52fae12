//! Format codecs for file-backed mappings
//!
//! Each format turns a whole file into a string-keyed mapping of its own
//! native value type and back. The encoding itself is delegated to
//! `serde_json`, `toml` and `serde_yaml`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// String-keyed mapping stored by a [`crate::FileBackedMapping`].
pub type Mapping<V> = BTreeMap<String, V>;

/// A whole-file codec plus load/save hooks.
///
/// `on_load` runs on freshly decoded data before it is merged into a mapping;
/// `on_save` runs on a copy of the mapping right before encoding. The default
/// implementations call `load_item`/`save_item` for every entry, which in turn
/// return the pair unchanged. Override either level to transform keys or
/// values.
pub trait SettingsFormat {
    /// Native value type of the format.
    type Value: Clone + PartialEq + Debug;

    /// Human-readable format name used in error messages.
    const NAME: &'static str;

    /// Decode a whole document. An empty document is an empty mapping.
    fn decode(&self, text: &str) -> Result<Mapping<Self::Value>, String>;

    /// Encode a whole mapping as a document.
    fn encode(&self, data: &Mapping<Self::Value>) -> Result<String, String>;

    fn on_load(&self, data: Mapping<Self::Value>) -> Mapping<Self::Value> {
        data.into_iter()
            .map(|(key, value)| self.load_item(key, value))
            .collect()
    }

    fn load_item(&self, key: String, value: Self::Value) -> (String, Self::Value) {
        (key, value)
    }

    fn on_save(&self, data: &Mapping<Self::Value>) -> Mapping<Self::Value> {
        data.iter()
            .map(|(key, value)| self.save_item(key.clone(), value.clone()))
            .collect()
    }

    fn save_item(&self, key: String, value: Self::Value) -> (String, Self::Value) {
        (key, value)
    }
}

/// JSON documents, written with 4-space indentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl SettingsFormat for JsonFormat {
    type Value = serde_json::Value;
    const NAME: &'static str = "JSON";

    fn decode(&self, text: &str) -> Result<Mapping<Self::Value>, String> {
        if text.trim().is_empty() {
            return Ok(Mapping::new());
        }
        let data: Option<Mapping<Self::Value>> =
            serde_json::from_str(text).map_err(|e| e.to_string())?;
        Ok(data.unwrap_or_default())
    }

    fn encode(&self, data: &Mapping<Self::Value>) -> Result<String, String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut serializer).map_err(|e| e.to_string())?;
        let mut text = String::from_utf8(buf).map_err(|e| e.to_string())?;
        text.push('\n');
        Ok(text)
    }
}

/// TOML documents. The top level is always a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl SettingsFormat for TomlFormat {
    type Value = toml::Value;
    const NAME: &'static str = "TOML";

    fn decode(&self, text: &str) -> Result<Mapping<Self::Value>, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    fn encode(&self, data: &Mapping<Self::Value>) -> Result<String, String> {
        toml::to_string_pretty(data).map_err(|e| e.to_string())
    }
}

/// YAML documents. A null document is an empty mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl SettingsFormat for YamlFormat {
    type Value = serde_yaml::Value;
    const NAME: &'static str = "YAML";

    fn decode(&self, text: &str) -> Result<Mapping<Self::Value>, String> {
        if text.trim().is_empty() {
            return Ok(Mapping::new());
        }
        let data: Option<Mapping<Self::Value>> =
            serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        Ok(data.unwrap_or_default())
    }

    fn encode(&self, data: &Mapping<Self::Value>) -> Result<String, String> {
        serde_yaml::to_string(data).map_err(|e| e.to_string())
    }
}
