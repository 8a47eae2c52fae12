//! The settings store: an in-memory mapping tied to a line-format file

use crate::codec::NEWLINE_TOKEN;
use crate::compare::{self, SettingsView};
use crate::line_format::{self, COMMENT, DELIMITER};
use crate::value::{SettingValue, Settings};
use crate::{Error, Result};
use easysettings_fs::WriterConfig;
use easysettings_fs::io;
use std::cmp::Ordering;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

const TRUE_STRINGS: [&str; 4] = ["true", "yes", "on", "1"];
const FALSE_STRINGS: [&str; 4] = ["false", "no", "off", "0"];

/// Check that `key` can be stored and read back from the line format.
pub fn validate_key(key: &str) -> Result<()> {
    let reason = if key.trim().is_empty() {
        "empty keys are not allowed"
    } else if key.contains(DELIMITER) {
        "keys cannot contain '='"
    } else if key.contains('\n') {
        "keys cannot contain newlines"
    } else if key.contains(NEWLINE_TOKEN) {
        "keys cannot contain the newline token"
    } else if key.trim_start().starts_with(COMMENT) {
        "keys cannot start with '#'"
    } else {
        return Ok(());
    };
    Err(Error::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

/// Settings mapping with an optional backing file.
///
/// Nothing is written until [`SettingsStore::save`] (or one of the helpers
/// that call it) runs. Loading merges the file into memory: keys that only
/// exist in memory survive a load.
///
/// Not synchronized: concurrent writers, in this process or another, need
/// external locking.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: Settings,
    configfile: Option<PathBuf>,
    name: Option<String>,
    version: Option<String>,
    header: Option<String>,
    writer: WriterConfig,
}

impl SettingsStore {
    /// Create an empty store with no backing file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Application name for the file header.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Application version for the file header. Only written with a name.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Free text written as comment lines below the first header line.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Use custom backed-up write settings.
    pub fn with_writer_config(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Open a store on `path`, creating a header-only file if it is missing.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new().attach(path)
    }

    /// Bind this store to `path`, create the file if needed and load it.
    pub fn attach(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        self.configfile = Some(path.into());
        self.ensure_file(true)?;
        self.load(None)?;
        Ok(self)
    }

    /// Bind this store to `path`, load it if it exists, then add `defaults`
    /// for any key the file did not provide. The file is not created.
    pub fn load_or_default<I, K, V>(mut self, path: impl Into<PathBuf>, defaults: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SettingValue>,
    {
        self.configfile = Some(path.into());
        self.load(None)?;
        for (key, value) in defaults {
            let key = key.into();
            validate_key(&key)?;
            self.settings.entry(key).or_insert_with(|| value.into().into_whole_seconds());
        }
        Ok(self)
    }

    pub fn configfile(&self) -> Option<&Path> {
        self.configfile.as_deref()
    }

    pub fn set_configfile(&mut self, path: impl Into<PathBuf>) {
        self.configfile = Some(path.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Borrow the in-memory settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.settings.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Insert or overwrite a setting. Does not save.
    ///
    /// Date-times are truncated to whole seconds, as the file stores them.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        self.settings.insert(key, value.into().into_whole_seconds());
        Ok(())
    }

    /// Set each pair in order, stopping at the first invalid key.
    ///
    /// Pairs before the failing one stay applied.
    pub fn set_many<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SettingValue>,
    {
        for (key, value) in pairs {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// [`set`](Self::set) then [`save`](Self::save) to the bound file.
    pub fn set_and_save(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Result<()> {
        self.set(key, value)?;
        self.save(None)
    }

    /// Value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    /// Value for `key`, or `default` if it is not set.
    pub fn get_or(&self, key: &str, default: impl Into<SettingValue>) -> SettingValue {
        match self.settings.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// Value for `key`, failing with [`Error::KeyNotFound`] if it is not set.
    pub fn require(&self, key: &str) -> Result<&SettingValue> {
        self.settings.get(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Interpret a setting as a boolean, leniently.
    ///
    /// Strings compare case-insensitively: the empty string and
    /// `false`/`no`/`off`/`0` are false, anything else is true. Other values
    /// use their truthiness. Missing keys give `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.settings.get(key) {
            None => default,
            Some(SettingValue::String(s)) => {
                let s = s.to_lowercase();
                !s.is_empty() && !FALSE_STRINGS.contains(&s.as_str())
            }
            Some(value) => value.is_truthy(),
        }
    }

    /// Interpret a setting as a boolean, strictly.
    ///
    /// Strings must be one of `true`/`yes`/`on`/`1` or `false`/`no`/`off`/`0`
    /// (any case), or empty (false); other strings and missing keys give
    /// `None`. Non-string values use their truthiness.
    pub fn get_bool_strict(&self, key: &str) -> Option<bool> {
        match self.settings.get(key)? {
            SettingValue::String(s) => {
                let s = s.to_lowercase();
                if s.is_empty() || FALSE_STRINGS.contains(&s.as_str()) {
                    Some(false)
                } else if TRUE_STRINGS.contains(&s.as_str()) {
                    Some(true)
                } else {
                    None
                }
            }
            value => Some(value.is_truthy()),
        }
    }

    /// Remove one key. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.settings.remove(key).is_some()
    }

    /// Remove every listed key that is present.
    ///
    /// Returns true only if all of them were present.
    pub fn remove_many<I, K>(&mut self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .fold(true, |all_found, key| self.remove(key.as_ref()) && all_found)
    }

    /// Drop every setting. Does not touch the file.
    pub fn clear(&mut self) {
        self.settings.clear();
    }

    /// Reset every value to the empty string, keeping the keys.
    pub fn clear_values(&mut self) {
        for value in self.settings.values_mut() {
            *value = SettingValue::default();
        }
    }

    /// Reset the listed values to the empty string. Unknown keys are ignored.
    pub fn clear_values_for<I, K>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            if let Some(value) = self.settings.get_mut(key.as_ref()) {
                *value = SettingValue::default();
            }
        }
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    pub fn has_value(&self, value: &SettingValue) -> bool {
        self.settings.values().any(|v| v == value)
    }

    /// Copy every entry of `other` into this store, overwriting.
    pub fn merge(&mut self, other: &impl SettingsView) {
        for (key, value) in other.as_settings() {
            self.settings.insert(key.clone(), value.clone().into_whole_seconds());
        }
    }

    pub fn list_entries(&self) -> Vec<(&str, &SettingValue)> {
        self.iter().collect()
    }

    pub fn list_keys(&self) -> Vec<&str> {
        self.settings.keys().map(String::as_str).collect()
    }

    pub fn list_values(&self) -> Vec<&SettingValue> {
        self.settings.values().collect()
    }

    /// Entries whose `key=value` text contains `query`.
    pub fn find_entries(&self, query: impl Display) -> Vec<(&str, &SettingValue)> {
        let query = query.to_string();
        self.iter()
            .filter(|(key, value)| format!("{}{}{}", key, DELIMITER, value).contains(&query))
            .collect()
    }

    /// Keys containing `query`.
    pub fn find_keys(&self, query: impl Display) -> Vec<&str> {
        let query = query.to_string();
        self.settings
            .keys()
            .filter(|key| key.contains(&query))
            .map(String::as_str)
            .collect()
    }

    /// Values whose text form contains `query`.
    pub fn find_values(&self, query: impl Display) -> Vec<&SettingValue> {
        let query = query.to_string();
        self.settings
            .values()
            .filter(|value| value.to_string().contains(&query))
            .collect()
    }

    /// Decode `path` (or the bound file) without touching the store.
    ///
    /// A missing file, or no path at all, reads as empty.
    pub fn read_without_loading(&self, path: Option<&Path>) -> Result<Settings> {
        let Some(path) = path.or(self.configfile.as_deref()) else {
            return Ok(Settings::new());
        };
        match io::read_text_if_exists(path)? {
            Some(content) => Ok(line_format::decode(&content)),
            None => Ok(Settings::new()),
        }
    }

    /// Merge `path` (or the bound file) into memory.
    ///
    /// An explicit `path` becomes the bound file. Returns `Ok(false)` when
    /// there is no path or the file does not exist. Lines whose key could not
    /// have been written by [`set`](Self::set) are skipped.
    pub fn load(&mut self, path: Option<&Path>) -> Result<bool> {
        if let Some(path) = path {
            self.configfile = Some(path.to_path_buf());
        }
        let Some(path) = self.configfile.as_deref() else {
            return Ok(false);
        };
        let Some(content) = io::read_text_if_exists(path)? else {
            tracing::debug!(?path, "Settings file does not exist, nothing to load");
            return Ok(false);
        };

        let decoded = line_format::decode(&content);
        tracing::debug!(?path, entries = decoded.len(), "Loaded settings");
        for (key, value) in decoded {
            if let Err(e) = validate_key(&key) {
                tracing::warn!(?path, "Skipping setting: {}", e);
                continue;
            }
            self.settings.insert(key, value);
        }
        Ok(true)
    }

    /// Load the bound file again. Fails if no file is bound.
    pub fn reload(&mut self) -> Result<bool> {
        if self.configfile.is_none() {
            return Err(Error::NoConfigFile);
        }
        self.load(None)
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![line_format::build_header(
            self.name.as_deref(),
            self.version.as_deref(),
        )];
        lines.extend(line_format::header_comment_lines(self.header.as_deref()));
        lines
    }

    /// The full file text `save` would write.
    pub fn render(&self) -> Result<String> {
        line_format::encode(&self.header_lines(), &self.settings)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        io::write_backed_up(path, &self.writer, |w| w.write_all(content.as_bytes())).map_err(
            |source| Error::Save {
                path: path.to_path_buf(),
                source,
            },
        )
    }

    /// Write the header and every setting to `path` (or the bound file).
    ///
    /// Saving to an explicit `path` does not rebind the store.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = path
            .or(self.configfile.as_deref())
            .ok_or(Error::NoConfigFile)?;
        let content = self.render()?;
        self.write_file(path, &content)?;
        tracing::debug!(?path, entries = self.settings.len(), "Saved settings");
        Ok(())
    }

    /// Write a header-only file, overwriting any existing one.
    ///
    /// An explicit `path` becomes the bound file.
    pub fn create_file(&mut self, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            self.configfile = Some(path.to_path_buf());
        }
        let path = self.configfile.as_deref().ok_or(Error::NoConfigFile)?;
        let content = line_format::encode(&self.header_lines(), &Settings::new())?;
        self.write_file(path, &content)?;
        tracing::debug!(?path, "Created settings file");
        Ok(())
    }

    /// Whether the bound file exists, optionally creating a blank one.
    pub fn ensure_file(&mut self, create_if_missing: bool) -> Result<bool> {
        let path = self.configfile.as_deref().ok_or(Error::NoConfigFile)?;
        if path.is_file() {
            return Ok(true);
        }
        if !create_if_missing {
            return Ok(false);
        }
        self.create_file(None)?;
        Ok(true)
    }

    /// Whether memory and the bound file hold exactly the same settings.
    pub fn is_saved(&self) -> Result<bool> {
        let on_disk = self.read_without_loading(None)?;
        Ok(compare::settings_equal(&self.settings, &on_disk))
    }

    pub fn compare_keys(&self, other: &impl SettingsView) -> bool {
        compare::keys_equal(self, other)
    }

    pub fn compare_values(&self, other: &impl SettingsView) -> bool {
        compare::values_equal(self, other)
    }

    pub fn compare(&self, other: &impl SettingsView) -> bool {
        compare::settings_equal(self, other)
    }

    /// See [`compare::entry_count_compare`].
    pub fn entry_count_compare(&self, other: &impl SettingsView) -> Option<Ordering> {
        compare::entry_count_compare(self, other)
    }
}

impl SettingsView for SettingsStore {
    fn as_settings(&self) -> &Settings {
        &self.settings
    }
}

impl PartialEq for SettingsStore {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

impl PartialEq<Settings> for SettingsStore {
    fn eq(&self, other: &Settings) -> bool {
        self.compare(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::delimiter("a=b")]
    #[case::empty("")]
    #[case::whitespace("  ")]
    #[case::tab("\t")]
    #[case::newline("a\nb")]
    #[case::token("a(es_nl)b")]
    #[case::comment("#a")]
    #[case::indented_comment("  # a")]
    fn invalid_keys_are_rejected(#[case] key: &str) {
        let mut store = SettingsStore::new();
        let err = store.set(key, "x").unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
        assert!(store.is_empty());
    }

    #[rstest]
    #[case("plain")]
    #[case("with space")]
    #[case(" leading")]
    #[case("a#b")]
    fn valid_keys_are_accepted(#[case] key: &str) {
        let mut store = SettingsStore::new();
        store.set(key, "x").unwrap();
        assert!(store.has_key(key));
    }

    #[test]
    fn set_many_is_not_transactional() {
        let mut store = SettingsStore::new();
        let err = store
            .set_many([("a", "1"), ("b=", "2"), ("c", "3")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKey { ref key, .. } if key == "b="));
        assert!(store.has_key("a"));
        assert!(!store.has_key("c"));
    }

    #[test]
    fn remove_many_requires_all_keys() {
        let mut store = SettingsStore::new();
        store.set_many([("a", "1"), ("b", "2"), ("c", "3")]).unwrap();

        assert!(!store.remove_many(["a", "missing"]));
        assert!(!store.has_key("a"));
        assert!(store.remove_many(vec!["b".to_string(), "c".to_string()]));
        assert!(store.is_empty());
        assert!(!store.remove("a"));
    }

    #[rstest]
    #[case(SettingValue::from("false"), false)]
    #[case(SettingValue::from("No"), false)]
    #[case(SettingValue::from("OFF"), false)]
    #[case(SettingValue::from("0"), false)]
    #[case(SettingValue::from(""), false)]
    #[case(SettingValue::from("true"), true)]
    #[case(SettingValue::from("foo"), true)]
    #[case(SettingValue::from(0), false)]
    #[case(SettingValue::from(7), true)]
    #[case(SettingValue::from(false), false)]
    fn get_bool_lenient(#[case] value: SettingValue, #[case] expected: bool) {
        let mut store = SettingsStore::new();
        store.set("opt", value).unwrap();
        assert_eq!(store.get_bool("opt", !expected), expected);
    }

    #[rstest]
    #[case(SettingValue::from("Yes"), Some(true))]
    #[case(SettingValue::from("on"), Some(true))]
    #[case(SettingValue::from("1"), Some(true))]
    #[case(SettingValue::from("off"), Some(false))]
    #[case(SettingValue::from("foo"), None)]
    #[case(SettingValue::from(1), Some(true))]
    fn get_bool_strict(#[case] value: SettingValue, #[case] expected: Option<bool>) {
        let mut store = SettingsStore::new();
        store.set("opt", value).unwrap();
        assert_eq!(store.get_bool_strict("opt"), expected);
    }

    #[test]
    fn get_bool_missing_key_uses_default() {
        let store = SettingsStore::new();
        assert!(store.get_bool("missing", true));
        assert!(!store.get_bool("missing", false));
        assert_eq!(store.get_bool_strict("missing"), None);
    }

    #[test]
    fn clear_values_keeps_keys() {
        let mut store = SettingsStore::new();
        store.set_many([("a", "1"), ("b", "2")]).unwrap();

        store.clear_values_for(["a", "unknown"]);
        assert_eq!(store.get("a"), Some(&SettingValue::default()));
        assert_eq!(store.get("b"), Some(&SettingValue::from("2")));

        store.clear_values();
        assert_eq!(store.get("b"), Some(&SettingValue::default()));
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn save_without_file_fails() {
        let store = SettingsStore::new();
        assert!(matches!(store.save(None), Err(Error::NoConfigFile)));
    }

    #[test]
    fn reload_without_file_fails() {
        let mut store = SettingsStore::new();
        assert!(matches!(store.reload(), Err(Error::NoConfigFile)));
        assert!(!store.load(None).unwrap());
    }
}
