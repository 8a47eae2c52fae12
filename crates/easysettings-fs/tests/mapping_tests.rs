//! JSON/TOML/YAML file-backed mappings

use assert_fs::prelude::*;
use easysettings_fs::{
    Error, FileBackedMapping, JsonFormat, Mapping, SettingsFormat, TomlFormat, YamlFormat,
};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

#[test]
fn test_json_from_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");
    file.write_str(r#"{"user": "cjw", "count": 42}"#).unwrap();

    let settings = FileBackedMapping::from_file(JsonFormat, file.path()).unwrap();

    assert_eq!(settings.get("user"), Some(&json!("cjw")));
    assert_eq!(settings.get("count"), Some(&json!(42)));
    assert_eq!(settings.path(), Some(file.path()));
}

#[test]
fn test_from_missing_file_is_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();
    let err = FileBackedMapping::from_file(JsonFormat, temp.path().join("nope.json")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_json_save_roundtrip() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");

    let mut settings = FileBackedMapping::new(JsonFormat).with_path(file.path());
    settings.set("user", "cjw").set("sizes", json!([1, 2, 3]));
    settings.save(None).unwrap();

    file.assert(predicate::str::contains("\"user\": \"cjw\""));
    let loaded = FileBackedMapping::from_file(JsonFormat, file.path()).unwrap();
    assert_eq!(loaded.data(), settings.data());
}

#[test]
fn test_toml_save_roundtrip() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.toml");

    let mut settings = FileBackedMapping::new(TomlFormat);
    settings.set("name", "app").set("width", 800_i64);
    settings.save(Some(file.path())).unwrap();

    file.assert(predicate::str::contains("name = \"app\""));
    file.assert(predicate::str::contains("width = 800"));
    let loaded = FileBackedMapping::from_file(TomlFormat, file.path()).unwrap();
    assert_eq!(loaded.data(), settings.data());
}

#[test]
fn test_yaml_save_roundtrip() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.yaml");

    let mut settings = FileBackedMapping::new(YamlFormat);
    settings.set("name", "app").set("debug", true);
    settings.save(Some(file.path())).unwrap();

    file.assert(predicate::str::contains("name: app"));
    let loaded = FileBackedMapping::from_file(YamlFormat, file.path()).unwrap();
    assert_eq!(loaded.data(), settings.data());
}

#[test]
fn test_load_merges_into_existing_entries() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");
    file.write_str(r#"{"a": 1, "b": 2}"#).unwrap();

    let mut settings = FileBackedMapping::new(JsonFormat);
    settings.set("b", 20).set("memory_only", true);
    settings.load(Some(file.path())).unwrap();

    assert_eq!(settings.get("a"), Some(&json!(1)));
    assert_eq!(settings.get("b"), Some(&json!(2)));
    assert_eq!(settings.get("memory_only"), Some(&json!(true)));
}

#[rstest]
#[case::json_array("[1, 2]")]
#[case::json_garbage("{not json")]
fn test_invalid_json_is_parse_error(#[case] content: &str) {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");
    file.write_str(content).unwrap();

    let err = FileBackedMapping::from_file(JsonFormat, file.path()).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { ref format, .. } if format == "JSON"));
}

#[test]
fn test_toml_mixed_array_roundtrip() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.toml");
    file.write_str("kept = true\n").unwrap();

    let mut settings = FileBackedMapping::new(TomlFormat);
    settings.set(
        "list",
        toml::Value::Array(vec![toml::Value::Integer(1), toml::Value::String("x".into())]),
    );
    settings.set("kept", true);
    settings.save(Some(file.path())).unwrap();

    let loaded = FileBackedMapping::from_file(TomlFormat, file.path()).unwrap();
    assert_eq!(loaded.len(), 2);
}

#[test]
fn test_load_or_default_prefers_disk_values() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");
    file.write_str(r#"{"theme": "dark"}"#).unwrap();

    let settings = FileBackedMapping::load_or_default(
        JsonFormat,
        file.path(),
        [("theme", json!("light")), ("font_size", json!(12))],
    )
    .unwrap();

    assert_eq!(settings.get("theme"), Some(&json!("dark")));
    assert_eq!(settings.get("font_size"), Some(&json!(12)));
}

#[test]
fn test_load_or_default_missing_file_uses_defaults() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");

    let mut settings =
        FileBackedMapping::load_or_default(JsonFormat, file.path(), [("theme", json!("light"))])
            .unwrap();

    assert_eq!(settings.get("theme"), Some(&json!("light")));
    file.assert(predicate::path::missing());

    settings.save(None).unwrap();
    file.assert(predicate::path::exists());
}

#[test]
fn test_add_file_optional_and_required() {
    let temp = assert_fs::TempDir::new().unwrap();
    let extra = temp.child("extra.json");
    extra.write_str(r#"{"a": "override", "c": 3}"#).unwrap();

    let mut settings = FileBackedMapping::new(JsonFormat);
    settings.set("a", "base").set("b", "base");
    settings.add_file(extra.path(), false).unwrap();
    settings.add_file(temp.path().join("missing.json"), true).unwrap();

    assert_eq!(settings.get("a"), Some(&json!("override")));
    assert_eq!(settings.get("b"), Some(&json!("base")));
    assert_eq!(settings.get("c"), Some(&json!(3)));

    let err = settings
        .add_file(temp.path().join("missing.json"), false)
        .unwrap_err();
    assert!(matches!(err, Error::MissingFile { .. }));
}

#[test]
fn test_set_and_save_writes_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.yml");

    let mut settings = FileBackedMapping::new(YamlFormat).with_path(file.path());
    settings.set_and_save("user", "cjw").unwrap();

    file.assert(predicate::str::contains("user: cjw"));
}

#[test]
fn test_get_or_and_remove() {
    let mut settings = FileBackedMapping::new(JsonFormat);
    settings.set("a", 1);

    assert_eq!(settings.get_or("a", json!(0)), json!(1));
    assert_eq!(settings.get_or("b", json!(0)), json!(0));
    assert_eq!(settings.remove("a"), Some(json!(1)));
    assert!(settings.is_empty());
}

/// Stores every key upper-cased on disk and lower-cased in memory.
#[derive(Debug, Clone, Copy, Default)]
struct ShoutingJson;

impl SettingsFormat for ShoutingJson {
    type Value = serde_json::Value;
    const NAME: &'static str = "JSON";

    fn decode(&self, text: &str) -> Result<Mapping<Self::Value>, String> {
        JsonFormat.decode(text)
    }

    fn encode(&self, data: &Mapping<Self::Value>) -> Result<String, String> {
        JsonFormat.encode(data)
    }

    fn load_item(&self, key: String, value: Self::Value) -> (String, Self::Value) {
        (key.to_lowercase(), value)
    }

    fn save_item(&self, key: String, value: Self::Value) -> (String, Self::Value) {
        (key.to_uppercase(), value)
    }
}

#[test]
fn test_item_hooks_transform_keys() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("settings.json");

    let mut settings = FileBackedMapping::new(ShoutingJson).with_path(file.path());
    settings.set("user", "cjw");
    settings.save(None).unwrap();

    file.assert(predicate::str::contains("\"USER\""));
    let loaded = FileBackedMapping::from_file(ShoutingJson, file.path()).unwrap();
    assert_eq!(loaded.get("user"), Some(&json!("cjw")));
    assert!(loaded.get("USER").is_none());
}
