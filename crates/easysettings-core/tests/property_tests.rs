use easysettings_core::codec::{NEWLINE_TOKEN, decode_value, encode_value};
use easysettings_core::{SettingValue, Settings, line_format};
use proptest::prelude::*;

fn plain_string() -> impl Strategy<Value = String> {
    // No braces, quotes, dashes or colons: cannot look like a tagged value or
    // a date, so it must come back as a string. Parentheses let `(es_nl)`
    // appear inside nested strings.
    "[a-zA-Z0-9 =#\n\t.,;!?_()]*"
}

/// A top-level string holding the literal newline token reads back with a
/// newline in its place.
fn is_ambiguous(value: &SettingValue) -> bool {
    value.as_str().is_some_and(|s| s.contains(NEWLINE_TOKEN))
}

fn value() -> impl Strategy<Value = SettingValue> {
    let leaf = prop_oneof![
        plain_string().prop_map(SettingValue::String),
        any::<bool>().prop_map(SettingValue::Bool),
        any::<i64>().prop_map(SettingValue::Int),
        proptest::num::f64::NORMAL.prop_map(SettingValue::Float),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(SettingValue::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(SettingValue::Map),
        ]
    })
}

proptest! {
    #[test]
    fn test_value_roundtrip(v in value()) {
        prop_assume!(!is_ambiguous(&v));
        let encoded = encode_value(&v).unwrap();
        prop_assert!(!encoded.contains('\n'));
        prop_assert_eq!(decode_value(&encoded), v);
    }

    #[test]
    fn test_file_roundtrip(
        entries in prop::collection::btree_map("[a-z][a-z0-9_ ]{0,8}", value(), 0..8),
        name in proptest::option::of("[A-Za-z]{1,8}"),
    ) {
        prop_assume!(!entries.values().any(is_ambiguous));
        let settings: Settings = entries;
        let header = vec![line_format::build_header(name.as_deref(), Some("1.0"))];
        let text = line_format::encode(&header, &settings).unwrap();
        prop_assert_eq!(line_format::decode(&text), settings);
    }
}
