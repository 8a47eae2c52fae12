//! Comparisons between settings mappings
//!
//! Either side may be a [`crate::SettingsStore`] or a plain [`Settings`]
//! mapping; anything else does not implement [`SettingsView`] and is rejected
//! at compile time.

use crate::value::Settings;
use std::cmp::Ordering;

/// Read access to a settings mapping for comparison.
pub trait SettingsView {
    fn as_settings(&self) -> &Settings;
}

impl SettingsView for Settings {
    fn as_settings(&self) -> &Settings {
        self
    }
}

impl<T: SettingsView + ?Sized> SettingsView for &T {
    fn as_settings(&self) -> &Settings {
        (**self).as_settings()
    }
}

/// True iff both sides have exactly the same keys.
pub fn keys_equal(a: &impl SettingsView, b: &impl SettingsView) -> bool {
    let (a, b) = (a.as_settings(), b.as_settings());
    a.len() == b.len() && a.keys().all(|key| b.contains_key(key))
}

/// True iff every key has an equal value on the other side.
///
/// A key missing from either side counts as a mismatch.
pub fn values_equal(a: &impl SettingsView, b: &impl SettingsView) -> bool {
    let (a, b) = (a.as_settings(), b.as_settings());
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| other == value))
}

/// Same size, same keys, same values.
pub fn settings_equal(a: &impl SettingsView, b: &impl SettingsView) -> bool {
    a.as_settings().len() == b.as_settings().len() && keys_equal(a, b) && values_equal(a, b)
}

/// Order two mappings by entry count.
///
/// `Greater`/`Less` when the counts differ. With equal counts the result is
/// `Equal` if the contents are equal and `None` otherwise, so `>=` means
/// "more entries, or identical".
pub fn entry_count_compare(a: &impl SettingsView, b: &impl SettingsView) -> Option<Ordering> {
    match a.as_settings().len().cmp(&b.as_settings().len()) {
        Ordering::Equal if settings_equal(a, b) => Some(Ordering::Equal),
        Ordering::Equal => None,
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SettingValue;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), SettingValue::from(*v)))
            .collect()
    }

    #[test]
    fn identical_mappings_are_equal() {
        let a = settings(&[("a", "1"), ("b", "2")]);
        let b = settings(&[("b", "2"), ("a", "1")]);
        assert!(keys_equal(&a, &b));
        assert!(values_equal(&a, &b));
        assert!(settings_equal(&a, &b));
    }

    #[test]
    fn changed_value_keeps_keys_equal() {
        let a = settings(&[("a", "1"), ("b", "2")]);
        let b = settings(&[("a", "1"), ("b", "changed")]);
        assert!(keys_equal(&a, &b));
        assert!(!values_equal(&a, &b));
        assert!(!settings_equal(&a, &b));
    }

    #[test]
    fn missing_key_is_not_a_wildcard() {
        let a = settings(&[("a", "1"), ("b", "2")]);
        let b = settings(&[("a", "1")]);
        assert!(!keys_equal(&a, &b));
        assert!(!values_equal(&a, &b));
        assert!(!values_equal(&b, &a));
    }

    #[test]
    fn count_ordering() {
        let small = settings(&[("a", "1")]);
        let big = settings(&[("a", "1"), ("b", "2")]);
        let other = settings(&[("z", "9")]);

        assert_eq!(entry_count_compare(&big, &small), Some(Ordering::Greater));
        assert_eq!(entry_count_compare(&small, &big), Some(Ordering::Less));
        assert_eq!(entry_count_compare(&small, &small.clone()), Some(Ordering::Equal));
        assert_eq!(entry_count_compare(&small, &other), None);
    }
}
