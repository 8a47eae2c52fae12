//! Text encoding of single setting values
//!
//! Decode precedence is part of the file format and must not change:
//!
//! 1. Text that deserializes as a tagged [`SettingValue`] (`{"int":42}`) is
//!    that value. Strings nested inside keep any literal `(es_nl)`.
//! 2. Otherwise `(es_nl)` tokens become newlines.
//! 3. Text matching [`ISO8601`] is a `DateTime`.
//! 4. Anything else is a `String`.
//!
//! A string that happens to look like step 2 or 3 therefore does not survive
//! a round trip as a string.

use crate::value::{ISO8601, SettingValue};
use crate::{Error, Result};
use chrono::{NaiveDateTime, NaiveTime};

/// Stand-in for a literal newline inside an encoded value.
pub const NEWLINE_TOKEN: &str = "(es_nl)";

/// Encode a value as single-line text.
///
/// Fails with [`Error::InvalidValue`] for values containing NaN or infinite
/// floats, which the tagged form cannot represent.
pub fn encode_value(value: &SettingValue) -> Result<String> {
    let text = match value {
        SettingValue::String(s) => s.clone(),
        SettingValue::Date(d) => d.and_time(NaiveTime::MIN).format(ISO8601).to_string(),
        SettingValue::DateTime(dt) => dt.format(ISO8601).to_string(),
        other => {
            if let Some(f) = other.non_finite_float() {
                return Err(Error::InvalidValue {
                    message: format!("cannot encode non-finite float {}", f),
                });
            }
            serde_json::to_string(other).map_err(|e| Error::InvalidValue {
                message: e.to_string(),
            })?
        }
    };
    Ok(escape_newlines(&text))
}

/// Decode text produced by [`encode_value`]. Never fails; unrecognised text is
/// a string.
pub fn decode_value(text: &str) -> SettingValue {
    // Tagged text never holds raw newlines, so it is decoded before unescaping.
    if let Ok(value) = serde_json::from_str::<SettingValue>(text) {
        return value;
    }

    let text = unescape_newlines(text);
    match NaiveDateTime::parse_from_str(&text, ISO8601) {
        Ok(naive) => SettingValue::DateTime(naive.and_utc()),
        Err(_) => SettingValue::String(text),
    }
}

pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', NEWLINE_TOKEN)
}

pub fn unescape_newlines(text: &str) -> String {
    text.replace(NEWLINE_TOKEN, "\n")
}
