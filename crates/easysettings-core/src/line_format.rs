//! Whole-file encoding for the line-based settings format
//!
//! ```text
//! # Configuration for <name> v. <version>
//! # <header line>
//! <key>=<encoded value>
//! ```
//!
//! Comment lines are skipped on read, as are lines without a `=`. Only the
//! first `=` splits key from value.

use crate::codec::{decode_value, encode_value};
use crate::value::{SettingValue, Settings};
use crate::{Error, Result};

/// Separates a key from its encoded value.
pub const DELIMITER: char = '=';

/// Marks a comment line.
pub const COMMENT: char = '#';

/// First header line: `# Configuration[ for <name>[ v. <version>]]`.
pub fn build_header(name: Option<&str>, version: Option<&str>) -> String {
    let mut line = String::from("# Configuration");
    if let Some(name) = name {
        line.push_str(" for ");
        line.push_str(name);
        if let Some(version) = version {
            line.push_str(" v. ");
            line.push_str(version);
        }
    }
    line
}

/// Turn free header text into comment lines.
pub fn header_comment_lines(header: Option<&str>) -> Vec<String> {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return Vec::new();
    };
    header.split('\n').map(comment_line).collect()
}

fn comment_line(line: &str) -> String {
    let stripped = line.trim_start();
    if stripped.starts_with(COMMENT) {
        stripped.to_string()
    } else {
        format!("{} {}", COMMENT, stripped)
    }
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(COMMENT)
}

/// Encode header lines followed by one `key=value` line per entry.
///
/// Header lines are split on newlines and every piece is written as a
/// comment.
pub fn encode<'a, I>(header_lines: &[String], entries: I) -> Result<String>
where
    I: IntoIterator<Item = (&'a String, &'a SettingValue)>,
{
    let mut out = String::new();
    for line in header_lines.iter().flat_map(|line| line.split('\n')) {
        if is_comment(line) {
            out.push_str(line);
        } else {
            out.push_str(&comment_line(line));
        }
        out.push('\n');
    }

    for (key, value) in entries {
        let encoded = encode_value(value).map_err(|e| match e {
            Error::InvalidValue { message } => Error::InvalidValue {
                message: format!("{}: {}", key, message),
            },
            other => other,
        })?;
        out.push_str(key);
        out.push(DELIMITER);
        out.push_str(&encoded);
        out.push('\n');
    }
    Ok(out)
}

/// Decode a whole file. Later duplicates of a key win.
///
/// A `\r` before each `\n` is dropped, so CRLF files read like LF files.
pub fn decode(text: &str) -> Settings {
    let mut settings = Settings::new();
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if is_comment(line) {
            continue;
        }
        let Some((key, value)) = line.split_once(DELIMITER) else {
            continue;
        };
        settings.insert(key.to_string(), decode_value(value));
    }
    settings
}
