//! Java-style property files describing talks
//!
//! Files are ISO-8859-1 encoded. Supported syntax: `key=value`, `key:value`
//! and `key value` pairs, `#`/`!` comment lines, trailing-backslash line
//! continuations, and `\uXXXX`, `\t`, `\n`, `\r`, `\f` escapes. A repeated key
//! keeps its last value.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Result, TalkdexError};
use crate::models::Talk;

/// Date format of the `date` property
pub const PROPERTY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Parsed key/value pairs of one property file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Read and parse a property file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        parse_entries(&decode_latin1(&bytes))
            .map(|entries| Self { entries })
            .map_err(|message| TalkdexError::invalid_talk(path, message))
    }

    /// Parse already decoded text
    pub fn parse(text: &str) -> Result<Self> {
        parse_entries(text)
            .map(|entries| Self { entries })
            .map_err(TalkdexError::InvalidDocument)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Talk {
    /// Build a talk from the properties `speaker`, `title`, `content`,
    /// `date` (`dd.MM.yyyy`) and `categories`
    ///
    /// Speakers and categories are comma separated; blank entries are dropped.
    pub fn from_properties(path: impl AsRef<Path>, props: &Properties) -> Result<Self> {
        let path = path.as_ref();
        let title = props
            .get("title")
            .ok_or_else(|| TalkdexError::invalid_talk(path, "missing title"))?;
        let raw_date = props
            .get("date")
            .ok_or_else(|| TalkdexError::invalid_talk(path, "missing date"))?;
        let date = NaiveDate::parse_from_str(raw_date.trim(), PROPERTY_DATE_FORMAT).map_err(|e| {
            TalkdexError::invalid_talk(path, format!("invalid date '{raw_date}': {e}"))
        })?;

        Ok(Talk::new(
            path.to_string_lossy(),
            title,
            split_list(props.get("speaker")),
            date,
            props.get("content").unwrap_or_default(),
            split_list(props.get("categories")),
        ))
    }

    /// Load a talk from a property file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_properties(path, &Properties::load(path)?)
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Every ISO-8859-1 byte maps to the code point of the same value
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// A line continues when it ends in an odd number of backslashes
fn continues(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn parse_entries(text: &str) -> std::result::Result<BTreeMap<String, String>, String> {
    let mut entries = BTreeMap::new();
    let mut lines = text.lines().enumerate();

    while let Some((number, line)) = lines.next() {
        let first = line.trim_start_matches(is_blank);
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = first.to_string();
        while continues(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_pair(&logical);
        let key = unescape(key).map_err(|e| format!("line {}: {e}", number + 1))?;
        let value = unescape(value).map_err(|e| format!("line {}: {e}", number + 1))?;
        entries.insert(key, value);
    }

    Ok(entries)
}

/// Split a logical line into raw key and value at the first unescaped separator
fn split_pair(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\uxxxx escape '\\u{hex}'"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
