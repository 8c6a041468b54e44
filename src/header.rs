//! Header row cleaning.
//!
//! Headers arrive as `Option<String>`: `None` marks a missing or non-textual
//! header cell. Cleaning is index-aligned and synthesizes `Column_<n>` for
//! anything unusable. Uniqueness is not enforced.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::value::{RawCell, is_sentinel};

pub type ColumnMapping = BTreeMap<String, String>;

pub fn synthetic_column_name(index: usize) -> String {
    format!("Column_{}", index + 1)
}

/// Convenience for callers holding plain header strings.
pub fn header_row<S: AsRef<str>>(names: &[S]) -> Vec<Option<String>> {
    names
        .iter()
        .map(|name| Some(name.as_ref().to_string()))
        .collect()
}

/// Textual form of a header cell, or `None` when the cell is empty or not
/// textual (numbers and booleans do not name columns).
pub fn header_text(raw: &RawCell) -> Option<String> {
    match raw {
        RawCell::Text(s)
        | RawCell::RichText(s)
        | RawCell::Hyperlink(s)
        | RawCell::Unclassified(s) => Some(s.clone()),
        RawCell::Formula { result, .. } => result.as_deref().and_then(header_text),
        RawCell::Date(_) => crate::value::coerce(raw).map(|value| value.as_display()),
        RawCell::Empty | RawCell::InvalidDate | RawCell::Number(_) | RawCell::Bool(_) => None,
    }
}

pub fn clean_headers(headers: &[Option<String>]) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| clean_header(index, header.as_deref()))
        .collect()
}

fn clean_header(index: usize, header: Option<&str>) -> String {
    let Some(raw) = header else {
        return synthetic_column_name(index);
    };
    let cleaned = raw.split_whitespace().join(" ");
    if is_sentinel(&cleaned) {
        synthetic_column_name(index)
    } else {
        cleaned
    }
}

/// Original → cleaned name for every position where cleaning changed it.
/// Missing headers are keyed by the empty string.
pub fn column_mapping(original: &[Option<String>], cleaned: &[String]) -> ColumnMapping {
    original
        .iter()
        .zip(cleaned)
        .filter_map(|(original, cleaned)| {
            let original = original.as_deref().unwrap_or("");
            (original != cleaned).then(|| (original.to_string(), cleaned.clone()))
        })
        .collect()
}
