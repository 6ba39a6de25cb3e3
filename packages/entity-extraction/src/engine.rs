//! Extraction engine: per-kind scanning with cross-kind precedence.
//!
//! Kinds are resolved in precedence order ([`ExtractionKind::ALL`]). Each
//! surviving match claims its span; a lower-precedence match that overlaps a
//! claimed span without fully enclosing it is discarded. Enclosing matches
//! (a table containing an email, an image URL coinciding with its link) are
//! kept.
//!
//! Nothing here fails: any text, including empty text, yields a (possibly
//! empty) result.

use std::collections::HashSet;

use crate::recognizers::{self, RawMatch};
use crate::types::{kind::ExtractionKind, report::ExtractionReport};

/// A match that survived the precedence filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMatch {
    pub kind: ExtractionKind,
    /// Byte offset of the first character of the entity
    pub start: usize,
    /// Byte offset one past the entity
    pub end: usize,
    /// Normalized value
    pub value: String,
}

/// Extract the unique values of one kind, in order of first occurrence.
pub fn extract(text: &str, kind: ExtractionKind) -> Vec<String> {
    unique_values(scan(text, kind))
}

/// Extract every kind in one pass.
///
/// Equivalent to calling [`extract`] once per kind.
pub fn extract_all(text: &str) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    let mut claimed = Vec::new();

    for kind in ExtractionKind::ALL {
        let matches = surviving(text, kind, &claimed);
        claimed.extend(matches.iter().map(|m| (m.start, m.end)));
        report.set(kind, unique_values(matches));
    }

    report
}

/// All surviving matches of one kind with their spans, duplicates included.
pub fn scan(text: &str, kind: ExtractionKind) -> Vec<EntityMatch> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut claimed = Vec::new();
    for &higher in kind.higher() {
        let matches = surviving(text, higher, &claimed);
        claimed.extend(matches.iter().map(|m| (m.start, m.end)));
    }

    surviving(text, kind, &claimed)
}

/// True when `value` is exactly one entity of `kind`, ignoring surrounding
/// whitespace. Intended for field-format validation.
pub fn is_match(value: &str, kind: ExtractionKind) -> bool {
    let value = value.trim();
    match scan(value, kind).as_slice() {
        [only] => only.start == 0 && only.end == value.len(),
        _ => false,
    }
}

/// True when `text` contains at least one entity of `kind`.
pub fn contains(text: &str, kind: ExtractionKind) -> bool {
    !scan(text, kind).is_empty()
}

fn surviving(text: &str, kind: ExtractionKind, claimed: &[(usize, usize)]) -> Vec<EntityMatch> {
    recognizers::rule(kind)
        .find(text)
        .into_iter()
        .filter(|m| !conflicts(m, claimed))
        .map(|RawMatch { start, end, value }| EntityMatch {
            kind,
            start,
            end,
            value,
        })
        .collect()
}

fn conflicts(m: &RawMatch, claimed: &[(usize, usize)]) -> bool {
    claimed.iter().any(|&(start, end)| {
        let overlaps = m.start < end && start < m.end;
        let encloses = m.start <= start && end <= m.end;
        overlaps && !encloses
    })
}

fn unique_values(matches: Vec<EntityMatch>) -> Vec<String> {
    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter_map(|m| seen.insert(m.value.clone()).then_some(m.value))
        .collect()
}
