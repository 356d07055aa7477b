//! Marker model for `{{type:id}}` syntax
//!
//! Parses a document into plain-text runs and variable markers. The
//! document string is the single source of truth; every function here is a
//! pure view over it.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::variable::VariableType;

/// `{{<type>:<id>}}`, non-greedy on the id since it may not contain braces.
#[allow(clippy::expect_used)]
static MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_-]+):([^{}]+)\}\}").expect("valid regex"));

/// A parsed occurrence of a variable reference within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Byte range in the document.
    pub span: Range<usize>,

    /// Range in logical characters, the unit caret offsets are measured in.
    pub char_span: Range<usize>,

    /// The referenced variable's kind.
    pub variable_type: VariableType,

    /// The referenced variable's id.
    pub id: String,

    /// The exact marker text, `{{type:id}}`.
    pub raw: String,
}

impl Marker {
    /// Builds the canonical marker text for a variable.
    #[must_use]
    pub fn format(variable_type: VariableType, id: &str) -> String {
        format!("{{{{{}:{id}}}}}", variable_type.tag())
    }

    /// Length of the marker in logical characters.
    #[must_use]
    pub const fn char_len(&self) -> usize {
        self.char_span.end - self.char_span.start
    }
}

/// A contiguous piece of a document, used to drive rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// Literal text, possibly containing line breaks.
    Text(String),
    /// A variable marker.
    Marker(Marker),
}

impl Run {
    /// The document text this run stands for.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Marker(marker) => &marker.raw,
        }
    }
}

/// Parses a document and extracts all markers, ordered by position.
///
/// Occurrences whose type tag is not a known [`VariableType`] are treated as
/// literal text.
///
/// # Examples
///
/// ```
/// use courier_domain::marker::parse_markers;
/// use courier_domain::VariableType;
///
/// let markers = parse_markers(r#"{"id": {{uuid:v1}}, "at": {{timestamp:t}}}"#);
/// assert_eq!(markers.len(), 2);
/// assert_eq!(markers[0].variable_type, VariableType::Uuid);
/// assert_eq!(markers[0].id, "v1");
/// assert_eq!(markers[1].raw, "{{timestamp:t}}");
/// ```
#[must_use]
pub fn parse_markers(document: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    for caps in MARKER_PATTERN.captures_iter(document) {
        let (Some(whole), Some(tag), Some(id)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let Ok(variable_type) = tag.as_str().parse::<VariableType>() else {
            continue;
        };

        char_cursor += document[byte_cursor..whole.start()].chars().count();
        let char_start = char_cursor;
        char_cursor += whole.as_str().chars().count();
        byte_cursor = whole.end();

        markers.push(Marker {
            span: whole.range(),
            char_span: char_start..char_cursor,
            variable_type,
            id: id.as_str().to_string(),
            raw: whole.as_str().to_string(),
        });
    }

    markers
}

/// Splits a document into alternating text and marker runs.
///
/// Concatenating [`Run::as_str`] over the result reproduces the input.
#[must_use]
pub fn split_runs(document: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut last_end = 0;

    for marker in parse_markers(document) {
        if marker.span.start > last_end {
            runs.push(Run::Text(document[last_end..marker.span.start].to_string()));
        }
        last_end = marker.span.end;
        runs.push(Run::Marker(marker));
    }

    if last_end < document.len() {
        runs.push(Run::Text(document[last_end..].to_string()));
    }

    runs
}

/// Returns the ids of every variable referenced by the document.
#[must_use]
pub fn referenced_ids(document: &str) -> BTreeSet<String> {
    parse_markers(document).into_iter().map(|m| m.id).collect()
}

/// Returns the raw text of every marker, sorted, so two documents can be
/// compared as multisets of markers.
#[must_use]
pub fn marker_multiset(document: &str) -> Vec<String> {
    let mut raws: Vec<String> = parse_markers(document).into_iter().map(|m| m.raw).collect();
    raws.sort();
    raws
}

/// Returns the marker ending exactly at the given character offset.
#[must_use]
pub fn marker_ending_at(document: &str, char_offset: usize) -> Option<Marker> {
    parse_markers(document)
        .into_iter()
        .find(|m| m.char_span.end == char_offset)
}
