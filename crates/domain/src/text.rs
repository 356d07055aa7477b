//! Logical character offset helpers.
//!
//! Caret offsets are measured in Unicode scalar values of the document, not
//! in bytes. These helpers convert between the two and perform edits
//! expressed in caret units.

use std::ops::Range;

/// Length of `text` in logical characters.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the given character offset, clamped to the end of `text`.
#[must_use]
pub fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

/// The substring covering a range of character offsets.
#[must_use]
pub fn char_slice(text: &str, range: Range<usize>) -> &str {
    let start = byte_index(text, range.start);
    let end = byte_index(text, range.end.max(range.start));
    &text[start..end]
}

/// Replaces a range of character offsets with `replacement`.
#[must_use]
pub fn splice(text: &str, range: Range<usize>, replacement: &str) -> String {
    let start = byte_index(text, range.start);
    let end = byte_index(text, range.end.max(range.start));
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    out
}

/// The text between the start of the caret's line and the caret.
#[must_use]
pub fn line_before(text: &str, char_offset: usize) -> &str {
    let end = byte_index(text, char_offset);
    let start = text[..end].rfind('\n').map_or(0, |i| i + 1);
    &text[start..end]
}

/// Leading spaces and tabs of a line.
#[must_use]
pub fn leading_indent(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}
