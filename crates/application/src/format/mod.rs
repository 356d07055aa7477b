//! Auto-format engine
//!
//! Validates and pretty-prints bodies that contain `{{type:id}}` markers.
//! Markers are swapped for position-appropriate placeholders before parsing
//! and swapped back afterwards, so formatting never changes which markers a
//! document contains.
//!
//! # Usage
//!
//! ```
//! use courier_application::format::{FormatOutcome, format_document, validate};
//! use courier_domain::BodySyntax;
//!
//! let doc = r#"{"id":{{uuid:v1}}}"#;
//! assert!(validate(doc, BodySyntax::Json).is_valid());
//!
//! let FormatOutcome::Formatted(pretty) = format_document(doc, BodySyntax::Json, "  ") else {
//!     panic!("expected a reformat");
//! };
//! assert_eq!(pretty, "{\n  \"id\": {{uuid:v1}}\n}");
//! ```

pub mod json;
pub(crate) mod placeholder;
pub mod xml;

use courier_domain::marker::marker_multiset;
use courier_domain::{BodySyntax, SyntaxStatus};

/// Result of attempting to reformat a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// The document was reformatted into the contained text.
    Formatted(String),
    /// The document is already formatted.
    Unchanged,
    /// The document does not parse; nothing was done.
    Invalid,
    /// Formatting would have changed the set of markers; nothing was done.
    MarkersChanged,
    /// The syntax is never formatted.
    Unsupported,
}

/// Checks whether the document parses for its syntax.
#[must_use]
pub fn validate(document: &str, syntax: BodySyntax) -> SyntaxStatus {
    match syntax {
        BodySyntax::Json => json::validate(document),
        BodySyntax::Xml => xml::validate(document),
        BodySyntax::Text => SyntaxStatus::Valid,
    }
}

/// Reformats the document with the given indentation unit.
#[must_use]
pub fn format_document(document: &str, syntax: BodySyntax, indent_unit: &str) -> FormatOutcome {
    let formatted = match syntax {
        BodySyntax::Json => json::format(document, indent_unit),
        BodySyntax::Xml => xml::format(document, indent_unit),
        BodySyntax::Text => return FormatOutcome::Unsupported,
    };

    let Some(formatted) = formatted else {
        return FormatOutcome::Invalid;
    };

    if marker_multiset(&formatted) != marker_multiset(document) {
        tracing::warn!(
            target: "courier::format",
            %syntax,
            "formatting would change the document's markers; skipping"
        );
        return FormatOutcome::MarkersChanged;
    }

    if formatted == document {
        FormatOutcome::Unchanged
    } else {
        FormatOutcome::Formatted(formatted)
    }
}

/// Returns the reformatted document only if it differs from the input.
#[must_use]
pub fn auto_format(document: &str, syntax: BodySyntax, indent_unit: &str) -> Option<String> {
    match format_document(document, syntax, indent_unit) {
        FormatOutcome::Formatted(text) => Some(text),
        _ => None,
    }
}
