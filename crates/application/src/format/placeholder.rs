//! Marker substitution used by validation and formatting.
//!
//! Parsers never see markers: each one is swapped for a token that is valid
//! in its position, and formatting swaps the tokens back afterwards.

use courier_domain::Marker;

/// Base of the tokens substituted for markers while formatting.
const TOKEN_BASE: &str = "__courier_var_";

/// Returns, for each marker, whether it sits inside a JSON string literal.
///
/// Marker text itself is skipped so quotes inside ids never toggle the state.
pub fn json_string_positions(document: &str, markers: &[Marker]) -> Vec<bool> {
    let mut in_string = false;
    let mut escaped = false;
    let mut cursor = 0;
    let mut positions = Vec::with_capacity(markers.len());

    for marker in markers {
        scan_json(&document[cursor..marker.span.start], &mut in_string, &mut escaped);
        positions.push(in_string);
        escaped = false;
        cursor = marker.span.end;
    }

    positions
}

fn scan_json(text: &str, in_string: &mut bool, escaped: &mut bool) {
    for ch in text.chars() {
        if *in_string {
            if *escaped {
                *escaped = false;
            } else if ch == '\\' {
                *escaped = true;
            } else if ch == '"' {
                *in_string = false;
            }
        } else if ch == '"' {
            *in_string = true;
        }
    }
}

/// Rebuilds the document with each marker replaced by `replacement(index, marker)`.
pub fn substitute<F>(document: &str, markers: &[Marker], mut replacement: F) -> String
where
    F: FnMut(usize, &Marker) -> String,
{
    let mut out = String::with_capacity(document.len());
    let mut cursor = 0;
    for (index, marker) in markers.iter().enumerate() {
        out.push_str(&document[cursor..marker.span.start]);
        out.push_str(&replacement(index, marker));
        cursor = marker.span.end;
    }
    out.push_str(&document[cursor..]);
    out
}

/// Unique per-marker tokens that cannot collide with document text.
#[derive(Debug, Clone)]
pub struct TokenSet {
    prefix: String,
}

impl TokenSet {
    /// Picks a token prefix that does not occur in `document`.
    pub fn for_document(document: &str) -> Self {
        let mut prefix = TOKEN_BASE.to_string();
        while document.contains(&prefix) {
            prefix.push('_');
        }
        Self { prefix }
    }

    /// The token standing for the marker at `index`.
    pub fn token(&self, index: usize) -> String {
        format!("{}{index}__", self.prefix)
    }
}
