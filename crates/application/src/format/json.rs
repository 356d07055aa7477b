//! JSON validation and pretty-printing for bodies containing markers.

use courier_domain::{Marker, SyntaxStatus, parse_markers};
use serde_json::Value;

use super::placeholder::{TokenSet, json_string_positions, substitute};

/// Word substituted for markers that sit inside a string literal.
const IN_STRING_PLACEHOLDER: &str = "__courier_var__";

/// Checks whether the document parses as JSON once markers are substituted.
///
/// Markers inside string literals become a bare word, all others `null`.
pub fn validate(document: &str) -> SyntaxStatus {
    if document.trim().is_empty() {
        return SyntaxStatus::Valid;
    }
    let markers = parse_markers(document);
    let in_string = json_string_positions(document, &markers);
    let substituted = substitute(document, &markers, |i, _| {
        if in_string[i] {
            IN_STRING_PLACEHOLDER.to_string()
        } else {
            "null".to_string()
        }
    });
    match serde_json::from_str::<Value>(&substituted) {
        Ok(_) => SyntaxStatus::Valid,
        Err(e) => SyntaxStatus::invalid(e.to_string()),
    }
}

/// Pretty-prints the document, keeping every marker's raw text.
///
/// Returns `None` if the document does not parse.
pub fn format(document: &str, indent_unit: &str) -> Option<String> {
    if document.trim().is_empty() {
        return None;
    }
    let markers = parse_markers(document);
    let in_string = json_string_positions(document, &markers);
    let tokens = TokenSet::for_document(document);

    let tokenized = substitute(document, &markers, |i, _| {
        if in_string[i] {
            tokens.token(i)
        } else {
            format!("\"{}\"", tokens.token(i))
        }
    });
    let value: Value = serde_json::from_str(&tokenized).ok()?;

    let mut pretty = String::with_capacity(tokenized.len() * 2);
    write_value(&mut pretty, &value, 0, indent_unit);

    Some(restore(pretty, &markers, &in_string, &tokens))
}

fn restore(mut text: String, markers: &[Marker], in_string: &[bool], tokens: &TokenSet) -> String {
    for (i, marker) in markers.iter().enumerate() {
        let token = tokens.token(i);
        let needle = if in_string[i] {
            token
        } else {
            format!("\"{token}\"")
        };
        text = text.replacen(&needle, &marker.raw, 1);
    }
    text
}

fn write_value(out: &mut String, value: &Value, depth: usize, indent_unit: &str) {
    match value {
        Value::Object(map) => {
            out.push_str("{\n");
            let len = map.len();
            for (i, (key, item)) in map.iter().enumerate() {
                push_indent(out, depth + 1, indent_unit);
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_value(out, item, depth + 1, indent_unit);
                if i + 1 < len {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth, indent_unit);
            out.push('}');
        }
        Value::Array(items) => {
            out.push_str("[\n");
            let len = items.len();
            for (i, item) in items.iter().enumerate() {
                push_indent(out, depth + 1, indent_unit);
                write_value(out, item, depth + 1, indent_unit);
                if i + 1 < len {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth, indent_unit);
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn push_indent(out: &mut String, depth: usize, indent_unit: &str) {
    for _ in 0..depth {
        out.push_str(indent_unit);
    }
}
