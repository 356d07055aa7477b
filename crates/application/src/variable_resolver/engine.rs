//! Variable resolution engine
//!
//! Replaces `{{type:id}}` markers with the literal values sent on the wire.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_domain::{
    BodySyntax, EditorSettings, Marker, TimestampUnit, Variable, VariableType, parse_markers,
};

use super::builtins::GeneratedValues;
use crate::format::placeholder::{json_string_positions, substitute};
use crate::ports::Clock;

/// MIME type used in data URLs when the file's type is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Options controlling how markers are substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Text substituted for variables that are missing or have no data.
    pub missing_data_placeholder: String,
    /// Unit of resolved timestamps.
    pub timestamp_unit: TimestampUnit,
    /// Length of resolved random strings.
    pub random_string_length: usize,
    /// Body syntax; `Json` quotes and escapes values for their position.
    pub syntax: BodySyntax,
}

impl ResolveOptions {
    /// Options taken from editor settings.
    #[must_use]
    pub fn from_settings(settings: &EditorSettings, syntax: BodySyntax) -> Self {
        Self {
            missing_data_placeholder: settings.missing_data_placeholder.clone(),
            timestamp_unit: settings.timestamp_unit,
            random_string_length: settings.random_string_length,
            syntax,
        }
    }

    /// Sets the body syntax.
    #[must_use]
    pub const fn with_syntax(mut self, syntax: BodySyntax) -> Self {
        self.syntax = syntax;
        self
    }
}

impl Default for ResolveOptions {
    /// Default settings, substituting values verbatim.
    fn default() -> Self {
        Self::from_settings(&EditorSettings::default(), BodySyntax::Text)
    }
}

/// Result of resolving a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// The document with every marker substituted.
    pub resolved: String,

    /// Ids of markers that fell back to the missing-data placeholder.
    pub unresolved: Vec<String>,

    /// Whether every marker resolved to a real value.
    pub is_complete: bool,
}

impl ResolutionResult {
    /// Creates a result for input with no markers.
    #[must_use]
    pub fn no_markers(input: &str) -> Self {
        Self {
            resolved: input.to_string(),
            unresolved: Vec::new(),
            is_complete: true,
        }
    }

    /// Returns the count of unresolved markers.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }
}

/// A resolved marker value and how it is written into the output.
enum Value {
    /// A string, quoted when it sits at a JSON value position.
    Text(String),
    /// A number, always written bare.
    Number(String),
    /// The missing-data placeholder.
    Missing,
}

/// The variable resolution engine.
pub struct VariableResolver {
    clock: Arc<dyn Clock>,
    options: ResolveOptions,
}

impl VariableResolver {
    /// Creates a resolver reading the time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, options: ResolveOptions) -> Self {
        Self { clock, options }
    }

    /// Returns the current options.
    #[must_use]
    pub const fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Replaces the options.
    pub fn set_options(&mut self, options: ResolveOptions) {
        self.options = options;
    }

    /// Resolves every marker in `document` against `variables`.
    ///
    /// Generated values are fresh per call; markers sharing an id within
    /// one call share the value.
    #[must_use]
    pub fn resolve(&self, document: &str, variables: &[Variable]) -> ResolutionResult {
        let markers = parse_markers(document);
        if markers.is_empty() {
            return ResolutionResult::no_markers(document);
        }

        let by_id: HashMap<&str, &Variable> =
            variables.iter().map(|v| (v.id.as_str(), v)).collect();
        let in_string = match self.options.syntax {
            BodySyntax::Json => json_string_positions(document, &markers),
            BodySyntax::Xml | BodySyntax::Text => vec![false; markers.len()],
        };
        let now = self.clock.now();

        let mut cache: HashMap<&str, Value> = HashMap::new();
        let mut unresolved = Vec::new();
        for marker in &markers {
            if cache.contains_key(marker.id.as_str()) {
                continue;
            }
            let value = self.value_of(marker, by_id.get(marker.id.as_str()).copied(), now);
            if matches!(value, Value::Missing) {
                unresolved.push(marker.id.clone());
            }
            cache.insert(marker.id.as_str(), value);
        }

        let resolved = substitute(document, &markers, |index, marker| {
            let value = cache.get(marker.id.as_str()).unwrap_or(&Value::Missing);
            self.write(value, in_string[index])
        });

        if !unresolved.is_empty() {
            tracing::debug!(
                target: "courier::resolve",
                unresolved = unresolved.len(),
                "markers resolved to the missing-data placeholder"
            );
        }

        ResolutionResult {
            is_complete: unresolved.is_empty(),
            resolved,
            unresolved,
        }
    }

    fn value_of(
        &self,
        marker: &Marker,
        variable: Option<&Variable>,
        now: DateTime<Utc>,
    ) -> Value {
        let Some(variable) = variable else {
            return Value::Missing;
        };
        match marker.variable_type {
            VariableType::Timestamp => {
                Value::Number(GeneratedValues::timestamp(now, self.options.timestamp_unit))
            }
            VariableType::Uuid => Value::Text(GeneratedValues::uuid()),
            VariableType::RandomString => Value::Text(GeneratedValues::random_string(
                self.options.random_string_length,
            )),
            VariableType::Base64Text | VariableType::FileBase64 => variable
                .data
                .clone()
                .map_or(Value::Missing, Value::Text),
            VariableType::FileDataUrl => variable.data.as_ref().map_or(Value::Missing, |data| {
                let mime = variable.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
                Value::Text(format!("data:{mime};base64,{data}"))
            }),
        }
    }

    fn write(&self, value: &Value, in_string: bool) -> String {
        let text = match value {
            Value::Number(number) => return number.clone(),
            Value::Text(text) => text.as_str(),
            Value::Missing => self.options.missing_data_placeholder.as_str(),
        };
        if self.options.syntax != BodySyntax::Json {
            return text.to_string();
        }
        let quoted = serde_json::Value::String(text.to_string()).to_string();
        if in_string {
            quoted[1..quoted.len() - 1].to_string()
        } else {
            quoted
        }
    }
}

/// Resolves `document` in one call.
#[must_use]
pub fn resolve_variables(
    document: &str,
    variables: &[Variable],
    options: &ResolveOptions,
    clock: Arc<dyn Clock>,
) -> String {
    VariableResolver::new(clock, options.clone())
        .resolve(document, variables)
        .resolved
}
