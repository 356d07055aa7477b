//! Variable domain types
//!
//! A variable is a named, typed placeholder referenced from the document by
//! one or more `{{type:id}}` markers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The closed set of variable kinds the editor can insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableType {
    /// File contents, base64 encoded.
    FileBase64,
    /// File contents as a `data:` URL.
    FileDataUrl,
    /// Text typed by the user, base64 encoded.
    Base64Text,
    /// Current Unix time, computed at resolve time.
    Timestamp,
    /// Fresh random UUID per resolution.
    Uuid,
    /// Fresh random alphanumeric string per resolution.
    RandomString,
}

impl VariableType {
    /// All variable types in picker order.
    pub const ALL: [Self; 6] = [
        Self::FileBase64,
        Self::FileDataUrl,
        Self::Base64Text,
        Self::Timestamp,
        Self::Uuid,
        Self::RandomString,
    ];

    /// The tag written inside markers.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::FileBase64 => "file-base64",
            Self::FileDataUrl => "file-data-url",
            Self::Base64Text => "base64-text",
            Self::Timestamp => "timestamp",
            Self::Uuid => "uuid",
            Self::RandomString => "random-string",
        }
    }

    /// Human readable label used for picker entries and default names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FileBase64 => "File (base64)",
            Self::FileDataUrl => "File (data URL)",
            Self::Base64Text => "Base64 text",
            Self::Timestamp => "Timestamp",
            Self::Uuid => "UUID",
            Self::RandomString => "Random string",
        }
    }

    /// Returns true if the value is read from a file chosen by the user.
    #[must_use]
    pub const fn is_file_backed(self) -> bool {
        matches!(self, Self::FileBase64 | Self::FileDataUrl)
    }

    /// Returns true if the variable only has a value once the user supplies data.
    #[must_use]
    pub const fn needs_configuration(self) -> bool {
        matches!(self, Self::FileBase64 | Self::FileDataUrl | Self::Base64Text)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for VariableType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.tag() == s)
            .ok_or_else(|| DomainError::UnknownVariableType(s.to_string()))
    }
}

/// A variable referenced by markers in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Stable identifier shared with the markers.
    pub id: String,

    /// The variable kind.
    #[serde(rename = "type")]
    pub variable_type: VariableType,

    /// Display name (file name for file-backed variables).
    pub name: String,

    /// Configured payload, base64 encoded for the encodable kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// MIME type of file-backed data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Variable {
    /// Creates an unconfigured variable named after its type.
    #[must_use]
    pub fn new(id: impl Into<String>, variable_type: VariableType) -> Self {
        Self {
            id: id.into(),
            variable_type,
            name: variable_type.tag().to_string(),
            data: None,
            mime_type: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns true if the variable can be resolved to a real value.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        !self.variable_type.needs_configuration() || self.data.is_some()
    }
}
