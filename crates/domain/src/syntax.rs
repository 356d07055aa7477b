//! Body syntax and validity status types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The syntax the editor validates and formats the body as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BodySyntax {
    /// JSON body.
    #[default]
    Json,
    /// XML body.
    Xml,
    /// Free text, never validated or formatted.
    Text,
}

impl BodySyntax {
    /// Returns true if the line after `line` should be indented one more unit.
    ///
    /// `line` is the full line with trailing whitespace removed.
    #[must_use]
    pub fn opens_block(self, line: &str) -> bool {
        match self {
            Self::Json => line.ends_with('{') || line.ends_with('['),
            Self::Xml => xml_line_opens_element(line),
            Self::Text => false,
        }
    }
}

/// True when the line ends with the `>` of an opening tag, as opposed to a
/// closing tag, an empty-element tag, a comment or a processing instruction.
fn xml_line_opens_element(line: &str) -> bool {
    if !line.ends_with('>') || line.ends_with("/>") || line.ends_with("?>") || line.ends_with("-->")
    {
        return false;
    }
    let Some(tag_start) = line.rfind('<') else {
        return false;
    };
    let tag = &line[tag_start..];
    !(tag.starts_with("</") || tag.starts_with("<!"))
}

impl fmt::Display for BodySyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Text => "text",
        })
    }
}

impl FromStr for BodySyntax {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "text" | "plain" => Ok(Self::Text),
            other => Err(DomainError::UnknownSyntax(other.to_string())),
        }
    }
}

/// Whether the document currently parses for its syntax.
///
/// Invalidity is a displayed status, never an error: editing is not blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyntaxStatus {
    /// The document parses.
    #[default]
    Valid,
    /// The document does not parse.
    Invalid {
        /// Human-readable parser message.
        message: String,
    },
}

impl SyntaxStatus {
    /// Creates an invalid status.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Returns true for [`SyntaxStatus::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The parser message, if invalid.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message } => Some(message),
        }
    }
}
