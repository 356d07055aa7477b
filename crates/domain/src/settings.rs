//! Editor Settings Domain Model
//!
//! Defines the user-tunable behaviour of the body editor.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Unit used when resolving `timestamp` variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    /// Whole seconds since the Unix epoch (default).
    #[default]
    Seconds,
    /// Milliseconds since the Unix epoch.
    Milliseconds,
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
        })
    }
}

impl FromStr for TimestampUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "sec" | "seconds" => Ok(Self::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(Self::Milliseconds),
            other => Err(DomainError::UnknownTimestampUnit(other.to_string())),
        }
    }
}

/// Settings for the body editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Quiet period before an auto-format fires, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Text inserted per indentation level (Tab key, Enter, formatter).
    #[serde(default = "default_indent_unit")]
    pub indent_unit: String,

    /// Text substituted for variables that have no data yet.
    #[serde(default = "default_missing_data_placeholder")]
    pub missing_data_placeholder: String,

    /// Unit of resolved timestamps.
    #[serde(default)]
    pub timestamp_unit: TimestampUnit,

    /// Length of resolved random strings.
    #[serde(default = "default_random_string_length")]
    pub random_string_length: usize,

    /// Character sequence that opens the variable picker.
    #[serde(default = "default_trigger")]
    pub trigger: String,
}

impl EditorSettings {
    /// The debounce window as a [`Duration`].
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_indent_unit() -> String {
    "  ".to_string()
}

fn default_missing_data_placeholder() -> String {
    "[no data]".to_string()
}

fn default_random_string_length() -> usize {
    16
}

fn default_trigger() -> String {
    "{{".to_string()
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            indent_unit: default_indent_unit(),
            missing_data_placeholder: default_missing_data_placeholder(),
            timestamp_unit: TimestampUnit::default(),
            random_string_length: default_random_string_length(),
            trigger: default_trigger(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = EditorSettings::default();
        assert_eq!(settings.debounce(), Duration::from_millis(500));
        assert_eq!(settings.indent_unit, "  ");
        assert_eq!(settings.missing_data_placeholder, "[no data]");
        assert_eq!(settings.timestamp_unit, TimestampUnit::Seconds);
        assert_eq!(settings.random_string_length, 16);
        assert_eq!(settings.trigger, "{{");
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: EditorSettings =
            serde_json::from_str(r#"{"debounce_ms": 250, "timestamp_unit": "milliseconds"}"#)
                .unwrap();
        assert_eq!(settings.debounce_ms, 250);
        assert_eq!(settings.timestamp_unit, TimestampUnit::Milliseconds);
        assert_eq!(settings.random_string_length, 16);
    }

    #[test]
    fn timestamp_unit_aliases() {
        assert_eq!("ms".parse::<TimestampUnit>().unwrap(), TimestampUnit::Milliseconds);
        assert_eq!("seconds".parse::<TimestampUnit>().unwrap(), TimestampUnit::Seconds);
        assert!("hours".parse::<TimestampUnit>().is_err());
    }
}
