//! Generated values for the variable kinds that need no configuration.
//!
//! These produce a new value on every resolution.

use chrono::{DateTime, Utc};
use courier_domain::TimestampUnit;
use rand::Rng;
use uuid::Uuid;

/// Characters used by random strings.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates values for `uuid`, `random-string` and `timestamp` variables.
pub struct GeneratedValues;

impl GeneratedValues {
    /// Generates a random UUID v4.
    #[must_use]
    pub fn uuid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Generates a random alphanumeric string of the given length.
    #[must_use]
    pub fn random_string(len: usize) -> String {
        let mut rng = rand::rng();
        (0..len)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                char::from(CHARSET[idx])
            })
            .collect()
    }

    /// Unix time of `now` in the given unit.
    #[must_use]
    pub fn timestamp(now: DateTime<Utc>, unit: TimestampUnit) -> String {
        match unit {
            TimestampUnit::Seconds => now.timestamp().to_string(),
            TimestampUnit::Milliseconds => now.timestamp_millis().to_string(),
        }
    }
}
