//! Debounce timer for auto-formatting.

use chrono::{DateTime, Utc};

/// A single pending deadline.
///
/// The timer never fires on its own; the owner polls it with the current
/// time or sleeps until [`deadline`](Self::deadline).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatTimer {
    deadline: Option<DateTime<Utc>>,
}

impl FormatTimer {
    /// Creates an idle timer.
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Sets the deadline, replacing any pending one.
    pub const fn schedule(&mut self, deadline: DateTime<Utc>) {
        self.deadline = Some(deadline);
    }

    /// Clears the pending deadline.
    pub const fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true if a deadline is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns true if a deadline is pending and has passed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Clears the deadline and returns true if it was due.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_due_only_after_deadline() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut timer = FormatTimer::new();
        assert!(!timer.is_due(start));

        timer.schedule(start + TimeDelta::milliseconds(500));
        assert!(timer.is_pending());
        assert!(!timer.is_due(start + TimeDelta::milliseconds(499)));
        assert!(timer.take_due(start + TimeDelta::milliseconds(500)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_reschedule_and_cancel() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut timer = FormatTimer::new();
        timer.schedule(start);
        timer.schedule(start + TimeDelta::seconds(1));
        assert!(!timer.take_due(start));

        timer.cancel();
        assert!(!timer.is_due(start + TimeDelta::seconds(5)));
    }
}
