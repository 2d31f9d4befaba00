// src/dates.rs
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Human-readable rendering of event dates.
pub trait DateFormatter: Send + Sync {
    /// Full date and time, e.g. "Friday, 1 March 2024 19:00".
    fn format(&self, instant: DateTime<Utc>) -> String;
    /// Time of day only, e.g. "19:00".
    fn hour(&self, instant: DateTime<Utc>) -> String;
}

/// Formats instants in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedDateFormatter {
    tz: Tz,
}

impl ZonedDateFormatter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for ZonedDateFormatter {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Madrid)
    }
}

impl DateFormatter for ZonedDateFormatter {
    fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format("%A, %-d %B %Y %H:%M")
            .to_string()
    }

    fn hour(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format("%H:%M").to_string()
    }
}
