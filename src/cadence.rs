// src/cadence.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// The three digest triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cadence {
    Weekly,
    Daily,
    /// Imminent-start alert.
    Upcoming,
}

impl Cadence {
    pub fn as_str(self) -> &'static str {
        match self {
            Cadence::Weekly => "weekly",
            Cadence::Daily => "daily",
            Cadence::Upcoming => "upcoming",
        }
    }

    /// Half-open `[start, end)` range of event dates this cadence reports on.
    /// - weekly: the next 7 days
    /// - daily: until the next local midnight in `tz`
    /// - upcoming: the next `upcoming` span
    pub fn window(
        self,
        now: DateTime<Utc>,
        tz: Tz,
        upcoming: Duration,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = match self {
            Cadence::Weekly => now + Duration::days(7),
            Cadence::Daily => next_local_midnight(now, tz),
            Cadence::Upcoming => now + upcoming,
        };
        (now, end)
    }
}

fn next_local_midnight(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    now.with_timezone(&tz)
        .date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| now + Duration::days(1))
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weekly" => Ok(Cadence::Weekly),
            "daily" => Ok(Cadence::Daily),
            "upcoming" => Ok(Cadence::Upcoming),
            other => Err(format!("unknown cadence: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_ends_at_next_local_midnight() {
        // 19:00 in Madrid (CET, UTC+1)
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        let (start, end) = Cadence::Daily.window(now, chrono_tz::Europe::Madrid, Duration::hours(1));
        assert_eq!(start, now);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap());
    }

    #[test]
    fn weekly_and_upcoming_spans() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
        let tz = chrono_tz::UTC;
        assert_eq!(
            Cadence::Weekly.window(now, tz, Duration::hours(1)).1,
            now + Duration::days(7)
        );
        assert_eq!(
            Cadence::Upcoming.window(now, tz, Duration::minutes(45)).1,
            now + Duration::minutes(45)
        );
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Weekly".parse::<Cadence>().unwrap(), Cadence::Weekly);
        assert_eq!("UPCOMING".parse::<Cadence>().unwrap(), Cadence::Upcoming);
        assert!("monthly".parse::<Cadence>().is_err());
    }
}
