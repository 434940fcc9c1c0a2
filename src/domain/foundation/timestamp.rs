//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the UTC calendar date this timestamp falls on.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Returns a timestamp for the start of today (00:00:00 UTC).
    pub fn start_of_today() -> Self {
        Self::start_of(Utc::now().date_naive())
    }

    /// Returns the first instant of the given UTC date.
    pub fn start_of(day: NaiveDate) -> Self {
        Self(day.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from_datetime(
            DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn date_uses_utc_calendar_day() {
        let ts = at("2024-01-15T23:59:59Z");
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let next = at("2024-01-16T00:00:00Z");
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn start_of_is_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let ts = Timestamp::start_of(day);
        assert_eq!(ts.as_datetime().hour(), 0);
        assert_eq!(ts.as_datetime().minute(), 0);
        assert_eq!(ts.date(), day);
    }

    #[test]
    fn add_days_crosses_month_boundary() {
        let ts = at("2024-01-31T10:00:00Z").add_days(1);
        assert_eq!(ts.as_datetime().month(), 2);
        assert_eq!(ts.as_datetime().day(), 1);
    }

    #[test]
    fn timestamp_roundtrips_through_json() {
        let ts = at("2024-01-15T10:30:00Z");
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-15"));
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn ordering_follows_time() {
        let early = at("2024-01-15T10:30:00Z");
        let late = at("2024-01-15T10:31:00Z");
        assert!(early.is_before(&late));
        assert!(early < late);
    }
}
