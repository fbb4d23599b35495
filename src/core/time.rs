//! Wall-clock helpers for hour-of-day and calendar-day bucketing.
//!
//! Buckets are evaluated in the wearer's timezone, which is passed in
//! explicitly rather than taken from the host running the analysis.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A half-open range of local hours, `[start, end)`.
///
/// When `start > end` the range wraps midnight, so `22..6` matches
/// `hour >= 22 || hour < 6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Check whether a local hour (0-23) falls inside this range.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start > self.end {
            hour >= self.start || hour < self.end
        } else {
            hour >= self.start && hour < self.end
        }
    }

    /// Check whether a timestamp falls inside this range in the given timezone.
    pub fn contains_time(&self, timestamp: DateTime<Utc>, tz: Tz) -> bool {
        self.contains(local_hour(timestamp, tz))
    }
}

/// Local hour of day (0-23).
pub fn local_hour(timestamp: DateTime<Utc>, tz: Tz) -> u32 {
    timestamp.with_timezone(&tz).hour()
}

/// Local calendar date.
pub fn local_date(timestamp: DateTime<Utc>, tz: Tz) -> NaiveDate {
    timestamp.with_timezone(&tz).date_naive()
}

/// Convert a configured interval into a signed chrono duration.
pub fn to_delta(duration: std::time::Duration) -> Duration {
    Duration::milliseconds(duration.as_millis().min(i64::MAX as u128) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_plain_range() {
        let range = HourRange::new(16, 18);
        assert!(!range.contains(15));
        assert!(range.contains(16));
        assert!(range.contains(17));
        assert!(!range.contains(18));
    }

    #[test]
    fn test_wrapping_range() {
        let range = HourRange::new(22, 6);
        assert!(range.contains(22));
        assert!(range.contains(23));
        assert!(range.contains(0));
        assert!(range.contains(5));
        assert!(!range.contains(6));
        assert!(!range.contains(21));
        assert!(!range.contains(12));
    }

    #[test]
    fn test_hour_uses_wearer_timezone() {
        // 23:30 UTC is 06:30 the next day in Jakarta.
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(local_hour(ts, Tz::UTC), 23);
        assert_eq!(local_hour(ts, chrono_tz::Asia::Jakarta), 6);
        assert_eq!(
            local_date(ts, chrono_tz::Asia::Jakarta),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }
}
