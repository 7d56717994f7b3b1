//! Calendar-day utilities
//!
//! All streak and reset logic works on calendar dates in a fixed UTC offset.
//! - Day keys: "YYYY-MM-DD"

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Build a fixed offset from minutes east of UTC, falling back to UTC when
/// the value is out of range.
pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(utc)
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is valid")
}

/// Calendar date of an instant in the given offset.
pub fn calendar_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// Calendar date of a Unix timestamp in milliseconds, if it is representable.
pub fn date_from_millis(timestamp_ms: i64, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|dt| calendar_date(dt, offset))
}

/// Today's date in the given offset.
pub fn today(offset: FixedOffset) -> NaiveDate {
    calendar_date(Utc::now(), offset)
}

/// Format a date as a day key ("YYYY-MM-DD").
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Parse a day key back to a date.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DAY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 28).unwrap();
        assert_eq!(day_key(date), "2023-12-28");
        assert_eq!(parse_day_key("2023-12-28"), Some(date));
        assert_eq!(parse_day_key("2023-13-01"), None);
        assert_eq!(parse_day_key("yesterday"), None);
    }

    #[test]
    fn test_offset_moves_date() {
        // 2023-12-28 23:30 UTC
        let ts = 1703806200000;
        assert_eq!(
            date_from_millis(ts, offset_from_minutes(0)),
            NaiveDate::from_ymd_opt(2023, 12, 28)
        );
        assert_eq!(
            date_from_millis(ts, offset_from_minutes(60)),
            NaiveDate::from_ymd_opt(2023, 12, 29)
        );
        assert_eq!(
            date_from_millis(ts, offset_from_minutes(-300)),
            NaiveDate::from_ymd_opt(2023, 12, 28)
        );
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        assert_eq!(offset_from_minutes(100_000).local_minus_utc(), 0);
    }
}
