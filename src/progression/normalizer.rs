//! Activity normalization
//!
//! Turns raw, possibly out-of-order and duplicated source events into one
//! [`ActivityRecord`] per `(activity type, calendar date)`.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use super::calendar::calendar_date;
use crate::domain::{ActivityRecord, ActivityType, RawActivityEvent, RawTimestamp};

/// Why a raw event could not be normalized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("unknown activity kind: {0:?}")]
    UnknownKind(String),

    #[error("event has no timestamp")]
    MissingTimestamp,

    #[error("unparseable timestamp: {0}")]
    BadTimestamp(String),
}

/// Result of a normalization pass
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    /// Distinct records sorted by date, then activity type
    pub records: Vec<ActivityRecord>,
    /// Number of raw events that were dropped as malformed
    pub skipped: usize,
}

/// Converts raw events into calendar-day activity records
#[derive(Debug, Clone, Copy)]
pub struct ActivityNormalizer {
    offset: FixedOffset,
}

impl ActivityNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Normalize a single event.
    pub fn normalize_event(&self, event: &RawActivityEvent) -> Result<ActivityRecord, NormalizeError> {
        let activity_type = ActivityType::from_str(&event.kind)
            .ok_or_else(|| NormalizeError::UnknownKind(event.kind.clone()))?;
        let timestamp = parse_timestamp(event.timestamp.as_ref())?;

        Ok(ActivityRecord {
            activity_type,
            calendar_date: calendar_date(timestamp, self.offset),
            timestamp,
            source_ref: event.source_ref.clone(),
        })
    }

    /// Normalize a batch of events.
    ///
    /// Malformed events are skipped with a warning; duplicates on the same
    /// day keep the earliest timestamp.
    pub fn normalize(&self, events: &[RawActivityEvent]) -> NormalizeReport {
        let mut by_key: BTreeMap<(NaiveDate, ActivityType), ActivityRecord> = BTreeMap::new();
        let mut skipped = 0;

        for event in events {
            let record = match self.normalize_event(event) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(source_ref = %event.source_ref, "Skipping activity event: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            let key = (record.calendar_date, record.activity_type);
            match by_key.get(&key) {
                Some(existing) if existing.timestamp <= record.timestamp => {}
                _ => {
                    by_key.insert(key, record);
                }
            }
        }

        tracing::debug!(
            input = events.len(),
            records = by_key.len(),
            skipped,
            "Normalized activity events"
        );

        NormalizeReport {
            records: by_key.into_values().collect(),
            skipped,
        }
    }
}

impl Default for ActivityNormalizer {
    fn default() -> Self {
        Self::new(super::calendar::offset_from_minutes(0))
    }
}

fn parse_timestamp(raw: Option<&RawTimestamp>) -> Result<DateTime<Utc>, NormalizeError> {
    match raw {
        None => Err(NormalizeError::MissingTimestamp),
        Some(RawTimestamp::Millis(ms)) => DateTime::from_timestamp_millis(*ms)
            .ok_or_else(|| NormalizeError::BadTimestamp(ms.to_string())),
        Some(RawTimestamp::Text(text)) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| NormalizeError::BadTimestamp(text.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::calendar::offset_from_minutes;

    fn event(kind: &str, ts: Option<RawTimestamp>, source: &str) -> RawActivityEvent {
        RawActivityEvent {
            kind: kind.to_string(),
            timestamp: ts,
            source_ref: source.to_string(),
        }
    }

    fn text(s: &str) -> Option<RawTimestamp> {
        Some(RawTimestamp::Text(s.to_string()))
    }

    #[test]
    fn test_dedup_keeps_earliest() {
        let normalizer = ActivityNormalizer::default();
        let events = vec![
            event("game_completed", text("2024-05-01T18:00:00Z"), "late"),
            event("game_completed", text("2024-05-01T08:00:00Z"), "early"),
            event("login", text("2024-05-01T07:00:00Z"), "login"),
        ];

        let report = normalizer.normalize(&events);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.records.len(), 2);

        let game = report
            .records
            .iter()
            .find(|r| r.activity_type == ActivityType::GameCompleted)
            .unwrap();
        assert_eq!(game.source_ref, "early");
    }

    #[test]
    fn test_out_of_order_input_is_sorted() {
        let normalizer = ActivityNormalizer::default();
        let events = vec![
            event("login", text("2024-05-03T10:00:00Z"), "c"),
            event("login", text("2024-05-01T10:00:00Z"), "a"),
            event("login", Some(RawTimestamp::Millis(1714644000000)), "b"), // 2024-05-02 10:00 UTC
        ];

        let report = normalizer.normalize(&events);
        let refs: Vec<_> = report.records.iter().map(|r| r.source_ref.as_str()).collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_malformed_events_skipped() {
        let normalizer = ActivityNormalizer::default();
        let events = vec![
            event("login", text("2024-05-01T10:00:00Z"), "ok"),
            event("teleport", text("2024-05-01T10:00:00Z"), "bad-kind"),
            event("login", None, "no-ts"),
            event("login", text("last tuesday"), "bad-ts"),
            event("share", text("2024-05-02T10:00:00+02:00"), "ok-2"),
        ];

        let report = normalizer.normalize(&events);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.records.len(), 2);
    }

    #[test]
    fn test_offset_applies_to_calendar_date() {
        let normalizer = ActivityNormalizer::new(offset_from_minutes(120));
        let record = normalizer
            .normalize_event(&event("login", text("2024-05-01T23:00:00Z"), "x"))
            .unwrap();
        assert_eq!(record.calendar_date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
    }

    #[test]
    fn test_normalize_event_errors() {
        let normalizer = ActivityNormalizer::default();
        assert_eq!(
            normalizer.normalize_event(&event("nope", None, "")),
            Err(NormalizeError::UnknownKind("nope".to_string()))
        );
        assert_eq!(
            normalizer.normalize_event(&event("login", None, "")),
            Err(NormalizeError::MissingTimestamp)
        );
    }
}
