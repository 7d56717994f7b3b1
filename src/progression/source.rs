//! Activity sources and the cached streak snapshot
//!
//! Fetching raw evidence is the only async, fallible step. It is retried on its
//! own and never sits on the reward path: a failed refresh leaves the last good
//! snapshot in place.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::normalizer::ActivityNormalizer;
use super::store::ProgressDb;
use super::streaks::{self, StreakState};
use crate::domain::{ActivityRecord, ActivityType, RawActivityEvent, RawTimestamp};

/// Why evidence could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("activity source unavailable: {0}")]
    Unavailable(String),

    #[error("activity source returned bad data: {0}")]
    Malformed(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Upstream provider of raw activity evidence
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<RawActivityEvent>, FetchError>;
}

/// Retry settings for fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay after the first failure; grows linearly per attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Fetch with retries. Malformed responses are not retried.
pub async fn fetch_with_retry(
    source: &dyn ActivitySource,
    policy: RetryPolicy,
) -> Result<Vec<RawActivityEvent>, FetchError> {
    let attempts = policy.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match source.fetch_events().await {
            Ok(events) => return Ok(events),
            Err(FetchError::Malformed(msg)) => return Err(FetchError::Malformed(msg)),
            Err(e) => {
                tracing::warn!(attempt, attempts, "Activity fetch failed: {}", e);
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff * attempt).await;
                }
            }
        }
    }

    Err(FetchError::Exhausted {
        attempts,
        last: last_error,
    })
}

/// Normalized records and the streak computed from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub records: Vec<ActivityRecord>,
    pub streak: StreakState,
    pub skipped: usize,
    pub computed_for: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

/// Result of a refresh attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// New snapshot computed
    Fresh,
    /// Fetch failed; the previous snapshot is still served
    Stale { error: FetchError },
    /// Fetch failed and there has never been a snapshot
    Unavailable { error: FetchError },
}

impl RefreshStatus {
    pub fn is_fresh(&self) -> bool {
        matches!(self, RefreshStatus::Fresh)
    }
}

/// Holds the last good activity snapshot
#[derive(Debug, Clone)]
pub struct StreakTracker {
    normalizer: ActivityNormalizer,
    snapshot: Option<ActivitySnapshot>,
}

impl StreakTracker {
    pub fn new(normalizer: ActivityNormalizer) -> Self {
        Self {
            normalizer,
            snapshot: None,
        }
    }

    pub async fn refresh(
        &mut self,
        source: &dyn ActivitySource,
        policy: RetryPolicy,
        today: NaiveDate,
    ) -> RefreshStatus {
        match fetch_with_retry(source, policy).await {
            Ok(events) => {
                self.apply_events(&events, today);
                RefreshStatus::Fresh
            }
            Err(error) if self.snapshot.is_some() => {
                tracing::warn!("Serving stale streak: {}", error);
                RefreshStatus::Stale { error }
            }
            Err(error) => RefreshStatus::Unavailable { error },
        }
    }

    /// Recompute the snapshot from already-fetched events.
    pub fn apply_events(&mut self, events: &[RawActivityEvent], today: NaiveDate) {
        let report = self.normalizer.normalize(events);
        let dates = streaks::activity_dates(&report.records);
        let streak = streaks::compute(&dates, today);

        tracing::debug!(
            current = streak.current_streak,
            longest = streak.longest_streak,
            active_days = streak.total_active_days,
            "Streak recomputed"
        );

        self.snapshot = Some(ActivitySnapshot {
            records: report.records,
            streak,
            skipped: report.skipped,
            computed_for: today,
            fetched_at: Utc::now(),
        });
    }

    pub fn snapshot(&self) -> Option<&ActivitySnapshot> {
        self.snapshot.as_ref()
    }

    /// Streak of the last successful refresh, if there ever was one
    pub fn last_good_streak(&self) -> Option<&StreakState> {
        self.snapshot.as_ref().map(|s| &s.streak)
    }

    /// Last known streak, or the zero state if nothing was fetched yet
    pub fn streak(&self) -> StreakState {
        self.snapshot
            .as_ref()
            .map(|s| s.streak.clone())
            .unwrap_or_default()
    }

    /// Whether any normalized record of `activity_type` falls on `day`
    pub fn has_activity_on(&self, activity_type: ActivityType, day: NaiveDate) -> bool {
        self.snapshot.as_ref().is_some_and(|s| {
            s.records
                .iter()
                .any(|r| r.activity_type == activity_type && r.calendar_date == day)
        })
    }
}

/// Local activity log stored in the progress database
#[derive(Clone)]
pub struct ActivityLog {
    db: ProgressDb,
}

impl ActivityLog {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    /// Append one raw event
    pub fn append(&self, event: &RawActivityEvent) -> anyhow::Result<()> {
        let (millis, text) = match &event.timestamp {
            Some(RawTimestamp::Millis(ms)) => (Some(*ms), None),
            Some(RawTimestamp::Text(t)) => (None, Some(t.clone())),
            None => (None, None),
        };

        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO activity_log (kind, timestamp_ms, timestamp_text, source_ref, recorded_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            rusqlite::params![
                event.kind,
                millis,
                text,
                event.source_ref,
                Utc::now().timestamp_millis(),
            ],
        )
        .context("Failed to append activity")?;
        Ok(())
    }

    /// Read every stored event in insertion order
    pub fn read_all(&self) -> anyhow::Result<Vec<RawActivityEvent>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT kind, timestamp_ms, timestamp_text, source_ref FROM activity_log ORDER BY id",
        )?;
        let events = stmt
            .query_map([], |r| {
                let millis: Option<i64> = r.get(1)?;
                let text: Option<String> = r.get(2)?;
                Ok(RawActivityEvent {
                    kind: r.get(0)?,
                    timestamp: millis
                        .map(RawTimestamp::Millis)
                        .or(text.map(RawTimestamp::Text)),
                    source_ref: r.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }
}

#[async_trait]
impl ActivitySource for ActivityLog {
    async fn fetch_events(&self) -> Result<Vec<RawActivityEvent>, FetchError> {
        self.read_all()
            .map_err(|e| FetchError::Unavailable(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails the first `failures` calls, then returns `events`
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
        events: Vec<RawActivityEvent>,
    }

    #[async_trait]
    impl ActivitySource for FlakySource {
        async fn fetch_events(&self) -> Result<Vec<RawActivityEvent>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(FetchError::Unavailable("rpc timeout".to_string()))
            } else {
                Ok(self.events.clone())
            }
        }
    }

    struct ScriptedSource {
        responses: Mutex<Vec<Result<Vec<RawActivityEvent>, FetchError>>>,
    }

    #[async_trait]
    impl ActivitySource for ScriptedSource {
        async fn fetch_events(&self) -> Result<Vec<RawActivityEvent>, FetchError> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn login_on(day: u32) -> RawActivityEvent {
        RawActivityEvent {
            kind: "login".to_string(),
            timestamp: Some(RawTimestamp::Text(format!("2024-06-{:02}T12:00:00Z", day))),
            source_ref: format!("tx-{}", day),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let source = FlakySource {
            failures: 2,
            calls: AtomicU32::new(0),
            events: vec![login_on(15)],
        };
        let events = fetch_with_retry(&source, fast()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let source = FlakySource {
            failures: 10,
            calls: AtomicU32::new(0),
            events: vec![],
        };
        let err = fetch_with_retry(&source, fast()).await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_streak() {
        let source = ScriptedSource {
            responses: Mutex::new(vec![
                Ok(vec![login_on(13), login_on(14), login_on(15)]),
                Err(FetchError::Malformed("truncated body".to_string())),
            ]),
        };
        let mut tracker = StreakTracker::new(ActivityNormalizer::default());

        assert!(tracker.refresh(&source, fast(), today()).await.is_fresh());
        assert_eq!(tracker.streak().current_streak, 3);

        let status = tracker.refresh(&source, fast(), today()).await;
        assert!(matches!(status, RefreshStatus::Stale { .. }));
        assert_eq!(tracker.streak().current_streak, 3);
    }

    #[tokio::test]
    async fn test_refresh_without_snapshot_is_unavailable() {
        let source = FlakySource {
            failures: 10,
            calls: AtomicU32::new(0),
            events: vec![],
        };
        let mut tracker = StreakTracker::new(ActivityNormalizer::default());
        let status = tracker.refresh(&source, fast(), today()).await;
        assert!(matches!(status, RefreshStatus::Unavailable { .. }));
        assert_eq!(tracker.streak(), StreakState::default());
        assert!(tracker.last_good_streak().is_none());
    }

    #[tokio::test]
    async fn test_activity_log_source() {
        let log = ActivityLog::new(ProgressDb::open_in_memory().unwrap());
        log.append(&login_on(14)).unwrap();
        log.append(&RawActivityEvent::new(
            ActivityType::GameCompleted,
            DateTime::parse_from_rfc3339("2024-06-15T08:00:00Z").unwrap().with_timezone(&Utc),
            "game-1",
        ))
        .unwrap();

        let events = log.fetch_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], login_on(14));

        let mut tracker = StreakTracker::new(ActivityNormalizer::default());
        tracker.apply_events(&events, today());
        assert_eq!(tracker.streak().current_streak, 2);
        assert!(tracker.has_activity_on(ActivityType::GameCompleted, today()));
        assert!(!tracker.has_activity_on(ActivityType::Login, today()));
    }
}
