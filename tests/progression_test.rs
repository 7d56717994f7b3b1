//! End-to-end progression tests across stores, the activity log and config.

use chrono::{Days, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::tempdir;

use streakcap::config::{Config, StoreBackend};
use streakcap::progression::{
    ActivityLog, ActivityNormalizer, ActivitySource, FetchError, GameResult, JsonFileStore,
    ProgressDb, ProgressionService, ProgressionStore, RefreshStatus, RetryPolicy, ShareEvent,
    ShareKind, SqliteStore, StreakTracker,
};
use streakcap::{ActivityType, RawActivityEvent, RewardKind, TokenAmount};

fn day(n: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(n)
}

fn game(accuracy: i64, duration_secs: u64, first_today: bool) -> GameResult {
    GameResult {
        accuracy_pct: Decimal::from(accuracy),
        duration_secs,
        first_today,
    }
}

fn noon(date: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
}

/// Log in on `date` the way the CLI does: record, refresh, claim.
async fn login_on(
    service: &mut ProgressionService<SqliteStore>,
    log: &ActivityLog,
    date: NaiveDate,
) -> streakcap::progression::Outcome {
    log.append(&RawActivityEvent::new(ActivityType::Login, noon(date), "test"))
        .unwrap();
    let mut tracker = StreakTracker::new(ActivityNormalizer::default());
    let fast = RetryPolicy {
        attempts: 1,
        ..Default::default()
    };
    assert!(tracker.refresh(log, fast, date).await.is_fresh());
    service.login(tracker.last_good_streak(), date).unwrap()
}

#[tokio::test]
async fn test_week_of_logins_follows_multiplier_table() {
    let dir = tempdir().unwrap();
    let db = ProgressDb::open(&dir.path().join("progress.db")).unwrap();
    let log = ActivityLog::new(db.clone());
    let mut service =
        ProgressionService::with_defaults(SqliteStore::new(db), Default::default());

    let mut login_amounts = Vec::new();
    for n in 0..8 {
        let out = login_on(&mut service, &log, day(n)).await;
        let login: Vec<_> = out
            .rewards
            .iter()
            .filter(|r| r.kind == RewardKind::Login)
            .map(|r| r.amount.get())
            .collect();
        login_amounts.extend(login);
    }

    assert_eq!(login_amounts, vec![10, 10, 12, 12, 15, 15, 20, 20]);

    let state = service.state(day(7));
    assert_eq!(state.current_login_streak, 8);
    assert_eq!(state.longest_login_streak, 8);
    assert!(state.achievements.is_unlocked("on_fire"));
    assert!(state.achievements.is_unlocked("week_warrior"));
    assert!(!state.achievements.is_unlocked("monthly_master"));
    assert_eq!(state.achievements.achievement_progress["monthly_master"], 8);
}

#[tokio::test]
async fn test_missed_day_resets_login_streak() {
    let dir = tempdir().unwrap();
    let db = ProgressDb::open(&dir.path().join("progress.db")).unwrap();
    let log = ActivityLog::new(db.clone());
    let mut service =
        ProgressionService::with_defaults(SqliteStore::new(db), Default::default());

    for n in 0..4 {
        login_on(&mut service, &log, day(n)).await;
    }
    // day 4 skipped
    let out = login_on(&mut service, &log, day(5)).await;

    assert_eq!(out.state.current_login_streak, 1);
    assert_eq!(out.state.longest_login_streak, 4);
    assert_eq!(out.rewards[0].amount.get(), 10);
}

struct OfflineSource;

#[async_trait::async_trait]
impl ActivitySource for OfflineSource {
    async fn fetch_events(&self) -> Result<Vec<RawActivityEvent>, FetchError> {
        Err(FetchError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_login_with_unreachable_history_keeps_stored_streak() {
    let dir = tempdir().unwrap();
    let db = ProgressDb::open(&dir.path().join("progress.db")).unwrap();
    let log = ActivityLog::new(db.clone());
    let mut service =
        ProgressionService::with_defaults(SqliteStore::new(db), Default::default());

    for n in 0..5 {
        login_on(&mut service, &log, day(n)).await;
    }
    assert_eq!(service.state(day(4)).current_login_streak, 5);

    let mut tracker = StreakTracker::new(ActivityNormalizer::default());
    let fast = RetryPolicy {
        attempts: 2,
        backoff: std::time::Duration::from_millis(1),
    };
    let status = tracker.refresh(&OfflineSource, fast, day(5)).await;
    assert!(matches!(status, RefreshStatus::Unavailable { .. }));

    let out = service.login(tracker.last_good_streak(), day(5)).unwrap();
    assert_eq!(out.state.current_login_streak, 6);
    assert_eq!(out.rewards[0].kind, RewardKind::Login);
    assert_eq!(out.rewards[0].amount.get(), 15);
}

#[test]
fn test_json_store_survives_reopen_and_rolls_over() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.json");

    {
        let mut service =
            ProgressionService::with_defaults(JsonFileStore::new(&path), Default::default());
        service.game_completed(&game(100, 20, true), day(0)).unwrap();
    }

    let store = JsonFileStore::new(&path);
    let same_day = store.load(day(0));
    // 5 + 10 first + 15 perfect + 10 speed, plus first_match and sharp_eye (10 each)
    assert_eq!(same_day.daily_earned.get(), 60);
    assert_eq!(same_day.total_earned.get(), 60);
    assert_eq!(same_day.total_perfect_games, 1);

    // Unmodified save/load is a no-op
    store.save(&same_day).unwrap();
    assert_eq!(store.load(day(0)), same_day);

    let next_day = store.load(day(1));
    assert_eq!(next_day.daily_earned, TokenAmount::ZERO);
    assert_eq!(next_day.total_earned.get(), 60);
    assert_eq!(next_day.last_reset_date, Some(day(1)));
}

#[test]
fn test_daily_cap_is_exact_across_sources() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("progress.db")).unwrap();
    let config = streakcap::config::RewardConfig {
        daily_cap: TokenAmount::new(100),
        ..Default::default()
    };
    let mut service = ProgressionService::with_defaults(store, config);

    let mut granted = TokenAmount::ZERO;
    let mut capped_events = 0;
    for i in 0..10 {
        let out = service.game_completed(&game(100, 10, i == 0), day(3)).unwrap();
        granted = granted.saturating_add(out.granted());
        capped_events += out.rewards.iter().filter(|r| r.was_capped()).count();

        let share = ShareEvent {
            kind: ShareKind::Referral,
            virality_score: Decimal::new(35, 1),
        };
        let out = service.shared(&share, day(3)).unwrap();
        granted = granted.saturating_add(out.granted());
    }

    assert_eq!(granted.get(), 100);
    assert!(capped_events > 0);

    let state = service.state(day(3));
    assert_eq!(state.daily_earned.get(), 100);
    assert_eq!(state.total_earned.get(), 100);
    // statistics keep counting after the cap
    assert_eq!(state.games_completed, 10);
    assert_eq!(state.referrals_completed, 10);
    assert_eq!(state.virality_score, Decimal::new(350, 1));
    assert!(state.achievements.is_unlocked("recruiter"));
}

#[test]
fn test_config_file_drives_service() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
[rewards]
daily_cap = "250"
game_completion = "7"

[store]
backend = "sqlite"

[[achievements]]
id = "warmup"
name = "Warm-up"
category = "gameplay"
tier = "silver"
metric = "games_completed"
target = 2
"#,
    )
    .unwrap();

    let config = Config::load_from(&config_path).unwrap();
    assert_eq!(config.store.backend, StoreBackend::Sqlite);

    let store = SqliteStore::open(&config.store.progress_path(dir.path())).unwrap();
    let mut service =
        ProgressionService::new(store, config.rewards.clone(), config.registry().unwrap());

    let first = service.game_completed(&game(50, 300, false), day(0)).unwrap();
    assert_eq!(first.granted().get(), 7);
    assert!(first.unlocked.is_empty());

    let second = service.game_completed(&game(50, 300, false), day(0)).unwrap();
    assert_eq!(second.unlocked.len(), 1);
    assert_eq!(second.unlocked[0].id, "warmup");
    // 7 + silver tier 25
    assert_eq!(second.granted().get(), 32);
}
