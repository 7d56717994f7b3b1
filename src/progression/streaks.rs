//! Streak calculation
//!
//! Computes current/longest consecutive-day streaks from a set of active
//! calendar dates. The state is always recomputed from the full date set,
//! never incremented.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::parse_day_key;
use crate::domain::ActivityRecord;

/// Streak statistics for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    /// Consecutive active days ending today or yesterday
    pub current_streak: u32,
    /// Longest run of consecutive active days ever
    pub longest_streak: u32,
    /// Distinct active days
    pub total_active_days: u32,
    pub first_active_date: Option<NaiveDate>,
    pub last_active_date: Option<NaiveDate>,
}

impl StreakState {
    /// Whether the current streak is still alive
    pub fn is_active(&self) -> bool {
        self.current_streak > 0
    }
}

/// Distinct calendar dates with any activity.
pub fn activity_dates(records: &[ActivityRecord]) -> BTreeSet<NaiveDate> {
    records.iter().map(|r| r.calendar_date).collect()
}

/// Compute streak statistics relative to `today`.
pub fn compute(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> StreakState {
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return StreakState::default();
    };

    // Longest run over the ascending set
    let mut longest = 1u32;
    let mut run = 1u32;
    let mut prev: Option<NaiveDate> = None;
    for &date in dates {
        if let Some(p) = prev {
            if p.succ_opt() == Some(date) {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 1;
            }
        }
        prev = Some(date);
    }

    StreakState {
        current_streak: current_streak(dates, today),
        longest_streak: longest,
        total_active_days: dates.len() as u32,
        first_active_date: Some(*first),
        last_active_date: Some(*last),
    }
}

/// Compute streaks from "YYYY-MM-DD" strings, skipping malformed entries.
pub fn compute_from_strings<S: AsRef<str>>(days: &[S], today: NaiveDate) -> StreakState {
    let dates: BTreeSet<NaiveDate> = days
        .iter()
        .filter_map(|day| {
            let parsed = parse_day_key(day.as_ref());
            if parsed.is_none() {
                tracing::warn!("Skipping malformed activity date: {:?}", day.as_ref());
            }
            parsed
        })
        .collect();
    compute(&dates, today)
}

/// Walk backward from today (or yesterday) while days are present.
fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today.checked_sub_days(Days::new(1));
    let anchor = if dates.contains(&today) {
        Some(today)
    } else {
        yesterday.filter(|d| dates.contains(d))
    };

    let Some(mut day) = anchor else {
        return 0;
    };

    let mut count = 0u32;
    while dates.contains(&day) {
        count += 1;
        match day.pred_opt() {
            Some(p) => day = p,
            None => break,
        }
    }
    count
}
