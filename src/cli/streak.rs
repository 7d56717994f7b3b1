//! Streak command implementation

use anyhow::Result;

use super::AppContext;

/// Recompute and show the activity streak
pub async fn streak_command(ctx: &AppContext, json: bool) -> Result<()> {
    let log = ctx.activity_log()?;
    let tracker = ctx.refreshed_tracker(&log).await;
    let streak = tracker.streak();

    if json {
        println!("{}", serde_json::to_string_pretty(&streak)?);
        return Ok(());
    }

    println!("Current streak: {} day(s)", streak.current_streak);
    println!("Longest streak: {} day(s)", streak.longest_streak);
    println!("Active days:    {}", streak.total_active_days);
    if let Some(last) = streak.last_active_date {
        println!("Last active:    {}", last);
    }
    if let Some(snapshot) = tracker.snapshot() {
        if snapshot.skipped > 0 {
            println!("Skipped {} malformed event(s)", snapshot.skipped);
        }
    }
    Ok(())
}
