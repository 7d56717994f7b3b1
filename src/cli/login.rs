//! Login command implementation

use anyhow::Result;

use streakcap::ActivityType;

use super::{print_outcome, AppContext};

/// Record a login and claim the daily login reward
pub async fn login_command(ctx: &AppContext) -> Result<()> {
    let today = ctx.today();
    let log = ctx.activity_log()?;
    ctx.record_activity(&log, ActivityType::Login, "cli-login")?;

    // Without any fetched history the stored login streak is carried forward
    let tracker = ctx.refreshed_tracker(&log).await;

    let mut service = ctx.service()?;
    let outcome = service.login(tracker.last_good_streak(), today)?;

    println!("Login streak: {} day(s)", outcome.state.current_login_streak);
    print_outcome(&outcome, ctx.config.rewards.daily_cap);
    Ok(())
}
