//! Game command implementation

use anyhow::{bail, Result};
use rust_decimal::Decimal;

use streakcap::progression::GameResult;
use streakcap::ActivityType;

use super::{print_outcome, AppContext};

/// Record a completed game and grant its rewards
pub async fn game_command(ctx: &AppContext, accuracy: Decimal, duration_secs: u64) -> Result<()> {
    if accuracy < Decimal::ZERO || accuracy > Decimal::ONE_HUNDRED {
        bail!("Accuracy must be between 0 and 100, got {}", accuracy);
    }

    let today = ctx.today();
    let log = ctx.activity_log()?;

    // Checked before recording, so this game is not its own predecessor
    let tracker = ctx.refreshed_tracker(&log).await;
    let first_today = !tracker.has_activity_on(ActivityType::GameCompleted, today);

    ctx.record_activity(&log, ActivityType::GameCompleted, "cli-game")?;

    let game = GameResult {
        accuracy_pct: accuracy,
        duration_secs,
        first_today,
    };
    let mut service = ctx.service()?;
    let outcome = service.game_completed(&game, today)?;

    print_outcome(&outcome, ctx.config.rewards.daily_cap);
    Ok(())
}
