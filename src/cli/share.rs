//! Share command implementation

use anyhow::{Result, anyhow};
use rust_decimal::Decimal;

use streakcap::progression::{ShareEvent, ShareKind};
use streakcap::ActivityType;

use super::{print_outcome, AppContext};

/// Record a share and grant its reward
pub fn share_command(ctx: &AppContext, kind: &str, virality: Decimal) -> Result<()> {
    let kind = ShareKind::from_str(kind).ok_or_else(|| {
        anyhow!(
            "Unknown share kind: {} (expected referral, game_result, achievement or collectible)",
            kind
        )
    })?;

    let log = ctx.activity_log()?;
    ctx.record_activity(&log, ActivityType::SocialShare, kind.as_str())?;

    let share = ShareEvent {
        kind,
        virality_score: virality,
    };
    let mut service = ctx.service()?;
    let outcome = service.shared(&share, ctx.today())?;

    print_outcome(&outcome, ctx.config.rewards.daily_cap);
    Ok(())
}
