//! Status command implementation

use anyhow::Result;

use super::AppContext;

/// Show earnings, statistics and achievement progress
pub fn status_command(ctx: &AppContext, json: bool) -> Result<()> {
    let service = ctx.service()?;
    let state = service.state(ctx.today());

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("Earnings:");
    println!(
        "  Today: {} / {}",
        state.daily_earned,
        service.config().daily_cap
    );
    println!("  Total: {}", state.total_earned);
    println!();

    println!("Statistics:");
    println!(
        "  Login streak: {} (longest {})",
        state.current_login_streak, state.longest_login_streak
    );
    println!("  Active days: {}", state.total_active_days);
    println!(
        "  Games: {} ({} perfect, current perfect run {})",
        state.games_completed, state.total_perfect_games, state.perfect_game_streak
    );
    println!(
        "  Shares: {} ({} referrals, virality {})",
        state.total_shares, state.referrals_completed, state.virality_score
    );
    println!();

    let registry = service.registry();
    println!(
        "Achievements ({}/{}):",
        state.achievements.unlocked_ids.len(),
        registry.len()
    );
    for def in registry.iter() {
        let progress = state
            .achievements
            .achievement_progress
            .get(&def.id)
            .copied()
            .unwrap_or(0);
        let marker = if state.achievements.is_unlocked(&def.id) { "x" } else { " " };
        println!(
            "  [{}] {:<16} {:<9} {}/{}",
            marker,
            def.name,
            def.tier.as_str(),
            progress.min(def.target),
            def.target
        );
    }

    Ok(())
}
