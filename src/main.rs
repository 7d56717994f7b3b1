use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "streakcap")]
#[command(about = "Activity streaks and daily-capped rewards")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.streakcap/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding progression data (defaults to ~/.streakcap)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Record today's login and claim the daily login reward
    Login,

    /// Record a completed game
    Game {
        /// Accuracy in percent (100 is a perfect game)
        #[arg(long)]
        accuracy: Decimal,

        /// Game duration in seconds
        #[arg(long)]
        duration: u64,
    },

    /// Record a social share
    Share {
        /// referral, game_result, achievement or collectible
        kind: String,

        /// Virality score of the share
        #[arg(long, default_value = "0")]
        virality: Decimal,
    },

    /// Show earnings, statistics and achievements
    Status {
        /// Print the raw state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recompute the activity streak from the activity log
    Streak {
        /// Print the streak as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let load_ctx = || cli::AppContext::load(cli.config.clone(), cli.data_dir.clone());

    match cli.command {
        Commands::Init { force } => cli::init::init_command(cli.config.clone(), force)?,
        Commands::Login => cli::login::login_command(&load_ctx()?).await?,
        Commands::Game { accuracy, duration } => {
            cli::game::game_command(&load_ctx()?, accuracy, duration).await?
        }
        Commands::Share { kind, virality } => {
            cli::share::share_command(&load_ctx()?, &kind, virality)?
        }
        Commands::Status { json } => cli::status::status_command(&load_ctx()?, json)?,
        Commands::Streak { json } => cli::streak::streak_command(&load_ctx()?, json).await?,
    }

    Ok(())
}
