use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use snake_engine::game::{Difficulty, GameConfig, GameEngine};
use snake_engine::modes::{AutoplayMode, AutoplaySettings, StdioMode};
use snake_engine::service::{GameService, SharedSession, TickPolicy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "snake_engine")]
#[command(version, about = "Server-authoritative Snake game engine")]
struct Cli {
    /// Front-end to run
    #[arg(long, value_enum, default_value = "stdio")]
    mode: Mode,

    /// Default grid size for sessions that don't ask for one
    #[arg(long, default_value = "20")]
    grid_size: usize,

    /// Default difficulty: easy, medium or hard
    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Who advances the game clock
    #[arg(long, value_enum, default_value = "scheduled")]
    tick_policy: TickPolicy,

    /// Seed for food placement; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds to hold the clock after a start (stdio mode)
    #[arg(long, default_value = "3")]
    countdown_secs: u64,

    /// Games to play back to back (autoplay mode)
    #[arg(long, default_value = "1")]
    games: u32,

    /// Cut off an autoplay game after this many ticks
    #[arg(long, default_value = "10000")]
    max_ticks: u64,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// JSON command lines on stdin, replies on stdout
    Stdio,
    /// Let the autopilot play through the command protocol
    Autoplay,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries protocol replies
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snake_engine=info".into()),
        )
        .init();

    let config = GameConfig::new(cli.grid_size, cli.difficulty);
    let engine = match cli.seed {
        Some(seed) => GameEngine::with_seed(seed),
        None => GameEngine::new(),
    };
    let service = GameService::new(engine, cli.tick_policy, config);

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Stdio => {
            let mut stdio_mode = StdioMode::new(service, Duration::from_secs(cli.countdown_secs));
            stdio_mode.run().await?;
        }
        Mode::Autoplay => {
            let settings = AutoplaySettings {
                config,
                games: cli.games,
                max_ticks: cli.max_ticks,
            };
            let mut autoplay_mode = AutoplayMode::new(SharedSession::new(service), settings);
            autoplay_mode.run().await?;
        }
    }

    Ok(())
}
