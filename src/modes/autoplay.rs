//! Headless self-play through the command protocol
//!
//! The [`Autopilot`] plays as an ordinary client would: it only sees the
//! snapshots returned by `state` and answers with `move` commands. Under
//! [`TickPolicy::Scheduled`] a tick loop advances the game in the
//! background and the client polls twice per tick; under
//! [`TickPolicy::OnPoll`] each poll is itself a tick.

use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::driver::{spawn_tick_loop, Autopilot, TickScheduler};
use crate::game::GameConfig;
use crate::metrics::{format_duration, GameMetrics};
use crate::protocol::{Command, MoveRequest, Reply, Snapshot, StartRequest};
use crate::service::{SharedSession, TickPolicy};

#[derive(Debug, Clone, Copy)]
pub struct AutoplaySettings {
    pub config: GameConfig,
    /// Number of games to play back to back
    pub games: u32,
    /// A game still running after this many ticks is cut off
    pub max_ticks: u64,
}

impl Default for AutoplaySettings {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            games: 1,
            max_ticks: 10_000,
        }
    }
}

pub struct AutoplayMode {
    session: SharedSession,
    settings: AutoplaySettings,
    metrics: GameMetrics,
    should_quit: bool,
}

impl AutoplayMode {
    pub fn new(session: SharedSession, settings: AutoplaySettings) -> Self {
        Self {
            session,
            settings,
            metrics: GameMetrics::new(),
            should_quit: false,
        }
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    pub async fn run(&mut self) -> Result<()> {
        let policy = self.session.lock().await.policy();
        info!(
            games = self.settings.games,
            grid_size = self.settings.config.grid_size,
            difficulty = %self.settings.config.difficulty,
            ?policy,
            "starting autoplay"
        );

        for game in 1..=self.settings.games {
            let last = self.play_game(policy).await?;
            self.metrics.on_game_over(last.score, last.ticks, last.end_reason);

            info!(
                game,
                score = last.score,
                ticks = last.ticks,
                reason = ?last.end_reason,
                elapsed = %format_duration(self.metrics.last_game_time),
                "game finished"
            );

            if self.should_quit {
                break;
            }
        }

        info!(summary = %self.metrics.format_summary(), "autoplay finished");
        Ok(())
    }

    /// Play one game to its end and return the last snapshot seen
    async fn play_game(&mut self, policy: TickPolicy) -> Result<Snapshot> {
        let reply = self
            .session
            .handle(Command::Start(StartRequest::new(self.settings.config)))
            .await;
        let initial_state = match reply {
            Reply::Started { initial_state, .. } => initial_state,
            other => bail!("session refused to start: {other:?}"),
        };
        self.metrics.on_game_start();

        let pace = Duration::from_millis(initial_state.tick_interval_ms);
        let ticker = match policy {
            TickPolicy::Scheduled => Some(spawn_tick_loop(self.session.clone(), pace)),
            TickPolicy::OnPoll => None,
        };

        let mut poller = TickScheduler::new(poll_period(policy, pace));
        let mut last = initial_state;

        loop {
            tokio::select! {
                _ = poller.tick() => {}

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                    break;
                }
            }

            let Reply::State(snapshot) = self.session.handle(Command::State).await else {
                bail!("session lost during autoplay");
            };
            last = snapshot;

            if last.game_over || last.ticks >= self.settings.max_ticks {
                break;
            }

            if let Some(direction) = Autopilot::choose(&last) {
                if direction != last.direction {
                    debug!(%direction, ticks = last.ticks, "steering");
                    self.session
                        .handle(Command::Move(MoveRequest::new(direction)))
                        .await;
                }
            }

            poller.retune(poll_period(
                policy,
                Duration::from_millis(last.tick_interval_ms),
            ));
        }

        if let Some(ticker) = ticker {
            ticker.abort();
        }
        Ok(last)
    }
}

fn poll_period(policy: TickPolicy, pace: Duration) -> Duration {
    match policy {
        TickPolicy::Scheduled => pace / 2,
        TickPolicy::OnPoll => pace,
    }
}
