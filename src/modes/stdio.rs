//! Line-oriented front-end over stdin/stdout
//!
//! Each input line is a protocol command (JSON) or a shorthand word; each
//! command gets exactly one JSON reply line. The game clock is the
//! [`TickScheduler`], or the polls themselves under [`TickPolicy::OnPoll`].
//!
//! # Controls
//!
//! - `start [grid] [difficulty]`: new session, after the countdown
//! - `up`/`down`/`left`/`right` or `w`/`a`/`s`/`d`: steer
//! - `state`: current snapshot
//! - `pause` / `resume`: withhold ticks
//! - `quit`: leave (end of input does the same)

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::driver::TickScheduler;
use crate::game::{Difficulty, Phase};
use crate::input::{InputHandler, LineAction};
use crate::metrics::{format_duration, GameMetrics};
use crate::protocol::{Command, Reply, Status};
use crate::service::{GameService, TickPolicy};

pub struct StdioMode {
    service: GameService,
    scheduler: TickScheduler,
    input_handler: InputHandler,
    metrics: GameMetrics,
    countdown: Duration,
    game_running: bool,
    should_quit: bool,
}

impl StdioMode {
    pub fn new(service: GameService, countdown: Duration) -> Self {
        let period = service
            .tick_interval()
            .unwrap_or_else(|| Difficulty::default().tick_interval());

        Self {
            service,
            scheduler: TickScheduler::new(period),
            input_handler: InputHandler::new(),
            metrics: GameMetrics::new(),
            countdown,
            game_running: false,
            should_quit: false,
        }
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run_with(stdin, stdout).await
    }

    /// Serve commands from `reader`, writing one reply line per command to `writer`
    pub async fn run_with<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        info!(policy = ?self.service.policy(), "waiting for commands");

        loop {
            let ticking = self.service.policy() == TickPolicy::Scheduled
                && self.service.phase() == Phase::Active;

            tokio::select! {
                line = lines.next_line() => {
                    match line.context("Failed to read command")? {
                        Some(line) => {
                            if let Some(reply) = self.handle_line(&line) {
                                write_reply(&mut writer, &reply).await?;
                            }
                        }
                        None => {
                            debug!("input closed");
                            self.should_quit = true;
                        }
                    }
                }

                // Game logic tick
                _ = self.scheduler.tick(), if ticking => {
                    self.update_game();
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            self.observe_game_over();

            if self.should_quit {
                break;
            }
        }

        info!(summary = %self.metrics.format_summary(), "stdio session closed");
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Option<Reply> {
        match self.input_handler.handle_line(line) {
            LineAction::None => None,
            LineAction::Quit => {
                self.should_quit = true;
                None
            }
            LineAction::Invalid(message) => {
                warn!(%message, "rejected input");
                Some(Reply::error(message))
            }
            LineAction::Pause => Some(self.pause()),
            LineAction::Resume => Some(self.resume()),
            LineAction::Command(command) => Some(self.dispatch(command)),
        }
    }

    fn dispatch(&mut self, command: Command) -> Reply {
        match (command, self.hold_status()) {
            (command @ Command::Start(_), _) => {
                self.abandon_running_game();
                let reply = self.service.handle(command);
                self.on_game_start();
                reply
            }
            (Command::Move(_), Some(status)) => Reply::ack(status),
            // No ticking on polls while the clock is held
            (Command::State, Some(_)) => self.service.snapshot(),
            (command, None) => self.service.handle(command),
        }
    }

    /// Why ticks are currently withheld from an active game, if they are
    fn hold_status(&self) -> Option<Status> {
        if self.service.phase() != Phase::Active {
            return None;
        }
        if self.scheduler.is_paused() {
            Some(Status::Paused)
        } else if self.scheduler.is_holding() {
            Some(Status::CountingDown)
        } else {
            None
        }
    }

    fn pause(&mut self) -> Reply {
        let status = match self.service.phase() {
            Phase::Idle => Status::NoSession,
            Phase::GameOver => Status::GameOver,
            Phase::Active if self.scheduler.is_holding() => Status::CountingDown,
            Phase::Active => {
                self.scheduler.pause();
                info!("paused");
                Status::Ok
            }
        };
        Reply::ack(status)
    }

    fn resume(&mut self) -> Reply {
        if self.scheduler.is_paused() {
            self.scheduler.resume();
            info!("resumed");
        }
        Reply::ack(Status::Ok)
    }

    fn on_game_start(&mut self) {
        let period = self
            .service
            .tick_interval()
            .unwrap_or_else(|| Difficulty::default().tick_interval());

        self.scheduler.restart(period);
        if !self.countdown.is_zero() {
            self.scheduler.hold_for(self.countdown);
        }
        self.metrics.on_game_start();
        self.game_running = true;
    }

    /// A start during a live game cuts that game off; it still counts
    fn abandon_running_game(&mut self) {
        if !self.game_running || self.service.phase() != Phase::Active {
            return;
        }

        if let Some(state) = self.service.state() {
            self.metrics.on_game_over(state.score, state.ticks, None);
            info!(score = state.score, ticks = state.ticks, "game abandoned by restart");
        }
        self.game_running = false;
    }

    fn update_game(&mut self) {
        if self.service.tick().is_some() {
            if let Some(period) = self.service.tick_interval() {
                self.scheduler.retune(period);
            }
        }
    }

    fn observe_game_over(&mut self) {
        if !self.game_running || self.service.phase() != Phase::GameOver {
            return;
        }

        if let Some(state) = self.service.state() {
            self.metrics.on_game_over(state.score, state.ticks, state.end_reason);
            info!(
                score = state.score,
                ticks = state.ticks,
                reason = ?state.end_reason,
                elapsed = %format_duration(self.metrics.last_game_time),
                "game over"
            );
        }
        self.game_running = false;
    }
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> Result<()> {
    let mut line = reply.to_json().context("Failed to encode reply")?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .context("Failed to write reply")?;
    writer.flush().await.context("Failed to flush reply")?;
    Ok(())
}
