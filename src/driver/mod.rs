//! Drivers that decide when the engine ticks and what a client sends.
//!
//! The engine itself never waits on anything; everything time-based lives
//! here.

pub mod autopilot;
pub mod scheduler;

pub use autopilot::Autopilot;
pub use scheduler::TickScheduler;

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

use crate::service::SharedSession;

/// Spawn a task that ticks the shared session at the session's own pace.
///
/// The pace follows the session as it speeds up. The task runs until aborted.
pub fn spawn_tick_loop(session: SharedSession, initial_period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut scheduler = TickScheduler::new(initial_period);

        loop {
            scheduler.tick().await;

            if let Some(period) = session.tick().await {
                trace!(?period, "tick");
                scheduler.retune(period);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Difficulty, GameConfig, GameEngine};
    use crate::protocol::{Command, Reply, StartRequest};
    use crate::service::{GameService, TickPolicy};

    #[tokio::test(start_paused = true)]
    async fn test_tick_loop_follows_difficulty() {
        let config = GameConfig::new(30, Difficulty::Hard);
        let session = SharedSession::new(GameService::new(
            GameEngine::with_seed(8),
            TickPolicy::Scheduled,
            config,
        ));
        session.handle(Command::Start(StartRequest::new(config))).await;

        let ticker = spawn_tick_loop(session.clone(), config.difficulty.tick_interval());
        tokio::time::sleep(Duration::from_millis(350)).await;
        ticker.abort();

        let Reply::State(snapshot) = session.handle(Command::State).await else {
            panic!("expected state");
        };
        // Hard paces at 100ms, so three ticks fit before 350ms
        assert_eq!(snapshot.ticks, 3);
    }
}
