//! Command dispatch over a single game session

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::game::{GameConfig, GameEngine, GameState, MoveOutcome, Phase};
use crate::protocol::{Command, MoveRequest, Reply, Snapshot, StartRequest, Status};

/// Who advances the game clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TickPolicy {
    /// A scheduler ticks the engine at the session's pace
    #[default]
    Scheduled,
    /// Every state poll advances the game by one tick before answering
    OnPoll,
}

/// Handles client commands against one engine
pub struct GameService {
    engine: GameEngine,
    policy: TickPolicy,
    defaults: GameConfig,
}

impl GameService {
    pub fn new(engine: GameEngine, policy: TickPolicy, defaults: GameConfig) -> Self {
        Self {
            engine,
            policy,
            defaults,
        }
    }

    pub fn policy(&self) -> TickPolicy {
        self.policy
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn state(&self) -> Option<&GameState> {
        self.engine.state()
    }

    /// Pace of the current session
    pub fn tick_interval(&self) -> Option<Duration> {
        self.engine
            .state()
            .map(|state| Duration::from_millis(state.tick_interval_ms))
    }

    /// Advance the session by one scheduled tick
    pub fn tick(&mut self) -> Option<&GameState> {
        self.engine.tick()
    }

    pub fn handle(&mut self, command: Command) -> Reply {
        match command {
            Command::Start(request) => self.start(&request),
            Command::Move(request) => self.steer(&request),
            Command::State => self.poll(),
        }
    }

    /// Decode one JSON line and handle it; undecodable input becomes an error reply
    pub fn handle_line(&mut self, line: &str) -> Reply {
        match Command::decode(line) {
            Ok(command) => self.handle(command),
            Err(err) => {
                warn!(%err, "rejected command");
                Reply::error(err.to_string())
            }
        }
    }

    /// Current state without advancing the clock
    pub fn snapshot(&self) -> Reply {
        match self.engine.state() {
            Some(state) => Reply::State(Snapshot::from(state)),
            None => Reply::ack(Status::NoSession),
        }
    }

    fn start(&mut self, request: &StartRequest) -> Reply {
        let config = request.config(self.defaults);
        Reply::started(self.engine.start(config))
    }

    fn steer(&mut self, request: &MoveRequest) -> Reply {
        let Some(direction) = request.direction() else {
            debug!(direction = ?request.direction, "ignoring unknown direction");
            return Reply::ack(match self.engine.phase() {
                Phase::Idle => Status::NoSession,
                Phase::GameOver => Status::GameOver,
                Phase::Active => Status::Ok,
            });
        };

        let status = match self.engine.set_direction(direction) {
            MoveOutcome::Buffered => Status::Ok,
            MoveOutcome::Reversal => {
                debug!(%direction, "ignoring reversal");
                Status::Ok
            }
            MoveOutcome::GameOver => Status::GameOver,
            MoveOutcome::NoSession => Status::NoSession,
        };
        Reply::ack(status)
    }

    fn poll(&mut self) -> Reply {
        if self.policy == TickPolicy::OnPoll {
            self.engine.tick();
        }
        self.snapshot()
    }
}

/// Session handle for hosts that reach the game from several tasks.
///
/// Every command and every tick holds the lock for the whole operation, so
/// the engine only ever sees one mutation at a time.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<GameService>>,
}

impl SharedSession {
    pub fn new(service: GameService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, GameService> {
        self.inner.lock().await
    }

    pub async fn handle(&self, command: Command) -> Reply {
        self.inner.lock().await.handle(command)
    }

    /// Tick the session and report the pace to keep
    pub async fn tick(&self) -> Option<Duration> {
        let mut service = self.inner.lock().await;
        service.tick()?;
        service.tick_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Difficulty, Direction};

    fn service(policy: TickPolicy) -> GameService {
        GameService::new(GameEngine::with_seed(3), policy, GameConfig::default())
    }

    fn start(service: &mut GameService, grid_size: usize) -> Snapshot {
        let reply = service.handle(Command::Start(StartRequest::new(GameConfig::new(
            grid_size,
            Difficulty::Medium,
        ))));
        match reply {
            Reply::Started {
                status: Status::Ok,
                initial_state,
            } => initial_state,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    fn poll(service: &mut GameService) -> Snapshot {
        match service.handle(Command::State) {
            Reply::State(snapshot) => snapshot,
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_commands_before_start() {
        let mut service = service(TickPolicy::Scheduled);

        assert_eq!(service.handle(Command::State), Reply::ack(Status::NoSession));
        assert_eq!(
            service.handle(Command::Move(MoveRequest::new(Direction::Up))),
            Reply::ack(Status::NoSession)
        );
        assert!(service.tick().is_none());
        assert_eq!(service.tick_interval(), None);
    }

    #[test]
    fn test_start_uses_defaults_for_missing_fields() {
        let mut service = GameService::new(
            GameEngine::with_seed(1),
            TickPolicy::Scheduled,
            GameConfig::new(12, Difficulty::Hard),
        );

        let reply = service.handle(Command::Start(StartRequest::default()));
        let Reply::Started { initial_state, .. } = reply else {
            panic!("expected a started reply");
        };
        assert_eq!(initial_state.grid_size, 12);
        assert_eq!(initial_state.difficulty, Difficulty::Hard);
        assert_eq!(service.tick_interval(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_scheduled_poll_does_not_tick() {
        let mut service = service(TickPolicy::Scheduled);
        let initial = start(&mut service, 10);

        assert_eq!(poll(&mut service), initial);
        assert_eq!(poll(&mut service), initial);

        service.tick();
        assert_eq!(poll(&mut service).ticks, 1);
    }

    #[test]
    fn test_on_poll_ticks_before_answering() {
        let mut service = service(TickPolicy::OnPoll);
        let initial = start(&mut service, 20);

        let first = poll(&mut service);
        let second = poll(&mut service);

        assert_eq!(first.ticks, 1);
        assert_eq!(second.ticks, 2);
        assert_eq!(first.head().unwrap().x, initial.head().unwrap().x + 1);
    }

    #[test]
    fn test_move_is_acknowledged_without_state() {
        let mut service = service(TickPolicy::Scheduled);
        start(&mut service, 10);

        let reply = service.handle(Command::Move(MoveRequest::new(Direction::Down)));
        assert_eq!(reply, Reply::ack(Status::Ok));

        // Reversals and unknown names are swallowed too
        let reply = service.handle(Command::Move(MoveRequest::new(Direction::Left)));
        assert_eq!(reply, Reply::ack(Status::Ok));
        let reply = service.handle(Command::Move(MoveRequest {
            direction: Some("diagonal".into()),
        }));
        assert_eq!(reply, Reply::ack(Status::Ok));

        service.tick();
        assert_eq!(poll(&mut service).direction, Direction::Down);
    }

    #[test]
    fn test_move_after_game_over() {
        let mut service = service(TickPolicy::Scheduled);
        start(&mut service, 5);

        // Head starts at (2, 2) heading right; three ticks reach the wall
        for _ in 0..3 {
            service.tick();
        }
        assert_eq!(service.phase(), Phase::GameOver);

        let reply = service.handle(Command::Move(MoveRequest::new(Direction::Up)));
        assert_eq!(reply, Reply::ack(Status::GameOver));
        assert!(poll(&mut service).game_over);
    }

    #[test]
    fn test_handle_line() {
        let mut service = service(TickPolicy::Scheduled);

        let reply = service.handle_line(r#"{"command":"start","grid_size":"10","difficulty":"easy"}"#);
        assert!(matches!(reply, Reply::Started { .. }));

        let reply = service.handle_line("{oops");
        assert!(matches!(
            reply,
            Reply::Error {
                status: Status::Error,
                ..
            }
        ));
    }

    #[test]
    fn test_wrongly_typed_fields_are_defaulted_or_ignored() {
        let mut service = service(TickPolicy::Scheduled);

        let reply = service.handle_line(r#"{"command":"start","grid_size":10.5,"difficulty":"hard"}"#);
        let Reply::Started { initial_state, .. } = reply else {
            panic!("expected a started reply, got {reply:?}");
        };
        assert_eq!(initial_state.grid_size, 20);
        assert_eq!(initial_state.difficulty, Difficulty::Hard);

        let reply = service.handle_line(r#"{"command":"start","grid_size":10,"difficulty":3}"#);
        let Reply::Started { initial_state, .. } = reply else {
            panic!("expected a started reply, got {reply:?}");
        };
        assert_eq!(initial_state.grid_size, 10);
        assert_eq!(initial_state.difficulty, Difficulty::Medium);

        let reply = service.handle_line(r#"{"command":"move","direction":5}"#);
        assert_eq!(reply, Reply::ack(Status::Ok));
        service.tick();
        assert_eq!(poll(&mut service).direction, Direction::Right);
    }

    #[tokio::test]
    async fn test_shared_session_serializes_access() {
        let session = SharedSession::new(service(TickPolicy::Scheduled));
        session
            .handle(Command::Start(StartRequest::new(GameConfig::new(20, Difficulty::Easy))))
            .await;

        let ticker = {
            let session = session.clone();
            tokio::spawn(async move {
                for _ in 0..5 {
                    session.tick().await;
                }
            })
        };
        let mover = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .handle(Command::Move(MoveRequest::new(Direction::Down)))
                    .await
            })
        };

        ticker.await.unwrap();
        assert_eq!(mover.await.unwrap(), Reply::ack(Status::Ok));

        let service = session.lock().await;
        let state = service.state().unwrap();
        assert_eq!(state.ticks, 5);
        assert!(state.is_consistent());
        assert!(service.tick_interval() <= Some(Duration::from_millis(300)));
    }
}
