use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{
    config::{GameConfig, INITIAL_SNAKE_LENGTH, MIN_TICK_INTERVAL_MS, SCORE_PER_FOOD, SPEED_STEP_MS},
    direction::Direction,
    food::place_food,
    state::{EndReason, GameState, Position, Snake},
};

/// Lifecycle phase of the engine's session slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game has been started yet
    Idle,
    Active,
    /// The session is frozen until the next start
    GameOver,
}

/// What happened to a direction change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Stored as the direction for the next tick
    Buffered,
    /// Ignored: the exact opposite of the current direction of travel
    Reversal,
    /// Ignored: the session has ended
    GameOver,
    /// Ignored: no session exists
    NoSession,
}

/// Information about a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInfo {
    /// Whether the snake ate food this tick
    pub ate_food: bool,
    /// Set when this tick ended the session
    pub end_reason: Option<EndReason>,
}

/// Buffer a direction for the next tick.
///
/// The request is checked against the direction the snake is actually
/// travelling in, never against one that is already buffered, so two quick
/// calls cannot chain into a reversal. The last accepted call wins.
pub fn steer(state: &mut GameState, direction: Direction) -> MoveOutcome {
    if state.game_over {
        return MoveOutcome::GameOver;
    }

    if state.snake.direction.is_opposite(direction) {
        return MoveOutcome::Reversal;
    }

    state.pending_direction = Some(direction);
    MoveOutcome::Buffered
}

/// Advance a session by one tick. A finished session is left untouched.
pub fn step<R: Rng + ?Sized>(state: &mut GameState, rng: &mut R) -> StepInfo {
    if state.game_over {
        return StepInfo::default();
    }

    if let Some(direction) = state.pending_direction.take() {
        state.snake.direction = direction;
    }

    let new_head = state.snake.head().moved_in_direction(state.snake.direction);

    if !state.is_in_bounds(new_head) {
        return finish(state, EndReason::Wall);
    }

    let grows = state.food == Some(new_head);
    if state.snake.collides_on_move(new_head, grows) {
        return finish(state, EndReason::SelfCollision);
    }

    state.snake.advance(new_head, grows);
    state.ticks += 1;

    if !grows {
        return StepInfo::default();
    }

    state.score += SCORE_PER_FOOD;
    state.tick_interval_ms = state
        .tick_interval_ms
        .saturating_sub(SPEED_STEP_MS)
        .max(MIN_TICK_INTERVAL_MS);
    state.food = place_food(rng, state.grid_size(), &state.snake);

    if state.food.is_none() {
        let mut info = finish(state, EndReason::GridFull);
        info.ate_food = true;
        return info;
    }

    StepInfo {
        ate_food: true,
        end_reason: None,
    }
}

fn finish(state: &mut GameState, reason: EndReason) -> StepInfo {
    state.game_over = true;
    state.end_reason = Some(reason);
    debug!(?reason, score = state.score, "game over");

    StepInfo {
        ate_food: false,
        end_reason: Some(reason),
    }
}

/// Owner of the single game session
pub struct GameEngine {
    rng: StdRng,
    session: Option<GameState>,
}

impl GameEngine {
    /// Create an idle engine seeded from system entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            session: None,
        }
    }

    /// Create an idle engine with a reproducible food sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            session: None,
        }
    }

    /// Start a new session, discarding any previous one
    pub fn start(&mut self, config: GameConfig) -> &GameState {
        let config = config.sanitized();
        let center = (config.grid_size / 2) as i32;

        let snake = Snake::new(
            Position::new(center, center),
            Direction::Right,
            INITIAL_SNAKE_LENGTH,
        );
        let food = place_food(&mut self.rng, config.grid_size, &snake);

        info!(
            grid_size = config.grid_size,
            difficulty = %config.difficulty,
            "session started"
        );

        self.session.insert(GameState::new(config, snake, food))
    }

    /// Buffer a direction change for the next tick; never fails
    pub fn set_direction(&mut self, direction: Direction) -> MoveOutcome {
        match self.session.as_mut() {
            Some(state) => steer(state, direction),
            None => MoveOutcome::NoSession,
        }
    }

    /// Advance the session by one tick and return the new snapshot
    pub fn tick(&mut self) -> Option<&GameState> {
        let state = self.session.as_mut()?;
        let info = step(state, &mut self.rng);
        debug_assert!(state.is_consistent(), "tick produced an invalid state");

        if info.ate_food {
            debug!(
                score = state.score,
                length = state.snake.len(),
                tick_interval_ms = state.tick_interval_ms,
                "food eaten"
            );
        }
        if let Some(reason) = info.end_reason {
            info!(?reason, score = state.score, length = state.snake.len(), "session ended");
        }

        Some(&*state)
    }

    /// Current snapshot, if a session exists
    pub fn state(&self) -> Option<&GameState> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Phase {
        match &self.session {
            None => Phase::Idle,
            Some(state) if state.game_over => Phase::GameOver,
            Some(_) => Phase::Active,
        }
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}
