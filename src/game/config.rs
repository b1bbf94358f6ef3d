use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Grid size used when the client sends nothing usable
pub const DEFAULT_GRID_SIZE: usize = 20;
/// Smallest grid a session may be started on
pub const MIN_GRID_SIZE: usize = 5;
/// Largest grid a session may be started on
pub const MAX_GRID_SIZE: usize = 50;

/// Score added for every food eaten
pub const SCORE_PER_FOOD: u32 = 1;
/// Number of segments a fresh snake starts with
pub const INITIAL_SNAKE_LENGTH: usize = 1;

/// Tick interval reduction applied after every food
pub const SPEED_STEP_MS: u64 = 5;
/// Fastest pace a session can reach
pub const MIN_TICK_INTERVAL_MS: u64 = 50;

/// Difficulty level; only ever changes the starting tick interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Milliseconds between ticks at the start of a session
    pub fn tick_interval_ms(&self) -> u64 {
        match self {
            Self::Easy => 300,
            Self::Medium => 200,
            Self::Hard => 100,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms())
    }

    /// Parse a client-supplied level, falling back to [`Difficulty::Medium`]
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0:?}")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Configuration for one game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width and height of the square grid, in cells
    pub grid_size: usize,
    /// Starting pace of the session
    pub difficulty: Difficulty,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            difficulty: Difficulty::default(),
        }
    }
}

impl GameConfig {
    /// Create a configuration, clamping the grid size into the supported range
    pub fn new(grid_size: usize, difficulty: Difficulty) -> Self {
        Self {
            grid_size,
            difficulty,
        }
        .sanitized()
    }

    /// Build a configuration from untrusted client input.
    ///
    /// Missing or non-positive grid sizes take the fallback's size, out-of-range
    /// ones are clamped. A missing difficulty takes the fallback's level and an
    /// unknown one becomes Medium.
    pub fn from_request(grid_size: Option<i64>, difficulty: Option<&str>, fallback: GameConfig) -> Self {
        let grid_size = match grid_size {
            Some(size) if size > 0 => usize::try_from(size).unwrap_or(MAX_GRID_SIZE),
            _ => fallback.grid_size,
        };
        let difficulty = difficulty
            .map(Difficulty::parse_or_default)
            .unwrap_or(fallback.difficulty);

        Self::new(grid_size, difficulty)
    }

    /// Small grid for testing
    pub fn small() -> Self {
        Self::new(10, Difficulty::Medium)
    }

    /// Large grid
    pub fn large() -> Self {
        Self::new(30, Difficulty::Medium)
    }

    /// Copy of this configuration with the grid size forced into range
    pub fn sanitized(self) -> Self {
        Self {
            grid_size: self.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            ..self
        }
    }
}
