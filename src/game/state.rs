use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::direction::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }

    pub fn manhattan_distance(&self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True when the two positions are exactly one unit step apart
    pub fn is_adjacent(&self, other: Position) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    /// Body segments, with head at the front
    pub body: VecDeque<Position>,
    /// Last applied direction of travel
    pub direction: Direction,
}

impl Snake {
    /// Create a new snake with given starting position and direction
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let mut body = VecDeque::with_capacity(length.max(1));
        body.push_back(head);

        // Add initial body segments behind the head
        let (dx, dy) = direction.delta();
        let (back_dx, back_dy) = (-dx, -dy);

        for i in 1..length {
            let prev = body[i - 1];
            body.push_back(prev.moved_by(back_dx, back_dy));
        }

        Self { body, direction }
    }

    /// Build a snake from explicit segments, head first
    pub fn from_segments(segments: impl IntoIterator<Item = Position>, direction: Direction) -> Self {
        Self {
            body: segments.into_iter().collect(),
            direction,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Check whether a head moving onto `pos` would hit the body.
    ///
    /// The tail is vacated on a non-growing move, so it only counts when the
    /// snake is about to grow.
    pub fn collides_on_move(&self, pos: Position, growing: bool) -> bool {
        let considered = if growing {
            self.body.len()
        } else {
            self.body.len() - 1
        };
        self.body.iter().take(considered).any(|&segment| segment == pos)
    }

    /// Push a new head, dropping the tail unless the snake grows
    pub fn advance(&mut self, new_head: Position, grow: bool) {
        self.body.push_front(new_head);

        if !grow {
            self.body.pop_back();
        }
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Every adjacent pair of segments is one unit step apart
    pub fn is_contiguous(&self) -> bool {
        self.body
            .iter()
            .zip(self.body.iter().skip(1))
            .all(|(a, b)| a.is_adjacent(*b))
    }

    /// No two segments share a cell
    pub fn has_overlap(&self) -> bool {
        self.body
            .iter()
            .enumerate()
            .any(|(i, segment)| self.body.iter().skip(i + 1).any(|other| other == segment))
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Snake hit a wall
    Wall,
    /// Snake hit itself
    SelfCollision,
    /// Snake fills the grid and no food can be placed
    GridFull,
}

/// Complete state of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub config: GameConfig,
    pub snake: Snake,
    /// `None` only once the grid is full
    pub food: Option<Position>,
    /// Direction to apply on the next tick
    pub pending_direction: Option<Direction>,
    pub score: u32,
    pub game_over: bool,
    pub end_reason: Option<EndReason>,
    /// Current pace; starts at the difficulty's interval and speeds up with food
    pub tick_interval_ms: u64,
    /// Number of ticks that moved the snake
    pub ticks: u64,
}

impl GameState {
    /// Create a new game state
    pub fn new(config: GameConfig, snake: Snake, food: Option<Position>) -> Self {
        Self {
            config,
            snake,
            food,
            pending_direction: None,
            score: 0,
            game_over: false,
            end_reason: None,
            tick_interval_ms: config.difficulty.tick_interval_ms(),
            ticks: 0,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.config.grid_size
    }

    /// Direction the snake is travelling in
    pub fn direction(&self) -> Direction {
        self.snake.direction
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        let size = self.config.grid_size as i32;
        pos.x >= 0 && pos.x < size && pos.y >= 0 && pos.y < size
    }

    /// Structural invariants every reachable state satisfies
    pub fn is_consistent(&self) -> bool {
        !self.snake.is_empty()
            && self.snake.is_contiguous()
            && !self.snake.has_overlap()
            && self.snake.body.iter().all(|&segment| self.is_in_bounds(segment))
            && self.food.map_or(true, |food| {
                self.is_in_bounds(food) && !self.snake.contains(food)
            })
    }
}
