//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or scheduling
//! dependencies. The engine is a synchronous state machine: whoever drives it
//! (a timer task, a request handler, a test) decides when ticks happen.

pub mod config;
pub mod direction;
pub mod engine;
pub mod food;
pub mod state;

// Re-export commonly used types
pub use config::{Difficulty, GameConfig};
pub use direction::Direction;
pub use engine::{step, steer, GameEngine, MoveOutcome, Phase, StepInfo};
pub use state::{EndReason, GameState, Position, Snake};
