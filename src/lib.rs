//! Snake Engine - a server-authoritative Snake game
//!
//! This library provides:
//! - Core game logic: state, movement, collisions, food, speed-up (game module)
//! - The JSON command protocol spoken by clients (protocol module)
//! - Command dispatch over one session (service module)
//! - Tick scheduling and a greedy autopilot client (driver module)
//! - Front-ends: line-based stdio and headless self-play (modes module)

pub mod driver;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod protocol;
pub mod service;
