use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::EndReason;

/// Number of recent games kept for the rolling average
const RECENT_WINDOW: usize = 20;

/// Running tally over every game a front-end has hosted
pub struct GameMetrics {
    game_started: Option<Instant>,
    /// Wall-clock length of the last finished game
    pub last_game_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    pub total_ticks: u64,
    pub wall_hits: u32,
    pub self_collisions: u32,
    pub grids_filled: u32,
    recent_scores: VecDeque<u32>,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            game_started: None,
            last_game_time: Duration::ZERO,
            high_score: 0,
            games_played: 0,
            total_ticks: 0,
            wall_hits: 0,
            self_collisions: 0,
            grids_filled: 0,
            recent_scores: VecDeque::with_capacity(RECENT_WINDOW),
        }
    }

    pub fn on_game_start(&mut self) {
        self.game_started = Some(Instant::now());
    }

    /// Record a finished game. `reason` is `None` for a game cut off while alive.
    pub fn on_game_over(&mut self, score: u32, ticks: u64, reason: Option<EndReason>) {
        if let Some(started) = self.game_started.take() {
            self.last_game_time = started.elapsed();
        }

        self.games_played += 1;
        self.total_ticks += ticks;
        self.high_score = self.high_score.max(score);

        match reason {
            Some(EndReason::Wall) => self.wall_hits += 1,
            Some(EndReason::SelfCollision) => self.self_collisions += 1,
            Some(EndReason::GridFull) => self.grids_filled += 1,
            None => {}
        }

        if self.recent_scores.len() == RECENT_WINDOW {
            self.recent_scores.pop_front();
        }
        self.recent_scores.push_back(score);
    }

    /// Mean score over the most recent games
    pub fn mean_recent_score(&self) -> f32 {
        if self.recent_scores.is_empty() {
            return 0.0;
        }
        self.recent_scores.iter().sum::<u32>() as f32 / self.recent_scores.len() as f32
    }

    pub fn format_summary(&self) -> String {
        format!(
            "games: {} | high score: {} | mean recent score: {:.2} | ticks: {} | walls: {} | self: {} | full: {}",
            self.games_played,
            self.high_score,
            self.mean_recent_score(),
            self.total_ticks,
            self.wall_hits,
            self.self_collisions,
            self.grids_filled
        )
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// `mm:ss`, minutes uncapped
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
