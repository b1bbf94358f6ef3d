use crate::game::{Direction, Position};
use crate::protocol::Snapshot;

/// Greedy client that steers toward the food using only the wire snapshot
pub struct Autopilot;

impl Autopilot {
    /// Pick the next direction, or `None` when the game is over.
    ///
    /// Among the moves that survive the next tick, the one closest to the food
    /// wins, with ties kept on the current heading. When every move is fatal
    /// the current heading is kept.
    pub fn choose(snapshot: &Snapshot) -> Option<Direction> {
        if snapshot.game_over {
            return None;
        }
        let head = snapshot.head()?;
        let current = snapshot.direction;

        let mut best: Option<(Direction, u32)> = None;
        for direction in Self::candidates(current) {
            let next = head.moved_in_direction(direction);
            if !Self::is_safe(next, snapshot) {
                continue;
            }

            let distance = snapshot
                .food
                .map_or(0, |food| next.manhattan_distance(food));
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((direction, distance));
            }
        }

        Some(best.map_or(current, |(direction, _)| direction))
    }

    /// Legal headings, current one first
    fn candidates(current: Direction) -> impl Iterator<Item = Direction> {
        std::iter::once(current).chain(
            Direction::ALL
                .into_iter()
                .filter(move |d| *d != current && !d.is_opposite(current)),
        )
    }

    fn is_safe(next: Position, snapshot: &Snapshot) -> bool {
        let size = snapshot.grid_size as i32;
        if next.x < 0 || next.y < 0 || next.x >= size || next.y >= size {
            return false;
        }

        // The tail moves away unless this move eats
        let grows = snapshot.food == Some(next);
        let body = if grows {
            &snapshot.snake[..]
        } else {
            &snapshot.snake[..snapshot.snake.len().saturating_sub(1)]
        };
        !body.contains(&next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Difficulty, GameConfig, GameState, Snake};

    fn snapshot(snake: Snake, food: Option<Position>) -> Snapshot {
        let state = GameState::new(GameConfig::new(10, Difficulty::Medium), snake, food);
        Snapshot::from(&state)
    }

    #[test]
    fn test_heads_for_food() {
        let snap = snapshot(
            Snake::new(Position::new(5, 5), Direction::Right, 1),
            Some(Position::new(5, 1)),
        );
        assert_eq!(Autopilot::choose(&snap), Some(Direction::Up));
    }

    #[test]
    fn test_keeps_heading_on_tie() {
        let snap = snapshot(
            Snake::new(Position::new(2, 5), Direction::Right, 1),
            Some(Position::new(8, 5)),
        );
        assert_eq!(Autopilot::choose(&snap), Some(Direction::Right));
    }

    #[test]
    fn test_never_reverses() {
        // Food directly behind the head
        let snap = snapshot(
            Snake::new(Position::new(5, 5), Direction::Right, 3),
            Some(Position::new(2, 5)),
        );
        let choice = Autopilot::choose(&snap).unwrap();
        assert_ne!(choice, Direction::Left);
    }

    #[test]
    fn test_avoids_wall() {
        let snap = snapshot(
            Snake::new(Position::new(9, 0), Direction::Right, 1),
            Some(Position::new(9, 0).moved_by(-5, 0)),
        );
        assert_eq!(Autopilot::choose(&snap), Some(Direction::Down));
    }

    #[test]
    fn test_nothing_to_do_after_game_over() {
        let mut snap = snapshot(
            Snake::new(Position::new(5, 5), Direction::Right, 1),
            Some(Position::new(0, 0)),
        );
        snap.game_over = true;
        assert_eq!(Autopilot::choose(&snap), None);
    }
}
