//! Food placement

use rand::seq::IteratorRandom;
use rand::Rng;

use super::state::{Position, Snake};

/// Random probes tried before falling back to enumerating free cells
const RANDOM_PROBES: usize = 16;

/// Pick a uniformly random cell of the grid that the snake does not occupy.
///
/// Returns `None` when the snake covers every cell. While the grid is mostly
/// empty a few random probes find a cell quickly; once they all land on the
/// snake the free cells are enumerated, so a nearly full grid still resolves
/// in one pass and a single free cell is always found.
pub fn place_food<R: Rng + ?Sized>(rng: &mut R, grid_size: usize, snake: &Snake) -> Option<Position> {
    let cells = grid_size * grid_size;
    if snake.len() >= cells {
        return None;
    }

    let size = grid_size as i32;
    for _ in 0..RANDOM_PROBES {
        let pos = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
        if !snake.contains(pos) {
            return Some(pos);
        }
    }

    let mut occupied = vec![false; cells];
    for segment in &snake.body {
        if let Some(index) = cell_index(*segment, grid_size) {
            occupied[index] = true;
        }
    }

    (0..cells)
        .filter(|&index| !occupied[index])
        .choose(rng)
        .map(|index| Position::new((index % grid_size) as i32, (index / grid_size) as i32))
}

fn cell_index(pos: Position, grid_size: usize) -> Option<usize> {
    let x = usize::try_from(pos.x).ok()?;
    let y = usize::try_from(pos.y).ok()?;
    (x < grid_size && y < grid_size).then_some(y * grid_size + x)
}
