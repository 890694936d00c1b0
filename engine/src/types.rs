use serde::{Deserialize, Serialize};

/// Snake identity within a match: 1 or 2.
pub type SnakeId = u32;

pub const SNAKE_ONE: SnakeId = 1;
pub const SNAKE_TWO: SnakeId = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub fn new(x: i16, y: i16) -> Self {
        Position { x, y }
    }

    /// The adjacent cell one step in `direction`. May fall outside the
    /// board; out-of-bounds heads are how wall collisions are detected.
    pub fn step(&self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan_distance(&self, other: Position) -> u16 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Enumeration order is north, south, west, east; neighbor scans and
    /// tie-breaks rely on it being stable.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step with y growing downward.
    pub fn delta(&self) -> (i16, i16) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_opposite(&self, other: Direction) -> bool {
        let (dx, dy) = self.delta();
        let (ox, oy) = other.delta();
        dx == -ox && dy == -oy
    }

    /// Direction leading from `from` to the adjacent cell `to`.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|dir| from.step(*dir) == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposites() {
        assert!(Direction::Up.is_opposite(Direction::Down));
        assert!(Direction::Left.is_opposite(Direction::Right));
        assert!(!Direction::Up.is_opposite(Direction::Left));
        assert!(!Direction::Right.is_opposite(Direction::Right));
    }

    #[test]
    fn step_moves_one_cell() {
        let p = Position::new(3, 3);
        assert_eq!(p.step(Direction::Up), Position::new(3, 2));
        assert_eq!(p.step(Direction::Down), Position::new(3, 4));
        assert_eq!(p.step(Direction::Left), Position::new(2, 3));
        assert_eq!(p.step(Direction::Right), Position::new(4, 3));
    }

    #[test]
    fn between_adjacent_cells() {
        let p = Position::new(5, 5);
        assert_eq!(
            Direction::between(p, Position::new(6, 5)),
            Some(Direction::Right)
        );
        assert_eq!(Direction::between(p, Position::new(9, 9)), None);
    }
}
