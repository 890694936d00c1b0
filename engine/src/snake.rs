use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Direction, Position, PowerUpKind, SnakeId};

/// A power-up effect currently applied to a snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snake {
    pub id: SnakeId,
    pub color: String,
    pub body: VecDeque<Position>,
    pub direction: Direction,
    pub is_alive: bool,
    pub power_up: Option<ActivePowerUp>,
    /// Player input waiting to be applied on the next move.
    #[serde(skip)]
    buffered_direction: Option<Direction>,
}

impl Snake {
    pub fn new(id: SnakeId, color: &str, origin: Position, length: usize) -> Self {
        let mut snake = Snake {
            id,
            color: color.to_string(),
            body: VecDeque::new(),
            direction: Direction::Right,
            is_alive: true,
            power_up: None,
            buffered_direction: None,
        };
        snake.reset(origin, length);
        snake
    }

    /// Restore the round-start state: `length` cells extending leftward
    /// from `origin`, facing right, alive, no power-up.
    pub fn reset(&mut self, origin: Position, length: usize) {
        self.body = (0..length as i16)
            .map(|i| Position::new(origin.x - i, origin.y))
            .collect();
        self.direction = Direction::Right;
        self.is_alive = true;
        self.power_up = None;
        self.buffered_direction = None;
    }

    pub fn head(&self) -> Position {
        *self.body.front().expect("snake body should not be empty")
    }

    pub fn tail(&self) -> Position {
        *self.body.back().expect("snake body should not be empty")
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Buffer a direction change for the next move. A reversal onto the
    /// snake's own neck is ignored.
    pub fn buffer_direction(&mut self, direction: Direction) -> bool {
        if direction.is_opposite(self.direction) {
            return false;
        }
        self.buffered_direction = Some(direction);
        true
    }

    pub fn take_buffered_direction(&mut self) -> Option<Direction> {
        self.buffered_direction.take()
    }

    /// Advance one cell. `direction` of `None` keeps the current heading.
    /// The tail is always popped; growth works by duplicating the tail
    /// beforehand, so a growth move nets +1.
    pub fn advance(&mut self, direction: Option<Direction>) {
        if let Some(dir) = direction {
            self.direction = dir;
        }
        let new_head = self.head().step(self.direction);
        self.body.push_front(new_head);
        self.body.pop_back();
    }

    /// Queue one cell of growth by duplicating the tail; the duplicate is
    /// consumed by the next `advance`.
    pub fn grow(&mut self) {
        self.body.push_back(self.tail());
    }

    pub fn apply_power_up(&mut self, kind: PowerUpKind, duration: u32) {
        self.power_up = Some(ActivePowerUp {
            kind,
            remaining: duration,
        });
    }

    /// Count down the active effect, clearing it when it hits zero.
    /// Returns true if the effect expired this tick.
    pub fn tick_power_up(&mut self) -> bool {
        if let Some(active) = &mut self.power_up {
            active.remaining = active.remaining.saturating_sub(1);
            if active.remaining == 0 {
                self.power_up = None;
                return true;
            }
        }
        false
    }

    /// Moves this snake performs on the given tick: two under a speed
    /// boost, every other tick under a slow-down, otherwise one.
    pub fn moves_this_tick(&self, tick: u32) -> u32 {
        match self.power_up.map(|p| p.kind) {
            Some(PowerUpKind::SpeedBoost) => 2,
            Some(PowerUpKind::SlowDown) => {
                if tick % 2 == 0 {
                    1
                } else {
                    0
                }
            }
            None => 1,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// True if `pos` coincides with any body cell other than the head.
    pub fn body_contains(&self, pos: Position) -> bool {
        self.body.iter().skip(1).any(|&cell| cell == pos)
    }
}
