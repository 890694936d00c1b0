use serde::{Deserialize, Serialize};

use crate::Position;

/// Display colors the rendering collaborator uses for the two snakes.
pub const SNAKE_COLORS: [&str; 2] = ["#4caf50", "#2196F3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Holder moves twice per tick while the effect lasts.
    SpeedBoost,
    /// Holder moves on alternating ticks only while the effect lasts.
    SlowDown,
}

/// A power-up waiting on the board. `duration` is the effect length in
/// ticks, copied onto the snake that picks it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUp {
    pub position: Position,
    pub kind: PowerUpKind,
    pub duration: u32,
}

impl PowerUp {
    pub fn new(position: Position, kind: PowerUpKind, duration: u32) -> Self {
        PowerUp {
            position,
            kind,
            duration,
        }
    }
}
