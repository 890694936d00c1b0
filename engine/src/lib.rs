use thiserror::Error;

pub mod ai;
mod arena;
mod constants;
mod engine;
mod entity;
mod grid;
mod snake;
mod types;

pub mod util;

pub use arena::*;
pub use constants::*;
pub use engine::*;
pub use entity::*;
pub use grid::*;
pub use snake::*;
pub use types::*;
pub use util::PseudoRandom;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// No free cell was found within the sampling budget. Recoverable:
    /// callers skip the spawn and retry on a later tick.
    #[error("no unoccupied cell found after {attempts} attempts")]
    SpawnExhausted { attempts: u32 },

    /// A command referenced a snake id outside the match. Caller bug.
    #[error("unknown snake id {0}")]
    UnknownSnake(SnakeId),
}
