use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::SPAWN_ATTEMPT_FACTOR;
use crate::util::PseudoRandom;
use crate::{GameError, Position};

/// The bounded square board. Occupancy is not stored here; callers pass
/// the current occupied set because it changes every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub tile_count: i16,
}

impl Grid {
    pub fn new(tile_count: i16) -> Self {
        Grid { tile_count }
    }

    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.tile_count && pos.y >= 0 && pos.y < self.tile_count
    }

    pub fn cell_count(&self) -> u32 {
        (self.tile_count as u32) * (self.tile_count as u32)
    }

    /// Rejection-sample a cell not present in `occupied`. The board is
    /// sparse in normal play, so a bounded number of uniform samples is
    /// enough; a nearly full board yields `SpawnExhausted` instead of
    /// looping forever.
    pub fn sample_unoccupied(
        &self,
        rng: &mut PseudoRandom,
        occupied: &HashSet<Position>,
    ) -> Result<Position, GameError> {
        let attempts = self.cell_count().saturating_mul(SPAWN_ATTEMPT_FACTOR);
        for _ in 0..attempts {
            let pos = Position::new(
                rng.next_index(self.tile_count as u32) as i16,
                rng.next_index(self.tile_count as u32) as i16,
            );
            if !occupied.contains(&pos) {
                return Ok(pos);
            }
        }
        Err(GameError::SpawnExhausted { attempts })
    }
}
