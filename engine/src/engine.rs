use anyhow::Result;

use crate::constants::{MAX_TICK_RATE, MIN_TICK_RATE};
use crate::{
    Arena, ArenaConfig, ArenaState, Direction, GameCommand, GameEvent, MatchMode, Snapshot,
    SnakeId,
};

/// Wall-clock driver around an [`Arena`]. Callers poll `run_until` from
/// whatever time source they have (an animation frame, a tokio interval);
/// the engine decides whether the tick period has elapsed. At most one
/// tick fires per poll — skipped intervals under lag are dropped, not
/// backfilled.
pub struct GameEngine {
    arena: Arena,
    tick_duration_ms: i64,
    round_reset_delay_ms: i64,
    last_tick_ms: i64,
    game_over_since_ms: Option<i64>,
}

impl GameEngine {
    pub fn new(config: ArenaConfig, seed: u64, start_ms: i64) -> Self {
        let tick_duration_ms = duration_for(config.tick_rate);
        let round_reset_delay_ms = config.round_reset_delay_ms;
        GameEngine {
            arena: Arena::new(config, seed),
            tick_duration_ms,
            round_reset_delay_ms,
            last_tick_ms: start_ms,
            game_over_since_ms: None,
        }
    }

    /// Change the simulation rate. Values outside the accepted range are
    /// clamped.
    pub fn set_tick_rate(&mut self, moves_per_second: u16) {
        self.tick_duration_ms = duration_for(moves_per_second);
    }

    pub fn start_match(&mut self, mode: MatchMode) -> Result<Vec<GameEvent>> {
        self.game_over_since_ms = None;
        Ok(self
            .arena
            .exec_command(&GameCommand::StartMatch { mode })?)
    }

    /// Return to the menu. The caller is expected to stop its tick
    /// timer; no further ticks will change state either way.
    pub fn stop_match(&mut self) -> Result<Vec<GameEvent>> {
        self.game_over_since_ms = None;
        Ok(self.arena.exec_command(&GameCommand::StopMatch)?)
    }

    pub fn set_obstacle_mode(&mut self, enabled: bool) -> Result<Vec<GameEvent>> {
        Ok(self
            .arena
            .exec_command(&GameCommand::SetObstacleMode { enabled })?)
    }

    pub fn turn(&mut self, snake_id: SnakeId, direction: Direction) -> Result<Vec<GameEvent>> {
        Ok(self.arena.exec_command(&GameCommand::Turn {
            snake_id,
            direction,
        })?)
    }

    /// Advance the simulation to `now_ms`. Fires at most one tick, and
    /// handles the timed game-over → new-round transition.
    pub fn run_until(&mut self, now_ms: i64) -> Result<Vec<GameEvent>> {
        match self.arena.state() {
            ArenaState::Menu => Ok(Vec::new()),

            ArenaState::GameOver => {
                let since = *self.game_over_since_ms.get_or_insert(now_ms);
                if now_ms - since >= self.round_reset_delay_ms {
                    self.game_over_since_ms = None;
                    self.last_tick_ms = now_ms;
                    Ok(self.arena.start_round())
                } else {
                    Ok(Vec::new())
                }
            }

            ArenaState::Running => {
                if now_ms - self.last_tick_ms < self.tick_duration_ms {
                    return Ok(Vec::new());
                }
                self.last_tick_ms = now_ms;
                let events = self.arena.exec_command(&GameCommand::Tick)?;
                if self.arena.state() == ArenaState::GameOver {
                    self.game_over_since_ms = Some(now_ms);
                }
                Ok(events)
            }
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn snapshot(&self) -> Snapshot {
        self.arena.snapshot()
    }

    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn current_tick(&self) -> u32 {
        self.arena.current_tick()
    }

    pub fn tick_duration_ms(&self) -> i64 {
        self.tick_duration_ms
    }
}

fn duration_for(moves_per_second: u16) -> i64 {
    1000 / moves_per_second.clamp(MIN_TICK_RATE, MAX_TICK_RATE) as i64
}
