use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai;
use crate::constants::*;
use crate::util::PseudoRandom;
use crate::{
    Direction, GameError, Grid, Position, PowerUp, PowerUpKind, SNAKE_COLORS, SNAKE_ONE,
    SNAKE_TWO, Snake, SnakeId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub tile_count: i16,
    pub start_length: usize,
    pub tick_rate: u16,
    pub power_up_duration: u32,
    pub power_up_spawn_chance: f32,
    pub max_power_ups: usize,
    pub obstacle_spawn_interval: u32,
    pub food_deterrent_chance: f32,
    pub food_deterrent_length: usize,
    pub round_reset_delay_ms: i64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            tile_count: DEFAULT_TILE_COUNT,
            start_length: START_LENGTH,
            tick_rate: DEFAULT_TICK_RATE,
            power_up_duration: POWER_UP_DURATION,
            power_up_spawn_chance: POWER_UP_SPAWN_CHANCE,
            max_power_ups: MAX_POWER_UPS,
            obstacle_spawn_interval: OBSTACLE_SPAWN_INTERVAL,
            food_deterrent_chance: FOOD_DETERRENT_CHANCE,
            food_deterrent_length: FOOD_DETERRENT_LENGTH,
            round_reset_delay_ms: ROUND_RESET_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaState {
    Menu,
    Running,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    AiVsAi,
    /// Snake 1 follows buffered player input; snake 2 runs the AI.
    PlayerVsAi,
}

/// Why a snake died, or why a round ended without a winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    Wall,
    SelfCollision,
    Opponent,
    Obstacle,
    HeadOn,
    Tie,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CollisionKind::Wall => "wall",
            CollisionKind::SelfCollision => "self",
            CollisionKind::Opponent => "opponent",
            CollisionKind::Obstacle => "obstacle",
            CollisionKind::HeadOn => "head-on",
            CollisionKind::Tie => "tie",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Winner { snake_id: SnakeId, cause: CollisionKind },
    Draw { cause: CollisionKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCommand {
    Tick,
    Turn { snake_id: SnakeId, direction: Direction },
    SetObstacleMode { enabled: bool },
    StartMatch { mode: MatchMode },
    StopMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted,
    SnakeTurned {
        snake_id: SnakeId,
        direction: Direction,
    },
    SnakeDied {
        snake_id: SnakeId,
        cause: CollisionKind,
    },
    FoodSpawned {
        position: Position,
    },
    FoodEaten {
        snake_id: SnakeId,
        position: Position,
    },
    PowerUpSpawned {
        power_up: PowerUp,
    },
    PowerUpCollected {
        snake_id: SnakeId,
        position: Position,
        kind: PowerUpKind,
        duration: u32,
    },
    PowerUpExpired {
        snake_id: SnakeId,
    },
    ObstacleSpawned {
        position: Position,
    },
    ObstaclesCleared,
    RoundOver {
        outcome: RoundOutcome,
    },
}

/// Read-only view of the board for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: ArenaState,
    pub mode: MatchMode,
    pub tick: u32,
    pub snakes: Vec<SnakeView>,
    pub food: Option<Position>,
    pub power_ups: Vec<PowerUp>,
    pub obstacles: Vec<Position>,
    pub outcome: Option<RoundOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeView {
    pub id: SnakeId,
    pub color: String,
    pub body: Vec<Position>,
    pub is_alive: bool,
    pub length: usize,
    pub score: u32,
}

/// Owns every entity in a match and is their sole mutator. Commands go
/// in, events come out; the tick command runs one full simulation step:
/// both snakes move, then collisions, consumption and spawns resolve.
#[derive(Debug, Clone)]
pub struct Arena {
    pub(crate) config: ArenaConfig,
    pub(crate) grid: Grid,
    pub(crate) state: ArenaState,
    pub(crate) mode: MatchMode,
    pub(crate) tick: u32,
    pub(crate) snakes: Vec<Snake>,
    pub(crate) food: Option<Position>,
    pub(crate) power_ups: Vec<PowerUp>,
    pub(crate) obstacles: HashSet<Position>,
    pub(crate) scores: [u32; 2],
    pub(crate) obstacle_mode: bool,
    pub(crate) obstacle_spawn_timer: u32,
    pub(crate) last_outcome: Option<RoundOutcome>,
    pub(crate) rng: PseudoRandom,
}

impl Arena {
    pub fn new(config: ArenaConfig, seed: u64) -> Self {
        let grid = Grid::new(config.tile_count);
        let snakes = vec![
            Snake::new(
                SNAKE_ONE,
                SNAKE_COLORS[0],
                spawn_position(config.tile_count, 0),
                config.start_length,
            ),
            Snake::new(
                SNAKE_TWO,
                SNAKE_COLORS[1],
                spawn_position(config.tile_count, 1),
                config.start_length,
            ),
        ];
        Arena {
            config,
            grid,
            state: ArenaState::Menu,
            mode: MatchMode::AiVsAi,
            tick: 0,
            snakes,
            food: None,
            power_ups: Vec::new(),
            obstacles: HashSet::new(),
            scores: [0, 0],
            obstacle_mode: false,
            obstacle_spawn_timer: 0,
            last_outcome: None,
            rng: PseudoRandom::new(seed),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn state(&self) -> ArenaState {
        self.state
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn food(&self) -> Option<Position> {
        self.food
    }

    pub fn obstacles(&self) -> &HashSet<Position> {
        &self.obstacles
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn snake(&self, snake_id: SnakeId) -> Option<&Snake> {
        self.snakes.iter().find(|s| s.id == snake_id)
    }

    pub fn opponent_of(&self, snake_id: SnakeId) -> Option<&Snake> {
        self.snakes.iter().find(|s| s.id != snake_id)
    }

    pub fn exec_command(&mut self, command: &GameCommand) -> Result<Vec<GameEvent>, GameError> {
        let mut out = Vec::new();
        match command {
            GameCommand::Tick => self.tick_once(&mut out),

            GameCommand::Turn {
                snake_id,
                direction,
            } => {
                let snake = self
                    .snake(*snake_id)
                    .ok_or(GameError::UnknownSnake(*snake_id))?;
                // Only the player-controlled snake accepts input, and a
                // reversal onto its own neck is dropped silently.
                let accepted = self.mode == MatchMode::PlayerVsAi
                    && *snake_id == SNAKE_ONE
                    && snake.is_alive
                    && !direction.is_opposite(snake.direction);
                if accepted {
                    self.apply_event(
                        GameEvent::SnakeTurned {
                            snake_id: *snake_id,
                            direction: *direction,
                        },
                        &mut out,
                    );
                }
            }

            GameCommand::SetObstacleMode { enabled } => {
                self.obstacle_mode = *enabled;
                if !enabled {
                    self.obstacle_spawn_timer = 0;
                    if !self.obstacles.is_empty() {
                        self.apply_event(GameEvent::ObstaclesCleared, &mut out);
                    }
                }
            }

            GameCommand::StartMatch { mode } => out = self.start_match(*mode),

            GameCommand::StopMatch => {
                self.state = ArenaState::Menu;
            }
        }
        Ok(out)
    }

    /// Begin a fresh match: zero the scores, fix the control mode, and
    /// start the first round.
    pub fn start_match(&mut self, mode: MatchMode) -> Vec<GameEvent> {
        self.mode = mode;
        self.scores = [0, 0];
        self.start_round()
    }

    /// Reset the board for a new round. Scores and mode carry over.
    pub(crate) fn start_round(&mut self) -> Vec<GameEvent> {
        let mut out = Vec::new();
        let tile_count = self.config.tile_count;
        let start_length = self.config.start_length;
        for (idx, snake) in self.snakes.iter_mut().enumerate() {
            snake.reset(spawn_position(tile_count, idx), start_length);
        }
        self.obstacles.clear();
        self.power_ups.clear();
        self.obstacle_spawn_timer = 0;
        self.food = None;
        self.last_outcome = None;
        self.apply_event(GameEvent::RoundStarted, &mut out);
        self.spawn_food(&mut out);
        out
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut obstacles: Vec<Position> = self.obstacles.iter().copied().collect();
        obstacles.sort_by_key(|p| (p.y, p.x));
        Snapshot {
            state: self.state,
            mode: self.mode,
            tick: self.tick,
            snakes: self
                .snakes
                .iter()
                .map(|s| SnakeView {
                    id: s.id,
                    color: s.color.clone(),
                    body: s.body.iter().copied().collect(),
                    is_alive: s.is_alive,
                    length: s.len(),
                    score: self.scores[(s.id - 1) as usize],
                })
                .collect(),
            food: self.food,
            power_ups: self.power_ups.clone(),
            obstacles,
            outcome: self.last_outcome,
        }
    }

    fn tick_once(&mut self, out: &mut Vec<GameEvent>) {
        if self.state != ArenaState::Running {
            return;
        }

        // Move phase. Both snakes complete their movement before any
        // collision is evaluated, so neither reacts to the other's
        // same-tick move.
        for idx in 0..self.snakes.len() {
            if !self.snakes[idx].is_alive {
                continue;
            }
            let moves = self.snakes[idx].moves_this_tick(self.tick);
            for _ in 0..moves {
                let direction = self.direction_for(idx);
                self.snakes[idx].advance(direction);
            }
        }

        self.resolve_collisions(out);
        if self.state != ArenaState::Running {
            self.tick += 1;
            return;
        }

        self.resolve_food(out);

        // Timers count down before pickups so a fresh effect lasts its
        // full duration in movement ticks.
        for idx in 0..self.snakes.len() {
            if self.snakes[idx].tick_power_up() {
                let snake_id = self.snakes[idx].id;
                self.apply_event(GameEvent::PowerUpExpired { snake_id }, out);
            }
        }

        self.resolve_power_ups(out);
        self.maybe_spawn_power_up(out);
        self.advance_obstacle_timer(out);

        self.tick += 1;
    }

    /// Heading for one move of the snake at `idx`: buffered player input
    /// for a player-controlled snake, the AI policy otherwise. `None`
    /// keeps the current heading.
    fn direction_for(&mut self, idx: usize) -> Option<Direction> {
        let snake_id = self.snakes[idx].id;
        if self.mode == MatchMode::PlayerVsAi && snake_id == SNAKE_ONE {
            self.snakes[idx].take_buffered_direction()
        } else {
            let mut rng = self.rng.clone();
            let direction = ai::decide(self, snake_id, &mut rng);
            self.rng = rng;
            direction
        }
    }

    fn resolve_collisions(&mut self, out: &mut Vec<GameEvent>) {
        let head1 = self.snakes[0].head();
        let head2 = self.snakes[1].head();

        if head1 == head2 {
            let winner = match self.snakes[0].len().cmp(&self.snakes[1].len()) {
                Ordering::Greater => Some(0),
                Ordering::Less => Some(1),
                Ordering::Equal => None,
            };
            match winner {
                Some(winner_idx) => {
                    let winner_id = self.snakes[winner_idx].id;
                    self.kill(1 - winner_idx, CollisionKind::HeadOn, out);
                    self.finish_round(
                        RoundOutcome::Winner {
                            snake_id: winner_id,
                            cause: CollisionKind::HeadOn,
                        },
                        out,
                    );
                }
                None => {
                    self.kill(0, CollisionKind::Tie, out);
                    self.kill(1, CollisionKind::Tie, out);
                    self.finish_round(
                        RoundOutcome::Draw {
                            cause: CollisionKind::Tie,
                        },
                        out,
                    );
                }
            }
            return;
        }

        // Hazards are evaluated independently for each snake against the
        // post-move board.
        let mut deaths: Vec<(usize, CollisionKind)> = Vec::new();
        for idx in 0..self.snakes.len() {
            if let Some(cause) = self.hazard_for(idx) {
                deaths.push((idx, cause));
            }
        }

        match deaths.as_slice() {
            [] => {}
            &[(idx, cause)] => {
                let winner_id = self.snakes[1 - idx].id;
                self.kill(idx, cause, out);
                self.finish_round(
                    RoundOutcome::Winner {
                        snake_id: winner_id,
                        cause,
                    },
                    out,
                );
            }
            _ => {
                for &(idx, cause) in &deaths {
                    self.kill(idx, cause, out);
                }
                self.finish_round(
                    RoundOutcome::Draw {
                        cause: CollisionKind::Tie,
                    },
                    out,
                );
            }
        }
    }

    fn hazard_for(&self, idx: usize) -> Option<CollisionKind> {
        let snake = &self.snakes[idx];
        let other = &self.snakes[1 - idx];
        let head = snake.head();

        if !self.grid.is_in_bounds(head) {
            Some(CollisionKind::Wall)
        } else if snake.body_contains(head) {
            Some(CollisionKind::SelfCollision)
        } else if other.contains(head) {
            Some(CollisionKind::Opponent)
        } else if self.obstacles.contains(&head) {
            Some(CollisionKind::Obstacle)
        } else {
            None
        }
    }

    fn kill(&mut self, idx: usize, cause: CollisionKind, out: &mut Vec<GameEvent>) {
        let snake_id = self.snakes[idx].id;
        self.apply_event(GameEvent::SnakeDied { snake_id, cause }, out);
    }

    fn finish_round(&mut self, outcome: RoundOutcome, out: &mut Vec<GameEvent>) {
        self.apply_event(GameEvent::RoundOver { outcome }, out);
    }

    fn resolve_food(&mut self, out: &mut Vec<GameEvent>) {
        if let Some(food) = self.food {
            for idx in 0..self.snakes.len() {
                let snake = &self.snakes[idx];
                if snake.is_alive && snake.head() == food {
                    let snake_id = snake.id;
                    self.apply_event(GameEvent::FoodEaten { snake_id, position: food }, out);
                    break;
                }
            }
        }
        // Covers both a consumed food and an earlier failed spawn.
        if self.food.is_none() {
            self.spawn_food(out);
        }
    }

    fn resolve_power_ups(&mut self, out: &mut Vec<GameEvent>) {
        for idx in 0..self.snakes.len() {
            if !self.snakes[idx].is_alive {
                continue;
            }
            let head = self.snakes[idx].head();
            if let Some(power_up) = self.power_ups.iter().find(|p| p.position == head).copied() {
                let snake_id = self.snakes[idx].id;
                self.apply_event(
                    GameEvent::PowerUpCollected {
                        snake_id,
                        position: power_up.position,
                        kind: power_up.kind,
                        duration: power_up.duration,
                    },
                    out,
                );
            }
        }
    }

    fn maybe_spawn_power_up(&mut self, out: &mut Vec<GameEvent>) {
        if !self.rng.chance(self.config.power_up_spawn_chance)
            || self.power_ups.len() >= self.config.max_power_ups
        {
            return;
        }
        let kind = if self.rng.chance(0.5) {
            PowerUpKind::SpeedBoost
        } else {
            PowerUpKind::SlowDown
        };
        let occupied = self.occupied_cells();
        match self.grid.sample_unoccupied(&mut self.rng, &occupied) {
            Ok(position) => {
                let power_up = PowerUp::new(position, kind, self.config.power_up_duration);
                self.apply_event(GameEvent::PowerUpSpawned { power_up }, out);
            }
            Err(err) => warn!(%err, "power-up spawn skipped"),
        }
    }

    fn advance_obstacle_timer(&mut self, out: &mut Vec<GameEvent>) {
        if !self.obstacle_mode {
            return;
        }
        self.obstacle_spawn_timer += 1;
        if self.obstacle_spawn_timer < self.config.obstacle_spawn_interval {
            return;
        }
        self.obstacle_spawn_timer = 0;
        if self.obstacles.len() >= self.max_obstacles() {
            return;
        }
        let occupied = self.occupied_cells();
        match self.grid.sample_unoccupied(&mut self.rng, &occupied) {
            Ok(position) => self.apply_event(GameEvent::ObstacleSpawned { position }, out),
            Err(err) => warn!(%err, "obstacle spawn skipped"),
        }
    }

    fn max_obstacles(&self) -> usize {
        (self.grid.cell_count() / 10) as usize
    }

    fn spawn_food(&mut self, out: &mut Vec<GameEvent>) {
        let occupied = self.occupied_cells();
        match self.grid.sample_unoccupied(&mut self.rng, &occupied) {
            Ok(position) => self.apply_event(GameEvent::FoodSpawned { position }, out),
            Err(err) => warn!(%err, "food spawn skipped, retrying next tick"),
        }
    }

    /// Every cell something currently sits on; used for spawn placement.
    fn occupied_cells(&self) -> HashSet<Position> {
        let mut occupied: HashSet<Position> = HashSet::new();
        for snake in &self.snakes {
            occupied.extend(snake.body.iter().copied());
        }
        occupied.extend(self.obstacles.iter().copied());
        occupied.extend(self.power_ups.iter().map(|p| p.position));
        occupied.extend(self.food);
        occupied
    }

    /// Record `event` in `out` and apply its state change.
    fn apply_event(&mut self, event: GameEvent, out: &mut Vec<GameEvent>) {
        match &event {
            GameEvent::RoundStarted => {
                self.state = ArenaState::Running;
            }

            GameEvent::SnakeTurned {
                snake_id,
                direction,
            } => {
                if let Some(snake) = self.snakes.iter_mut().find(|s| s.id == *snake_id) {
                    snake.buffer_direction(*direction);
                }
            }

            GameEvent::SnakeDied { snake_id, cause } => {
                debug!(snake_id, %cause, "snake died");
                if let Some(snake) = self.snakes.iter_mut().find(|s| s.id == *snake_id) {
                    snake.is_alive = false;
                }
            }

            GameEvent::FoodSpawned { position } => {
                self.food = Some(*position);
            }

            GameEvent::FoodEaten { snake_id, .. } => {
                if let Some(snake) = self.snakes.iter_mut().find(|s| s.id == *snake_id) {
                    snake.grow();
                }
                self.food = None;
            }

            GameEvent::PowerUpSpawned { power_up } => {
                self.power_ups.push(*power_up);
            }

            GameEvent::PowerUpCollected {
                snake_id,
                position,
                kind,
                duration,
            } => {
                debug!(snake_id, ?kind, "power-up collected");
                self.power_ups.retain(|p| p.position != *position);
                if let Some(snake) = self.snakes.iter_mut().find(|s| s.id == *snake_id) {
                    snake.apply_power_up(*kind, *duration);
                }
            }

            GameEvent::PowerUpExpired { .. } => {}

            GameEvent::ObstacleSpawned { position } => {
                self.obstacles.insert(*position);
            }

            GameEvent::ObstaclesCleared => {
                self.obstacles.clear();
            }

            GameEvent::RoundOver { outcome } => {
                info!(?outcome, "round over");
                self.state = ArenaState::GameOver;
                self.last_outcome = Some(*outcome);
                if let RoundOutcome::Winner { snake_id, .. } = outcome {
                    self.scores[(*snake_id - 1) as usize] += 1;
                }
            }
        }
        out.push(event);
    }
}

fn spawn_position(tile_count: i16, idx: usize) -> Position {
    match idx {
        0 => Position::new(SPAWN_MARGIN, SPAWN_MARGIN),
        _ => Position::new(
            tile_count - 1 - SPAWN_MARGIN,
            tile_count - 1 - SPAWN_MARGIN,
        ),
    }
}
