/// Default arena side length in tiles
pub const DEFAULT_TILE_COUNT: i16 = 30;

/// Distance of each snake's spawn point from its nearest corner
pub const SPAWN_MARGIN: i16 = 5;

/// Body length both snakes start a round with
pub const START_LENGTH: usize = 5;

/// Default simulation rate in moves per second
pub const DEFAULT_TICK_RATE: u16 = 15;

/// Power-up effect duration in ticks
pub const POWER_UP_DURATION: u32 = 200;

/// Per-tick probability of a new power-up appearing
pub const POWER_UP_SPAWN_CHANCE: f32 = 0.005;

/// Maximum power-ups on the board at once
pub const MAX_POWER_UPS: usize = 2;

/// Ticks between obstacle spawns while obstacle mode is enabled
pub const OBSTACLE_SPAWN_INTERVAL: u32 = 50;

/// Probability that a long snake passes up a safe path to food
pub const FOOD_DETERRENT_CHANCE: f32 = 0.1;

/// Body length at which the food deterrent starts applying
pub const FOOD_DETERRENT_LENGTH: usize = 15;

/// Wall-clock delay before a finished round restarts, in milliseconds
pub const ROUND_RESET_DELAY_MS: i64 = 2000;

/// Lowest accepted tick rate in moves per second
pub const MIN_TICK_RATE: u16 = 1;

/// Highest accepted tick rate in moves per second
pub const MAX_TICK_RATE: u16 = 60;

/// Uniform samples per board cell before giving up on a spawn
pub const SPAWN_ATTEMPT_FACTOR: u32 = 4;
