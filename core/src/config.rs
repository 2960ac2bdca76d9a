use serde::{Deserialize, Serialize};

use crate::constants::{
    ACTOR_RADIUS, ARENA_HEIGHT, ARENA_WIDTH, BASE_SPEED_FX, BOOST_COST_PERIOD_FRAMES,
    BOOST_SPEED_FX, FOOD_CAP, FOOD_DROP_OFFSET, FOOD_RADIUS, FOOD_SPAWN_INTERVAL_FRAMES,
    FRAME_RATE, INITIAL_FOOD, INITIAL_LENGTH, MIN_BOOST_LENGTH, SEGMENT_RADIUS,
    SEGMENT_SPAWN_INTERVAL_FRAMES, SPAWN_PADDING, TARGET_LIMIT, TURN_RATE_FX,
};
use crate::error::ConfigError;
use crate::fixed_point::{fx_from_int, Fx, FX_ONE};

/// Every tunable the simulation reads. Both sites of a session must run with
/// an identical config; it is part of what makes two runs comparable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena_width: i32,
    pub arena_height: i32,
    pub spawn_padding: i32,
    pub frame_rate: i32,
    pub actor_radius: i32,
    pub segment_radius: i32,
    pub food_radius: i32,
    pub initial_length: u32,
    pub min_boost_length: u32,
    pub base_speed: Fx,
    pub boost_speed: Fx,
    pub turn_rate: Fx,
    pub boost_cost_period: u32,
    pub segment_spawn_interval: u32,
    pub food_drop_offset: i32,
    pub food_cap: usize,
    pub initial_food: usize,
    /// Frames between periodic food spawns; 0 disables periodic spawning.
    pub food_spawn_interval: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            spawn_padding: SPAWN_PADDING,
            frame_rate: FRAME_RATE,
            actor_radius: ACTOR_RADIUS,
            segment_radius: SEGMENT_RADIUS,
            food_radius: FOOD_RADIUS,
            initial_length: INITIAL_LENGTH,
            min_boost_length: MIN_BOOST_LENGTH,
            base_speed: BASE_SPEED_FX,
            boost_speed: BOOST_SPEED_FX,
            turn_rate: TURN_RATE_FX,
            boost_cost_period: BOOST_COST_PERIOD_FRAMES,
            segment_spawn_interval: SEGMENT_SPAWN_INTERVAL_FRAMES,
            food_drop_offset: FOOD_DROP_OFFSET,
            food_cap: FOOD_CAP,
            initial_food: INITIAL_FOOD,
            food_spawn_interval: FOOD_SPAWN_INTERVAL_FRAMES,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arena_width <= 0
            || self.arena_height <= 0
            || self.arena_width > TARGET_LIMIT
            || self.arena_height > TARGET_LIMIT
        {
            return Err(ConfigError::ArenaSize);
        }
        if self.spawn_padding < self.actor_radius
            || self.arena_width <= self.spawn_padding * 2
            || self.arena_height <= self.spawn_padding * 2
        {
            return Err(ConfigError::SpawnPadding);
        }
        if self.frame_rate <= 0 || self.frame_rate > 1_000 {
            return Err(ConfigError::FrameRate);
        }
        if self.actor_radius <= 0 || self.segment_radius <= 0 || self.food_radius <= 0 {
            return Err(ConfigError::Radius);
        }
        if self.arena_width <= self.food_radius * 2
            || self.arena_height <= self.food_radius * 2
            || self.segment_radius > self.spawn_padding
        {
            return Err(ConfigError::Radius);
        }
        if self.initial_length == 0 || self.min_boost_length >= self.initial_length {
            return Err(ConfigError::BoostLength);
        }
        // speed * frame_rate is the requested velocity; keep it a valid Q16.16 value.
        let velocity_limit = fx_from_int(TARGET_LIMIT) as i64;
        for speed in [self.base_speed, self.boost_speed] {
            if speed <= 0 || speed as i64 * self.frame_rate as i64 > velocity_limit {
                return Err(ConfigError::Speed);
            }
        }
        if self.turn_rate <= 0 || self.turn_rate > FX_ONE {
            return Err(ConfigError::TurnRate);
        }
        if self.boost_cost_period == 0 {
            return Err(ConfigError::BoostCostPeriod);
        }
        if self.segment_spawn_interval == 0 {
            return Err(ConfigError::SegmentSpawnInterval);
        }
        // A drop point may sit one offset outside the arena before clamping.
        if self.food_drop_offset < 0
            || self.food_drop_offset > self.arena_width.max(self.arena_height)
        {
            return Err(ConfigError::FoodDropOffset);
        }
        if self.initial_food > self.food_cap {
            return Err(ConfigError::FoodCap);
        }
        Ok(())
    }

    /// Config used by scenario tests: no ambient food, so nothing but the
    /// scenario itself touches lengths.
    pub fn without_food() -> Self {
        Self {
            initial_food: 0,
            food_spawn_interval: 0,
            ..Self::default()
        }
    }
}
