//! Gameplay constants. `SimConfig::default()` is built from these.
//!
//! Distances are world units; speeds are units per frame in Q16.16.

use crate::fixed_point::Fx;

// Arena: [0, WIDTH] x [0, HEIGHT]
pub const ARENA_WIDTH: i32 = 4_000;
pub const ARENA_HEIGHT: i32 = 4_000;
pub const SPAWN_PADDING: i32 = 300;

pub const FRAME_RATE: i32 = 60;

// Radii (units)
pub const ACTOR_RADIUS: i32 = 10;
pub const SEGMENT_RADIUS: i32 = 8;
pub const FOOD_RADIUS: i32 = 4;

// Length
pub const INITIAL_LENGTH: u32 = 15;
pub const MIN_BOOST_LENGTH: u32 = 10;

// Q16.16 speeds
pub const BASE_SPEED_FX: Fx = 163_840; // 2.5 units/frame -> 150 units/s
pub const BOOST_SPEED_FX: Fx = 327_680; // 5.0 units/frame -> 300 units/s

// Q16.16 blend factor per frame
pub const TURN_RATE_FX: Fx = 8_192; // 0.125

// Frame-count timers
pub const BOOST_COST_PERIOD_FRAMES: u32 = 10;
pub const SEGMENT_SPAWN_INTERVAL_FRAMES: u32 = 3;
pub const FOOD_SPAWN_INTERVAL_FRAMES: u32 = 30;

// Food
pub const FOOD_DROP_OFFSET: i32 = 20;
pub const FOOD_CAP: usize = 512;
pub const INITIAL_FOOD: usize = 128;

/// Controller targets are clamped to this many units on each axis, and no
/// arena may be wider or taller. Differences of two in-range points then
/// still fit a Q16.16 `i32`.
pub const TARGET_LIMIT: i32 = 16_000;

pub const COLOR_PALETTE: [u32; 8] = [
    0x00E6_3946,
    0x00F4_A261,
    0x00E9_C46A,
    0x002A_9D8F,
    0x0026_4653,
    0x008E_CAE6,
    0x00B5_179E,
    0x0080_ED99,
];
