//! Xorshift32 PRNG and the seeded spawn source built on it.
//!
//! Algorithm: x ^= x << 13; x ^= x >> 17; x ^= x << 5;
//! Every site that predicts gameplay must be seeded identically.

use crate::config::SimConfig;
use crate::constants::COLOR_PALETTE;
use crate::fixed_point::IVec2;
use crate::types::Color;

#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }

    pub fn next_int(&mut self, max: u32) -> u32 {
        self.next() % max
    }

    pub fn next_range(&mut self, min: i32, max_exclusive: i32) -> i32 {
        debug_assert!(max_exclusive > min);
        let span = (max_exclusive - min) as u32;
        min + self.next_int(span) as i32
    }
}

/// Supplies every random-derived value the simulation consumes.
///
/// Implementations must be replayable: two sites fed the same calls in the
/// same order must hand back the same values.
pub trait SpawnSource {
    fn pick_color(&mut self) -> Color;
    fn spawn_point(&mut self, config: &SimConfig) -> IVec2;
    fn food_point(&mut self, config: &SimConfig) -> IVec2;
    fn state(&self) -> u32;
}

#[derive(Clone, Debug)]
pub struct SeededSpawner {
    rng: SeededRng,
}

impl SeededSpawner {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed),
        }
    }
}

impl SpawnSource for SeededSpawner {
    fn pick_color(&mut self) -> Color {
        let index = self.rng.next_int(COLOR_PALETTE.len() as u32) as usize;
        Color(COLOR_PALETTE[index])
    }

    fn spawn_point(&mut self, config: &SimConfig) -> IVec2 {
        let pad = config.spawn_padding;
        let x = self.rng.next_range(pad, config.arena_width - pad);
        let y = self.rng.next_range(pad, config.arena_height - pad);
        IVec2::new(x, y)
    }

    fn food_point(&mut self, config: &SimConfig) -> IVec2 {
        let x = self.rng.next_range(config.food_radius, config.arena_width - config.food_radius);
        let y = self.rng.next_range(config.food_radius, config.arena_height - config.food_radius);
        IVec2::new(x, y)
    }

    fn state(&self) -> u32 {
        self.rng.state()
    }
}
