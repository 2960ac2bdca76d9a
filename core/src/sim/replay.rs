use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::Simulation;
use crate::config::SimConfig;
use crate::error::{SimError, VerifyError};
use crate::types::FrameInput;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub frame_count: u32,
    pub final_digest: u64,
    pub final_rng_state: u32,
    pub live_actors: u32,
    pub segments: u32,
    pub food: u32,
    pub deaths: u32,
    pub food_eaten: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCheckpoint {
    pub frame: u32,
    pub digest: u64,
    pub rng_state: u32,
    pub actors: u32,
    pub segments: u32,
    pub food: u32,
    pub total_length: u64,
}

#[derive(Default)]
struct Totals {
    deaths: u32,
    food_eaten: u32,
}

fn finish(sim: &Simulation, totals: Totals) -> ReplayResult {
    ReplayResult {
        frame_count: sim.frame(),
        final_digest: sim.digest(),
        final_rng_state: sim.rng_state(),
        live_actors: sim.store().actor_count() as u32,
        segments: sim.store().segment_count() as u32,
        food: sim.store().food_count() as u32,
        deaths: totals.deaths,
        food_eaten: totals.food_eaten,
    }
}

fn checkpoint(sim: &Simulation) -> ReplayCheckpoint {
    let snapshot = sim.snapshot();
    ReplayCheckpoint {
        frame: snapshot.frame,
        digest: snapshot.digest(),
        rng_state: snapshot.rng_state,
        actors: snapshot.actors.len() as u32,
        segments: snapshot.segments.len() as u32,
        food: snapshot.food.len() as u32,
        total_length: snapshot.actors.iter().map(|a| a.length as u64).sum(),
    }
}

pub fn replay(config: &SimConfig, seed: u32, frames: &[FrameInput]) -> Result<ReplayResult, SimError> {
    let mut sim = Simulation::new(config.clone(), seed)?;
    let mut totals = Totals::default();
    for input in frames {
        let report = sim.step(input);
        totals.deaths += report.deaths.len() as u32;
        totals.food_eaten += report.food_eaten;
    }
    Ok(finish(&sim, totals))
}

/// Like `replay`, but checks every world invariant after each frame and
/// stops at the first violation.
pub fn replay_strict(
    config: &SimConfig,
    seed: u32,
    frames: &[FrameInput],
) -> Result<ReplayResult, VerifyError> {
    let mut sim = Simulation::new(config.clone(), seed)
        .map_err(|error| VerifyError::Sim { frame: 0, error })?;
    sim.validate()
        .map_err(|rule| VerifyError::RuleViolation { frame: 0, rule })?;

    let mut totals = Totals::default();
    for input in frames {
        let report = sim.step(input);
        totals.deaths += report.deaths.len() as u32;
        totals.food_eaten += report.food_eaten;
        sim.validate().map_err(|rule| VerifyError::RuleViolation {
            frame: report.frame,
            rule,
        })?;
    }
    Ok(finish(&sim, totals))
}

/// Checkpoints at frame 0, every `every` frames, and the final frame.
pub fn replay_with_checkpoints(
    config: &SimConfig,
    seed: u32,
    frames: &[FrameInput],
    every: u32,
) -> Result<Vec<ReplayCheckpoint>, SimError> {
    let every = every.max(1);
    let mut sim = Simulation::new(config.clone(), seed)?;
    let mut checkpoints = Vec::with_capacity(frames.len() / every as usize + 2);
    checkpoints.push(checkpoint(&sim));

    for input in frames {
        sim.step(input);
        if sim.frame() % every == 0 {
            checkpoints.push(checkpoint(&sim));
        }
    }
    if checkpoints.last().map(|c| c.frame) != Some(sim.frame()) {
        checkpoints.push(checkpoint(&sim));
    }
    Ok(checkpoints)
}
