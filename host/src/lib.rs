//! Headless arena host.
//!
//! Runs scripted sessions against the deterministic core, records and
//! verifies input tapes, and checks that independent instances agree.

use std::{env, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use arena_core::sim::{replay_with_checkpoints, ReplayCheckpoint};
use arena_core::tape::{serialize_tape, MAX_FRAMES_DEFAULT};
use arena_core::{
    verify_tape, FrameInput, OwnerId, SimConfig, Simulation, VerificationJournal,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub mod controller;

use controller::{BotKind, Controller};

pub const MAX_FRAMES_ENV: &str = "ARENA_MAX_FRAMES";
pub const PARITY_INSTANCES_ENV: &str = "ARENA_PARITY_INSTANCES";
pub const PARITY_INSTANCES_DEFAULT: usize = 4;

/// Frames a dead bot waits before it reconnects.
pub const RESPAWN_DELAY_FRAMES: u32 = 90;

/// Upper bound on bots so one frame's events always fit a tape frame.
pub const MAX_BOTS: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub max_frames: u32,
    pub parity_instances: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            max_frames: MAX_FRAMES_DEFAULT,
            parity_instances: PARITY_INSTANCES_DEFAULT,
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Unset, unparsable and zero values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_frames: read_u32(&lookup, MAX_FRAMES_ENV, defaults.max_frames),
            parity_instances: read_usize(&lookup, PARITY_INSTANCES_ENV, defaults.parity_instances),
        }
    }
}

fn read_u32<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: u32) -> u32 {
    match lookup(name) {
        None => default,
        Some(value) => match value.trim().parse::<u32>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                tracing::warn!(name, value = %value, default, "ignoring invalid env value");
                default
            }
        },
    }
}

fn read_usize<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, default: usize) -> usize {
    match lookup(name) {
        None => default,
        Some(value) => match value.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                tracing::warn!(name, value = %value, default, "ignoring invalid env value");
                default
            }
        },
    }
}

/// Loads a JSON `SimConfig` (missing fields take defaults), or the defaults
/// when no path is given. The result is always validated.
pub fn load_sim_config(path: Option<&Path>) -> Result<SimConfig> {
    let config = match path {
        Some(path) => {
            let raw = fs::read(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            serde_json::from_slice::<SimConfig>(&raw)
                .with_context(|| format!("failed to parse config json: {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    config.validate().context("invalid simulation config")?;
    Ok(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub seed: u32,
    pub frames: u32,
    pub bots: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub seed: u32,
    pub frames: u32,
    pub bots: u32,
    pub final_digest: u64,
    pub live_actors: u32,
    pub deaths: u32,
    pub respawns: u32,
    pub food_eaten: u32,
    pub food_dropped: u32,
    pub longest_length: u32,
}

/// A recorded session: the inputs as fed, the encoded tape, and the journal
/// produced by verifying that tape.
#[derive(Debug, Clone)]
pub struct Session {
    pub inputs: Vec<FrameInput>,
    pub tape: Vec<u8>,
    pub summary: SessionSummary,
    pub journal: VerificationJournal,
}

struct Bot {
    owner: OwnerId,
    controller: Box<dyn Controller>,
    died_at: Option<u32>,
}

fn bot_seed(seed: u32, index: u32) -> u32 {
    seed ^ (index + 1).wrapping_mul(0x9E37_79B9)
}

/// Plays `options.frames` frames with scripted bots, then records the tape
/// and verifies it.
pub fn run_session(config: &SimConfig, options: &SessionOptions) -> Result<Session> {
    if options.bots == 0 || options.bots > MAX_BOTS {
        bail!("bot count must be in 1..={MAX_BOTS}, got {}", options.bots);
    }

    let mut sim = Simulation::new(config.clone(), options.seed)
        .context("failed to create simulation")?;
    let mut bots: Vec<Bot> = (0..options.bots)
        .map(|index| Bot {
            owner: OwnerId(index + 1),
            controller: BotKind::for_index(index).build(bot_seed(options.seed, index)),
            died_at: None,
        })
        .collect();

    let mut inputs = Vec::with_capacity(options.frames as usize);
    let mut summary = SessionSummary {
        seed: options.seed,
        frames: options.frames,
        bots: options.bots,
        final_digest: 0,
        live_actors: 0,
        deaths: 0,
        respawns: 0,
        food_eaten: 0,
        food_dropped: 0,
        longest_length: 0,
    };

    for frame in 1..=options.frames {
        let mut input = FrameInput::default();
        for bot in &mut bots {
            match (frame, bot.died_at) {
                (1, _) => input.connects.push(bot.owner),
                (_, Some(died)) if frame >= died + RESPAWN_DELAY_FRAMES => {
                    input.connects.push(bot.owner);
                    summary.respawns += 1;
                }
                _ => {}
            }
            if let Some(actor) = sim.actor(bot.owner) {
                let control = bot.controller.control(frame, actor, config);
                input.controls.insert(bot.owner, control);
            }
        }

        let report = sim.step(&input);
        for &owner in &report.spawned {
            if let Some(bot) = bots.iter_mut().find(|bot| bot.owner == owner) {
                bot.died_at = None;
            }
        }
        for death in &report.deaths {
            if let Some(bot) = bots.iter_mut().find(|bot| bot.owner == death.owner) {
                bot.died_at = Some(frame);
            }
            tracing::debug!(owner = %death.owner, frame, cause = ?death.cause, "bot died");
        }
        summary.deaths += report.deaths.len() as u32;
        summary.food_eaten += report.food_eaten;
        summary.food_dropped += report.food_dropped;
        for bot in &bots {
            if let Some(actor) = sim.actor(bot.owner) {
                summary.longest_length = summary.longest_length.max(actor.length);
            }
        }
        inputs.push(input);
    }

    summary.final_digest = sim.digest();
    summary.live_actors = sim.store().actor_count() as u32;

    let tape = serialize_tape(options.seed, &inputs, summary.final_digest)
        .context("failed to encode tape")?;
    let journal = verify_tape(config, &tape, options.frames.max(1))
        .context("recorded tape failed self-verification")?;

    tracing::info!(
        seed = format!("0x{:08x}", summary.seed),
        frames = summary.frames,
        bots = summary.bots,
        deaths = summary.deaths,
        food_eaten = summary.food_eaten,
        digest = format!("0x{:016x}", summary.final_digest),
        tape_bytes = tape.len(),
        "session recorded"
    );

    Ok(Session {
        inputs,
        tape,
        summary,
        journal,
    })
}

pub fn write_tape(path: &Path, tape: &[u8]) -> Result<()> {
    fs::write(path, tape).with_context(|| format!("failed writing tape: {}", path.display()))
}

pub fn read_tape(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read tape: {}", path.display()))
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).context("failed to serialize json")?;
    fs::write(path, json).with_context(|| format!("failed writing json output: {}", path.display()))
}

pub fn verify_file(path: &Path, config: &SimConfig, max_frames: u32) -> Result<VerificationJournal> {
    let tape = read_tape(path)?;
    let journal = verify_tape(config, &tape, max_frames)
        .with_context(|| format!("tape failed verification: {}", path.display()))?;
    tracing::info!(
        seed = format!("0x{:08x}", journal.seed),
        frames = journal.frame_count,
        digest = format!("0x{:016x}", journal.final_digest),
        "tape verified"
    );
    Ok(journal)
}

/// Reorders each frame's lifecycle events the way instance `instance` might
/// receive them. Instance 0 sees the original order.
pub fn permute_arrivals(inputs: &[FrameInput], instance: usize) -> Vec<FrameInput> {
    inputs
        .iter()
        .map(|input| {
            let mut permuted = input.clone();
            permute(&mut permuted.connects, instance);
            permute(&mut permuted.disconnects, instance);
            permuted
        })
        .collect()
}

fn permute<T>(events: &mut [T], instance: usize) {
    if events.len() < 2 || instance == 0 {
        return;
    }
    if instance % 2 == 1 {
        events.reverse();
    }
    let len = events.len();
    events.rotate_left(instance / 2 % len);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParityReport {
    pub instances: usize,
    pub frames: u32,
    pub final_digests: Vec<u64>,
    /// Earliest checkpoint frame where any instance disagreed with instance 0.
    pub first_divergence: Option<u32>,
}

impl ParityReport {
    pub fn is_consistent(&self) -> bool {
        self.first_divergence.is_none()
    }
}

pub const PARITY_CHECKPOINT_EVERY: u32 = 60;

/// Replays `inputs` on `instances` independent simulations in parallel, each
/// with a different arrival order, and compares their checkpoints.
pub fn run_parity(
    config: &SimConfig,
    seed: u32,
    inputs: &[FrameInput],
    instances: usize,
) -> Result<ParityReport> {
    if instances < 2 {
        bail!("parity needs at least two instances, got {instances}");
    }

    let runs: Vec<Vec<ReplayCheckpoint>> = (0..instances)
        .into_par_iter()
        .map(|instance| {
            let permuted = permute_arrivals(inputs, instance);
            replay_with_checkpoints(config, seed, &permuted, PARITY_CHECKPOINT_EVERY)
                .map_err(|err| anyhow!("instance {instance} failed to start: {err}"))
        })
        .collect::<Result<_>>()?;

    let baseline = &runs[0];
    let first_divergence = runs[1..]
        .iter()
        .filter_map(|run| {
            baseline
                .iter()
                .zip(run)
                .find(|(a, b)| a != b)
                .map(|(a, _)| a.frame)
        })
        .min();

    let final_digests = runs
        .iter()
        .map(|run| run.last().map(|c| c.digest).unwrap_or_default())
        .collect();

    let report = ParityReport {
        instances,
        frames: inputs.len() as u32,
        final_digests,
        first_divergence,
    };
    match report.first_divergence {
        None => tracing::info!(instances, frames = report.frames, "instances agree"),
        Some(frame) => tracing::warn!(instances, frame, "instances diverged"),
    }
    Ok(report)
}
