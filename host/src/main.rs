//! Arena host CLI: records scripted sessions to tapes, verifies tapes, and
//! runs cross-instance parity checks.
//!
//! Usage:
//!   cargo run --release -p arena-host -- simulate --frames 3600 --bots 8 --tape-out run.tape
//!   cargo run --release -p arena-host -- verify run.tape
//!   cargo run --release -p arena-host -- parity --instances 8

use std::path::PathBuf;

use anyhow::{bail, Result};
use arena_host::{
    load_sim_config, run_parity, run_session, verify_file, write_json, write_tape, HostConfig,
    SessionOptions,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arena-host")]
#[command(about = "Record, replay and verify deterministic arena sessions")]
struct Cli {
    /// JSON simulation config; missing fields take defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a scripted session and record its tape
    Simulate {
        #[arg(long, default_value_t = 0xDEAD_BEEF)]
        seed: u32,
        #[arg(long, default_value_t = 3_600)]
        frames: u32,
        #[arg(long, default_value_t = 8)]
        bots: u32,
        #[arg(long)]
        tape_out: Option<PathBuf>,
        #[arg(long)]
        journal_out: Option<PathBuf>,
    },
    /// Replay a tape and check its final digest
    Verify {
        tape: PathBuf,
        /// Defaults to ARENA_MAX_FRAMES
        #[arg(long)]
        max_frames: Option<u32>,
        #[arg(long)]
        journal_out: Option<PathBuf>,
    },
    /// Replay one session on several instances with shuffled arrivals
    Parity {
        #[arg(long, default_value_t = 0xDEAD_BEEF)]
        seed: u32,
        #[arg(long, default_value_t = 1_800)]
        frames: u32,
        #[arg(long, default_value_t = 8)]
        bots: u32,
        /// Defaults to ARENA_PARITY_INSTANCES
        #[arg(long)]
        instances: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let host = HostConfig::from_env();
    let config = load_sim_config(cli.config.as_deref())?;

    match cli.command {
        Command::Simulate {
            seed,
            frames,
            bots,
            tape_out,
            journal_out,
        } => {
            if frames > host.max_frames {
                bail!("--frames {frames} exceeds the frame limit {}", host.max_frames);
            }
            let session = run_session(&config, &SessionOptions { seed, frames, bots })?;
            let summary = &session.summary;

            println!("Session recorded.");
            println!("  Seed:          0x{:08x}", summary.seed);
            println!("  Frames:        {}", summary.frames);
            println!("  Bots:          {}", summary.bots);
            println!("  Live actors:   {}", summary.live_actors);
            println!("  Deaths:        {}", summary.deaths);
            println!("  Respawns:      {}", summary.respawns);
            println!("  Food eaten:    {}", summary.food_eaten);
            println!("  Food dropped:  {}", summary.food_dropped);
            println!("  Longest:       {}", summary.longest_length);
            println!("  Final digest:  0x{:016x}", summary.final_digest);
            println!("  Tape checksum: 0x{:08x}", session.journal.tape_checksum);

            if let Some(path) = tape_out {
                write_tape(&path, &session.tape)?;
                println!("  Tape:          {} ({} bytes)", path.display(), session.tape.len());
            }
            if let Some(path) = journal_out {
                write_json(&path, &session.journal)?;
                println!("  Journal JSON:  {}", path.display());
            }
        }
        Command::Verify {
            tape,
            max_frames,
            journal_out,
        } => {
            let journal = verify_file(&tape, &config, max_frames.unwrap_or(host.max_frames))?;

            println!("Tape verified.");
            println!("  Seed:          0x{:08x}", journal.seed);
            println!("  Frames:        {}", journal.frame_count);
            println!("  Final digest:  0x{:016x}", journal.final_digest);
            println!("  Final RNG:     0x{:08x}", journal.final_rng_state);
            println!("  Tape checksum: 0x{:08x}", journal.tape_checksum);
            println!("  Live actors:   {}", journal.live_actors);
            println!("  Deaths:        {}", journal.deaths);

            if let Some(path) = journal_out {
                write_json(&path, &journal)?;
                println!("  Journal JSON:  {}", path.display());
            }
        }
        Command::Parity {
            seed,
            frames,
            bots,
            instances,
        } => {
            if frames > host.max_frames {
                bail!("--frames {frames} exceeds the frame limit {}", host.max_frames);
            }
            let instances = instances.unwrap_or(host.parity_instances);
            let session = run_session(&config, &SessionOptions { seed, frames, bots })?;
            let report = run_parity(&config, seed, &session.inputs, instances)?;

            println!("Parity over {} instances, {} frames.", report.instances, report.frames);
            for (instance, digest) in report.final_digests.iter().enumerate() {
                println!("  Instance {instance:>3}:  0x{digest:016x}");
            }
            if let Some(frame) = report.first_divergence {
                bail!("instances diverged by frame {frame}");
            }
            println!("  All instances agree.");
        }
    }

    Ok(())
}
