//! Benchmark binary: records one scripted session, then times plain replay and
//! strict verification of the same tape.
//!
//! Usage:
//!   cargo run --release --bin benchmark -- --frames 18000 --bots 16

use std::time::Instant;

use anyhow::{Context, Result};
use arena_core::sim::replay;
use arena_core::verify_tape;
use arena_host::{load_sim_config, run_session, SessionOptions};
use clap::Parser;

#[derive(Parser)]
#[command(name = "arena-benchmark")]
#[command(about = "Benchmark arena replay and verification")]
struct Args {
    #[arg(long, default_value_t = 0xDEAD_BEEF)]
    seed: u32,
    #[arg(long, default_value_t = 18_000)]
    frames: u32,
    #[arg(long, default_value_t = 16)]
    bots: u32,
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn per_second(frames: u32, secs: f64) -> f64 {
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_sim_config(args.config.as_deref())?;

    println!("Recording session...");
    let start = Instant::now();
    let session = run_session(
        &config,
        &SessionOptions {
            seed: args.seed,
            frames: args.frames,
            bots: args.bots,
        },
    )?;
    let record_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let result = replay(&config, args.seed, &session.inputs).context("replay failed")?;
    let replay_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let journal = verify_tape(&config, &session.tape, args.frames.max(1))
        .context("verification failed")?;
    let verify_secs = start.elapsed().as_secs_f64();

    println!();
    println!("=== BENCHMARK RESULTS ===");
    println!("  Frames:          {}", args.frames);
    println!("  Bots:            {}", args.bots);
    println!("  Tape bytes:      {}", session.tape.len());
    println!("  Final segments:  {}", result.segments);
    println!("  Final food:      {}", result.food);
    println!(
        "  Record:          {:.3}s ({:.0} frames/s, includes self-verify)",
        record_secs,
        per_second(args.frames, record_secs)
    );
    println!(
        "  Replay:          {:.3}s ({:.0} frames/s)",
        replay_secs,
        per_second(args.frames, replay_secs)
    );
    println!(
        "  Strict verify:   {:.3}s ({:.0} frames/s)",
        verify_secs,
        per_second(args.frames, verify_secs)
    );
    println!("  Digest:          0x{:016x}", journal.final_digest);

    Ok(())
}
