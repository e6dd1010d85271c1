//! Self-play match generation CLI.
//!
//! Plays matches with the engine on both sides and prints one JSON record
//! per match.
//!
//! Usage:
//!   cargo run --release --bin selfplay -- --games 20 --threads 8 --seed 1

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;

use broomstick::config::EngineConfig;
use broomstick::selfplay::{self, SelfPlayConfig};

#[derive(Parser)]
#[command(name = "selfplay")]
#[command(about = "Play engine-versus-engine matches on the reference rules")]
struct Args {
    /// Number of matches to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Search time per decision in milliseconds
    #[arg(long, default_value_t = 50)]
    movetime: u64,

    /// Round after which an undecided match is stopped
    #[arg(long, default_value_t = 60)]
    max_rounds: u32,

    /// Round in which the snitch appears
    #[arg(long, default_value_t = 10)]
    snitch_round: u32,

    /// Worker threads
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Random seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let engine = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let config = SelfPlayConfig {
        num_games: args.games,
        movetime_ms: args.movetime,
        max_rounds: args.max_rounds,
        snitch_round: args.snitch_round,
        threads: args.threads,
        seed: args.seed,
        engine,
    };

    let start = Instant::now();
    let games = selfplay::run_self_play(&config)?;
    let left_wins = games.iter().filter(|g| g.left_score > g.right_score).count();
    let right_wins = games.iter().filter(|g| g.right_score > g.left_score).count();
    info!(
        games = games.len(),
        left_wins,
        right_wins,
        draws = games.len() - left_wins - right_wins,
        secs = start.elapsed().as_secs_f64(),
        "self-play complete"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            selfplay::write_jsonl(&games, &mut BufWriter::new(file))?;
        }
        None => {
            let stdout = io::stdout();
            selfplay::write_jsonl(&games, &mut BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}
