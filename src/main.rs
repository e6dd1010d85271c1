//! Broomstick: a decision engine for the team-sport server protocol.
//!
//! Reads one JSON server message per line from stdin and writes one JSON
//! client message per line to stdout. Diagnostics go to stderr.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::EnvFilter;

use broomstick::config::EngineConfig;
use broomstick::engine::{Engine, Flow};
use broomstick::movegen::StandardRules;
use broomstick::protocol::{format_message, parse_message, Outbound};

#[derive(Parser)]
#[command(name = "broomstick")]
#[command(about = "Decision engine agent speaking the JSON line protocol on stdio")]
struct Args {
    /// Team name announced by the server for our side
    #[arg(long)]
    team_name: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(name) = args.team_name {
        config.team_name = name;
    }
    let rules = StandardRules::new(config.rules.clone());
    info!(team = %config.team_name, depth = config.search.max_depth, "starting");

    let (tx, rx) = mpsc::channel::<Outbound>();
    let writer = thread::spawn(move || -> Result<()> {
        let stdout = io::stdout();
        let mut out = io::BufWriter::new(stdout.lock());
        for message in rx {
            let line = format_message(&message)?;
            writeln!(out, "{line}")?;
            out.flush()?;
        }
        Ok(())
    });

    let mut engine = Engine::new(config, Arc::new(rules), tx);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let message = match parse_message(&line) {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(err) => {
                warn!(%err, "ignoring input line");
                continue;
            }
        };
        if engine.handle(message) == Flow::Finished {
            break;
        }
        debug!(status = ?engine.status(), "message handled");
    }

    engine.join_worker();
    drop(engine);
    match writer.join() {
        Ok(result) => result,
        Err(_) => {
            error!("writer thread panicked");
            anyhow::bail!("writer thread panicked")
        }
    }
}
