//! foldpow miner CLI
//!
//! Builds the word table, commits the puzzle header, searches for a proof on
//! all cores and prints the winning nonce and digest.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use foldpow::{word_to_hex, MinerConfig, Puzzle};

#[derive(Parser)]
#[command(name = "foldpow")]
#[command(version)]
#[command(about = "Memory-hard polynomial-fold proof-of-work miner")]
struct Cli {
    /// JSON config file (see `MinerConfig`)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed phrase for the word table
    #[arg(long)]
    seed: Option<String>,

    /// Number of words in the table
    #[arg(long)]
    table_words: Option<usize>,

    /// Target as (2^256 - 1) >> SHIFT
    #[arg(long)]
    target_shift: Option<u32>,

    /// First nonce to try
    #[arg(long)]
    start_nonce: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MinerConfig> {
    let mut config = match &cli.config {
        Some(path) => MinerConfig::from_json_file(path)?,
        None => MinerConfig::default(),
    };
    if let Some(threads) = cli.threads {
        config.threads = Some(threads);
    }
    if let Some(seed) = &cli.seed {
        config.seed = seed.clone();
    }
    if let Some(words) = cli.table_words {
        config.table_words = words;
    }
    if let Some(shift) = cli.target_shift {
        config.header.target = None;
        config.header.target_shift = shift;
    }
    if let Some(start) = cli.start_nonce {
        config.start_nonce = start.into();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    let started = Instant::now();
    let table = config.build_table()?;
    log::info!(
        target: "foldpow",
        "table ready in {:.2}s",
        started.elapsed().as_secs_f64()
    );

    let header = config.build_header()?;
    let puzzle = Puzzle::new(header, Arc::new(table));
    log::info!(
        target: "foldpow",
        "commitment {}",
        word_to_hex(puzzle.commitment())
    );

    let mut engine = config.build_engine()?;
    let outcome = engine.solve(&puzzle)?;
    puzzle
        .verify(&outcome.proof)
        .map_err(|e| anyhow::anyhow!("found proof failed verification: {}", e))?;

    println!("{}", outcome.proof);
    println!(
        "Evaluations: {} ({:.0}/s on {} threads)",
        outcome.stats.evaluations,
        outcome.stats.evaluations_per_second(),
        outcome.stats.threads
    );

    Ok(())
}
