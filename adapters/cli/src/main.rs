#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that turns a generation profile into XML fixtures.

mod pipeline;
mod profile;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use samgen_core::{derive_stream_seed, EmissionClock, RNG_STREAM_WAVE, TIMESTAMP_FORMAT};
use samgen_reference::ReferenceData;
use samgen_system_wave::{dated_levels, generate_wave, WaveConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{pipeline::write_fixtures, profile::Profile};

#[derive(Parser, Debug)]
#[command(name = "samgen")]
#[command(about = "Synthetic license usage and denial fixture generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate usage, denial and license fixtures from a profile
    Generate(GenerateArgs),
    /// Generate a randomized wave and print it as JSON
    Wave(WaveArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Generation profile (TOML)
    #[arg(long)]
    profile: PathBuf,

    /// Directory holding the reference CSV tables; overrides the profile
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Directory receiving the XML fixtures; overrides the profile
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Master seed; overrides the profile, random when neither sets one
    #[arg(long)]
    seed: Option<u64>,

    /// Path receiving the JSON run summary; overrides the profile
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Capture instant stamped on every record (YYYY-MM-DD HH:MM:SS); defaults to now
    #[arg(long, value_parser = parse_timestamp)]
    captured_at: Option<NaiveDateTime>,
}

#[derive(Args, Debug)]
struct WaveArgs {
    /// Total number of records
    #[arg(long, default_value = "100")]
    length: usize,

    /// Number of cycles
    #[arg(long, default_value = "3")]
    cycles: usize,

    /// Peak value touched by every cycle
    #[arg(long, default_value = "300")]
    peak: u32,

    /// Randomness level (1 = minimal, 10 = maximal)
    #[arg(long, default_value = "5")]
    randomness: u8,

    /// Lowest value as a fraction of the peak
    #[arg(long, default_value = "0.25")]
    min_fraction: f64,

    /// Date of the first record; defaults to today
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Master seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Write the JSON to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(tracing::level_filters::LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Generate(args) => run_generate(args),
        Command::Wave(args) => run_wave(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let profile = Profile::load(&args.profile)?;

    let reference_dir = args
        .reference_dir
        .or_else(|| profile.reference_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let reference = ReferenceData::load_dir(&reference_dir).with_context(|| {
        format!(
            "failed to load reference tables from {}",
            reference_dir.display()
        )
    })?;

    let seed = args
        .seed
        .or(profile.seed)
        .unwrap_or_else(rand::random::<u64>);
    let clock = EmissionClock::new(
        args.captured_at
            .unwrap_or_else(|| Local::now().naive_local()),
    );
    info!(seed, captured = %clock.timestamp(), "starting generation");

    let fixtures = pipeline::generate(&profile, &reference, clock, seed)?;

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| profile.output.directory.clone());
    let written = write_fixtures(&output_dir, &fixtures)?;
    if let Some(summary_path) = args.summary.or_else(|| profile.output.summary.clone()) {
        pipeline::write_summary(&summary_path, &fixtures.summary)?;
        info!(path = %summary_path.display(), "wrote summary");
    }

    println!(
        "seed {seed}: {} usage, {} denial, {} license records",
        fixtures.usage_records, fixtures.denial_records, fixtures.license_records
    );
    for path in written {
        println!("  {}", path.display());
    }
    for warning in fixtures.summary.warnings() {
        println!("  warning: {warning}");
    }
    Ok(())
}

fn run_wave(args: WaveArgs) -> Result<()> {
    let config = WaveConfig::new(
        args.length,
        args.cycles,
        args.peak,
        args.randomness,
        args.min_fraction,
    )?;
    let seed = args.seed.unwrap_or_else(rand::random::<u64>);
    let mut rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(seed, RNG_STREAM_WAVE));
    let values = generate_wave(&config, &mut rng)?;
    let start = args
        .start
        .unwrap_or_else(|| Local::now().date_naive());
    info!(seed, length = values.len(), "generated wave");

    let json = serde_json::to_string_pretty(&dated_levels(&values, start))
        .context("failed to serialize wave")?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("failed to write wave to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|error| format!("expected YYYY-MM-DD HH:MM:SS: {error}"))
}
