//! Level Creator
//!
//! Generates a batch of puzzle levels and writes one JSON file per level.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use rust_voronoi_puzzle::{BatchConfigBuilder, BatchHandle, Result};

/// Level Creator - batch generation of polygon puzzle levels
#[derive(Parser, Debug)]
#[command(name = "level_creator")]
#[command(about = "Generate Voronoi puzzle levels as JSON files")]
struct Args {
    /// Fewest pieces per level
    #[arg(long, default_value_t = 3)]
    min_shapes: usize,

    /// Most pieces per level
    #[arg(long, default_value_t = 6)]
    max_shapes: usize,

    /// Number of levels to write
    #[arg(long, default_value_t = 1)]
    levels: usize,

    /// Base seed; level i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory (must exist)
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// File name prefix
    #[arg(long, default_value = "level")]
    prefix: String,

    /// Replace existing files instead of choosing the next free name
    #[arg(long)]
    overwrite: bool,

    /// Fixed timestamp in milliseconds, for reproducible output
    #[arg(long)]
    timestamp: Option<u64>,

    /// Give up on a level after this many attempts
    #[arg(long)]
    max_attempts: Option<usize>,
}

fn run(args: Args) -> Result<()> {
    let mut builder = BatchConfigBuilder::new()
        .shape_range(args.min_shapes, args.max_shapes)?
        .level_count(args.levels)?
        .output_dir(args.out)
        .filename_prefix(args.prefix)?
        .overwrite(args.overwrite);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    if let Some(timestamp) = args.timestamp {
        builder = builder.timestamp(timestamp);
    }
    if let Some(attempts) = args.max_attempts {
        builder = builder.max_attempts(attempts)?;
    }
    let config = builder.build()?;
    tracing::info!(seed = config.seed, levels = config.level_count, "starting batch");

    let mut handle = BatchHandle::spawn(config);
    let mut reported = 0;
    while !handle.is_finished() {
        if let Some(progress) = handle.latest_progress() {
            if progress.completed > reported {
                reported = progress.completed;
                tracing::info!("{}/{} levels", progress.completed, progress.total);
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    let summary = handle.join()?;
    for path in &summary.written {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
