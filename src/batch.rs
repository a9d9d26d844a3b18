//! Writing many levels to disk, optionally on a background thread
//!
//! Levels are generated one after another. Cancellation and progress are
//! only observed between levels; a level in progress always completes.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::BatchConfig;
use crate::error::{PuzzleError, Result};
use crate::level::{current_timestamp_millis, GeneratedLevel};
use crate::level_file::level_path;

/// Levels finished so far out of the batch total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files written, in level order
    pub written: Vec<PathBuf>,
    /// The batch stopped early because it was cancelled
    pub cancelled: bool,
}

fn io_error(config: &BatchConfig, path: PathBuf, seed: u64, source: io::Error) -> PuzzleError {
    PuzzleError::Io {
        path,
        seed,
        min_shapes: config.min_shapes,
        max_shapes: config.max_shapes,
        source,
    }
}

/// Generate and write every level of the batch on the calling thread
///
/// Level `i` draws its shape count and all of its geometry from a generator
/// seeded with `config.seed + i`. `cancel` is checked before each level.
///
/// # Errors
///
/// Fails with `Io` when the output directory is missing or a file cannot be
/// written, and with any fatal generation error.
pub fn run_batch<F>(config: &BatchConfig, cancel: &AtomicBool, mut on_progress: F) -> Result<BatchSummary>
where
    F: FnMut(BatchProgress),
{
    config.validate()?;
    if !config.output_dir.is_dir() {
        return Err(io_error(
            config,
            config.output_dir.clone(),
            config.seed,
            io::Error::new(io::ErrorKind::NotFound, "output directory does not exist"),
        ));
    }

    let total = config.level_count;
    let mut written = Vec::with_capacity(total);
    for index in 0..total {
        if cancel.load(Ordering::Relaxed) {
            warn!(completed = index, total, "batch cancelled");
            return Ok(BatchSummary { written, cancelled: true });
        }

        let seed = config.level_seed(index);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shapes = rng.gen_range(config.min_shapes..=config.max_shapes);
        let level = GeneratedLevel::generate_with_rng(config.level_config(index, shapes), &mut rng)?;

        let timestamp = config.timestamp.unwrap_or_else(current_timestamp_millis);
        let json = level.to_level_file(timestamp).to_json()?;

        let path = level_path(&config.output_dir, &config.filename_prefix, index, config.overwrite);
        fs::write(&path, json).map_err(|source| io_error(config, path.clone(), seed, source))?;
        info!(
            path = %path.display(),
            seed,
            shapes,
            attempts = level.attempts(),
            "wrote level"
        );

        written.push(path);
        on_progress(BatchProgress { completed: index + 1, total });
    }

    Ok(BatchSummary { written, cancelled: false })
}

/// A batch running on its own worker thread
///
/// ```no_run
/// use rust_voronoi_puzzle::*;
///
/// let config = BatchConfigBuilder::new()
///     .level_count(20)
///     .unwrap()
///     .output_dir("levels")
///     .build()
///     .unwrap();
///
/// let mut handle = BatchHandle::spawn(config);
/// while !handle.is_finished() {
///     if let Some(progress) = handle.latest_progress() {
///         println!("{}/{}", progress.completed, progress.total);
///     }
///     std::thread::sleep(std::time::Duration::from_millis(50));
/// }
/// let summary = handle.join().unwrap();
/// println!("wrote {} files", summary.written.len());
/// ```
pub struct BatchHandle {
    cancel: Arc<AtomicBool>,
    progress: Receiver<BatchProgress>,
    latest: Option<BatchProgress>,
    worker: JoinHandle<Result<BatchSummary>>,
}

impl BatchHandle {
    pub fn spawn(config: BatchConfig) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, progress) = mpsc::channel();

        let flag = Arc::clone(&cancel);
        let worker = thread::spawn(move || {
            run_batch(&config, &flag, |update| {
                // The receiver may already be gone; the batch still finishes
                let _ = sender.send(update);
            })
        });

        Self {
            cancel,
            progress,
            latest: None,
            worker,
        }
    }

    /// Ask the worker to stop before its next level
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// The most recent progress report, if any has arrived
    pub fn latest_progress(&mut self) -> Option<BatchProgress> {
        if let Some(update) = self.progress.try_iter().last() {
            self.latest = Some(update);
        }
        self.latest
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and return its result
    pub fn join(self) -> Result<BatchSummary> {
        self.worker.join().map_err(|_| PuzzleError::WorkerPanicked)?
    }
}
