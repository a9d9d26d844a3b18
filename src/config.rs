//! Level and batch configuration with validating builders
//!
//! A [`LevelConfig`] fully determines one level: the same seed and shape
//! count always produce the same polygons.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PuzzleError, Result};

/// Fewest shapes a level can be cut into
pub const MIN_SHAPES: usize = 2;

/// Largest square side a level can be cut from
pub const MAX_GRID_SIZE: u32 = 1024;

/// Configuration for generating a single level
///
/// # Example
///
/// ```rust
/// use rust_voronoi_puzzle::*;
///
/// let config = LevelConfigBuilder::new()
///     .seed(42)
///     .shape_count(4)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.grid_size(), 5);
///
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: LevelConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Seed for the level's random generator
    pub seed: u64,

    /// Number of pieces the square is cut into
    pub shape_count: usize,

    /// Side length of the square; `shape_count + 1` when unset
    pub grid_size_override: Option<u32>,

    /// Give up after this many discarded attempts
    ///
    /// `None` retries forever. Pathological shape counts for the grid may
    /// then never terminate.
    pub max_attempts: Option<usize>,
}

impl LevelConfig {
    /// Side length of the square the level is cut from
    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size_override
            .unwrap_or_else(|| u32::try_from(self.shape_count + 1).unwrap_or(u32::MAX))
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            shape_count: 5,
            grid_size_override: None,
            max_attempts: None,
        }
    }
}

/// Builder for [`LevelConfig`]
///
/// Defaults:
/// - seed: random
/// - shape_count: 5
/// - grid size: shape count + 1
/// - max_attempts: unbounded
#[derive(Debug, Clone, Default)]
pub struct LevelConfigBuilder {
    seed: Option<u64>,
    shape_count: Option<usize>,
    grid_size_override: Option<u32>,
    max_attempts: Option<usize>,
}

impl LevelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if `count` is below 2
    pub fn shape_count(mut self, count: usize) -> Result<Self> {
        if count < MIN_SHAPES {
            return Err(PuzzleError::InvalidConfig(format!(
                "shape count must be at least {MIN_SHAPES} (got {count})"
            )));
        }
        self.shape_count = Some(count);
        Ok(self)
    }

    /// Use a square of this side instead of `shape_count + 1`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `size` is below 2, which leaves no interior
    /// points, or above [`MAX_GRID_SIZE`]
    pub fn grid_size(mut self, size: u32) -> Result<Self> {
        if !(2..=MAX_GRID_SIZE).contains(&size) {
            return Err(PuzzleError::InvalidConfig(format!(
                "grid size must be between 2 and {MAX_GRID_SIZE} (got {size})"
            )));
        }
        self.grid_size_override = Some(size);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if `attempts` is zero
    pub fn max_attempts(mut self, attempts: usize) -> Result<Self> {
        if attempts == 0 {
            return Err(PuzzleError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        self.max_attempts = Some(attempts);
        Ok(self)
    }

    /// Build the configuration
    ///
    /// Whether the shape count fits the grid is only known once sampling
    /// runs, which reports `TooManyShapes`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the grid derived from the shape count is
    /// larger than [`MAX_GRID_SIZE`]
    pub fn build(self) -> Result<LevelConfig> {
        let defaults = LevelConfig::default();
        let config = LevelConfig {
            seed: self.seed.unwrap_or_else(rand::random),
            shape_count: self.shape_count.unwrap_or(defaults.shape_count),
            grid_size_override: self.grid_size_override,
            max_attempts: self.max_attempts,
        };
        if config.grid_size() > MAX_GRID_SIZE {
            return Err(PuzzleError::InvalidConfig(format!(
                "{} shapes need a grid larger than {MAX_GRID_SIZE}",
                config.shape_count
            )));
        }
        Ok(config)
    }
}

/// Configuration for writing a batch of level files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Level `i` is generated with `seed.wrapping_add(i)`
    pub seed: u64,
    pub min_shapes: usize,
    pub max_shapes: usize,
    pub level_count: usize,
    pub output_dir: PathBuf,
    pub filename_prefix: String,
    /// Replace existing files instead of picking the next free name
    pub overwrite: bool,
    /// Fixed timestamp for every document; wall clock when unset
    pub timestamp: Option<u64>,
    pub max_attempts: Option<usize>,
}

impl BatchConfig {
    /// Check the invariants the builder enforces, for configs built by hand or deserialized
    pub fn validate(&self) -> Result<()> {
        if self.min_shapes < MIN_SHAPES || self.min_shapes > self.max_shapes {
            return Err(PuzzleError::InvalidConfig(format!(
                "shape range must satisfy {MIN_SHAPES} <= min <= max (got {}..={})",
                self.min_shapes, self.max_shapes
            )));
        }
        if self.max_shapes >= MAX_GRID_SIZE as usize {
            return Err(PuzzleError::InvalidConfig(format!(
                "at most {} shapes per level (got {})",
                MAX_GRID_SIZE - 1,
                self.max_shapes
            )));
        }
        if self.level_count == 0 {
            return Err(PuzzleError::InvalidConfig(
                "level count must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(PuzzleError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration for level `index` of the batch, with its shape count
    pub fn level_config(&self, index: usize, shape_count: usize) -> LevelConfig {
        LevelConfig {
            seed: self.level_seed(index),
            shape_count,
            grid_size_override: None,
            max_attempts: self.max_attempts,
        }
    }

    #[inline]
    pub fn level_seed(&self, index: usize) -> u64 {
        self.seed.wrapping_add(index as u64)
    }
}

/// Builder for [`BatchConfig`]
///
/// ```rust
/// use rust_voronoi_puzzle::*;
///
/// let config = BatchConfigBuilder::new()
///     .seed(7)
///     .shape_range(3, 6)
///     .unwrap()
///     .level_count(10)
///     .unwrap()
///     .output_dir("levels")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.level_seed(2), 9);
/// ```
#[derive(Debug, Clone)]
pub struct BatchConfigBuilder {
    seed: Option<u64>,
    min_shapes: usize,
    max_shapes: usize,
    level_count: usize,
    output_dir: PathBuf,
    filename_prefix: String,
    overwrite: bool,
    timestamp: Option<u64>,
    max_attempts: Option<usize>,
}

impl BatchConfigBuilder {
    /// Defaults: 3 to 6 shapes, one level, the current directory, prefix `level`
    pub fn new() -> Self {
        Self {
            seed: None,
            min_shapes: 3,
            max_shapes: 6,
            level_count: 1,
            output_dir: PathBuf::from("."),
            filename_prefix: "level".to_string(),
            overwrite: false,
            timestamp: None,
            max_attempts: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `2 <= min <= max`
    pub fn shape_range(mut self, min: usize, max: usize) -> Result<Self> {
        if min < MIN_SHAPES {
            return Err(PuzzleError::InvalidConfig(format!(
                "minimum shape count must be at least {MIN_SHAPES} (got {min})"
            )));
        }
        if min > max {
            return Err(PuzzleError::InvalidConfig(format!(
                "shape range is empty ({min}..={max})"
            )));
        }
        self.min_shapes = min;
        self.max_shapes = max;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if `count` is zero
    pub fn level_count(mut self, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(PuzzleError::InvalidConfig(
                "level count must be at least 1".to_string(),
            ));
        }
        self.level_count = count;
        Ok(self)
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty prefix or one containing a path separator
    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(PuzzleError::InvalidConfig(format!(
                "invalid filename prefix {prefix:?}"
            )));
        }
        self.filename_prefix = prefix;
        Ok(self)
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn timestamp(mut self, millis: u64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if `attempts` is zero
    pub fn max_attempts(mut self, attempts: usize) -> Result<Self> {
        if attempts == 0 {
            return Err(PuzzleError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }
        self.max_attempts = Some(attempts);
        Ok(self)
    }

    pub fn build(self) -> Result<BatchConfig> {
        let config = BatchConfig {
            seed: self.seed.unwrap_or_else(rand::random),
            min_shapes: self.min_shapes,
            max_shapes: self.max_shapes,
            level_count: self.level_count,
            output_dir: self.output_dir,
            filename_prefix: self.filename_prefix,
            overwrite: self.overwrite,
            timestamp: self.timestamp,
            max_attempts: self.max_attempts,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for BatchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_defaults() {
        let config = LevelConfigBuilder::new().seed(1).build().unwrap();
        assert_eq!(config.shape_count, 5);
        assert_eq!(config.grid_size(), 6);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn test_grid_size_override() {
        let config = LevelConfigBuilder::new()
            .shape_count(4)
            .unwrap()
            .grid_size(3)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.grid_size(), 3);
    }

    #[test]
    fn test_level_validation() {
        assert!(matches!(
            LevelConfigBuilder::new().shape_count(1),
            Err(PuzzleError::InvalidConfig(_))
        ));
        assert!(LevelConfigBuilder::new().grid_size(1).is_err());
        assert!(LevelConfigBuilder::new().max_attempts(0).is_err());
    }

    #[test]
    fn test_grid_size_is_bounded() {
        assert!(LevelConfigBuilder::new().grid_size(MAX_GRID_SIZE).is_ok());
        assert!(LevelConfigBuilder::new().grid_size(MAX_GRID_SIZE + 1).is_err());
        assert!(LevelConfigBuilder::new()
            .shape_count(MAX_GRID_SIZE as usize)
            .unwrap()
            .build()
            .is_err());
        assert!(BatchConfigBuilder::new()
            .shape_range(2, MAX_GRID_SIZE as usize)
            .unwrap()
            .build()
            .is_err());
    }

    #[test]
    fn test_batch_validation() {
        assert!(BatchConfigBuilder::new().shape_range(1, 4).is_err());
        assert!(BatchConfigBuilder::new().shape_range(5, 4).is_err());
        assert!(BatchConfigBuilder::new().shape_range(4, 4).is_ok());
        assert!(BatchConfigBuilder::new().level_count(0).is_err());
        assert!(BatchConfigBuilder::new().filename_prefix("").is_err());
        assert!(BatchConfigBuilder::new().filename_prefix("a/b").is_err());
    }

    #[test]
    fn test_hand_built_config_is_validated() {
        let mut config = BatchConfigBuilder::new().build().unwrap();
        assert!(config.validate().is_ok());
        config.min_shapes = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_level_seeds_wrap() {
        let config = BatchConfigBuilder::new().seed(u64::MAX).build().unwrap();
        assert_eq!(config.level_seed(0), u64::MAX);
        assert_eq!(config.level_seed(1), 0);

        let level = config.level_config(3, 4);
        assert_eq!(level.seed, 2);
        assert_eq!(level.shape_count, 4);
    }

    #[test]
    fn test_batch_config_round_trips_through_json() {
        let config = BatchConfigBuilder::new()
            .seed(11)
            .timestamp(1_700_000_000_000)
            .output_dir("out")
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let restored: BatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
