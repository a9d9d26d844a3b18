//! A generated level and its conversion to a level document

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::LevelConfig;
use crate::error::Result;
use crate::generation::{run_pipeline, Site};
use crate::level_file::{LevelFile, PolygonRecord};
use crate::mesh::PolygonMesh;

/// Milliseconds since the Unix epoch, or 0 if the clock is before it
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// A square grid cut into triangulated polygon pieces
///
/// # Examples
///
/// ```
/// use rust_voronoi_puzzle::*;
///
/// let config = LevelConfigBuilder::new()
///     .seed(7)
///     .shape_count(3)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let level = GeneratedLevel::generate(config).unwrap();
/// assert_eq!(level.polygons().len(), 3);
/// assert!((level.total_area() - 16.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct GeneratedLevel {
    config: LevelConfig,
    sites: Vec<Site>,
    polygons: Vec<PolygonMesh>,
    attempts: usize,
}

impl GeneratedLevel {
    /// Generate a level with a generator seeded from `config.seed`
    pub fn generate(config: LevelConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::generate_with_rng(config, &mut rng)
    }

    /// Generate a level drawing all randomness from `rng`
    ///
    /// `config.seed` is only recorded; the caller's generator decides the output.
    pub fn generate_with_rng<R: Rng + ?Sized>(config: LevelConfig, rng: &mut R) -> Result<Self> {
        let output = run_pipeline(&config, rng)?;
        Ok(Self {
            config,
            sites: output.sites,
            polygons: output.meshes,
            attempts: output.attempts,
        })
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.config.grid_size()
    }

    #[inline]
    pub fn shape_count(&self) -> usize {
        self.polygons.len()
    }

    /// Sites the pieces were grown from, in piece order
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn polygons(&self) -> &[PolygonMesh] {
        &self.polygons
    }

    /// Number of attempts it took, including the successful one
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn total_area(&self) -> f64 {
        self.polygons.iter().map(|p| p.area).sum()
    }

    /// Build the level document with polygon-local triangle coordinates
    pub fn to_level_file(&self, timestamp: u64) -> LevelFile {
        LevelFile {
            timestamp,
            grid_size: self.grid_size(),
            polygons: self
                .polygons
                .iter()
                .map(|mesh| PolygonRecord {
                    bounds: [
                        mesh.bounds.x,
                        mesh.bounds.y,
                        mesh.bounds.width,
                        mesh.bounds.height,
                    ],
                    triangle_points: mesh.local_points(),
                })
                .collect(),
        }
    }
}
