//! Level generation pipeline
//!
//! One attempt samples sites, builds their planar subdivision, assembles and
//! closes the cell polygons, snaps them to the integer grid and triangulates
//! them. Bad luck in any step discards the attempt and starts over from a
//! fresh sample; broken invariants abort with an error instead.

mod assemble;
pub(crate) mod beachline;
mod border;
mod dedup;
mod sites;
mod snap;
mod validate;
mod voronoi;

pub use assemble::assemble_polygons;
use border::repair_borders;
pub use dedup::remove_duplicates;
pub use sites::{sample_sites, Site};
pub use snap::{snap_to_grid, Lattice, DEGENERATE_CORNER_DEGREES};
pub use validate::{is_simple_ring, validate_puzzle};
pub use voronoi::{build_subdivision, Subdivision, SweepError, VoronoiEdge};

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::collision::triangles_overlap;
use crate::config::LevelConfig;
use crate::error::{PuzzleError, Result};
use crate::geometry::EPSILON;
use crate::mesh::{triangulate_polygon, EarClipError, PolygonMesh};
use crate::puzzle::Puzzle;

/// Why an attempt was thrown away
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RetryReason {
    #[error("subdivision failed: {0}")]
    Subdivision(#[from] SweepError),

    #[error("polygon {polygon} has {count} open endpoints")]
    OpenEndpoints { polygon: usize, count: usize },

    #[error("no border path closes polygon {polygon}")]
    UnrepairableBorder { polygon: usize },

    #[error("vertex {vertex} has no acceptable lattice point")]
    UnsnappableVertex { vertex: usize },

    #[error("expected {expected} polygons, found {found}")]
    PolygonCount { expected: usize, found: usize },

    #[error("polygon {polygon} is not a simple ring with positive area")]
    InvalidPolygon { polygon: usize },

    #[error("polygon areas sum to {total}, expected {expected}")]
    AreaMismatch { total: f64, expected: f64 },

    #[error("triangles of polygon {polygon} cover {covered}, polygon area is {area}")]
    TriangleArea { polygon: usize, covered: f64, area: f64 },

    #[error("pieces {first} and {second} overlap")]
    OverlappingPieces { first: usize, second: usize },
}

/// Outcome of a failed step: start over, or stop
#[derive(Debug)]
pub(crate) enum Failure {
    Retry(RetryReason),
    Fatal(PuzzleError),
}

impl From<RetryReason> for Failure {
    fn from(reason: RetryReason) -> Self {
        Failure::Retry(reason)
    }
}

impl From<PuzzleError> for Failure {
    fn from(err: PuzzleError) -> Self {
        Failure::Fatal(err)
    }
}

/// Where an attempt currently stands
enum Phase {
    Sampling,
    Subdividing(Vec<Site>),
    Assembling(Vec<Site>, Subdivision),
    Repairing(Puzzle),
    Snapping(Puzzle),
    Triangulating(Puzzle),
    Retry(RetryReason),
    Success(Vec<Site>, Vec<PolygonMesh>),
}

/// A finished pipeline run
#[derive(Debug, Clone)]
pub(crate) struct PipelineOutput {
    pub sites: Vec<Site>,
    pub meshes: Vec<PolygonMesh>,
    /// Attempts made, including the successful one
    pub attempts: usize,
}

/// Triangulate every polygon and check the pieces tile without overlap
fn triangulate_puzzle(puzzle: &Puzzle) -> std::result::Result<Vec<PolygonMesh>, Failure> {
    let rings = validate_puzzle(puzzle)?;

    let mut meshes = Vec::with_capacity(rings.len());
    for (polygon, ring) in rings.iter().enumerate() {
        let mesh = triangulate_polygon(ring).map_err(|err| match err {
            EarClipError::Stalled { .. } | EarClipError::TooFewVertices(_) => {
                PuzzleError::Internal(format!("polygon {polygon}: {err}"))
            }
        })?;

        let covered = mesh.covered_area();
        if (covered - mesh.area).abs() > EPSILON * mesh.area.max(1.0) {
            return Err(RetryReason::TriangleArea { polygon, covered, area: mesh.area }.into());
        }
        meshes.push(mesh);
    }

    for first in 0..meshes.len() {
        for second in (first + 1)..meshes.len() {
            let overlap = meshes[first].triangles.iter().any(|t1| {
                meshes[second].triangles.iter().any(|t2| triangles_overlap(t1, t2))
            });
            if overlap {
                return Err(RetryReason::OverlappingPieces { first, second }.into());
            }
        }
    }
    Ok(meshes)
}

fn step<R: Rng + ?Sized>(
    phase: Phase,
    shape_count: usize,
    grid_size: u32,
    rng: &mut R,
) -> std::result::Result<Phase, Failure> {
    let next = match phase {
        Phase::Sampling => Phase::Subdividing(sample_sites(shape_count, grid_size, rng)?),
        Phase::Subdividing(sites) => {
            let subdivision = build_subdivision(&sites, grid_size).map_err(RetryReason::from)?;
            Phase::Assembling(sites, subdivision)
        }
        Phase::Assembling(sites, subdivision) => {
            Phase::Repairing(assemble_polygons(&subdivision, &sites))
        }
        Phase::Repairing(mut puzzle) => {
            repair_borders(&mut puzzle)?;
            Phase::Snapping(puzzle)
        }
        Phase::Snapping(mut puzzle) => {
            snap_to_grid(&mut puzzle)?;
            remove_duplicates(&mut puzzle);
            Phase::Triangulating(puzzle)
        }
        Phase::Triangulating(puzzle) => {
            let meshes = triangulate_puzzle(&puzzle)?;
            Phase::Success(puzzle.sites().to_vec(), meshes)
        }
        done @ (Phase::Retry(_) | Phase::Success(..)) => done,
    };
    Ok(next)
}

/// Run one step of an attempt; a discarded attempt ends in [`Phase::Retry`]
fn advance<R: Rng + ?Sized>(
    phase: Phase,
    shape_count: usize,
    grid_size: u32,
    rng: &mut R,
) -> Result<Phase> {
    match step(phase, shape_count, grid_size, rng) {
        Ok(next) => Ok(next),
        Err(Failure::Retry(reason)) => Ok(Phase::Retry(reason)),
        Err(Failure::Fatal(err)) => Err(err),
    }
}

/// Generate one level, retrying from a fresh sample until an attempt succeeds
///
/// Only configuration errors and broken invariants are returned as errors,
/// plus `GenerationFailed` when `max_attempts` runs out.
pub(crate) fn run_pipeline<R: Rng + ?Sized>(
    config: &LevelConfig,
    rng: &mut R,
) -> Result<PipelineOutput> {
    let grid_size = config.grid_size();
    run_attempts(config, rng, |phase, rng| {
        advance(phase, config.shape_count, grid_size, rng)
    })
}

/// Drive attempts through `advance` until one succeeds or the cap is hit
fn run_attempts<R, F>(config: &LevelConfig, rng: &mut R, mut advance: F) -> Result<PipelineOutput>
where
    R: Rng + ?Sized,
    F: FnMut(Phase, &mut R) -> Result<Phase>,
{
    let mut attempts = 1;
    let mut phase = Phase::Sampling;

    loop {
        phase = match advance(phase, rng)? {
            Phase::Success(sites, meshes) => {
                debug!(
                    seed = config.seed,
                    shapes = config.shape_count,
                    attempts,
                    "level generated"
                );
                return Ok(PipelineOutput { sites, meshes, attempts });
            }
            Phase::Retry(reason) => {
                debug!(seed = config.seed, attempt = attempts, %reason, "discarding attempt");
                if config.max_attempts.is_some_and(|cap| attempts >= cap) {
                    return Err(PuzzleError::GenerationFailed(format!(
                        "no valid level after {attempts} attempts (last: {reason})"
                    )));
                }
                attempts += 1;
                Phase::Sampling
            }
            next => next,
        };
    }
}
