//! Checks a snapped puzzle must pass before it is triangulated

use glam::DVec2;

use super::RetryReason;
use crate::collision::segments_touch;
use crate::geometry::{orientation, points_coincide, signed_area, EPSILON};
use crate::puzzle::Puzzle;

/// Whether the closed ring has no repeated points, no folded corners and
/// no touching non-adjacent edges
pub fn is_simple_ring(ring: &[DVec2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if points_coincide(ring[i], ring[j]) {
                return false;
            }
        }
    }

    // Consecutive edges must not double back over each other
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let corner = ring[i];
        let next = ring[(i + 1) % n];
        let (u, v) = (prev - corner, next - corner);
        if orientation(corner, prev, next).abs() <= EPSILON * EPSILON && u.dot(v) > 0.0 {
            return false;
        }
    }

    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (ring[j], ring[(j + 1) % n]);
            if segments_touch(a, b, c, d) {
                return false;
            }
        }
    }
    true
}

/// Confirm the puzzle is a partition of the grid into simple polygons
///
/// Returns each polygon's ring in polygon order. Any failure means this
/// attempt is unusable and is retried.
pub fn validate_puzzle(puzzle: &Puzzle) -> Result<Vec<Vec<DVec2>>, RetryReason> {
    let expected = puzzle.sites().len();
    let found = puzzle.polygons().len();
    if found != expected {
        return Err(RetryReason::PolygonCount { expected, found });
    }

    let mut rings = Vec::with_capacity(found);
    let mut total = 0.0;
    for polygon in 0..found {
        let ids = puzzle
            .polygon_ring(polygon)
            .ok_or(RetryReason::InvalidPolygon { polygon })?;
        let ring = puzzle.ring_positions(&ids);
        let area = signed_area(&ring).abs();
        if area <= EPSILON || !is_simple_ring(&ring) {
            return Err(RetryReason::InvalidPolygon { polygon });
        }
        total += area;
        rings.push(ring);
    }

    let size = puzzle.grid_size() as f64;
    let expected_area = size * size;
    if (total - expected_area).abs() > EPSILON * expected_area.max(1.0) {
        return Err(RetryReason::AreaMismatch { total, expected: expected_area });
    }
    Ok(rings)
}
