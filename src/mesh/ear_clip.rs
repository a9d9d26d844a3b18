//! Ear clipping for simple polygons

use glam::DVec2;
use thiserror::Error;

use crate::collision::point_strictly_in_triangle;
use crate::geometry::{orientation, points_coincide, signed_area, Triangle, EPSILON};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EarClipError {
    #[error("a polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("no ear found with {remaining} vertices left; the polygon is not simple")]
    Stalled { remaining: usize },
}

/// `vertices[i]` with its neighbours forms a convex corner that no other
/// remaining vertex sits strictly inside
fn is_ear(vertices: &[DVec2], i: usize) -> bool {
    let n = vertices.len();
    let prev = vertices[(i + n - 1) % n];
    let cur = vertices[i];
    let next = vertices[(i + 1) % n];

    if orientation(prev, cur, next) <= 0.0 {
        return false;
    }

    !vertices.iter().any(|&p| {
        !points_coincide(p, prev)
            && !points_coincide(p, cur)
            && !points_coincide(p, next)
            && point_strictly_in_triangle(p, prev, cur, next)
    })
}

/// Split a simple polygon ring into at most `n - 2` counter-clockwise triangles
///
/// The ring may come in either winding. After each clipped ear the scan
/// restarts from the first remaining vertex. A remainder that has gone flat
/// covers no area and is dropped.
pub fn ear_clip(ring: &[DVec2]) -> Result<Vec<Triangle>, EarClipError> {
    if ring.len() < 3 {
        return Err(EarClipError::TooFewVertices(ring.len()));
    }

    let mut remaining = ring.to_vec();
    if signed_area(&remaining) <= 0.0 {
        remaining.reverse();
    }

    let mut triangles = Vec::with_capacity(ring.len() - 2);
    while remaining.len() > 3 {
        let Some(ear) = (0..remaining.len()).find(|&i| is_ear(&remaining, i)) else {
            if !triangles.is_empty() && signed_area(&remaining).abs() <= EPSILON {
                return Ok(triangles);
            }
            return Err(EarClipError::Stalled { remaining: remaining.len() });
        };

        let n = remaining.len();
        triangles.push(Triangle::new(
            remaining[(ear + n - 1) % n],
            remaining[ear],
            remaining[(ear + 1) % n],
        ));
        remaining.remove(ear);
    }
    let last = Triangle::new(remaining[0], remaining[1], remaining[2]);
    if triangles.is_empty() || last.area() > 0.0 {
        triangles.push(last);
    }

    Ok(triangles)
}
