//! Triangle meshes for finished puzzle pieces
//!
//! Each polygon of a level is triangulated once; the triangles are what the
//! level document stores and what placement collision runs against.

mod ear_clip;

pub use ear_clip::{ear_clip, EarClipError};

use glam::DVec2;

use crate::geometry::{signed_area, Rect, Triangle};

/// One triangulated puzzle piece in grid coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonMesh {
    /// Counter-clockwise triangles covering the polygon
    pub triangles: Vec<Triangle>,
    /// Axis-aligned bounds of the polygon
    pub bounds: Rect,
    /// Shoelace area of the source ring
    pub area: f64,
}

impl PolygonMesh {
    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sum of the triangle areas
    pub fn covered_area(&self) -> f64 {
        self.triangles.iter().map(Triangle::area).sum()
    }

    /// Triangle corners relative to the bounds origin, six floats per triangle
    pub fn local_points(&self) -> Vec<f64> {
        let origin = self.bounds.min();
        self.triangles
            .iter()
            .flat_map(|t| t.vertices())
            .flat_map(|p| {
                let local = p - origin;
                [local.x, local.y]
            })
            .collect()
    }
}

/// Triangulate one closed ring
pub fn triangulate_polygon(ring: &[DVec2]) -> Result<PolygonMesh, EarClipError> {
    let triangles = ear_clip(ring)?;
    let bounds = Rect::enclosing(ring.iter().copied())
        .ok_or(EarClipError::TooFewVertices(ring.len()))?;

    Ok(PolygonMesh {
        triangles,
        bounds,
        area: signed_area(ring).abs(),
    })
}
