//! Planar geometry primitives shared by the generator and the placement checks
//!
//! All coordinates are grid units stored as `f64`. Vertex equality is
//! tolerance-based; see [`approx_eq`].

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Relative tolerance used for vertex equality
pub const EPSILON: f64 = 1e-5;

/// Compare two scalars with a relative tolerance
///
/// The tolerance scales with the larger magnitude and never drops below
/// `EPSILON` itself, so values near zero still compare sensibly.
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Tolerance-based point equality
#[inline]
pub fn points_coincide(p: DVec2, q: DVec2) -> bool {
    approx_eq(p.x, q.x) && approx_eq(p.y, q.y)
}

/// Twice the signed area of triangle `abc`; positive when counter-clockwise (y up)
#[inline]
pub fn orientation(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Signed area of a closed ring via the shoelace sum
///
/// Positive for counter-clockwise rings. Rings with fewer than three
/// points have zero area.
pub fn signed_area(ring: &[DVec2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Axis-aligned rectangle stored as origin plus size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_min_max(min: DVec2, max: DVec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Smallest rectangle containing every point, or `None` for an empty input
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec2>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::from_min_max(min, max))
    }

    #[inline]
    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x + self.width, self.y + self.height)
    }

    /// Same size, moved so its origin sits at `origin`
    pub fn at(&self, origin: DVec2) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }
}

/// A triangle with a cached bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: DVec2,
    pub b: DVec2,
    pub c: DVec2,
    bounds: Rect,
}

impl Triangle {
    pub fn new(a: DVec2, b: DVec2, c: DVec2) -> Self {
        let min = a.min(b).min(c);
        let max = a.max(b).max(c);
        Self { a, b, c, bounds: Rect::from_min_max(min, max) }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[inline]
    pub fn vertices(&self) -> [DVec2; 3] {
        [self.a, self.b, self.c]
    }

    /// Edges as (start, end) pairs in winding order
    pub fn edges(&self) -> [(DVec2, DVec2); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }

    pub fn signed_area(&self) -> f64 {
        orientation(self.a, self.b, self.c) / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(self.a + offset, self.b + offset, self.c + offset)
    }
}
