//! Exact geometric predicates shared by level validation and piece placement
//!
//! These are pure functions with no tolerance beyond what is documented on
//! each one. Touching does not count as overlapping anywhere in this module.

use glam::DVec2;

use crate::geometry::{orientation, points_coincide, Rect, Triangle};

/// Half-plane containment test for `p` in triangle `abc`
///
/// A point coinciding with one of the triangle's vertices is never inside.
/// A point on an edge is inside, because a zero half-plane value does not
/// disagree with either sign. Works for either winding.
///
/// ```
/// use glam::DVec2;
/// use rust_voronoi_puzzle::collision::point_in_triangle;
///
/// let (a, b, c) = (DVec2::ZERO, DVec2::X, DVec2::Y);
/// assert!(point_in_triangle(DVec2::new(0.5, 0.5), a, b, c));
/// assert!(!point_in_triangle(DVec2::ZERO, a, b, c));
/// ```
pub fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    if points_coincide(p, a) || points_coincide(p, b) || points_coincide(p, c) {
        return false;
    }

    let d1 = orientation(a, b, p);
    let d2 = orientation(b, c, p);
    let d3 = orientation(c, a, p);

    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

/// Open-interval intersection of segments `ab` and `cd`
///
/// Both intersection parameters must lie strictly inside `(0, 1)`, so shared
/// endpoints and T-junctions do not count. Parallel and collinear segments
/// never intersect.
pub fn segments_intersect(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    let r = b - a;
    let s = d - c;
    let denominator = r.perp_dot(s);
    if denominator == 0.0 {
        return false;
    }

    let ac = c - a;
    let t = ac.perp_dot(s) / denominator;
    let u = ac.perp_dot(r) / denominator;
    t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0
}

/// Axis-aligned overlap; rectangles sharing only an edge do not overlap
pub fn rectangles_overlap(r1: &Rect, r2: &Rect) -> bool {
    let (min1, max1) = (r1.min(), r1.max());
    let (min2, max2) = (r2.min(), r2.max());
    !(min1.x >= max2.x || max1.x <= min2.x || min1.y >= max2.y || max1.y <= min2.y)
}

/// Whether any edge of `t1` properly crosses any edge of `t2`
///
/// The cached bounds give an early reject before the nine segment tests.
pub fn triangles_overlap(t1: &Triangle, t2: &Triangle) -> bool {
    if !rectangles_overlap(&t1.bounds(), &t2.bounds()) {
        return false;
    }

    t1.edges().iter().any(|&(a, b)| {
        t2.edges()
            .iter()
            .any(|&(c, d)| segments_intersect(a, b, c, d))
    })
}

/// Strict containment: `p` must be on the same side of all three edges
///
/// Points on an edge or vertex are outside. The ear clipper uses this so
/// that boundary contacts never block an ear.
pub(crate) fn point_strictly_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    let d1 = orientation(a, b, p);
    let d2 = orientation(b, c, p);
    let d3 = orientation(c, a, p);
    (d1 > 0.0 && d2 > 0.0 && d3 > 0.0) || (d1 < 0.0 && d2 < 0.0 && d3 < 0.0)
}

const COLLINEAR_TOLERANCE: f64 = 1e-9;

fn sign(value: f64) -> i8 {
    if value > COLLINEAR_TOLERANCE {
        1
    } else if value < -COLLINEAR_TOLERANCE {
        -1
    } else {
        0
    }
}

fn within_segment_box(p: DVec2, a: DVec2, b: DVec2) -> bool {
    let min = a.min(b);
    let max = a.max(b);
    p.x >= min.x - COLLINEAR_TOLERANCE
        && p.x <= max.x + COLLINEAR_TOLERANCE
        && p.y >= min.y - COLLINEAR_TOLERANCE
        && p.y <= max.y + COLLINEAR_TOLERANCE
}

/// Closed segment intersection, including touching and collinear overlap
pub(crate) fn segments_touch(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
    let o1 = sign(orientation(a, b, c));
    let o2 = sign(orientation(a, b, d));
    let o3 = sign(orientation(c, d, a));
    let o4 = sign(orientation(c, d, b));

    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }

    (o1 == 0 && within_segment_box(c, a, b))
        || (o2 == 0 && within_segment_box(d, a, b))
        || (o3 == 0 && within_segment_box(a, c, d))
        || (o4 == 0 && within_segment_box(b, c, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_point_in_triangle_examples() {
        let (a, b, c) = (v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0));
        assert!(point_in_triangle(v(0.5, 0.5), a, b, c));
        assert!(!point_in_triangle(v(0.0, 0.0), a, b, c));
        assert!(point_in_triangle(v(0.2, 0.2), a, b, c));
        assert!(!point_in_triangle(v(1.0, 1.0), a, b, c));
    }

    #[test]
    fn test_point_in_triangle_either_winding() {
        let p = v(0.25, 0.25);
        assert!(point_in_triangle(p, v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)));
        assert!(point_in_triangle(p, v(0.0, 0.0), v(0.0, 1.0), v(1.0, 0.0)));
    }

    #[test]
    fn test_strict_containment_excludes_boundary() {
        let (a, b, c) = (v(0.0, 0.0), v(2.0, 0.0), v(0.0, 2.0));
        assert!(point_strictly_in_triangle(v(0.5, 0.5), a, b, c));
        assert!(!point_strictly_in_triangle(v(1.0, 1.0), a, b, c));
        assert!(!point_strictly_in_triangle(v(1.0, 0.0), a, b, c));
        assert!(!point_strictly_in_triangle(a, a, b, c));
    }

    #[test]
    fn test_segments_intersect_crossing() {
        assert!(segments_intersect(v(0.0, 0.0), v(2.0, 2.0), v(0.0, 2.0), v(2.0, 0.0)));
        assert!(!segments_intersect(v(0.0, 0.0), v(1.0, 1.0), v(2.0, 0.0), v(3.0, 1.0)));
    }

    #[test]
    fn test_segments_intersect_is_open() {
        // Shared endpoint
        assert!(!segments_intersect(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)));
        // T-junction
        assert!(!segments_intersect(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)));
        // Collinear overlap
        assert!(!segments_intersect(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(3.0, 0.0)));
    }

    #[test]
    fn test_rectangles_touching_do_not_overlap() {
        let r1 = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(!rectangles_overlap(&r1, &Rect::new(1.0, 0.0, 1.0, 1.0)));
        assert!(!rectangles_overlap(&r1, &Rect::new(0.0, 1.0, 1.0, 1.0)));
        assert!(rectangles_overlap(&r1, &Rect::new(0.5, 0.5, 1.0, 1.0)));
    }

    #[test]
    fn test_triangles_sharing_edge_do_not_overlap() {
        let t1 = Triangle::new(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0));
        let t2 = Triangle::new(v(0.0, 0.0), v(1.0, 1.0), v(0.0, 1.0));
        assert!(!triangles_overlap(&t1, &t2));
    }

    #[test]
    fn test_triangles_crossing_overlap() {
        let t1 = Triangle::new(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 2.0));
        let t2 = Triangle::new(v(0.0, 1.0), v(2.0, 1.0), v(1.0, -1.0));
        assert!(triangles_overlap(&t1, &t2));

        let far = t2.translated(v(10.0, 0.0));
        assert!(!triangles_overlap(&t1, &far));
    }

    #[test]
    fn test_segments_touch_is_closed() {
        assert!(segments_touch(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)));
        assert!(segments_touch(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 0.0), v(3.0, 0.0)));
        assert!(!segments_touch(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0), v(1.0, 1.0)));
    }
}
