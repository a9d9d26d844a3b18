//! Moving every vertex onto the integer lattice

use glam::DVec2;

use super::RetryReason;
use crate::geometry::{approx_eq, EPSILON};
use crate::puzzle::{Puzzle, VertexId};

/// Corners closer than this to 0° or 180° are degenerate
pub const DEGENERATE_CORNER_DEGREES: f64 = 20.0;

/// All lattice points of `[0, grid_size]²`, x-major
#[derive(Debug, Clone)]
pub struct Lattice {
    size: f64,
    points: Vec<DVec2>,
}

impl Lattice {
    pub fn new(grid_size: u32) -> Self {
        let points = (0..=grid_size)
            .flat_map(|x| (0..=grid_size).map(move |y| DVec2::new(x as f64, y as f64)))
            .collect();
        Self { size: grid_size as f64, points }
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Lattice points ordered by distance to `p`, ties kept in enumeration order
    pub fn by_distance(&self, p: DVec2) -> Vec<DVec2> {
        let mut order: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, q)| (q.distance_squared(p), i))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        order.into_iter().map(|(_, i)| self.points[i]).collect()
    }
}

/// Which box sides a point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct BorderContact {
    left: bool,
    right: bool,
    bottom: bool,
    top: bool,
}

impl BorderContact {
    fn of(p: DVec2, size: f64) -> Self {
        Self {
            left: approx_eq(p.x, 0.0),
            right: approx_eq(p.x, size),
            bottom: approx_eq(p.y, 0.0),
            top: approx_eq(p.y, size),
        }
    }

    fn is_interior(&self) -> bool {
        *self == Self::default()
    }

    /// A border vertex must stay on its sides; an interior one must stay off all of them
    fn allows(&self, target: DVec2, size: f64) -> bool {
        let target_contact = Self::of(target, size);
        if self.is_interior() {
            return target_contact.is_interior();
        }
        (!self.left || target_contact.left)
            && (!self.right || target_contact.right)
            && (!self.bottom || target_contact.bottom)
            && (!self.top || target_contact.top)
    }
}

/// Angle in degrees between the rays `corner→a` and `corner→b`
///
/// `None` when either ray has no length.
fn corner_angle(corner: DVec2, a: DVec2, b: DVec2) -> Option<f64> {
    let (u, v) = (a - corner, b - corner);
    let (lu, lv) = (u.length(), v.length());
    if lu < EPSILON || lv < EPSILON {
        return None;
    }
    let cos = (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

pub(crate) fn is_degenerate_corner(corner: DVec2, a: DVec2, b: DVec2) -> bool {
    match corner_angle(corner, a, b) {
        Some(angle) => {
            angle <= DEGENERATE_CORNER_DEGREES || angle >= 180.0 - DEGENERATE_CORNER_DEGREES
        }
        None => true,
    }
}

/// Whether the corner `polygon` makes at `vertex` is degenerate
///
/// Vertices that are not a plain ring corner of the polygon never are.
fn corner_is_degenerate(puzzle: &Puzzle, polygon: usize, vertex: VertexId) -> bool {
    let Some((first, second)) = puzzle.incident_edges(polygon, vertex) else {
        return false;
    };
    let (Some(a), Some(b)) = (first.other(vertex), second.other(vertex)) else {
        return false;
    };
    is_degenerate_corner(puzzle.vertex(vertex), puzzle.vertex(a), puzzle.vertex(b))
}

/// Move `vertex` to `target` unless that degenerates a corner of any owner
///
/// The corner at `vertex` is checked, and so are the corners at its two
/// ring neighbours once they sit on the lattice. Neighbours still waiting
/// to snap are checked when they move.
fn try_relocate(
    puzzle: &mut Puzzle,
    owners: &[usize],
    snapped: &[bool],
    vertex: VertexId,
    target: DVec2,
) -> bool {
    let original = puzzle.vertices[vertex];
    puzzle.vertices[vertex] = target;

    for &polygon in owners {
        let Some((first, second)) = puzzle.incident_edges(polygon, vertex) else {
            continue;
        };
        let (Some(a), Some(b)) = (first.other(vertex), second.other(vertex)) else {
            continue;
        };
        let degenerate = is_degenerate_corner(target, puzzle.vertex(a), puzzle.vertex(b))
            || [a, b]
                .into_iter()
                .any(|n| snapped[n] && corner_is_degenerate(puzzle, polygon, n));
        if degenerate {
            puzzle.vertices[vertex] = original;
            return false;
        }
    }
    true
}

/// Snap every arena vertex onto an integer lattice point, in arena order
///
/// Each vertex tries lattice points from nearest to farthest and keeps the
/// first one that leaves every owning polygon with proper corners at the
/// vertex and at its snapped neighbours. Border vertices only move along
/// their own box side.
pub fn snap_to_grid(puzzle: &mut Puzzle) -> Result<(), RetryReason> {
    let lattice = Lattice::new(puzzle.grid_size());
    let owners = puzzle.vertex_owners();
    let mut snapped = vec![false; puzzle.vertices.len()];

    for vertex in 0..puzzle.vertices.len() {
        let position = puzzle.vertices[vertex];
        let contact = BorderContact::of(position, lattice.size);
        let placed = lattice
            .by_distance(position)
            .into_iter()
            .filter(|&target| contact.allows(target, lattice.size))
            .any(|target| try_relocate(puzzle, &owners[vertex], &snapped, vertex, target));
        if !placed {
            return Err(RetryReason::UnsnappableVertex { vertex });
        }
        snapped[vertex] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Site;
    use crate::puzzle::Polygon;

    #[test]
    fn test_lattice_order_breaks_ties_by_enumeration() {
        let lattice = Lattice::new(3);
        assert_eq!(lattice.points().len(), 16);

        let order = lattice.by_distance(DVec2::new(1.5, 3.0));
        assert_eq!(order[0], DVec2::new(1.0, 3.0));
        assert_eq!(order[1], DVec2::new(2.0, 3.0));
    }

    #[test]
    fn test_corner_angles() {
        let o = DVec2::ZERO;
        assert!(!is_degenerate_corner(o, DVec2::X, DVec2::Y));
        assert!(is_degenerate_corner(o, DVec2::X, DVec2::new(1.0, 0.1)));
        assert!(is_degenerate_corner(o, DVec2::X, DVec2::new(-1.0, 0.1)));
        assert!(is_degenerate_corner(o, o, DVec2::Y));
    }

    #[test]
    fn test_border_contact_keeps_side() {
        let bottom = BorderContact::of(DVec2::new(1.4, 0.0), 3.0);
        assert!(bottom.allows(DVec2::new(1.0, 0.0), 3.0));
        assert!(!bottom.allows(DVec2::new(1.0, 1.0), 3.0));

        let interior = BorderContact::of(DVec2::new(1.4, 1.6), 3.0);
        assert!(interior.allows(DVec2::new(1.0, 2.0), 3.0));
        assert!(!interior.allows(DVec2::new(0.0, 2.0), 3.0));
    }

    /// Two quads sharing the edge between (1.4, 0) and (1.6, 3)
    fn split_square() -> Puzzle {
        let mut puzzle = Puzzle::new(3, vec![Site { id: 0, x: 1, y: 1 }, Site { id: 1, x: 2, y: 1 }]);
        let low = puzzle.intern_vertex(DVec2::new(1.4, 0.0));
        let high = puzzle.intern_vertex(DVec2::new(1.6, 3.0));
        let corners: Vec<_> = [(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0)]
            .iter()
            .map(|&(x, y)| puzzle.intern_vertex(DVec2::new(x, y)))
            .collect();
        puzzle.polygons.push(Polygon::new(0));
        puzzle.polygons.push(Polygon::new(1));
        let shared = puzzle.add_edge(low, high, false);
        for polygon in 0..2 {
            let edge = puzzle.edges[shared];
            puzzle.polygons[polygon].push_edge(shared, edge);
        }
        puzzle.connect(0, high, corners[1], true);
        puzzle.connect(0, corners[1], corners[0], true);
        puzzle.connect(0, corners[0], low, true);
        puzzle.connect(1, high, corners[2], true);
        puzzle.connect(1, corners[2], corners[3], true);
        puzzle.connect(1, corners[3], low, true);
        puzzle
    }

    #[test]
    fn test_snap_moves_shared_vertices_once() {
        let mut puzzle = split_square();
        snap_to_grid(&mut puzzle).unwrap();

        assert_eq!(puzzle.vertex(0), DVec2::new(1.0, 0.0));
        assert_eq!(puzzle.vertex(1), DVec2::new(2.0, 3.0));
        for p in puzzle.vertices() {
            assert_eq!(p.x.fract(), 0.0);
            assert_eq!(p.y.fract(), 0.0);
        }
        let total: f64 = (0..2).map(|p| puzzle.polygon_area(p).unwrap()).sum();
        assert_eq!(total, 9.0);
    }

    #[test]
    fn test_snap_keeps_snapped_neighbour_corner_proper() {
        // Ring (0,0) -> (1,1) -> (2.45,1.55) -> (4,0). The nearest lattice
        // point (2,2) is fine at the moving vertex but straightens (1,1).
        let mut puzzle = Puzzle::new(4, vec![Site { id: 0, x: 2, y: 1 }]);
        let bend = puzzle.intern_vertex(DVec2::new(1.0, 1.0));
        let moving = puzzle.intern_vertex(DVec2::new(2.45, 1.55));
        let origin = puzzle.intern_vertex(DVec2::ZERO);
        let corner = puzzle.intern_vertex(DVec2::new(4.0, 0.0));
        puzzle.polygons.push(Polygon::new(0));
        puzzle.connect(0, origin, bend, false);
        puzzle.connect(0, bend, moving, false);
        puzzle.connect(0, moving, corner, false);
        puzzle.connect(0, corner, origin, true);

        snap_to_grid(&mut puzzle).unwrap();

        assert_eq!(puzzle.vertex(moving), DVec2::new(2.0, 1.0));
        for vertex in [bend, moving, origin, corner] {
            assert!(!corner_is_degenerate(&puzzle, 0, vertex), "corner at {vertex}");
        }
    }
}
