//! Closing polygons that the bounding box cut open
//!
//! A cell that touches the grid border comes out of the subdivision as one
//! or two open chains whose loose ends sit on the box. Repair walks along
//! the box from one loose end to another, turning at corners, and adds the
//! walked segments as border edges.

use std::collections::HashMap;

use glam::DVec2;

use super::{Failure, RetryReason};
use crate::error::PuzzleError;
use crate::geometry::{approx_eq, points_coincide};
use crate::puzzle::{Edge, Puzzle, VertexId};

/// Direction of travel along the box, with y pointing up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Clockwise,
    CounterClockwise,
}

#[inline]
fn below(value: f64, limit: f64) -> bool {
    value < limit && !approx_eq(value, limit)
}

#[inline]
fn above(value: f64, limit: f64) -> bool {
    value > limit && !approx_eq(value, limit)
}

/// The box corner reached by following the border from `p`
///
/// `None` when `p` is not on the border.
fn next_corner(p: DVec2, size: f64, direction: Direction) -> Option<DVec2> {
    let top = approx_eq(p.y, size);
    let bottom = approx_eq(p.y, 0.0);
    let left = approx_eq(p.x, 0.0);
    let right = approx_eq(p.x, size);

    match direction {
        Direction::Clockwise => {
            if top && below(p.x, size) {
                Some(DVec2::new(size, size))
            } else if right && above(p.y, 0.0) {
                Some(DVec2::new(size, 0.0))
            } else if bottom && above(p.x, 0.0) {
                Some(DVec2::new(0.0, 0.0))
            } else if left && below(p.y, size) {
                Some(DVec2::new(0.0, size))
            } else {
                None
            }
        }
        Direction::CounterClockwise => {
            if top && above(p.x, 0.0) {
                Some(DVec2::new(0.0, size))
            } else if left && above(p.y, 0.0) {
                Some(DVec2::new(0.0, 0.0))
            } else if bottom && below(p.x, size) {
                Some(DVec2::new(size, 0.0))
            } else if right && below(p.y, size) {
                Some(DVec2::new(size, size))
            } else {
                None
            }
        }
    }
}

/// `p` lies strictly inside the axis-aligned segment `ab`
fn strictly_on_border_segment(p: DVec2, a: DVec2, b: DVec2) -> bool {
    let between = |v: f64, s: f64, t: f64| {
        let (lo, hi) = (s.min(t), s.max(t));
        above(v, lo) && below(v, hi)
    };
    if approx_eq(a.x, b.x) {
        approx_eq(p.x, a.x) && between(p.y, a.y, b.y)
    } else if approx_eq(a.y, b.y) {
        approx_eq(p.y, a.y) && between(p.x, a.x, b.x)
    } else {
        false
    }
}

/// Both points lie on the same side of the box
fn share_border_side(p: DVec2, q: DVec2, size: f64) -> bool {
    let on_vertical_side = |x: f64| approx_eq(x, 0.0) || approx_eq(x, size);
    let on_horizontal_side = |y: f64| approx_eq(y, 0.0) || approx_eq(y, size);
    (approx_eq(p.x, q.x) && on_vertical_side(p.x)) || (approx_eq(p.y, q.y) && on_horizontal_side(p.y))
}

/// Positions of every vertex owned by a polygon other than `polygon`
fn foreign_points(puzzle: &Puzzle, polygon: usize) -> Vec<DVec2> {
    puzzle
        .polygons()
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != polygon)
        .flat_map(|(_, other)| other.vertices.iter().map(|&v| puzzle.vertex(v)))
        .collect()
}

/// Corners to pass through when walking from `from` to `to` in `direction`
///
/// A hop is refused if another polygon has a vertex strictly inside it, or
/// if the corner it ends on already belongs to another polygon.
fn walk_border(puzzle: &Puzzle, polygon: usize, from: VertexId, to: VertexId, direction: Direction) -> Option<Vec<DVec2>> {
    let size = puzzle.grid_size() as f64;
    let foreign = foreign_points(puzzle, polygon);
    let blocked = |a: DVec2, b: DVec2| foreign.iter().any(|&p| strictly_on_border_segment(p, a, b));

    let target = puzzle.vertex(to);
    let mut current = puzzle.vertex(from);
    let mut corners = Vec::new();

    // Four corners at most, plus the final hop
    for _ in 0..5 {
        let corner = next_corner(current, size, direction)?;
        if strictly_on_border_segment(target, current, corner) || points_coincide(corner, target) {
            return (!blocked(current, target)).then_some(corners);
        }
        if blocked(current, corner) || foreign.iter().any(|&p| points_coincide(p, corner)) {
            return None;
        }
        corners.push(corner);
        current = corner;
    }
    None
}

fn find_border_path(puzzle: &Puzzle, polygon: usize, from: VertexId, to: VertexId) -> Option<Vec<DVec2>> {
    walk_border(puzzle, polygon, from, to, Direction::Clockwise)
        .or_else(|| walk_border(puzzle, polygon, from, to, Direction::CounterClockwise))
}

fn apply_border_path(puzzle: &mut Puzzle, polygon: usize, from: VertexId, corners: &[DVec2], to: VertexId) {
    let mut previous = from;
    for &corner in corners {
        let id = puzzle.intern_vertex(corner);
        puzzle.connect(polygon, previous, id, true);
        previous = id;
    }
    puzzle.connect(polygon, previous, to, true);
}

fn directly_connected(puzzle: &Puzzle, polygon: usize, a: VertexId, b: VertexId) -> bool {
    let wanted = Edge::new(a, b, false);
    puzzle.polygons()[polygon]
        .edges
        .iter()
        .any(|&e| puzzle.edges()[e] == wanted)
}

/// Vertices with a single incident edge, in the polygon's vertex order
///
/// # Errors
///
/// A vertex with three or more incident edges means the assembler produced
/// something no convex cell can, and is reported as fatal.
fn open_endpoints(puzzle: &Puzzle, polygon: usize) -> Result<Vec<VertexId>, Failure> {
    let degrees = puzzle.vertex_degrees(polygon);
    let mut open = Vec::new();
    for vertex in &puzzle.polygons()[polygon].vertices {
        match degrees.get(vertex).copied().unwrap_or(0) {
            1 => open.push(*vertex),
            d if d > 2 => {
                return Err(Failure::Fatal(PuzzleError::Internal(format!(
                    "vertex {vertex} of polygon {polygon} has {d} incident edges"
                ))))
            }
            _ => {}
        }
    }
    Ok(open)
}

/// Vertices of the open chain from loose end `start` to its other loose end
fn walk_chain(puzzle: &Puzzle, polygon: usize, start: VertexId, degrees: &HashMap<VertexId, usize>) -> Option<Vec<VertexId>> {
    let edges = &puzzle.polygons()[polygon].edges;
    let mut chain = vec![start];
    let mut previous_edge = None;
    let mut current = start;
    for _ in 0..=edges.len() {
        let next_edge = edges
            .iter()
            .copied()
            .find(|&e| Some(e) != previous_edge && puzzle.edges()[e].touches(current))?;
        current = puzzle.edges()[next_edge].other(current)?;
        chain.push(current);
        if degrees.get(&current) == Some(&1) {
            return Some(chain);
        }
        previous_edge = Some(next_edge);
    }
    None
}

fn chain_end(puzzle: &Puzzle, polygon: usize, start: VertexId, degrees: &HashMap<VertexId, usize>) -> Option<VertexId> {
    walk_chain(puzzle, polygon, start, degrees)?.last().copied()
}

/// Even-odd test for `p` inside the closed ring
fn ring_contains(ring: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Whether closing the single chain with `corners` puts the polygon's site inside
fn path_encloses_site(
    puzzle: &Puzzle,
    polygon: usize,
    from: VertexId,
    corners: &[DVec2],
    to: VertexId,
    degrees: &HashMap<VertexId, usize>,
) -> Option<bool> {
    let site_id = puzzle.polygons()[polygon].site;
    let site = puzzle.sites().iter().find(|s| s.id == site_id)?.position();
    let chain = walk_chain(puzzle, polygon, to, degrees)?;
    if chain.last() != Some(&from) {
        return None;
    }
    let mut ring = puzzle.ring_positions(&chain);
    ring.extend_from_slice(corners);
    Some(ring_contains(&ring, site))
}

/// Border path for a polygon with one open chain
///
/// Clockwise is preferred, unless both directions are free and only the
/// counter-clockwise one wraps the polygon around its own site.
fn close_single_chain(
    puzzle: &Puzzle,
    polygon: usize,
    from: VertexId,
    to: VertexId,
    degrees: &HashMap<VertexId, usize>,
) -> Option<Vec<DVec2>> {
    let clockwise = walk_border(puzzle, polygon, from, to, Direction::Clockwise);
    let counter = walk_border(puzzle, polygon, from, to, Direction::CounterClockwise);
    match (clockwise, counter) {
        (Some(cw), Some(ccw)) => {
            if path_encloses_site(puzzle, polygon, from, &cw, to, degrees) == Some(false) {
                Some(ccw)
            } else {
                Some(cw)
            }
        }
        (cw, ccw) => cw.or(ccw),
    }
}

/// Join loose ends that lie on the same box side with a single border edge
///
/// Ends with another polygon's vertex between them are left for the walk,
/// since the polygon must then reach round the rest of the box.
fn join_same_side(puzzle: &mut Puzzle, polygon: usize, open: &mut Vec<VertexId>) {
    let size = puzzle.grid_size() as f64;
    let foreign = foreign_points(puzzle, polygon);
    let mut i = 0;
    while i < open.len() {
        let p = puzzle.vertex(open[i]);
        let partner = (i + 1..open.len()).find(|&j| {
            let q = puzzle.vertex(open[j]);
            share_border_side(p, q, size)
                && !directly_connected(puzzle, polygon, open[i], open[j])
                && !foreign.iter().any(|&f| strictly_on_border_segment(f, p, q))
        });
        match partner {
            Some(j) => {
                puzzle.connect(polygon, open[i], open[j], true);
                open.remove(j);
                open.remove(i);
            }
            None => i += 1,
        }
    }
}

/// Pair four loose ends so that no pair closes a chain onto itself
fn repair_two_chains(puzzle: &mut Puzzle, polygon: usize, open: &[VertexId], degrees: &HashMap<VertexId, usize>) -> Result<(), Failure> {
    let [a, b, c, d] = *open else {
        return Err(RetryReason::OpenEndpoints { polygon, count: open.len() }.into());
    };
    let mate = chain_end(puzzle, polygon, a, degrees);

    let pairings = [[(a, b), (c, d)], [(a, c), (b, d)], [(a, d), (b, c)]];
    for pairing in pairings {
        if pairing.iter().any(|&(x, y)| {
            (x == a && Some(y) == mate) || directly_connected(puzzle, polygon, x, y)
        }) {
            continue;
        }
        let paths: Option<Vec<_>> = pairing
            .iter()
            .map(|&(from, to)| find_border_path(puzzle, polygon, from, to).map(|path| (from, path, to)))
            .collect();
        if let Some(paths) = paths {
            for (from, corners, to) in paths {
                apply_border_path(puzzle, polygon, from, &corners, to);
            }
            return Ok(());
        }
    }
    Err(RetryReason::UnrepairableBorder { polygon }.into())
}

fn repair_polygon(puzzle: &mut Puzzle, polygon: usize) -> Result<(), Failure> {
    let mut open = open_endpoints(puzzle, polygon)?;
    if open.is_empty() {
        return Ok(());
    }

    join_same_side(puzzle, polygon, &mut open);
    let degrees = puzzle.vertex_degrees(polygon);

    match open.len() {
        0 => Ok(()),
        2 => {
            let corners = close_single_chain(puzzle, polygon, open[0], open[1], &degrees)
                .ok_or(RetryReason::UnrepairableBorder { polygon })?;
            apply_border_path(puzzle, polygon, open[0], &corners, open[1]);
            Ok(())
        }
        4 => repair_two_chains(puzzle, polygon, &open, &degrees),
        count => Err(RetryReason::OpenEndpoints { polygon, count }.into()),
    }
}

/// Close every polygon of the puzzle, in polygon order
///
/// Polygons repaired earlier claim their corners, which steers the walks
/// of later polygons.
pub(crate) fn repair_borders(puzzle: &mut Puzzle) -> Result<(), Failure> {
    for polygon in 0..puzzle.polygons().len() {
        repair_polygon(puzzle, polygon)?;
    }
    Ok(())
}
