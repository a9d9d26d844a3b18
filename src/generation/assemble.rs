//! Group subdivision edges into one polygon per site

use std::collections::HashMap;

use super::sites::Site;
use super::voronoi::Subdivision;
use crate::geometry::points_coincide;
use crate::puzzle::{Polygon, Puzzle};

/// Build the attempt's [`Puzzle`] from a clipped subdivision
///
/// Each edge is appended to the polygons of both sites it separates.
/// Endpoints are interned with tolerance so neighbours share vertex ids.
/// Edges that have collapsed to a point are dropped, though their sites
/// still get a polygon.
pub fn assemble_polygons(subdivision: &Subdivision, sites: &[Site]) -> Puzzle {
    let mut puzzle = Puzzle::new(subdivision.grid_size, sites.to_vec());
    let mut by_site: HashMap<usize, usize> = HashMap::new();

    let mut polygon_for = |puzzle: &mut Puzzle, site: usize| -> usize {
        *by_site.entry(site).or_insert_with(|| {
            puzzle.polygons.push(Polygon::new(site));
            puzzle.polygons.len() - 1
        })
    };

    for edge in &subdivision.edges {
        let left = polygon_for(&mut puzzle, edge.left_site);
        let right = polygon_for(&mut puzzle, edge.right_site);

        if points_coincide(edge.start, edge.end) {
            continue;
        }
        let a = puzzle.intern_vertex(edge.start);
        let b = puzzle.intern_vertex(edge.end);
        if a == b {
            continue;
        }

        let id = puzzle.add_edge(a, b, false);
        let shared = puzzle.edges[id];
        puzzle.polygons[left].push_edge(id, shared);
        puzzle.polygons[right].push_edge(id, shared);
    }

    puzzle
}
