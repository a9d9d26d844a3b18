//! Merging vertices that snapping made coincide

use glam::DVec2;

use crate::geometry::points_coincide;
use crate::puzzle::{Edge, Puzzle};

/// Merge tolerance-equal vertices and drop edges that collapsed to a point
///
/// Vertex and edge ids are renumbered; polygons keep their first-seen order.
pub fn remove_duplicates(puzzle: &mut Puzzle) {
    let mut kept: Vec<DVec2> = Vec::with_capacity(puzzle.vertices.len());
    let remap: Vec<usize> = puzzle
        .vertices
        .iter()
        .map(|&p| match kept.iter().position(|&q| points_coincide(p, q)) {
            Some(existing) => existing,
            None => {
                kept.push(p);
                kept.len() - 1
            }
        })
        .collect();
    puzzle.vertices = kept;

    let mut edge_remap = vec![None; puzzle.edges.len()];
    let mut edges = Vec::with_capacity(puzzle.edges.len());
    for (id, edge) in puzzle.edges.iter().enumerate() {
        let (a, b) = (remap[edge.a], remap[edge.b]);
        if a == b {
            continue;
        }
        edge_remap[id] = Some(edges.len());
        edges.push(Edge::new(a, b, edge.border));
    }
    puzzle.edges = edges;

    for polygon in &mut puzzle.polygons {
        let mut vertices = Vec::with_capacity(polygon.vertices.len());
        for &v in &polygon.vertices {
            let v = remap[v];
            if !vertices.contains(&v) {
                vertices.push(v);
            }
        }
        polygon.vertices = vertices;

        let mut kept_edges = Vec::with_capacity(polygon.edges.len());
        for &e in &polygon.edges {
            if let Some(e) = edge_remap[e] {
                if !kept_edges.contains(&e) {
                    kept_edges.push(e);
                }
            }
        }
        polygon.edges = kept_edges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Polygon;

    #[test]
    fn test_coincident_vertices_merge() {
        let mut puzzle = Puzzle::new(2, Vec::new());
        puzzle.vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
        ];
        puzzle.polygons.push(Polygon::new(0));
        puzzle.connect(0, 0, 1, false);
        puzzle.connect(0, 1, 2, false);
        puzzle.connect(0, 2, 3, false);
        puzzle.connect(0, 3, 0, false);

        remove_duplicates(&mut puzzle);

        assert_eq!(puzzle.vertices().len(), 3);
        assert_eq!(puzzle.edges().len(), 3);
        assert_eq!(puzzle.polygons()[0].vertices, vec![0, 1, 2]);
        assert_eq!(puzzle.polygons()[0].edges, vec![0, 1, 2]);
        assert_eq!(puzzle.polygon_area(0), Some(0.5));
    }

    #[test]
    fn test_distinct_vertices_untouched() {
        let mut puzzle = Puzzle::new(2, Vec::new());
        puzzle.vertices = vec![DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0)];
        puzzle.add_edge(0, 1, true);
        remove_duplicates(&mut puzzle);
        assert_eq!(puzzle.vertices().len(), 2);
        assert_eq!(puzzle.edges().len(), 1);
        assert!(puzzle.edges()[0].border);
    }
}
