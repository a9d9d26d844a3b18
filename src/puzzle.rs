//! The mutable polygon set a single generation attempt works on
//!
//! Vertices live in one arena and polygons refer to them by [`VertexId`], so
//! a vertex shared by neighbouring polygons is moved once and every owner
//! sees the new position. A `Puzzle` is thrown away whole when an attempt is
//! retried.

use std::collections::HashMap;

use glam::DVec2;

use crate::generation::Site;
use crate::geometry::{points_coincide, signed_area};

/// Index into [`Puzzle::vertices`]
pub type VertexId = usize;

/// Index into [`Puzzle::edges`]
pub type EdgeId = usize;

/// A segment between two arena vertices
///
/// `border` marks edges synthesized along the bounding box during repair.
/// Equality ignores direction and the border flag.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
    pub border: bool,
}

impl Edge {
    pub fn new(a: VertexId, b: VertexId, border: bool) -> Self {
        Self { a, b, border }
    }

    #[inline]
    pub fn touches(&self, vertex: VertexId) -> bool {
        self.a == vertex || self.b == vertex
    }

    /// The endpoint opposite `vertex`, if `vertex` is an endpoint at all
    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if self.a == vertex {
            Some(self.b)
        } else if self.b == vertex {
            Some(self.a)
        } else {
            None
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// One puzzle piece while it is being assembled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    /// Id of the site whose cell this polygon is
    pub site: usize,
    /// Vertices in the order they were first seen
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

impl Polygon {
    pub fn new(site: usize) -> Self {
        Self { site, ..Self::default() }
    }

    pub(crate) fn push_edge(&mut self, id: EdgeId, edge: Edge) {
        for vertex in [edge.a, edge.b] {
            if !self.vertices.contains(&vertex) {
                self.vertices.push(vertex);
            }
        }
        self.edges.push(id);
    }
}

/// Grid, vertex arena, edge list and polygons of one attempt
#[derive(Debug, Clone)]
pub struct Puzzle {
    grid_size: u32,
    sites: Vec<Site>,
    pub(crate) vertices: Vec<DVec2>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) polygons: Vec<Polygon>,
}

impl Puzzle {
    pub fn new(grid_size: u32, sites: Vec<Site>) -> Self {
        Self {
            grid_size,
            sites,
            vertices: Vec::new(),
            edges: Vec::new(),
            polygons: Vec::new(),
        }
    }

    #[inline]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> DVec2 {
        self.vertices[id]
    }

    /// First arena vertex tolerance-equal to `point`
    pub fn find_vertex(&self, point: DVec2) -> Option<VertexId> {
        self.vertices.iter().position(|&v| points_coincide(v, point))
    }

    /// Reuse a tolerance-equal vertex or append a new one
    pub fn intern_vertex(&mut self, point: DVec2) -> VertexId {
        match self.find_vertex(point) {
            Some(id) => id,
            None => {
                self.vertices.push(point);
                self.vertices.len() - 1
            }
        }
    }

    pub fn add_edge(&mut self, a: VertexId, b: VertexId, border: bool) -> EdgeId {
        self.edges.push(Edge::new(a, b, border));
        self.edges.len() - 1
    }

    /// Append a new edge to the global list and to polygon `polygon`
    pub(crate) fn connect(&mut self, polygon: usize, a: VertexId, b: VertexId, border: bool) {
        let id = self.add_edge(a, b, border);
        let edge = self.edges[id];
        self.polygons[polygon].push_edge(id, edge);
    }

    /// For every vertex, the polygons that list it
    pub fn vertex_owners(&self) -> Vec<Vec<usize>> {
        let mut owners = vec![Vec::new(); self.vertices.len()];
        for (index, polygon) in self.polygons.iter().enumerate() {
            for &vertex in &polygon.vertices {
                owners[vertex].push(index);
            }
        }
        owners
    }

    /// Number of polygon edges incident to each vertex of `polygon`
    pub fn vertex_degrees(&self, polygon: usize) -> HashMap<VertexId, usize> {
        let mut degrees = HashMap::new();
        for &edge in &self.polygons[polygon].edges {
            let edge = self.edges[edge];
            *degrees.entry(edge.a).or_insert(0) += 1;
            *degrees.entry(edge.b).or_insert(0) += 1;
        }
        degrees
    }

    /// The two polygon edges meeting at `vertex`, if there are exactly two
    pub fn incident_edges(&self, polygon: usize, vertex: VertexId) -> Option<(Edge, Edge)> {
        let mut incident = self.polygons[polygon]
            .edges
            .iter()
            .map(|&e| self.edges[e])
            .filter(|e| e.touches(vertex));
        let first = incident.next()?;
        let second = incident.next()?;
        match incident.next() {
            Some(_) => None,
            None => Some((first, second)),
        }
    }

    /// Walk the polygon's edges into one ordered closed ring
    ///
    /// Returns `None` unless the edges form exactly one cycle through at
    /// least three vertices with every vertex used by exactly two edges.
    pub fn polygon_ring(&self, polygon: usize) -> Option<Vec<VertexId>> {
        let edges = &self.polygons[polygon].edges;
        if edges.len() < 3 {
            return None;
        }
        if self.vertex_degrees(polygon).values().any(|&d| d != 2) {
            return None;
        }

        let start = self.edges[edges[0]];
        let mut ring = vec![start.a];
        let mut previous_edge = edges[0];
        let mut current = start.b;
        while current != start.a {
            if ring.len() > edges.len() {
                return None;
            }
            ring.push(current);
            let next_edge = edges
                .iter()
                .copied()
                .find(|&e| e != previous_edge && self.edges[e].touches(current))?;
            current = self.edges[next_edge].other(current)?;
            previous_edge = next_edge;
        }

        (ring.len() == edges.len()).then_some(ring)
    }

    pub fn ring_positions(&self, ring: &[VertexId]) -> Vec<DVec2> {
        ring.iter().map(|&v| self.vertices[v]).collect()
    }

    /// Absolute shoelace area of a closed polygon
    pub fn polygon_area(&self, polygon: usize) -> Option<f64> {
        let ring = self.polygon_ring(polygon)?;
        Some(signed_area(&self.ring_positions(&ring)).abs())
    }
}
