//! Bounded Voronoi edges by Fortune's sweep
//!
//! The sweep line advances in increasing y. Active parabolic arcs live in an
//! arena red-black tree ordered left to right, and site and circle events
//! share one priority queue ordered by (y, x) with circle events first on an
//! exact tie. A circle event carries the generation stamp its arc had when
//! it was scheduled; any later change to the arc bumps the stamp and the
//! stale event is dropped when popped.
//!
//! After the sweep every edge is completed and clipped against the box
//! `[0, grid_size]²`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use glam::DVec2;
use ordered_float::OrderedFloat;
use thiserror::Error;

use super::beachline::{NodeId, RbArena};
use super::sites::Site;
use crate::geometry::EPSILON;

/// Breakpoint comparisons closer than this fall into the tie cases
const BREAKPOINT_TOLERANCE: f64 = 1e-9;

/// Circle events this close to a vertex collapse together with it
const COCIRCULAR_TOLERANCE: f64 = 1e-9;

/// Triples whose determinant exceeds this do not converge
const CONVERGENCE_TOLERANCE: f64 = -2e-12;

/// One clipped edge of the diagram, separating two sites
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiEdge {
    pub left_site: usize,
    pub right_site: usize,
    pub start: DVec2,
    pub end: DVec2,
}

/// Every clipped edge of one diagram
#[derive(Debug, Clone, PartialEq)]
pub struct Subdivision {
    pub grid_size: u32,
    pub edges: Vec<VoronoiEdge>,
}

/// Why a sweep result cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SweepError {
    #[error("edge endpoint ({x}, {y}) lies outside the grid")]
    NegativeCoordinate { x: f64, y: f64 },
    #[error("edge endpoint is not a finite number")]
    NonFinite,
    #[error("beachline lost a neighbouring arc")]
    BrokenBeachline,
}

#[derive(Debug, Clone, Copy)]
struct CircleEvent {
    center: DVec2,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Arc {
    site: usize,
    edge: Option<usize>,
    circle: Option<CircleEvent>,
    generation: u32,
}

impl Arc {
    fn new(site: usize) -> Self {
        Self { site, edge: None, circle: None, generation: 0 }
    }
}

#[derive(Debug, Clone)]
struct PartialEdge {
    left: usize,
    right: usize,
    start: Option<DVec2>,
    end: Option<DVec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Circle { arc: NodeId, generation: u32 },
    Site(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueuedEvent {
    y: OrderedFloat<f64>,
    x: OrderedFloat<f64>,
    kind: EventKind,
}

struct Sweep<'a> {
    sites: &'a [DVec2],
    size: f64,
    beachline: RbArena<Arc>,
    queue: BinaryHeap<Reverse<QueuedEvent>>,
    edges: Vec<PartialEdge>,
}

impl<'a> Sweep<'a> {
    fn new(sites: &'a [DVec2], size: f64) -> Self {
        let queue = sites
            .iter()
            .enumerate()
            .map(|(index, site)| {
                Reverse(QueuedEvent {
                    y: OrderedFloat(site.y),
                    x: OrderedFloat(site.x),
                    kind: EventKind::Site(index),
                })
            })
            .collect();
        Self {
            sites,
            size,
            beachline: RbArena::new(),
            queue,
            edges: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<Vec<PartialEdge>, SweepError> {
        while let Some(Reverse(event)) = self.queue.pop() {
            match event.kind {
                EventKind::Site(site) => self.add_arc(site)?,
                EventKind::Circle { arc, generation } => {
                    let live = self
                        .beachline
                        .get(arc)
                        .circle
                        .is_some_and(|c| c.generation == generation);
                    if live {
                        self.remove_arc(arc)?;
                    }
                }
            }
        }
        Ok(std::mem::take(&mut self.edges))
    }

    fn site_of(&self, arc: NodeId) -> usize {
        self.beachline.get(arc).site
    }

    fn left_break_point(&self, arc: NodeId, directrix: f64) -> f64 {
        let focus = self.sites[self.site_of(arc)];
        let pby2 = focus.y - directrix;
        if pby2 == 0.0 {
            return focus.x;
        }
        let Some(left) = self.beachline.prev(arc) else {
            return f64::NEG_INFINITY;
        };
        let left_focus = self.sites[self.site_of(left)];
        let plby2 = left_focus.y - directrix;
        if plby2 == 0.0 {
            return left_focus.x;
        }

        let hl = left_focus.x - focus.x;
        let aby2 = 1.0 / pby2 - 1.0 / plby2;
        let b = hl / plby2;
        if aby2 != 0.0 {
            let c = hl * hl / (-2.0 * plby2) - left_focus.y + plby2 / 2.0 + focus.y - pby2 / 2.0;
            return (-b + (b * b - 2.0 * aby2 * c).sqrt()) / aby2 + focus.x;
        }
        (focus.x + left_focus.x) / 2.0
    }

    fn right_break_point(&self, arc: NodeId, directrix: f64) -> f64 {
        if let Some(right) = self.beachline.next(arc) {
            return self.left_break_point(right, directrix);
        }
        let focus = self.sites[self.site_of(arc)];
        if focus.y == directrix {
            focus.x
        } else {
            f64::INFINITY
        }
    }

    fn create_edge(&mut self, left: usize, right: usize, start: Option<DVec2>, end: Option<DVec2>) -> usize {
        let id = self.edges.len();
        self.edges.push(PartialEdge { left, right, start: None, end: None });
        if let Some(start) = start {
            self.set_edge_start(id, left, right, start);
        }
        if let Some(end) = end {
            self.set_edge_start(id, right, left, end);
        }
        id
    }

    /// Record `vertex` on the end of `edge` that belongs to the `left`→`right` direction
    fn set_edge_start(&mut self, edge: usize, left: usize, right: usize, vertex: DVec2) {
        let edge = &mut self.edges[edge];
        if edge.start.is_none() && edge.end.is_none() {
            edge.start = Some(vertex);
            edge.left = left;
            edge.right = right;
        } else if edge.left == right {
            edge.end = Some(vertex);
        } else {
            edge.start = Some(vertex);
        }
    }

    fn detach_circle_event(&mut self, arc: NodeId) {
        let arc = self.beachline.get_mut(arc);
        if arc.circle.take().is_some() {
            arc.generation = arc.generation.wrapping_add(1);
        }
    }

    fn detach_arc(&mut self, arc: NodeId) {
        self.detach_circle_event(arc);
        self.beachline.remove(arc);
    }

    fn attach_circle_event(&mut self, arc: NodeId) {
        let (Some(left), Some(right)) = (self.beachline.prev(arc), self.beachline.next(arc)) else {
            return;
        };
        let (left_site, right_site) = (self.site_of(left), self.site_of(right));
        if left_site == right_site {
            return;
        }

        let b = self.sites[self.site_of(arc)];
        let a = self.sites[left_site] - b;
        let c = self.sites[right_site] - b;

        let d = 2.0 * (a.x * c.y - a.y * c.x);
        if d >= CONVERGENCE_TOLERANCE {
            return;
        }

        let ha = a.length_squared();
        let hc = c.length_squared();
        let x = (c.y * ha - a.y * hc) / d;
        let y = (a.x * hc - c.x * ha) / d;
        let center = DVec2::new(x + b.x, y + b.y);
        let bottom = center.y + (x * x + y * y).sqrt();

        let node = self.beachline.get_mut(arc);
        node.generation = node.generation.wrapping_add(1);
        let generation = node.generation;
        node.circle = Some(CircleEvent { center, generation });
        self.queue.push(Reverse(QueuedEvent {
            y: OrderedFloat(bottom),
            x: OrderedFloat(center.x),
            kind: EventKind::Circle { arc, generation },
        }));
    }

    fn add_arc(&mut self, site: usize) -> Result<(), SweepError> {
        let DVec2 { x, y: directrix } = self.sites[site];

        let mut left_arc = None;
        let mut right_arc = None;
        let mut node = self.beachline.root();
        while let Some(current) = node {
            let dxl = self.left_break_point(current, directrix) - x;
            if dxl > BREAKPOINT_TOLERANCE {
                node = self.beachline.left(current);
                continue;
            }
            let dxr = x - self.right_break_point(current, directrix);
            if dxr > BREAKPOINT_TOLERANCE {
                match self.beachline.right(current) {
                    Some(right) => node = Some(right),
                    None => {
                        left_arc = Some(current);
                        break;
                    }
                }
                continue;
            }
            if dxl > -BREAKPOINT_TOLERANCE {
                left_arc = self.beachline.prev(current);
                right_arc = Some(current);
            } else if dxr > -BREAKPOINT_TOLERANCE {
                left_arc = Some(current);
                right_arc = self.beachline.next(current);
            } else {
                left_arc = Some(current);
                right_arc = Some(current);
            }
            break;
        }

        let new_arc = self.beachline.insert_after(left_arc, Arc::new(site));

        match (left_arc, right_arc) {
            (None, None) => Ok(()),

            // New arc falls strictly inside an existing one: split it
            (Some(left), Some(right)) if left == right => {
                self.detach_circle_event(left);
                let split_site = self.site_of(left);
                let split = self.beachline.insert_after(Some(new_arc), Arc::new(split_site));
                let edge = self.create_edge(split_site, site, None, None);
                self.beachline.get_mut(new_arc).edge = Some(edge);
                self.beachline.get_mut(split).edge = Some(edge);
                self.attach_circle_event(left);
                self.attach_circle_event(split);
                Ok(())
            }

            // Rightmost arc, only possible while sites share the first row
            (Some(left), None) => {
                let edge = self.create_edge(self.site_of(left), site, None, None);
                self.beachline.get_mut(new_arc).edge = Some(edge);
                Ok(())
            }

            // New arc lands exactly on a breakpoint
            (Some(left), Some(right)) => {
                self.detach_circle_event(left);
                self.detach_circle_event(right);

                let (left_site, right_site) = (self.site_of(left), self.site_of(right));
                let a = self.sites[left_site];
                let b = self.sites[site] - a;
                let c = self.sites[right_site] - a;
                let d = 2.0 * (b.x * c.y - b.y * c.x);
                let hb = b.length_squared();
                let hc = c.length_squared();
                let vertex = DVec2::new(
                    (c.y * hb - b.y * hc) / d + a.x,
                    (b.x * hc - c.x * hb) / d + a.y,
                );

                let right_edge = self.beachline.get(right).edge.ok_or(SweepError::BrokenBeachline)?;
                self.set_edge_start(right_edge, left_site, right_site, vertex);

                let edge = self.create_edge(left_site, site, None, Some(vertex));
                self.beachline.get_mut(new_arc).edge = Some(edge);
                let edge = self.create_edge(site, right_site, None, Some(vertex));
                self.beachline.get_mut(right).edge = Some(edge);

                self.attach_circle_event(left);
                self.attach_circle_event(right);
                Ok(())
            }

            (None, Some(_)) => Err(SweepError::BrokenBeachline),
        }
    }

    fn collapses_at(&self, arc: NodeId, vertex: DVec2) -> bool {
        self.beachline.get(arc).circle.is_some_and(|c| {
            (vertex.x - c.center.x).abs() < COCIRCULAR_TOLERANCE
                && (vertex.y - c.center.y).abs() < COCIRCULAR_TOLERANCE
        })
    }

    fn remove_arc(&mut self, arc: NodeId) -> Result<(), SweepError> {
        let vertex = self
            .beachline
            .get(arc)
            .circle
            .ok_or(SweepError::BrokenBeachline)?
            .center;
        let mut previous = self.beachline.prev(arc);
        let mut next = self.beachline.next(arc);

        let mut disappearing = VecDeque::from([arc]);
        self.detach_arc(arc);

        // Neighbours whose circle events share this vertex vanish too
        let mut left = previous.ok_or(SweepError::BrokenBeachline)?;
        while self.collapses_at(left, vertex) {
            previous = self.beachline.prev(left);
            disappearing.push_front(left);
            self.detach_arc(left);
            left = previous.ok_or(SweepError::BrokenBeachline)?;
        }
        disappearing.push_front(left);
        self.detach_circle_event(left);

        let mut right = next.ok_or(SweepError::BrokenBeachline)?;
        while self.collapses_at(right, vertex) {
            next = self.beachline.next(right);
            disappearing.push_back(right);
            self.detach_arc(right);
            right = next.ok_or(SweepError::BrokenBeachline)?;
        }
        disappearing.push_back(right);
        self.detach_circle_event(right);

        for i in 1..disappearing.len() {
            let (l, r) = (disappearing[i - 1], disappearing[i]);
            let edge = self.beachline.get(r).edge.ok_or(SweepError::BrokenBeachline)?;
            self.set_edge_start(edge, self.site_of(l), self.site_of(r), vertex);
        }

        let first = disappearing[0];
        let last = disappearing[disappearing.len() - 1];
        let edge = self.create_edge(self.site_of(first), self.site_of(last), None, Some(vertex));
        self.beachline.get_mut(last).edge = Some(edge);

        self.attach_circle_event(first);
        self.attach_circle_event(last);
        Ok(())
    }

    /// Give a half-open edge its missing endpoint on the box boundary
    ///
    /// Returns `false` when the edge misses the box entirely.
    fn connect_edge(&self, edge: &mut PartialEdge) -> bool {
        if edge.end.is_some() {
            return true;
        }

        let (xl, xr, yt, yb) = (0.0, self.size, 0.0, self.size);
        let l = self.sites[edge.left];
        let r = self.sites[edge.right];
        let fx = (l.x + r.x) / 2.0;
        let fy = (l.y + r.y) / 2.0;
        let mut start = edge.start;
        let end;

        if r.y == l.y {
            // Vertical bisector
            if fx < xl || fx >= xr {
                return false;
            }
            if l.x > r.x {
                match start {
                    Some(s) if s.y >= yt => {
                        if s.y >= yb {
                            return false;
                        }
                    }
                    _ => start = Some(DVec2::new(fx, yt)),
                }
                end = DVec2::new(fx, yb);
            } else {
                match start {
                    Some(s) if s.y <= yb => {
                        if s.y < yt {
                            return false;
                        }
                    }
                    _ => start = Some(DVec2::new(fx, yb)),
                }
                end = DVec2::new(fx, yt);
            }
        } else {
            let fm = (l.x - r.x) / (r.y - l.y);
            let fb = fy - fm * fx;
            if !(-1.0..=1.0).contains(&fm) {
                // Steep: run from top to bottom or the reverse
                if l.x > r.x {
                    match start {
                        Some(s) if s.y >= yt => {
                            if s.y >= yb {
                                return false;
                            }
                        }
                        _ => start = Some(DVec2::new((yt - fb) / fm, yt)),
                    }
                    end = DVec2::new((yb - fb) / fm, yb);
                } else {
                    match start {
                        Some(s) if s.y <= yb => {
                            if s.y < yt {
                                return false;
                            }
                        }
                        _ => start = Some(DVec2::new((yb - fb) / fm, yb)),
                    }
                    end = DVec2::new((yt - fb) / fm, yt);
                }
            } else if l.y < r.y {
                match start {
                    Some(s) if s.x >= xl => {
                        if s.x >= xr {
                            return false;
                        }
                    }
                    _ => start = Some(DVec2::new(xl, fm * xl + fb)),
                }
                end = DVec2::new(xr, fm * xr + fb);
            } else {
                match start {
                    Some(s) if s.x <= xr => {
                        if s.x < xl {
                            return false;
                        }
                    }
                    _ => start = Some(DVec2::new(xr, fm * xr + fb)),
                }
                end = DVec2::new(xl, fm * xl + fb);
            }
        }

        edge.start = start;
        edge.end = Some(end);
        true
    }

    /// Liang-Barsky clip of a complete edge against the box
    fn clip_edge(&self, edge: &mut PartialEdge) -> bool {
        let (Some(a), Some(b)) = (edge.start, edge.end) else {
            return false;
        };
        let delta = b - a;
        let mut t0 = 0.0;
        let mut t1 = 1.0;

        let limits = [
            (-delta.x, a.x),
            (delta.x, self.size - a.x),
            (-delta.y, a.y),
            (delta.y, self.size - a.y),
        ];
        for (p, q) in limits {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return false;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }

        if t0 > 0.0 {
            edge.start = Some(a + delta * t0);
        }
        if t1 < 1.0 {
            edge.end = Some(a + delta * t1);
        }
        true
    }

    /// Pull coordinates within tolerance of a box side exactly onto it
    fn settle_on_border(&self, point: DVec2) -> DVec2 {
        let settle = |c: f64| {
            if c.abs() < EPSILON {
                0.0
            } else if (c - self.size).abs() < EPSILON * self.size.max(1.0) {
                self.size
            } else {
                c
            }
        };
        DVec2::new(settle(point.x), settle(point.y))
    }
}

/// Build the clipped Voronoi edges of `sites` inside `[0, grid_size]²`
///
/// # Errors
///
/// Returns a [`SweepError`] when the result is unusable: an endpoint that
/// is negative or not finite, or an inconsistent beachline. Near-degenerate
/// site layouts can produce these, and the caller resamples.
pub fn build_subdivision(sites: &[Site], grid_size: u32) -> Result<Subdivision, SweepError> {
    let positions: Vec<DVec2> = sites.iter().map(Site::position).collect();
    let mut sweep = Sweep::new(&positions, grid_size as f64);
    let partial = sweep.run()?;

    let mut edges = Vec::with_capacity(partial.len());
    for mut edge in partial {
        if !sweep.connect_edge(&mut edge) || !sweep.clip_edge(&mut edge) {
            continue;
        }
        let (Some(start), Some(end)) = (edge.start, edge.end) else {
            continue;
        };
        let (start, end) = (sweep.settle_on_border(start), sweep.settle_on_border(end));

        for point in [start, end] {
            if !point.is_finite() {
                return Err(SweepError::NonFinite);
            }
            if point.x < -EPSILON || point.y < -EPSILON {
                return Err(SweepError::NegativeCoordinate { x: point.x, y: point.y });
            }
        }

        edges.push(VoronoiEdge {
            left_site: sites[edge.left].id,
            right_site: sites[edge.right].id,
            start,
            end,
        });
    }

    tracing::trace!(sites = sites.len(), edges = edges.len(), "sweep finished");
    Ok(Subdivision { grid_size, edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::points_coincide;

    fn sites(points: &[(i32, i32)]) -> Vec<Site> {
        points
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Site { id, x, y })
            .collect()
    }

    fn assert_inside(subdivision: &Subdivision) {
        let size = subdivision.grid_size as f64;
        for edge in &subdivision.edges {
            for p in [edge.start, edge.end] {
                assert!(p.x >= 0.0 && p.x <= size && p.y >= 0.0 && p.y <= size, "{p:?}");
            }
        }
    }

    /// Every edge point is equidistant from its two sites
    fn assert_bisectors(subdivision: &Subdivision, sites: &[Site]) {
        for edge in &subdivision.edges {
            let l = sites[edge.left_site].position();
            let r = sites[edge.right_site].position();
            for p in [edge.start, edge.end, (edge.start + edge.end) / 2.0] {
                assert!((p.distance(l) - p.distance(r)).abs() < 1e-9, "{edge:?}");
            }
        }
    }

    #[test]
    fn test_two_sites_same_row() {
        let sites = sites(&[(1, 1), (2, 1)]);
        let subdivision = build_subdivision(&sites, 3).unwrap();

        assert_eq!(subdivision.edges.len(), 1);
        let edge = subdivision.edges[0];
        assert_eq!(edge.start.x, 1.5);
        assert_eq!(edge.end.x, 1.5);
        assert_eq!(edge.start.y.min(edge.end.y), 0.0);
        assert_eq!(edge.start.y.max(edge.end.y), 3.0);
    }

    #[test]
    fn test_two_sites_diagonal_hits_corners() {
        let sites = sites(&[(1, 1), (2, 2)]);
        let subdivision = build_subdivision(&sites, 3).unwrap();

        assert_eq!(subdivision.edges.len(), 1);
        let edge = subdivision.edges[0];
        let ends = [edge.start, edge.end];
        assert!(ends.iter().any(|&p| points_coincide(p, DVec2::new(0.0, 3.0))));
        assert!(ends.iter().any(|&p| points_coincide(p, DVec2::new(3.0, 0.0))));
    }

    #[test]
    fn test_three_sites_meet_at_one_vertex() {
        let sites = sites(&[(1, 1), (3, 1), (2, 3)]);
        let subdivision = build_subdivision(&sites, 4).unwrap();

        assert_eq!(subdivision.edges.len(), 3);
        assert_inside(&subdivision);
        assert_bisectors(&subdivision, &sites);

        // Circumcenter of the three sites
        let center = DVec2::new(2.0, 1.75);
        for edge in &subdivision.edges {
            assert!(points_coincide(edge.start, center) || points_coincide(edge.end, center));
        }
    }

    #[test]
    fn test_cocircular_sites_collapse() {
        let sites = sites(&[(1, 1), (2, 1), (1, 2), (2, 2)]);
        let subdivision = build_subdivision(&sites, 3).unwrap();

        assert_inside(&subdivision);
        assert_bisectors(&subdivision, &sites);
        // The square's diagonal neighbours touch only at the centre
        assert_eq!(subdivision.edges.len(), 4);
        let center = DVec2::new(1.5, 1.5);
        for edge in &subdivision.edges {
            assert!(points_coincide(edge.start, center) || points_coincide(edge.end, center));
        }
    }

    #[test]
    fn test_full_lattice_stays_in_box() {
        let points: Vec<(i32, i32)> = (1..=5).flat_map(|x| (1..=5).map(move |y| (x, y))).collect();
        let sites = sites(&points);
        let subdivision = build_subdivision(&sites, 6).unwrap();

        assert_inside(&subdivision);
        assert_bisectors(&subdivision, &sites);

        // Cells are unit squares: every real edge sits on a half-integer line
        // and together they cover four full vertical and four horizontal lines
        let mut total = 0.0;
        for edge in &subdivision.edges {
            let length = edge.start.distance(edge.end);
            if length < 1e-9 {
                continue;
            }
            let vertical = edge.start.x == edge.end.x && edge.start.x.fract() == 0.5;
            let horizontal = edge.start.y == edge.end.y && edge.start.y.fract() == 0.5;
            assert!(vertical || horizontal, "{edge:?}");
            total += length;
        }
        assert!((total - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_scattered_sites_are_deterministic() {
        let sites = sites(&[(3, 7), (1, 2), (6, 6), (4, 1), (7, 3), (2, 5)]);
        let a = build_subdivision(&sites, 8).unwrap();
        let b = build_subdivision(&sites, 8).unwrap();
        assert_eq!(a, b);
        assert_inside(&a);
        assert_bisectors(&a, &sites);
    }

    #[test]
    fn test_single_site_has_no_edges() {
        let subdivision = build_subdivision(&sites(&[(1, 1)]), 2).unwrap();
        assert!(subdivision.edges.is_empty());
    }
}
