//! Regions: ordered collections of point, polyline and polygon shapes, plus
//! the queries the boolean operation needs from them.
//!
//! Queries are answered by brute force over the region's edges, accelerated
//! by the cube-map grid where pairs of regions are compared.

use crate::geometry::edge::{crossing_sign, edge_or_vertex_crossing, interpolate, loop_signed_area, ortho, vertex_crossing};
use crate::geometry::predicates::{ordered_ccw, sign};
use crate::grid::{face_of, EdgeGrid};
use crate::types::{origin, Point};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Dimension of a shape: its edges represent points, polylines or polygon
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Point = 0,
    Polyline = 1,
    Polygon = 2,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Point, Dimension::Polyline, Dimension::Polygon];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Identifies an edge within a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeEdgeId {
    pub shape: u32,
    pub edge: u32,
}

impl ShapeEdgeId {
    pub const fn new(shape: u32, edge: u32) -> Self {
        Self { shape, edge }
    }
}

/// An edge together with its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeEdge {
    pub id: ShapeEdgeId,
    pub v0: Point,
    pub v1: Point,
}

/// A contiguous range of edge ids forming one polyline or loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    pub start: u32,
    pub length: u32,
}

/// Position of an edge within its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPosition {
    pub chain: u32,
    pub offset: u32,
}

/// A point known to be inside or outside a polygon shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub point: Point,
    pub contained: bool,
}

/// A set of points, one polyline, or one polygon made of loops.
///
/// Polygon loops may be degenerate: a loop of one vertex is a single
/// degenerate edge, and a loop of two vertices is a sibling pair. A loop with
/// no vertices is the full loop, which contains the whole sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    dimension: Dimension,
    chains: Vec<Vec<Point>>,
    /// Edge id of the first edge of each chain, plus the total edge count.
    chain_starts: Vec<u32>,
}

impl Shape {
    fn from_chains(dimension: Dimension, chains: Vec<Vec<Point>>) -> Self {
        let mut chain_starts = Vec::with_capacity(chains.len() + 1);
        let mut total = 0u32;
        for c in &chains {
            chain_starts.push(total);
            total += Self::chain_edge_count(dimension, c.len());
        }
        chain_starts.push(total);
        Self {
            dimension,
            chains,
            chain_starts,
        }
    }

    fn chain_edge_count(dimension: Dimension, num_vertices: usize) -> u32 {
        match dimension {
            Dimension::Point => 1,
            Dimension::Polyline => num_vertices.saturating_sub(1) as u32,
            Dimension::Polygon => num_vertices as u32,
        }
    }

    /// A point set; each point is a degenerate edge in its own chain.
    pub fn points(points: Vec<Point>) -> Self {
        Self::from_chains(Dimension::Point, points.into_iter().map(|p| vec![p]).collect())
    }

    /// A single polyline. Fewer than two vertices gives an empty shape.
    pub fn polyline(vertices: Vec<Point>) -> Self {
        let chains = if vertices.len() >= 2 { vec![vertices] } else { Vec::new() };
        Self::from_chains(Dimension::Polyline, chains)
    }

    /// A polygon with the given loops (shells counter-clockwise, holes
    /// clockwise).
    pub fn polygon(loops: Vec<Vec<Point>>) -> Self {
        Self::from_chains(Dimension::Polygon, loops)
    }

    /// The polygon containing the whole sphere.
    pub fn full_polygon() -> Self {
        Self::polygon(vec![Vec::new()])
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.chain_starts.last().copied().unwrap_or(0) as usize
    }

    #[inline]
    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn chain(&self, i: usize) -> Chain {
        Chain {
            start: self.chain_starts[i],
            length: self.chain_starts[i + 1] - self.chain_starts[i],
        }
    }

    /// The vertices of chain `i` (for loops, the last edge returns to the
    /// first vertex).
    pub fn chain_vertices(&self, i: usize) -> &[Point] {
        &self.chains[i]
    }

    pub fn chain_position(&self, edge: usize) -> ChainPosition {
        let e = edge as u32;
        let chain = self.chain_starts.partition_point(|&s| s <= e) - 1;
        ChainPosition {
            chain: chain as u32,
            offset: e - self.chain_starts[chain],
        }
    }

    /// Edge `offset` of chain `chain`, as `(v0, v1)`.
    pub fn chain_edge(&self, chain: usize, offset: usize) -> (Point, Point) {
        let c = &self.chains[chain];
        match self.dimension {
            Dimension::Point => (c[0], c[0]),
            Dimension::Polyline => (c[offset], c[offset + 1]),
            Dimension::Polygon => (c[offset], c[(offset + 1) % c.len()]),
        }
    }

    pub fn edge(&self, edge: usize) -> (Point, Point) {
        let pos = self.chain_position(edge);
        self.chain_edge(pos.chain as usize, pos.offset as usize)
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..self.chains.len()).flat_map(move |c| {
            let n = self.chain(c).length as usize;
            (0..n).map(move |j| self.chain_edge(c, j))
        })
    }

    /// Whether the polygon contains the whole sphere apart from its edges:
    /// true only for polygons with no edges and at least one (full) loop.
    pub fn is_full(&self) -> bool {
        self.dimension == Dimension::Polygon && self.num_edges() == 0 && !self.chains.is_empty()
    }

    /// A point with known containment, for polygon shapes. Non-polygon shapes
    /// contain nothing.
    pub fn reference_point(&self) -> ReferencePoint {
        let outside = ReferencePoint {
            point: origin(),
            contained: false,
        };
        if self.dimension != Dimension::Polygon {
            return outside;
        }
        if self.num_edges() == 0 {
            return ReferencePoint {
                point: origin(),
                contained: !self.chains.is_empty(),
            };
        }
        let (v0, _) = self.edge(0);
        if let Some(r) = self.reference_point_at_vertex(v0) {
            return r;
        }
        // Any unmatched edge has an unbalanced start vertex.
        let mut edges: Vec<(Point, Point)> = self.edges().collect();
        let mut reversed: Vec<(Point, Point)> = edges.iter().map(|&(a, b)| (b, a)).collect();
        edges.sort_unstable();
        reversed.sort_unstable();
        for (e, r) in edges.iter().zip(&reversed) {
            let candidate = match e.cmp(r) {
                std::cmp::Ordering::Less => e.0,
                std::cmp::Ordering::Greater => r.0,
                std::cmp::Ordering::Equal => continue,
            };
            if let Some(r) = self.reference_point_at_vertex(candidate) {
                return r;
            }
        }
        // Every edge is matched: the polygon is empty or full.
        ReferencePoint {
            point: origin(),
            contained: self.chains.iter().any(|c| c.is_empty()),
        }
    }

    fn reference_point_at_vertex(&self, v: Point) -> Option<ReferencePoint> {
        let mut edges: BTreeMap<Point, i32> = BTreeMap::new();
        for (a, b) in self.edges() {
            if a == v {
                *edges.entry(b).or_insert(0) += 1;
            }
            if b == v {
                *edges.entry(a).or_insert(0) -= 1;
            }
        }
        let sign = contains_vertex_sign(v, &edges);
        (sign != 0).then_some(ReferencePoint {
            point: v,
            contained: sign > 0,
        })
    }

    /// Semi-open containment of `p` by a polygon shape.
    pub fn contains(&self, p: Point) -> bool {
        if self.dimension != Dimension::Polygon {
            return false;
        }
        let r = self.reference_point();
        if r.point == p {
            return r.contained;
        }
        let mut inside = r.contained;
        for (a, b) in self.edges() {
            inside ^= edge_or_vertex_crossing(r.point, p, a, b);
        }
        inside
    }

    /// Sum of signed loop areas, in `[0, 4π]`.
    pub fn area(&self) -> f64 {
        if self.dimension != Dimension::Polygon {
            return 0.0;
        }
        let mut area: f64 = self.chains.iter().map(|c| loop_signed_area(c)).sum();
        if area < 0.0 {
            area += 4.0 * PI;
        }
        area.clamp(0.0, 4.0 * PI)
    }
}

/// Sign of the unmatched edge immediately clockwise from `ortho(target)`,
/// or 0 if every edge around `target` is matched. `edges` maps each
/// neighbor to the net number of outgoing minus incoming edges.
fn contains_vertex_sign(target: Point, edges: &BTreeMap<Point, i32>) -> i32 {
    let reference = ortho(target);
    let mut best = (reference, 0);
    for (&p, &dir) in edges {
        if dir == 0 {
            continue;
        }
        if ordered_ccw(reference, best.0, p, target) {
            best = (p, dir);
        }
    }
    best.1
}

/// One or more shapes treated as a single geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    shapes: Vec<Shape>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    pub fn add(&mut self, shape: Shape) -> u32 {
        self.shapes.push(shape);
        (self.shapes.len() - 1) as u32
    }

    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[inline]
    pub fn shape(&self, id: u32) -> &Shape {
        &self.shapes[id as usize]
    }

    #[inline]
    pub fn num_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the region has no geometry at all.
    pub fn is_empty(&self) -> bool {
        self.shapes.iter().all(|s| s.num_edges() == 0 && !s.is_full())
    }

    pub fn num_edges(&self) -> usize {
        self.shapes.iter().map(Shape::num_edges).sum()
    }

    pub fn edge(&self, id: ShapeEdgeId) -> ShapeEdge {
        let (v0, v1) = self.shape(id.shape).edge(id.edge as usize);
        ShapeEdge { id, v0, v1 }
    }

    /// All edges in (shape, edge) order.
    pub fn edges(&self) -> impl Iterator<Item = ShapeEdge> + '_ {
        self.shapes.iter().enumerate().flat_map(|(s, shape)| {
            shape.edges().enumerate().map(move |(e, (v0, v1))| ShapeEdge {
                id: ShapeEdgeId::new(s as u32, e as u32),
                v0,
                v1,
            })
        })
    }

    /// Semi-open containment: whether any polygon shape contains `p`.
    pub fn contains(&self, p: Point) -> bool {
        self.shapes.iter().any(|s| s.contains(p))
    }

    /// Visit every edge with an endpoint equal to `p`. Stops early and
    /// returns false when `visit` does.
    pub fn visit_incident_edges(&self, p: Point, mut visit: impl FnMut(&ShapeEdge) -> bool) -> bool {
        for e in self.edges() {
            if (e.v0 == p || e.v1 == p) && !visit(&e) {
                return false;
            }
        }
        true
    }

    /// Total polygon area, clamped to `[0, 4π]`.
    pub fn area(&self) -> f64 {
        self.shapes.iter().map(Shape::area).sum::<f64>().min(4.0 * PI)
    }

    /// Bit mask of the cube faces touched by the region's vertices, edges or
    /// polygon interiors. Bit `f` is set for face `f`.
    pub fn face_mask(&self) -> u8 {
        const ALL_FACES: u8 = 0x3f;
        const SAMPLE_STEP: f64 = 0.02;
        let mut mask = 0u8;
        for e in self.edges() {
            mask |= 1 << face_of(e.v0);
            mask |= 1 << face_of(e.v1);
            let steps = (e.v0.angle(e.v1) / SAMPLE_STEP).ceil() as usize;
            for k in 1..steps {
                mask |= 1 << face_of(interpolate(e.v0, e.v1, k as f64 / steps as f64));
            }
            if mask == ALL_FACES {
                return mask;
            }
        }
        const FACE_CENTERS: [Point; 6] = [
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
            Point::new(-1.0, 0.0, 0.0),
            Point::new(0.0, -1.0, 0.0),
            Point::new(0.0, 0.0, -1.0),
        ];
        for (f, &c) in FACE_CENTERS.iter().enumerate() {
            if mask & (1 << f) == 0 && self.contains(c) {
                mask |= 1 << f;
            }
        }
        mask
    }
}

/// A pair of edges from two regions that touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCrossing {
    pub a: ShapeEdge,
    pub b: ShapeEdge,
    /// The edges cross at a point interior to both.
    pub is_interior: bool,
}

impl EdgeCrossing {
    /// For an interior crossing, whether `b` crosses `a` from left to right.
    pub fn left_to_right(&self) -> bool {
        sign(self.a.v0, self.a.v1, self.b.v0) > 0
    }

    /// For a crossing at a shared vertex, the semi-open vertex crossing test.
    pub fn is_vertex_crossing(&self) -> bool {
        vertex_crossing(self.a.v0, self.a.v1, self.b.v0, self.b.v1)
    }
}

/// Lazily enumerate all pairs of edges (one from `a`, one from `b`) that
/// cross or share a vertex, in `a`-edge order. Each `a` edge is paired with
/// `b` edges in increasing id order.
pub fn crossing_pairs<'a>(a: &'a Region, b: &'a Region) -> impl Iterator<Item = EdgeCrossing> + 'a {
    let b_edges: Vec<ShapeEdge> = b.edges().collect();
    let index = EdgeGrid::build(&b_edges.iter().map(|e| (e.v0, e.v1)).collect::<Vec<_>>(), 0.0);
    let mut candidates = Vec::new();
    a.edges().flat_map(move |ea| {
        index.candidates(ea.v0, ea.v1, &mut candidates);
        let mut found = Vec::new();
        for &j in &candidates {
            let eb = b_edges[j as usize];
            let s = crossing_sign(ea.v0, ea.v1, eb.v0, eb.v1);
            if s >= 0 {
                found.push(EdgeCrossing {
                    a: ea,
                    b: eb,
                    is_interior: s > 0,
                });
            }
        }
        found
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;
    use approx::assert_relative_eq;

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    fn square() -> Shape {
        Shape::polygon(vec![vec![ll(0.0, 0.0), ll(0.0, 2.0), ll(2.0, 2.0), ll(2.0, 0.0)]])
    }

    #[test]
    fn test_chain_numbering() {
        let s = Shape::polygon(vec![
            vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 0.0)],
            vec![ll(5.0, 5.0)],
        ]);
        assert_eq!(s.num_edges(), 4);
        assert_eq!(s.num_chains(), 2);
        assert_eq!(s.chain(1), Chain { start: 3, length: 1 });
        assert_eq!(s.chain_position(3), ChainPosition { chain: 1, offset: 0 });
        assert_eq!(s.edge(2), (ll(1.0, 0.0), ll(0.0, 0.0)));
        assert_eq!(s.edge(3), (ll(5.0, 5.0), ll(5.0, 5.0)));

        let p = Shape::polyline(vec![ll(0.0, 0.0), ll(1.0, 1.0), ll(2.0, 2.0)]);
        assert_eq!(p.num_edges(), 2);
        assert_eq!(Shape::polyline(vec![ll(0.0, 0.0)]).num_chains(), 0);
    }

    #[test]
    fn test_contains_is_semi_open() {
        let cw = Shape::polygon(vec![vec![ll(0.0, 0.0), ll(2.0, 0.0), ll(2.0, 2.0), ll(0.0, 2.0)]]);
        assert!(square().contains(ll(1.0, 1.0)));
        assert!(!square().contains(ll(3.0, 3.0)));
        assert!(!cw.contains(ll(1.0, 1.0)));
        assert!(cw.contains(ll(3.0, 3.0)));
        // A vertex belongs to exactly one of a shape and its complement.
        let v = ll(0.0, 0.0);
        assert_ne!(cw.contains(v), square().contains(v));
    }

    #[test]
    fn test_full_and_degenerate_polygons() {
        let full = Shape::full_polygon();
        assert!(full.is_full());
        assert!(full.contains(ll(10.0, 10.0)));
        assert_relative_eq!(full.area(), 4.0 * PI);
        let point_loop = Shape::polygon(vec![vec![ll(1.0, 1.0)]]);
        assert!(!point_loop.contains(ll(1.0, 1.0)));
        assert_eq!(point_loop.area(), 0.0);
        let sibling = Shape::polygon(vec![vec![ll(1.0, 1.0), ll(2.0, 2.0)]]);
        assert!(!sibling.reference_point().contained);
    }

    #[test]
    fn test_area_of_small_square() {
        let cw = Shape::polygon(vec![vec![ll(0.0, 0.0), ll(2.0, 0.0), ll(2.0, 2.0), ll(0.0, 2.0)]]);
        let d = 2f64.to_radians();
        assert_relative_eq!(square().area(), d * d, max_relative = 1e-3);
        assert_relative_eq!(cw.area(), 4.0 * PI - d * d, max_relative = 1e-6);
    }

    #[test]
    fn test_incident_edges_and_face_mask() {
        let region = Region::from_shapes(vec![
            Shape::points(vec![ll(0.0, 0.0)]),
            Shape::polyline(vec![ll(0.0, 0.0), ll(1.0, 1.0)]),
        ]);
        let mut seen = Vec::new();
        region.visit_incident_edges(ll(0.0, 0.0), |e| {
            seen.push(e.id);
            true
        });
        assert_eq!(seen, vec![ShapeEdgeId::new(0, 0), ShapeEdgeId::new(1, 0)]);
        assert_eq!(region.face_mask(), 1);
        let full = Region::from_shapes(vec![Shape::full_polygon()]);
        assert_eq!(full.face_mask(), 0x3f);
    }

    #[test]
    fn test_crossing_pairs_classifies_crossings() {
        let a = Region::from_shapes(vec![Shape::polyline(vec![ll(0.0, 0.0), ll(2.0, 2.0)])]);
        let b = Region::from_shapes(vec![
            Shape::polyline(vec![ll(2.0, 0.0), ll(0.0, 2.0)]),
            Shape::polyline(vec![ll(2.0, 2.0), ll(3.0, 0.0)]),
            Shape::polyline(vec![ll(5.0, 5.0), ll(6.0, 6.0)]),
        ]);
        let found: Vec<EdgeCrossing> = crossing_pairs(&a, &b).collect();
        assert_eq!(found.len(), 2);
        assert!(found[0].is_interior);
        assert_eq!(found[0].b.id, ShapeEdgeId::new(0, 0));
        assert!(!found[1].is_interior);
        assert_eq!(found[1].b.id, ShapeEdgeId::new(1, 0));
    }
}
