//! The boundary clipper: walks the edges of one region against the crossing
//! edges of the other and emits every edge that may belong to the result.
//!
//! Region A is the region being walked and B the opposite one. `inside`
//! tracks whether the current point of the A chain lies in the polygonal
//! interior of B under semi-open rules (inverted when B is inverted), and
//! toggles at every crossing. The per-dimension rules then adjust it to the
//! configured polygon and polyline boundary models.
//!
//! All `process_*` methods return `Ok(false)` to stop early once the result
//! is known to be non-empty; this only happens when no output is being
//! collected.

use super::clipper::{Crossing, InputEdgeCrossings};
use super::crossings::CrossingIterator;
use super::{PolygonModel, PolylineModel};
use crate::budget::MemoryBudget;
use crate::builder::InputEdgeId;
use crate::error::{invariant, BuildError};
use crate::region::{Chain, Dimension, Shape, ShapeEdgeId};
use crate::types::Point;
use rustc_hash::FxHashMap;

/// Everything the boundary clipper hands to the snap-rounding step.
#[derive(Debug, Default)]
pub(crate) struct ClipOutput {
    /// Input edges for the builder, in input edge id order.
    pub edges: Vec<(Point, Point)>,
    /// Dimension of each input edge.
    pub input_dimensions: Vec<i8>,
    pub input_crossings: InputEdgeCrossings,
    /// Interior crossing points, added as builder intersections.
    pub intersections: Vec<Point>,
}

/// Identifies an edge of either region before it has an input edge id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SourceId {
    region: u8,
    shape: u32,
    edge: u32,
}

#[derive(Debug, Clone, Copy)]
enum SourceCrossing {
    Edge(SourceId, bool),
    State(Crossing),
}

#[derive(Debug, Default, Clone, Copy)]
struct PointCrossingResult {
    matches_point: bool,
    /// Matches a polyline vertex that the polyline contains.
    matches_polyline: bool,
    /// Matches any polygon vertex.
    matches_polygon: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct EdgeCrossingResult {
    /// `(a0, a1)` equals a polyline edge of B in either direction.
    matches_polyline: bool,
    /// A B polyline contains the degenerate polyline `(a0, a0)`.
    a0_matches_polyline: bool,
    a1_matches_polyline: bool,
    a0_matches_polygon: bool,
    a1_matches_polygon: bool,
    /// B polygon edge equal to `(a0, a1)`.
    polygon_match_id: Option<ShapeEdgeId>,
    /// B polygon edge equal to `(a1, a0)`.
    sibling_match_id: Option<ShapeEdgeId>,
    /// B polygon edge equal to `(a0, a0)`.
    a0_loop_match_id: Option<ShapeEdgeId>,
    a0_crossings: u32,
    a1_crossings: u32,
    interior_crossings: u32,
}

impl EdgeCrossingResult {
    #[inline]
    fn matches_polygon(&self) -> bool {
        self.polygon_match_id.is_some()
    }

    #[inline]
    fn matches_sibling(&self) -> bool {
        self.sibling_match_id.is_some()
    }

    #[inline]
    fn loop_matches_a0(&self) -> bool {
        self.a0_loop_match_id.is_some()
    }
}

/// Bytes charged per source id map entry.
const SOURCE_ID_MAP_ENTRY_BYTES: usize = 2 * std::mem::size_of::<(SourceId, InputEdgeId)>();

pub(crate) struct CrossingProcessor<'r> {
    polygon_model: PolygonModel,
    polyline_model: PolylineModel,
    polyline_loops_have_boundaries: bool,
    /// `None` when only emptiness is being decided.
    output: Option<ClipOutput>,
    pub(crate) budget: MemoryBudget,

    a_region: u8,
    b_region: u8,
    invert_a: bool,
    invert_b: bool,
    invert_result: bool,
    is_union: bool,

    a_shape: Option<&'r Shape>,
    a_dimension: Dimension,

    chain: usize,
    chain_start: u32,
    chain_limit: u32,

    /// Crossings keyed by the input edge of A; B edges are identified by
    /// source id until both regions have been emitted.
    source_edge_crossings: Vec<(InputEdgeId, SourceCrossing)>,
    /// Crossings of the current edge, attached once its interior edge is
    /// emitted (an edge may also emit isolated endpoint vertices).
    pending_source_edge_crossings: Vec<(SourceId, bool)>,
    source_id_map: FxHashMap<SourceId, InputEdgeId>,
    /// Shell (false) or hole (true) status of each degenerate B loop edge
    /// seen in the first pass.
    is_degenerate_hole: FxHashMap<ShapeEdgeId, bool>,

    inside: bool,
    /// `inside` just before the end of the previous emitted edge.
    prev_inside: bool,
    /// Largest edge id of the current chain whose start vertex has been
    /// emitted.
    v0_emitted_max_edge_id: i64,
    chain_v0_emitted: bool,
}

impl<'r> CrossingProcessor<'r> {
    pub(crate) fn new(
        polygon_model: PolygonModel,
        polyline_model: PolylineModel,
        polyline_loops_have_boundaries: bool,
        output: Option<ClipOutput>,
        budget: MemoryBudget,
    ) -> Self {
        Self {
            polygon_model,
            polyline_model,
            polyline_loops_have_boundaries,
            output,
            budget,
            a_region: 0,
            b_region: 1,
            invert_a: false,
            invert_b: false,
            invert_result: false,
            is_union: false,
            a_shape: None,
            a_dimension: Dimension::Point,
            chain: 0,
            chain_start: 0,
            chain_limit: 0,
            source_edge_crossings: Vec::new(),
            pending_source_edge_crossings: Vec::new(),
            source_id_map: FxHashMap::default(),
            is_degenerate_hole: FxHashMap::default(),
            inside: false,
            prev_inside: false,
            v0_emitted_max_edge_id: -1,
            chain_v0_emitted: false,
        }
    }

    #[inline]
    pub(crate) fn is_boolean_output(&self) -> bool {
        self.output.is_none()
    }

    #[inline]
    pub(crate) fn inside(&self) -> bool {
        self.inside
    }

    pub(crate) fn into_parts(self) -> (Option<ClipOutput>, MemoryBudget) {
        (self.output, self.budget)
    }

    /// Record an interior crossing point for the builder.
    pub(crate) fn add_intersection(&mut self, p: Point) -> Result<(), BuildError> {
        match self.output.as_mut() {
            Some(out) => self.budget.push(&mut out.intersections, p),
            None => Ok(()),
        }
    }

    /// Start walking region `a_region`. Union is `~(~A & ~B)` and difference
    /// `A & ~B`, so the flags select the operation.
    pub(crate) fn start_boundary(
        &mut self,
        a_region: u8,
        invert_a: bool,
        invert_b: bool,
        invert_result: bool,
    ) -> Result<(), BuildError> {
        self.a_region = a_region;
        self.b_region = 1 - a_region;
        self.invert_a = invert_a;
        self.invert_b = invert_b;
        self.invert_result = invert_result;
        self.is_union = invert_b && invert_result;
        self.add_crossing(SourceCrossing::State(Crossing::ReverseThis(invert_a != invert_result)))?;
        self.add_crossing(SourceCrossing::State(Crossing::InvertOpposite(invert_b)))
    }

    pub(crate) fn start_shape(&mut self, shape: &'r Shape) {
        self.a_shape = Some(shape);
        self.a_dimension = shape.dimension();
    }

    pub(crate) fn start_chain(&mut self, chain: usize, c: Chain, inside: bool) {
        self.chain = chain;
        self.chain_start = c.start;
        self.chain_limit = c.start + c.length;
        self.inside = inside;
        self.v0_emitted_max_edge_id = i64::from(c.start) - 1;
        self.chain_v0_emitted = false;
    }

    /// Process edge `a_id` of the current chain. `it` must be positioned at
    /// the crossings of `a_id`, if it has any.
    pub(crate) fn process_edge(&mut self, a_id: ShapeEdgeId, it: &mut CrossingIterator<'_>) -> Result<bool, BuildError> {
        let Some(shape) = self.a_shape else {
            return Ok(true);
        };
        let a = shape.chain_edge(self.chain, (a_id.edge - self.chain_start) as usize);
        match self.a_dimension {
            Dimension::Point => self.process_edge0(a_id, a, it),
            Dimension::Polyline => self.process_edge1(a_id, a, it),
            Dimension::Polygon => self.process_edge2(a_id, a, it),
        }
    }

    /// Translate source ids to input edge ids once both regions of a pair
    /// have been emitted.
    pub(crate) fn done_boundary_pair(&mut self) -> Result<(), BuildError> {
        let Some(out) = self.output.as_mut() else {
            return Ok(());
        };
        self.budget
            .reserve(&mut out.input_crossings, self.source_edge_crossings.len())?;
        for &(id, crossing) in &self.source_edge_crossings {
            let crossing = match crossing {
                SourceCrossing::State(c) => c,
                SourceCrossing::Edge(src, left_to_right) => match self.source_id_map.get(&src) {
                    Some(&input) => Crossing::Edge {
                        input,
                        left_to_right,
                    },
                    None => {
                        invariant(false, || format!("crossing edge {src:?} was never emitted"))?;
                        continue;
                    }
                },
            };
            out.input_crossings.push((id, crossing));
        }
        self.budget.release(&mut self.source_edge_crossings);
        let map_bytes = self.source_id_map.len() * SOURCE_ID_MAP_ENTRY_BYTES;
        self.budget.tally(-(map_bytes as isize))?;
        self.source_id_map.clear();
        Ok(())
    }

    #[inline]
    fn next_input_edge_id(&self) -> InputEdgeId {
        InputEdgeId::new(self.output.as_ref().map_or(0, |o| o.input_dimensions.len()))
    }

    fn add_crossing(&mut self, crossing: SourceCrossing) -> Result<(), BuildError> {
        if self.output.is_none() {
            return Ok(());
        }
        let id = self.next_input_edge_id();
        self.budget.push(&mut self.source_edge_crossings, (id, crossing))
    }

    #[inline]
    fn set_inside_state(&mut self, inside: bool) -> Result<(), BuildError> {
        self.add_crossing(SourceCrossing::State(Crossing::SetInside(inside)))
    }

    /// Whether neither edge adjacent to the start of `a_id` was emitted.
    /// Must be called just after `inside` is updated for that vertex.
    #[inline]
    fn is_v0_isolated(&self, a_id: ShapeEdgeId) -> bool {
        !self.inside && self.v0_emitted_max_edge_id < i64::from(a_id.edge)
    }

    /// Whether `a_id` is the last edge of its chain and neither edge next to
    /// its end vertex was emitted.
    #[inline]
    fn is_chain_last_vertex_isolated(&self, a_id: ShapeEdgeId) -> bool {
        a_id.edge + 1 == self.chain_limit
            && !self.chain_v0_emitted
            && self.v0_emitted_max_edge_id <= i64::from(a_id.edge)
    }

    #[inline]
    fn polyline_contains_v0(&self, edge: u32, chain_start: u32) -> bool {
        self.polyline_model != PolylineModel::Open || edge > chain_start
    }

    #[inline]
    fn is_degenerate(&self, a_id: ShapeEdgeId) -> bool {
        self.is_degenerate_hole.contains_key(&a_id)
    }

    #[inline]
    fn degenerate_hole(&self, id: ShapeEdgeId) -> bool {
        self.is_degenerate_hole.get(&id).copied().unwrap_or(false)
    }

    fn last_chain_vertex(&self) -> Option<Point> {
        let shape = self.a_shape?;
        let n = (self.chain_limit - self.chain_start) as usize;
        Some(shape.chain_edge(self.chain, n - 1).1)
    }

    fn first_chain_vertex(&self) -> Option<Point> {
        Some(self.a_shape?.chain_edge(self.chain, 0).0)
    }

    fn add_edge(
        &mut self,
        a_id: ShapeEdgeId,
        a: (Point, Point),
        dimension: i8,
        interior_crossings: u32,
    ) -> Result<bool, BuildError> {
        if self.output.is_none() {
            return Ok(false);
        }
        let input = self.next_input_edge_id();
        if interior_crossings > 0 {
            // The crossing edges belong to the edge that carries A's
            // interior.
            self.budget.reserve(
                &mut self.source_edge_crossings,
                self.pending_source_edge_crossings.len(),
            )?;
            for &(src, left_to_right) in &self.pending_source_edge_crossings {
                self.source_edge_crossings
                    .push((input, SourceCrossing::Edge(src, left_to_right)));
            }
            self.budget.tally(SOURCE_ID_MAP_ENTRY_BYTES as isize)?;
            let src = SourceId {
                region: self.a_region,
                shape: a_id.shape,
                edge: a_id.edge,
            };
            self.source_id_map.insert(src, input);
        }
        if self.inside != self.prev_inside {
            self.set_inside_state(self.inside)?;
        }
        if let Some(out) = self.output.as_mut() {
            self.budget.push(&mut out.input_dimensions, dimension)?;
            self.budget.push(&mut out.edges, a)?;
        }
        self.inside ^= interior_crossings % 2 == 1;
        self.prev_inside = self.inside;
        Ok(true)
    }

    fn add_point_edge(&mut self, p: Point, dimension: i8) -> Result<bool, BuildError> {
        if self.output.is_none() {
            return Ok(false);
        }
        if !self.prev_inside {
            self.set_inside_state(true)?;
        }
        if let Some(out) = self.output.as_mut() {
            self.budget.push(&mut out.input_dimensions, dimension)?;
            self.budget.push(&mut out.edges, (p, p))?;
        }
        self.prev_inside = true;
        Ok(true)
    }

    fn process_edge0(
        &mut self,
        a_id: ShapeEdgeId,
        a: (Point, Point),
        it: &mut CrossingIterator<'_>,
    ) -> Result<bool, BuildError> {
        debug_assert_eq!(a.0, a.1);
        // Points and polylines are dropped when their region is inverted.
        if self.invert_a != self.invert_result {
            it.skip(a_id);
            return Ok(true);
        }
        let r = self.process_point_crossings(a_id, a.0, it);

        let mut contained = self.inside ^ self.invert_b;
        if r.matches_polygon && self.polygon_model != PolygonModel::SemiOpen {
            contained = self.polygon_model == PolygonModel::Closed;
        }
        if r.matches_polyline {
            contained = true;
        }
        // Union keeps duplicate points.
        if r.matches_point && !self.is_union {
            contained = true;
        }
        if contained == self.invert_b {
            return Ok(true);
        }
        self.add_point_edge(a.0, 0)
    }

    fn process_point_crossings(
        &self,
        a_id: ShapeEdgeId,
        a0: Point,
        it: &mut CrossingIterator<'_>,
    ) -> PointCrossingResult {
        let mut r = PointCrossingResult::default();
        while !it.done(a_id) {
            match it.b_dimension() {
                Dimension::Point => r.matches_point = true,
                Dimension::Polyline => {
                    if self.polyline_edge_contains_vertex(a0, it, Dimension::Point) {
                        r.matches_polyline = true;
                    }
                }
                Dimension::Polygon => r.matches_polygon = true,
            }
            it.next();
        }
        r
    }

    fn process_edge1(
        &mut self,
        a_id: ShapeEdgeId,
        a: (Point, Point),
        it: &mut CrossingIterator<'_>,
    ) -> Result<bool, BuildError> {
        if self.invert_a != self.invert_result {
            it.skip(a_id);
            return Ok(true);
        }
        let mut r = self.process_edge_crossings(a_id, a, it);
        let a0_inside = self.is_polyline_vertex_inside(r.a0_matches_polyline, r.a0_matches_polygon);

        let is_degenerate = a.0 == a.1;
        self.inside ^= r.a0_crossings % 2 == 1;
        if self.inside != self.is_polyline_edge_inside(&r, is_degenerate) {
            self.inside = !self.inside;
            // Restores the semi-open state after the edge.
            r.a1_crossings += 1;
        }

        if !self.polyline_loops_have_boundaries
            && a_id.edge == self.chain_start
            && Some(a.0) == self.last_chain_vertex()
        {
            // First vertex of a polyline loop: decided with the last edge.
            self.chain_v0_emitted = self.inside;
        } else if self.is_v0_isolated(a_id)
            && !is_degenerate
            && self.polyline_contains_v0(a_id.edge, self.chain_start)
            && a0_inside
            && !self.add_point_edge(a.0, 1)?
        {
            return Ok(false);
        }

        if (self.inside || r.interior_crossings > 0)
            && !self.add_edge(a_id, a, 1, r.interior_crossings)?
        {
            return Ok(false);
        }
        // Whether the piece just before a1 was emitted.
        if self.inside {
            self.v0_emitted_max_edge_id = i64::from(a_id.edge) + 1;
        }
        self.inside ^= r.a1_crossings % 2 == 1;

        if it.crossings_complete()
            && !is_degenerate
            && self.is_chain_last_vertex_isolated(a_id)
            && (self.polyline_model == PolylineModel::Closed
                || (!self.polyline_loops_have_boundaries && Some(a.1) == self.first_chain_vertex()))
            && self.is_polyline_vertex_inside(r.a1_matches_polyline, r.a1_matches_polygon)
            && !self.add_point_edge(a.1, 1)?
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Whether the current polyline vertex is contained by B (after
    /// inversion).
    fn is_polyline_vertex_inside(&self, matches_polyline: bool, matches_polygon: bool) -> bool {
        let mut contained = self.inside ^ self.invert_b;
        // Union keeps isolated vertices that match other polyline vertices.
        if matches_polyline && !self.is_union {
            contained = true;
        } else if matches_polygon && self.polygon_model != PolygonModel::SemiOpen {
            contained = self.polygon_model == PolygonModel::Closed;
        }
        contained ^ self.invert_b
    }

    /// Whether the current polyline edge is contained by B (after
    /// inversion).
    fn is_polyline_edge_inside(&self, r: &EdgeCrossingResult, is_degenerate: bool) -> bool {
        let mut contained = self.inside ^ self.invert_b;
        // For union a matching polyline leaves `contained` false so that
        // both copies are emitted.
        if r.matches_polyline && !self.is_union {
            contained = true;
        } else if is_degenerate {
            // A polygon vertex contains degenerate polylines of every model.
            if self.polygon_model != PolygonModel::SemiOpen && r.a0_matches_polygon {
                contained = self.polygon_model == PolygonModel::Closed;
            }
            if r.a0_matches_polyline && !self.is_union {
                contained = true;
            }
        } else if r.matches_polygon() {
            // Semi-open sibling pairs cancel and do not affect containment.
            if !(self.polygon_model == PolygonModel::SemiOpen && r.matches_sibling()) {
                contained = self.polygon_model != PolygonModel::Open;
            }
        } else if r.matches_sibling() {
            contained = self.polygon_model == PolygonModel::Closed;
        }
        contained ^ self.invert_b
    }

    /// Polygon edges. Shared and sibling edges and degenerate loops depend
    /// on whether each side is a shell or a hole. Their handling is split
    /// across the two passes: the first pass (A = region 0) records the
    /// status of degenerate B loops and defers A edges matching B, and the
    /// second pass (A = region 1) emits them.
    fn process_edge2(
        &mut self,
        a_id: ShapeEdgeId,
        a: (Point, Point),
        it: &mut CrossingIterator<'_>,
    ) -> Result<bool, BuildError> {
        let emit_shared = self.a_region == 1;

        // Closed intersection and open union create degeneracies; open
        // subtraction keeps existing ones.
        let create_degen = (self.polygon_model == PolygonModel::Closed && !self.invert_a && !self.invert_b)
            || (self.polygon_model == PolygonModel::Open && self.invert_a && self.invert_b);
        let keep_degen_a = self.polygon_model == PolygonModel::Open && self.invert_b;
        let keep_degen_b = self.polygon_model == PolygonModel::Open && self.invert_a;

        let mut r = self.process_edge_crossings(a_id, a, it);
        debug_assert!(!r.matches_polyline);

        // With exactly one region inverted, matches and siblings swap roles.
        if self.invert_a != self.invert_b {
            std::mem::swap(&mut r.polygon_match_id, &mut r.sibling_match_id);
        }

        let is_point = a.0 == a.1;
        if !emit_shared {
            if let Some(id) = r.a0_loop_match_id {
                self.is_degenerate_hole.insert(id, self.inside);
                if is_point {
                    return Ok(true);
                }
            }
            // Point loops matching a polygon vertex act like points in the
            // semi-open model; otherwise they wait for the second pass.
            if self.polygon_model != PolygonModel::SemiOpen && is_point && r.a0_matches_polygon {
                return Ok(true);
            }
        }
        self.inside ^= r.a0_crossings % 2 == 1;
        if !emit_shared && (r.matches_polygon() || r.matches_sibling()) {
            if let (Some(m), Some(s)) = (r.polygon_match_id, r.sibling_match_id) {
                self.is_degenerate_hole.insert(m, self.inside);
                self.is_degenerate_hole.insert(s, self.inside);
            }
            invariant(r.interior_crossings == 0, || {
                format!("shared edge {a_id:?} has {} interior crossings", r.interior_crossings)
            })?;
            self.inside ^= r.a1_crossings % 2 == 1;
            return Ok(true);
        }

        let is_b_hole = r.matches_polygon() && r.matches_sibling() && self.inside;

        // Apply the boundary model; `semi_open_inside` is restored after the
        // edge.
        let semi_open_inside = self.inside;
        if is_point {
            if let Some(id) = r.a0_loop_match_id {
                // Both sides are point loops: kept when both are holes or
                // both shells.
                self.inside = create_degen || keep_degen_a || self.inside == self.degenerate_hole(id);
            } else if r.a0_matches_polygon && self.polygon_model != PolygonModel::SemiOpen {
                self.inside = create_degen || keep_degen_a;
            }
        } else if r.matches_polygon() {
            if self.is_degenerate(a_id) {
                // A is a sibling pair.
                self.inside = create_degen
                    || keep_degen_a
                    || (!r.matches_sibling() || self.inside) == self.degenerate_hole(a_id);
            } else if !r.matches_sibling() || create_degen || keep_degen_b {
                self.inside = true;
            }
        } else if r.matches_sibling() {
            if self.is_degenerate(a_id) {
                self.inside = (create_degen || keep_degen_a) && !self.degenerate_hole(a_id);
            } else {
                self.inside = create_degen;
            }
        }
        if self.inside != semi_open_inside {
            r.a1_crossings += 1;
        }

        // Isolated vertex where a0 touches a B polygon vertex. Redundant
        // copies are removed by the output layer's degenerate edge handling.
        if emit_shared
            && r.a0_matches_polygon
            && !self.inside
            && (create_degen || (keep_degen_b && r.loop_matches_a0()))
            && !self.add_point_edge(a.0, 2)?
        {
            return Ok(false);
        }

        // The first pass skipped edges whose only match was a B sibling
        // pair, so the sibling is emitted here.
        if let Some(sibling_id) = r.sibling_match_id {
            if (create_degen || keep_degen_b)
                && !self.is_degenerate(a_id)
                && !is_b_hole
                && !self.add_edge(sibling_id, (a.1, a.0), 2, 0)?
            {
                return Ok(false);
            }
        }

        if (self.inside || r.interior_crossings > 0)
            && !self.add_edge(a_id, a, 2, r.interior_crossings)?
        {
            return Ok(false);
        }
        self.inside ^= r.a1_crossings % 2 == 1;
        Ok(true)
    }

    fn process_edge_crossings(
        &mut self,
        a_id: ShapeEdgeId,
        a: (Point, Point),
        it: &mut CrossingIterator<'_>,
    ) -> EdgeCrossingResult {
        self.pending_source_edge_crossings.clear();
        let mut r = EdgeCrossingResult::default();
        while !it.done(a_id) {
            self.add_edge_crossing(a, it, &mut r);
            it.next();
        }
        r
    }

    fn add_edge_crossing(&mut self, a: (Point, Point), it: &CrossingIterator<'_>, r: &mut EdgeCrossingResult) {
        let b_dimension = it.b_dimension();
        // Points do not affect polyline or polygon inside states.
        if b_dimension == Dimension::Point {
            return;
        }
        let b = it.b_edge();
        if it.is_interior_crossing() {
            // Polyline crossings do not affect polygon states, and
            // subtracting a polyline from a polyline does not affect its
            // state (vertices are still created at the crossings).
            if self.a_dimension <= b_dimension
                && !(self.invert_b != self.invert_result && b_dimension == Dimension::Polyline)
            {
                let src = SourceId {
                    region: self.b_region,
                    shape: it.b_id().shape,
                    edge: it.b_edge_id(),
                };
                self.pending_source_edge_crossings.push((src, it.left_to_right()));
            }
            r.interior_crossings += if b_dimension == Dimension::Polyline { 2 } else { 1 };
        } else if b_dimension == Dimension::Polyline {
            if self.a_dimension == Dimension::Polygon {
                return;
            }
            if (a.0 == b.0 && a.1 == b.1) || (a.0 == b.1 && a.1 == b.0) {
                r.matches_polyline = true;
            }
            if (a.0 == b.0 || a.0 == b.1) && self.polyline_edge_contains_vertex(a.0, it, Dimension::Polyline) {
                r.a0_matches_polyline = true;
            }
            if (a.1 == b.0 || a.1 == b.1) && self.polyline_edge_contains_vertex(a.1, it, Dimension::Polyline) {
                r.a1_matches_polyline = true;
            }
        } else {
            if a.0 == a.1 || b.0 == b.1 {
                // No crossings with a degenerate edge.
                if a.0 == b.0 && a.0 == b.1 {
                    r.a0_loop_match_id = Some(it.b_id());
                }
            } else if a.0 == b.0 && a.1 == b.1 {
                r.a0_crossings += 1;
                r.polygon_match_id = Some(it.b_id());
            } else if a.0 == b.1 && a.1 == b.0 {
                r.a0_crossings += 1;
                r.sibling_match_id = Some(it.b_id());
            } else if it.is_vertex_crossing() {
                if a.0 == b.0 || a.0 == b.1 {
                    r.a0_crossings += 1;
                } else {
                    r.a1_crossings += 1;
                }
            }
            if a.0 == b.0 || a.0 == b.1 {
                r.a0_matches_polygon = true;
            }
            if a.1 == b.0 || a.1 == b.1 {
                r.a1_matches_polygon = true;
            }
        }
    }

    /// Whether the polyline edge at `it` contains its endpoint `v`, modeled
    /// as a point or as a degenerate polyline. The polyline `VV` contains
    /// itself in every model but the point `V` only in the closed one.
    fn polyline_edge_contains_vertex(&self, v: Point, it: &CrossingIterator<'_>, dimension: Dimension) -> bool {
        debug_assert_eq!(it.b_dimension(), Dimension::Polyline);
        if self.polyline_model == PolylineModel::Closed {
            return true;
        }
        let b_chain = it.b_chain_info();
        let b_edge_id = it.b_edge_id();
        let b = it.b_edge();

        // Only degenerate polylines (as polylines) contain their last vertex.
        if b_edge_id + 1 == b_chain.limit
            && v == b.1
            && (dimension == Dimension::Point || b_edge_id > 0 || v != b.0)
        {
            return false;
        }
        if self.polyline_contains_v0(b_edge_id, b_chain.start) || v != b.0 {
            return true;
        }
        if self.polyline_loops_have_boundaries {
            return false;
        }
        let shape = it.b_shape();
        let n = (b_chain.limit - b_chain.start) as usize;
        v == shape.chain_edge(b_chain.chain, n - 1).1
    }
}
