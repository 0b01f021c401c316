//! Drives the boundary clipper over both regions for one operation type.

use super::crossings::{sort_crossings, CrossingIterator, IndexCrossing, SENTINEL};
use super::processor::CrossingProcessor;
use super::OpType;
use crate::budget::MemoryBudget;
use crate::error::BuildError;
use crate::geometry::edge::{intersection, vertex_crossing};
use crate::region::{crossing_pairs, Dimension, Region, ShapeEdge, ShapeEdgeId};
use std::f64::consts::PI;
use tracing::debug;

const ALL_FACES: u8 = 0x3f;

/// Worst-case curvature error of a four-vertex hemisphere, beyond snapping.
const HEMISPHERE_CURVATURE_ERROR: f64 = 40.0 * f64::EPSILON;

pub(super) struct Operation<'r> {
    op_type: OpType,
    regions: [&'r Region; 2],
    /// Sorted by the edge of `crossings_region`.
    index_crossings: Vec<IndexCrossing>,
    crossings_region: Option<u8>,
    tmp_crossings: Vec<IndexCrossing>,
}

impl<'r> Operation<'r> {
    pub(super) fn new(op_type: OpType, a: &'r Region, b: &'r Region) -> Self {
        Self {
            op_type,
            regions: [a, b],
            index_crossings: Vec::new(),
            crossings_region: None,
            tmp_crossings: Vec::new(),
        }
    }

    pub(super) fn num_index_crossings(&self) -> usize {
        self.index_crossings.len()
    }

    pub(super) fn release(&mut self, budget: &mut MemoryBudget) {
        budget.release(&mut self.index_crossings);
        budget.release(&mut self.tmp_crossings);
    }

    /// Emit the edges of the result. Returns `Ok(false)` as soon as the
    /// result is known to be non-empty when no output is collected.
    pub(super) fn build_op_type(&mut self, cp: &mut CrossingProcessor<'r>) -> Result<bool, BuildError> {
        match self.op_type {
            // A | B == ~(~A & ~B)
            OpType::Union => self.add_boundary_pair(true, true, true, cp),
            OpType::Intersection => self.add_boundary_pair(false, false, false, cp),
            // A - B == A & ~B
            OpType::Difference => self.add_boundary_pair(false, true, false, cp),
            // (A - B) | (B - A)
            OpType::SymmetricDifference => {
                Ok(self.add_boundary_pair(false, true, false, cp)? && self.add_boundary_pair(true, false, false, cp)?)
            }
        }
    }

    fn add_boundary_pair(
        &mut self,
        invert_a: bool,
        invert_b: bool,
        invert_result: bool,
        cp: &mut CrossingProcessor<'r>,
    ) -> Result<bool, BuildError> {
        if matches!(self.op_type, OpType::Difference | OpType::SymmetricDifference) && self.regions_identical() {
            debug!("regions are identical");
            return Ok(true);
        }
        let mut a_starts = Vec::new();
        let mut b_starts = Vec::new();
        let proceed = self.chain_starts(0, invert_a, invert_b, invert_result, cp, &mut a_starts)?
            && self.chain_starts(1, invert_b, invert_a, invert_result, cp, &mut b_starts)?
            && self.add_boundary(0, invert_a, invert_b, invert_result, &a_starts, cp)?
            && self.add_boundary(1, invert_b, invert_a, invert_result, &b_starts, cp)?;
        debug!(
            invert_a,
            invert_b,
            invert_result,
            crossings = self.index_crossings.len(),
            a_starts = a_starts.len(),
            b_starts = b_starts.len(),
            "clipped boundary pair"
        );
        cp.budget.release(&mut a_starts);
        cp.budget.release(&mut b_starts);
        if !proceed {
            return Ok(false);
        }
        if !cp.is_boolean_output() {
            cp.done_boundary_pair()?;
        }
        Ok(true)
    }

    /// Make `index_crossings` hold every crossing between the two regions,
    /// with `a` from `region`. Interior crossings become builder
    /// intersections the first time through.
    pub(super) fn index_crossings(&mut self, region: u8, cp: &mut CrossingProcessor<'r>) -> Result<bool, BuildError> {
        if self.crossings_region == Some(region) {
            return Ok(true);
        }
        if self.crossings_region.is_none() {
            for x in crossing_pairs(self.regions[0], self.regions[1]) {
                // Any interior crossing yields at least one output edge for
                // every operation type.
                if x.is_interior && cp.is_boolean_output() {
                    return Ok(false);
                }
                let mut c = IndexCrossing::new(x.a.id, x.b.id);
                if x.is_interior {
                    c.is_interior = true;
                    c.left_to_right = x.left_to_right();
                    cp.add_intersection(intersection(x.a.v0, x.a.v1, x.b.v0, x.b.v1))?;
                } else {
                    c.is_vertex_crossing = x.is_vertex_crossing();
                }
                cp.budget.push(&mut self.index_crossings, c)?;
            }
            sort_crossings(&mut self.index_crossings);
            self.crossings_region = Some(0);
        }
        if self.crossings_region != Some(region) {
            for c in &mut self.index_crossings {
                *c = c.swapped();
            }
            sort_crossings(&mut self.index_crossings);
            self.crossings_region = Some(region);
        }
        Ok(true)
    }

    /// Collect the first edge of every chain of `a_region` whose first vertex
    /// is inside the (possibly inverted) opposite region. In boolean mode the
    /// first edge of each chain is also run through the processor, which may
    /// already prove the result non-empty.
    fn chain_starts(
        &mut self,
        a_region: u8,
        invert_a: bool,
        invert_b: bool,
        invert_result: bool,
        cp: &mut CrossingProcessor<'r>,
        starts: &mut Vec<ShapeEdgeId>,
    ) -> Result<bool, BuildError> {
        let a_index = self.regions[usize::from(a_region)];
        let b_index = self.regions[usize::from(1 - a_region)];
        let boolean_output = cp.is_boolean_output();
        if boolean_output {
            cp.start_boundary(a_region, invert_a, invert_b, invert_result)?;
        }

        // Without polygons B contains nothing, but boolean mode still walks
        // the chain starts since that can end the operation early.
        let b_has_interior = has_interior(b_index);
        if !(b_has_interior || invert_b || boolean_output) {
            return Ok(true);
        }
        for (shape_id, a_shape) in a_index.shapes().iter().enumerate() {
            // Subtracted points and polylines only remove edges from B.
            if invert_a != invert_result && a_shape.dimension() < Dimension::Polygon {
                continue;
            }
            if boolean_output {
                cp.start_shape(a_shape);
            }
            for chain_id in 0..a_shape.num_chains() {
                let chain = a_shape.chain(chain_id);
                if chain.length == 0 {
                    continue;
                }
                let (v0, v1) = a_shape.chain_edge(chain_id, 0);
                let a = ShapeEdge {
                    id: ShapeEdgeId::new(shape_id as u32, chain.start),
                    v0,
                    v1,
                };
                let inside = (b_has_interior && b_index.contains(v0)) != invert_b;
                if inside {
                    cp.budget.push(starts, a.id)?;
                }
                if boolean_output {
                    cp.start_chain(chain_id, chain, inside);
                    if !self.process_incident_edges(a, b_index, cp)? {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    /// Run the first edge of a chain against the B edges incident to its
    /// start vertex only.
    fn process_incident_edges(
        &mut self,
        a: ShapeEdge,
        b_index: &'r Region,
        cp: &mut CrossingProcessor<'r>,
    ) -> Result<bool, BuildError> {
        self.tmp_crossings.clear();
        let mut pushed = Ok(());
        let tmp = &mut self.tmp_crossings;
        let budget = &mut cp.budget;
        b_index.visit_incident_edges(a.v0, |b| {
            let mut c = IndexCrossing::new(a.id, b.id);
            c.is_vertex_crossing = vertex_crossing(a.v0, a.v1, b.v0, b.v1);
            pushed = budget.push(tmp, c);
            pushed.is_ok()
        });
        pushed?;
        if self.tmp_crossings.is_empty() {
            return Ok(!cp.inside());
        }
        sort_crossings(&mut self.tmp_crossings);
        let mut it = CrossingIterator::new(b_index, &self.tmp_crossings, false);
        cp.process_edge(a.id, &mut it)
    }

    /// Walk the boundary of `a_region`, starting at each chain start and
    /// each crossing, and clip it to the opposite region.
    fn add_boundary(
        &mut self,
        a_region: u8,
        invert_a: bool,
        invert_b: bool,
        invert_result: bool,
        a_chain_starts: &[ShapeEdgeId],
        cp: &mut CrossingProcessor<'r>,
    ) -> Result<bool, BuildError> {
        let a_index = self.regions[usize::from(a_region)];
        let b_index = self.regions[usize::from(1 - a_region)];
        if !self.index_crossings(a_region, cp)? {
            return Ok(false);
        }
        cp.start_boundary(a_region, invert_a, invert_b, invert_result)?;

        let start_at = |i: usize| a_chain_starts.get(i).copied().unwrap_or(SENTINEL);
        let mut next_start = 0;
        let mut it = CrossingIterator::new(b_index, &self.index_crossings, true);
        let mut next_id = start_at(next_start).min(it.a_id());
        while next_id != SENTINEL {
            let shape_id = next_id.shape;
            let a_shape = a_index.shape(shape_id);
            cp.start_shape(a_shape);
            while next_id.shape == shape_id {
                let mut edge = next_id.edge;
                let chain_id = a_shape.chain_position(edge as usize).chain as usize;
                let chain = a_shape.chain(chain_id);
                let start_inside = next_id == start_at(next_start);
                if start_inside {
                    next_start += 1;
                }
                cp.start_chain(chain_id, chain, start_inside);
                let chain_limit = chain.start + chain.length;
                while edge < chain_limit {
                    let a_id = ShapeEdgeId::new(shape_id, edge);
                    debug_assert!(cp.inside() || it.a_id() == a_id);
                    if !cp.process_edge(a_id, &mut it)? {
                        return Ok(false);
                    }
                    if cp.inside() {
                        edge += 1;
                    } else if it.a_id().shape == shape_id && it.a_id().edge < chain_limit {
                        // Skip ahead to the next crossing of this chain.
                        edge = it.a_id().edge;
                    } else {
                        break;
                    }
                }
                next_id = start_at(next_start).min(it.a_id());
            }
        }
        Ok(true)
    }

    /// Two regions with the same shapes, chains and vertices. Shapes derive
    /// their interiors from their edges, so this is exact.
    fn regions_identical(&self) -> bool {
        let [a, b] = self.regions;
        std::ptr::eq(a, b) || a == b
    }
}

fn has_interior(region: &Region) -> bool {
    region.shapes().iter().any(|s| s.dimension() == Dimension::Polygon)
}

/// Decides whether a polygon result with no edges is empty or full, from the
/// cube faces the inputs touch and bounds on the result area.
#[derive(Debug, Clone, Copy)]
pub(super) struct FullPolygonTest {
    op_type: OpType,
    a_mask: u8,
    b_mask: u8,
    a_area: f64,
    b_area: f64,
    hemisphere_area_error: f64,
}

impl FullPolygonTest {
    pub(super) fn new(op_type: OpType, a: &Region, b: &Region, edge_snap_radius: f64) -> Self {
        Self {
            op_type,
            a_mask: a.face_mask(),
            b_mask: b.face_mask(),
            a_area: a.area(),
            b_area: b.area(),
            hemisphere_area_error: 2.0 * PI * edge_snap_radius + HEMISPHERE_CURVATURE_ERROR,
        }
    }

    /// Snapping never makes a result cover an extra cube face, since the
    /// snap radius is at most 70 degrees.
    pub(super) fn is_full(&self) -> bool {
        let (a, b) = (self.a_area, self.b_area);
        let sphere = 4.0 * PI;
        match self.op_type {
            OpType::Union => {
                if self.a_mask | self.b_mask != ALL_FACES {
                    return false;
                }
                // max(A, B) <= A | B <= min(4π, A + B)
                a.max(b) > sphere - sphere.min(a + b)
            }
            OpType::Intersection => {
                if self.a_mask & self.b_mask != ALL_FACES {
                    return false;
                }
                (a + b - sphere).max(0.0) > sphere - a.min(b)
            }
            OpType::Difference => {
                if self.a_mask != ALL_FACES {
                    return false;
                }
                (a - b).max(0.0) > sphere - a.min(sphere - b)
            }
            OpType::SymmetricDifference => {
                if self.a_mask | self.b_mask != ALL_FACES {
                    return false;
                }
                let min_area = (a - b).abs();
                let max_area = sphere - (sphere - (a + b)).abs();
                // Negative when an empty result needs less error than a full
                // one.
                let error_sign = min_area - (sphere - max_area);
                if error_sign.abs() <= self.hemisphere_area_error {
                    // Two near-hemispheres: full unless both touch every
                    // face, in which case the inputs are most likely nearly
                    // identical.
                    return self.a_mask & self.b_mask != ALL_FACES;
                }
                error_sign > 0.0
            }
        }
    }
}
