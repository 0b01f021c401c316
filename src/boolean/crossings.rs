//! Crossing records between the edges of two regions, and a cursor over the
//! records for one edge at a time.

use crate::region::{Dimension, Region, Shape, ShapeEdgeId};
use crate::types::Point;

/// Sorts after every real edge id; marks the end of a crossing or chain
/// start sequence.
pub(crate) const SENTINEL: ShapeEdgeId = ShapeEdgeId::new(u32::MAX, 0);

/// A pair of touching edges, `a` from the region being walked and `b` from
/// the other one.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexCrossing {
    pub a: ShapeEdgeId,
    pub b: ShapeEdgeId,
    /// The edges cross at a point interior to both.
    pub is_interior: bool,
    /// `b` crosses `a` from left to right. Only meaningful for interior
    /// crossings.
    pub left_to_right: bool,
    /// Semi-open vertex crossing result. Only meaningful when the edges
    /// share exactly one vertex and neither is degenerate.
    pub is_vertex_crossing: bool,
}

impl IndexCrossing {
    pub(crate) fn new(a: ShapeEdgeId, b: ShapeEdgeId) -> Self {
        Self {
            a,
            b,
            is_interior: false,
            left_to_right: false,
            is_vertex_crossing: false,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> (ShapeEdgeId, ShapeEdgeId) {
        (self.a, self.b)
    }

    /// The same crossing seen from the other region.
    pub(crate) fn swapped(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            is_interior: self.is_interior,
            left_to_right: !self.left_to_right,
            is_vertex_crossing: !self.is_vertex_crossing,
        }
    }
}

/// Sort by `(a, b)` and drop duplicate pairs.
pub(crate) fn sort_crossings(crossings: &mut Vec<IndexCrossing>) {
    crossings.sort_unstable_by_key(IndexCrossing::key);
    crossings.dedup_by_key(|c| c.key());
}

/// The chain of the current `b` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChainInfo {
    pub chain: usize,
    pub start: u32,
    pub limit: u32,
}

/// Cursor over crossings sorted by `a`, positioned at the first crossing of
/// the next `a` edge that has any.
pub(crate) struct CrossingIterator<'a> {
    b_region: &'a Region,
    crossings: &'a [IndexCrossing],
    pos: usize,
    crossings_complete: bool,
}

impl<'a> CrossingIterator<'a> {
    /// `crossings_complete` says whether `crossings` holds every crossing
    /// between the two regions rather than a subset.
    pub(crate) fn new(b_region: &'a Region, crossings: &'a [IndexCrossing], crossings_complete: bool) -> Self {
        Self {
            b_region,
            crossings,
            pos: 0,
            crossings_complete,
        }
    }

    #[inline]
    fn current(&self) -> &IndexCrossing {
        &self.crossings[self.pos]
    }

    #[inline]
    pub(crate) fn next(&mut self) {
        self.pos += 1;
    }

    /// True once every crossing of edge `id` has been consumed.
    #[inline]
    pub(crate) fn done(&self, id: ShapeEdgeId) -> bool {
        self.a_id() != id
    }

    /// Skip the remaining crossings of `id`.
    pub(crate) fn skip(&mut self, id: ShapeEdgeId) {
        while !self.done(id) {
            self.next();
        }
    }

    #[inline]
    pub(crate) fn crossings_complete(&self) -> bool {
        self.crossings_complete
    }

    /// The `a` edge of the current crossing, or [`SENTINEL`] at the end.
    #[inline]
    pub(crate) fn a_id(&self) -> ShapeEdgeId {
        self.crossings.get(self.pos).map_or(SENTINEL, |c| c.a)
    }

    #[inline]
    pub(crate) fn b_id(&self) -> ShapeEdgeId {
        self.current().b
    }

    #[inline]
    pub(crate) fn is_interior_crossing(&self) -> bool {
        self.current().is_interior
    }

    #[inline]
    pub(crate) fn is_vertex_crossing(&self) -> bool {
        self.current().is_vertex_crossing
    }

    #[inline]
    pub(crate) fn left_to_right(&self) -> bool {
        self.current().left_to_right
    }

    #[inline]
    pub(crate) fn b_shape(&self) -> &'a Shape {
        self.b_region.shape(self.b_id().shape)
    }

    #[inline]
    pub(crate) fn b_dimension(&self) -> Dimension {
        self.b_shape().dimension()
    }

    #[inline]
    pub(crate) fn b_edge_id(&self) -> u32 {
        self.b_id().edge
    }

    #[inline]
    pub(crate) fn b_edge(&self) -> (Point, Point) {
        self.b_shape().edge(self.b_edge_id() as usize)
    }

    pub(crate) fn b_chain_info(&self) -> ChainInfo {
        let shape = self.b_shape();
        let chain = shape.chain_position(self.b_edge_id() as usize).chain as usize;
        let c = shape.chain(chain);
        ChainInfo {
            chain,
            start: c.start,
            limit: c.start + c.length,
        }
    }
}
