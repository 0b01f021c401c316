//! The per-layer output graph of the builder and the algorithms that
//! assemble it into loops and polylines.
//!
//! Edges are stored sorted lexicographically by `(source, destination)`, so
//! the outgoing edges of a vertex form a contiguous range.

use super::edge_processor;
use super::ids::{reverse, Edge, EdgeId, InputEdgeId, VertexId};
use super::lexicon::{IdSet, IdSetId, IdSetLexicon};
use crate::budget::MemoryBudget;
use crate::error::BuildError;
use crate::geometry::ordered_ccw;
use crate::types::Point;
use std::cmp::Ordering;
use std::ops::Range;

/// Marker for edges with no input edge ids (edges created by
/// `SiblingPairs::Create` or added as reversed siblings).
pub const NO_INPUT_EDGE_ID: InputEdgeId = InputEdgeId(u32::MAX);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeType {
    #[default]
    Directed,
    /// Every edge is stored together with its reverse.
    Undirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateEdges {
    Discard,
    /// Keep degenerate edges only at vertices with no other incident edges,
    /// merging duplicates.
    DiscardExcess,
    #[default]
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateEdges {
    Merge,
    #[default]
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingPairs {
    /// Remove every edge whose reverse is also present.
    Discard,
    /// Like `Discard` but keep one pair when only sibling pairs remain.
    DiscardExcess,
    #[default]
    Keep,
    /// Report `MissingExpectedSiblingEdges` when an edge has no reverse.
    Require,
    /// Add the reverse of every edge that lacks one.
    Create,
}

/// How a layer wants its edges processed before `build` sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    pub edge_type: EdgeType,
    pub degenerate_edges: DegenerateEdges,
    pub duplicate_edges: DuplicateEdges,
    pub sibling_pairs: SiblingPairs,
    /// Whether the graph may carry only the vertices its edges reference.
    pub allow_vertex_filtering: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            edge_type: EdgeType::Directed,
            degenerate_edges: DegenerateEdges::Keep,
            duplicate_edges: DuplicateEdges::Keep,
            sibling_pairs: SiblingPairs::Keep,
            allow_vertex_filtering: true,
        }
    }
}

impl GraphOptions {
    pub fn new(
        edge_type: EdgeType,
        degenerate_edges: DegenerateEdges,
        duplicate_edges: DuplicateEdges,
        sibling_pairs: SiblingPairs,
    ) -> Self {
        Self {
            edge_type,
            degenerate_edges,
            duplicate_edges,
            sibling_pairs,
            allow_vertex_filtering: true,
        }
    }

    pub fn with_vertex_filtering(mut self, allow: bool) -> Self {
        self.allow_vertex_filtering = allow;
        self
    }
}

/// Decides whether a graph with no edges is the full polygon or the empty
/// one.
pub type IsFullPolygonPredicate<'a> = dyn Fn(&Graph<'_>) -> Result<bool, BuildError> + 'a;

/// Default predicate: an edgeless polygon is empty.
pub fn never_full(_: &Graph<'_>) -> Result<bool, BuildError> {
    Ok(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopType {
    /// Split loops at repeated vertices so that no vertex repeats.
    Simple,
    /// Keep loops intact even if they revisit a vertex.
    Circuit,
}

/// A sequence of edges forming a loop or a polyline.
pub type EdgeLoop = Vec<EdgeId>;
pub type EdgePolyline = Vec<EdgeId>;

/// A read-only view of one layer's snapped edges.
#[derive(Clone, Copy)]
pub struct Graph<'g> {
    options: GraphOptions,
    vertices: &'g [Point],
    edges: &'g [Edge],
    input_edge_id_set_ids: &'g [IdSetId],
    input_edge_id_set_lexicon: &'g IdSetLexicon,
    label_set_ids: &'g [IdSetId],
    label_set_lexicon: &'g IdSetLexicon,
    is_full_polygon_predicate: &'g IsFullPolygonPredicate<'g>,
}

impl std::fmt::Debug for Graph<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.options)
            .field("num_vertices", &self.vertices.len())
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}

impl<'g> Graph<'g> {
    /// `edges` must be sorted and parallel to `input_edge_id_set_ids`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        options: GraphOptions,
        vertices: &'g [Point],
        edges: &'g [Edge],
        input_edge_id_set_ids: &'g [IdSetId],
        input_edge_id_set_lexicon: &'g IdSetLexicon,
        label_set_ids: &'g [IdSetId],
        label_set_lexicon: &'g IdSetLexicon,
        is_full_polygon_predicate: &'g IsFullPolygonPredicate<'g>,
    ) -> Self {
        debug_assert!(edges.windows(2).all(|w| w[0] <= w[1]));
        debug_assert_eq!(edges.len(), input_edge_id_set_ids.len());
        Self {
            options,
            vertices,
            edges,
            input_edge_id_set_ids,
            input_edge_id_set_lexicon,
            label_set_ids,
            label_set_lexicon,
            is_full_polygon_predicate,
        }
    }

    #[inline]
    pub fn options(&self) -> GraphOptions {
        self.options
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn vertex(&self, v: VertexId) -> Point {
        self.vertices[v.index()]
    }

    #[inline]
    pub fn vertices(&self) -> &'g [Point] {
        self.vertices
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edge(&self, e: EdgeId) -> Edge {
        self.edges[e.index()]
    }

    #[inline]
    pub fn edges(&self) -> &'g [Edge] {
        self.edges
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// The input edges that snapped to `e`, in increasing order.
    pub fn input_edge_ids(&self, e: EdgeId) -> IdSet<'g> {
        self.input_edge_id_set_lexicon
            .id_set(self.input_edge_id_set_ids[e.index()])
    }

    #[inline]
    pub fn input_edge_id_set_id(&self, e: EdgeId) -> IdSetId {
        self.input_edge_id_set_ids[e.index()]
    }

    #[inline]
    pub fn input_edge_id_set_ids(&self) -> &'g [IdSetId] {
        self.input_edge_id_set_ids
    }

    #[inline]
    pub fn input_edge_id_set_lexicon(&self) -> &'g IdSetLexicon {
        self.input_edge_id_set_lexicon
    }

    /// Smallest input edge id of `e`, or `NO_INPUT_EDGE_ID`.
    pub fn min_input_edge_id(&self, e: EdgeId) -> InputEdgeId {
        self.input_edge_ids(e)
            .first()
            .map_or(NO_INPUT_EDGE_ID, InputEdgeId)
    }

    pub fn min_input_edge_ids(&self) -> Vec<InputEdgeId> {
        self.edge_ids().map(|e| self.min_input_edge_id(e)).collect()
    }

    /// Edge ids ordered by their smallest input edge id (stable).
    pub fn input_edge_order(&self, min_input_ids: &[InputEdgeId]) -> Vec<EdgeId> {
        let mut order: Vec<EdgeId> = (0..min_input_ids.len()).map(EdgeId::new).collect();
        order.sort_by_key(|&e| (min_input_ids[e.index()], e));
        order
    }

    /// Labels attached to an input edge.
    pub fn labels(&self, e: InputEdgeId) -> IdSet<'g> {
        match self.label_set_ids.get(e.index()) {
            Some(&id) => self.label_set_lexicon.id_set(id),
            None => IdSet::Empty,
        }
    }

    #[inline]
    pub fn label_set_ids(&self) -> &'g [IdSetId] {
        self.label_set_ids
    }

    #[inline]
    pub fn label_set_lexicon(&self) -> &'g IdSetLexicon {
        self.label_set_lexicon
    }

    #[inline]
    pub fn is_full_polygon_predicate(&self) -> &'g IsFullPolygonPredicate<'g> {
        self.is_full_polygon_predicate
    }

    /// Whether an edgeless polygon result is the full sphere.
    pub fn is_full_polygon(&self) -> Result<bool, BuildError> {
        (self.is_full_polygon_predicate)(self)
    }

    /// For each position `i` in sorted edge order, the id of the edge whose
    /// reverse sorts at `i`.
    pub fn in_edge_ids(&self) -> Vec<EdgeId> {
        let mut ids: Vec<EdgeId> = self.edge_ids().collect();
        ids.sort_by(|&a, &b| {
            (reverse(self.edge(a)), a).cmp(&(reverse(self.edge(b)), b))
        });
        ids
    }

    /// Map from each edge to its sibling (reverse) edge.
    ///
    /// Requires that every edge has a sibling, which holds for undirected
    /// graphs and for `SiblingPairs::Require` / `Create`.
    pub fn sibling_map(&self) -> Vec<EdgeId> {
        let mut in_edges = self.in_edge_ids();
        self.make_sibling_map(&mut in_edges);
        in_edges
    }

    /// Turn the in-edge ordering into a sibling map in place.
    pub fn make_sibling_map(&self, in_edges: &mut [EdgeId]) {
        debug_assert!(
            matches!(
                self.options.sibling_pairs,
                SiblingPairs::Require | SiblingPairs::Create
            ) || self.options.edge_type == EdgeType::Undirected
        );
        if self.options.edge_type == EdgeType::Directed
            || self.options.degenerate_edges == DegenerateEdges::Discard
        {
            return;
        }
        // Undirected degenerate edges come in consecutive pairs; each is the
        // sibling of the other.
        let mut e = 0;
        while e < self.edges.len() {
            let (v0, v1) = self.edges[e];
            if v0 == v1 && e + 1 < self.edges.len() {
                in_edges[e] = EdgeId::new(e + 1);
                in_edges[e + 1] = EdgeId::new(e);
                e += 1;
            }
            e += 1;
        }
    }

    /// For each incoming edge, the outgoing edge that makes the sharpest left
    /// turn at its destination. Degenerate edges map to themselves.
    ///
    /// Fails with `EdgesDoNotFormLoops` if some vertex has more incoming
    /// than outgoing edges.
    pub fn left_turn_map(&self, in_edge_ids: &[EdgeId]) -> Result<Vec<Option<EdgeId>>, BuildError> {
        #[derive(Clone, Copy)]
        struct VertexEdge {
            incoming: bool,
            index: EdgeId,
            endpoint: VertexId,
            rank: u32,
        }

        let n = self.edges.len();
        let mut left_turn = vec![None; n];
        if n == 0 {
            return Ok(left_turn);
        }
        let sentinel: Edge = (
            VertexId::new(self.num_vertices()),
            VertexId::new(self.num_vertices()),
        );
        let out_at = |i: usize| if i < n { self.edges[i] } else { sentinel };
        let in_at = |i: usize| {
            if i < n {
                reverse(self.edges[in_edge_ids[i].index()])
            } else {
                sentinel
            }
        };

        let mut unmatched = false;
        let mut v0_edges: Vec<VertexEdge> = Vec::new();
        let mut e_in: Vec<EdgeId> = Vec::new();
        let mut e_out: Vec<EdgeId> = Vec::new();
        let (mut out, mut inn) = (0usize, 0usize);
        let mut min_edge = out_at(out).min(in_at(inn));
        while min_edge != sentinel {
            let v0 = min_edge.0;
            let mut rank = 0u32;
            while min_edge.0 == v0 {
                let v1 = min_edge.1;
                let (out_begin, in_begin) = (out, inn);
                while out_at(out) == min_edge {
                    out += 1;
                }
                while in_at(inn) == min_edge {
                    inn += 1;
                }
                if v1 != v0 {
                    for i in out_begin..out {
                        v0_edges.push(VertexEdge {
                            incoming: false,
                            index: EdgeId::new(i),
                            endpoint: v1,
                            rank,
                        });
                        rank += 1;
                    }
                    for &id in &in_edge_ids[in_begin..inn] {
                        v0_edges.push(VertexEdge {
                            incoming: true,
                            index: id,
                            endpoint: v1,
                            rank,
                        });
                        rank += 1;
                    }
                } else {
                    for &id in &in_edge_ids[in_begin..inn] {
                        left_turn[id.index()] = Some(id);
                    }
                }
                min_edge = out_at(out).min(in_at(inn));
            }
            if v0_edges.is_empty() {
                continue;
            }

            // Clockwise order around v0, starting from the smallest
            // endpoint.
            let min_endpoint = v0_edges[0].endpoint;
            let (o, m) = (self.vertex(v0), self.vertex(min_endpoint));
            v0_edges[1..].sort_by(|a, b| {
                if a.endpoint == b.endpoint {
                    return a.rank.cmp(&b.rank);
                }
                if a.endpoint == min_endpoint {
                    return Ordering::Less;
                }
                if b.endpoint == min_endpoint {
                    return Ordering::Greater;
                }
                if !ordered_ccw(self.vertex(a.endpoint), self.vertex(b.endpoint), m, o) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            });

            // Match each outgoing edge with the closest unmatched incoming
            // edge before it; leftovers wrap around circularly.
            for ve in &v0_edges {
                if ve.incoming {
                    e_in.push(ve.index);
                } else if let Some(e) = e_in.pop() {
                    left_turn[e.index()] = Some(ve.index);
                } else {
                    e_out.push(ve.index);
                }
            }
            e_out.reverse();
            while let (Some(&ein), Some(&eout)) = (e_in.last(), e_out.last()) {
                left_turn[ein.index()] = Some(eout);
                e_in.pop();
                e_out.pop();
            }
            unmatched |= !e_in.is_empty();
            e_in.clear();
            e_out.clear();
            v0_edges.clear();
        }
        if unmatched {
            return Err(BuildError::EdgesDoNotFormLoops(
                "indegree != outdegree".to_string(),
            ));
        }
        Ok(left_turn)
    }

    /// Assemble the edges of a directed graph into loops by always taking
    /// the left turn. Degenerate edges become single-edge loops.
    pub fn directed_loops(&self, loop_type: LoopType) -> Result<Vec<EdgeLoop>, BuildError> {
        debug_assert_eq!(self.options.edge_type, EdgeType::Directed);
        let mut left_turn = self.left_turn_map(&self.in_edge_ids())?;
        let min_input_ids = self.min_input_edge_ids();

        let mut path_index: Vec<Option<usize>> = match loop_type {
            LoopType::Simple => vec![None; self.num_vertices()],
            LoopType::Circuit => Vec::new(),
        };
        let mut loops = Vec::new();
        let mut path: Vec<EdgeId> = Vec::new();
        for start in 0..self.edges.len() {
            let mut next = left_turn[start].take().map(|n| (EdgeId::new(start), n));
            while let Some((e, following)) = next {
                path.push(e);
                if loop_type == LoopType::Simple {
                    let (src, dst) = self.edge(e);
                    path_index[src.index()] = Some(path.len() - 1);
                    if let Some(loop_start) = path_index[dst.index()] {
                        let mut lp = path.split_off(loop_start);
                        for e2 in &lp {
                            path_index[self.edge(*e2).0.index()] = None;
                        }
                        canonicalize_loop_order(&min_input_ids, &mut lp);
                        loops.push(lp);
                    }
                }
                next = left_turn[following.index()].take().map(|n| (following, n));
            }
            if loop_type == LoopType::Circuit && !path.is_empty() {
                let mut lp = std::mem::take(&mut path);
                canonicalize_loop_order(&min_input_ids, &mut lp);
                loops.push(lp);
            }
            debug_assert!(loop_type == LoopType::Circuit || path.is_empty());
        }
        canonicalize_vector_order(&min_input_ids, &mut loops);
        Ok(loops)
    }

    /// Assemble the edges into maximal paths that do not pass through a
    /// vertex of degree other than two. Whatever remains forms loops.
    pub fn polylines(&self) -> Vec<EdgePolyline> {
        debug_assert!(matches!(
            self.options.sibling_pairs,
            SiblingPairs::Discard | SiblingPairs::DiscardExcess | SiblingPairs::Keep
        ));
        PolylineBuilder::new(self).build_paths()
    }

    /// Build a graph over the same vertices with different edges and
    /// options. `new_edges` and `new_input_ids` are processed in place.
    pub fn make_subgraph<'s>(
        &'s self,
        mut new_options: GraphOptions,
        new_edges: &'s mut Vec<Edge>,
        new_input_ids: &'s mut Vec<IdSetId>,
        new_lexicon: &'s mut IdSetLexicon,
        is_full_polygon_predicate: &'s IsFullPolygonPredicate<'s>,
        budget: &mut MemoryBudget,
    ) -> (Graph<'s>, Result<(), BuildError>) {
        let result = add_reverse_edges(self.options, new_options, new_edges, new_input_ids, budget)
            .and_then(|()| {
                Graph::process_edges(&mut new_options, new_edges, new_input_ids, new_lexicon, budget)
            });
        let graph = Graph::new(
            new_options,
            self.vertices,
            new_edges,
            new_input_ids,
            new_lexicon,
            self.label_set_ids,
            self.label_set_lexicon,
            is_full_polygon_predicate,
        );
        (graph, result)
    }

    /// Sort, deduplicate and filter edges according to `options`.
    ///
    /// The edges are processed even when `MissingExpectedSiblingEdges` is
    /// returned. The only other error is `ResourceExhausted`. `Require` and
    /// `Create` turn undirected graphs into directed ones.
    pub fn process_edges(
        options: &mut GraphOptions,
        edges: &mut Vec<Edge>,
        input_ids: &mut Vec<IdSetId>,
        lexicon: &mut IdSetLexicon,
        budget: &mut MemoryBudget,
    ) -> Result<(), BuildError> {
        let result = edge_processor::run(*options, edges, input_ids, lexicon, budget);
        if matches!(
            options.sibling_pairs,
            SiblingPairs::Require | SiblingPairs::Create
        ) {
            options.edge_type = EdgeType::Directed;
        }
        result
    }

    /// Keep only the vertices referenced by `edges` and renumber the edges.
    /// Edge order is preserved because the renumbering is monotone.
    pub fn filter_vertices(
        vertices: &[Point],
        edges: &mut [Edge],
        budget: &mut MemoryBudget,
    ) -> Result<Vec<Point>, BuildError> {
        let mut used: Vec<VertexId> = Vec::new();
        budget.reserve(&mut used, 2 * edges.len())?;
        used.extend(edges.iter().flat_map(|&(a, b)| [a, b]));
        used.sort_unstable();
        used.dedup();
        let mut vmap = Vec::new();
        budget.reserve(&mut vmap, vertices.len())?;
        vmap.resize(vertices.len(), VertexId(0));
        let mut new_vertices = Vec::new();
        budget.reserve(&mut new_vertices, used.len())?;
        for (i, &v) in used.iter().enumerate() {
            new_vertices.push(vertices[v.index()]);
            vmap[v.index()] = VertexId::new(i);
        }
        for e in edges.iter_mut() {
            *e = (vmap[e.0.index()], vmap[e.1.index()]);
        }
        budget.release(&mut used);
        budget.release(&mut vmap);
        Ok(new_vertices)
    }
}

/// Give every edge of a directed graph its reverse when the subgraph is
/// undirected.
fn add_reverse_edges(
    options: GraphOptions,
    new_options: GraphOptions,
    edges: &mut Vec<Edge>,
    input_ids: &mut Vec<IdSetId>,
    budget: &mut MemoryBudget,
) -> Result<(), BuildError> {
    if options.edge_type != EdgeType::Directed || new_options.edge_type != EdgeType::Undirected {
        return Ok(());
    }
    let n = edges.len();
    budget.reserve(edges, n)?;
    budget.reserve(input_ids, n)?;
    for i in 0..n {
        edges.push(reverse(edges[i]));
        input_ids.push(IdSetId::EMPTY);
    }
    Ok(())
}

/// Rotate `lp` so that it starts just after the run of edges with the
/// largest input edge id. Chains from a single input edge are never split
/// across the start of the loop.
pub fn canonicalize_loop_order(min_input_ids: &[InputEdgeId], lp: &mut [EdgeId]) {
    if lp.is_empty() {
        return;
    }
    let id = |i: usize| min_input_ids[lp[i].index()];
    let mut pos = 0;
    let mut saw_gap = false;
    for i in 1..lp.len() {
        match id(i).cmp(&id(pos)) {
            Ordering::Less => saw_gap = true,
            Ordering::Greater => {
                pos = i;
                saw_gap = false;
            }
            Ordering::Equal if !saw_gap => {
                pos = i;
            }
            Ordering::Equal => {}
        }
    }
    pos += 1;
    if pos == lp.len() {
        pos = 0;
    }
    lp.rotate_left(pos);
}

/// Stable sort of loops or polylines by the input id of their first edge.
pub fn canonicalize_vector_order(min_input_ids: &[InputEdgeId], chains: &mut [Vec<EdgeId>]) {
    chains.sort_by_key(|c| c.first().map_or(NO_INPUT_EDGE_ID, |e| min_input_ids[e.index()]));
}

/// Outgoing edges of each vertex, as contiguous ranges of the sorted edges.
#[derive(Debug, Clone)]
pub struct VertexOutMap<'g> {
    edges: &'g [Edge],
    edge_begins: Vec<u32>,
}

impl<'g> VertexOutMap<'g> {
    pub fn new(g: &Graph<'g>) -> Self {
        let edges = g.edges();
        let mut edge_begins = Vec::with_capacity(g.num_vertices() + 1);
        let mut e = 0usize;
        for v in 0..=g.num_vertices() {
            while e < edges.len() && edges[e].0.index() < v {
                e += 1;
            }
            edge_begins.push(e as u32);
        }
        Self { edges, edge_begins }
    }

    #[inline]
    pub fn degree(&self, v: VertexId) -> usize {
        self.range(v).len()
    }

    #[inline]
    pub fn range(&self, v: VertexId) -> Range<usize> {
        self.edge_begins[v.index()] as usize..self.edge_begins[v.index() + 1] as usize
    }

    pub fn edge_ids(&self, v: VertexId) -> impl Iterator<Item = EdgeId> {
        self.range(v).map(EdgeId::new)
    }

    #[inline]
    pub fn edges(&self, v: VertexId) -> &'g [Edge] {
        &self.edges[self.range(v)]
    }

    /// Ids of the edges from `v0` to `v1`.
    pub fn edge_ids_between(&self, v0: VertexId, v1: VertexId) -> impl Iterator<Item = EdgeId> {
        let r = self.range(v0);
        let out = &self.edges[r.clone()];
        let lo = r.start + out.partition_point(|e| e.1 < v1);
        let hi = r.start + out.partition_point(|e| e.1 <= v1);
        (lo..hi).map(EdgeId::new)
    }
}

/// Incoming edges of each vertex.
#[derive(Debug, Clone)]
pub struct VertexInMap {
    in_edge_ids: Vec<EdgeId>,
    in_edge_begins: Vec<u32>,
}

impl VertexInMap {
    pub fn new(g: &Graph<'_>) -> Self {
        let in_edge_ids = g.in_edge_ids();
        let mut in_edge_begins = Vec::with_capacity(g.num_vertices() + 1);
        let mut i = 0usize;
        for v in 0..=g.num_vertices() {
            while i < in_edge_ids.len() && g.edge(in_edge_ids[i]).1.index() < v {
                i += 1;
            }
            in_edge_begins.push(i as u32);
        }
        Self {
            in_edge_ids,
            in_edge_begins,
        }
    }

    #[inline]
    pub fn degree(&self, v: VertexId) -> usize {
        self.edge_ids(v).len()
    }

    #[inline]
    pub fn edge_ids(&self, v: VertexId) -> &[EdgeId] {
        let lo = self.in_edge_begins[v.index()] as usize;
        let hi = self.in_edge_begins[v.index() + 1] as usize;
        &self.in_edge_ids[lo..hi]
    }

    #[inline]
    pub fn in_edge_ids(&self) -> &[EdgeId] {
        &self.in_edge_ids
    }
}

struct PolylineBuilder<'a, 'g> {
    g: &'a Graph<'g>,
    in_map: VertexInMap,
    out_map: VertexOutMap<'g>,
    sibling_map: Vec<EdgeId>,
    min_input_ids: Vec<InputEdgeId>,
    directed: bool,
    edges_left: usize,
    used: Vec<bool>,
}

impl<'a, 'g> PolylineBuilder<'a, 'g> {
    fn new(g: &'a Graph<'g>) -> Self {
        let directed = g.options().edge_type == EdgeType::Directed;
        let in_map = VertexInMap::new(g);
        let sibling_map = if directed {
            Vec::new()
        } else {
            let mut map = in_map.in_edge_ids().to_vec();
            g.make_sibling_map(&mut map);
            map
        };
        Self {
            g,
            out_map: VertexOutMap::new(g),
            in_map,
            sibling_map,
            min_input_ids: g.min_input_edge_ids(),
            directed,
            edges_left: g.num_edges() / if directed { 1 } else { 2 },
            used: vec![false; g.num_edges()],
        }
    }

    fn is_interior(&self, v: VertexId) -> bool {
        if self.directed {
            self.in_map.degree(v) == 1 && self.out_map.degree(v) == 1
        } else {
            self.out_map.degree(v) == 2
        }
    }

    fn build_paths(mut self) -> Vec<EdgePolyline> {
        let order = self.g.input_edge_order(&self.min_input_ids);
        let mut polylines = Vec::new();
        for &e in &order {
            if !self.used[e.index()] && !self.is_interior(self.g.edge(e).0) {
                polylines.push(self.build_path(e));
            }
        }
        // Anything left forms disjoint loops.
        for &e in &order {
            if self.edges_left == 0 {
                break;
            }
            if self.used[e.index()] {
                continue;
            }
            let mut polyline = self.build_path(e);
            canonicalize_loop_order(&self.min_input_ids, &mut polyline);
            polylines.push(polyline);
        }
        canonicalize_vector_order(&self.min_input_ids, &mut polylines);
        polylines
    }

    fn build_path(&mut self, mut e: EdgeId) -> EdgePolyline {
        let mut polyline = Vec::new();
        let start = self.g.edge(e).0;
        loop {
            polyline.push(e);
            self.used[e.index()] = true;
            if !self.directed {
                self.used[self.sibling_map[e.index()].index()] = true;
            }
            self.edges_left = self.edges_left.saturating_sub(1);
            let v = self.g.edge(e).1;
            if !self.is_interior(v) || v == start {
                break;
            }
            let next = self.out_map.edge_ids(v).find(|e2| !self.used[e2.index()]);
            match next {
                Some(e2) => e = e2,
                None => break,
            }
        }
        polyline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;

    fn v(i: u32) -> VertexId {
        VertexId(i)
    }

    fn e(i: usize) -> EdgeId {
        EdgeId::new(i)
    }

    struct Fixture {
        vertices: Vec<Point>,
        edges: Vec<Edge>,
        ids: Vec<IdSetId>,
        lexicon: IdSetLexicon,
        labels: IdSetLexicon,
    }

    impl Fixture {
        /// Edges are given in input order; input edge i gets id {i}.
        fn new(coords: &[(f64, f64)], edges: &[(u32, u32)], options: GraphOptions) -> Self {
            let vertices = coords
                .iter()
                .map(|&(lat, lng)| LatLng::from_degrees(lat, lng).to_point())
                .collect();
            let mut edges: Vec<Edge> = edges.iter().map(|&(a, b)| (v(a), v(b))).collect();
            let mut ids: Vec<IdSetId> = (0..edges.len() as u32).map(IdSetId::singleton).collect();
            let mut lexicon = IdSetLexicon::new();
            let mut options = options;
            let mut budget = MemoryBudget::unlimited();
            Graph::process_edges(&mut options, &mut edges, &mut ids, &mut lexicon, &mut budget).unwrap();
            Self {
                vertices,
                edges,
                ids,
                lexicon,
                labels: IdSetLexicon::new(),
            }
        }

        fn graph(&self, options: GraphOptions) -> Graph<'_> {
            Graph::new(
                options,
                &self.vertices,
                &self.edges,
                &self.ids,
                &self.lexicon,
                &[],
                &self.labels,
                &never_full,
            )
        }
    }

    // A square with vertices 0..4 counter-clockwise.
    const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];

    #[test]
    fn test_vertex_maps() {
        let opts = GraphOptions::default();
        let f = Fixture::new(&SQUARE, &[(0, 1), (1, 2), (0, 2), (2, 0)], opts);
        let g = f.graph(opts);
        let out = VertexOutMap::new(&g);
        let inn = VertexInMap::new(&g);
        assert_eq!(out.degree(v(0)), 2);
        assert_eq!(out.degree(v(3)), 0);
        assert_eq!(inn.degree(v(2)), 2);
        assert_eq!(out.edge_ids_between(v(0), v(2)).count(), 1);
        assert_eq!(out.edge_ids_between(v(0), v(3)).count(), 0);
    }

    #[test]
    fn test_directed_loops_follow_left_turns() {
        let opts = GraphOptions::default();
        let f = Fixture::new(&SQUARE, &[(0, 1), (1, 2), (2, 3), (3, 0)], opts);
        let g = f.graph(opts);
        let loops = g.directed_loops(LoopType::Simple).unwrap();
        assert_eq!(loops.len(), 1);
        let srcs: Vec<u32> = loops[0].iter().map(|&id| g.edge(id).0 .0).collect();
        assert_eq!(srcs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_simple_loops_split_at_repeated_vertex() {
        // Figure eight through vertex 0.
        let coords = [(0.0, 0.0), (1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)];
        let opts = GraphOptions::default();
        let f = Fixture::new(&coords, &[(0, 2), (2, 1), (1, 0), (0, 4), (4, 3), (3, 0)], opts);
        let g = f.graph(opts);
        assert_eq!(g.directed_loops(LoopType::Simple).unwrap().len(), 2);
        let circuits = g.directed_loops(LoopType::Circuit).unwrap();
        assert_eq!(circuits.iter().map(Vec::len).sum::<usize>(), 6);
    }

    #[test]
    fn test_left_turn_map_rejects_unbalanced_vertices() {
        let opts = GraphOptions::default();
        let f = Fixture::new(&SQUARE, &[(0, 1), (1, 2)], opts);
        let g = f.graph(opts);
        assert!(matches!(
            g.directed_loops(LoopType::Circuit),
            Err(BuildError::EdgesDoNotFormLoops(_))
        ));
    }

    #[test]
    fn test_degenerate_edge_is_its_own_loop() {
        let opts = GraphOptions::default();
        let f = Fixture::new(&SQUARE, &[(1, 1)], opts);
        let g = f.graph(opts);
        assert_eq!(g.directed_loops(LoopType::Circuit).unwrap(), vec![vec![e(0)]]);
    }

    #[test]
    fn test_polylines_break_at_branch_vertices() {
        let opts = GraphOptions::default();
        let f = Fixture::new(&SQUARE, &[(0, 1), (1, 2), (1, 3)], opts);
        let g = f.graph(opts);
        let lines = g.polylines();
        assert_eq!(lines.len(), 3);
        // Closed polylines come back as a single loop starting at the first
        // input edge.
        let f = Fixture::new(&SQUARE, &[(0, 1), (1, 2), (2, 0)], opts);
        let g = f.graph(opts);
        let lines = g.polylines();
        assert_eq!(lines.len(), 1);
        assert_eq!(g.min_input_edge_id(lines[0][0]), InputEdgeId(0));
    }

    #[test]
    fn test_undirected_polyline_keeps_input_direction() {
        let opts = GraphOptions::new(
            EdgeType::Undirected,
            DegenerateEdges::Keep,
            DuplicateEdges::Keep,
            SiblingPairs::Keep,
        );
        let mut edges = vec![(v(2), v(1)), (v(1), v(0))];
        let mut ids = vec![IdSetId::singleton(0), IdSetId::singleton(1)];
        for i in 0..2 {
            edges.push(reverse(edges[i]));
            ids.push(IdSetId::EMPTY);
        }
        let mut lexicon = IdSetLexicon::new();
        let mut o = opts;
        let mut budget = MemoryBudget::unlimited();
        Graph::process_edges(&mut o, &mut edges, &mut ids, &mut lexicon, &mut budget).unwrap();
        let vertices: Vec<Point> = SQUARE
            .iter()
            .map(|&(a, b)| LatLng::from_degrees(a, b).to_point())
            .collect();
        let labels = IdSetLexicon::new();
        let g = Graph::new(o, &vertices, &edges, &ids, &lexicon, &[], &labels, &never_full);
        let lines = g.polylines();
        assert_eq!(lines.len(), 1);
        let path: Vec<Edge> = lines[0].iter().map(|&id| g.edge(id)).collect();
        assert_eq!(path, vec![(v(2), v(1)), (v(1), v(0))]);
    }

    #[test]
    fn test_canonicalize_loop_order_starts_after_largest_run() {
        let ids = [InputEdgeId(3), InputEdgeId(0), InputEdgeId(1), InputEdgeId(3)];
        let mut lp = vec![e(0), e(1), e(2), e(3)];
        canonicalize_loop_order(&ids, &mut lp);
        assert_eq!(lp, vec![e(1), e(2), e(3), e(0)]);
    }

    #[test]
    fn test_filter_vertices_renumbers() {
        let verts: Vec<Point> = SQUARE
            .iter()
            .map(|&(a, b)| LatLng::from_degrees(a, b).to_point())
            .collect();
        let mut edges = vec![(v(1), v(3)), (v(3), v(1))];
        let mut budget = MemoryBudget::unlimited();
        let kept = Graph::filter_vertices(&verts, &mut edges, &mut budget).unwrap();
        assert_eq!(kept, vec![verts[1], verts[3]]);
        assert_eq!(edges, vec![(v(0), v(1)), (v(1), v(0))]);
        // The scratch is released; the new vertices stay charged.
        assert_eq!(budget.usage(), kept.capacity() * std::mem::size_of::<Point>());
    }

    #[test]
    fn test_filter_vertices_charges_budget() {
        let verts: Vec<Point> = SQUARE
            .iter()
            .map(|&(a, b)| LatLng::from_degrees(a, b).to_point())
            .collect();
        let mut edges = vec![(v(1), v(3)), (v(3), v(1))];
        // Enough for the scratch maps but not for the new vertices.
        let mut budget = MemoryBudget::with_limit(Some(8 * std::mem::size_of::<VertexId>()));
        assert!(matches!(
            Graph::filter_vertices(&verts, &mut edges, &mut budget),
            Err(BuildError::ResourceExhausted { .. })
        ));
    }

    #[test]
    fn test_full_polygon_predicate_is_consulted() {
        let opts = GraphOptions::default();
        let f = Fixture::new(&SQUARE, &[], opts);
        let full = |_: &Graph<'_>| -> Result<bool, BuildError> { Ok(true) };
        let g = Graph::new(opts, &f.vertices, &f.edges, &f.ids, &f.lexicon, &[], &f.labels, &full);
        assert!(g.is_full_polygon().unwrap());
        assert!(!f.graph(opts).is_full_polygon().unwrap());
    }
}
