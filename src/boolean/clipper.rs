//! Trims the snapped edge chains of the boundary clipper's output.
//!
//! The boundary clipper emits every input edge that might belong to the
//! result, together with the input edges of the other region that cross it.
//! After snapping, each input edge has become a chain of graph edges, and
//! this module decides which pieces of each chain survive.

use crate::budget::MemoryBudget;
use crate::builder::{
    DegenerateEdges, DuplicateEdges, Edge, EdgeId, EdgeType, Graph, GraphOptions, IdSetId,
    InputEdgeId, Layer, SiblingPairs, VertexId, VertexInMap, VertexOutMap,
};
use crate::error::{invariant, BuildError};
use crate::geometry::edge::turn_angle;
use crate::geometry::ordered_ccw;
use tracing::debug;

/// One entry of the clipping instruction stream attached to an input edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Crossing {
    /// Input edge `input` crosses this edge, from left to right if
    /// `left_to_right` is set.
    Edge {
        input: InputEdgeId,
        left_to_right: bool,
    },
    /// Whether the start of this edge is inside the opposite region.
    SetInside(bool),
    /// Clip to the exterior of the opposite region instead of its interior.
    InvertOpposite(bool),
    /// Emit the surviving pieces reversed.
    ReverseThis(bool),
}

/// Clipping instructions keyed by the input edge they apply to, in
/// increasing key order. Entries with equal keys keep their emission order.
pub(crate) type InputEdgeCrossings = Vec<(InputEdgeId, Crossing)>;

/// A graph edge of a crossing chain B incident to vertex `a_index` of the
/// chain A; `dst` is its endpoint away from A.
#[derive(Debug, Clone, Copy)]
struct CrossingGraphEdge {
    id: EdgeId,
    a_index: usize,
    outgoing: bool,
    dst: VertexId,
}

/// Graph edges sorted by input edge id, with each input edge's edges in
/// chain order (AB, BC, CD).
///
/// Requires a directed graph that keeps duplicate edges and sibling pairs,
/// so that every graph edge comes from exactly one input edge. The returned
/// order stays charged to `budget`.
pub(crate) fn input_edge_chain_order(
    g: &Graph<'_>,
    input_ids: &[InputEdgeId],
    budget: &mut MemoryBudget,
) -> Result<Vec<EdgeId>, BuildError> {
    debug_assert_eq!(g.options().edge_type, EdgeType::Directed);
    debug_assert_eq!(g.options().duplicate_edges, DuplicateEdges::Keep);
    debug_assert_eq!(g.options().sibling_pairs, SiblingPairs::Keep);

    budget.add::<EdgeId>(input_ids.len())?;
    let mut order = g.input_edge_order(input_ids);
    let mut vmap: Vec<(VertexId, EdgeId)> = Vec::new();
    let mut chain: Vec<EdgeId> = Vec::new();
    let mut indegree = Vec::new();
    budget.reserve(&mut indegree, g.num_vertices())?;
    indegree.resize(g.num_vertices(), 0u32);
    let mut begin = 0;
    while begin < order.len() {
        let input_id = input_ids[order[begin].index()];
        let mut end = begin;
        while end < order.len() && input_ids[order[end].index()] == input_id {
            end += 1;
        }
        if end - begin > 1 {
            let group = &order[begin..end];
            for &e in group {
                let (src, dst) = g.edge(e);
                budget.push(&mut vmap, (src, e))?;
                indegree[dst.index()] += 1;
            }
            vmap.sort_unstable();

            let mut next = group[0];
            for &e in group {
                if indegree[g.edge(e).0.index()] == 0 {
                    next = e;
                }
            }
            chain.clear();
            loop {
                budget.push(&mut chain, next)?;
                if chain.len() == group.len() {
                    break;
                }
                let v = g.edge(next).1;
                let k = vmap.partition_point(|&(src, _)| src < v);
                match vmap.get(k) {
                    Some(&(src, e)) if src == v => next = e,
                    _ => break,
                }
            }
            for &e in group {
                indegree[g.edge(e).1.index()] = 0;
            }
            // Groups that do not form a chain keep their input order.
            if chain.len() == end - begin {
                order[begin..end].copy_from_slice(&chain);
            }
            vmap.clear();
        }
        begin = end;
    }
    budget.release(&mut vmap);
    budget.release(&mut chain);
    budget.release(&mut indegree);
    Ok(order)
}

/// Removes the clipped-away pieces of each snapped input edge chain.
pub(crate) struct GraphEdgeClipper<'a, 'g> {
    g: &'a Graph<'g>,
    in_map: VertexInMap,
    out_map: VertexOutMap<'g>,
    input_dimensions: &'a [i8],
    input_crossings: &'a [(InputEdgeId, Crossing)],
    new_edges: &'a mut Vec<Edge>,
    new_input_edge_ids: &'a mut Vec<IdSetId>,
    budget: &'a mut MemoryBudget,

    /// Input edge of each graph edge.
    input_ids: Vec<InputEdgeId>,
    /// Graph edges in input edge chain order.
    order: Vec<EdgeId>,
    /// Position of each graph edge in `order`.
    rank: Vec<usize>,
    /// Bytes charged for the two vertex maps.
    map_bytes: usize,
}

impl<'a, 'g> GraphEdgeClipper<'a, 'g> {
    pub(crate) fn new(
        g: &'a Graph<'g>,
        input_dimensions: &'a [i8],
        input_crossings: &'a [(InputEdgeId, Crossing)],
        new_edges: &'a mut Vec<Edge>,
        new_input_edge_ids: &'a mut Vec<IdSetId>,
        budget: &'a mut MemoryBudget,
    ) -> Result<Self, BuildError> {
        let map_bytes = g.num_edges() * std::mem::size_of::<EdgeId>()
            + 2 * (g.num_vertices() + 1) * std::mem::size_of::<u32>();
        budget.tally(map_bytes as isize)?;
        budget.add::<InputEdgeId>(g.num_edges())?;
        let input_ids = g.min_input_edge_ids();
        let order = input_edge_chain_order(g, &input_ids, budget)?;
        let mut rank = Vec::new();
        budget.reserve(&mut rank, order.len())?;
        rank.resize(order.len(), 0);
        for (i, &e) in order.iter().enumerate() {
            rank[e.index()] = i;
        }
        Ok(Self {
            g,
            in_map: VertexInMap::new(g),
            out_map: VertexOutMap::new(g),
            input_dimensions,
            input_crossings,
            new_edges,
            new_input_edge_ids,
            budget,
            input_ids,
            order,
            rank,
            map_bytes,
        })
    }

    fn add_edge(&mut self, edge: Edge, input_id: InputEdgeId) -> Result<(), BuildError> {
        self.budget.push(self.new_edges, edge)?;
        self.budget
            .push(self.new_input_edge_ids, IdSetId::singleton(input_id.0))
    }

    pub(crate) fn run(mut self) -> Result<(), BuildError> {
        let mut a_vertices: Vec<VertexId> = Vec::new();
        let mut a_num_crossings: Vec<i32> = Vec::new();
        let mut a_isolated: Vec<bool> = Vec::new();
        let mut b_input_edges: Vec<(InputEdgeId, bool)> = Vec::new();
        let mut b_edges: Vec<Vec<CrossingGraphEdge>> = Vec::new();

        let mut inside = false;
        let mut invert_b = false;
        let mut reverse_a = false;
        let mut next = 0;
        let mut i = 0;
        while i < self.order.len() {
            let a_input_id = self.input_ids[self.order[i].index()];
            let edge0 = self.g.edge(self.order[i]);
            b_input_edges.clear();
            while let Some(&(id, crossing)) = self.input_crossings.get(next) {
                if id != a_input_id {
                    break;
                }
                match crossing {
                    Crossing::Edge {
                        input,
                        left_to_right,
                    } => b_input_edges.push((input, left_to_right)),
                    Crossing::SetInside(v) => inside = v,
                    Crossing::InvertOpposite(v) => invert_b = v,
                    Crossing::ReverseThis(v) => reverse_a = v,
                }
                next += 1;
            }
            b_input_edges.sort_unstable_by_key(|&(id, _)| id);

            if edge0.0 == edge0.1 {
                inside ^= b_input_edges.len() % 2 == 1;
                self.add_edge(edge0, a_input_id)?;
                i += 1;
                continue;
            }
            if b_input_edges.is_empty() {
                // Polygon edges that only bound polyline output are emitted
                // with `inside` false.
                if inside {
                    let e = if reverse_a { (edge0.1, edge0.0) } else { edge0 };
                    self.add_edge(e, a_input_id)?;
                }
                i += 1;
                continue;
            }

            // Walk the snapped chain of A, gathering the B edges incident to
            // each of its vertices.
            a_vertices.clear();
            a_vertices.push(edge0.0);
            b_edges.clear();
            b_edges.resize_with(b_input_edges.len(), Vec::new);
            self.gather_incident_edges(&a_vertices, 0, &b_input_edges, &mut b_edges);
            while i < self.order.len() && self.input_ids[self.order[i].index()] == a_input_id {
                a_vertices.push(self.g.edge(self.order[i]).1);
                self.gather_incident_edges(
                    &a_vertices,
                    a_vertices.len() - 1,
                    &b_input_edges,
                    &mut b_edges,
                );
                i += 1;
            }

            // Crossing locations are ambiguous after snapping, so two
            // crossings in a row may have the same sign. The multiplicity
            // below links them up with extra sibling pairs.
            a_num_crossings.clear();
            a_num_crossings.resize(a_vertices.len(), 0);
            a_isolated.clear();
            a_isolated.resize(a_vertices.len(), false);
            for (bi, &(b_id, left_to_right)) in b_input_edges.iter().enumerate() {
                match self.crossed_vertex_index(&a_vertices, &b_edges[bi], left_to_right) {
                    Some(a_index) => {
                        let is_line = self.input_dimensions[b_id.index()] == 1;
                        let sign = if is_line {
                            0
                        } else if left_to_right == invert_b {
                            -1
                        } else {
                            1
                        };
                        a_num_crossings[a_index] += sign;
                        // A crossed vertex with no adjacent emitted edge may be
                        // emitted as an isolated vertex.
                        a_isolated[a_index] = true;
                    }
                    None => invariant(false, || {
                        format!("no crossed vertex for input edge {} crossing {}", b_id.0, a_input_id.0)
                    })?,
                }
            }

            let mut multiplicity = i32::from(inside) + a_num_crossings[0];
            for ai in 1..a_vertices.len() {
                if multiplicity != 0 {
                    a_isolated[ai - 1] = false;
                    a_isolated[ai] = false;
                }
                let edge_count = if reverse_a { -multiplicity } else { multiplicity };
                for _ in 0..edge_count {
                    self.add_edge((a_vertices[ai - 1], a_vertices[ai]), a_input_id)?;
                }
                for _ in edge_count..0 {
                    self.add_edge((a_vertices[ai], a_vertices[ai - 1]), a_input_id)?;
                }
                multiplicity += a_num_crossings[ai];
            }
            invariant(multiplicity == 0 || multiplicity == 1, || {
                format!("multiplicity {multiplicity} after input edge {}", a_input_id.0)
            })?;
            inside = multiplicity != 0;

            if self.input_dimensions[a_input_id.index()] != 0 {
                for (ai, &isolated) in a_isolated.iter().enumerate() {
                    if isolated {
                        let v = a_vertices[ai];
                        self.add_edge((v, v), a_input_id)?;
                    }
                }
            }
        }
        self.budget.release(&mut self.input_ids);
        self.budget.release(&mut self.order);
        self.budget.release(&mut self.rank);
        self.budget.tally(-(self.map_bytes as isize))
    }

    /// Append the graph edges incident to `a[ai]` that belong to one of the
    /// crossing input edges (sorted by id) to that edge's vector.
    fn gather_incident_edges(
        &self,
        a: &[VertexId],
        ai: usize,
        b_input_edges: &[(InputEdgeId, bool)],
        b_edges: &mut [Vec<CrossingGraphEdge>],
    ) {
        let find = |e: EdgeId| {
            let id = self.input_ids[e.index()];
            b_input_edges
                .binary_search_by_key(&id, |&(b, _)| b)
                .ok()
        };
        for &e in self.in_map.edge_ids(a[ai]) {
            if let Some(k) = find(e) {
                b_edges[k].push(CrossingGraphEdge {
                    id: e,
                    a_index: ai,
                    outgoing: false,
                    dst: self.g.edge(e).0,
                });
            }
        }
        for e in self.out_map.edge_ids(a[ai]) {
            if let Some(k) = find(e) {
                b_edges[k].push(CrossingGraphEdge {
                    id: e,
                    a_index: ai,
                    outgoing: true,
                    dst: self.g.edge(e).1,
                });
            }
        }
    }

    /// Rank of the shared vertex of `e` within its chain: the source of
    /// edge `order[r]` has rank `r` and its destination `r + 1`.
    #[inline]
    fn vertex_rank(&self, e: &CrossingGraphEdge) -> usize {
        self.rank[e.id.index()] + usize::from(!e.outgoing)
    }

    /// The vertex of chain `a` where chain `b` crosses it. `b` holds the B
    /// edges incident to `a`, sorted by `(a_index, outgoing)`.
    ///
    /// After snapping, B may touch A and make excursions to either side
    /// several times. Each B edge at an interior vertex of A bounds the
    /// range of vertex ranks where the crossing can be; among the candidates
    /// the smallest vertex id is chosen so that the A and B passes agree.
    fn crossed_vertex_index(
        &self,
        a: &[VertexId],
        b: &[CrossingGraphEdge],
        left_to_right: bool,
    ) -> Option<usize> {
        let (first, last) = (b.first()?, b.last()?);
        let n = a.len();
        if n == 1 {
            return Some(0);
        }
        if first.a_index == last.a_index {
            return Some(first.a_index);
        }

        let b_reversed = self.vertex_rank(first) > self.vertex_rank(last);

        // Acceptable vertex ranks are `lo..=hi` (signed: `lo` starts at -1).
        let mut lo: i64 = -1;
        let mut hi: i64 = self.order.len() as i64;
        // The B subchain connecting the endpoints of A, if any.
        let mut b_first: Option<EdgeId> = None;
        let mut b_last: Option<EdgeId> = None;
        for e in b {
            let ai = e.a_index;
            if ai == 0 {
                if e.outgoing != b_reversed && e.dst != a[1] {
                    b_first = Some(e.id);
                }
            } else if ai == n - 1 {
                if e.outgoing == b_reversed && e.dst != a[n - 2] {
                    b_last = Some(e.id);
                }
            } else {
                // Edges that coincide with A place no restriction.
                if e.dst == a[ai - 1] || e.dst == a[ai + 1] {
                    continue;
                }
                let on_left = ordered_ccw(
                    self.g.vertex(a[ai + 1]),
                    self.g.vertex(e.dst),
                    self.g.vertex(a[ai - 1]),
                    self.g.vertex(a[ai]),
                );
                let r = self.rank[e.id.index()] as i64;
                if left_to_right == on_left {
                    // Pre-crossing edge: the crossing is at or after its
                    // destination.
                    lo = lo.max(r + 1);
                } else {
                    hi = hi.min(r);
                }
            }
        }

        // A B subchain joining both endpoints of A without touching its
        // interior forms a loop with A whose orientation tells the side.
        if let (Some(mut bf), Some(mut bl)) = (b_first, b_last) {
            if b_reversed {
                std::mem::swap(&mut bf, &mut bl);
            }
            let (rf, rl) = (self.rank[bf.index()], self.rank[bl.index()]);
            let has_interior_vertex = b.iter().any(|e| {
                let r = self.rank[e.id.index()];
                e.a_index > 0 && e.a_index < n - 1 && r >= rf && r <= rl
            });
            if !has_interior_vertex {
                let on_left = self.edge_chain_on_left(a, bf, bl);
                if left_to_right == on_left {
                    lo = lo.max(rl as i64 + 1);
                } else {
                    hi = hi.min(rf as i64);
                }
            }
        }

        let mut best: Option<usize> = None;
        for e in b {
            let vrank = self.vertex_rank(e) as i64;
            if vrank >= lo && vrank <= hi && best.map_or(true, |k| a[e.a_index] < a[k]) {
                best = Some(e.a_index);
            }
        }
        best
    }

    /// Whether the B subchain from `b_first` to `b_last` lies to the left of
    /// chain `a`, by the orientation of the loop they form.
    fn edge_chain_on_left(&self, a: &[VertexId], b_first: EdgeId, b_last: EdgeId) -> bool {
        let mut lp: Vec<VertexId> = (self.rank[b_first.index()]..self.rank[b_last.index()])
            .map(|i| self.g.edge(self.order[i]).1)
            .collect();
        if self.g.edge(b_last).1 != a[0] {
            lp.reverse();
        }
        lp.extend_from_slice(a);
        lp.push(lp[0]);
        lp.push(lp[1]);
        let sum: f64 = lp
            .windows(3)
            .map(|w| turn_angle(self.g.vertex(w[0]), self.g.vertex(w[1]), self.g.vertex(w[2])))
            .sum();
        sum > 0.0
    }
}

/// The single layer the boolean operation registers with the builder: runs
/// the clipper on the snapped graph and hands the result to the caller's
/// layers, either one layer for everything or one per dimension.
pub(crate) struct EdgeClippingLayer<'a> {
    layers: Vec<Box<dyn Layer + 'a>>,
    input_dimensions: Vec<i8>,
    input_crossings: InputEdgeCrossings,
    budget: MemoryBudget,
}

impl<'a> EdgeClippingLayer<'a> {
    pub(crate) fn new(
        layers: Vec<Box<dyn Layer + 'a>>,
        input_dimensions: Vec<i8>,
        input_crossings: InputEdgeCrossings,
        budget: MemoryBudget,
    ) -> Self {
        debug_assert!(layers.len() == 1 || layers.len() == 3);
        Self {
            layers,
            input_dimensions,
            input_crossings,
            budget,
        }
    }
}

impl Layer for EdgeClippingLayer<'_> {
    fn graph_options(&self) -> GraphOptions {
        // Every edge is kept so that input crossings can be matched to graph
        // crossings.
        GraphOptions::new(
            EdgeType::Directed,
            DegenerateEdges::Keep,
            DuplicateEdges::Keep,
            SiblingPairs::Keep,
        )
    }

    fn build(&mut self, g: &Graph<'_>) -> Result<(), BuildError> {
        let mut new_edges: Vec<Edge> = Vec::new();
        let mut new_input_edge_ids: Vec<IdSetId> = Vec::new();
        GraphEdgeClipper::new(
            g,
            &self.input_dimensions,
            &self.input_crossings,
            &mut new_edges,
            &mut new_input_edge_ids,
            &mut self.budget,
        )?
        .run()?;
        debug!(
            graph_edges = g.num_edges(),
            clipped_edges = new_edges.len(),
            "clipped edge chains"
        );

        let mut lexicon = g.input_edge_id_set_lexicon().clone();
        let predicate = g.is_full_polygon_predicate();
        if let [layer] = self.layers.as_mut_slice() {
            let (graph, result) = g.make_subgraph(
                layer.graph_options(),
                &mut new_edges,
                &mut new_input_edge_ids,
                &mut lexicon,
                predicate,
                &mut self.budget,
            );
            result?;
            return layer.build(&graph);
        }

        let mut layer_edges: [Vec<Edge>; 3] = Default::default();
        let mut layer_input_edge_ids: [Vec<IdSetId>; 3] = Default::default();
        for (&edge, &id) in new_edges.iter().zip(&new_input_edge_ids) {
            let input = g.input_edge_id_set_lexicon().id_set(id).first().unwrap_or(0);
            let d = self.input_dimensions[input as usize] as usize;
            self.budget.push(&mut layer_edges[d], edge)?;
            self.budget.push(&mut layer_input_edge_ids[d], id)?;
        }
        self.budget.release(&mut new_edges);
        self.budget.release(&mut new_input_edge_ids);

        let mut first_error = None;
        for ((layer, edges), ids) in self
            .layers
            .iter_mut()
            .zip(layer_edges.iter_mut())
            .zip(layer_input_edge_ids.iter_mut())
        {
            let (graph, result) = g.make_subgraph(
                layer.graph_options(),
                edges,
                ids,
                &mut lexicon,
                predicate,
                &mut self.budget,
            );
            if let Err(e) = result.and_then(|()| layer.build(&graph)) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::graph::never_full;
    use crate::builder::IdSetLexicon;
    use crate::types::{LatLng, Point};

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    struct Fixture {
        vertices: Vec<Point>,
        edges: Vec<Edge>,
        ids: Vec<IdSetId>,
        lexicon: IdSetLexicon,
    }

    impl Fixture {
        /// `edges` are `(src, dst, input_edge)`.
        fn new(vertices: Vec<Point>, edges: &[(u32, u32, u32)]) -> Self {
            let mut sorted: Vec<(Edge, IdSetId)> = edges
                .iter()
                .map(|&(a, b, id)| ((VertexId(a), VertexId(b)), IdSetId::singleton(id)))
                .collect();
            sorted.sort();
            Self {
                vertices,
                edges: sorted.iter().map(|&(e, _)| e).collect(),
                ids: sorted.iter().map(|&(_, id)| id).collect(),
                lexicon: IdSetLexicon::new(),
            }
        }

        fn graph(&self) -> Graph<'_> {
            Graph::new(
                GraphOptions::new(
                    EdgeType::Directed,
                    DegenerateEdges::Keep,
                    DuplicateEdges::Keep,
                    SiblingPairs::Keep,
                ),
                &self.vertices,
                &self.edges,
                &self.ids,
                &self.lexicon,
                &[],
                &self.lexicon,
                &never_full,
            )
        }

        fn clip(&self, dimensions: &[i8], crossings: &[(InputEdgeId, Crossing)]) -> Vec<(Edge, u32)> {
            let g = self.graph();
            let mut edges = Vec::new();
            let mut ids = Vec::new();
            let mut budget = MemoryBudget::unlimited();
            GraphEdgeClipper::new(&g, dimensions, crossings, &mut edges, &mut ids, &mut budget)
                .unwrap()
                .run()
                .unwrap();
            edges
                .into_iter()
                .zip(ids)
                .map(|(e, id)| (e, self.lexicon.id_set(id).first().unwrap()))
                .collect()
        }
    }

    fn e(a: u32, b: u32) -> Edge {
        (VertexId(a), VertexId(b))
    }

    #[test]
    fn test_chain_order_follows_edges() {
        // Input edge 0 snapped to the chain 2 -> 0 -> 3 -> 1.
        let f = Fixture::new(
            vec![ll(0.0, 1.0), ll(0.0, 3.0), ll(0.0, 0.0), ll(0.0, 2.0)],
            &[(0, 3, 0), (2, 0, 0), (3, 1, 0), (1, 2, 1)],
        );
        let g = f.graph();
        let ids = g.min_input_edge_ids();
        let order: Vec<Edge> = input_edge_chain_order(&g, &ids, &mut MemoryBudget::unlimited())
            .unwrap()
            .into_iter()
            .map(|id| g.edge(id))
            .collect();
        assert_eq!(order, vec![e(2, 0), e(0, 3), e(3, 1), e(1, 2)]);
    }

    #[test]
    fn test_clipper_scratch_is_charged() {
        let f = Fixture::new(vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(0.0, 2.0)], &[(0, 1, 0), (1, 2, 1)]);
        let g = f.graph();
        let dims = [2, 2];
        let inside = [(InputEdgeId(0), Crossing::SetInside(true))];
        let (mut edges, mut ids) = (Vec::new(), Vec::new());
        let mut budget = MemoryBudget::with_limit(Some(16));
        assert!(matches!(
            GraphEdgeClipper::new(&g, &dims, &inside, &mut edges, &mut ids, &mut budget),
            Err(BuildError::ResourceExhausted { limit: 16, .. })
        ));

        let mut budget = MemoryBudget::unlimited();
        GraphEdgeClipper::new(&g, &dims, &inside, &mut edges, &mut ids, &mut budget)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(edges, vec![e(0, 1), e(1, 2)]);
        // Only the output stays charged.
        let output_bytes = edges.capacity() * std::mem::size_of::<Edge>()
            + ids.capacity() * std::mem::size_of::<IdSetId>();
        assert_eq!(budget.usage(), output_bytes);
        assert!(budget.max_usage() > output_bytes);
    }

    #[test]
    fn test_inside_state_controls_emission() {
        let f = Fixture::new(vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(0.0, 2.0)], &[(0, 1, 0), (1, 2, 1)]);
        let dims = [2, 2];
        assert!(f.clip(&dims, &[]).is_empty());
        let inside = [(InputEdgeId(0), Crossing::SetInside(true))];
        assert_eq!(f.clip(&dims, &inside), vec![(e(0, 1), 0), (e(1, 2), 1)]);
        let reversed = [
            (InputEdgeId(0), Crossing::ReverseThis(true)),
            (InputEdgeId(0), Crossing::SetInside(true)),
        ];
        assert_eq!(f.clip(&dims, &reversed), vec![(e(1, 0), 0), (e(2, 1), 1)]);
    }

    #[test]
    fn test_crossing_toggles_inside_at_shared_vertex() {
        // A: 0 -> 1 -> 2 along the equator; B: 3 -> 1 -> 4 crosses it at 1
        // from left (north) to right (south).
        let f = Fixture::new(
            vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(0.0, 2.0), ll(1.0, 1.0), ll(-1.0, 1.0)],
            &[(0, 1, 0), (1, 2, 0), (3, 1, 1), (1, 4, 1)],
        );
        let dims = [2, 2];
        let crossed = |left_to_right| {
            Crossing::Edge {
                input: InputEdgeId(1),
                left_to_right,
            }
        };
        // B's interior is on its left (east), so crossing A from left to
        // right means A enters B.
        let crossings = [
            (InputEdgeId(0), crossed(true)),
            (InputEdgeId(1), Crossing::SetInside(false)),
        ];
        assert_eq!(f.clip(&dims, &crossings), vec![(e(1, 2), 0)]);

        let crossings = [
            (InputEdgeId(0), Crossing::SetInside(true)),
            (InputEdgeId(0), crossed(false)),
            (InputEdgeId(1), Crossing::SetInside(false)),
        ];
        assert_eq!(f.clip(&dims, &crossings), vec![(e(0, 1), 0)]);

        // Clipping to the exterior flips the sign of the crossing.
        let crossings = [
            (InputEdgeId(0), Crossing::InvertOpposite(true)),
            (InputEdgeId(0), crossed(false)),
            (InputEdgeId(1), Crossing::SetInside(false)),
        ];
        assert_eq!(f.clip(&dims, &crossings), vec![(e(1, 2), 0)]);
    }

    #[test]
    fn test_polyline_crossing_leaves_isolated_vertex() {
        // A polyline crossed by a polyline keeps its inside state, but the
        // crossing vertex is emitted when nothing adjacent is.
        let f = Fixture::new(
            vec![ll(0.0, 0.0), ll(0.0, 1.0), ll(0.0, 2.0), ll(1.0, 1.0), ll(-1.0, 1.0)],
            &[(0, 1, 0), (1, 2, 0), (3, 1, 1), (1, 4, 1)],
        );
        let crossings = [(
            InputEdgeId(0),
            Crossing::Edge {
                input: InputEdgeId(1),
                left_to_right: true,
            },
        )];
        assert_eq!(f.clip(&[1, 1], &crossings), vec![(e(1, 1), 0)]);
    }
}
