//! Replaces chains of snapped edges by single edges where this can be done
//! without moving any input vertex farther than the snap radius and without
//! passing too close to any other site.
//!
//! All layers are simplified together so that a vertex is only removed when
//! it is interior in every layer that uses it (shared boundaries stay
//! shared).

use super::graph::{
    never_full, Graph, GraphOptions, IsFullPolygonPredicate, VertexInMap, VertexOutMap,
};
use super::ids::{Edge, EdgeId, InputVertexId, SiteId, VertexId};
use super::lexicon::{IdSetId, IdSetLexicon};
use super::polyline_simplifier::PolylineSimplifier;
use crate::budget::MemoryBudget;
use crate::error::BuildError;
use crate::geometry::{ordered_ccw, sign, ChordAngle};
use crate::types::Point;

/// Builder state the simplifier reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimplifyContext<'a> {
    pub num_forced_sites: usize,
    pub input_vertices: &'a [Point],
    /// Sites near each input edge, sorted by distance from its first vertex.
    pub edge_sites: &'a [Vec<SiteId>],
    /// First input edge id of each layer, followed by the total edge count.
    pub layer_begins: &'a [usize],
    pub edge_snap_radius_ca: ChordAngle,
    pub min_edge_site_separation_ca: ChordAngle,
    pub min_edge_length_to_split_ca: ChordAngle,
}

impl SimplifyContext<'_> {
    fn input_edge_layer(&self, id: u32) -> usize {
        let pos = self.layer_begins.partition_point(|&b| b <= id as usize);
        pos.saturating_sub(1)
    }
}

/// Simplify the edges of every layer in place. `site_vertices[s]` lists the
/// input vertices that snapped to site `s`.
pub(crate) fn simplify_edge_chains(
    ctx: &SimplifyContext<'_>,
    sites: &[Point],
    site_vertices: &[Vec<InputVertexId>],
    layer_edges: &mut [Vec<Edge>],
    layer_input_edge_ids: &mut [Vec<IdSetId>],
    lexicon: &mut IdSetLexicon,
    budget: &mut MemoryBudget,
) -> Result<(), BuildError> {
    if layer_edges.is_empty() {
        return Ok(());
    }
    let (mut merged_edges, mut merged_ids, mut edge_layers) =
        merge_layer_edges(layer_edges, layer_input_edge_ids, budget)?;
    for edges in layer_edges.iter_mut() {
        edges.clear();
    }
    for ids in layer_input_edge_ids.iter_mut() {
        ids.clear();
    }

    // Every graph edge is output at most once.
    let n = merged_edges.len();
    let mut reserved = Output::default();
    budget.reserve(&mut reserved.edges, n)?;
    budget.reserve(&mut reserved.input_ids, n)?;
    budget.reserve(&mut reserved.layers, n)?;
    let flag_bytes = (n + sites.len()) * std::mem::size_of::<bool>();
    budget.tally(flag_bytes as isize)?;

    let mut output = {
        let labels = IdSetLexicon::new();
        let predicate: &IsFullPolygonPredicate<'_> = &never_full;
        let g = Graph::new(
            GraphOptions::default(),
            sites,
            &merged_edges,
            &merged_ids,
            lexicon,
            &[],
            &labels,
            predicate,
        );
        let mut simplifier = EdgeChainSimplifier::new(ctx, g, &edge_layers, site_vertices, reserved);
        simplifier.run();
        simplifier.output
    };
    budget.tally(-(flag_bytes as isize))?;

    // Output order within a layer does not matter; the edges are sorted
    // again when the layer's graph options are applied.
    for ((edge, ids), layer) in output
        .edges
        .drain(..)
        .zip(output.input_ids.drain(..))
        .zip(output.layers.drain(..))
    {
        let id = match ids {
            NewIds::Existing(id) => id,
            NewIds::Merged(ids) => lexicon.add(ids),
        };
        budget.push(&mut layer_edges[layer], edge)?;
        budget.push(&mut layer_input_edge_ids[layer], id)?;
    }
    budget.release(&mut output.edges);
    budget.release(&mut output.input_ids);
    budget.release(&mut output.layers);
    budget.release(&mut merged_edges);
    budget.release(&mut merged_ids);
    budget.release(&mut edge_layers);
    Ok(())
}

/// Concatenate the layers' edges into one sorted list, remembering the layer
/// of each edge. Ties keep layer order, then input order.
fn merge_layer_edges(
    layer_edges: &[Vec<Edge>],
    layer_input_edge_ids: &[Vec<IdSetId>],
    budget: &mut MemoryBudget,
) -> Result<(Vec<Edge>, Vec<IdSetId>, Vec<usize>), BuildError> {
    let n: usize = layer_edges.iter().map(Vec::len).sum();
    let mut order: Vec<(usize, usize)> = Vec::new();
    budget.reserve(&mut order, n)?;
    order.extend(
        layer_edges
            .iter()
            .enumerate()
            .flat_map(|(i, edges)| (0..edges.len()).map(move |e| (i, e))),
    );
    order.sort_by_key(|&(i, e)| (layer_edges[i][e], i, e));
    let (mut edges, mut ids, mut layers) = (Vec::new(), Vec::new(), Vec::new());
    budget.reserve(&mut edges, n)?;
    budget.reserve(&mut ids, n)?;
    budget.reserve(&mut layers, n)?;
    for &(i, e) in &order {
        edges.push(layer_edges[i][e]);
        ids.push(layer_input_edge_ids[i][e]);
        layers.push(i);
    }
    budget.release(&mut order);
    Ok((edges, ids, layers))
}

/// Input edge ids of an output edge: either copied from an unchanged edge
/// or collected from a merged chain (interned once the graph is dropped).
#[derive(Debug)]
enum NewIds {
    Existing(IdSetId),
    Merged(Vec<u32>),
}

#[derive(Debug, Default)]
struct Output {
    edges: Vec<Edge>,
    input_ids: Vec<NewIds>,
    layers: Vec<usize>,
}

/// Decides whether a vertex can be removed: in every layer its edges must
/// connect the same two neighbors with matching in/out counts, plus any
/// number of degenerate edges at the vertex itself.
#[derive(Debug)]
struct InteriorVertexMatcher {
    v0: VertexId,
    v1: Option<VertexId>,
    v2: Option<VertexId>,
    n0: usize,
    n1: usize,
    n2: usize,
    excess_out: isize,
    too_many_endpoints: bool,
}

impl InteriorVertexMatcher {
    fn new(v0: VertexId) -> Self {
        Self {
            v0,
            v1: None,
            v2: None,
            n0: 0,
            n1: 0,
            n2: 0,
            excess_out: 0,
            too_many_endpoints: false,
        }
    }

    /// The neighbors found so far stay fixed across layers.
    fn start_layer(&mut self) {
        self.excess_out = 0;
        self.n0 = 0;
        self.n1 = 0;
        self.n2 = 0;
    }

    fn tally(&mut self, v: VertexId, outgoing: bool) {
        self.excess_out += if outgoing { 1 } else { -1 };
        if v == self.v0 {
            self.n0 += 1;
            return;
        }
        if *self.v1.get_or_insert(v) == v {
            self.n1 += 1;
        } else if *self.v2.get_or_insert(v) == v {
            self.n2 += 1;
        } else {
            self.too_many_endpoints = true;
        }
    }

    fn matches(&self) -> bool {
        // Degenerate edges are only absorbed when some other edge remains.
        !self.too_many_endpoints
            && self.excess_out == 0
            && self.n1 == self.n2
            && (self.n0 == 0 || self.n1 > 0)
    }
}

struct EdgeChainSimplifier<'a> {
    ctx: &'a SimplifyContext<'a>,
    g: Graph<'a>,
    edge_layers: &'a [usize],
    site_vertices: &'a [Vec<InputVertexId>],
    out: VertexOutMap<'a>,
    in_: VertexInMap,
    is_interior: Vec<bool>,
    used: Vec<bool>,
    output: Output,
}

impl<'a> EdgeChainSimplifier<'a> {
    fn new(
        ctx: &'a SimplifyContext<'a>,
        g: Graph<'a>,
        edge_layers: &'a [usize],
        site_vertices: &'a [Vec<InputVertexId>],
        output: Output,
    ) -> Self {
        Self {
            ctx,
            g,
            edge_layers,
            site_vertices,
            out: VertexOutMap::new(&g),
            in_: VertexInMap::new(&g),
            is_interior: Vec::new(),
            used: vec![false; g.num_edges()],
            output,
        }
    }

    fn run(&mut self) {
        self.is_interior = (0..self.g.num_vertices())
            .map(|v| self.vertex_is_interior(VertexId::new(v)))
            .collect();

        // Chains that start at a vertex that must be kept.
        for e in self.g.edge_ids() {
            if self.used[e.index()] {
                continue;
            }
            let (src, dst) = self.g.edge(e);
            if self.is_interior[src.index()] {
                continue;
            }
            if !self.is_interior[dst.index()] {
                self.output_edge(e);
            } else {
                self.simplify_chain(src, dst);
            }
        }

        // What remains are loops consisting only of interior vertices.
        for e in self.g.edge_ids() {
            if self.used[e.index()] {
                continue;
            }
            let (src, dst) = self.g.edge(e);
            if src == dst {
                self.output_edge(e);
            } else {
                self.simplify_chain(src, dst);
            }
        }
    }

    fn output_edge(&mut self, e: EdgeId) {
        self.output.edges.push(self.g.edge(e));
        self.output
            .input_ids
            .push(NewIds::Existing(self.g.input_edge_id_set_id(e)));
        self.output.layers.push(self.edge_layers[e.index()]);
        self.used[e.index()] = true;
    }

    fn vertex_is_interior(&self, v: VertexId) -> bool {
        let out_degree = self.out.degree(v);
        if out_degree == 0 || out_degree != self.in_.degree(v) {
            return false;
        }
        // Forced vertices are always kept.
        if v.index() < self.ctx.num_forced_sites {
            return false;
        }

        let mut edges: Vec<EdgeId> = self.out.edge_ids(v).collect();
        edges.extend_from_slice(self.in_.edge_ids(v));
        edges.sort_by_key(|e| self.edge_layers[e.index()]);

        let mut matcher = InteriorVertexMatcher::new(v);
        let layer = |e: &EdgeId| self.edge_layers[e.index()];
        for group in edges.chunk_by(|a, b| layer(a) == layer(b)) {
            matcher.start_layer();
            for &e in group {
                let (src, dst) = self.g.edge(e);
                if src == v {
                    matcher.tally(dst, true);
                }
                if dst == v {
                    matcher.tally(src, false);
                }
            }
            if !matcher.matches() {
                return false;
            }
        }
        true
    }

    /// Follow the chain starting with the edge `(v0, v1)`, replacing each
    /// maximal simplifiable run by one edge.
    fn simplify_chain(&mut self, mut v0: VertexId, mut v1: VertexId) {
        let vstart = v0;
        let mut chain: Vec<VertexId> = Vec::new();
        loop {
            let mut simplifier = PolylineSimplifier::new(self.g.vertex(v0));
            self.avoid_sites(v0, v0, v1, &mut simplifier);
            chain.push(v0);
            let done = loop {
                chain.push(v1);
                if !self.is_interior[v1.index()] || v1 == vstart {
                    break true;
                }
                let vprev = v0;
                v0 = v1;
                v1 = match self.follow_chain(vprev, v0) {
                    Some(next) => next,
                    None => {
                        debug_assert!(false, "interior vertex without a next edge");
                        break true;
                    }
                };
                let extended = self.target_input_vertices(v0, &mut simplifier)
                    && self.avoid_sites(chain[0], v0, v1, &mut simplifier)
                    && simplifier.extend(self.g.vertex(v1));
                if !extended {
                    break false;
                }
            };
            if chain.len() == 2 {
                self.output_all_edges(chain[0], chain[1]);
            } else {
                self.merge_chain(&chain);
            }
            // Degenerate edges not absorbed by a chain are output by `run`.
            chain.clear();
            if done {
                break;
            }
        }
    }

    fn follow_chain(&self, v0: VertexId, v1: VertexId) -> Option<VertexId> {
        self.out
            .edges(v1)
            .iter()
            .map(|e| e.1)
            .find(|&dst| dst != v0 && dst != v1)
    }

    fn output_all_edges(&mut self, v0: VertexId, v1: VertexId) {
        let forward: Vec<EdgeId> = self.out.edge_ids_between(v0, v1).collect();
        let backward: Vec<EdgeId> = self.out.edge_ids_between(v1, v0).collect();
        for e in forward.into_iter().chain(backward) {
            self.output_edge(e);
        }
    }

    fn target_input_vertices(&self, v: VertexId, simplifier: &mut PolylineSimplifier) -> bool {
        self.site_vertices[v.index()].iter().all(|&i| {
            simplifier.target_disc(
                self.ctx.input_vertices[i.index()],
                self.ctx.edge_snap_radius_ca,
            )
        })
    }

    /// Add constraints that keep the edge `(v0, v2)` away from the sites
    /// near the snapped edge `(v1, v2)`. Fails when the chain would
    /// backtrack or grow too long.
    fn avoid_sites(
        &self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
        simplifier: &mut PolylineSimplifier,
    ) -> bool {
        let p0 = self.g.vertex(v0);
        let p1 = self.g.vertex(v1);
        let p2 = self.g.vertex(v2);
        let r1 = ChordAngle::between(p0, p1);
        let r2 = ChordAngle::between(p0, p2);

        // Distance from the chain start must increase monotonically.
        if r2 < r1 {
            return false;
        }
        // Longer edges could deviate too far from the input edges.
        if r2 >= self.ctx.min_edge_length_to_split_ca {
            return false;
        }

        // The edge sites of any one input edge snapped to (v1, v2) include
        // every site close enough to matter; pick the shortest list.
        let edge_sites = self.ctx.edge_sites;
        let mut best: Option<u32> = None;
        for e in self
            .out
            .edge_ids_between(v1, v2)
            .chain(self.out.edge_ids_between(v2, v1))
        {
            for id in self.g.input_edge_ids(e) {
                let shorter = best.map_or(true, |b| {
                    edge_sites[id as usize].len() < edge_sites[b as usize].len()
                });
                if shorter {
                    best = Some(id);
                }
            }
        }
        let Some(best) = best else {
            return false;
        };

        for &site in &edge_sites[best as usize] {
            let v = VertexId::new(site.index());
            if v == v0 || v == v1 || v == v2 {
                continue;
            }
            let p = self.g.vertex(v);
            let r = ChordAngle::between(p0, p);
            if r <= r1 || r >= r2 {
                continue;
            }
            // Within the radius range (r1, r2) the side of the chain is the
            // side of the wedge (p0, p1, p2).
            let disc_on_left = if v1 == v0 {
                sign(p1, p2, p) > 0
            } else {
                ordered_ccw(p0, p2, p, p1)
            };
            if !simplifier.avoid_disc(p, self.ctx.min_edge_site_separation_ca, disc_on_left) {
                return false;
            }
        }
        true
    }

    /// Replace the chain by one edge per parallel edge of its first hop,
    /// collecting the input edge ids along the way.
    fn merge_chain(&mut self, vertices: &[VertexId]) {
        let mut merged: Vec<Vec<u32>> = Vec::new();
        let mut degenerate_ids: Vec<u32> = Vec::new();
        for w in vertices.windows(2) {
            let (v0, v1) = (w[0], w[1]);
            let out_edges: Vec<EdgeId> = self.out.edge_ids_between(v0, v1).collect();
            let in_edges: Vec<EdgeId> = self.out.edge_ids_between(v1, v0).collect();
            if merged.is_empty() {
                merged.resize(out_edges.len() + in_edges.len(), Vec::new());
            } else {
                debug_assert!(self.is_interior[v0.index()]);
                let degenerate: Vec<EdgeId> = self.out.edge_ids_between(v0, v0).collect();
                for e in degenerate {
                    degenerate_ids.extend(self.g.input_edge_ids(e));
                    self.used[e.index()] = true;
                }
            }
            // Edges were created in layer order and every sort is stable, so
            // both lists are ordered by layer and then input edge id.
            debug_assert_eq!(out_edges.len() + in_edges.len(), merged.len());
            for (j, e) in out_edges.into_iter().chain(in_edges).enumerate() {
                if let Some(ids) = merged.get_mut(j) {
                    ids.extend(self.g.input_edge_ids(e));
                }
                self.used[e.index()] = true;
            }
        }
        if !degenerate_ids.is_empty() {
            degenerate_ids.sort_unstable();
            self.assign_degenerate_edges(&degenerate_ids, &mut merged);
        }

        let (v0, v1) = (vertices[0], vertices[1]);
        let vb = vertices[vertices.len() - 1];
        let forward: Vec<EdgeId> = self.out.edge_ids_between(v0, v1).collect();
        let backward: Vec<EdgeId> = self.out.edge_ids_between(v1, v0).collect();
        for e in forward {
            self.output.edges.push((v0, vb));
            self.output.layers.push(self.edge_layers[e.index()]);
        }
        for e in backward {
            self.output.edges.push((vb, v0));
            self.output.layers.push(self.edge_layers[e.index()]);
        }
        self.output
            .input_ids
            .extend(merged.into_iter().map(NewIds::Merged));
    }

    /// Attach each degenerate input edge to a merged edge of its own layer,
    /// preferring the one whose input ids immediately precede it so that
    /// consecutive input chains stay together.
    fn assign_degenerate_edges(&self, degenerate_ids: &[u32], merged: &mut [Vec<u32>]) {
        for ids in merged.iter_mut() {
            ids.sort_unstable();
        }
        let mut order: Vec<usize> = (0..merged.len())
            .filter(|&i| !merged[i].is_empty())
            .collect();
        order.sort_by_key(|&i| merged[i][0]);
        if order.is_empty() {
            return;
        }

        for &id in degenerate_ids {
            let layer = self.ctx.input_edge_layer(id);
            let mut it = order.partition_point(|&i| merged[i][0] <= id);
            if it > 0 && merged[order[it - 1]][0] as usize >= self.ctx.layer_begins[layer] {
                it -= 1;
            }
            let it = it.min(order.len() - 1);
            merged[order[it]].push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    fn v(i: u32) -> VertexId {
        VertexId(i)
    }

    struct Fixture {
        sites: Vec<Point>,
        site_vertices: Vec<Vec<InputVertexId>>,
        edge_sites: Vec<Vec<SiteId>>,
        layer_begins: Vec<usize>,
        num_forced_sites: usize,
    }

    impl Fixture {
        /// Sites along the equator, one input vertex per site, and one input
        /// edge per consecutive pair.
        fn equator(n: usize) -> Self {
            let sites: Vec<Point> = (0..n).map(|i| ll(0.0, i as f64)).collect();
            Self {
                site_vertices: (0..n).map(|i| vec![InputVertexId::new(i)]).collect(),
                edge_sites: (0..n - 1)
                    .map(|i| vec![SiteId::new(i), SiteId::new(i + 1)])
                    .collect(),
                layer_begins: vec![0, n - 1],
                num_forced_sites: 0,
                sites,
            }
        }

        fn run(&self, layers: Vec<Vec<Edge>>) -> (Vec<Vec<Edge>>, Vec<Vec<Vec<u32>>>) {
            self.run_with_budget(layers, &mut MemoryBudget::unlimited()).unwrap()
        }

        fn run_with_budget(
            &self,
            layers: Vec<Vec<Edge>>,
            budget: &mut MemoryBudget,
        ) -> Result<(Vec<Vec<Edge>>, Vec<Vec<Vec<u32>>>), BuildError> {
            let ctx = SimplifyContext {
                num_forced_sites: self.num_forced_sites,
                input_vertices: &self.sites,
                edge_sites: &self.edge_sites,
                layer_begins: &self.layer_begins,
                edge_snap_radius_ca: ChordAngle::from_degrees(0.1),
                min_edge_site_separation_ca: ChordAngle::from_degrees(0.1),
                min_edge_length_to_split_ca: ChordAngle::from_degrees(10.0),
            };
            let mut lexicon = IdSetLexicon::new();
            let mut next = 0u32;
            let mut layer_ids: Vec<Vec<IdSetId>> = layers
                .iter()
                .map(|edges| {
                    edges
                        .iter()
                        .map(|_| {
                            next += 1;
                            IdSetId::singleton(next - 1)
                        })
                        .collect()
                })
                .collect();
            let mut layer_edges = layers;
            simplify_edge_chains(
                &ctx,
                &self.sites,
                &self.site_vertices,
                &mut layer_edges,
                &mut layer_ids,
                &mut lexicon,
                budget,
            )?;
            let ids = layer_ids
                .iter()
                .map(|ids| ids.iter().map(|&id| lexicon.id_set(id).to_vec()).collect())
                .collect();
            Ok((layer_edges, ids))
        }
    }

    #[test]
    fn test_straight_chain_becomes_one_edge() {
        let f = Fixture::equator(4);
        let (edges, ids) = f.run(vec![vec![(v(0), v(1)), (v(1), v(2)), (v(2), v(3))]]);
        assert_eq!(edges, vec![vec![(v(0), v(3))]]);
        assert_eq!(ids, vec![vec![vec![0, 1, 2]]]);
    }

    #[test]
    fn test_budget_limits_simplification() {
        let f = Fixture::equator(4);
        let chain = vec![vec![(v(0), v(1)), (v(1), v(2)), (v(2), v(3))]];
        let mut budget = MemoryBudget::with_limit(Some(32));
        assert!(matches!(
            f.run_with_budget(chain.clone(), &mut budget),
            Err(BuildError::ResourceExhausted { limit: 32, .. })
        ));

        let mut budget = MemoryBudget::unlimited();
        let (edges, _) = f.run_with_budget(chain, &mut budget).unwrap();
        assert_eq!(edges, vec![vec![(v(0), v(3))]]);
        // The scratch is released and the layer vectors reuse their capacity.
        assert!(budget.max_usage() >= 4 * std::mem::size_of::<(usize, usize)>());
        assert_eq!(budget.usage(), 0);
    }

    #[test]
    fn test_forced_vertex_is_kept() {
        let mut f = Fixture::equator(4);
        f.num_forced_sites = 2;
        let (mut edges, _) = f.run(vec![vec![(v(0), v(1)), (v(1), v(2)), (v(2), v(3))]]);
        edges[0].sort();
        assert_eq!(edges, vec![vec![(v(0), v(1)), (v(1), v(3))]]);
    }

    #[test]
    fn test_branch_vertex_is_kept() {
        let mut f = Fixture::equator(4);
        f.sites.push(ll(1.0, 1.0));
        f.site_vertices.push(vec![InputVertexId::new(4)]);
        f.edge_sites.push(vec![SiteId::new(1), SiteId::new(4)]);
        f.layer_begins = vec![0, 4];
        let (mut edges, _) = f.run(vec![vec![
            (v(0), v(1)),
            (v(1), v(2)),
            (v(2), v(3)),
            (v(1), v(4)),
        ]]);
        edges[0].sort();
        assert_eq!(edges, vec![vec![(v(0), v(1)), (v(1), v(3)), (v(1), v(4))]]);
    }

    #[test]
    fn test_nearby_site_blocks_simplification() {
        let mut f = Fixture::equator(4);
        // A site 0.05 degrees north of the middle edge.
        f.sites.push(ll(0.05, 1.5));
        f.site_vertices.push(Vec::new());
        f.edge_sites[1].push(SiteId::new(4));
        let (edges, _) = f.run(vec![vec![(v(0), v(1)), (v(1), v(2)), (v(2), v(3))]]);
        assert!(edges[0].len() >= 2);
        assert!(!edges[0].contains(&(v(0), v(3))));
    }

    #[test]
    fn test_layers_are_simplified_together() {
        let mut f = Fixture::equator(4);
        f.layer_begins = vec![0, 3, 6];
        f.edge_sites.extend(f.edge_sites.clone());
        let chain = vec![(v(0), v(1)), (v(1), v(2)), (v(2), v(3))];
        let (edges, ids) = f.run(vec![chain.clone(), chain]);
        assert_eq!(edges, vec![vec![(v(0), v(3))], vec![(v(0), v(3))]]);
        assert_eq!(ids, vec![vec![vec![0, 1, 2]], vec![vec![3, 4, 5]]]);
    }

    #[test]
    fn test_vertex_interior_in_one_layer_only_is_kept() {
        let mut f = Fixture::equator(4);
        f.layer_begins = vec![0, 3, 4];
        f.edge_sites.push(vec![SiteId::new(0), SiteId::new(2)]);
        let (mut edges, _) = f.run(vec![
            vec![(v(0), v(1)), (v(1), v(2)), (v(2), v(3))],
            vec![(v(0), v(2))],
        ]);
        edges[0].sort();
        // Vertex 2 is an endpoint in the second layer.
        assert_eq!(edges[0], vec![(v(0), v(2)), (v(2), v(3))]);
        assert_eq!(edges[1], vec![(v(0), v(2))]);
    }

    #[test]
    fn test_interior_vertex_matcher() {
        let mut m = InteriorVertexMatcher::new(v(0));
        m.start_layer();
        m.tally(v(1), true);
        m.tally(v(2), false);
        assert!(m.matches());
        m.start_layer();
        m.tally(v(3), true);
        assert!(!m.matches());

        // Degenerate edges alone do not make a vertex interior.
        let mut m = InteriorVertexMatcher::new(v(0));
        m.start_layer();
        m.tally(v(0), true);
        m.tally(v(0), false);
        assert!(!m.matches());
    }
}
