//! Snap rounding: turns a set of input edges into per-layer graphs whose
//! vertices are well-separated sites.
//!
//! Input edges are grouped into layers with [`Builder::start_layer`]. All
//! layers are snapped together, so edges that are shared or nearby in the
//! input stay consistent in the output, and each layer's [`Layer`] then
//! receives a [`Graph`] built to its own [`GraphOptions`].
//!
//! The output guarantees, given a snap function with radius `r`:
//!
//! - every vertex moves at most `r`, and every edge stays within
//!   `1.1 * r` of its input edge;
//! - output vertices are at least `min_vertex_separation` apart, and at
//!   least `min_edge_vertex_separation` from every non-incident edge;
//! - the topology is preserved: no new crossings are introduced.

mod edge_processor;
pub mod graph;
pub mod ids;
pub mod layers;
pub mod lexicon;
mod polyline_simplifier;
mod simplify;
mod sites;
pub mod snap;

pub use graph::{
    DegenerateEdges, DuplicateEdges, EdgeType, Graph, GraphOptions, IsFullPolygonPredicate,
    LoopType, SiblingPairs, VertexInMap, VertexOutMap,
};
pub use ids::{Edge, EdgeId, InputEdgeId, InputVertexId, Label, SiteId, VertexId};
pub use layers::{
    DegenerateBoundaries, EdgeVectorLayer, LaxPolygonLayer, Layer, PointVectorLayer,
    PolylineVectorLayer,
};
pub use lexicon::{IdSet, IdSetId, IdSetLexicon};
pub use snap::{IdentitySnapFunction, IntLatLngSnapFunction, SnapFunction, MAX_SNAP_RADIUS};

use crate::budget::MemoryBudget;
use crate::error::BuildError;
use crate::region::Shape;
use crate::timing::{Phase, Timer, TimingBuilder};
use crate::types::Point;
use simplify::{simplify_edge_chains, SimplifyContext};
use sites::{InputEdge, SnapParams, Workspace};
use tracing::{debug, instrument};

/// Layers at or above this count get per-layer vertex lists.
const MIN_LAYERS_FOR_VERTEX_FILTERING: usize = 10;

/// Configuration for snap rounding.
#[derive(Debug, Clone)]
pub struct Options {
    /// Where vertices may move and how far apart the results must be.
    /// Defaults to [`IdentitySnapFunction::zero`]: only identical vertices
    /// are merged.
    pub snap_function: Box<dyn SnapFunction>,

    /// If true, every pair of input edges that cross at an interior point is
    /// split at the intersection. Implies an intersection tolerance of at
    /// least the intersection error.
    pub split_crossing_edges: bool,

    /// Maximum distance, in radians, between a point added with
    /// [`Builder::add_intersection`] and the true crossing it stands for.
    /// Edges may move by up to this much in addition to the snap radius.
    pub intersection_tolerance: f64,

    /// If true, chains of edges are replaced by single edges where this can
    /// be done within the snap radius. Vertices shared between layers,
    /// forced vertices and vertices of degree other than two are kept.
    pub simplify_edge_chains: bool,

    /// If true, input that already satisfies the output guarantees is
    /// returned unchanged. If false, every vertex is snapped.
    pub idempotent: bool,

    /// Upper bound on the bytes held by the working buffers of one build.
    pub memory_budget: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            snap_function: Box::new(IdentitySnapFunction::zero()),
            split_crossing_edges: false,
            intersection_tolerance: 0.0,
            simplify_edge_chains: false,
            idempotent: true,
            memory_budget: None,
        }
    }
}

impl Options {
    pub fn new(snap_function: impl SnapFunction + 'static) -> Self {
        Self {
            snap_function: Box::new(snap_function),
            ..Self::default()
        }
    }

    pub fn with_split_crossing_edges(mut self, split: bool) -> Self {
        self.split_crossing_edges = split;
        self
    }

    pub fn with_intersection_tolerance(mut self, radians: f64) -> Self {
        self.intersection_tolerance = radians;
        self
    }

    pub fn with_simplify_edge_chains(mut self, simplify: bool) -> Self {
        self.simplify_edge_chains = simplify;
        self
    }

    pub fn with_idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }

    pub fn with_memory_budget(mut self, bytes: Option<usize>) -> Self {
        self.memory_budget = bytes;
        self
    }
}

/// Collects input edges by layer, then snaps them all at once.
///
/// ```
/// use s2_boolean::builder::{Builder, IntLatLngSnapFunction, Options, PolylineVectorLayer};
/// use s2_boolean::LatLng;
///
/// let mut polylines = Vec::new();
/// let mut builder = Builder::new(Options::new(IntLatLngSnapFunction::new(0)?))?;
/// builder.start_layer(Box::new(PolylineVectorLayer::new(&mut polylines)));
/// builder.add_polyline(&[
///     LatLng::from_degrees(0.1, 0.2).to_point(),
///     LatLng::from_degrees(0.2, 4.9).to_point(),
/// ]);
/// builder.build()?;
/// assert_eq!(polylines[0][1], LatLng::from_degrees(0.0, 5.0).to_point());
/// # Ok::<(), s2_boolean::BuildError>(())
/// ```
pub struct Builder<'a> {
    options: Options,
    params: SnapParams,
    input_vertices: Vec<Point>,
    input_edges: Vec<InputEdge>,
    forced_sites: Vec<Point>,
    snapping_needed: bool,

    layers: Vec<Box<dyn Layer + 'a>>,
    layer_options: Vec<GraphOptions>,
    /// First input edge of each layer; the total is appended by `build`.
    layer_begins: Vec<usize>,
    layer_predicates: Vec<Box<IsFullPolygonPredicate<'a>>>,

    /// Empty until the first labeled edge, then parallel to `input_edges`.
    label_set_ids: Vec<IdSetId>,
    label_set_lexicon: IdSetLexicon,
    label_set: Vec<Label>,
    label_set_modified: bool,
    label_set_id: IdSetId,
}

impl std::fmt::Debug for Builder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("options", &self.options)
            .field("num_layers", &self.layers.len())
            .field("num_input_edges", &self.input_edges.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Builder<'a> {
    /// Fails if the snap radius exceeds [`MAX_SNAP_RADIUS`].
    pub fn new(options: Options) -> Result<Self, BuildError> {
        let params = SnapParams::new(
            &*options.snap_function,
            options.split_crossing_edges,
            options.intersection_tolerance,
        )?;
        Ok(Self {
            options,
            params,
            input_vertices: Vec::new(),
            input_edges: Vec::new(),
            forced_sites: Vec::new(),
            snapping_needed: false,
            layers: Vec::new(),
            layer_options: Vec::new(),
            layer_begins: Vec::new(),
            layer_predicates: Vec::new(),
            label_set_ids: Vec::new(),
            label_set_lexicon: IdSetLexicon::new(),
            label_set: Vec::new(),
            label_set_modified: false,
            label_set_id: IdSetId::EMPTY,
        })
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Start a new output layer. Edges added from now on belong to it.
    pub fn start_layer(&mut self, layer: Box<dyn Layer + 'a>) {
        self.layer_options.push(layer.graph_options());
        self.layer_begins.push(self.input_edges.len());
        self.layer_predicates.push(Box::new(graph::never_full));
        self.layers.push(layer);
    }

    /// Decide empty vs. full for the current layer when its polygon output
    /// has no edges. Defaults to empty.
    pub fn add_is_full_polygon_predicate(
        &mut self,
        predicate: impl Fn(&Graph<'_>) -> Result<bool, BuildError> + 'a,
    ) {
        if let Some(last) = self.layer_predicates.last_mut() {
            *last = Box::new(predicate);
        }
    }

    fn add_vertex(&mut self, v: Point) -> InputVertexId {
        // Consecutive edges usually share a vertex.
        if self.input_vertices.last() != Some(&v) {
            self.input_vertices.push(v);
        }
        InputVertexId::new(self.input_vertices.len() - 1)
    }

    /// Add an edge to the current layer. Degenerate edges are dropped early
    /// when the layer discards them.
    pub fn add_edge(&mut self, v0: Point, v1: Point) {
        debug_assert!(!self.layers.is_empty(), "start_layer must precede add_edge");
        if v0 == v1
            && self
                .layer_options
                .last()
                .is_some_and(|o| o.degenerate_edges == DegenerateEdges::Discard)
        {
            return;
        }
        let j0 = self.add_vertex(v0);
        let j1 = self.add_vertex(v1);
        self.input_edges.push((j0, j1));

        if self.label_set_modified {
            if self.label_set_ids.is_empty() {
                self.label_set_ids = vec![self.label_set_id; self.input_edges.len() - 1];
            }
            self.label_set_id = self.label_set_lexicon.add(self.label_set.iter().copied());
            self.label_set_ids.push(self.label_set_id);
            self.label_set_modified = false;
        } else if !self.label_set_ids.is_empty() {
            self.label_set_ids.push(self.label_set_id);
        }
    }

    pub fn add_polyline(&mut self, vertices: &[Point]) {
        for w in vertices.windows(2) {
            self.add_edge(w[0], w[1]);
        }
    }

    /// Add a closed loop. A single vertex is a degenerate loop.
    pub fn add_loop(&mut self, vertices: &[Point]) {
        let n = vertices.len();
        for i in 0..n {
            self.add_edge(vertices[i], vertices[(i + 1) % n]);
        }
    }

    pub fn add_shape(&mut self, shape: &Shape) {
        for (v0, v1) in shape.edges() {
            self.add_edge(v0, v1);
        }
    }

    /// Add a vertex known to lie within `intersection_tolerance` of a
    /// crossing between two input edges. Disables the idempotent shortcut.
    pub fn add_intersection(&mut self, p: Point) {
        debug_assert!(self.options.intersection_tolerance > 0.0);
        if self.params.snapping_requested {
            self.snapping_needed = true;
        }
        self.add_vertex(p);
    }

    /// Add a site that is kept even if it is closer than the minimum
    /// separation to other sites.
    pub fn force_vertex(&mut self, p: Point) {
        self.forced_sites.push(p);
    }

    pub fn clear_labels(&mut self) {
        self.label_set.clear();
        self.label_set_modified = true;
    }

    pub fn push_label(&mut self, label: Label) {
        self.label_set.push(label);
        self.label_set_modified = true;
    }

    pub fn pop_label(&mut self) {
        self.label_set.pop();
        self.label_set_modified = true;
    }

    pub fn set_label(&mut self, label: Label) {
        self.label_set.clear();
        self.label_set.push(label);
        self.label_set_modified = true;
    }

    /// Snap all layers and hand each one its graph.
    ///
    /// Every layer is built even after one fails; the first error is
    /// returned. Configuration and budget errors abort before any layer is
    /// built.
    #[instrument(
        level = "debug",
        skip(self),
        fields(layers = self.layers.len(), edges = self.input_edges.len())
    )]
    pub fn build(mut self) -> Result<(), BuildError> {
        let mut timing = TimingBuilder::new();
        let num_input_edges = self.input_edges.len();
        self.layer_begins.push(num_input_edges);

        let mut ws = Workspace::new(
            &self.params,
            &*self.options.snap_function,
            std::mem::take(&mut self.input_vertices),
            std::mem::take(&mut self.input_edges),
            std::mem::take(&mut self.forced_sites),
            MemoryBudget::with_limit(self.options.memory_budget),
        );
        ws.snapping_needed =
            self.snapping_needed || (self.params.snapping_requested && !self.options.idempotent);

        let t = Timer::start();
        ws.choose_sites(self.options.split_crossing_edges)?;
        timing.add(Phase::ChooseSites, t.elapsed());
        let t = Timer::start();
        ws.resolve_edges()?;
        timing.add(Phase::ExtraSites, t.elapsed());
        debug!(
            sites = ws.sites.len(),
            snapping_needed = ws.snapping_needed,
            "chose sites"
        );

        let mut lexicon = IdSetLexicon::new();
        let mut first_error = None;
        let (mut layer_edges, layer_input_edge_ids) = build_layer_edges(
            &mut ws,
            &self.options,
            &self.layer_begins,
            &mut self.layer_options,
            &mut lexicon,
            &mut first_error,
            &mut timing,
        )?;

        let t = Timer::start();
        let Workspace { sites, mut budget, .. } = ws;
        let filter = self.layers.len() >= MIN_LAYERS_FOR_VERTEX_FILTERING
            && self.layer_options.iter().all(|o| o.allow_vertex_filtering);
        let layer_vertices: Vec<Vec<Point>> = if filter {
            layer_edges
                .iter_mut()
                .map(|edges| Graph::filter_vertices(&sites, edges, &mut budget))
                .collect::<Result<_, _>>()?
        } else {
            Vec::new()
        };
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let vertices = layer_vertices.get(i).unwrap_or(&sites);
            let g = Graph::new(
                self.layer_options[i],
                vertices,
                &layer_edges[i],
                &layer_input_edge_ids[i],
                &lexicon,
                &self.label_set_ids,
                &self.label_set_lexicon,
                &*self.layer_predicates[i],
            );
            let result = layer.build(&g);
            debug!(layer = i, edges = g.num_edges(), ok = result.is_ok(), "built layer");
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        timing.add(Phase::Layers, t.elapsed());
        timing.finish().report("builder", num_input_edges);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Snap (and optionally simplify) the edges of every layer, then apply each
/// layer's graph options. Option errors are recorded in `first_error` and do
/// not stop the other layers; budget errors abort.
fn build_layer_edges(
    ws: &mut Workspace<'_>,
    options: &Options,
    layer_begins: &[usize],
    layer_options: &mut [GraphOptions],
    lexicon: &mut IdSetLexicon,
    first_error: &mut Option<BuildError>,
    timing: &mut TimingBuilder,
) -> Result<(Vec<Vec<Edge>>, Vec<Vec<IdSetId>>), BuildError> {
    let t = Timer::start();
    let simplify = ws.snapping_needed && options.simplify_edge_chains;
    let mut site_vertices: Vec<Vec<InputVertexId>> = Vec::new();
    if simplify {
        site_vertices.resize_with(ws.sites.len(), Vec::new);
    }

    let num_layers = layer_options.len();
    let mut layer_edges = vec![Vec::new(); num_layers];
    let mut layer_input_edge_ids = vec![Vec::new(); num_layers];
    for i in 0..num_layers {
        add_snapped_edges(
            ws,
            layer_begins[i]..layer_begins[i + 1],
            layer_options[i],
            &mut layer_edges[i],
            &mut layer_input_edge_ids[i],
            &mut site_vertices,
        )?;
    }
    timing.add(Phase::LayerEdges, t.elapsed());

    if simplify {
        let t = Timer::start();
        let ctx = SimplifyContext {
            num_forced_sites: ws.num_forced_sites,
            input_vertices: &ws.input_vertices,
            edge_sites: &ws.edge_sites,
            layer_begins,
            edge_snap_radius_ca: ws.params.edge_snap_radius_ca,
            min_edge_site_separation_ca: ws.params.min_edge_site_separation_ca,
            min_edge_length_to_split_ca: ws.params.min_edge_length_to_split_ca,
        };
        simplify_edge_chains(
            &ctx,
            &ws.sites,
            &site_vertices,
            &mut layer_edges,
            &mut layer_input_edge_ids,
            lexicon,
            &mut ws.budget,
        )?;
        timing.add(Phase::Simplify, t.elapsed());
    }

    // Simplification can create duplicates and sibling pairs, so the graph
    // options are applied afterwards.
    let t = Timer::start();
    for i in 0..num_layers {
        let result = Graph::process_edges(
            &mut layer_options[i],
            &mut layer_edges[i],
            &mut layer_input_edge_ids[i],
            lexicon,
            &mut ws.budget,
        );
        match result {
            Err(e @ BuildError::ResourceExhausted { .. }) => return Err(e),
            Err(e) => {
                first_error.get_or_insert(e);
            }
            Ok(()) => {}
        }
    }
    timing.add(Phase::LayerEdges, t.elapsed());
    Ok((layer_edges, layer_input_edge_ids))
}

/// Snap the input edges in `range` and append the resulting site-to-site
/// edges. When `site_vertices` is non-empty it also records which input
/// vertices snapped to each site.
fn add_snapped_edges(
    ws: &mut Workspace<'_>,
    range: std::ops::Range<usize>,
    options: GraphOptions,
    edges: &mut Vec<Edge>,
    input_edge_ids: &mut Vec<IdSetId>,
    site_vertices: &mut [Vec<InputVertexId>],
) -> Result<(), BuildError> {
    let discard_degenerate = options.degenerate_edges == DegenerateEdges::Discard;
    let undirected = options.edge_type == EdgeType::Undirected;
    let mut chain = Vec::new();
    for e in range {
        let id = IdSetId::singleton(e as u32);
        ws.snap_edge(e, &mut chain);
        let (i0, i1) = ws.input_edges[e];
        maybe_add_input_vertex(i0, chain[0], site_vertices);
        let mut add = |src: SiteId, dst: SiteId| -> Result<(), BuildError> {
            let (src, dst) = (VertexId(src.0), VertexId(dst.0));
            ws.budget.push(edges, (src, dst))?;
            ws.budget.push(input_edge_ids, id)?;
            if undirected {
                ws.budget.push(edges, (dst, src))?;
                ws.budget.push(input_edge_ids, IdSetId::EMPTY)?;
            }
            Ok(())
        };
        if chain.len() == 1 {
            if discard_degenerate {
                continue;
            }
            add(chain[0], chain[0])?;
        } else {
            for w in chain.windows(2) {
                add(w[0], w[1])?;
            }
            if let Some(&last) = chain.last() {
                maybe_add_input_vertex(i1, last, site_vertices);
            }
        }
    }
    Ok(())
}

#[inline]
fn maybe_add_input_vertex(v: InputVertexId, site: SiteId, site_vertices: &mut [Vec<InputVertexId>]) {
    if site_vertices.is_empty() {
        return;
    }
    let vertices = &mut site_vertices[site.index()];
    if vertices.last() != Some(&v) {
        vertices.push(v);
    }
}
