//! Output layers: consumers that turn one layer's snapped [`Graph`] into a
//! concrete representation.
//!
//! Each layer borrows the caller's output buffer for the lifetime of the
//! [`Builder`](super::Builder), so results are read after `build` returns.

use super::graph::{
    DegenerateEdges, DuplicateEdges, EdgeType, Graph, GraphOptions, LoopType, SiblingPairs,
};
use super::ids::{EdgeId, InputEdgeId, Label};
use crate::error::BuildError;
use crate::types::Point;

/// A consumer of one layer of snapped edges.
pub trait Layer {
    /// How the builder should post-process this layer's edges.
    fn graph_options(&self) -> GraphOptions;

    /// Assemble the output. An error aborts the current `build` call.
    fn build(&mut self, g: &Graph<'_>) -> Result<(), BuildError>;
}

/// Union of the labels of the input edges that snapped to `e`.
fn edge_labels(g: &Graph<'_>, e: EdgeId) -> Vec<Label> {
    let mut labels: Vec<Label> = g
        .input_edge_ids(e)
        .iter()
        .flat_map(|id| g.labels(InputEdgeId(id)))
        .collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

/// Collects degenerate edges as points. Any other edge is an error.
pub struct PointVectorLayer<'a> {
    points: &'a mut Vec<Point>,
    labels: Option<&'a mut Vec<Vec<Label>>>,
    duplicate_edges: DuplicateEdges,
}

impl<'a> PointVectorLayer<'a> {
    pub fn new(points: &'a mut Vec<Point>) -> Self {
        Self {
            points,
            labels: None,
            duplicate_edges: DuplicateEdges::Keep,
        }
    }

    /// Also record the labels of each output point.
    pub fn with_labels(mut self, labels: &'a mut Vec<Vec<Label>>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_duplicate_edges(mut self, duplicate_edges: DuplicateEdges) -> Self {
        self.duplicate_edges = duplicate_edges;
        self
    }
}

impl Layer for PointVectorLayer<'_> {
    fn graph_options(&self) -> GraphOptions {
        GraphOptions::new(
            EdgeType::Directed,
            DegenerateEdges::Keep,
            self.duplicate_edges,
            SiblingPairs::Keep,
        )
    }

    fn build(&mut self, g: &Graph<'_>) -> Result<(), BuildError> {
        let mut non_degenerate = false;
        for e in g.edge_ids() {
            let (v0, v1) = g.edge(e);
            if v0 != v1 {
                non_degenerate = true;
                continue;
            }
            self.points.push(g.vertex(v0));
            if let Some(labels) = self.labels.as_deref_mut() {
                labels.push(edge_labels(g, e));
            }
        }
        if non_degenerate {
            return Err(BuildError::NotDegenerate);
        }
        Ok(())
    }
}

/// Assembles edges into polylines, breaking at every vertex whose degree is
/// not exactly one in and one out.
pub struct PolylineVectorLayer<'a> {
    polylines: &'a mut Vec<Vec<Point>>,
    edge_type: EdgeType,
    degenerate_edges: DegenerateEdges,
    duplicate_edges: DuplicateEdges,
    sibling_pairs: SiblingPairs,
}

impl<'a> PolylineVectorLayer<'a> {
    pub fn new(polylines: &'a mut Vec<Vec<Point>>) -> Self {
        Self {
            polylines,
            edge_type: EdgeType::Directed,
            degenerate_edges: DegenerateEdges::Discard,
            duplicate_edges: DuplicateEdges::Keep,
            sibling_pairs: SiblingPairs::Keep,
        }
    }

    pub fn with_edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Keep degenerate edges as two-vertex polylines `[p, p]`.
    pub fn with_degenerate_edges(mut self, degenerate_edges: DegenerateEdges) -> Self {
        self.degenerate_edges = degenerate_edges;
        self
    }

    pub fn with_duplicate_edges(mut self, duplicate_edges: DuplicateEdges) -> Self {
        self.duplicate_edges = duplicate_edges;
        self
    }

    pub fn with_sibling_pairs(mut self, sibling_pairs: SiblingPairs) -> Self {
        self.sibling_pairs = sibling_pairs;
        self
    }
}

impl Layer for PolylineVectorLayer<'_> {
    fn graph_options(&self) -> GraphOptions {
        GraphOptions::new(
            self.edge_type,
            self.degenerate_edges,
            self.duplicate_edges,
            self.sibling_pairs,
        )
    }

    fn build(&mut self, g: &Graph<'_>) -> Result<(), BuildError> {
        for polyline in g.polylines() {
            let Some(&first) = polyline.first() else {
                continue;
            };
            let mut vertices = Vec::with_capacity(polyline.len() + 1);
            vertices.push(g.vertex(g.edge(first).0));
            vertices.extend(polyline.iter().map(|&e| g.vertex(g.edge(e).1)));
            self.polylines.push(vertices);
        }
        Ok(())
    }
}

/// What to do with polygon boundaries that enclose no area (isolated
/// vertices and sibling edge pairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateBoundaries {
    /// Drop them.
    #[default]
    Discard,
    /// Keep one copy of each as a one- or two-vertex loop.
    Keep,
}

/// Assembles directed edges into polygon loops.
///
/// The output uses the loop convention of [`Shape::polygon`](crate::region::Shape::polygon):
/// shells counter-clockwise, holes clockwise, and the full polygon as a
/// single empty loop.
pub struct LaxPolygonLayer<'a> {
    loops: &'a mut Vec<Vec<Point>>,
    degenerate_boundaries: DegenerateBoundaries,
}

impl<'a> LaxPolygonLayer<'a> {
    pub fn new(loops: &'a mut Vec<Vec<Point>>) -> Self {
        Self {
            loops,
            degenerate_boundaries: DegenerateBoundaries::Discard,
        }
    }

    pub fn with_degenerate_boundaries(mut self, degenerate_boundaries: DegenerateBoundaries) -> Self {
        self.degenerate_boundaries = degenerate_boundaries;
        self
    }
}

impl Layer for LaxPolygonLayer<'_> {
    fn graph_options(&self) -> GraphOptions {
        match self.degenerate_boundaries {
            // Duplicates should not occur; keeping them gives clearer
            // loop-assembly errors.
            DegenerateBoundaries::Discard => GraphOptions::new(
                EdgeType::Directed,
                DegenerateEdges::Discard,
                DuplicateEdges::Keep,
                SiblingPairs::Discard,
            ),
            // Merge is needed because DiscardExcess may still keep several
            // copies of an isolated degenerate edge.
            DegenerateBoundaries::Keep => GraphOptions::new(
                EdgeType::Directed,
                DegenerateEdges::DiscardExcess,
                DuplicateEdges::Merge,
                SiblingPairs::DiscardExcess,
            ),
        }
    }

    fn build(&mut self, g: &Graph<'_>) -> Result<(), BuildError> {
        let edge_loops = g.directed_loops(LoopType::Circuit)?;
        let start = self.loops.len();
        for edge_loop in &edge_loops {
            self.loops
                .push(edge_loop.iter().map(|&e| g.vertex(g.edge(e).0)).collect());
        }
        if self.loops.len() == start && g.is_full_polygon()? {
            self.loops.push(Vec::new());
        }
        Ok(())
    }
}

/// Copies the processed edges verbatim, with the input edges of each.
pub struct EdgeVectorLayer<'a> {
    options: GraphOptions,
    edges: &'a mut Vec<(Point, Point)>,
    input_edge_ids: Option<&'a mut Vec<Vec<InputEdgeId>>>,
}

impl<'a> EdgeVectorLayer<'a> {
    pub fn new(options: GraphOptions, edges: &'a mut Vec<(Point, Point)>) -> Self {
        Self {
            options,
            edges,
            input_edge_ids: None,
        }
    }

    pub fn with_input_edge_ids(mut self, ids: &'a mut Vec<Vec<InputEdgeId>>) -> Self {
        self.input_edge_ids = Some(ids);
        self
    }
}

impl Layer for EdgeVectorLayer<'_> {
    fn graph_options(&self) -> GraphOptions {
        self.options
    }

    fn build(&mut self, g: &Graph<'_>) -> Result<(), BuildError> {
        for e in g.edge_ids() {
            let (v0, v1) = g.edge(e);
            self.edges.push((g.vertex(v0), g.vertex(v1)));
            if let Some(ids) = self.input_edge_ids.as_deref_mut() {
                ids.push(g.input_edge_ids(e).iter().map(InputEdgeId).collect());
            }
        }
        Ok(())
    }
}
