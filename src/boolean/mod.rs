//! Boolean operations (union, intersection, difference and symmetric
//! difference) on regions of points, polylines and polygons.
//!
//! Both regions are clipped to each other, the surviving edges are snap
//! rounded together, and the snapped edge chains are trimmed again at the
//! vertices where the input crossings ended up, so that the output is
//! topologically consistent with the exact result.
//!
//! ```
//! use s2_boolean::boolean::{BooleanOperation, OpType, Options};
//! use s2_boolean::builder::PointVectorLayer;
//! use s2_boolean::text_format::parse_region;
//!
//! let a = parse_region("0:0 | 1:0 # #").unwrap();
//! let b = parse_region("0:0 | 2:0 # #").unwrap();
//! let mut points = Vec::new();
//! let layer = Box::new(PointVectorLayer::new(&mut points));
//! BooleanOperation::new(OpType::Intersection, layer, Options::default()).build(&a, &b)?;
//! assert_eq!(points.len(), 2);
//! # Ok::<(), s2_boolean::BuildError>(())
//! ```

mod clipper;
mod crossings;
mod operation;
mod processor;

use crate::budget::MemoryBudget;
use crate::builder::{self, Builder, IdentitySnapFunction, Layer, SnapFunction};
use crate::error::BuildError;
use crate::geometry::edge::INTERSECTION_ERROR;
use crate::region::Region;
use crate::timing::{Phase, Timer, TimingBuilder};
use clipper::EdgeClippingLayer;
use operation::{FullPolygonTest, Operation};
use processor::{ClipOutput, CrossingProcessor};
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    /// Contained by either region.
    Union,
    /// Contained by both regions.
    Intersection,
    /// Contained by the first region but not the second.
    Difference,
    /// Contained by exactly one region.
    SymmetricDifference,
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpType::Union => "union",
            OpType::Intersection => "intersection",
            OpType::Difference => "difference",
            OpType::SymmetricDifference => "symmetric difference",
        })
    }
}

/// Whether polygons contain their boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonModel {
    /// Polygons contain no vertices or edges.
    Open,
    /// Polygons contain some vertices and edges, chosen so that polygons
    /// tiling the sphere contain every point exactly once.
    #[default]
    SemiOpen,
    /// Polygons contain all their vertices and edges.
    Closed,
}

impl fmt::Display for PolygonModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolygonModel::Open => "open",
            PolygonModel::SemiOpen => "semi-open",
            PolygonModel::Closed => "closed",
        })
    }
}

/// Whether polylines contain their endpoints. Polylines always contain their
/// interior vertices, and degenerate polylines always contain themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolylineModel {
    /// Polylines contain no endpoints.
    Open,
    /// Polylines contain their first vertex but not their last.
    SemiOpen,
    /// Polylines contain both endpoints.
    #[default]
    Closed,
}

impl fmt::Display for PolylineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolylineModel::Open => "open",
            PolylineModel::SemiOpen => "semi-open",
            PolylineModel::Closed => "closed",
        })
    }
}

/// Configuration for a boolean operation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Snap function for the output. Defaults to merging only identical
    /// vertices.
    pub snap_function: Box<dyn SnapFunction>,

    pub polygon_model: PolygonModel,

    pub polyline_model: PolylineModel,

    /// If true, the first and last vertex of a closed polyline are its
    /// boundary, like for any other polyline. If false, closed polylines
    /// have no boundary and contain their start vertex as a closed
    /// polyline would.
    pub polyline_loops_have_boundaries: bool,

    /// If true, every crossing between the output polylines gets an output
    /// vertex, including crossings within one input region. Crossings
    /// between the two regions always get one.
    pub split_all_crossing_polyline_edges: bool,

    /// Upper bound on the bytes held by working buffers, applied separately
    /// to clipping and to snap rounding.
    pub memory_budget: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            snap_function: Box::new(IdentitySnapFunction::zero()),
            polygon_model: PolygonModel::default(),
            polyline_model: PolylineModel::default(),
            polyline_loops_have_boundaries: true,
            split_all_crossing_polyline_edges: false,
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

    pub fn with_polygon_model(mut self, model: PolygonModel) -> Self {
        self.polygon_model = model;
        self
    }

    pub fn with_polyline_model(mut self, model: PolylineModel) -> Self {
        self.polyline_model = model;
        self
    }

    pub fn with_polyline_loops_have_boundaries(mut self, value: bool) -> Self {
        self.polyline_loops_have_boundaries = value;
        self
    }

    pub fn with_split_all_crossing_polyline_edges(mut self, split: bool) -> Self {
        self.split_all_crossing_polyline_edges = split;
        self
    }

    pub fn with_memory_budget(mut self, bytes: Option<usize>) -> Self {
        self.memory_budget = bytes;
        self
    }

    /// Snap rounding settings for the clipped edges.
    fn builder_options(&self) -> builder::Options {
        builder::Options {
            snap_function: self.snap_function.clone(),
            split_crossing_edges: self.split_all_crossing_polyline_edges,
            intersection_tolerance: INTERSECTION_ERROR,
            simplify_edge_chains: false,
            // Vertices closer than the snap radius are snapped even when the
            // input is already well separated.
            idempotent: false,
            memory_budget: self.memory_budget,
        }
    }

    /// Distance edges may move: the snap radius plus the error of computed
    /// intersection points.
    fn edge_snap_radius(&self) -> f64 {
        self.snap_function.snap_radius() + INTERSECTION_ERROR
    }

    fn processor<'r>(&self, output: Option<ClipOutput>) -> CrossingProcessor<'r> {
        CrossingProcessor::new(
            self.polygon_model,
            self.polyline_model,
            self.polyline_loops_have_boundaries,
            output,
            MemoryBudget::with_limit(self.memory_budget),
        )
    }
}

/// A boolean operation whose result goes to one output layer holding every
/// dimension, or to three layers for points, polylines and polygons.
pub struct BooleanOperation<'a> {
    op_type: OpType,
    options: Options,
    layers: Vec<Box<dyn Layer + 'a>>,
}

impl fmt::Debug for BooleanOperation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanOperation")
            .field("op_type", &self.op_type)
            .field("options", &self.options)
            .field("num_layers", &self.layers.len())
            .finish()
    }
}

impl<'a> BooleanOperation<'a> {
    /// All dimensions go to `layer`.
    pub fn new(op_type: OpType, layer: Box<dyn Layer + 'a>, options: Options) -> Self {
        Self {
            op_type,
            options,
            layers: vec![layer],
        }
    }

    /// `layers[d]` receives the output of dimension `d`.
    pub fn with_layers(op_type: OpType, layers: [Box<dyn Layer + 'a>; 3], options: Options) -> Self {
        Self {
            op_type,
            options,
            layers: layers.into(),
        }
    }

    #[inline]
    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compute the operation on `a` and `b` and build the output layers.
    ///
    /// A polygon result without edges is reported as the full polygon when
    /// the input areas and cube faces say so, and as empty otherwise.
    #[instrument(
        level = "debug",
        skip_all,
        fields(op = %self.op_type, a_edges = a.num_edges(), b_edges = b.num_edges())
    )]
    pub fn build(self, a: &Region, b: &Region) -> Result<(), BuildError> {
        let mut timing = TimingBuilder::new();
        let mut cp = self.options.processor(Some(ClipOutput::default()));
        let mut op = Operation::new(self.op_type, a, b);

        let t = Timer::start();
        op.index_crossings(0, &mut cp)?;
        timing.add(Phase::Crossings, t.elapsed());
        debug!(crossings = op.num_index_crossings(), "found index crossings");

        let t = Timer::start();
        op.build_op_type(&mut cp)?;
        op.release(&mut cp.budget);
        timing.add(Phase::Clipping, t.elapsed());
        let (output, budget) = cp.into_parts();
        let ClipOutput {
            edges,
            input_dimensions,
            input_crossings,
            intersections,
        } = output.unwrap_or_default();
        debug!(
            edges = edges.len(),
            crossings = input_crossings.len(),
            intersections = intersections.len(),
            "clipped regions"
        );
        timing.finish().report("boolean", edges.len());

        let full = FullPolygonTest::new(self.op_type, a, b, self.options.edge_snap_radius());
        let mut builder = Builder::new(self.options.builder_options())?;
        builder.start_layer(Box::new(EdgeClippingLayer::new(
            self.layers,
            input_dimensions,
            input_crossings,
            budget,
        )));
        builder.add_is_full_polygon_predicate(move |_| Ok(full.is_full()));
        for p in intersections {
            builder.add_intersection(p);
        }
        // Builder input edge ids follow the clipper's numbering.
        for (v0, v1) in edges {
            builder.add_edge(v0, v1);
        }
        builder.build()
    }
}

/// Whether the result of `op_type` on `a` and `b` is empty, stopping as soon
/// as any output edge is found. Snapping is not performed, so a result that
/// would vanish after snapping counts as non-empty.
pub fn is_empty(op_type: OpType, a: &Region, b: &Region, options: &Options) -> Result<bool, BuildError> {
    let mut cp = options.processor(None);
    let mut op = Operation::new(op_type, a, b);
    let no_edges = op.build_op_type(&mut cp)?;
    Ok(no_edges && !FullPolygonTest::new(op_type, a, b, options.edge_snap_radius()).is_full())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{EdgeVectorLayer, GraphOptions};
    use crate::text_format::parse_region;
    use crate::types::{LatLng, Point};

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    fn region(text: &str) -> Region {
        parse_region(text).unwrap()
    }

    #[test]
    fn test_option_defaults() {
        let o = Options::default();
        assert_eq!(o.polygon_model, PolygonModel::SemiOpen);
        assert_eq!(o.polyline_model, PolylineModel::Closed);
        assert!(o.polyline_loops_have_boundaries);
        assert!(!o.split_all_crossing_polyline_edges);
        let b = o.builder_options();
        assert!(!b.idempotent);
        assert_eq!(b.intersection_tolerance, INTERSECTION_ERROR);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(OpType::SymmetricDifference.to_string(), "symmetric difference");
        assert_eq!(PolygonModel::SemiOpen.to_string(), "semi-open");
        assert_eq!(PolylineModel::Closed.to_string(), "closed");
    }

    #[test]
    fn test_is_empty_by_op_type() {
        let a = region("# # 0:0, 0:2, 2:2, 2:0");
        let b = region("# # 5:5, 5:6, 6:6, 6:5");
        let o = Options::default();
        assert!(is_empty(OpType::Intersection, &a, &b, &o).unwrap());
        assert!(!is_empty(OpType::Union, &a, &b, &o).unwrap());
        assert!(!is_empty(OpType::Difference, &a, &b, &o).unwrap());
        assert!(is_empty(OpType::Difference, &a, &a, &o).unwrap());
        assert!(is_empty(OpType::SymmetricDifference, &a, &a.clone(), &o).unwrap());
    }

    #[test]
    fn test_intersection_of_nested_polygons() {
        let a = region("# # 0:0, 0:4, 4:4, 4:0");
        let b = region("# # 1:1, 1:2, 2:2, 2:1");
        let mut edges = Vec::new();
        let layer = Box::new(EdgeVectorLayer::new(GraphOptions::default(), &mut edges));
        BooleanOperation::new(OpType::Intersection, layer, Options::default())
            .build(&a, &b)
            .unwrap();
        assert_eq!(edges.len(), 4);
        assert!(edges.contains(&(ll(1.0, 1.0), ll(1.0, 2.0))));
    }

    #[test]
    fn test_memory_budget_exhausted() {
        let a = region("# 0:0, 2:2 #");
        let b = region("# 2:0, 0:2 #");
        let mut edges = Vec::new();
        let layer = Box::new(EdgeVectorLayer::new(GraphOptions::default(), &mut edges));
        let options = Options::default().with_memory_budget(Some(8));
        let err = BooleanOperation::new(OpType::Union, layer, options).build(&a, &b);
        assert!(matches!(err, Err(BuildError::ResourceExhausted { .. })));
    }
}
