//! Boolean operations on small literal regions, checked per output
//! dimension.

mod support;

use s2_boolean::boolean::{is_empty, BooleanOperation, OpType, Options, PolygonModel, PolylineModel};
use s2_boolean::builder::{IntLatLngSnapFunction, LaxPolygonLayer};
use s2_boolean::BuildError;
use support::{expect_result, region};

fn round_to_e(exponent: i32) -> Options {
    Options::new(IntLatLngSnapFunction::new(exponent).unwrap())
}

#[test]
fn test_point_point() {
    let options = Options::default();
    let (a, b) = ("0:0 | 1:0 # #", "0:0 | 2:0 # #");
    // Duplicates are part of the result.
    expect_result(OpType::Union, &options, a, b, "0:0 | 0:0 | 1:0 | 2:0 # #");
    expect_result(OpType::Intersection, &options, a, b, "0:0 | 0:0 # #");
    expect_result(OpType::Difference, &options, a, b, "1:0 # #");
    expect_result(OpType::SymmetricDifference, &options, a, b, "1:0 | 2:0 # #");
}

#[test]
fn test_point_closed_polyline() {
    // Polylines take precedence over points they contain.
    for loops_have_boundaries in [false, true] {
        let options = Options::default()
            .with_polyline_model(PolylineModel::Closed)
            .with_polyline_loops_have_boundaries(loops_have_boundaries);
        let a = "0:0 | 1:0 | 2:0 | 3:0 | 4:0 | 5:0 # #";
        let b = "# 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0, 4:0 #";
        expect_result(OpType::Union, &options, a, b, "# 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0, 4:0 #");
        expect_result(OpType::Intersection, &options, a, b, "0:0 | 1:0 | 2:0 | 3:0 | 4:0 | 5:0 # #");
        expect_result(OpType::Difference, &options, a, b, "# #");
        expect_result(
            OpType::SymmetricDifference,
            &options,
            a,
            b,
            "# 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0, 4:0 #",
        );
    }
}

#[test]
fn test_point_open_polyline() {
    // The degenerate polyline 3:0 contains no points, and the loop
    // 4:0, 5:0, 4:0 does not contain its endpoint.
    let options = Options::default().with_polyline_model(PolylineModel::Open);
    let a = "0:0 | 1:0 | 2:0 | 3:0 | 4:0 | 5:0 # #";
    let b = "# 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0, 4:0 #";
    expect_result(
        OpType::Union,
        &options,
        a,
        b,
        "0:0 | 2:0 | 3:0 | 4:0 # 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0, 4:0 #",
    );
    expect_result(OpType::Intersection, &options, a, b, "1:0 | 5:0 # #");
    expect_result(OpType::Difference, &options, a, b, "0:0 | 2:0 | 3:0 | 4:0 # #");
}

#[test]
fn test_point_open_polyline_without_loop_boundaries() {
    let options = Options::default()
        .with_polyline_model(PolylineModel::Open)
        .with_polyline_loops_have_boundaries(false);
    let a = "0:0 | 1:0 | 2:0 | 3:0 | 4:0 | 5:0 # #";
    let b = "# 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0, 4:0 #";
    expect_result(OpType::Intersection, &options, a, b, "1:0 | 4:0 | 5:0 # #");
    expect_result(OpType::Difference, &options, a, b, "0:0 | 2:0 | 3:0 # #");
}

#[test]
fn test_point_polygon_interior() {
    let options = Options::default();
    let (a, b) = ("1:1 | 4:4 # #", "# # 0:0, 0:3, 3:0");
    expect_result(OpType::Union, &options, a, b, "4:4 # # 0:0, 0:3, 3:0");
    expect_result(OpType::Intersection, &options, a, b, "1:1 # #");
    expect_result(OpType::Difference, &options, a, b, "4:4 # #");
    expect_result(OpType::SymmetricDifference, &options, a, b, "4:4 # # 0:0, 0:3, 3:0");
}

#[test]
fn test_point_open_polygon_vertex() {
    let options = Options::default().with_polygon_model(PolygonModel::Open);
    let (a, b) = ("0:1 | 1:0 # #", "# # 0:0, 0:1, 1:0");
    expect_result(OpType::Union, &options, a, b, "0:1 | 1:0 # # 0:0, 0:1, 1:0");
    expect_result(OpType::Intersection, &options, a, b, "# #");
    expect_result(OpType::Difference, &options, a, b, "0:1 | 1:0 # #");
}

#[test]
fn test_polyline_edge_polyline_edge_crossing() {
    let options = round_to_e(1);
    let (a, b) = ("# 0:0, 2:2 #", "# 2:0, 0:2 #");
    expect_result(OpType::Union, &options, a, b, "# 0:0, 1:1, 2:2 | 2:0, 1:1, 0:2 #");
    expect_result(OpType::Intersection, &options, a, b, "# 1:1, 1:1 | 1:1, 1:1 #");
    expect_result(OpType::Difference, &options, a, b, "# 0:0, 1:1, 2:2 #");
    expect_result(OpType::SymmetricDifference, &options, a, b, "# 0:0, 1:1, 2:2 | 2:0, 1:1, 0:2 #");
}

#[test]
fn test_polyline_edge_polyline_edge_overlap() {
    let options = Options::default().with_polygon_model(PolygonModel::Open);
    let a = "# 0:0, 1:0, 2:0, 2:5 | 3:0, 3:0 | 6:0, 5:0, 4:0 #";
    let b = "# 0:0, 1:0, 2:0 | 3:0, 3:0 | 4:0, 5:0 #";
    // Both copies of shared pieces are kept.
    expect_result(
        OpType::Union,
        &options,
        a,
        b,
        "# 0:0, 1:0, 2:0, 2:5 | 0:0, 1:0, 2:0 | 3:0, 3:0 | 3:0, 3:0 | 6:0, 5:0, 4:0 | 4:0, 5:0 #",
    );
    expect_result(
        OpType::Intersection,
        &options,
        a,
        b,
        "# 0:0, 1:0, 2:0 | 0:0, 1:0, 2:0 | 3:0, 3:0 | 3:0, 3:0 | 5:0, 4:0 | 4:0, 5:0 #",
    );
    expect_result(OpType::Difference, &options, a, b, "# 2:0, 2:5 | 6:0, 5:0 #");
}

#[test]
fn test_polyline_edge_polygon_interior() {
    let options = Options::default();
    let a = "# 1:1, 2:2 | 3:3, 3:3 | 6:6, 7:7 | 8:8, 8:8 #";
    let b = "# # 0:0, 0:5, 5:5, 5:0";
    expect_result(OpType::Union, &options, a, b, "# 6:6, 7:7 | 8:8, 8:8 # 0:0, 0:5, 5:5, 5:0");
    expect_result(OpType::Intersection, &options, a, b, "# 1:1, 2:2 | 3:3, 3:3 #");
    expect_result(OpType::Difference, &options, a, b, "# 6:6, 7:7 | 8:8, 8:8 #");
}

#[test]
fn test_polyline_isolated_start_vertex_plus_interior_crossing() {
    // The crossings belong to the clipped edge, not to the isolated start
    // vertex emitted before it.
    let options = round_to_e(1);
    expect_result(
        OpType::Difference,
        &options,
        "# 0:0, 0:10, 0:4 #",
        "# # 0:0, -5:5, 5:5",
        "# 0:0, 0:0 | 0:5, 0:10, 0:5 #",
    );
}

#[test]
fn test_polyline_entering_rectangle() {
    let options = round_to_e(1);
    let (a, b) = ("# 0:0, 2:2 #", "# # 1:1, 1:3, 3:3, 3:1");
    expect_result(OpType::Union, &options, a, b, "# 0:0, 1:1 # 1:1, 1:3, 3:3, 3:1");
    expect_result(OpType::Intersection, &options, a, b, "# 1:1, 2:2 #");
    expect_result(OpType::Difference, &options, a, b, "# 0:0, 1:1 #");
}

#[test]
fn test_polygon_vertex_closed_polygon_vertex() {
    let options = Options::default().with_polygon_model(PolygonModel::Closed);
    let (a, b) = ("# # 0:0, 0:5, 1:5, 0:0, 2:5, 3:5", "# # 0:0, 5:3, 5:2");
    expect_result(OpType::Intersection, &options, a, b, "# # 0:0");
    expect_result(OpType::Difference, &options, a, b, "# # 0:0, 0:5, 1:5, 0:0, 2:5, 3:5");
    expect_result(OpType::Difference, &options, b, a, "# # 0:0, 5:3, 5:2");
}

#[test]
fn test_polygon_vertex_open_polygon_vertex() {
    let options = Options::default().with_polygon_model(PolygonModel::Open);
    let (a, b) = ("# # 0:0, 0:5, 1:5, 0:0, 2:5, 3:5", "# # 0:0, 5:3, 5:2");
    expect_result(OpType::Union, &options, a, b, "# # 0:0, 0:5, 1:5, 0:0, 2:5, 3:5, 0:0, 5:3, 5:2");
    expect_result(OpType::Intersection, &options, a, b, "# #");
}

#[test]
fn test_polygon_edge_polygon_edge_crossing() {
    let options = round_to_e(2);
    let (a, b) = ("# # 0:0, 0:2, 2:2, 2:0", "# # 1:1, 1:3, 3:3, 3:1");
    expect_result(OpType::Union, &options, a, b, "# # 0:0, 0:2, 1:2, 1:3, 3:3, 3:1, 2:1, 2:0");
    expect_result(OpType::Intersection, &options, a, b, "# # 1:1, 1:2, 2:2, 2:1");
    expect_result(OpType::Difference, &options, a, b, "# # 0:0, 0:2, 1:2, 1:1, 2:1, 2:0");
    expect_result(
        OpType::SymmetricDifference,
        &options,
        a,
        b,
        "# # 0:0, 0:2, 1:2, 1:1, 2:1, 2:0; 1:2, 1:3, 3:3, 3:1, 2:1, 2:2",
    );
}

// A rectangle and two triangles that each share one edge with it, one
// inside (same direction) and one outside (opposite direction).
const RECTANGLE: &str = "# # 0:0, 0:4, 2:4, 2:0";
const TRIANGLES: &str = "# # 0:0, 1:1, 2:0; 0:4, 1:5, 2:4";

#[test]
fn test_polygon_edge_open_polygon_edge_overlap() {
    let options = Options::default().with_polygon_model(PolygonModel::Open);
    let (a, b) = (RECTANGLE, TRIANGLES);
    expect_result(OpType::Union, &options, a, b, "# # 0:0, 0:4, 2:4, 2:0; 0:4, 1:5, 2:4");
    expect_result(OpType::Intersection, &options, a, b, "# # 0:0, 1:1, 2:0");
    expect_result(OpType::Difference, &options, a, b, "# # 0:0, 0:4, 2:4, 2:0, 1:1");
    expect_result(
        OpType::SymmetricDifference,
        &options,
        a,
        b,
        "# # 0:0, 0:4, 2:4, 2:0, 1:1; 0:4, 1:5, 2:4",
    );
}

#[test]
fn test_polygon_edge_semi_open_polygon_edge_overlap() {
    let options = Options::default().with_polygon_model(PolygonModel::SemiOpen);
    let (a, b) = (RECTANGLE, TRIANGLES);
    expect_result(OpType::Union, &options, a, b, "# # 0:0, 0:4, 1:5, 2:4, 2:0");
    expect_result(OpType::Intersection, &options, a, b, "# # 0:0, 1:1, 2:0");
    expect_result(OpType::Difference, &options, a, b, "# # 0:0, 0:4, 2:4, 2:0, 1:1");
}

#[test]
fn test_polygon_edge_closed_polygon_edge_overlap() {
    let options = Options::default().with_polygon_model(PolygonModel::Closed);
    let (a, b) = (RECTANGLE, TRIANGLES);
    expect_result(OpType::Union, &options, a, b, "# # 0:0, 0:4, 1:5, 2:4, 2:0");
    // The shared edge survives as a sibling pair.
    expect_result(OpType::Intersection, &options, a, b, "# # 0:0, 1:1, 2:0; 0:4, 2:4");
}

#[test]
fn test_polygon_polygon_interior() {
    let options = Options::default();
    let a = "# # 0:0, 0:4, 4:4, 4:0";
    let b = "# # 1:1, 1:2, 2:2, 2:1; 5:5, 5:6, 6:6, 6:5";
    expect_result(OpType::Union, &options, a, b, "# # 0:0, 0:4, 4:4, 4:0; 5:5, 5:6, 6:6, 6:5");
    expect_result(OpType::Intersection, &options, a, b, "# # 1:1, 1:2, 2:2, 2:1");
    expect_result(OpType::Difference, &options, a, b, "# # 0:0, 0:4, 4:4, 4:0; 2:1, 2:2, 1:2, 1:1");
    expect_result(
        OpType::SymmetricDifference,
        &options,
        a,
        b,
        "# # 0:0, 0:4, 4:4, 4:0; 2:1, 2:2, 1:2, 1:1; 5:5, 5:6, 6:6, 6:5",
    );
}

#[test]
fn test_difference_of_identical_regions_is_empty() {
    let options = Options::default();
    let a = "0:0 # 1:1, 2:2 # 0:0, 0:4, 4:4, 4:0";
    expect_result(OpType::Difference, &options, a, a, "# #");
    expect_result(OpType::SymmetricDifference, &options, a, a, "# #");
}

/// Loops of the polygon result, built with a lax polygon layer.
fn polygon_result(op: OpType, a: &str, b: &str) -> Vec<Vec<s2_boolean::Point>> {
    let (ra, rb) = (region(a), region(b));
    let mut loops = Vec::new();
    let layer = Box::new(LaxPolygonLayer::new(&mut loops));
    BooleanOperation::new(op, layer, Options::default()).build(&ra, &rb).unwrap();
    loops
}

const SHELL: &str = "# # 10:0, 10:10, 20:10";
const HOLE: &str = "# # 10:0, 20:10, 10:10";

#[test]
fn test_full_and_empty_results() {
    let full = vec![Vec::new()];
    assert_eq!(polygon_result(OpType::Union, "# #", "# # full"), full);
    assert_eq!(polygon_result(OpType::Union, "# # full", SHELL), full);
    assert_eq!(polygon_result(OpType::Union, HOLE, SHELL), full);
    assert!(polygon_result(OpType::Intersection, HOLE, SHELL).is_empty());
    assert!(polygon_result(OpType::Difference, SHELL, "# # full").is_empty());
    assert_eq!(polygon_result(OpType::Difference, "# # full", "# #"), full);
    assert_eq!(polygon_result(OpType::SymmetricDifference, HOLE, SHELL), full);
}

#[test]
fn test_is_empty_matches_full_results() {
    let options = Options::default();
    let (shell, hole, full) = (region(SHELL), region(HOLE), region("# # full"));
    assert!(!is_empty(OpType::Union, &hole, &shell, &options).unwrap());
    assert!(is_empty(OpType::Intersection, &hole, &shell, &options).unwrap());
    assert!(!is_empty(OpType::Intersection, &full, &full, &options).unwrap());
    assert!(is_empty(OpType::Difference, &shell, &full, &options).unwrap());
}

#[test]
fn test_three_layers_split_by_dimension() {
    let a = support::region("0:0 | 9:9 # 1:1, 1:5 # 0:0, 0:4, 4:4, 4:0");
    let b = support::region("# # 2:2, 2:3, 3:3, 3:2");
    let out = support::run(OpType::Union, &Options::default(), &a, &b).unwrap();
    // Shapes of one region never clip each other, and b lies inside a.
    assert_eq!(support::counts(&out), [2, 1, 4]);
    assert_eq!(out[0], vec!["0:0, 0:0".to_string(), "9:9, 9:9".to_string()]);
}

#[test]
fn test_budget_errors_abort_the_build() {
    let (a, b) = (region("# 0:0, 2:2 #"), region("# 2:0, 0:2 #"));
    let options = round_to_e(1).with_memory_budget(Some(8));
    let result = support::run(OpType::Union, &options, &a, &b);
    assert!(matches!(result, Err(BuildError::ResourceExhausted { .. })));
}
