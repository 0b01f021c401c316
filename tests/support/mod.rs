#![allow(dead_code)]

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use s2_boolean::boolean::{is_empty, BooleanOperation, OpType, Options};
use s2_boolean::builder::{
    DegenerateEdges, DuplicateEdges, EdgeType, EdgeVectorLayer, GraphOptions, Layer, SiblingPairs,
};
use s2_boolean::text_format::{parse_region, points_to_string};
use s2_boolean::{BuildError, LatLng, Point, Region, Shape};

pub fn ll(lat: f64, lng: f64) -> Point {
    LatLng::from_degrees(lat, lng).to_point()
}

pub fn region(text: &str) -> Region {
    parse_region(text).unwrap_or_else(|e| panic!("bad region {text:?}: {e}"))
}

/// Output options for dimension `d`. Polygon layers must drop excess
/// degeneracies, so their multiplicity is not checked.
pub fn layer_options(d: usize) -> GraphOptions {
    if d == 2 {
        GraphOptions::new(
            EdgeType::Directed,
            DegenerateEdges::DiscardExcess,
            DuplicateEdges::Keep,
            SiblingPairs::DiscardExcess,
        )
    } else {
        GraphOptions::new(EdgeType::Directed, DegenerateEdges::Keep, DuplicateEdges::Keep, SiblingPairs::Keep)
    }
}

pub fn edge_string(e: (Point, Point)) -> String {
    points_to_string(&[e.0, e.1])
}

/// Edges of each dimension, formatted and sorted.
pub type EdgeSets = [Vec<String>; 3];

pub fn region_edges(r: &Region) -> EdgeSets {
    let mut out: EdgeSets = Default::default();
    for shape in r.shapes() {
        let d = shape.dimension().index();
        out[d].extend(shape.edges().map(edge_string));
    }
    for v in &mut out {
        v.sort();
    }
    out
}

/// Run `op` with one edge layer per dimension.
pub fn run(op: OpType, options: &Options, a: &Region, b: &Region) -> Result<EdgeSets, BuildError> {
    let mut edges: [Vec<(Point, Point)>; 3] = Default::default();
    {
        let [e0, e1, e2] = &mut edges;
        let layers: [Box<dyn Layer + '_>; 3] = [
            Box::new(EdgeVectorLayer::new(layer_options(0), e0)),
            Box::new(EdgeVectorLayer::new(layer_options(1), e1)),
            Box::new(EdgeVectorLayer::new(layer_options(2), e2)),
        ];
        BooleanOperation::with_layers(op, layers, options.clone()).build(a, b)?;
    }
    let mut out: EdgeSets = Default::default();
    for (d, v) in edges.into_iter().enumerate() {
        out[d] = v.into_iter().map(edge_string).collect();
        out[d].sort();
    }
    Ok(out)
}

/// Check the edges of every dimension, and that `is_empty` agrees.
pub fn expect_result(op: OpType, options: &Options, a: &str, b: &str, expected: &str) {
    let (ra, rb, re) = (region(a), region(b), region(expected));
    let actual = run(op, options, &ra, &rb).unwrap_or_else(|e| panic!("{op} of {a:?} and {b:?} failed: {e}"));
    let want = region_edges(&re);
    for d in 0..3 {
        assert_eq!(
            actual[d], want[d],
            "{op} of {a:?} and {b:?}: dimension {d} differs from {expected:?}"
        );
    }
    let empty = is_empty(op, &ra, &rb, options).unwrap();
    assert_eq!(empty, re.is_empty(), "{op} of {a:?} and {b:?}: is_empty disagrees");
}

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// A point within `radius` degrees (in lat and lng) of `center`.
pub fn random_point_near<R: Rng + ?Sized>(rng: &mut R, center: (f64, f64), radius: f64) -> Point {
    ll(
        center.0 + rng.gen_range(-radius..radius),
        center.1 + rng.gen_range(-radius..radius),
    )
}

/// A counter-clockwise star-shaped loop around `center`.
pub fn random_loop<R: Rng + ?Sized>(rng: &mut R, center: (f64, f64), radius: f64, n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * (i as f64 + rng.gen_range(0.1..0.9)) / n as f64;
            let r = radius * rng.gen_range(0.5..1.0);
            ll(center.0 + r * angle.sin(), center.1 + r * angle.cos())
        })
        .collect()
}

pub fn random_polyline<R: Rng + ?Sized>(rng: &mut R, center: (f64, f64), radius: f64, n: usize) -> Vec<Point> {
    (0..n).map(|_| random_point_near(rng, center, radius)).collect()
}

/// A region with one polygon, one polyline and a few points near `center`.
pub fn random_region(seed: u64, center: (f64, f64)) -> Region {
    let mut rng = rng(seed);
    let mut r = Region::new();
    r.add(Shape::points((0..3).map(|_| random_point_near(&mut rng, center, 3.0)).collect()));
    r.add(Shape::polyline(random_polyline(&mut rng, center, 3.0, 4)));
    r.add(Shape::polygon(vec![random_loop(&mut rng, center, 2.0, 6)]));
    r
}

pub fn random_polygon_region(seed: u64, center: (f64, f64)) -> Region {
    let mut rng = rng(seed);
    Region::from_shapes(vec![Shape::polygon(vec![random_loop(&mut rng, center, 2.0, 8)])])
}

/// Number of edges of each dimension in `sets`.
pub fn counts(sets: &EdgeSets) -> [usize; 3] {
    [sets[0].len(), sets[1].len(), sets[2].len()]
}
