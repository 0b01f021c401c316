//! Edge primitives: crossings, intersection points, projection, turning
//! angles and loop areas.

use super::exact::ExactVec3;
use super::interval::remainder;
use super::predicates::{ordered_ccw, sign, DBL_ERR};
use crate::types::Point;
use std::f64::consts::PI;

/// Maximum angular error of [`intersection`], in radians.
pub const INTERSECTION_ERROR: f64 = 8.0 * DBL_ERR;

/// Distance within which two computed intersection points are considered
/// the same point.
pub const INTERSECTION_MERGE_RADIUS: f64 = 2.0 * INTERSECTION_ERROR;

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// A unit vector orthogonal to `a`, stable under small perturbations of `a`.
pub fn ortho(a: Point) -> Point {
    let mut k = a.largest_abs_component() as isize - 1;
    if k < 0 {
        k = 2;
    }
    let mut temp = Point::new(0.012, 0.0053, 0.00457);
    temp.set(k as usize, 1.0);
    a.cross(temp).normalize()
}

/// A vector parallel to `a × b` that stays accurate when `a` and `b` are
/// nearly equal. Returns `ortho(a)` when the cross product is exactly zero.
pub fn robust_cross_prod(a: Point, b: Point) -> Point {
    let x = (b + a).cross(b - a);
    if x != Point::new(0.0, 0.0, 0.0) {
        return x;
    }
    ortho(a)
}

/// Whether edge `ab` crosses edge `cd`.
///
/// Returns +1 if they cross at a point interior to both, 0 if any vertex of
/// one edge equals a vertex of the other, and -1 otherwise (including when
/// either edge is degenerate).
pub fn crossing_sign(a: Point, b: Point, c: Point, d: Point) -> i32 {
    if c == a || c == b || d == a || d == b {
        return 0;
    }
    if a == b || c == d {
        return -1;
    }
    let acb = -sign(a, b, c);
    let bda = sign(a, b, d);
    if acb != bda {
        return -1;
    }
    let cbd = -sign(c, d, b);
    if cbd != acb {
        return -1;
    }
    let dac = sign(c, d, a);
    if dac != acb {
        -1
    } else {
        1
    }
}

/// Crossing test for edges that share a vertex, consistent with the
/// semi-open boundary model: a shared vertex counts as a crossing iff it
/// changes the containment of the reference direction.
pub fn vertex_crossing(a: Point, b: Point, c: Point, d: Point) -> bool {
    if a == b || c == d {
        return false;
    }
    if a == c {
        return b == d || ordered_ccw(ortho(a), d, b, a);
    }
    if b == d {
        return ordered_ccw(ortho(b), c, a, b);
    }
    if a == d {
        return b == c || ordered_ccw(ortho(a), c, b, a);
    }
    if b == c {
        return ordered_ccw(ortho(b), d, a, b);
    }
    false
}

/// Crossing test that counts shared vertices per [`vertex_crossing`].
pub fn edge_or_vertex_crossing(a: Point, b: Point, c: Point, d: Point) -> bool {
    let s = crossing_sign(a, b, c, d);
    if s < 0 {
        return false;
    }
    if s > 0 {
        return true;
    }
    vertex_crossing(a, b, c, d)
}

/// Intersection point of two crossing edges, within [`INTERSECTION_ERROR`]
/// of the true intersection. The result does not depend on the order of the
/// edges or of their endpoints.
pub fn intersection(a0: Point, a1: Point, b0: Point, b1: Point) -> Point {
    let mut x = intersection_stable(a0, a1, b0, b1)
        .unwrap_or_else(|| intersection_exact(a0, a1, b0, b1));
    if x.dot((a0 + a1) + (b0 + b1)) < 0.0 {
        x = -x;
    }
    x
}

/// Total order on edges that ignores endpoint order.
fn edge_less(a0: Point, a1: Point, b0: Point, b1: Point) -> bool {
    let (pa0, pa1) = if a0 >= a1 { (a1, a0) } else { (a0, a1) };
    let (pb0, pb1) = if b0 >= b1 { (b1, b0) } else { (b0, b1) };
    pa0 < pb0 || (pa0 == pb0 && pa1 < pb1)
}

fn intersection_stable(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    // The longer edge supplies the plane, the shorter one is interpolated.
    let a_len2 = (a1 - a0).norm2();
    let b_len2 = (b1 - b0).norm2();
    if a_len2 < b_len2 || (a_len2 == b_len2 && edge_less(a0, a1, b0, b1)) {
        intersection_stable_sorted(b0, b1, a0, a1)
    } else {
        intersection_stable_sorted(a0, a1, b0, b1)
    }
}

/// Signed distance of `x` from the plane of `(a0, a1)`, scaled by the norm
/// length, with its error bound.
fn projection(x: Point, a_norm: Point, a_norm_len: f64, a0: Point, a1: Point) -> (f64, f64) {
    let x0 = x - a0;
    let x1 = x - a1;
    let x0_dist2 = x0.norm2();
    let x1_dist2 = x1.norm2();
    let (dist, result) = if x0_dist2 < x1_dist2 || (x0_dist2 == x1_dist2 && x0 < x1) {
        (x0_dist2.sqrt(), x0.dot(a_norm))
    } else {
        (x1_dist2.sqrt(), x1.dot(a_norm))
    };
    let error = (((3.5 + 2.0 * SQRT3) * a_norm_len + 32.0 * SQRT3 * DBL_ERR) * dist
        + 1.5 * result.abs())
        * DBL_ERR;
    (result, error)
}

fn intersection_stable_sorted(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    let a_norm = (a0 - a1).cross(a0 + a1);
    let a_norm_len = a_norm.norm();
    let b_len = (b1 - b0).norm();
    let (b0_dist, b0_error) = projection(b0, a_norm, a_norm_len, a0, a1);
    let (b1_dist, b1_error) = projection(b1, a_norm, a_norm_len, a0, a1);
    let dist_sum = (b0_dist - b1_dist).abs();
    let error_sum = b0_error + b1_error;
    if dist_sum <= error_sum {
        return None;
    }
    let x = b1 * b0_dist - b0 * b1_dist;
    let err = b_len * (b0_dist * b1_error - b1_dist * b0_error).abs() / (dist_sum - error_sum)
        + 2.0 * DBL_ERR * dist_sum;
    let x_len2 = x.norm2();
    if x_len2 < f64::MIN_POSITIVE {
        return None;
    }
    let x_len = x_len2.sqrt();
    if err > (INTERSECTION_ERROR - DBL_ERR) * x_len {
        return None;
    }
    Some(x * (1.0 / x_len))
}

fn intersection_exact(a0: Point, a1: Point, b0: Point, b1: Point) -> Point {
    let a_norm = ExactVec3::from_point(a0).cross(&ExactVec3::from_point(a1));
    let b_norm = ExactVec3::from_point(b0).cross(&ExactVec3::from_point(b1));
    let x = a_norm.cross(&b_norm);
    if !x.is_zero() {
        return x.to_point_normalized();
    }
    // Exactly collinear edges: of the endpoints lying inside the other edge,
    // return the lexicographically smallest.
    let a_norm = a_norm.to_point_normalized();
    let b_norm = b_norm.to_point_normalized();
    let mut best: Option<Point> = None;
    let mut consider = |p: Point, inside: bool| {
        if inside && best.map_or(true, |b| p < b) {
            best = Some(p);
        }
    };
    consider(a0, ordered_ccw(b0, a0, b1, b_norm));
    consider(a1, ordered_ccw(b0, a1, b1, b_norm));
    consider(b0, ordered_ccw(a0, b0, a1, a_norm));
    consider(b1, ordered_ccw(a0, b1, a1, a_norm));
    best.unwrap_or(a0)
}

#[inline]
fn simple_ccw(a: Point, b: Point, c: Point) -> bool {
    c.cross(a).dot(b) > 0.0
}

/// Closest point to `x` on edge `ab`, where `a_cross_b` is a (not
/// necessarily unit) normal of the edge.
pub fn project(x: Point, a: Point, b: Point, a_cross_b: Point) -> Point {
    let p = x - a_cross_b * (x.dot(a_cross_b) / a_cross_b.norm2());
    if simple_ccw(a_cross_b, a, p) && simple_ccw(p, b, a_cross_b) {
        return p.normalize();
    }
    if (x - a).norm2() <= (x - b).norm2() {
        a
    } else {
        b
    }
}

/// Angular distance from `x` to the edge `ab`, in radians.
pub fn distance_to_edge(x: Point, a: Point, b: Point) -> f64 {
    if a == b {
        return x.angle(a);
    }
    x.angle(project(x, a, b, robust_cross_prod(a, b)))
}

/// True if every point of edge `b` is within `tolerance` radians of edge
/// `a`. `tolerance` must be in `(0, π/2)`.
pub fn is_edge_b_near_edge_a(a0: Point, a1: Point, b0: Point, b1: Point, tolerance: f64) -> bool {
    let mut a_ortho = robust_cross_prod(a0, a1).normalize();
    let a_nearest_b0 = project(b0, a0, a1, a_ortho);
    let a_nearest_b1 = project(b1, a0, a1, a_ortho);
    // Orient the normal along the projected direction of b so that
    // antiparallel edges are handled.
    if sign(a_ortho, a_nearest_b0, a_nearest_b1) < 0 {
        a_ortho = -a_ortho;
    }
    if b0.angle(a_nearest_b0) > tolerance || b1.angle(a_nearest_b1) > tolerance {
        return false;
    }
    let b_ortho = robust_cross_prod(b0, b1).normalize();
    let planar_angle = a_ortho.angle(b_ortho);
    if planar_angle <= tolerance {
        return true;
    }
    if planar_angle >= PI - 0.01 {
        return (b0.angle(a0) < b0.angle(a1)) == (b1.angle(a0) < b1.angle(a1));
    }
    // The two points of circ(b) farthest from circ(a); b is near a iff
    // neither lies on b.
    let furthest = (a_ortho - b_ortho * a_ortho.dot(b_ortho)).normalize();
    let furthest_inv = -furthest;
    let on_b = |p: Point| sign(b_ortho, b0, p) > 0 && sign(p, b1, b_ortho) > 0;
    !(on_b(furthest) || on_b(furthest_inv))
}

/// Exterior angle at `b` of the path `a → b → c`: positive for left turns.
pub fn turn_angle(a: Point, b: Point, c: Point) -> f64 {
    let angle = robust_cross_prod(a, b).angle(robust_cross_prod(b, c));
    if sign(a, b, c) > 0 {
        angle
    } else {
        -angle
    }
}

/// Remove `AA` and `ABA` degeneracies from a loop. Returns an empty vector if
/// the loop is entirely degenerate.
pub fn prune_degeneracies(lp: &[Point]) -> Vec<Point> {
    let mut v: Vec<Point> = Vec::with_capacity(lp.len());
    for &p in lp {
        if v.last() == Some(&p) {
            continue;
        }
        if v.len() >= 2 && v[v.len() - 2] == p {
            v.pop();
            continue;
        }
        v.push(p);
    }
    if v.len() < 3 {
        return Vec::new();
    }
    if v[0] == v[v.len() - 1] {
        v.pop();
    }
    let mut k = 0;
    while k + 1 < v.len() - 1 - k && v[k + 1] == v[v.len() - 1 - k] {
        k += 1;
    }
    v[k..v.len() - k].to_vec()
}

/// Signed area of a loop in steradians, in `(-2π, 2π]`. Counter-clockwise
/// loops are positive. An empty loop is the full sphere (area 4π); a loop
/// that is entirely degenerate has area 0.
pub fn loop_signed_area(lp: &[Point]) -> f64 {
    if lp.is_empty() {
        return 4.0 * PI;
    }
    let v = prune_degeneracies(lp);
    if v.is_empty() {
        return 0.0;
    }
    let n = v.len();
    let turning: f64 = (0..n)
        .map(|i| turn_angle(v[(i + n - 1) % n], v[i], v[(i + 1) % n]))
        .sum();
    remainder(2.0 * PI - turning, 4.0 * PI)
}

/// Spherical interpolation with `t` in `[0, 1]` along the chord.
pub fn interpolate(a: Point, b: Point, t: f64) -> Point {
    (a * (1.0 - t) + b * t).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;
    use approx::assert_relative_eq;

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    #[test]
    fn test_crossing_sign_cases() {
        let (a, b) = (ll(0.0, 0.0), ll(2.0, 2.0));
        let (c, d) = (ll(2.0, 0.0), ll(0.0, 2.0));
        assert_eq!(crossing_sign(a, b, c, d), 1);
        assert_eq!(crossing_sign(c, d, a, b), 1);
        assert_eq!(crossing_sign(a, b, a, d), 0);
        assert_eq!(crossing_sign(a, c, b, d), -1);
        assert_eq!(crossing_sign(a, a, c, d), -1);
    }

    #[test]
    fn test_vertex_crossing_counts_one_order() {
        // Two edges sharing an endpoint: exactly one of the two argument
        // orders counts the shared vertex as a crossing.
        let a = ll(0.0, 0.0);
        let b = ll(1.0, 0.0);
        let c = ll(0.0, 1.0);
        assert_ne!(vertex_crossing(a, b, a, c), vertex_crossing(a, c, a, b));
        assert!(vertex_crossing(a, b, a, b));
        assert!(!vertex_crossing(a, a, a, b));
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let (a0, a1) = (ll(0.0, 0.0), ll(2.0, 2.0));
        let (b0, b1) = (ll(2.0, 0.0), ll(0.0, 2.0));
        let x = intersection(a0, a1, b0, b1);
        assert!(x.is_unit_length());
        let y = intersection(b1, b0, a1, a0);
        assert!(x.angle(y) <= 2.0 * INTERSECTION_ERROR);
        let target = ll(1.0, 1.0);
        assert!(x.angle(target) < 1e-4);
    }

    #[test]
    fn test_intersection_of_nearly_parallel_edges() {
        let a0 = ll(0.0, 0.0);
        let a1 = ll(0.0, 10.0);
        let b0 = ll(-1e-12, 1.0);
        let b1 = ll(1e-12, 9.0);
        assert_eq!(crossing_sign(a0, a1, b0, b1), 1);
        let x = intersection(a0, a1, b0, b1);
        assert!(distance_to_edge(x, a0, a1) <= 1e-14);
        assert!(distance_to_edge(x, b0, b1) <= 1e-14);
    }

    #[test]
    fn test_project_clamps_to_endpoints() {
        let a = ll(0.0, 0.0);
        let b = ll(0.0, 10.0);
        let n = robust_cross_prod(a, b);
        let p = project(ll(1.0, 5.0), a, b, n);
        assert_relative_eq!(LatLng::from_point(p).lat_degrees(), 0.0, epsilon = 1e-12);
        assert_eq!(project(ll(1.0, 20.0), a, b, n), b);
        assert_eq!(project(ll(1.0, -5.0), a, b, n), a);
    }

    #[test]
    fn test_edge_near_edge() {
        let a0 = ll(0.0, 0.0);
        let a1 = ll(0.0, 10.0);
        let tol = 0.5f64.to_radians();
        assert!(is_edge_b_near_edge_a(a0, a1, ll(0.1, 1.0), ll(0.1, 9.0), tol));
        assert!(is_edge_b_near_edge_a(a0, a1, ll(0.1, 9.0), ll(0.1, 1.0), tol));
        assert!(!is_edge_b_near_edge_a(a0, a1, ll(0.1, 1.0), ll(1.0, 9.0), tol));
        assert!(!is_edge_b_near_edge_a(a0, a1, ll(0.0, 1.0), ll(0.0, 12.0), tol));
    }

    #[test]
    fn test_loop_area() {
        let ccw = [ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 0.0)];
        let area = loop_signed_area(&ccw);
        assert!(area > 0.0 && area < 1e-3);
        let cw = [ccw[2], ccw[1], ccw[0]];
        assert_relative_eq!(loop_signed_area(&cw), -area, epsilon = 1e-12);
        assert_eq!(loop_signed_area(&[]), 4.0 * PI);
        assert_eq!(loop_signed_area(&[ccw[0], ccw[1]]), 0.0);
    }

    #[test]
    fn test_prune_degeneracies() {
        let (a, b, c, d) = (ll(0.0, 0.0), ll(0.0, 1.0), ll(1.0, 0.0), ll(5.0, 5.0));
        assert_eq!(prune_degeneracies(&[a, b, c, c, d, c]), vec![a, b, c]);
        assert!(prune_degeneracies(&[a, b, a]).is_empty());
        assert_eq!(prune_degeneracies(&[d, a, b, c, a]), vec![a, b, c]);
    }
}
