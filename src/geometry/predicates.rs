//! Robust geometric predicates on the unit sphere.
//!
//! Every predicate runs in stages: a fast `f64` evaluation with a rigorous
//! error bound (triage), then an exact evaluation with [`Expansion`]s, and
//! finally symbolic perturbation where the exact answer is a tie. The result
//! is always consistent as if the inputs were exactly on the sphere.
//!
//! Error constants are expressed in terms of `DBL_ERR`, the rounding error of
//! a single `f64` operation (half an ulp of 1.0).

use super::chord_angle::ChordAngle;
use super::exact::{ExactVec3, Expansion};
use crate::types::Point;
use std::f64::consts::FRAC_1_SQRT_2;

pub(crate) const DBL_ERR: f64 = f64::EPSILON * 0.5;

/// Squared chord length of 45 degrees.
const LENGTH2_45_DEGREES: f64 = 2.0 - std::f64::consts::SQRT_2;

const SQRT3: f64 = 1.732_050_807_568_877_2;

#[inline]
fn sgn(x: f64) -> i32 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

#[inline]
fn ex(p: Point) -> ExactVec3 {
    ExactVec3::from_point(p)
}

#[inline]
fn xf(v: f64) -> Expansion {
    Expansion::from_f64(v)
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Orientation of the triangle `(a, b, c)`: +1 counter-clockwise, -1
/// clockwise. Returns 0 only if two of the points are equal; collinear
/// distinct points get a consistent nonzero answer from symbolic
/// perturbation.
///
/// `sign(a, b, c) == -sign(c, b, a)` and the value is invariant under
/// rotation of the arguments.
pub fn sign(a: Point, b: Point, c: Point) -> i32 {
    let s = triage_sign(a, b, c);
    if s != 0 {
        return s;
    }
    expensive_sign(a, b, c, true)
}

/// Like [`sign`], but returns 0 for exactly collinear points.
pub fn unperturbed_sign(a: Point, b: Point, c: Point) -> i32 {
    let s = triage_sign(a, b, c);
    if s != 0 {
        return s;
    }
    expensive_sign(a, b, c, false)
}

#[inline]
fn triage_sign(a: Point, b: Point, c: Point) -> i32 {
    const MAX_DET_ERROR: f64 = 1.8274 * f64::EPSILON;
    let det = a.cross(b).dot(c);
    if det > MAX_DET_ERROR {
        1
    } else if det < -MAX_DET_ERROR {
        -1
    } else {
        0
    }
}

fn expensive_sign(a: Point, b: Point, c: Point, perturb: bool) -> i32 {
    if a == b || b == c || c == a {
        return 0;
    }
    let s = stable_sign(a, b, c);
    if s != 0 {
        return s;
    }
    exact_sign(a, b, c, perturb)
}

/// Orientation computed from the two shortest edges of the triangle, which
/// is much more accurate than `(a x b) . c` for small triangles.
fn stable_sign(a: Point, b: Point, c: Point) -> i32 {
    const DET_ERROR_MULTIPLIER: f64 = 3.2321 * f64::EPSILON;
    let ab = b - a;
    let bc = c - b;
    let ca = a - c;
    let ab2 = ab.norm2();
    let bc2 = bc.norm2();
    let ca2 = ca.norm2();
    let (det, max_error) = if ab2 >= bc2 && ab2 >= ca2 {
        (-(ca.cross(bc).dot(c)), DET_ERROR_MULTIPLIER * (ca2 * bc2).sqrt())
    } else if bc2 >= ca2 {
        (-(ab.cross(ca).dot(a)), DET_ERROR_MULTIPLIER * (ab2 * ca2).sqrt())
    } else {
        (-(bc.cross(ab).dot(b)), DET_ERROR_MULTIPLIER * (bc2 * ab2).sqrt())
    };
    if det.abs() <= max_error {
        0
    } else {
        sgn(det)
    }
}

fn exact_sign(a: Point, b: Point, c: Point, perturb: bool) -> i32 {
    let (mut pa, mut pb, mut pc) = (a, b, c);
    let mut perm_sign = 1;
    if pa > pb {
        std::mem::swap(&mut pa, &mut pb);
        perm_sign = -perm_sign;
    }
    if pb > pc {
        std::mem::swap(&mut pb, &mut pc);
        perm_sign = -perm_sign;
    }
    if pa > pb {
        std::mem::swap(&mut pa, &mut pb);
        perm_sign = -perm_sign;
    }
    let xa = ex(pa);
    let xb = ex(pb);
    let xc = ex(pc);
    let xb_cross_xc = xb.cross(&xc);
    let mut det_sign = xa.dot(&xb_cross_xc).sign();
    if det_sign == 0 && perturb {
        det_sign = symbolically_perturbed_sign(&xa, &xb, &xc, &xb_cross_xc);
    }
    perm_sign * det_sign
}

/// Sign of the determinant after perturbing each point by an infinitesimal
/// amount that decreases with its lexicographic rank. Requires `a < b < c`.
fn symbolically_perturbed_sign(
    a: &ExactVec3,
    b: &ExactVec3,
    c: &ExactVec3,
    b_cross_c: &ExactVec3,
) -> i32 {
    let terms = [
        b_cross_c.z.sign(),
        b_cross_c.y.sign(),
        b_cross_c.x.sign(),
        c.x.mul(&a.y).sub(&c.y.mul(&a.x)).sign(),
        c.x.sign(),
        -c.y.sign(),
        c.z.mul(&a.x).sub(&c.x.mul(&a.z)).sign(),
        c.z.sign(),
        a.x.mul(&b.y).sub(&a.y.mul(&b.x)).sign(),
        -b.x.sign(),
        b.y.sign(),
        a.x.sign(),
    ];
    terms.into_iter().find(|&s| s != 0).unwrap_or(1)
}

/// True if the edges `OA`, `OB`, `OC` are encountered in that order while
/// sweeping counter-clockwise around `o`.
///
/// Returns true if `a == b` or `b == c`, false if `a == c` (and they differ
/// from `b`).
pub fn ordered_ccw(a: Point, b: Point, c: Point, o: Point) -> bool {
    let mut sum = 0;
    if sign(b, o, a) >= 0 {
        sum += 1;
    }
    if sign(c, o, b) >= 0 {
        sum += 1;
    }
    if sign(a, o, c) > 0 {
        sum += 1;
    }
    sum >= 2
}

// ---------------------------------------------------------------------------
// Point distances
// ---------------------------------------------------------------------------

#[inline]
fn cos_distance(x: Point, y: Point) -> (f64, f64) {
    let c = x.dot(y);
    (c, 9.5 * DBL_ERR * c.abs() + 1.5 * DBL_ERR)
}

#[inline]
fn sin2_distance(x: Point, y: Point) -> (f64, f64) {
    let n = (x - y).cross(x + y);
    let d2 = 0.25 * n.norm2();
    let err = (21.0 + 4.0 * SQRT3) * DBL_ERR * d2
        + 32.0 * SQRT3 * DBL_ERR * DBL_ERR * d2.sqrt()
        + 768.0 * DBL_ERR * DBL_ERR * DBL_ERR * DBL_ERR;
    (d2, err)
}

/// Compare `distance(x, a)` with `distance(x, b)`: -1 if `a` is closer, +1
/// if `b` is closer. Returns 0 only if `a == b`; ties between distinct
/// points are broken by lexicographic order (the smaller point is farther).
pub fn compare_distances(x: Point, a: Point, b: Point) -> i32 {
    let s = triage_compare_cos_distances(x, a, b);
    if s != 0 {
        return s;
    }
    if a == b {
        return 0;
    }
    let cos_ax = a.dot(x);
    let s = if cos_ax > FRAC_1_SQRT_2 {
        triage_compare_sin2_distances(x, a, b)
    } else if cos_ax < -FRAC_1_SQRT_2 {
        -triage_compare_sin2_distances(x, a, b)
    } else {
        0
    };
    if s != 0 {
        return s;
    }
    let s = exact_compare_distances(&ex(x), &ex(a), &ex(b));
    if s != 0 {
        return s;
    }
    if a < b {
        1
    } else if a > b {
        -1
    } else {
        0
    }
}

fn triage_compare_cos_distances(x: Point, a: Point, b: Point) -> i32 {
    let (cos_ax, ea) = cos_distance(a, x);
    let (cos_bx, eb) = cos_distance(b, x);
    let diff = cos_ax - cos_bx;
    let err = ea + eb;
    if diff > err {
        -1
    } else if diff < -err {
        1
    } else {
        0
    }
}

fn triage_compare_sin2_distances(x: Point, a: Point, b: Point) -> i32 {
    let (sin2_ax, ea) = sin2_distance(a, x);
    let (sin2_bx, eb) = sin2_distance(b, x);
    let diff = sin2_ax - sin2_bx;
    let err = ea + eb;
    if diff > err {
        1
    } else if diff < -err {
        -1
    } else {
        0
    }
}

fn exact_compare_distances(x: &ExactVec3, a: &ExactVec3, b: &ExactVec3) -> i32 {
    let cos_ax = x.dot(a);
    let cos_bx = x.dot(b);
    let a_sign = cos_ax.sign();
    let b_sign = cos_bx.sign();
    if a_sign != b_sign {
        return if a_sign > b_sign { -1 } else { 1 };
    }
    let cmp = cos_bx
        .mul(&cos_bx)
        .mul(&a.norm2())
        .sub(&cos_ax.mul(&cos_ax).mul(&b.norm2()));
    a_sign * cmp.sign()
}

/// Compare `distance(x, y)` against `r`: -1 if less, 0 if equal, +1 if
/// greater (no symbolic perturbation).
pub fn compare_distance(x: Point, y: Point, r: ChordAngle) -> i32 {
    let r2 = r.length2();
    let s = triage_compare_cos_distance(x, y, r2);
    if s != 0 {
        return s;
    }
    if r2 < LENGTH2_45_DEGREES {
        let s = triage_compare_sin2_distance(x, y, r2);
        if s != 0 {
            return s;
        }
    }
    exact_compare_distance(&ex(x), &ex(y), r2)
}

fn triage_compare_cos_distance(x: Point, y: Point, r2: f64) -> i32 {
    let (cos_xy, cos_xy_err) = cos_distance(x, y);
    let cos_r = 1.0 - 0.5 * r2;
    let cos_r_err = 2.0 * DBL_ERR * cos_r;
    let diff = cos_xy - cos_r;
    let err = cos_xy_err + cos_r_err;
    if diff > err {
        -1
    } else if diff < -err {
        1
    } else {
        0
    }
}

fn triage_compare_sin2_distance(x: Point, y: Point, r2: f64) -> i32 {
    let (sin2_xy, sin2_xy_err) = sin2_distance(x, y);
    let sin2_r = r2 * (1.0 - 0.25 * r2);
    let sin2_r_err = 3.0 * DBL_ERR * sin2_r;
    let diff = sin2_xy - sin2_r;
    let err = sin2_xy_err + sin2_r_err;
    if diff > err {
        1
    } else if diff < -err {
        -1
    } else {
        0
    }
}

fn triage_compare_distance(x: Point, y: Point, r2: f64) -> i32 {
    let s = triage_compare_cos_distance(x, y, r2);
    if s == 0 && r2 < LENGTH2_45_DEGREES {
        return triage_compare_sin2_distance(x, y, r2);
    }
    s
}

/// `1 - 0.5 * r2`, exactly.
fn exact_cos_r(r2: f64) -> Expansion {
    xf(1.0).sub(&xf(0.5 * r2))
}

/// `r2 * (1 - 0.25 * r2)`, exactly.
fn exact_sin2_r(r2: f64) -> Expansion {
    xf(1.0).sub(&xf(0.25 * r2)).scale(r2)
}

fn exact_compare_distance(x: &ExactVec3, y: &ExactVec3, r2: f64) -> i32 {
    let cos_xy = x.dot(y);
    let cos_r = exact_cos_r(r2);
    let xy_sign = cos_xy.sign();
    let r_sign = cos_r.sign();
    if xy_sign != r_sign {
        return if xy_sign > r_sign { -1 } else { 1 };
    }
    let cmp = cos_r
        .mul(&cos_r)
        .mul(&x.norm2())
        .mul(&y.norm2())
        .sub(&cos_xy.mul(&cos_xy));
    xy_sign * cmp.sign()
}

// ---------------------------------------------------------------------------
// Edge distances
// ---------------------------------------------------------------------------

/// The endpoint of `(a0, a1)` closest to `x`, with its squared chord
/// distance. Ties go to the lexicographically smaller endpoint.
fn closest_vertex(x: Point, a0: Point, a1: Point) -> (Point, f64) {
    let a0x2 = (a0 - x).norm2();
    let a1x2 = (a1 - x).norm2();
    if a0x2 < a1x2 || (a0x2 == a1x2 && a0 < a1) {
        (a0, a0x2)
    } else {
        (a1, a1x2)
    }
}

/// Compare the minimum distance from `x` to the edge `(a0, a1)` against
/// `r`: -1 if less, 0 if equal, +1 if greater. The edge must not be
/// antipodal.
pub fn compare_edge_distance(x: Point, a0: Point, a1: Point, r: ChordAngle) -> i32 {
    let s = triage_compare_edge_distance(x, a0, a1, r.length2());
    if s != 0 {
        return s;
    }
    if a0 == a1 {
        return compare_distance(x, a0, r);
    }
    exact_compare_edge_distance(x, a0, a1, r)
}

fn triage_compare_edge_distance(x: Point, a0: Point, a1: Point, r2: f64) -> i32 {
    let n = (a0 - a1).cross(a0 + a1);
    let m = n.cross(x);
    let a0_dir = a0 - x;
    let a1_dir = a1 - x;
    let a0_sign = a0_dir.dot(m);
    let a1_sign = a1_dir.dot(m);
    let n2 = n.norm2();
    let n1 = n2.sqrt();
    let n1_error = ((3.5 + 8.0 / SQRT3) * n1 + 32.0 * SQRT3 * DBL_ERR) * DBL_ERR;
    let a0_sign_error = n1_error * a0_dir.norm();
    let a1_sign_error = n1_error * a1_dir.norm();
    let vertex_sign =
        || triage_compare_distance(x, a0, r2).min(triage_compare_distance(x, a1, r2));
    if a0_sign.abs() < a0_sign_error || a1_sign.abs() < a1_sign_error {
        let v = vertex_sign();
        let l = triage_compare_line_distance(x, a0, a1, r2, n, n1, n2);
        return if v == l { l } else { 0 };
    }
    if a0_sign >= 0.0 || a1_sign <= 0.0 {
        vertex_sign()
    } else {
        triage_compare_line_distance(x, a0, a1, r2, n, n1, n2)
    }
}

fn triage_compare_line_distance(
    x: Point,
    a0: Point,
    a1: Point,
    r2: f64,
    n: Point,
    n1: f64,
    n2: f64,
) -> i32 {
    // The distance to an edge interior is always below 90 degrees.
    if r2 >= 2.0 {
        return -1;
    }
    if r2 < LENGTH2_45_DEGREES {
        triage_compare_line_sin2_distance(x, a0, a1, r2, n, n1, n2)
    } else {
        triage_compare_line_cos2_distance(x, r2, n, n1, n2)
    }
}

fn triage_compare_line_sin2_distance(
    x: Point,
    a0: Point,
    a1: Point,
    r2: f64,
    n: Point,
    n1: f64,
    n2: f64,
) -> i32 {
    let n2sin2_r = n2 * r2 * (1.0 - 0.25 * r2);
    let mut n2sin2_r_error = 6.0 * DBL_ERR * n2sin2_r;
    let (closest, ax2) = closest_vertex(x, a0, a1);
    let x_dn = (x - closest).dot(n);
    let x_dn2 = x_dn * x_dn;
    let c1 = ((3.5 + 2.0 * SQRT3) * n1 + 32.0 * SQRT3 * DBL_ERR) * DBL_ERR * ax2.sqrt();
    let x_dn2_error = 4.0 * DBL_ERR * x_dn2 + (2.0 * x_dn.abs() + c1) * c1;
    n2sin2_r_error += 8.0 * DBL_ERR * n2sin2_r;
    let diff = x_dn2 - n2sin2_r;
    let err = x_dn2_error + n2sin2_r_error;
    if diff > err {
        1
    } else if diff < -err {
        -1
    } else {
        0
    }
}

fn triage_compare_line_cos2_distance(x: Point, r2: f64, n: Point, n1: f64, n2: f64) -> i32 {
    let cos_r = 1.0 - 0.5 * r2;
    let n2cos2_r = n2 * cos_r * cos_r;
    let mut n2cos2_r_error = 7.0 * DBL_ERR * n2cos2_r;
    // |x × n| is the cosine of the distance, scaled by |n|.
    let m2 = x.cross(n).norm2();
    let m1 = m2.sqrt();
    let m1_error = ((1.0 + 8.0 / SQRT3) * n1 + 32.0 * SQRT3 * DBL_ERR) * DBL_ERR;
    let m2_error = 3.0 * DBL_ERR * m2 + (2.0 * m1 + m1_error) * m1_error;
    n2cos2_r_error += 8.0 * DBL_ERR * n2cos2_r;
    let diff = m2 - n2cos2_r;
    let err = m2_error + n2cos2_r_error;
    if diff > err {
        -1
    } else if diff < -err {
        1
    } else {
        0
    }
}

fn exact_compare_edge_distance(x: Point, a0: Point, a1: Point, r: ChordAngle) -> i32 {
    if compare_edge_directions(a0, a1, a0, x) > 0 && compare_edge_directions(a0, a1, x, a1) > 0 {
        exact_compare_line_distance(&ex(x), &ex(a0), &ex(a1), r.length2())
    } else {
        compare_distance(x, a0, r).min(compare_distance(x, a1, r))
    }
}

fn exact_compare_line_distance(x: &ExactVec3, a0: &ExactVec3, a1: &ExactVec3, r2: f64) -> i32 {
    if r2 >= 2.0 {
        return -1;
    }
    let n = a0.cross(a1);
    let sin_d = x.dot(&n);
    let cmp = sin_d
        .mul(&sin_d)
        .sub(&exact_sin2_r(r2).mul(&x.norm2()).mul(&n.norm2()));
    cmp.sign()
}

/// Sign of the dot product of the normals of edges `a` and `b`: +1 if the
/// edges point in similar directions, -1 if opposite, 0 if perpendicular or
/// degenerate.
pub fn compare_edge_directions(a0: Point, a1: Point, b0: Point, b1: Point) -> i32 {
    let s = triage_compare_edge_directions(a0, a1, b0, b1);
    if s != 0 {
        return s;
    }
    if a0 == a1 || b0 == b1 {
        return 0;
    }
    ex(a0).cross(&ex(a1)).dot(&ex(b0).cross(&ex(b1))).sign()
}

fn triage_compare_edge_directions(a0: Point, a1: Point, b0: Point, b1: Point) -> i32 {
    let na = (a0 - a1).cross(a0 + a1);
    let nb = (b0 - b1).cross(b0 + b1);
    let na_len = na.norm();
    let nb_len = nb.norm();
    let cos_ab = na.dot(nb);
    let cos_ab_error =
        ((5.0 + 4.0 * SQRT3) * na_len * nb_len + 32.0 * SQRT3 * DBL_ERR * (na_len + nb_len))
            * DBL_ERR;
    if cos_ab > cos_ab_error {
        1
    } else if cos_ab < -cos_ab_error {
        -1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Circumcenters and Voronoi exclusion
// ---------------------------------------------------------------------------

/// Circumcenter direction of `abc` (unnormalized, negated if `abc` is
/// clockwise) and its error bound.
fn circumcenter(a: Point, b: Point, c: Point) -> (Point, f64) {
    let ab_diff = a - b;
    let ab_sum = a + b;
    let bc_diff = b - c;
    let bc_sum = b + c;
    let nab = ab_diff.cross(ab_sum);
    let nab_len = nab.norm();
    let ab_len = ab_diff.norm();
    let nbc = bc_diff.cross(bc_sum);
    let nbc_len = nbc.norm();
    let bc_len = bc_diff.norm();
    let mab = nab.cross(ab_sum);
    let mbc = nbc.cross(bc_sum);
    let err = ((16.0 + 24.0 * SQRT3) * DBL_ERR + 8.0 * DBL_ERR * (ab_len + bc_len))
        * nab_len
        * nbc_len
        + 128.0 * SQRT3 * DBL_ERR * DBL_ERR * (nab_len + nbc_len)
        + 3.0 * 4096.0 * DBL_ERR * DBL_ERR * DBL_ERR * DBL_ERR;
    (mab.cross(mbc), err)
}

/// Which side of edge `x` the circumcenter of `abc` lies on: +1 left, -1
/// right. Returns 0 only if `x` is degenerate or two of `a, b, c` coincide.
pub fn edge_circumcenter_sign(x0: Point, x1: Point, a: Point, b: Point, c: Point) -> i32 {
    let abc_sign = sign(a, b, c);
    let s = triage_edge_circumcenter_sign(x0, x1, a, b, c, abc_sign);
    if s != 0 {
        return s;
    }
    if x0 == x1 || a == b || b == c || c == a {
        return 0;
    }
    let s = exact_edge_circumcenter_sign(&ex(x0), &ex(x1), &ex(a), &ex(b), &ex(c), abc_sign);
    if s != 0 {
        return s;
    }
    symbolic_edge_circumcenter_sign(x0, x1, a, b, c)
}

fn triage_edge_circumcenter_sign(
    x0: Point,
    x1: Point,
    a: Point,
    b: Point,
    c: Point,
    abc_sign: i32,
) -> i32 {
    let (z, z_error) = circumcenter(a, b, c);
    let nx = (x0 - x1).cross(x0 + x1);
    let result = f64::from(abc_sign) * nx.dot(z);
    let z_len = z.norm();
    let nx_len = nx.norm();
    let nx_error = ((1.0 + 2.0 * SQRT3) * nx_len + 32.0 * SQRT3 * DBL_ERR) * DBL_ERR;
    let result_error = (3.0 * DBL_ERR * nx_len + nx_error) * z_len + z_error * nx_len;
    if result > result_error {
        1
    } else if result < -result_error {
        -1
    } else {
        0
    }
}

#[inline]
fn clamp_sign(v: i32) -> i32 {
    v.clamp(-1, 1)
}

fn exact_edge_circumcenter_sign(
    x0: &ExactVec3,
    x1: &ExactVec3,
    a: &ExactVec3,
    b: &ExactVec3,
    c: &ExactVec3,
    abc_sign: i32,
) -> i32 {
    let nx = x0.cross(x1);
    if nx.is_zero() {
        return 0;
    }
    let dab = nx.dot(&a.cross(b));
    let dbc = nx.dot(&b.cross(c));
    let dca = nx.dot(&c.cross(a));
    let abc2 = a.norm2().mul(&dbc.mul(&dbc));
    let bca2 = b.norm2().mul(&dca.mul(&dca));
    let cab2 = c.norm2().mul(&dab.mul(&dab));

    // Sign of dab |c| + dbc |a| + dca |b|, found by comparing one term at a
    // time and squaring only when both sides have the same sign.
    let lhs3 = dab.sign();
    let rhs3 = -dbc.sign();
    let mut lhs2 = clamp_sign(lhs3 - rhs3);
    if lhs2 == 0 && lhs3 != 0 {
        lhs2 = cab2.sub(&abc2).sign() * lhs3;
    }
    let rhs2 = -dca.sign();
    let mut result = clamp_sign(lhs2 - rhs2);
    if result == 0 && lhs2 != 0 {
        let lhs4 = dab.sign() * dbc.sign();
        let rhs4 = bca2.sub(&cab2).sub(&abc2);
        result = clamp_sign(lhs4 - rhs4.sign());
        if result == 0 && lhs4 != 0 {
            let four_abc2_cab2 = abc2.mul(&cab2).scale(4.0);
            result = four_abc2_cab2.sub(&rhs4.mul(&rhs4)).sign() * lhs4;
        }
        result *= lhs2;
    }
    abc_sign * result
}

fn symbolic_edge_circumcenter_sign(x0: Point, x1: Point, a: Point, b: Point, c: Point) -> i32 {
    if a == b || b == c || c == a {
        return 0;
    }
    let mut pts = [a, b, c];
    pts.sort();
    for p in pts {
        let s = unperturbed_sign(x0, x1, p);
        if s != 0 {
            return s;
        }
    }
    0
}

/// Result of testing whether one site's coverage interval on an edge
/// contains the other's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excluded {
    /// The first site is excluded by the second.
    First,
    /// The second site is excluded by the first.
    Second,
    /// Neither site excludes the other.
    Neither,
}

/// Given two sites `a` and `b` with `a` closer to `x0`, both within `r` of the
/// edge `x`, decide whether either site's coverage interval along `x`
/// contains the other's. `r` must be less than 90 degrees.
pub fn voronoi_site_exclusion(a: Point, b: Point, x0: Point, x1: Point, r: ChordAngle) -> Excluded {
    // If `a` is closer to both endpoints it is closer to every point of `x`.
    if compare_distances(x1, a, b) < 0 {
        return Excluded::Second;
    }
    if let Some(result) = triage_voronoi_site_exclusion(a, b, x0, x1, r.length2()) {
        return result;
    }
    exact_voronoi_site_exclusion(&ex(a), &ex(b), &ex(x0), &ex(x1), a, b, r.length2())
}

fn triage_voronoi_site_exclusion(
    a: Point,
    b: Point,
    x0: Point,
    x1: Point,
    r2: f64,
) -> Option<Excluded> {
    let n = (x0 - x1).cross(x0 + x1);
    let n2 = n.norm2();
    let n1 = n2.sqrt();
    let dn_error = ((3.5 + 2.0 * SQRT3) * n1 + 32.0 * SQRT3 * DBL_ERR) * DBL_ERR;

    let cos_r = 1.0 - 0.5 * r2;
    let sin2_r = r2 * (1.0 - 0.25 * r2);
    let n2sin2_r = n2 * sin2_r;

    // Half-widths of the two coverage intervals, scaled by |n|.
    let semiwidth = |s: Point| -> Option<(f64, f64, f64, f64)> {
        let (closest, sx2) = closest_vertex(s, x0, x1);
        let s_dn = (s - closest).dot(n);
        let s_dn2 = s_dn * s_dn;
        let s_dn_error = dn_error * sx2.sqrt();
        let rs2 = n2sin2_r - s_dn2;
        let rs2_error = (8.0 * DBL_ERR + 4.0 * DBL_ERR) * s_dn2
            + (2.0 * s_dn.abs() + s_dn_error) * s_dn_error
            + 6.0 * DBL_ERR * n2sin2_r;
        let min_rs2 = rs2 - rs2_error;
        if min_rs2 < 0.0 {
            return None;
        }
        let rs = rs2.sqrt();
        let rs_error = 1.5 * DBL_ERR * rs + 0.5 * rs2_error / min_rs2.sqrt();
        Some((rs, rs_error, s_dn, s_dn_error))
    };
    let (ra, ra_error, a_dn, a_dn_error) = semiwidth(a)?;
    let (rb, rb_error, b_dn, b_dn_error) = semiwidth(b)?;

    let lhs3 = cos_r * (rb - ra);
    let abs_lhs3 = lhs3.abs();
    let lhs3_error = cos_r * (ra_error + rb_error) + 3.0 * DBL_ERR * abs_lhs3;

    // Sine of the angle between the interval centers, scaled by |n|.
    let a_x_b = (a - b).cross(a + b);
    let a_x_b1 = a_x_b.norm();
    let sin_d = 0.5 * a_x_b.dot(n);
    let sin_d_error = (4.0 * DBL_ERR + (2.5 + 2.0 * SQRT3) * DBL_ERR) * a_x_b1 * n1
        + 16.0 * SQRT3 * DBL_ERR * DBL_ERR * (a_x_b1 + n1);

    let result = abs_lhs3 - sin_d;
    let result_error = lhs3_error + sin_d_error;
    if result < -result_error {
        return Some(Excluded::Neither);
    }

    // The interval centers must be less than 90 degrees apart.
    let cos_d = a.dot(b) * n2 - a_dn * b_dn;
    let cos_d_error = ((8.0 * DBL_ERR + 5.0 * DBL_ERR) * a_dn.abs() + a_dn_error) * b_dn.abs()
        + (a_dn.abs() + a_dn_error) * b_dn_error
        + (8.0 * DBL_ERR + 8.0 * DBL_ERR) * n2;
    if cos_d <= -cos_d_error {
        return Some(Excluded::Neither);
    }
    if cos_d < cos_d_error {
        return None;
    }

    if sin_d < -sin_d_error {
        // The sites wrap around the sphere relative to the edge direction.
        let r90 = ChordAngle::right().length2();
        let ca = if lhs3 < -lhs3_error {
            -1
        } else {
            triage_compare_cos_distance(a, x0, r90)
        };
        let cb = if lhs3 > lhs3_error {
            -1
        } else {
            triage_compare_cos_distance(b, x1, r90)
        };
        if ca < 0 && cb < 0 {
            return Some(Excluded::Neither);
        }
        if ca <= 0 && cb <= 0 {
            return None;
        }
        if abs_lhs3 <= lhs3_error {
            return None;
        }
    } else if sin_d <= sin_d_error {
        return None;
    }

    if result <= result_error {
        return None;
    }
    Some(if lhs3 > 0.0 {
        Excluded::First
    } else {
        Excluded::Second
    })
}

fn exact_voronoi_site_exclusion(
    a: &ExactVec3,
    b: &ExactVec3,
    x0: &ExactVec3,
    x1: &ExactVec3,
    a_point: Point,
    b_point: Point,
    r2: f64,
) -> Excluded {
    let n = x0.cross(x1);
    let n2 = n.norm2();
    let a_dn = a.dot(&n);
    let b_dn = b.dot(&n);

    let cos_d = a.dot(b).mul(&n2).sub(&a_dn.mul(&b_dn));
    if cos_d.sign() < 0 {
        return Excluded::Neither;
    }

    let n2sin2_r = exact_sin2_r(r2).mul(&n2);
    let a2 = a.norm2();
    let b2 = b.norm2();
    let sa2 = b2.mul(&n2sin2_r.mul(&a2).sub(&a_dn.mul(&a_dn)));
    let sb2 = a2.mul(&n2sin2_r.mul(&b2).sub(&b_dn.mul(&b_dn)));
    let lhs2_sgn = sb2.sub(&sa2).sign();

    let rhs2 = a.cross(b).dot(&n);
    if rhs2.sign() < 0 {
        let r90 = ChordAngle::right().length2();
        let ca = if lhs2_sgn < 0 {
            -1
        } else {
            exact_compare_distance(a, x0, r90)
        };
        let cb = if lhs2_sgn > 0 {
            -1
        } else {
            exact_compare_distance(b, x1, r90)
        };
        if ca <= 0 && cb <= 0 {
            return Excluded::Neither;
        }
        return if ca == 1 {
            Excluded::First
        } else {
            Excluded::Second
        };
    }
    if lhs2_sgn == 0 {
        return Excluded::Neither;
    }

    let cos_r = exact_cos_r(r2);
    let cos2_r = cos_r.mul(&cos_r);
    let lhs3 = cos2_r.mul(&sa2.add(&sb2)).sub(&rhs2.mul(&rhs2));
    if lhs3.sign() < 0 {
        return Excluded::Neither;
    }
    let lhs4 = lhs3.mul(&lhs3);
    let rhs4 = cos2_r.mul(&cos2_r).mul(&sa2).mul(&sb2).scale(4.0);
    let result = lhs4.sub(&rhs4).sign();
    if result < 0 {
        return Excluded::Neither;
    }
    // Touching intervals: the lexicographically smaller site has the
    // (infinitesimally) smaller interval.
    if result == 0 && (lhs2_sgn > 0) == (a_point > b_point) {
        return Excluded::Neither;
    }
    if lhs2_sgn > 0 {
        Excluded::First
    } else {
        Excluded::Second
    }
}
