//! Cube-map projection of the sphere.
//!
//! Faces are numbered 0..6 as +X, -X, +Y, -Y, +Z, -Z. Within a face, `(u, v)`
//! are gnomonic coordinates in `[-1, 1]`; `(s, t)` apply the quadratic
//! area-equalizing transform so that grid cells have similar solid angles.

use crate::types::Point;

/// Quadratic transform: UV `[-1, 1]` -> ST `[0, 1]`.
#[inline]
pub(crate) fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Inverse transform: ST `[0, 1]` -> UV `[-1, 1]`.
#[inline]
pub(crate) fn st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// Map a (not necessarily unit) point to `(face, u, v)`.
#[inline]
pub(crate) fn point_to_face_uv(p: Point) -> (usize, f64, f64) {
    let (x, y, z) = (p.x, p.y, p.z);
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());
    if ax >= ay && ax >= az {
        if x >= 0.0 {
            (0, -z / ax, y / ax)
        } else {
            (1, z / ax, y / ax)
        }
    } else if ay >= az {
        if y >= 0.0 {
            (2, x / ay, -z / ay)
        } else {
            (3, x / ay, z / ay)
        }
    } else if z >= 0.0 {
        (4, x / az, y / az)
    } else {
        (5, -x / az, y / az)
    }
}

/// Cube face containing `p`.
#[inline]
pub(crate) fn face_of(p: Point) -> usize {
    point_to_face_uv(p).0
}

/// Cell `(iu, iv)` of `(u, v)` on a `res × res` face grid.
#[inline]
pub(crate) fn face_uv_to_ij(u: f64, v: f64, res: usize) -> (usize, usize) {
    let fu = (uv_to_st(u) * res as f64).max(0.0);
    let fv = (uv_to_st(v) * res as f64).max(0.0);
    ((fu as usize).min(res - 1), (fv as usize).min(res - 1))
}

/// Unit point for `(face, u, v)`; inverse of [`point_to_face_uv`].
#[inline]
pub(crate) fn face_uv_to_point(face: usize, u: f64, v: f64) -> Point {
    let p = match face {
        0 => Point::new(1.0, v, -u),
        1 => Point::new(-1.0, v, u),
        2 => Point::new(u, 1.0, -v),
        3 => Point::new(u, -1.0, v),
        4 => Point::new(u, v, 1.0),
        _ => Point::new(-u, v, -1.0),
    };
    p.normalize()
}

#[inline]
pub(crate) fn cell_id(face: usize, iu: usize, iv: usize, res: usize) -> u32 {
    (face * res * res + iv * res + iu) as u32
}

#[inline]
pub(crate) fn cell_to_face_ij(cell: u32, res: usize) -> (usize, usize, usize) {
    let cell = cell as usize;
    let face = cell / (res * res);
    let rem = cell % (res * res);
    (face, rem % res, rem / res)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeDir {
    Left,
    Right,
    Down,
    Up,
}

pub(crate) const ALL_DIRS: [EdgeDir; 4] = [EdgeDir::Left, EdgeDir::Right, EdgeDir::Down, EdgeDir::Up];

/// Neighbor across a face boundary: `(face, iu, iv)` of the adjacent cell.
fn cross_face_edge(face: usize, iu: usize, iv: usize, dir: EdgeDir, res: usize) -> (usize, usize, usize) {
    let last = res - 1;
    let iu_flip = last - iu;
    let iv_flip = last - iv;
    match (face, dir) {
        (0, EdgeDir::Left) => (4, last, iv),
        (0, EdgeDir::Right) => (5, 0, iv),
        (0, EdgeDir::Down) => (3, last, iu_flip),
        (0, EdgeDir::Up) => (2, last, iu),
        (1, EdgeDir::Left) => (5, last, iv),
        (1, EdgeDir::Right) => (4, 0, iv),
        (1, EdgeDir::Down) => (3, 0, iu),
        (1, EdgeDir::Up) => (2, 0, iu_flip),
        (2, EdgeDir::Left) => (1, iv_flip, last),
        (2, EdgeDir::Right) => (0, iv, last),
        (2, EdgeDir::Down) => (4, iu, last),
        (2, EdgeDir::Up) => (5, iu_flip, last),
        (3, EdgeDir::Left) => (1, iv, 0),
        (3, EdgeDir::Right) => (0, iv_flip, 0),
        (3, EdgeDir::Down) => (5, iu_flip, 0),
        (3, EdgeDir::Up) => (4, iu, 0),
        (4, EdgeDir::Left) => (1, last, iv),
        (4, EdgeDir::Right) => (0, 0, iv),
        (4, EdgeDir::Down) => (3, iu, last),
        (4, EdgeDir::Up) => (2, iu, 0),
        (5, EdgeDir::Left) => (0, last, iv),
        (5, EdgeDir::Right) => (1, 0, iv),
        (5, EdgeDir::Down) => (3, iu_flip, 0),
        _ => (2, iu_flip, last),
    }
}

/// The 4-neighbor of a cell in direction `dir`, stitched across faces.
pub(crate) fn step_one(face: usize, iu: usize, iv: usize, dir: EdgeDir, res: usize) -> (usize, usize, usize) {
    match dir {
        EdgeDir::Left if iu > 0 => (face, iu - 1, iv),
        EdgeDir::Right if iu + 1 < res => (face, iu + 1, iv),
        EdgeDir::Down if iv > 0 => (face, iu, iv - 1),
        EdgeDir::Up if iv + 1 < res => (face, iu, iv + 1),
        _ => cross_face_edge(face, iu, iv, dir, res),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_st_uv_inverse() {
        for i in 0..=20 {
            let s = i as f64 / 20.0;
            assert_relative_eq!(uv_to_st(st_to_uv(s)), s, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_face_uv_round_trip() {
        for face in 0..6 {
            for &(u, v) in &[(0.0, 0.0), (0.3, -0.7), (-0.9, 0.9)] {
                let p = face_uv_to_point(face, u, v);
                let (f, u2, v2) = point_to_face_uv(p);
                assert_eq!(f, face);
                assert_relative_eq!(u, u2, epsilon = 1e-12);
                assert_relative_eq!(v, v2, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_step_one_has_unique_inverse_direction() {
        for res in [1usize, 2, 5, 8] {
            for cell in 0..(6 * res * res) as u32 {
                let (face, iu, iv) = cell_to_face_ij(cell, res);
                for dir in ALL_DIRS {
                    let (f1, u1, v1) = step_one(face, iu, iv, dir, res);
                    let back = ALL_DIRS
                        .iter()
                        .filter(|&&d| step_one(f1, u1, v1, d, res) == (face, iu, iv))
                        .count();
                    assert!(back >= 1, "res={res} cell={cell} dir={dir:?}");
                }
            }
        }
    }

    #[test]
    fn test_cross_face_neighbors_are_adjacent() {
        // Stepping off a face edge must land near the same boundary point.
        let res = 4;
        for cell in 0..(6 * res * res) as u32 {
            let (face, iu, iv) = cell_to_face_ij(cell, res);
            let center = |f: usize, i: usize, j: usize| {
                let u = st_to_uv((i as f64 + 0.5) / res as f64);
                let v = st_to_uv((j as f64 + 0.5) / res as f64);
                face_uv_to_point(f, u, v)
            };
            let c = center(face, iu, iv);
            for dir in ALL_DIRS {
                let (f, i, j) = step_one(face, iu, iv, dir, res);
                assert!(c.angle(center(f, i, j)) < 0.6, "cell={cell} dir={dir:?}");
            }
        }
    }
}
