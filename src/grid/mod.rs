//! Cube-map spatial grid for proximity queries on the unit sphere.
//!
//! The sphere is projected onto the 6 cube faces and each face is divided
//! into a `res × res` grid. Buckets are sparse (only occupied cells are
//! stored) and grow incrementally, which suits the snap-rounding engine where
//! sites are inserted while queries are running.
//!
//! Queries expand breadth-first from a start cell over stitched 4-neighbors,
//! keeping every cell whose bounding cap can reach the query region. The
//! grid only prunes candidates; callers apply exact predicates to the
//! returned ids.

mod projection;

pub(crate) use projection::face_of;
use projection::{
    cell_id, cell_to_face_ij, face_uv_to_ij, face_uv_to_point, point_to_face_uv, st_to_uv,
    step_one, ALL_DIRS,
};

use crate::geometry::edge::distance_to_edge;
use crate::types::Point;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Target number of entries per occupied cell.
const TARGET_PER_CELL: usize = 8;

/// Resolution cap (cells per face edge).
const MAX_RES: usize = 512;

/// Slack added to every cap test, in radians.
const CAP_SLACK: f64 = 1e-9;

/// Geometry of a cube-map grid at one resolution.
#[derive(Debug, Clone)]
pub(crate) struct CubeGrid {
    res: usize,
}

impl CubeGrid {
    pub(crate) fn new(res: usize) -> Self {
        Self {
            res: res.clamp(1, MAX_RES),
        }
    }

    /// Resolution for `n` entries queried at angular radius `radius`: cells
    /// hold about `TARGET_PER_CELL` entries but are not much smaller than the
    /// query radius.
    pub(crate) fn for_workload(n: usize, radius: f64) -> Self {
        let by_count = ((n as f64 / (6 * TARGET_PER_CELL) as f64).sqrt() as usize).max(1);
        let by_radius = if radius > 0.0 {
            ((std::f64::consts::FRAC_PI_2 / radius) as usize).max(1)
        } else {
            MAX_RES
        };
        Self::new(by_count.min(by_radius))
    }

    #[inline]
    pub(crate) fn res(&self) -> usize {
        self.res
    }

    #[inline]
    pub(crate) fn cell_of(&self, p: Point) -> u32 {
        let (face, u, v) = point_to_face_uv(p);
        let (iu, iv) = face_uv_to_ij(u, v, self.res);
        cell_id(face, iu, iv, self.res)
    }

    /// Center of a cell and the radius of a cap containing it, in radians.
    pub(crate) fn cell_bound(&self, cell: u32) -> (Point, f64) {
        let (face, iu, iv) = cell_to_face_ij(cell, self.res);
        let res = self.res as f64;
        let uv = |i: f64| st_to_uv(i / res);
        let (u0, u1) = (uv(iu as f64), uv(iu as f64 + 1.0));
        let (v0, v1) = (uv(iv as f64), uv(iv as f64 + 1.0));
        let center = face_uv_to_point(face, uv(iu as f64 + 0.5), uv(iv as f64 + 0.5));
        // Cells are geodesic quadrilaterals, so the farthest point from
        // the center is a corner; edge midpoints are sampled as well.
        let mid_u = 0.5 * (u0 + u1);
        let mid_v = 0.5 * (v0 + v1);
        let mut radius: f64 = 0.0;
        for &u in &[u0, mid_u, u1] {
            for &v in &[v0, mid_v, v1] {
                radius = radius.max(center.angle(face_uv_to_point(face, u, v)));
            }
        }
        (center, radius * (1.0 + 1e-6) + CAP_SLACK)
    }

    #[inline]
    pub(crate) fn neighbors(&self, cell: u32) -> [u32; 4] {
        let (face, iu, iv) = cell_to_face_ij(cell, self.res);
        ALL_DIRS.map(|dir| {
            let (f, u, v) = step_one(face, iu, iv, dir, self.res);
            cell_id(f, u, v, self.res)
        })
    }

    /// Visit the connected set of cells around `start` whose bounding caps
    /// satisfy `keep(center, cap_radius)`. `start` is always visited.
    pub(crate) fn flood(
        &self,
        start: u32,
        mut keep: impl FnMut(Point, f64) -> bool,
        mut visit: impl FnMut(u32),
    ) {
        let mut seen: FxHashSet<u32> = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            visit(cell);
            for n in self.neighbors(cell) {
                if !seen.insert(n) {
                    continue;
                }
                let (center, r) = self.cell_bound(n);
                if keep(center, r) {
                    queue.push_back(n);
                }
            }
        }
    }

    /// Cells whose caps come within `radius` of the point `p`.
    pub(crate) fn cells_near_point(&self, p: Point, radius: f64, visit: impl FnMut(u32)) {
        self.flood(
            self.cell_of(p),
            |center, r| center.angle(p) <= radius + r + CAP_SLACK,
            visit,
        );
    }

    /// Cells whose caps come within `radius` of the edge `ab`.
    pub(crate) fn cells_near_edge(&self, a: Point, b: Point, radius: f64, visit: impl FnMut(u32)) {
        self.flood(
            self.cell_of(a),
            |center, r| distance_to_edge(center, a, b) <= radius + r + CAP_SLACK,
            visit,
        );
    }

    /// Sort key that groups nearby points: face, then Morton order of the
    /// cell at a fine fixed resolution.
    pub(crate) fn spatial_key(p: Point) -> u64 {
        const FINE_RES: usize = 1 << 20;
        let (face, u, v) = point_to_face_uv(p);
        let (iu, iv) = face_uv_to_ij(u, v, FINE_RES);
        ((face as u64) << 60) | (interleave(iu as u32) | (interleave(iv as u32) << 1))
    }
}

/// Spread the low 20 bits of `x` to the even bit positions.
#[inline]
fn interleave(x: u32) -> u64 {
    let mut v = u64::from(x) & 0xf_ffff;
    v = (v | (v << 16)) & 0x0000_ffff_0000_ffff;
    v = (v | (v << 8)) & 0x00ff_00ff_00ff_00ff;
    v = (v | (v << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    v = (v | (v << 1)) & 0x5555_5555_5555_5555;
    v
}

/// Incrementally growing point index.
#[derive(Debug, Clone)]
pub(crate) struct PointGrid {
    grid: CubeGrid,
    buckets: FxHashMap<u32, Vec<u32>>,
}

impl PointGrid {
    pub(crate) fn new(grid: CubeGrid) -> Self {
        Self {
            grid,
            buckets: FxHashMap::default(),
        }
    }

    pub(crate) fn insert(&mut self, id: u32, p: Point) {
        self.buckets.entry(self.grid.cell_of(p)).or_default().push(id);
    }

    /// Ids of points possibly within `radius` radians of `p`.
    pub(crate) fn near_point(&self, p: Point, radius: f64, out: &mut Vec<u32>) {
        out.clear();
        self.grid.cells_near_point(p, radius, |cell| {
            if let Some(ids) = self.buckets.get(&cell) {
                out.extend_from_slice(ids);
            }
        });
    }

    /// Ids of points possibly within `radius` radians of the edge `ab`.
    pub(crate) fn near_edge(&self, a: Point, b: Point, radius: f64, out: &mut Vec<u32>) {
        out.clear();
        self.grid.cells_near_edge(a, b, radius, |cell| {
            if let Some(ids) = self.buckets.get(&cell) {
                out.extend_from_slice(ids);
            }
        });
    }
}

/// Static edge index. Each edge is bucketed into every cell that may lie
/// within `radius` of it, so a point's own cell lists all edges within
/// `radius` of the point.
#[derive(Debug, Clone)]
pub(crate) struct EdgeGrid {
    grid: CubeGrid,
    radius: f64,
    buckets: FxHashMap<u32, Vec<u32>>,
}

impl EdgeGrid {
    pub(crate) fn build(edges: &[(Point, Point)], radius: f64) -> Self {
        let grid = CubeGrid::for_workload(edges.len(), radius);
        let mut buckets: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        for (id, &(a, b)) in edges.iter().enumerate() {
            grid.cells_near_edge(a, b, radius, |cell| {
                buckets.entry(cell).or_default().push(id as u32)
            });
        }
        Self {
            grid,
            radius,
            buckets,
        }
    }

    /// Ids of indexed edges that may come within `radius` of the edge `ab`,
    /// sorted and deduplicated.
    pub(crate) fn candidates(&self, a: Point, b: Point, out: &mut Vec<u32>) {
        out.clear();
        self.grid.cells_near_edge(a, b, 0.0, |cell| {
            if let Some(ids) = self.buckets.get(&cell) {
                out.extend_from_slice(ids);
            }
        });
        out.sort_unstable();
        out.dedup();
    }

    /// Ids of indexed edges that may lie within `radius` of `p`.
    pub(crate) fn near_point(&self, p: Point) -> &[u32] {
        self.buckets
            .get(&self.grid.cell_of(p))
            .map_or(&[][..], Vec::as_slice)
    }

    #[inline]
    pub(crate) fn radius(&self) -> f64 {
        self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_point(rng: &mut ChaCha8Rng) -> Point {
        loop {
            let p = Point::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if p.norm2() > 1e-4 && p.norm2() <= 1.0 {
                return p.normalize();
            }
        }
    }

    #[test]
    fn test_cell_bound_contains_cell_points() {
        let grid = CubeGrid::new(6);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..2000 {
            let p = random_point(&mut rng);
            let (center, r) = grid.cell_bound(grid.cell_of(p));
            assert!(center.angle(p) <= r);
        }
    }

    #[test]
    fn test_near_point_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let pts: Vec<Point> = (0..800).map(|_| random_point(&mut rng)).collect();
        let radius = 0.15;
        let mut grid = PointGrid::new(CubeGrid::for_workload(pts.len(), radius));
        for (i, &p) in pts.iter().enumerate() {
            grid.insert(i as u32, p);
        }
        let mut out = Vec::new();
        for _ in 0..50 {
            let q = random_point(&mut rng);
            grid.near_point(q, radius, &mut out);
            for (i, &p) in pts.iter().enumerate() {
                if q.angle(p) <= radius {
                    assert!(out.contains(&(i as u32)));
                }
            }
        }
    }

    #[test]
    fn test_near_edge_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pts: Vec<Point> = (0..800).map(|_| random_point(&mut rng)).collect();
        let radius = 0.05;
        let mut grid = PointGrid::new(CubeGrid::for_workload(pts.len(), radius));
        for (i, &p) in pts.iter().enumerate() {
            grid.insert(i as u32, p);
        }
        let mut out = Vec::new();
        for _ in 0..30 {
            let a = random_point(&mut rng);
            let b = (a + random_point(&mut rng) * 0.8).normalize();
            grid.near_edge(a, b, radius, &mut out);
            for (i, &p) in pts.iter().enumerate() {
                if distance_to_edge(p, a, b) <= radius {
                    assert!(out.contains(&(i as u32)));
                }
            }
        }
    }

    #[test]
    fn test_edge_grid_finds_crossings() {
        use crate::geometry::edge::crossing_sign;
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let edges: Vec<(Point, Point)> = (0..300)
            .map(|_| {
                let a = random_point(&mut rng);
                (a, (a + random_point(&mut rng) * 0.3).normalize())
            })
            .collect();
        let index = EdgeGrid::build(&edges, 0.0);
        let mut out = Vec::new();
        for &(a, b) in edges.iter().take(40) {
            index.candidates(a, b, &mut out);
            for (j, &(c, d)) in edges.iter().enumerate() {
                if crossing_sign(a, b, c, d) > 0 {
                    assert!(out.binary_search(&(j as u32)).is_ok());
                }
            }
        }
    }

    #[test]
    fn test_edge_grid_near_point_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let edges: Vec<(Point, Point)> = (0..200)
            .map(|_| {
                let a = random_point(&mut rng);
                (a, (a + random_point(&mut rng) * 0.2).normalize())
            })
            .collect();
        let radius = 0.08;
        let index = EdgeGrid::build(&edges, radius);
        assert_eq!(index.radius(), radius);
        for _ in 0..100 {
            let p = random_point(&mut rng);
            let near = index.near_point(p);
            for (j, &(a, b)) in edges.iter().enumerate() {
                if distance_to_edge(p, a, b) <= radius {
                    assert!(near.contains(&(j as u32)));
                }
            }
        }
    }

    #[test]
    fn test_spatial_key_orders_by_face() {
        let px = Point::new(1.0, 0.0, 0.0);
        let pz = Point::new(0.0, 0.0, 1.0);
        assert!(CubeGrid::spatial_key(px) < CubeGrid::spatial_key(pz));
        assert_eq!(interleave(0b11), 0b101);
    }
}
