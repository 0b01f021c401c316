//! Site selection and edge snapping.
//!
//! Sites are chosen greedily from the (snapped) input vertices so that no two
//! are closer than the minimum vertex separation. Each input edge is then
//! replaced by the chain of sites whose Voronoi regions it crosses, and extra
//! sites are inserted wherever a snapped edge strays too far from its input
//! edge or passes too close to an unrelated site.

use super::ids::{InputVertexId, SiteId};
use super::snap::{SnapFunction, MAX_SNAP_RADIUS};
use crate::budget::MemoryBudget;
use crate::error::BuildError;
use crate::geometry::edge::{
    crossing_sign, intersection, is_edge_b_near_edge_a, project, robust_cross_prod,
    INTERSECTION_ERROR,
};
use crate::geometry::{
    compare_distance, compare_distances, compare_edge_distance, edge_circumcenter_sign, sign,
    voronoi_site_exclusion, ChordAngle, Excluded,
};
use crate::grid::{CubeGrid, EdgeGrid, PointGrid};
use crate::types::Point;
use tracing::trace;

const DBL_EPSILON: f64 = f64::EPSILON;

/// Ratio of the maximum edge deviation to the edge snap radius.
const MAX_EDGE_DEVIATION_RATIO: f64 = 1.1;

/// An input edge as a pair of input vertex ids.
pub(crate) type InputEdge = (InputVertexId, InputVertexId);

/// Distance thresholds derived once from the snap function and options.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SnapParams {
    pub site_snap_radius_ca: ChordAngle,
    pub edge_snap_radius_ca: ChordAngle,
    pub snapping_requested: bool,
    /// Radians.
    pub max_edge_deviation: f64,
    pub edge_site_query_radius_ca: ChordAngle,
    pub min_edge_length_to_split_ca: ChordAngle,
    pub min_site_separation_ca: ChordAngle,
    pub min_edge_site_separation_ca: ChordAngle,
    pub max_adjacent_site_separation_ca: ChordAngle,
    /// sin² of the edge snap radius, rounded up by its construction error.
    pub edge_snap_radius_sin2: f64,
}

impl SnapParams {
    /// `intersection_tolerance` is in radians and is raised to the
    /// intersection error when crossing edges are split.
    pub(crate) fn new(
        snap_function: &dyn SnapFunction,
        split_crossing_edges: bool,
        intersection_tolerance: f64,
    ) -> Result<Self, BuildError> {
        let snap_radius = snap_function.snap_radius();
        if snap_radius > MAX_SNAP_RADIUS {
            return Err(BuildError::SnapRadiusTooLarge {
                radius: snap_radius,
                max: MAX_SNAP_RADIUS,
            });
        }
        let site_snap_radius_ca = ChordAngle::from_radians(snap_radius);

        let mut tolerance = intersection_tolerance.max(0.0);
        if split_crossing_edges {
            tolerance = tolerance.max(INTERSECTION_ERROR);
        }
        let edge_snap_radius = snap_radius + tolerance;
        let edge_snap_radius_ca = if tolerance > 0.0 {
            ChordAngle::round_up(edge_snap_radius)
        } else {
            site_snap_radius_ca
        };
        let snapping_requested = edge_snap_radius > 0.0;

        let max_edge_deviation = MAX_EDGE_DEVIATION_RATIO * edge_snap_radius;
        let edge_site_query_radius_ca = ChordAngle::from_radians(
            max_edge_deviation + snap_function.min_edge_vertex_separation(),
        );
        // Snapped edges shorter than this never deviate too far.
        let min_edge_length_to_split_ca = if edge_snap_radius > 0.0 {
            ChordAngle::from_radians(
                2.0 * (edge_snap_radius.sin() / max_edge_deviation.sin()).acos(),
            )
        } else {
            ChordAngle::straight()
        };

        let min_site_separation_ca =
            ChordAngle::from_radians(snap_function.min_vertex_separation());
        let min_edge_site_separation_ca =
            ChordAngle::from_radians(snap_function.min_edge_vertex_separation());
        let max_adjacent_site_separation_ca =
            ChordAngle::round_up(2.0 * edge_snap_radius).with_point_error();

        let d = edge_snap_radius.sin();
        let edge_snap_radius_sin2 = d * d
            + ((9.5 * d + 2.5 + 2.0 * 3f64.sqrt()) * d + 9.0 * DBL_EPSILON) * DBL_EPSILON;

        Ok(Self {
            site_snap_radius_ca,
            edge_snap_radius_ca,
            snapping_requested,
            max_edge_deviation,
            edge_site_query_radius_ca,
            min_edge_length_to_split_ca,
            min_site_separation_ca,
            min_edge_site_separation_ca,
            max_adjacent_site_separation_ca,
            edge_snap_radius_sin2,
        })
    }
}

/// Mutable state of one `build` call, from site selection to edge emission.
pub(crate) struct Workspace<'a> {
    pub params: &'a SnapParams,
    snap_function: &'a dyn SnapFunction,
    pub input_vertices: Vec<Point>,
    pub input_edges: Vec<InputEdge>,
    /// Forced sites first, then sites in selection order.
    pub sites: Vec<Point>,
    /// Sites near each input edge, sorted by distance from its first vertex.
    pub edge_sites: Vec<Vec<SiteId>>,
    pub num_forced_sites: usize,
    pub snapping_needed: bool,
    pub budget: MemoryBudget,
}

impl<'a> Workspace<'a> {
    /// `sites` holds the forced vertices, in any order and possibly repeated.
    pub(crate) fn new(
        params: &'a SnapParams,
        snap_function: &'a dyn SnapFunction,
        input_vertices: Vec<Point>,
        input_edges: Vec<InputEdge>,
        sites: Vec<Point>,
        budget: MemoryBudget,
    ) -> Self {
        Self {
            params,
            snap_function,
            input_vertices,
            input_edges,
            sites,
            edge_sites: Vec::new(),
            num_forced_sites: 0,
            snapping_needed: false,
            budget,
        }
    }

    /// Select the sites and the edge-site lists that `snap_edge` walks.
    pub(crate) fn choose_sites(&mut self, split_crossing_edges: bool) -> Result<(), BuildError> {
        if self.input_vertices.is_empty() {
            return Ok(());
        }
        if split_crossing_edges {
            self.add_edge_crossings()?;
        }
        if self.params.snapping_requested {
            let radius = self
                .params
                .edge_site_query_radius_ca
                .radians()
                .max(self.params.min_site_separation_ca.radians());
            let mut site_grid =
                PointGrid::new(CubeGrid::for_workload(self.input_vertices.len(), radius));
            self.add_forced_sites(&mut site_grid);
            self.choose_initial_sites(&mut site_grid)?;
            self.collect_site_edges(&site_grid)?;
        }
        Ok(())
    }

    /// Make every input edge snappable: insert extra sites as needed, or,
    /// when nothing has to move, turn the input vertices into the sites.
    pub(crate) fn resolve_edges(&mut self) -> Result<(), BuildError> {
        if self.snapping_needed {
            self.add_extra_sites()
        } else {
            self.copy_input_edges()
        }
    }

    fn edge_points(&self) -> Vec<(Point, Point)> {
        self.input_edges
            .iter()
            .map(|&(a, b)| (self.input_vertices[a.index()], self.input_vertices[b.index()]))
            .collect()
    }

    /// Add the intersection point of every pair of input edges that cross at
    /// an interior point.
    fn add_edge_crossings(&mut self) -> Result<(), BuildError> {
        let edges = self.edge_points();
        let index = EdgeGrid::build(&edges, 0.0);
        let mut candidates = Vec::new();
        let mut new_vertices = Vec::new();
        for (i, &(a0, a1)) in edges.iter().enumerate() {
            index.candidates(a0, a1, &mut candidates);
            for &j in candidates.iter().filter(|&&j| j as usize > i) {
                let (b0, b1) = edges[j as usize];
                if crossing_sign(a0, a1, b0, b1) > 0 {
                    self.budget.push(&mut new_vertices, intersection(a0, a1, b0, b1))?;
                }
            }
        }
        if !new_vertices.is_empty() {
            self.snapping_needed = true;
            self.budget
                .reserve(&mut self.input_vertices, new_vertices.len())?;
            self.input_vertices.extend(new_vertices);
        }
        Ok(())
    }

    fn add_forced_sites(&mut self, site_grid: &mut PointGrid) {
        self.sites.sort_unstable();
        self.sites.dedup();
        for (id, &site) in self.sites.iter().enumerate() {
            site_grid.insert(id as u32, site);
        }
        self.num_forced_sites = self.sites.len();
    }

    /// Input vertex ids in the order they are considered as sites: by
    /// spatial key, then by point.
    fn sorted_input_vertices(&self) -> Vec<InputVertexId> {
        let mut keys: Vec<(u64, InputVertexId)> = self
            .input_vertices
            .iter()
            .enumerate()
            .map(|(i, &p)| (CubeGrid::spatial_key(p), InputVertexId::new(i)))
            .collect();
        keys.sort_by(|a, b| {
            a.0.cmp(&b.0).then_with(|| {
                self.input_vertices[a.1.index()].cmp(&self.input_vertices[b.1.index()])
            })
        });
        keys.into_iter().map(|(_, id)| id).collect()
    }

    fn choose_initial_sites(&mut self, site_grid: &mut PointGrid) -> Result<(), BuildError> {
        let min_sep = self.params.min_site_separation_ca;
        let mut nearby = Vec::new();
        for id in self.sorted_input_vertices() {
            let vertex = self.input_vertices[id.index()];
            let site = self.snap_site(vertex)?;
            // A vertex that moves cannot be left in place.
            self.snapping_needed |= site != vertex;

            site_grid.near_point(site, min_sep.radians(), &mut nearby);
            let mut add_site = true;
            for &s in &nearby {
                let existing = self.sites[s as usize];
                if compare_distance(site, existing, min_sep) <= 0 {
                    add_site = false;
                    self.snapping_needed |= site != existing;
                }
            }
            if add_site {
                site_grid.insert(self.sites.len() as u32, site);
                self.budget.push(&mut self.sites, site)?;
            }
        }
        Ok(())
    }

    /// Apply the snap function, failing if it moves `p` farther than the
    /// declared snap radius.
    pub(crate) fn snap_site(&self, p: Point) -> Result<Point, BuildError> {
        if !self.params.snapping_requested {
            return Ok(p);
        }
        let site = self.snap_function.snap_point(p);
        let moved = ChordAngle::between(site, p);
        if moved > self.params.site_snap_radius_ca {
            return Err(BuildError::SnapFunctionFailed {
                moved: moved.radians(),
                allowed: self.params.site_snap_radius_ca.radians(),
            });
        }
        Ok(site)
    }

    /// For each input edge, find the sites within the edge-site query radius.
    /// Also detects edges that pass too close to a site, which rules out
    /// leaving the input unchanged.
    fn collect_site_edges(&mut self, site_grid: &PointGrid) -> Result<(), BuildError> {
        let query = self.params.edge_site_query_radius_ca;
        let min_sep = self.params.min_edge_site_separation_ca;
        self.budget
            .reserve(&mut self.edge_sites, self.input_edges.len())?;
        self.edge_sites.resize_with(self.input_edges.len(), Vec::new);
        let mut nearby = Vec::new();
        for e in 0..self.input_edges.len() {
            let (i0, i1) = self.input_edges[e];
            let v0 = self.input_vertices[i0.index()];
            let v1 = self.input_vertices[i1.index()];
            site_grid.near_edge(v0, v1, query.radians(), &mut nearby);
            let mut sites = Vec::new();
            for &s in &nearby {
                let p = self.sites[s as usize];
                if compare_edge_distance(p, v0, v1, query) > 0 {
                    continue;
                }
                self.budget.push(&mut sites, SiteId(s))?;
                if !self.snapping_needed
                    && p != v0
                    && p != v1
                    && compare_edge_distance(p, v0, v1, min_sep) < 0
                {
                    self.snapping_needed = true;
                }
            }
            sort_sites_by_distance(v0, &self.sites, &mut sites);
            self.edge_sites[e] = sites;
        }
        Ok(())
    }

    /// Deduplicate the input vertices into sites and renumber the input
    /// edges, leaving every vertex where it is.
    fn copy_input_edges(&mut self) -> Result<(), BuildError> {
        let sorted = self.sorted_input_vertices();
        let mut vmap = vec![InputVertexId(0); self.input_vertices.len()];
        self.sites.clear();
        self.budget
            .reserve(&mut self.sites, self.input_vertices.len())?;
        let mut i = 0;
        while i < sorted.len() {
            let site = self.input_vertices[sorted[i].index()];
            let id = InputVertexId::new(self.sites.len());
            while i < sorted.len() && self.input_vertices[sorted[i].index()] == site {
                vmap[sorted[i].index()] = id;
                i += 1;
            }
            self.sites.push(site);
        }
        self.input_vertices = self.sites.clone();
        for e in &mut self.input_edges {
            *e = (vmap[e.0.index()], vmap[e.1.index()]);
        }
        Ok(())
    }

    /// Snap every edge, inserting sites until no snapped edge deviates too
    /// far or passes too close to a site. Edges near a new site are queued
    /// for re-snapping if they have already been snapped once.
    fn add_extra_sites(&mut self) -> Result<(), BuildError> {
        // Only reachable with a zero site radius when crossing edges are
        // split, and neither condition applies then.
        if self.params.site_snap_radius_ca.is_zero() {
            return Ok(());
        }
        let edge_index = EdgeGrid::build(
            &self.edge_points(),
            self.params.edge_site_query_radius_ca.radians(),
        );
        let mut chain = Vec::new();
        let mut snap_queue = Vec::new();
        for max_e in 0..self.input_edges.len() {
            snap_queue.push(max_e);
            while let Some(e) = snap_queue.pop() {
                self.snap_edge(e, &mut chain);
                self.maybe_add_extra_sites(e, max_e, &chain, &edge_index, &mut snap_queue)?;
            }
        }
        Ok(())
    }

    fn maybe_add_extra_sites(
        &mut self,
        edge_id: usize,
        max_edge_id: usize,
        chain: &[SiteId],
        edge_index: &EdgeGrid,
        snap_queue: &mut Vec<usize>,
    ) -> Result<(), BuildError> {
        // The chain is a subsequence of the edge's nearby sites; walk both in
        // parallel. Only the current snapped edge can be too close to a site
        // that was skipped.
        let mut i = 0;
        let params = *self.params;
        for k in 0..self.edge_sites[edge_id].len() {
            let id = self.edge_sites[edge_id][k];
            if id == chain[i] {
                i += 1;
                if i == chain.len() {
                    break;
                }
                let v0 = self.sites[chain[i - 1].index()];
                let v1 = self.sites[chain[i].index()];
                if ChordAngle::between(v0, v1) < params.min_edge_length_to_split_ca {
                    continue;
                }
                let (e0, e1) = self.input_edges[edge_id];
                let a0 = self.input_vertices[e0.index()];
                let a1 = self.input_vertices[e1.index()];
                if !is_edge_b_near_edge_a(a0, a1, v0, v1, params.max_edge_deviation) {
                    // Split near the middle of the snapped edge. Projecting
                    // both ends handles snapped edges that wrap the wrong
                    // way around the sphere.
                    let n = robust_cross_prod(a0, a1);
                    let mid = (project(v0, a0, a1, n) + project(v1, a0, a1, n)).normalize();
                    let new_site = self.separation_site(mid, v0, v1, edge_id)?;
                    return self.add_extra_site(new_site, max_edge_id, edge_index, snap_queue);
                }
            } else if i > 0 && id.index() >= self.num_forced_sites {
                // Forced sites carry no separation guarantee.
                let site_to_avoid = self.sites[id.index()];
                let v0 = self.sites[chain[i - 1].index()];
                let v1 = self.sites[chain[i].index()];
                if compare_edge_distance(site_to_avoid, v0, v1, params.min_edge_site_separation_ca)
                    < 0
                {
                    let new_site = self.separation_site(site_to_avoid, v0, v1, edge_id)?;
                    debug_assert_ne!(site_to_avoid, new_site);
                    return self.add_extra_site(new_site, max_edge_id, edge_index, snap_queue);
                }
            }
        }
        Ok(())
    }

    fn add_extra_site(
        &mut self,
        new_site: Point,
        max_edge_id: usize,
        edge_index: &EdgeGrid,
        snap_queue: &mut Vec<usize>,
    ) -> Result<(), BuildError> {
        let new_site_id = SiteId::new(self.sites.len());
        trace!(site = new_site_id.0, "adding extra site");
        self.budget.push(&mut self.sites, new_site)?;
        let query = self.params.edge_site_query_radius_ca;
        for &e in edge_index.near_point(new_site) {
            let e = e as usize;
            let (i0, i1) = self.input_edges[e];
            let v0 = self.input_vertices[i0.index()];
            let v1 = self.input_vertices[i1.index()];
            if compare_edge_distance(new_site, v0, v1, query) > 0 {
                continue;
            }
            self.budget.push(&mut self.edge_sites[e], new_site_id)?;
            sort_sites_by_distance(v0, &self.sites, &mut self.edge_sites[e]);
            if e <= max_edge_id {
                snap_queue.push(e);
            }
        }
        Ok(())
    }

    /// A new site on the input edge that fills the coverage gap between the
    /// snapped sites `v0` and `v1`, placed as close as possible to `target`.
    fn separation_site(
        &self,
        target: Point,
        v0: Point,
        v1: Point,
        input_edge_id: usize,
    ) -> Result<Point, BuildError> {
        let (e0, e1) = self.input_edges[input_edge_id];
        let x = self.input_vertices[e0.index()];
        let y = self.input_vertices[e1.index()];
        let xy_dir = y - x;
        let n = robust_cross_prod(x, y);
        let mut new_site = project(target, x, y, n);
        let gap_min = self.coverage_endpoint(v0, n);
        let gap_max = self.coverage_endpoint(v1, -n);
        if (new_site - gap_min).dot(xy_dir) < 0.0 {
            new_site = gap_min;
        } else if (gap_max - new_site).dot(xy_dir) < 0.0 {
            new_site = gap_max;
        }
        let new_site = self.snap_site(new_site)?;
        debug_assert_ne!(v0, new_site);
        debug_assert_ne!(v1, new_site);
        Ok(new_site)
    }

    /// Of the two points where the edge with normal `n` leaves the disc of
    /// radius edge_snap_radius around `p`, the one farther along the edge.
    fn coverage_endpoint(&self, p: Point, n: Point) -> Point {
        let sin2 = self.params.edge_snap_radius_sin2;
        let n2 = n.norm2();
        let n_dot_p = n.dot(p);
        let n_cross_p = n.cross(p);
        let n_cross_p_cross_n = p * n2 - n * n_dot_p;
        let om = n_cross_p_cross_n * (1.0 - sin2).sqrt();
        let mr2 = sin2 * n2 - n_dot_p * n_dot_p;
        let mr = n_cross_p * mr2.max(0.0).sqrt();
        (om + mr).normalize()
    }

    /// The chain of sites that input edge `e` snaps to.
    pub(crate) fn snap_edge(&self, e: usize, chain: &mut Vec<SiteId>) {
        chain.clear();
        let (i0, i1) = self.input_edges[e];
        if !self.snapping_needed {
            chain.push(SiteId(i0.0));
            chain.push(SiteId(i1.0));
            return;
        }
        let x = self.input_vertices[i0.index()];
        let y = self.input_vertices[i1.index()];
        let params = self.params;
        let candidates = &self.edge_sites[e];
        for &site_id in candidates {
            let c = self.sites[site_id.index()];
            // Sites to avoid are in the list too.
            if compare_edge_distance(c, x, y, params.edge_snap_radius_ca) > 0 {
                continue;
            }
            let mut add_site_c = true;
            while let Some(&b_id) = chain.last() {
                let b = self.sites[b_id.index()];
                if ChordAngle::between(b, c) >= params.max_adjacent_site_separation_ca {
                    break;
                }
                match voronoi_site_exclusion(b, c, x, y, params.edge_snap_radius_ca) {
                    Excluded::First => {
                        chain.pop();
                        continue;
                    }
                    Excluded::Second => {
                        add_site_c = false;
                        break;
                    }
                    Excluded::Neither => {}
                }
                // The previous site A may clip B's Voronoi region further.
                if chain.len() < 2 {
                    break;
                }
                let a = self.sites[chain[chain.len() - 2].index()];
                if ChordAngle::between(a, c) >= params.max_adjacent_site_separation_ca {
                    break;
                }
                // If ABC and XYB have the same orientation, the circumcenter
                // of ABC lies on B's side of XY but farther away.
                let xyb = sign(x, y, b);
                if sign(a, b, c) == xyb {
                    break;
                }
                // B is excluded by A and C together iff the circumcenter of
                // ABC is on the same side of XY as B.
                if edge_circumcenter_sign(x, y, a, b, c) != xyb {
                    break;
                }
                chain.pop();
            }
            if add_site_c {
                chain.push(site_id);
            }
        }
        debug_assert!(!chain.is_empty());
        debug_assert!(chain.last().map_or(true, |&last| candidates.iter().all(|&s| {
            compare_distances(y, self.sites[last.index()], self.sites[s.index()]) <= 0
        })));
    }
}

/// Sort `ids` by increasing distance of their sites from `x`.
fn sort_sites_by_distance(x: Point, sites: &[Point], ids: &mut [SiteId]) {
    ids.sort_by(|&i, &j| compare_distances(x, sites[i.index()], sites[j.index()]).cmp(&0));
}
