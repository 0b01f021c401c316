//! Snap functions: where vertices may move and how far apart the results
//! must be.

use crate::error::BuildError;
use crate::types::{degrees_to_radians, LatLng, Point};
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

/// Largest supported snap radius (70 degrees), in radians.
pub const MAX_SNAP_RADIUS: f64 = 70.0 * std::f64::consts::PI / 180.0;

/// Largest exponent accepted by [`IntLatLngSnapFunction`].
pub const MAX_LAT_LNG_EXPONENT: i32 = 10;

/// Maps input points to candidate snapped locations.
///
/// Implementations guarantee that `snap_point(p)` is within `snap_radius()`
/// of `p`, and that the separation bounds below hold for the output of the
/// builder.
pub trait SnapFunction: std::fmt::Debug {
    /// Maximum distance a vertex may move, in radians.
    fn snap_radius(&self) -> f64;

    /// Guaranteed minimum distance between output vertices, in radians.
    fn min_vertex_separation(&self) -> f64;

    /// Guaranteed minimum distance between an output vertex and any
    /// non-incident output edge, in radians.
    fn min_edge_vertex_separation(&self) -> f64;

    fn snap_point(&self, p: Point) -> Point;

    fn clone_box(&self) -> Box<dyn SnapFunction>;

    /// Maximum distance an edge may move, in radians. Edges that would move
    /// farther are split.
    fn max_edge_deviation(&self) -> f64 {
        1.1 * self.snap_radius()
    }
}

impl Clone for Box<dyn SnapFunction> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Leaves points where they are but merges vertices closer than the snap
/// radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentitySnapFunction {
    snap_radius: f64,
}

impl IdentitySnapFunction {
    pub fn new(snap_radius: f64) -> Result<Self, BuildError> {
        check_radius(snap_radius)?;
        Ok(Self {
            snap_radius: snap_radius.max(0.0),
        })
    }

    /// Radius zero: no vertices move and only identical points merge.
    pub const fn zero() -> Self {
        Self { snap_radius: 0.0 }
    }
}

impl Default for IdentitySnapFunction {
    fn default() -> Self {
        Self::zero()
    }
}

impl SnapFunction for IdentitySnapFunction {
    fn snap_radius(&self) -> f64 {
        self.snap_radius
    }

    fn min_vertex_separation(&self) -> f64 {
        self.snap_radius
    }

    fn min_edge_vertex_separation(&self) -> f64 {
        0.5 * self.snap_radius
    }

    fn snap_point(&self, p: Point) -> Point {
        p
    }

    fn clone_box(&self) -> Box<dyn SnapFunction> {
        Box::new(*self)
    }
}

/// Rounds latitude and longitude in degrees to multiples of
/// `10^-exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntLatLngSnapFunction {
    exponent: i32,
    snap_radius: f64,
    from_degrees: f64,
    to_degrees: f64,
}

impl IntLatLngSnapFunction {
    pub fn new(exponent: i32) -> Result<Self, BuildError> {
        if !(0..=MAX_LAT_LNG_EXPONENT).contains(&exponent) {
            return Err(BuildError::InvalidSnapExponent(exponent));
        }
        let power = (0..exponent).fold(1.0, |p, _| p * 10.0);
        Ok(Self {
            exponent,
            snap_radius: Self::min_snap_radius_for_exponent(exponent),
            from_degrees: power,
            to_degrees: 1.0 / power,
        })
    }

    /// Widen the snap radius. It may not be smaller than the minimum for
    /// the exponent.
    pub fn with_snap_radius(mut self, snap_radius: f64) -> Result<Self, BuildError> {
        check_radius(snap_radius)?;
        let min = Self::min_snap_radius_for_exponent(self.exponent);
        if snap_radius < min {
            return Err(BuildError::SnapRadiusTooSmall {
                radius: snap_radius,
                min,
            });
        }
        self.snap_radius = snap_radius;
        Ok(self)
    }

    #[inline]
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Worst-case distance a point moves when rounded at `exponent`,
    /// including floating-point error.
    pub fn min_snap_radius_for_exponent(exponent: i32) -> f64 {
        let power = (0..exponent).fold(1.0, |p, _| p * 10.0);
        degrees_to_radians(FRAC_1_SQRT_2 / power) + (9.0 * SQRT_2 + 1.5) * f64::EPSILON
    }

    fn max_rounding_move(&self) -> f64 {
        degrees_to_radians(FRAC_1_SQRT_2 * self.to_degrees)
    }
}

impl SnapFunction for IntLatLngSnapFunction {
    fn snap_radius(&self) -> f64 {
        self.snap_radius
    }

    fn min_vertex_separation(&self) -> f64 {
        (0.471 * self.snap_radius).max(self.snap_radius - self.max_rounding_move())
    }

    fn min_edge_vertex_separation(&self) -> f64 {
        (0.277 * self.snap_radius)
            .max(0.222 * degrees_to_radians(self.to_degrees))
            .max(0.5 * (self.snap_radius - self.max_rounding_move()))
    }

    fn snap_point(&self, p: Point) -> Point {
        let ll = LatLng::from_point(p);
        let lat = (ll.lat_degrees() * self.from_degrees).round();
        let lng = (ll.lng_degrees() * self.from_degrees).round();
        LatLng::from_degrees(lat * self.to_degrees, lng * self.to_degrees).to_point()
    }

    fn clone_box(&self) -> Box<dyn SnapFunction> {
        Box::new(*self)
    }
}

fn check_radius(radius: f64) -> Result<(), BuildError> {
    if radius > MAX_SNAP_RADIUS {
        return Err(BuildError::SnapRadiusTooLarge {
            radius,
            max: MAX_SNAP_RADIUS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    #[test]
    fn test_identity_separations() {
        let f = IdentitySnapFunction::new(0.01).unwrap();
        assert_eq!(f.min_vertex_separation(), 0.01);
        assert_eq!(f.min_edge_vertex_separation(), 0.005);
        assert_relative_eq!(f.max_edge_deviation(), 0.011);
        assert_eq!(f.snap_point(ll(1.0, 2.0)), ll(1.0, 2.0));
        assert!(IdentitySnapFunction::new(2.0).is_err());
    }

    #[test]
    fn test_int_lat_lng_rounds_to_grid() {
        let f = IntLatLngSnapFunction::new(0).unwrap();
        assert_eq!(f.snap_point(ll(0.6, -1.4)), ll(1.0, -1.0));
        let e2 = IntLatLngSnapFunction::new(2).unwrap();
        let p = ll(12.3456, -7.891);
        let snapped = LatLng::from_point(e2.snap_point(p));
        assert_relative_eq!(snapped.lat_degrees(), 12.35, epsilon = 1e-12);
        assert_relative_eq!(snapped.lng_degrees(), -7.89, epsilon = 1e-12);
        assert!(p.angle(e2.snap_point(p)) <= e2.snap_radius());
    }

    #[test]
    fn test_int_lat_lng_radius_bounds() {
        let f = IntLatLngSnapFunction::new(1).unwrap();
        assert!(f.with_snap_radius(f.snap_radius() * 0.5).is_err());
        let wide = f.with_snap_radius(0.01).unwrap();
        assert_eq!(wide.snap_radius(), 0.01);
        assert!(wide.min_vertex_separation() >= 0.471 * 0.01);
        assert!(IntLatLngSnapFunction::new(11).is_err());
        assert!(IntLatLngSnapFunction::new(-1).is_err());
    }

    #[test]
    fn test_boxed_clone_keeps_parameters() {
        let f: Box<dyn SnapFunction> = Box::new(IntLatLngSnapFunction::new(3).unwrap());
        let g = f.clone();
        assert_eq!(f.snap_radius(), g.snap_radius());
        assert_eq!(f.min_edge_vertex_separation(), g.min_edge_vertex_separation());
    }
}
