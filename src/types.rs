//! Core point types on the unit sphere.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;
use std::cmp::Ordering;
use std::ops::{Add, Mul, Neg, Sub};

/// A point on the unit sphere, represented as a 3D vector.
///
/// Equality is exact (component-wise `==`). Points are assumed to be on (or
/// within a few ulps of) the unit sphere; constructors do not normalize.
///
/// Points also carry a total lexicographic order on `(x, y, z)`. Several
/// predicates use this order for symbolic perturbation, so it must never
/// change.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a point from raw coordinates (not normalized).
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn from_dvec3(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    #[inline]
    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Normalize an arbitrary direction onto the sphere.
    ///
    /// A zero vector stays zero.
    #[inline]
    pub fn normalized(v: DVec3) -> Self {
        Self::from_dvec3(v.normalize_or_zero())
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.to_dvec3().dot(other.to_dvec3())
    }

    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::from_dvec3(self.to_dvec3().cross(other.to_dvec3()))
    }

    #[inline]
    pub fn norm2(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.norm2().sqrt()
    }

    #[inline]
    pub fn normalize(self) -> Self {
        Self::normalized(self.to_dvec3())
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    #[inline]
    pub fn get(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    #[inline]
    pub fn set(&mut self, axis: usize, value: f64) {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            _ => self.z = value,
        }
    }

    /// Index of the component with the largest magnitude (ties go to the
    /// later axis, matching `z` over `y` over `x`).
    #[inline]
    pub fn largest_abs_component(self) -> usize {
        let a = self.abs();
        if a.x > a.y {
            if a.x > a.z {
                0
            } else {
                2
            }
        } else if a.y > a.z {
            1
        } else {
            2
        }
    }

    /// True if the squared length is within the tolerance that normalized
    /// vectors are guaranteed to satisfy.
    #[inline]
    pub fn is_unit_length(self) -> bool {
        (self.norm2() - 1.0).abs() <= 5.0 * f64::EPSILON
    }

    /// Angle between two (not necessarily normalized) vectors, in radians.
    #[inline]
    pub fn angle(self, other: Self) -> f64 {
        self.cross(other).norm().atan2(self.dot(other))
    }

    /// Lexicographic comparison on `(x, y, z)`.
    #[inline]
    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        cmp_f64(self.x, other.x)
            .then_with(|| cmp_f64(self.y, other.y))
            .then_with(|| cmp_f64(self.z, other.z))
    }
}

#[inline]
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Eq for Point {}

impl PartialOrd for Point {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.lex_cmp(other)
    }
}

impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // +0.0 and -0.0 compare equal, so they must hash equal.
        for c in [self.x, self.y, self.z] {
            let c = if c == 0.0 { 0.0 } else { c };
            c.to_bits().hash(state);
        }
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: Point) -> Point {
        rhs * self
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Point {
    #[inline]
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point> for [f64; 3] {
    #[inline]
    fn from(p: Point) -> Self {
        [p.x, p.y, p.z]
    }
}

impl From<DVec3> for Point {
    #[inline]
    fn from(v: DVec3) -> Self {
        Self::from_dvec3(v)
    }
}

/// A fixed point that is not on any "nice" great circle, used as the default
/// reference point for containment (never a vertex of ordinary inputs).
pub fn origin() -> Point {
    Point::new(-0.0099994664350250197, 0.0025924542609324121, 0.99994664350250195)
}

/// A latitude/longitude pair in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub const fn from_radians(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    #[inline]
    pub fn from_degrees(lat: f64, lng: f64) -> Self {
        Self::from_radians(degrees_to_radians(lat), degrees_to_radians(lng))
    }

    #[inline]
    pub fn from_point(p: Point) -> Self {
        Self {
            lat: p.z.atan2((p.x * p.x + p.y * p.y).sqrt()),
            lng: p.y.atan2(p.x),
        }
    }

    #[inline]
    pub fn to_point(self) -> Point {
        let (sin_lat, cos_lat) = self.lat.sin_cos();
        let (sin_lng, cos_lng) = self.lng.sin_cos();
        Point::new(cos_lng * cos_lat, sin_lng * cos_lat, sin_lat)
    }

    #[inline]
    pub fn lat_degrees(self) -> f64 {
        self.lat.to_degrees()
    }

    #[inline]
    pub fn lng_degrees(self) -> f64 {
        self.lng.to_degrees()
    }
}

/// Degrees to radians using the same rounding as `LatLng::from_degrees`.
#[inline]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    (std::f64::consts::PI / 180.0) * degrees
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_layout() {
        assert_eq!(std::mem::size_of::<Point>(), 24);
        let pts = [Point::new(1.0, 2.0, 3.0), Point::new(4.0, 5.0, 6.0)];
        let raw: &[f64] = bytemuck::cast_slice(&pts);
        assert_eq!(raw, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_lexicographic_order() {
        let a = Point::new(0.0, 1.0, 0.0);
        let b = Point::new(0.0, 1.0, 0.5);
        let c = Point::new(0.1, -1.0, 0.0);
        assert!(a < b && b < c);
        assert_eq!(Point::new(0.0, 0.0, 1.0), Point::new(-0.0, 0.0, 1.0));
        assert_eq!(
            Point::new(0.0, 0.0, 1.0).cmp(&Point::new(-0.0, 0.0, 1.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_latlng_round_trip() {
        let ll = LatLng::from_degrees(37.5, -122.25);
        let p = ll.to_point();
        assert!(p.is_unit_length());
        let back = LatLng::from_point(p);
        assert_relative_eq!(back.lat_degrees(), 37.5, epsilon = 1e-12);
        assert_relative_eq!(back.lng_degrees(), -122.25, epsilon = 1e-12);
    }

    #[test]
    fn test_largest_abs_component() {
        assert_eq!(Point::new(-3.0, 1.0, 2.0).largest_abs_component(), 0);
        assert_eq!(Point::new(0.0, -1.0, 0.5).largest_abs_component(), 1);
        assert_eq!(Point::new(0.1, 0.2, 0.2).largest_abs_component(), 2);
    }
}
