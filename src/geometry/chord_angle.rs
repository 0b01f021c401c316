//! Distances represented by squared chord length.

use crate::types::Point;
use std::f64::consts::PI;

const DBL_EPSILON: f64 = f64::EPSILON;
const MAX_LENGTH2: f64 = 4.0;

/// An angle in `[0, π]` stored as the squared length of the chord it
/// subtends on the unit sphere.
///
/// Comparisons are exact and cheap, which is why snapping thresholds are kept
/// in this form. Conversions from points or radians carry a small error;
/// the `with_*_error` helpers round a threshold up by that error.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct ChordAngle {
    length2: f64,
}

impl ChordAngle {
    #[inline]
    pub const fn zero() -> Self {
        Self { length2: 0.0 }
    }

    /// 90 degrees.
    #[inline]
    pub const fn right() -> Self {
        Self { length2: 2.0 }
    }

    /// 180 degrees.
    #[inline]
    pub const fn straight() -> Self {
        Self {
            length2: MAX_LENGTH2,
        }
    }

    #[inline]
    pub fn from_length2(length2: f64) -> Self {
        Self {
            length2: length2.clamp(0.0, MAX_LENGTH2),
        }
    }

    #[inline]
    pub fn between(a: Point, b: Point) -> Self {
        Self::from_length2((a - b).norm2())
    }

    /// Negative angles clamp to zero; angles beyond π clamp to π.
    pub fn from_radians(radians: f64) -> Self {
        if radians <= 0.0 {
            return Self::zero();
        }
        let length = 2.0 * (0.5 * radians.min(PI)).sin();
        Self::from_length2(length * length)
    }

    #[inline]
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(crate::types::degrees_to_radians(degrees))
    }

    /// Round a radius up so it covers the error of `from_radians`.
    pub fn round_up(radians: f64) -> Self {
        let ca = Self::from_radians(radians);
        ca.plus_error(ca.from_radians_max_error())
    }

    #[inline]
    pub fn length2(self) -> f64 {
        self.length2
    }

    #[inline]
    pub fn radians(self) -> f64 {
        2.0 * (0.5 * self.length2.sqrt()).asin()
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.radians().to_degrees()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.length2 == 0.0
    }

    #[inline]
    pub fn sin2(self) -> f64 {
        self.length2 * (1.0 - 0.25 * self.length2)
    }

    #[inline]
    pub fn sin(self) -> f64 {
        self.sin2().sqrt()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        1.0 - 0.5 * self.length2
    }

    /// Smallest representable angle larger than this one.
    pub fn successor(self) -> Self {
        if self.length2 >= MAX_LENGTH2 {
            return self;
        }
        Self {
            length2: next_up(self.length2),
        }
    }

    /// Largest representable angle smaller than this one.
    pub fn predecessor(self) -> Self {
        if self.length2 <= 0.0 {
            return self;
        }
        Self {
            length2: next_down(self.length2),
        }
    }

    /// Add an error bound to the squared length, clamping to `[0, 4]`.
    #[inline]
    pub fn plus_error(self, error: f64) -> Self {
        Self::from_length2(self.length2 + error)
    }

    /// Maximum error in `length2` for a value built from two points.
    #[inline]
    pub fn from_points_max_error(self) -> f64 {
        4.5 * DBL_EPSILON * self.length2 + 16.0 * DBL_EPSILON * DBL_EPSILON
    }

    /// Maximum error in `length2` for a value built from radians.
    #[inline]
    pub fn from_radians_max_error(self) -> f64 {
        1.5 * DBL_EPSILON * self.length2
    }

    /// Round a point-to-point threshold up by its conversion error.
    #[inline]
    pub fn with_point_error(self) -> Self {
        self.plus_error(self.from_points_max_error())
    }

    /// Round a point-to-edge threshold up by the worst-case error of
    /// measuring a point's distance to an edge.
    pub fn with_edge_error(self) -> Self {
        self.plus_error(self.min_distance_max_error())
    }

    fn min_distance_max_error(self) -> f64 {
        let interior = if self.length2 >= 2.0 {
            0.0
        } else {
            let b = (0.5 * self.length2).min(1.0);
            let a = (b * (2.0 - b)).sqrt();
            let sqrt3 = 3f64.sqrt();
            ((2.5 + 2.0 * sqrt3 + 8.5 * a) * a
                + (2.0 + 2.0 * sqrt3 / 3.0 + 6.5 * (1.0 - b)) * b
                + (23.0 + 16.0 / sqrt3) * DBL_EPSILON)
                * DBL_EPSILON
        };
        interior.max(self.from_points_max_error())
    }
}

impl std::ops::Add for ChordAngle {
    type Output = ChordAngle;

    fn add(self, rhs: ChordAngle) -> ChordAngle {
        let (a2, b2) = (self.length2, rhs.length2);
        if b2 == 0.0 {
            return self;
        }
        if a2 + b2 >= MAX_LENGTH2 {
            return ChordAngle::straight();
        }
        let x = a2 * (1.0 - 0.25 * b2);
        let y = b2 * (1.0 - 0.25 * a2);
        ChordAngle::from_length2(x + y + 2.0 * (x * y).sqrt())
    }
}

#[inline]
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    f64::from_bits(if x > 0.0 { bits + 1 } else { bits - 1 })
}

#[inline]
fn next_down(x: f64) -> f64 {
    -next_up(-x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_radians_round_trip() {
        for deg in [0.0, 1e-9, 0.5, 10.0, 45.0, 90.0, 135.0, 180.0] {
            let ca = ChordAngle::from_degrees(deg);
            assert_relative_eq!(ca.degrees(), deg, epsilon = 1e-9);
        }
        assert_relative_eq!(ChordAngle::from_degrees(90.0).length2(), 2.0, epsilon = 1e-15);
        assert_eq!(ChordAngle::from_radians(-1.0), ChordAngle::zero());
        assert_eq!(ChordAngle::from_radians(10.0), ChordAngle::straight());
    }

    #[test]
    fn test_sum_matches_radians() {
        let a = ChordAngle::from_degrees(10.0);
        let b = ChordAngle::from_degrees(25.0);
        assert_relative_eq!((a + b).degrees(), 35.0, epsilon = 1e-9);
        assert_eq!(
            ChordAngle::from_degrees(120.0) + ChordAngle::from_degrees(90.0),
            ChordAngle::straight()
        );
    }

    #[test]
    fn test_successor_ordering() {
        let a = ChordAngle::from_degrees(1.0);
        assert!(a.successor() > a);
        assert!(a.predecessor() < a);
        assert_eq!(ChordAngle::straight().successor(), ChordAngle::straight());
        assert_eq!(ChordAngle::zero().successor().length2(), f64::from_bits(1));
    }

    #[test]
    fn test_error_helpers_round_up() {
        let a = ChordAngle::from_degrees(1.0);
        assert!(a.with_point_error() > a);
        assert!(a.with_edge_error() > a);
        assert!(ChordAngle::round_up(a.radians()) >= a);
    }
}
