//! Incremental constraint solver for simplifying a chain of edges into a
//! single edge starting at a fixed source vertex.
//!
//! The set of acceptable edge directions at the source is kept as a circular
//! interval. Each "target" disc narrows it to directions whose great circle
//! passes through the disc; each "avoid" disc removes the directions that
//! pass through the disc or on its wrong side.

use crate::geometry::interval::remainder;
use crate::geometry::{ChordAngle, CircleInterval};
use crate::types::Point;
use std::f64::consts::{FRAC_PI_2, PI};

const DBL_ERR: f64 = 0.5 * f64::EPSILON;

#[derive(Debug, Clone, Copy)]
struct RangeToAvoid {
    interval: CircleInterval,
    on_left: bool,
}

#[derive(Debug, Clone)]
pub struct PolylineSimplifier {
    src: Point,
    x_dir: Point,
    y_dir: Point,
    window: CircleInterval,
    // Avoid constraints given before the first target disc.
    ranges_to_avoid: Vec<RangeToAvoid>,
}

impl PolylineSimplifier {
    pub fn new(src: Point) -> Self {
        // Tangent basis at `src` built from the coordinate axis of smallest
        // magnitude; both vectors have the same length.
        let a = src.abs();
        let i = if a.x < a.y {
            if a.x < a.z {
                0
            } else {
                2
            }
        } else if a.y < a.z {
            1
        } else {
            2
        };
        let j = if i == 2 { 0 } else { i + 1 };
        let k = if i == 0 { 2 } else { i - 1 };
        let mut y_dir = Point::new(0.0, 0.0, 0.0);
        y_dir.set(j, src.get(k));
        y_dir.set(k, -src.get(j));
        let mut x_dir = Point::new(0.0, 0.0, 0.0);
        x_dir.set(i, src.get(j) * src.get(j) + src.get(k) * src.get(k));
        x_dir.set(j, -src.get(j) * src.get(i));
        x_dir.set(k, -src.get(k) * src.get(i));
        Self {
            src,
            x_dir,
            y_dir,
            window: CircleInterval::full(),
            ranges_to_avoid: Vec::new(),
        }
    }

    #[inline]
    pub fn src(&self) -> Point {
        self.src
    }

    /// Whether the edge `(src, dst)` satisfies every constraint so far.
    /// Edges longer than 90 degrees are never accepted.
    pub fn extend(&self, dst: Point) -> bool {
        if ChordAngle::between(self.src, dst) > ChordAngle::right() {
            return false;
        }
        let dir = self.direction(dst);
        if !self.window.contains_point(dir) {
            return false;
        }
        !self
            .ranges_to_avoid
            .iter()
            .any(|r| r.interval.contains_point(dir))
    }

    /// Require the output edge to pass within `r` of `p`.
    pub fn target_disc(&mut self, p: Point, r: ChordAngle) -> bool {
        let semiwidth = self.semiwidth(p, r, -1.0);
        if semiwidth >= PI {
            // The disc contains the source.
            return true;
        }
        if semiwidth < 0.0 {
            self.window = CircleInterval::empty();
            return false;
        }
        let center = self.direction(p);
        let target = CircleInterval::from_point(center).expanded(semiwidth);
        self.window = self.window.intersection(target);
        for range in std::mem::take(&mut self.ranges_to_avoid) {
            self.avoid_range(range.interval, range.on_left);
        }
        !self.window.is_empty()
    }

    /// Require the output edge to stay at least `r` from `p`, with `p` on
    /// the given side.
    pub fn avoid_disc(&mut self, p: Point, r: ChordAngle, disc_on_left: bool) -> bool {
        let semiwidth = self.semiwidth(p, r, 1.0);
        if semiwidth >= PI {
            // The disc contains the source and cannot be avoided.
            self.window = CircleInterval::empty();
            return false;
        }
        let center = self.direction(p);
        let (dleft, dright) = if disc_on_left {
            (FRAC_PI_2, semiwidth)
        } else {
            (semiwidth, FRAC_PI_2)
        };
        let interval = CircleInterval::new(
            remainder(center - dright, 2.0 * PI),
            remainder(center + dleft, 2.0 * PI),
        );
        if self.window.is_full() {
            self.ranges_to_avoid.push(RangeToAvoid {
                interval,
                on_left: disc_on_left,
            });
            return true;
        }
        self.avoid_range(interval, disc_on_left);
        !self.window.is_empty()
    }

    fn avoid_range(&mut self, avoid: CircleInterval, disc_on_left: bool) {
        // Of the two pieces left by removing a strictly interior range, only
        // the one pointing towards the disc can contain a valid direction.
        if self.window.contains(avoid) {
            self.window = if disc_on_left {
                CircleInterval::new(self.window.lo(), avoid.lo())
            } else {
                CircleInterval::new(avoid.hi(), self.window.hi())
            };
        } else {
            self.window = self.window.intersection(avoid.complement());
        }
    }

    fn direction(&self, p: Point) -> f64 {
        p.dot(self.y_dir).atan2(p.dot(self.x_dir))
    }

    /// Half the angle subtended at `src` by the disc `(p, r)`, rounded in
    /// `round_direction` (+1 or -1) by the combined direction and width
    /// error. Returns π when the disc contains `src`.
    fn semiwidth(&self, p: Point, r: ChordAngle, round_direction: f64) -> f64 {
        let r2 = r.length2();
        let mut a2 = ChordAngle::between(self.src, p).length2();
        a2 -= 64.0 * DBL_ERR * DBL_ERR * round_direction;
        if a2 <= r2 {
            return PI;
        }
        let sin2_r = r2 * (1.0 - 0.25 * r2);
        let sin2_a = a2 * (1.0 - 0.25 * a2);
        let semiwidth = (sin2_r / sin2_a).sqrt().asin();
        // Direction error 10ε at both ends, 4ε for center ± semiwidth, and a
        // relative error of 17ε in the width itself.
        let error = (2.0 * 10.0 + 4.0) * DBL_ERR + 17.0 * DBL_ERR * semiwidth;
        semiwidth + round_direction * error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLng;

    fn ll(lat: f64, lng: f64) -> Point {
        LatLng::from_degrees(lat, lng).to_point()
    }

    fn deg(d: f64) -> ChordAngle {
        ChordAngle::from_degrees(d)
    }

    #[test]
    fn test_unconstrained_accepts_short_edges_only() {
        let s = PolylineSimplifier::new(ll(0.0, 0.0));
        assert!(s.extend(ll(0.0, 10.0)));
        assert!(!s.extend(ll(0.0, 100.0)));
    }

    #[test]
    fn test_target_disc_narrows_window() {
        let mut s = PolylineSimplifier::new(ll(0.0, 0.0));
        assert!(s.target_disc(ll(0.0, 1.0), deg(0.1)));
        assert!(s.extend(ll(0.0, 2.0)));
        assert!(s.extend(ll(0.05, 2.0)));
        assert!(!s.extend(ll(1.0, 2.0)));
        assert!(!s.extend(ll(0.0, -2.0)));
    }

    #[test]
    fn test_disjoint_targets_fail() {
        let mut s = PolylineSimplifier::new(ll(0.0, 0.0));
        assert!(s.target_disc(ll(0.0, 1.0), deg(0.1)));
        assert!(!s.target_disc(ll(1.0, 0.0), deg(0.1)));
    }

    #[test]
    fn test_avoid_disc_respects_side() {
        // A disc just north of the edge (0,0)-(0,2) is on its left.
        let mut s = PolylineSimplifier::new(ll(0.0, 0.0));
        assert!(s.avoid_disc(ll(0.2, 1.0), deg(0.1), true));
        assert!(s.target_disc(ll(0.0, 2.0), deg(0.5)));
        assert!(s.extend(ll(0.0, 2.0)));
        assert!(!s.extend(ll(0.4, 2.0)));

        let mut s = PolylineSimplifier::new(ll(0.0, 0.0));
        assert!(s.avoid_disc(ll(0.2, 1.0), deg(0.1), false));
        assert!(!s.target_disc(ll(0.0, 2.0), deg(0.5)));
        assert!(!s.extend(ll(0.0, 2.0)));
    }

    #[test]
    fn test_avoid_disc_containing_source_fails() {
        let mut s = PolylineSimplifier::new(ll(0.0, 0.0));
        assert!(!s.avoid_disc(ll(0.0, 0.01), deg(0.1), true));
    }
}
