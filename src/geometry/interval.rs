//! Closed intervals on the unit circle.

use std::f64::consts::PI;

/// A closed arc of directions `[lo, hi]` in `[-π, π]`, traversed
/// counter-clockwise from `lo` to `hi`.
///
/// `lo > hi` means the interval wraps through ±π. The empty interval is
/// `(π, -π)` and the full interval is `(-π, π)`. `-π` is normalized to `π`
/// except where it is needed to represent those two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleInterval {
    lo: f64,
    hi: f64,
}

impl CircleInterval {
    pub fn new(lo: f64, hi: f64) -> Self {
        let mut lo = lo;
        let mut hi = hi;
        if lo == -PI && hi != PI {
            lo = PI;
        }
        if hi == -PI && lo != PI {
            hi = PI;
        }
        Self { lo, hi }
    }

    #[inline]
    pub const fn empty() -> Self {
        Self { lo: PI, hi: -PI }
    }

    #[inline]
    pub const fn full() -> Self {
        Self { lo: -PI, hi: PI }
    }

    pub fn from_point(p: f64) -> Self {
        let p = if p == -PI { PI } else { p };
        Self { lo: p, hi: p }
    }

    #[inline]
    pub fn lo(self) -> f64 {
        self.lo
    }

    #[inline]
    pub fn hi(self) -> f64 {
        self.hi
    }

    #[inline]
    pub fn is_full(self) -> bool {
        self.lo == -PI && self.hi == PI
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.lo == PI && self.hi == -PI
    }

    #[inline]
    pub fn is_inverted(self) -> bool {
        self.lo > self.hi
    }

    /// Arc length; negative for the empty interval.
    pub fn length(self) -> f64 {
        let mut len = self.hi - self.lo;
        if len >= 0.0 {
            return len;
        }
        len += 2.0 * PI;
        if len > 0.0 {
            len
        } else {
            -1.0
        }
    }

    /// Contains `p`, assuming `p` is in `(-π, π]`.
    #[inline]
    pub fn fast_contains(self, p: f64) -> bool {
        if self.is_inverted() {
            (p >= self.lo || p <= self.hi) && !self.is_empty()
        } else {
            p >= self.lo && p <= self.hi
        }
    }

    pub fn contains_point(self, p: f64) -> bool {
        let p = if p == -PI { PI } else { p };
        self.fast_contains(p)
    }

    pub fn contains(self, y: CircleInterval) -> bool {
        if self.is_inverted() {
            if y.is_inverted() {
                return y.lo >= self.lo && y.hi <= self.hi;
            }
            (y.lo >= self.lo || y.hi <= self.hi) && !self.is_empty()
        } else {
            if y.is_inverted() {
                return self.is_full() || y.is_empty();
            }
            y.lo >= self.lo && y.hi <= self.hi
        }
    }

    /// Closure of the set of directions not in this interval.
    pub fn complement(self) -> Self {
        if self.lo == self.hi {
            return Self::full();
        }
        Self::new(self.hi, self.lo)
    }

    pub fn intersection(self, y: CircleInterval) -> Self {
        if y.is_empty() {
            return Self::empty();
        }
        if self.fast_contains(y.lo) {
            if self.fast_contains(y.hi) {
                // Either `y` lies inside this interval, or the two overlap at
                // both ends; the shorter one is the answer.
                if y.length() < self.length() {
                    return y;
                }
                return self;
            }
            return Self::new(y.lo, self.hi);
        }
        if self.fast_contains(y.hi) {
            return Self::new(self.lo, y.hi);
        }
        if y.fast_contains(self.lo) {
            return self;
        }
        Self::empty()
    }

    /// Grow (or shrink, for negative `margin`) both ends by `margin`.
    pub fn expanded(self, margin: f64) -> Self {
        if margin >= 0.0 {
            if self.is_empty() {
                return self;
            }
            if self.length() + 2.0 * margin + 2.0 * f64::EPSILON >= 2.0 * PI {
                return Self::full();
            }
        } else {
            if self.is_full() {
                return self;
            }
            if self.length() + 2.0 * margin - 2.0 * f64::EPSILON <= 0.0 {
                return Self::empty();
            }
        }
        let mut lo = remainder(self.lo - margin, 2.0 * PI);
        let hi = remainder(self.hi + margin, 2.0 * PI);
        if lo <= -PI {
            lo = PI;
        }
        Self { lo, hi }
    }
}

/// IEEE remainder: `x - n*y` where `n` is `x/y` rounded to nearest even.
pub(crate) fn remainder(x: f64, y: f64) -> f64 {
    let q = x / y;
    let mut n = q.round();
    if (q - q.trunc()).abs() == 0.5 && n % 2.0 != 0.0 {
        n -= q.signum();
    }
    x - n * y
}
