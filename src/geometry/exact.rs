//! Exact floating-point expansion arithmetic.
//!
//! An [`Expansion`] represents a real number as an unevaluated sum of
//! non-overlapping `f64` components sorted by increasing magnitude. Sums,
//! differences and products of expansions are exact, so the sign of any
//! polynomial in `f64` inputs can be computed without rounding error. This
//! backs the last stage of every geometric predicate.

use crate::types::Point;

#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bv = s - a;
    let av = s - bv;
    (s, (a - av) + (b - bv))
}

#[inline]
fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    (s, b - (s - a))
}

#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

/// An exact sum of non-overlapping doubles, smallest magnitude first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
    terms: Vec<f64>,
}

impl Expansion {
    #[inline]
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    #[inline]
    pub fn from_f64(a: f64) -> Self {
        if a == 0.0 {
            Self::zero()
        } else {
            Self { terms: vec![a] }
        }
    }

    /// Sign of the represented value: -1, 0 or +1.
    #[inline]
    pub fn sign(&self) -> i32 {
        match self.terms.last() {
            None => 0,
            Some(&t) if t > 0.0 => 1,
            Some(_) => -1,
        }
    }

    /// Nearest-`f64` style approximation of the value.
    pub fn estimate(&self) -> f64 {
        self.terms.iter().sum()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    fn grow(&mut self, b: f64) {
        if b == 0.0 {
            return;
        }
        let mut q = b;
        let mut out = Vec::with_capacity(self.terms.len() + 1);
        for &e in &self.terms {
            let (s, h) = two_sum(q, e);
            if h != 0.0 {
                out.push(h);
            }
            q = s;
        }
        if q != 0.0 {
            out.push(q);
        }
        self.terms = out;
    }

    /// Combine adjacent components so the representation stays short.
    fn compress(&mut self) {
        let m = self.terms.len();
        if m < 2 {
            return;
        }
        let e = &self.terms;
        let mut g = vec![0.0; m];
        let mut bottom = m - 1;
        let mut q = e[m - 1];
        for i in (0..m - 1).rev() {
            let (qnew, small) = fast_two_sum(q, e[i]);
            if small != 0.0 {
                g[bottom] = qnew;
                bottom -= 1;
                q = small;
            } else {
                q = qnew;
            }
        }
        g[bottom] = q;
        let mut h = Vec::with_capacity(m - bottom);
        for &gi in &g[bottom + 1..] {
            let (qnew, small) = fast_two_sum(gi, q);
            q = qnew;
            if small != 0.0 {
                h.push(small);
            }
        }
        if q != 0.0 {
            h.push(q);
        }
        self.terms = h;
    }

    pub fn add(&self, other: &Expansion) -> Expansion {
        let (mut acc, small) = if self.terms.len() >= other.terms.len() {
            (self.clone(), other)
        } else {
            (other.clone(), self)
        };
        for &t in &small.terms {
            acc.grow(t);
        }
        acc.compress();
        acc
    }

    pub fn sub(&self, other: &Expansion) -> Expansion {
        self.add(&other.neg())
    }

    pub fn neg(&self) -> Expansion {
        Expansion {
            terms: self.terms.iter().map(|t| -t).collect(),
        }
    }

    /// Multiply by a single double, exactly.
    pub fn scale(&self, b: f64) -> Expansion {
        let mut acc = Expansion::zero();
        if b == 0.0 {
            return acc;
        }
        for &e in &self.terms {
            let (p, err) = two_product(e, b);
            acc.grow(err);
            acc.grow(p);
        }
        acc.compress();
        acc
    }

    pub fn mul(&self, other: &Expansion) -> Expansion {
        let (long, short) = if self.terms.len() >= other.terms.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut acc = Expansion::zero();
        for &b in &short.terms {
            acc = acc.add(&long.scale(b));
        }
        acc
    }
}

/// A 3-vector of exact values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExactVec3 {
    pub x: Expansion,
    pub y: Expansion,
    pub z: Expansion,
}

impl ExactVec3 {
    pub fn from_point(p: Point) -> Self {
        Self {
            x: Expansion::from_f64(p.x),
            y: Expansion::from_f64(p.y),
            z: Expansion::from_f64(p.z),
        }
    }

    pub fn get(&self, axis: usize) -> &Expansion {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }

    pub fn add(&self, o: &ExactVec3) -> ExactVec3 {
        ExactVec3 {
            x: self.x.add(&o.x),
            y: self.y.add(&o.y),
            z: self.z.add(&o.z),
        }
    }

    pub fn sub(&self, o: &ExactVec3) -> ExactVec3 {
        ExactVec3 {
            x: self.x.sub(&o.x),
            y: self.y.sub(&o.y),
            z: self.z.sub(&o.z),
        }
    }

    pub fn scale(&self, s: &Expansion) -> ExactVec3 {
        ExactVec3 {
            x: self.x.mul(s),
            y: self.y.mul(s),
            z: self.z.mul(s),
        }
    }

    pub fn dot(&self, o: &ExactVec3) -> Expansion {
        self.x.mul(&o.x).add(&self.y.mul(&o.y)).add(&self.z.mul(&o.z))
    }

    pub fn cross(&self, o: &ExactVec3) -> ExactVec3 {
        ExactVec3 {
            x: self.y.mul(&o.z).sub(&self.z.mul(&o.y)),
            y: self.z.mul(&o.x).sub(&self.x.mul(&o.z)),
            z: self.x.mul(&o.y).sub(&self.y.mul(&o.x)),
        }
    }

    pub fn norm2(&self) -> Expansion {
        self.dot(self)
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero() && self.z.is_zero()
    }

    /// Rounded, normalized direction of the vector.
    pub fn to_point_normalized(&self) -> Point {
        // Scale by the largest component first so the estimate does not
        // underflow for tiny cross products.
        let v = Point::new(self.x.estimate(), self.y.estimate(), self.z.estimate());
        let m = v.x.abs().max(v.y.abs()).max(v.z.abs());
        if m == 0.0 || !m.is_finite() {
            return Point::new(0.0, 0.0, 0.0);
        }
        (v * (1.0 / m)).normalize()
    }
}
