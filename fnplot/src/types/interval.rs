use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Stores a range, with conservative calculations to guarantee that it always
/// contains the actual value.
///
/// Two special values carry meaning beyond a plain range:
/// - [`Interval::EMPTY`] means that the expression is undefined everywhere in
///   the input (e.g. `sqrt` of a negative range)
/// - [`Interval::WHOLE`] means that the result could not be bounded (e.g.
///   division by a range which includes zero)
///
/// # Warning
/// This implementation does not set rounding modes, so it may not be
/// _perfect_; see [`Interval::widen`] for a strictly outward-rounded step.
#[derive(Copy, Clone, PartialEq, Serialize)]
pub struct Interval {
    #[serde(rename = "lo")]
    lower: f64,
    #[serde(rename = "hi")]
    upper: f64,
}

impl std::fmt::Debug for Interval {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> Result<(), std::fmt::Error> {
        f.debug_tuple("")
            .field(&self.lower)
            .field(&self.upper)
            .finish()
    }
}

impl Interval {
    /// The interval containing no values
    pub const EMPTY: Self = Self {
        lower: f64::INFINITY,
        upper: f64::NEG_INFINITY,
    };

    /// The unbounded interval `(-∞, +∞)`
    pub const WHOLE: Self = Self {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
    };

    /// Builds a new interval
    ///
    /// # Panics
    /// Panics if `lower > upper` or either bound is `NaN`; use
    /// [`Interval::EMPTY`] to represent the empty set.
    #[inline]
    pub fn new(lower: f64, upper: f64) -> Self {
        assert!(upper >= lower, "invalid interval [{lower}, {upper}]");
        Self { lower, upper }
    }

    /// Builds an interval from two bounds, returning the whole interval if
    /// either bound is `NaN`
    fn checked(lower: f64, upper: f64) -> Self {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            Self::WHOLE
        } else {
            Self { lower, upper }
        }
    }

    /// Returns the lower bound of the interval
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }
    /// Returns the upper bound of the interval
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Checks whether this is the empty interval
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper || self.lower.is_nan() || self.upper.is_nan()
    }

    /// Checks whether this interval covers the entire real line
    #[inline]
    pub fn is_whole(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    /// Checks whether both bounds are equal
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.lower == self.upper
    }

    /// Checks whether the given value is contained in the (closed) interval
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }

    /// Checks whether zero is contained in the interval
    #[inline]
    pub fn zero_in(&self) -> bool {
        self.contains(0.0)
    }

    /// Checks whether two intervals share at least one value
    ///
    /// ```
    /// # use fnplot::types::Interval;
    /// let a = Interval::new(0.0, 1.0);
    /// assert!(a.overlaps(Interval::new(1.0, 2.0)));
    /// assert!(!a.overlaps(Interval::new(1.5, 2.0)));
    /// assert!(!a.overlaps(Interval::EMPTY));
    /// ```
    pub fn overlaps(&self, other: Interval) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.lower <= other.upper
            && other.lower <= self.upper
    }

    /// Returns the smallest interval enclosing both inputs
    pub fn hull(self, other: Interval) -> Self {
        if self.is_empty() {
            other
        } else if other.is_empty() {
            self
        } else {
            Self {
                lower: self.lower.min(other.lower),
                upper: self.upper.max(other.upper),
            }
        }
    }

    /// Pushes both bounds outward by one unit in the last place
    ///
    /// Infinite bounds and the empty interval are returned unchanged.
    pub fn widen(self) -> Self {
        if self.is_empty() {
            return self;
        }
        Self {
            lower: self.lower.next_down(),
            upper: self.upper.next_up(),
        }
    }

    /// Calculates the absolute value of the interval
    pub fn abs(self) -> Self {
        if self.is_empty() {
            self
        } else if self.lower < 0.0 {
            if self.upper > 0.0 {
                Interval::new(0.0, self.upper.max(-self.lower))
            } else {
                Interval::new(-self.upper, -self.lower)
            }
        } else {
            self
        }
    }

    /// Squares the interval
    ///
    /// Note that this has tighter bounds than multiplication, because we know
    /// that both sides of the multiplication are the same value.
    pub fn square(self) -> Self {
        if self.is_empty() {
            self
        } else if self.upper < 0.0 {
            Interval::new(self.upper.powi(2), self.lower.powi(2))
        } else if self.lower > 0.0 {
            Interval::new(self.lower.powi(2), self.upper.powi(2))
        } else {
            Interval::new(0.0, self.lower.abs().max(self.upper.abs()).powi(2))
        }
    }

    /// Calculates the square root of the interval
    ///
    /// Negative values are discarded; if the interval lies entirely below
    /// zero, returns [`Interval::EMPTY`].
    pub fn sqrt(self) -> Self {
        if self.is_empty() || self.upper < 0.0 {
            Self::EMPTY
        } else {
            Interval::new(self.lower.max(0.0).sqrt(), self.upper.sqrt())
        }
    }

    /// Computes the exponent function applied to the interval
    pub fn exp(self) -> Self {
        if self.is_empty() {
            self
        } else {
            Interval::new(self.lower.exp(), self.upper.exp())
        }
    }

    fn log_with(self, f: fn(f64) -> f64) -> Self {
        if self.is_empty() || self.upper <= 0.0 {
            Self::EMPTY
        } else if self.lower <= 0.0 {
            Interval::new(f64::NEG_INFINITY, f(self.upper))
        } else {
            Interval::new(f(self.lower), f(self.upper))
        }
    }

    /// Computes the natural log of the input interval
    ///
    /// Returns [`Interval::EMPTY`] if the interval is entirely non-positive
    pub fn ln(self) -> Self {
        self.log_with(f64::ln)
    }

    /// Computes the base-10 log of the input interval
    pub fn log10(self) -> Self {
        self.log_with(f64::log10)
    }

    /// Computes the base-2 log of the input interval
    pub fn log2(self) -> Self {
        self.log_with(f64::log2)
    }

    /// Shared implementation for `sin` and `cos`
    ///
    /// `peak` and `trough` are the offsets (within one period of `2π`) of the
    /// function's maximum and minimum.
    fn periodic(self, f: fn(f64) -> f64, peak: f64, trough: f64) -> Self {
        if self.is_empty() {
            return self;
        }
        if !self.lower.is_finite()
            || !self.upper.is_finite()
            || self.width() >= TAU
        {
            return Interval::new(-1.0, 1.0);
        }
        let hits = |offset: f64| {
            let k = ((self.lower - offset) / TAU).ceil();
            offset + k * TAU <= self.upper
        };
        let a = f(self.lower);
        let b = f(self.upper);
        let upper = if hits(peak) { 1.0 } else { a.max(b) };
        let lower = if hits(trough) { -1.0 } else { a.min(b) };
        Interval::checked(lower, upper)
    }

    /// Computes the sine of the interval
    pub fn sin(self) -> Self {
        self.periodic(f64::sin, FRAC_PI_2, -FRAC_PI_2)
    }

    /// Computes the cosine of the interval
    pub fn cos(self) -> Self {
        self.periodic(f64::cos, 0.0, PI)
    }

    /// Computes the tangent of the interval
    ///
    /// Returns [`Interval::WHOLE`] if the interval contains an asymptote
    pub fn tan(self) -> Self {
        if self.is_empty() {
            return self;
        }
        if !self.lower.is_finite()
            || !self.upper.is_finite()
            || self.width() >= PI
        {
            return Self::WHOLE;
        }
        let k = ((self.lower - FRAC_PI_2) / PI).ceil();
        if FRAC_PI_2 + k * PI <= self.upper {
            return Self::WHOLE;
        }
        Interval::checked(self.lower.tan(), self.upper.tan())
    }

    /// Clamps the interval to `[-1, 1]`, returning `None` if nothing is left
    fn clip_unit(self) -> Option<(f64, f64)> {
        let lower = self.lower.max(-1.0);
        let upper = self.upper.min(1.0);
        (!self.is_empty() && lower <= upper).then_some((lower, upper))
    }

    /// Computes the arcsine of the interval
    ///
    /// Values outside of `[-1, 1]` are discarded
    pub fn asin(self) -> Self {
        match self.clip_unit() {
            Some((lower, upper)) => Interval::new(lower.asin(), upper.asin()),
            None => Self::EMPTY,
        }
    }

    /// Computes the arccosine of the interval
    ///
    /// Values outside of `[-1, 1]` are discarded
    pub fn acos(self) -> Self {
        match self.clip_unit() {
            Some((lower, upper)) => Interval::new(upper.acos(), lower.acos()),
            None => Self::EMPTY,
        }
    }

    /// Computes the arctangent of the interval
    pub fn atan(self) -> Self {
        if self.is_empty() {
            self
        } else {
            Interval::new(self.lower.atan(), self.upper.atan())
        }
    }

    /// Rounds both bounds down
    pub fn floor(self) -> Self {
        if self.is_empty() {
            self
        } else {
            Interval::new(self.lower.floor(), self.upper.floor())
        }
    }

    /// Rounds both bounds up
    pub fn ceil(self) -> Self {
        if self.is_empty() {
            self
        } else {
            Interval::new(self.lower.ceil(), self.upper.ceil())
        }
    }

    /// Computes the sign (`-1`, `0`, or `1`) of the interval
    pub fn sign(self) -> Self {
        if self.is_empty() {
            return self;
        }
        let sign = |v: f64| {
            if v < 0.0 {
                -1.0
            } else if v > 0.0 {
                1.0
            } else {
                0.0
            }
        };
        Interval::new(sign(self.lower), sign(self.upper))
    }

    /// Calculates the reciprocal of the interval
    ///
    /// If the interval includes 0, returns [`Interval::WHOLE`]
    pub fn recip(self) -> Self {
        Interval::from(1.0) / self
    }

    /// Calculates the minimum of two intervals
    pub fn min(self, rhs: Self) -> Self {
        if self.is_empty() || rhs.is_empty() {
            return Self::EMPTY;
        }
        Interval::new(self.lower.min(rhs.lower), self.upper.min(rhs.upper))
    }

    /// Calculates the maximum of two intervals
    pub fn max(self, rhs: Self) -> Self {
        if self.is_empty() || rhs.is_empty() {
            return Self::EMPTY;
        }
        Interval::new(self.lower.max(rhs.lower), self.upper.max(rhs.upper))
    }

    /// Raises the interval to a non-negative integer power
    fn powu(self, n: u32) -> Self {
        let n = n as i32;
        if n == 0 {
            Interval::from(1.0)
        } else if n % 2 == 1 {
            Interval::checked(self.lower.powi(n), self.upper.powi(n))
        } else if self.lower >= 0.0 {
            Interval::new(self.lower.powi(n), self.upper.powi(n))
        } else if self.upper <= 0.0 {
            Interval::new(self.upper.powi(n), self.lower.powi(n))
        } else {
            let m = self.lower.abs().max(self.upper.abs());
            Interval::new(0.0, m.powi(n))
        }
    }

    /// Raises the interval to the power of another interval
    ///
    /// Integer exponents (given as a singleton interval) accept negative
    /// bases; otherwise, only the non-negative part of the base is used, and
    /// an entirely negative base produces [`Interval::EMPTY`].
    pub fn pow(self, exp: Interval) -> Self {
        if self.is_empty() || exp.is_empty() {
            return Self::EMPTY;
        }
        let singleton = exp.is_singleton() && exp.lower.is_finite();
        if singleton {
            let p = exp.lower;
            if p == p.trunc() && p.abs() < i32::MAX as f64 {
                let n = p.abs() as u32;
                let out = self.powu(n);
                return if p < 0.0 { out.recip() } else { out };
            }
        }
        if self.upper < 0.0 {
            return Self::EMPTY;
        }
        let base = Interval::new(self.lower.max(0.0), self.upper);
        if singleton {
            // Monotonic on the non-negative half-line
            let p = exp.lower;
            let a = base.lower.powf(p);
            let b = base.upper.powf(p);
            Interval::checked(a.min(b), a.max(b))
        } else if base.upper == 0.0 {
            if exp.lower > 0.0 {
                Interval::from(0.0)
            } else {
                Self::WHOLE
            }
        } else {
            (exp * base.ln()).exp()
        }
    }

    /// Returns the midpoint of the interval
    pub fn midpoint(self) -> f64 {
        self.lower + (self.upper - self.lower) / 2.0
    }

    /// Splits the interval at the midpoint
    ///
    /// ```
    /// # use fnplot::types::Interval;
    /// let a = Interval::new(0.0, 1.0);
    /// let (lo, hi) = a.split();
    /// assert_eq!(lo, Interval::new(0.0, 0.5));
    /// assert_eq!(hi, Interval::new(0.5, 1.0));
    /// ```
    pub fn split(self) -> (Self, Self) {
        let mid = self.midpoint();
        (
            Interval::new(self.lower, mid),
            Interval::new(mid, self.upper),
        )
    }

    /// Calculates the width of the interval
    ///
    /// The empty interval has a width of zero.
    ///
    /// ```
    /// # use fnplot::types::Interval;
    /// let a = Interval::new(2.0, 3.0);
    /// assert_eq!(a.width(), 1.0);
    /// let b = Interval::new(2.0, 5.0);
    /// assert_eq!(b.width(), 3.0);
    /// ```
    pub fn width(self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.upper - self.lower
        }
    }

    /// Replaces the lower bound, keeping the interval valid
    pub(crate) fn set_lower(&mut self, v: f64) {
        self.lower = v.min(self.upper);
    }

    /// Replaces the upper bound, keeping the interval valid
    pub(crate) fn set_upper(&mut self, v: f64) {
        self.upper = v.max(self.lower);
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "∅")
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper)
        }
    }
}

impl From<[f64; 2]> for Interval {
    fn from(i: [f64; 2]) -> Interval {
        Interval::new(i[0], i[1])
    }
}

/// Converts a single value into a degenerate interval
///
/// `NaN` becomes [`Interval::EMPTY`], since the expression is undefined there.
impl From<f64> for Interval {
    fn from(f: f64) -> Self {
        if f.is_nan() {
            Self::EMPTY
        } else {
            Interval::new(f, f)
        }
    }
}

/// `0 · ∞` is treated as zero, which is the correct limit for interval bounds
fn mul_bound(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

impl std::ops::Add<Interval> for Interval {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        if self.is_empty() || rhs.is_empty() {
            return Self::EMPTY;
        }
        Interval::checked(self.lower + rhs.lower, self.upper + rhs.upper)
    }
}

impl std::ops::Sub<Interval> for Interval {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        if self.is_empty() || rhs.is_empty() {
            return Self::EMPTY;
        }
        Interval::checked(self.lower - rhs.upper, self.upper - rhs.lower)
    }
}

impl std::ops::Mul<Interval> for Interval {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        if self.is_empty() || rhs.is_empty() {
            return Self::EMPTY;
        }
        let mut lower = f64::INFINITY;
        let mut upper = f64::NEG_INFINITY;
        for i in [self.lower, self.upper] {
            for j in [rhs.lower, rhs.upper] {
                let v = mul_bound(i, j);
                lower = lower.min(v);
                upper = upper.max(v);
            }
        }
        Interval::new(lower, upper)
    }
}

impl std::ops::Div<Interval> for Interval {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        if self.is_empty() || rhs.is_empty() {
            return Self::EMPTY;
        }
        if rhs.zero_in() {
            return Self::WHOLE;
        }
        let mut out = [0.0; 4];
        let mut k = 0;
        for i in [self.lower, self.upper] {
            for j in [rhs.lower, rhs.upper] {
                out[k] = i / j;
                k += 1;
            }
        }
        if out.iter().any(|v| v.is_nan()) {
            return Self::WHOLE;
        }
        let mut lower = out[0];
        let mut upper = out[0];
        for &v in &out[1..] {
            lower = lower.min(v);
            upper = upper.max(v);
        }
        Interval::new(lower, upper)
    }
}

impl std::ops::Neg for Interval {
    type Output = Self;
    fn neg(self) -> Self {
        if self.is_empty() {
            self
        } else {
            Interval::new(-self.upper, -self.lower)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_and_whole() {
        assert!(Interval::EMPTY.is_empty());
        assert!(!Interval::EMPTY.is_whole());
        assert!(Interval::WHOLE.is_whole());
        assert!(!Interval::WHOLE.is_empty());
        assert!(Interval::from(f64::NAN).is_empty());
        assert!((-Interval::EMPTY).is_empty());
        assert!((Interval::EMPTY + Interval::WHOLE).is_empty());
    }

    #[test]
    fn test_div() {
        let a = Interval::new(1.0, 2.0);
        assert!((a / Interval::new(-1.0, 1.0)).is_whole());
        assert!((a / Interval::new(0.0, 1.0)).is_whole());
        assert_eq!(a / Interval::new(2.0, 4.0), Interval::new(0.25, 1.0));
        assert_eq!(a / Interval::new(-4.0, -2.0), Interval::new(-1.0, -0.25));
    }

    #[test]
    fn test_mul_with_infinity() {
        let a = Interval::new(0.0, 1.0);
        let out = a * Interval::WHOLE;
        assert!(out.is_whole());
        let out = Interval::from(0.0) * Interval::WHOLE;
        assert_eq!(out, Interval::from(0.0));
    }

    #[test]
    fn test_sqrt() {
        assert!(Interval::new(-10.0, -1.0).sqrt().is_empty());
        assert_eq!(Interval::new(-4.0, 4.0).sqrt(), Interval::new(0.0, 2.0));
        assert_eq!(Interval::new(1.0, 4.0).sqrt(), Interval::new(1.0, 2.0));
    }

    #[test]
    fn test_ln() {
        assert!(Interval::new(-2.0, 0.0).ln().is_empty());
        let v = Interval::new(-2.0, 1.0).ln();
        assert_eq!(v, Interval::new(f64::NEG_INFINITY, 0.0));
    }

    #[test]
    fn test_sin_cos() {
        let v = Interval::new(0.0, PI).sin();
        assert_eq!(v.upper(), 1.0);
        assert!(v.lower().abs() < 1e-12);

        let v = Interval::new(0.1, 0.2).cos();
        assert_eq!(v, Interval::new(0.2f64.cos(), 0.1f64.cos()));

        let v = Interval::new(3.0, 3.5).cos();
        assert_eq!(v.lower(), -1.0);

        let v = Interval::new(-100.0, 100.0).sin();
        assert_eq!(v, Interval::new(-1.0, 1.0));
    }

    #[test]
    fn test_tan() {
        assert!(Interval::new(1.0, 2.0).tan().is_whole());
        let v = Interval::new(-0.5, 0.5).tan();
        assert_eq!(v, Interval::new((-0.5f64).tan(), 0.5f64.tan()));
    }

    #[test]
    fn test_asin_acos() {
        assert!(Interval::new(2.0, 3.0).asin().is_empty());
        let v = Interval::new(0.0, 3.0).asin();
        assert_eq!(v, Interval::new(0.0, FRAC_PI_2));
        let v = Interval::new(-3.0, 0.0).acos();
        assert_eq!(v, Interval::new(FRAC_PI_2, PI));
    }

    #[test]
    fn test_pow() {
        let x = Interval::new(-2.0, 3.0);
        assert_eq!(x.pow(2.0.into()), Interval::new(0.0, 9.0));
        assert_eq!(x.pow(3.0.into()), Interval::new(-8.0, 27.0));
        assert!(x.pow((-1.0).into()).is_whole());
        assert_eq!(
            Interval::new(2.0, 4.0).pow((-1.0).into()),
            Interval::new(0.25, 0.5)
        );
        let v = x.pow(0.5.into());
        assert_eq!(v.lower(), 0.0);
        approx::assert_relative_eq!(v.upper(), 3f64.sqrt());
        let v = Interval::new(0.0, 4.0).pow((-0.5).into());
        assert_eq!(v, Interval::new(0.5, f64::INFINITY));
        let v = Interval::new(1.0, 2.0).pow(Interval::new(1.0, 2.0));
        assert!(v.contains(1.0) && v.contains(4.0 - 1e-9));
        assert!(Interval::new(-3.0, -1.0).pow(0.5.into()).is_empty());
    }

    #[test]
    fn test_overlap_and_hull() {
        let a = Interval::new(-3.0, -1.0);
        let b = Interval::new(1.0, 3.0);
        assert!(!a.overlaps(b));
        assert_eq!(a.hull(b), Interval::new(-3.0, 3.0));
        assert_eq!(Interval::EMPTY.hull(b), b);
    }

    #[test]
    fn test_widen() {
        let a = Interval::new(1.0, 2.0).widen();
        assert!(a.lower() < 1.0 && a.upper() > 2.0);
        assert!(Interval::WHOLE.widen().is_whole());
        assert!(Interval::EMPTY.widen().is_empty());
    }
}
