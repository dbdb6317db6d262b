use crate::types::Interval;

/// Trait for math operations used during evaluation
///
/// This is implemented for `f64` (point evaluation) and [`Interval`]
/// (interval evaluation); opcodes are applied through it, so the two backends
/// share a single interpreter.
#[allow(missing_docs)]
pub trait EvalMath:
    Clone
    + Copy
    + From<f64>
    + std::ops::Add<Self, Output = Self>
    + std::ops::Mul<Self, Output = Self>
    + std::ops::Sub<Self, Output = Self>
    + std::ops::Div<Self, Output = Self>
    + std::ops::Neg<Output = Self>
{
    fn abs(self) -> Self;
    fn recip(self) -> Self;
    fn sqrt(self) -> Self;
    fn square(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn log10(self) -> Self;
    fn log2(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
    fn sign(self) -> Self;
    fn pow(self, rhs: Self) -> Self;
    fn min(self, rhs: Self) -> Self;
    fn max(self, rhs: Self) -> Self;

    /// Widens the value to account for rounding error
    ///
    /// This is a no-op for scalar types.
    fn round_outward(self) -> Self;

    /// Returns the single finite value this represents, if there is one
    fn singleton(self) -> Option<f64>;
}

impl EvalMath for f64 {
    fn abs(self) -> Self {
        f64::abs(self)
    }
    fn recip(self) -> Self {
        1.0 / self
    }
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    fn square(self) -> Self {
        self * self
    }
    fn exp(self) -> Self {
        f64::exp(self)
    }
    fn ln(self) -> Self {
        f64::ln(self)
    }
    fn log10(self) -> Self {
        f64::log10(self)
    }
    fn log2(self) -> Self {
        f64::log2(self)
    }
    fn sin(self) -> Self {
        f64::sin(self)
    }
    fn cos(self) -> Self {
        f64::cos(self)
    }
    fn tan(self) -> Self {
        f64::tan(self)
    }
    fn asin(self) -> Self {
        f64::asin(self)
    }
    fn acos(self) -> Self {
        f64::acos(self)
    }
    fn atan(self) -> Self {
        f64::atan(self)
    }
    fn floor(self) -> Self {
        f64::floor(self)
    }
    fn ceil(self) -> Self {
        f64::ceil(self)
    }
    fn sign(self) -> Self {
        // Zero and NaN pass through (unlike `f64::signum`)
        if self > 0.0 {
            1.0
        } else if self < 0.0 {
            -1.0
        } else {
            self
        }
    }
    fn pow(self, rhs: Self) -> Self {
        // Integer powers match `Interval::pow` bit-for-bit
        if rhs == rhs.trunc() && rhs.abs() < i32::MAX as f64 {
            f64::powi(self, rhs as i32)
        } else {
            f64::powf(self, rhs)
        }
    }
    fn min(self, rhs: Self) -> Self {
        if self.is_nan() || rhs.is_nan() {
            f64::NAN
        } else {
            f64::min(self, rhs)
        }
    }
    fn max(self, rhs: Self) -> Self {
        if self.is_nan() || rhs.is_nan() {
            f64::NAN
        } else {
            f64::max(self, rhs)
        }
    }
    fn round_outward(self) -> Self {
        self
    }
    fn singleton(self) -> Option<f64> {
        self.is_finite().then_some(self)
    }
}

impl EvalMath for Interval {
    fn abs(self) -> Self {
        Interval::abs(self)
    }
    fn recip(self) -> Self {
        Interval::recip(self)
    }
    fn sqrt(self) -> Self {
        Interval::sqrt(self)
    }
    fn square(self) -> Self {
        Interval::square(self)
    }
    fn exp(self) -> Self {
        Interval::exp(self)
    }
    fn ln(self) -> Self {
        Interval::ln(self)
    }
    fn log10(self) -> Self {
        Interval::log10(self)
    }
    fn log2(self) -> Self {
        Interval::log2(self)
    }
    fn sin(self) -> Self {
        Interval::sin(self)
    }
    fn cos(self) -> Self {
        Interval::cos(self)
    }
    fn tan(self) -> Self {
        Interval::tan(self)
    }
    fn asin(self) -> Self {
        Interval::asin(self)
    }
    fn acos(self) -> Self {
        Interval::acos(self)
    }
    fn atan(self) -> Self {
        Interval::atan(self)
    }
    fn floor(self) -> Self {
        Interval::floor(self)
    }
    fn ceil(self) -> Self {
        Interval::ceil(self)
    }
    fn sign(self) -> Self {
        Interval::sign(self)
    }
    fn pow(self, rhs: Self) -> Self {
        Interval::pow(self, rhs)
    }
    fn min(self, rhs: Self) -> Self {
        Interval::min(self, rhs)
    }
    fn max(self, rhs: Self) -> Self {
        Interval::max(self, rhs)
    }
    fn round_outward(self) -> Self {
        self.widen()
    }
    fn singleton(self) -> Option<f64> {
        (self.is_singleton() && self.lower().is_finite()).then(|| self.lower())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn point_sign() {
        assert_eq!(EvalMath::sign(2.0f64), 1.0);
        assert_eq!(EvalMath::sign(-0.5f64), -1.0);
        assert_eq!(EvalMath::sign(0.0f64), 0.0);
        assert!(EvalMath::sign(f64::NAN).is_nan());
    }

    #[test]
    fn point_min_max_nan() {
        assert!(EvalMath::min(f64::NAN, 1.0).is_nan());
        assert!(EvalMath::max(1.0, f64::NAN).is_nan());
        assert_eq!(EvalMath::min(2.0f64, 1.0), 1.0);
    }

    #[test]
    fn singletons() {
        assert_eq!(EvalMath::singleton(Interval::from(3.0)), Some(3.0));
        assert_eq!(EvalMath::singleton(Interval::new(1.0, 2.0)), None);
        assert_eq!(EvalMath::singleton(Interval::EMPTY), None);
        assert_eq!(EvalMath::singleton(f64::NAN), None);
    }
}
