//! Mapping between function space and screen space
use crate::Error;
use serde::{Deserialize, Serialize};

/// Kind of axis
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AxisType {
    /// Evenly spaced values
    #[default]
    Linear,
    /// Evenly spaced powers of ten
    Log,
}

/// Returns `n` evenly spaced values from `lo` to `hi` (inclusive)
///
/// ```
/// # use fnplot::scale::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), [0.0, 0.25, 0.5, 0.75, 1.0]);
/// ```
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + i as f64 * step).collect()
        }
    }
}

/// Returns `n` values from `10^lo` to `10^hi`, evenly spaced in the exponent
pub fn logspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    linspace(lo, hi, n)
        .into_iter()
        .map(|v| 10f64.powf(v))
        .collect()
}

/// Checks that `[lo, hi]` is a valid, finite, non-degenerate domain
pub(crate) fn check_domain(axis: char, [lo, hi]: [f64; 2]) -> Result<(), Error> {
    if lo.is_finite() && hi.is_finite() && lo < hi {
        Ok(())
    } else {
        Err(Error::InvertedDomain { axis, lo, hi })
    }
}

/// Maps a function-space domain onto a pixel range
///
/// The range may be reversed (e.g. `[height, 0]` for a y axis, which grows
/// downwards on screen).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scale {
    kind: AxisType,
    domain: [f64; 2],
    range: [f64; 2],
}

impl Scale {
    /// Builds a new scale
    ///
    /// `axis` is only used for error reporting.
    pub fn new(
        axis: char,
        kind: AxisType,
        domain: [f64; 2],
        range: [f64; 2],
    ) -> Result<Self, Error> {
        check_domain(axis, domain)?;
        if kind == AxisType::Log && domain[0] <= 0.0 {
            return Err(Error::NonPositiveLogDomain {
                lo: domain[0],
                hi: domain[1],
            });
        }
        Ok(Self {
            kind,
            domain,
            range,
        })
    }

    /// Returns the axis type
    pub fn kind(&self) -> AxisType {
        self.kind
    }

    /// Returns the function-space domain
    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// Returns the pixel-space range
    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    /// Position of `v` along the domain, from 0 to 1
    fn normalize(&self, v: f64) -> f64 {
        let [lo, hi] = self.domain;
        match self.kind {
            AxisType::Linear => (v - lo) / (hi - lo),
            AxisType::Log => (v.log10() - lo.log10()) / (hi.log10() - lo.log10()),
        }
    }

    /// Maps a function-space value to pixels
    ///
    /// ```
    /// # use fnplot::scale::{AxisType, Scale};
    /// let s = Scale::new('x', AxisType::Linear, [-1.0, 1.0], [0.0, 100.0]).unwrap();
    /// assert_eq!(s.map(0.0), 50.0);
    /// assert_eq!(s.invert(25.0), -0.5);
    ///
    /// let s = Scale::new('x', AxisType::Log, [1.0, 100.0], [0.0, 100.0]).unwrap();
    /// assert_eq!(s.map(10.0), 50.0);
    /// ```
    pub fn map(&self, v: f64) -> f64 {
        let [r0, r1] = self.range;
        r0 + self.normalize(v) * (r1 - r0)
    }

    /// Maps a pixel position back to function space
    pub fn invert(&self, px: f64) -> f64 {
        let [r0, r1] = self.range;
        let t = (px - r0) / (r1 - r0);
        let [lo, hi] = self.domain;
        match self.kind {
            AxisType::Linear => lo + t * (hi - lo),
            AxisType::Log => {
                let (a, b) = (lo.log10(), hi.log10());
                10f64.powf(a + t * (b - a))
            }
        }
    }

    /// Returns `n` sample positions across `[lo, hi]`, spaced to match this
    /// axis (linearly or logarithmically)
    pub fn space(&self, [lo, hi]: [f64; 2], n: usize) -> Vec<f64> {
        match self.kind {
            AxisType::Linear => linspace(lo, hi, n),
            AxisType::Log => logspace(lo.log10(), hi.log10(), n),
        }
    }

    /// Returns a copy of this scale with a new domain
    pub fn with_domain(&self, axis: char, domain: [f64; 2]) -> Result<Self, Error> {
        Self::new(axis, self.kind, domain, self.range)
    }
}
