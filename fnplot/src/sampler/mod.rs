//! Adaptive sampling of datums over the visible area
//!
//! There are two samplers:
//! - [`interval`] evaluates with interval arithmetic, producing either 1D
//!   cells (for `linear` functions) or 2D regions (for `implicit` relations)
//! - [`point`] evaluates at discrete points, producing polylines
//!
//! Both return data in function-space coordinates; turning them into pixels is
//! left to the renderer.
use crate::{Error, datum::FnType, scale::Scale, types::Interval};
use serde::Serialize;

pub mod interval;
pub mod point;

pub use interval::{QuadTreeSampler, RangeSampler};
pub use point::PointSamples;

/// Visible area of a chart
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    /// Horizontal scale
    pub x: Scale,
    /// Vertical scale
    pub y: Scale,
}

/// A single 1D sample: the image `y` of the cell `x`
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Cell {
    /// Input interval
    pub x: Interval,
    /// Output interval
    pub y: Interval,
}

/// Output of the 1D interval sampler
///
/// `None` marks a cell whose image couldn't be bounded (usually because it
/// straddles an asymptote).  Cells with an empty image are dropped entirely,
/// so consecutive entries aren't necessarily adjacent in `x`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Samples {
    /// Sampled cells, in order of increasing `x`
    pub cells: Vec<Option<Cell>>,
    /// Width of a cell in pixels
    pub scaled_dx: f64,
}

impl Samples {
    /// Returns the number of cells with a bounded image
    pub fn defined(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Returns a copy where every `y` interval is extended to include zero
    ///
    /// This is the shape filled by a `closed` datum.
    ///
    /// ```
    /// # use fnplot::{sampler::{Cell, Samples}, types::Interval};
    /// let s = Samples {
    ///     cells: vec![Some(Cell {
    ///         x: Interval::new(0.0, 1.0),
    ///         y: Interval::new(2.0, 3.0),
    ///     })],
    ///     scaled_dx: 1.0,
    /// };
    /// let c = s.closed_bounds();
    /// assert_eq!(c.cells[0].unwrap().y, Interval::new(0.0, 3.0));
    /// ```
    pub fn closed_bounds(&self) -> Samples {
        let cells = self
            .cells
            .iter()
            .map(|c| {
                c.map(|Cell { x, y }| Cell {
                    x,
                    y: Interval::new(y.lower().min(0.0), y.upper().max(0.0)),
                })
            })
            .collect();
        Samples {
            cells,
            scaled_dx: self.scaled_dx,
        }
    }
}

/// A rectangle which may contain part of an implicit curve
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Region {
    /// Horizontal extent
    pub x: Interval,
    /// Vertical extent
    pub y: Interval,
}

/// Output of the 2D quad-tree sampler
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Regions {
    /// Leaf rectangles, in subdivision order
    pub regions: Vec<Region>,
    /// Scale factor for rendering (always 1)
    pub scaled_dx: f64,
}

/// Output of the interval sampler for a single datum
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IntervalSamples {
    /// 1D cells, from a `linear` function
    Cells(Samples),
    /// 2D rectangles, from an `implicit` relation
    Regions(Regions),
}

/// Which interval algorithm handles a datum
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerKind {
    /// Cells across the horizontal domain
    OneDimensional,
    /// Quad-tree over the visible rectangle
    Implicit,
}

impl TryFrom<FnType> for SamplerKind {
    type Error = Error;
    fn try_from(t: FnType) -> Result<Self, Error> {
        match t {
            FnType::Linear => Ok(SamplerKind::OneDimensional),
            FnType::Implicit => Ok(SamplerKind::Implicit),
            FnType::Parametric
            | FnType::Polar
            | FnType::Points
            | FnType::Vector => Err(Error::UnsupportedFnType {
                fn_type: t.to_string(),
                sampler: "interval",
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sampler_kind() {
        assert_eq!(
            SamplerKind::try_from(FnType::Linear),
            Ok(SamplerKind::OneDimensional)
        );
        assert_eq!(
            SamplerKind::try_from(FnType::Implicit),
            Ok(SamplerKind::Implicit)
        );
        let e = SamplerKind::try_from(FnType::Polar).unwrap_err();
        assert_eq!(
            e.to_string(),
            "polar is not supported in the `interval` sampler"
        );
    }

    #[test]
    fn closed_bounds() {
        let s = Samples {
            cells: vec![
                Some(Cell {
                    x: Interval::new(0.0, 1.0),
                    y: Interval::new(-3.0, -2.0),
                }),
                None,
                Some(Cell {
                    x: Interval::new(2.0, 3.0),
                    y: Interval::new(-1.0, 1.0),
                }),
            ],
            scaled_dx: 4.0,
        };
        let c = s.closed_bounds();
        assert_eq!(c.cells[0].unwrap().y, Interval::new(-3.0, 0.0));
        assert_eq!(c.cells[1], None);
        assert_eq!(c.cells[2].unwrap().y, Interval::new(-1.0, 1.0));
        assert_eq!(c.scaled_dx, 4.0);
        assert_eq!(c.defined(), 2);
    }
}
