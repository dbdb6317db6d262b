//! `fnplot` decides where to sample a function so that it can be plotted
//! faithfully: where it's defined, where it jumps, and where an implicit curve
//! `f(x, y) = 0` can possibly pass.
//!
//! It doesn't draw anything.  Its output is a set of cells, rectangles, or
//! polylines in function-space coordinates, ready to be handed to a renderer.
//!
//! # Expressions
//! Functions are written as text (`"sin(x) / x"`), built as a
//! [`Tree`](crate::context::Tree), or provided as native closures.  Text and
//! trees go through the same pipeline: they're imported into a deduplicating
//! [`Context`](crate::context::Context), then flattened into a
//! [`Tape`](crate::eval::Tape) which can be evaluated with either `f64` or
//! [`Interval`](crate::types::Interval) values.
//!
//! ```
//! use fnplot::context::Tree;
//!
//! let x = Tree::x();
//! let t = x.clone() * x + 1.0;
//! assert_eq!(t, Tree::parse("x * x + 1")?);
//! # Ok::<(), fnplot::Error>(())
//! ```
//!
//! # Interval evaluation
//! Evaluating over an interval returns a range which contains every possible
//! output.  Two special results carry meaning:
//! [`Interval::EMPTY`](crate::types::Interval::EMPTY) means the function is
//! undefined across the whole input, and
//! [`Interval::WHOLE`](crate::types::Interval::WHOLE) means it couldn't be
//! bounded (typically near an asymptote).
//!
//! ```
//! use fnplot::{Expression, eval::{Bindings, Compiled, Evaluator}, types::Interval};
//!
//! let f = Compiled::<Interval>::new(&Expression::from("1 / x"))?;
//! let mut eval = Evaluator::new(f);
//! let mut vars = Bindings::new();
//! vars.set("x", Interval::new(-1.0, 1.0));
//! assert!(eval.eval(&vars)?.is_whole());
//! # Ok::<(), fnplot::Error>(())
//! ```
//!
//! By default, bounds are computed with round-to-nearest arithmetic and are a
//! best-effort enclosure; [`Rounding::Outward`](crate::eval::Rounding) widens
//! every intermediate result by one ulp.
//!
//! # Sampling
//! A [`Chart`](crate::chart::Chart) holds a set of [datums](crate::datum::Datum)
//! and a view.  Drawing the chart samples each datum independently:
//!
//! ```
//! use fnplot::{chart::{Chart, ChartOptions, Sampled}, sampler::IntervalSamples};
//!
//! let opts: ChartOptions = serde_json::from_str(r#"{
//!     "xAxis": { "domain": [-1, 1] },
//!     "yAxis": { "domain": [-10, 10] },
//!     "data": [{ "fn": "1 / x", "nSamples": 4 }]
//! }"#).unwrap();
//! let mut chart = Chart::build(opts)?;
//! let out = chart.draw().remove(0)?;
//! let Sampled::Interval(IntervalSamples::Cells(s)) = out.samples else {
//!     panic!()
//! };
//! assert!(s.cells[1].is_none()); // the asymptote
//! assert_eq!(s.cells[0].unwrap().y.lower(), -10.0);
//! assert_eq!(s.cells[2].unwrap().y.upper(), 10.0);
//! # Ok::<(), fnplot::Error>(())
//! ```
//!
//! Compiled expressions are cached per datum; redrawing after a pan or a scope
//! change doesn't recompile anything.
#![warn(missing_docs)]

pub mod cache;
pub mod chart;
pub mod context;
pub mod datum;
pub mod eval;
pub mod helpers;
pub mod sampler;
pub mod scale;
pub mod types;

mod error;
pub use error::Error;

mod expr;
pub use expr::Expression;
