//! Custom types used during evaluation
mod interval;

pub use interval::Interval;
