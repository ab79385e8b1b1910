//! Mathematical utilities: the damped linear step behind each solver iteration.

pub mod step;

pub use step::*;
