//! Visualization of fitted curves and observations.
//!
//! - deterministic ASCII plot for the terminal (`ascii`)
//! - PNG chart via Plotters (`chart`)
//!
//! Both resample the fitted model themselves from the returned parameters;
//! neither depends on solver internals.

pub mod ascii;
pub mod chart;

pub use ascii::*;
pub use chart::*;
