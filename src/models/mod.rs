//! Model evaluation for the permeate-flux equation.
//!
//! The solver relies on the primitive operations implemented here:
//! scalar prediction, analytic Jacobian rows, and batch residual/Jacobian
//! evaluation over a dataset.

pub mod model;

pub use model::*;
