//! Parameter estimation for the flux model.
//!
//! Responsibilities:
//!
//! - the damped Gauss-Newton / Levenberg-Marquardt iteration (`solver`)
//! - solver options and termination reporting
//!
//! The surrounding pipeline (`crate::app::pipeline`) wires measurement data
//! and configuration into a solver call and consumes the returned
//! [`crate::domain::FluxFit`].

pub mod solver;

pub use solver::*;
