//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measurement samples and flow-rate grouping (`FluxSample`, `FlowGroup`)
//! - model parameters and the fixed initial guess (`FluxParams`)
//! - fit outputs (`FluxFit`, `Termination`, `SampleResidual`)
//! - run configuration and the curve-file schema (`FitConfig`, `CurveFile`)

pub mod types;

pub use types::*;
