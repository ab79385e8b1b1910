//! Permeate-flux model evaluation.
//!
//! The model relates steady-state permeate flux to transmembrane pressure
//! `p` and cross-flow rate `q` through the parameters `[a, b, d]`:
//!
//! ```text
//! J(p, q) = (a·q) / (p − q·b) + q·d
//! ```
//!
//! The fitter relies on three primitive operations:
//!
//! - predict `J` for one `(p, q)` pair (for residuals and plots)
//! - fill one Jacobian row of partial derivatives w.r.t. `[a, b, d]`
//! - batch residual/Jacobian evaluation over a whole dataset
//!
//! The model has a pole where `p == q·b`. Evaluation at or near it produces
//! huge or non-finite values; callers treat those as a divergence signal and
//! never silently drop them.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FluxParams, FluxSample};

/// The model denominator `p − q·b`. Zero means the pole is hit.
pub fn denominator(params: &FluxParams, pressure: f64, flow_rate: f64) -> f64 {
    pressure - flow_rate * params.b
}

/// Predict the steady-state permeate flux for one `(pressure, flow_rate)` pair.
pub fn predict(params: &FluxParams, pressure: f64, flow_rate: f64) -> f64 {
    (params.a * flow_rate) / denominator(params, pressure, flow_rate) + flow_rate * params.d
}

/// Residual `predicted − observed` for one sample.
pub fn residual(params: &FluxParams, sample: &FluxSample) -> f64 {
    predict(params, sample.pressure, sample.flow_rate) - sample.flux
}

/// Fill one row of the residual Jacobian with the closed-form partials.
///
/// The observed flux does not appear here: it is constant per sample, so the
/// residual and the model share their derivatives.
///
/// ```text
/// ∂J/∂a = q / (p − q·b)
/// ∂J/∂b = (q²·a) / (p − q·b)²
/// ∂J/∂d = q
/// ```
pub fn fill_jacobian_row(params: &FluxParams, pressure: f64, flow_rate: f64, out: &mut [f64; 3]) {
    let den = denominator(params, pressure, flow_rate);
    out[0] = flow_rate / den;
    out[1] = (flow_rate * flow_rate * params.a) / (den * den);
    out[2] = flow_rate;
}

/// Residual vector `predicted − observed` over a dataset.
pub fn residual_vector(params: &FluxParams, samples: &[FluxSample]) -> DVector<f64> {
    DVector::from_iterator(samples.len(), samples.iter().map(|s| residual(params, s)))
}

/// Residual Jacobian over a dataset, shape `(n_samples, 3)`.
pub fn jacobian_matrix(params: &FluxParams, samples: &[FluxSample]) -> DMatrix<f64> {
    let mut jacobian = DMatrix::<f64>::zeros(samples.len(), 3);
    let mut row = [0.0; 3];
    for (i, s) in samples.iter().enumerate() {
        fill_jacobian_row(params, s.pressure, s.flow_rate, &mut row);
        jacobian[(i, 0)] = row[0];
        jacobian[(i, 1)] = row[1];
        jacobian[(i, 2)] = row[2];
    }
    jacobian
}
