//! Reporting utilities: residuals, worst-fit ranking, and formatted output.

pub mod format;

pub use format::*;

use crate::domain::{FluxParams, FluxSample, SampleResidual};
use crate::error::AppError;
use crate::models::predict;

/// Compute fitted values and residuals (`fitted − observed`) per sample.
pub fn compute_residuals(
    samples: &[FluxSample],
    params: &FluxParams,
) -> Result<Vec<SampleResidual>, AppError> {
    let mut out = Vec::with_capacity(samples.len());
    for s in samples {
        let flux_fit = predict(params, s.pressure, s.flow_rate);
        if !flux_fit.is_finite() {
            return Err(AppError::numeric(
                "Non-finite model prediction during residual computation.",
            ));
        }
        out.push(SampleResidual {
            sample: *s,
            flux_fit,
            residual: flux_fit - s.flux,
        });
    }
    Ok(out)
}

/// Rank the top-N samples by absolute residual, worst first.
pub fn rank_worst(residuals: &[SampleResidual], top_n: usize) -> Vec<SampleResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .abs()
            .partial_cmp(&a.residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.into_iter().take(top_n).collect()
}
