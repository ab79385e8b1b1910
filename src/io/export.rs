//! Export per-sample fit results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::SampleResidual;
use crate::error::AppError;

/// Write per-sample results (observed, fitted, residual) to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[SampleResidual]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "pressure,flow_rate,flux_obs,flux_fit,residual")
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        let s = &r.sample;
        writeln!(
            file,
            "{:.10},{:.10},{:.10},{:.10},{:.10}",
            s.pressure, s.flow_rate, s.flux, r.flux_fit, r.residual
        )
        .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
