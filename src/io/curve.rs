//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted model:
//!
//! - fitted parameters + fit quality
//! - a precomputed fitted grid per flow group for quick plotting
//!
//! The schema is defined by `domain::CurveFile`. Because the file carries
//! the parameters, a consumer can also resample the model itself over any
//! range without re-running the fit.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGroup, FluxFit, FluxSample, group_by_flow_rate};
use crate::error::AppError;
use crate::models::predict;

/// Grid points per flow group.
const GRID_POINTS: usize = 50;
/// The grid spans `[0, PRESSURE_SPAN · max observed pressure]`, extending
/// past the data so the curve's tail is visible.
const PRESSURE_SPAN: f64 = 1.5;

/// Assemble the portable curve representation for a fit.
pub fn build_curve_file(fit: &FluxFit, samples: &[FluxSample]) -> CurveFile {
    let pressure_max = samples
        .iter()
        .map(|s| s.pressure)
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max);

    let groups = group_by_flow_rate(samples)
        .iter()
        .map(|g| build_group_grid(fit, g.flow_rate, pressure_max))
        .collect();

    CurveFile {
        tool: "fluxfit".to_string(),
        fit: fit.clone(),
        groups,
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, fit: &FluxFit, samples: &[FluxSample]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create curve JSON '{}': {e}",
            path.display()
        ))
    })?;

    let curve = build_curve_file(fit, samples);
    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::usage(format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to open curve JSON '{}': {e}",
            path.display()
        ))
    })?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::usage(format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}

fn build_group_grid(fit: &FluxFit, flow_rate: f64, pressure_max: f64) -> CurveGroup {
    let p_max = if pressure_max.is_finite() && pressure_max > 0.0 {
        pressure_max * PRESSURE_SPAN
    } else {
        1.0
    };

    let mut pressure = Vec::with_capacity(GRID_POINTS);
    let mut flux = Vec::with_capacity(GRID_POINTS);

    for i in 0..GRID_POINTS {
        let u = i as f64 / (GRID_POINTS as f64 - 1.0);
        let p = u * p_max;
        let j = predict(&fit.params, p, flow_rate);
        // A fitted b > 0 can put the model pole inside the grid; skip the
        // non-finite points rather than poisoning the file.
        if j.is_finite() {
            pressure.push(p);
            flux.push(j);
        }
    }

    CurveGroup {
        flow_rate,
        pressure,
        flux,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FluxParams, Termination};

    fn fit() -> FluxFit {
        FluxFit {
            params: FluxParams::new(0.02, -0.05, 0.015),
            sse: 1e-8,
            rmse: 5e-5,
            iterations: 12,
            evaluations: 15,
            termination: Termination::StepTolerance,
        }
    }

    fn samples() -> Vec<FluxSample> {
        vec![
            FluxSample { pressure: 1.0, flow_rate: 0.5, flux: 0.01 },
            FluxSample { pressure: 4.0, flow_rate: 0.5, flux: 0.012 },
            FluxSample { pressure: 2.0, flow_rate: 1.0, flux: 0.02 },
        ]
    }

    #[test]
    fn grid_covers_one_and_a_half_times_the_observed_range() {
        let curve = build_curve_file(&fit(), &samples());
        assert_eq!(curve.groups.len(), 2);
        for g in &curve.groups {
            assert_eq!(g.pressure.len(), GRID_POINTS);
            assert_eq!(g.pressure.len(), g.flux.len());
            assert_eq!(g.pressure[0], 0.0);
            assert!((g.pressure.last().unwrap() - 6.0).abs() < 1e-12);
            assert!(g.flux.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn curve_file_round_trips_through_json() {
        let curve = build_curve_file(&fit(), &samples());
        let json = serde_json::to_string(&curve).unwrap();
        let back: CurveFile = serde_json::from_str(&json).unwrap();

        assert_eq!(back.tool, "fluxfit");
        assert_eq!(back.fit.params, curve.fit.params);
        assert_eq!(back.fit.termination, curve.fit.termination);
        assert_eq!(back.groups.len(), curve.groups.len());
        assert_eq!(back.groups[0].pressure, curve.groups[0].pressure);
    }

    #[test]
    fn pole_inside_the_grid_is_skipped_not_exported() {
        // b > 0 puts the pole at p = q·b = 2.0, inside the grid.
        let bad = FluxFit {
            params: FluxParams::new(0.02, 2.0, 0.015),
            ..fit()
        };
        let samples = vec![FluxSample { pressure: 4.0, flow_rate: 1.0, flux: 0.02 }];
        let curve = build_curve_file(&bad, &samples);
        assert!(curve.groups[0].flux.iter().all(|v| v.is_finite()));
    }
}
