//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{DatasetStats, FitConfig, FluxFit, SampleResidual};

/// Format the full run summary (dataset stats + solver diagnostics + fitted
/// parameters).
pub fn format_run_summary(stats: &DatasetStats, fit: &FluxFit, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== fluxfit - permeate-flux model fit ===\n");
    out.push_str(&format!("Input: {}\n", config.csv_path.display()));
    out.push_str(&format!(
        "Samples: n={} | pressure=[{:.3}, {:.3}] bar | flux=[{:.4}, {:.4}] L/(m^2*h) | flow groups: {}\n",
        stats.n_samples,
        stats.pressure_min,
        stats.pressure_max,
        stats.flux_min,
        stats.flux_max,
        stats.n_flow_groups,
    ));
    out.push_str(&format!("Initial guess: {}\n", config.initial_guess));

    out.push_str("\nFit diagnostics:\n");
    out.push_str(&format!("- termination: {}\n", fit.termination.display_name()));
    out.push_str(&format!(
        "- iterations: {} ({} residual evaluations)\n",
        fit.iterations, fit.evaluations
    ));
    out.push_str(&format!("- SSE={:.6e} RMSE={:.6e}\n", fit.sse, fit.rmse));

    out.push_str("\nFitted parameters:\n");
    out.push_str(&format!("- a = {:.6e}\n", fit.params.a));
    out.push_str(&format!("- b = {:.6e}\n", fit.params.b));
    out.push_str(&format!("- d = {:.6e}\n", fit.params.d));
    out.push('\n');

    out
}

/// Format the worst-fit sample table.
pub fn format_worst_table(rows: &[SampleResidual]) -> String {
    let mut out = String::new();

    out.push_str("Worst-fit samples (by absolute residual):\n");
    out.push_str(&format!(
        "{:>10} {:>10} {:>12} {:>12} {:>12}\n",
        "pressure", "flow_rate", "flux_obs", "flux_fit", "residual"
    ));
    out.push_str(&format!(
        "{:-<10} {:-<10} {:-<12} {:-<12} {:-<12}\n",
        "", "", "", "", ""
    ));

    for r in rows {
        let s = &r.sample;
        out.push_str(&format!(
            "{:>10.3} {:>10.3} {:>12.5} {:>12.5} {:>12.2e}\n",
            s.pressure, s.flow_rate, s.flux, r.flux_fit, r.residual
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FluxParams, FluxSample, Termination};
    use std::path::PathBuf;

    #[test]
    fn summary_names_the_key_diagnostics() {
        let stats = DatasetStats {
            n_samples: 4,
            pressure_min: 1.0,
            pressure_max: 4.0,
            flux_min: 0.01,
            flux_max: 0.02,
            n_flow_groups: 1,
        };
        let fit = FluxFit {
            params: FluxParams::new(0.02, -0.05, 0.015),
            sse: 1e-10,
            rmse: 5e-6,
            iterations: 9,
            evaluations: 12,
            termination: Termination::StepTolerance,
        };
        let config = FitConfig {
            csv_path: PathBuf::from("run.csv"),
            verbose: false,
            initial_guess: FluxParams::INITIAL_GUESS,
            max_iterations: 100,
            top_n: 10,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            chart: None,
            export_results: None,
            export_curve: None,
        };

        let text = format_run_summary(&stats, &fit, &config);
        assert!(text.contains("run.csv"));
        assert!(text.contains("n=4"));
        assert!(text.contains("converged (step tolerance)"));
        assert!(text.contains("- a = 2.000000e-2"));
    }

    #[test]
    fn worst_table_has_one_row_per_sample() {
        let sample = FluxSample { pressure: 1.0, flow_rate: 0.5, flux: 0.01 };
        let rows = [
            SampleResidual { sample, flux_fit: 0.011, residual: 0.001 },
            SampleResidual { sample, flux_fit: 0.009, residual: -0.001 },
        ];
        let text = format_worst_table(&rows);
        assert_eq!(text.lines().count(), 2 + rows.len());
    }
}
