//! Shared "fit pipeline" logic behind the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> fit -> residuals -> worst-fit ranking -> flow grouping
//!
//! `app` can then focus on presentation (printing vs file outputs).

use crate::domain::{FitConfig, FlowGroup, FluxFit, SampleResidual, group_by_flow_rate};
use crate::error::AppError;
use crate::fit::{SolverOptions, fit_flux_model};
use crate::io::ingest::{Ingested, load_measurements};
use crate::report::{compute_residuals, rank_worst};

/// All computed outputs of a single `fluxfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: Ingested,
    pub fit: FluxFit,
    pub residuals: Vec<SampleResidual>,
    pub worst: Vec<SampleResidual>,
    pub groups: Vec<FlowGroup>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    // 1) Load and validate the measurement CSV.
    let ingest = load_measurements(&config.csv_path)?;

    run_fit_with_ingested(config, ingest)
}

/// Execute the fitting pipeline on pre-loaded data.
///
/// This is useful for tests and embedding, where samples do not come from a
/// file.
pub fn run_fit_with_ingested(config: &FitConfig, ingest: Ingested) -> Result<RunOutput, AppError> {
    // 2) Fit the model from the configured initial guess.
    let options = SolverOptions {
        max_iterations: config.max_iterations,
        verbose: config.verbose,
        ..SolverOptions::default()
    };
    let fit = fit_flux_model(&ingest.samples, config.initial_guess, &options)?;

    // 3) Residuals, worst-fit ranking, and flow grouping for presentation.
    let residuals = compute_residuals(&ingest.samples, &fit.params)?;
    let worst = rank_worst(&residuals, config.top_n);
    let groups = group_by_flow_rate(&ingest.samples);

    Ok(RunOutput {
        ingest,
        fit,
        residuals,
        worst,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FluxParams;
    use crate::io::ingest::read_measurements;
    use std::path::PathBuf;

    fn config() -> FitConfig {
        FitConfig {
            csv_path: PathBuf::from("unused.csv"),
            verbose: false,
            initial_guess: FluxParams::INITIAL_GUESS,
            max_iterations: 100,
            top_n: 3,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            chart: None,
            export_results: None,
            export_curve: None,
        }
    }

    #[test]
    fn pipeline_runs_end_to_end_on_in_memory_csv() {
        // Fluxes generated from [0.02, -0.05, 0.015] at q = 0.5.
        let csv = "\
pressure,flow_rate,flux
1.0,0.5,0.017256097560975610
2.0,0.5,0.012438271604938272
3.0,0.5,0.010805785123966943
4.0,0.5,0.009984472049689441
";
        let ingest = read_measurements(csv.as_bytes()).unwrap();
        let run = run_fit_with_ingested(&config(), ingest).unwrap();

        assert!(run.fit.termination.converged());
        assert_eq!(run.residuals.len(), 4);
        assert_eq!(run.worst.len(), 3);
        assert_eq!(run.groups.len(), 1);
        assert!((run.fit.params.a - 0.02).abs() / 0.02 < 0.05);
        assert!((run.fit.params.b + 0.05).abs() / 0.05 < 0.05);
        assert!((run.fit.params.d - 0.015).abs() / 0.015 < 0.05);
    }
}
