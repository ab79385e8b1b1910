//! Damped Gauss-Newton (Levenberg-Marquardt) solver for the flux model.
//!
//! Finds the parameters minimizing the sum of squared residuals
//! `Σ (J(p_i, q_i) − flux_i)²` using the analytic Jacobian.
//!
//! Each iteration:
//!
//! 1. evaluate the residual vector and Jacobian at the current parameters
//! 2. solve the damped step `(JᵀJ + λI)·Δ = −Jᵀr`
//! 3. accept the step if it decreases the cost (then shrink `λ`), otherwise
//!    grow `λ` and retry without advancing the iteration count
//!
//! `λ` interpolates between Gauss-Newton (fast near the optimum) and small
//! gradient-descent steps (stable near the model's pole, where the raw step
//! would diverge).
//!
//! Termination: relative cost decrease below `ftol`, step norm below `xtol`,
//! gradient infinity-norm below `gtol`, or the iteration cap. The cap is
//! reported as non-convergence on the returned [`FluxFit`], not as an error.
//! Non-finite residuals or Jacobian entries are a numeric error naming the
//! iteration and the offending parameters; the solver never returns
//! NaN-valued parameters.

use nalgebra::DVector;

use crate::domain::{FluxFit, FluxParams, FluxSample, Termination};
use crate::error::AppError;
use crate::math::solve_damped_step;
use crate::models::{jacobian_matrix, residual_vector};

/// Damping ceiling: past this the step is numerically zero and the search
/// has stalled.
const LAMBDA_MAX: f64 = 1e12;
/// Damping floor, so a long run of accepted steps cannot underflow `λ`.
const LAMBDA_MIN: f64 = 1e-12;

/// Solver options that affect how the fit is run.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum accepted parameter updates before giving up.
    pub max_iterations: usize,
    /// Relative cost-decrease tolerance.
    pub ftol: f64,
    /// Parameter step-norm tolerance (relative to the parameter norm).
    pub xtol: f64,
    /// Gradient infinity-norm tolerance.
    pub gtol: f64,
    /// Initial damping parameter.
    pub initial_lambda: f64,
    /// Factor to grow `λ` by on a rejected step.
    pub lambda_up: f64,
    /// Factor to shrink `λ` by on an accepted step.
    pub lambda_down: f64,
    /// Emit per-iteration diagnostics to stderr. Observational only; must
    /// not affect the converged result.
    pub verbose: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            verbose: false,
        }
    }
}

/// Fit the flux model to a measurement set.
///
/// Errors: data error for an empty or under-determined dataset (fewer
/// samples than parameters), numeric error when the residual or Jacobian
/// turns non-finite (the model pole was hit).
pub fn fit_flux_model(
    samples: &[FluxSample],
    initial_guess: FluxParams,
    options: &SolverOptions,
) -> Result<FluxFit, AppError> {
    if samples.is_empty() {
        return Err(AppError::data("No samples to fit."));
    }
    if samples.len() < 3 {
        return Err(AppError::data(format!(
            "Need at least 3 samples to fit 3 parameters (got {}).",
            samples.len()
        )));
    }
    if !initial_guess.is_finite() {
        return Err(AppError::usage("Initial guess must be finite."));
    }

    let mut params = initial_guess;
    let mut residuals = residual_vector(&params, samples);
    ensure_finite_residuals(&residuals, 0, &params)?;
    let mut cost = residuals.norm_squared();

    let mut lambda = options.initial_lambda;
    let mut evaluations = 1usize;
    let mut iterations = 0usize;
    let mut termination = Termination::IterationLimit;

    'outer: while iterations < options.max_iterations {
        let jacobian = jacobian_matrix(&params, samples);
        if jacobian.iter().any(|v| !v.is_finite()) {
            return Err(AppError::numeric(format!(
                "Fit diverged: non-finite Jacobian at iteration {iterations} with params {params}. \
                 The model denominator pressure - flow_rate*b vanished for at least one sample."
            )));
        }

        let jtj = jacobian.transpose() * &jacobian;
        let gradient = jacobian.transpose() * &residuals;

        // J^T r is the cost gradient up to a factor of 2, so a tiny
        // infinity-norm means a critical point.
        if gradient.amax() <= options.gtol {
            termination = Termination::GradientTolerance;
            break;
        }

        // Propose steps with increasing damping until one decreases the cost.
        loop {
            let step = match solve_damped_step(&jtj, &gradient, lambda) {
                Some(step) => step,
                None => {
                    lambda *= options.lambda_up;
                    if lambda > LAMBDA_MAX {
                        termination = Termination::Stalled;
                        break 'outer;
                    }
                    continue;
                }
            };

            let candidate = apply_step(&params, &step);
            let new_residuals = residual_vector(&candidate, samples);
            evaluations += 1;
            ensure_finite_residuals(&new_residuals, iterations, &candidate)?;
            let new_cost = new_residuals.norm_squared();

            if new_cost < cost {
                let step_norm = step.norm();
                let cost_drop = cost - new_cost;
                params = candidate;
                residuals = new_residuals;
                cost = new_cost;
                lambda = (lambda * options.lambda_down).max(LAMBDA_MIN);
                iterations += 1;

                if options.verbose {
                    eprintln!(
                        "iter {iterations:>3}: cost={cost:.6e} step={step_norm:.3e} lambda={lambda:.1e}"
                    );
                }

                if cost <= f64::MIN_POSITIVE {
                    termination = Termination::CostTolerance;
                    break 'outer;
                }
                if cost_drop <= options.ftol * cost {
                    termination = Termination::CostTolerance;
                    break 'outer;
                }
                if step_norm <= options.xtol * (1.0 + params.to_vector().norm()) {
                    termination = Termination::StepTolerance;
                    break 'outer;
                }
                break;
            }

            // Rejected: shrink the trust region and retry without advancing
            // the iteration count.
            lambda *= options.lambda_up;
            if lambda > LAMBDA_MAX {
                termination = Termination::Stalled;
                break 'outer;
            }
        }
    }

    let sse = cost;
    let rmse = (sse / samples.len() as f64).sqrt();

    Ok(FluxFit {
        params,
        sse,
        rmse,
        iterations,
        evaluations,
        termination,
    })
}

fn apply_step(params: &FluxParams, step: &DVector<f64>) -> FluxParams {
    FluxParams::new(params.a + step[0], params.b + step[1], params.d + step[2])
}

fn ensure_finite_residuals(
    residuals: &DVector<f64>,
    iteration: usize,
    params: &FluxParams,
) -> Result<(), AppError> {
    if residuals.iter().all(|v| v.is_finite()) {
        return Ok(());
    }
    Err(AppError::numeric(format!(
        "Fit diverged: non-finite residual at iteration {iteration} with params {params}. \
         The model denominator pressure - flow_rate*b vanished for at least one sample."
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::predict;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn synthetic(true_params: &FluxParams, pressures: &[f64], flow_rate: f64) -> Vec<FluxSample> {
        pressures
            .iter()
            .map(|&p| FluxSample {
                pressure: p,
                flow_rate,
                flux: predict(true_params, p, flow_rate),
            })
            .collect()
    }

    #[test]
    fn recovers_known_parameters_from_noiseless_data() {
        // The reference scenario: four pressures at one flow rate.
        let truth = FluxParams::new(0.02, -0.05, 0.015);
        let samples = synthetic(&truth, &[1.0, 2.0, 3.0, 4.0], 0.5);

        let fit = fit_flux_model(&samples, FluxParams::INITIAL_GUESS, &SolverOptions::default())
            .unwrap();

        assert!(fit.termination.converged(), "termination: {:?}", fit.termination);
        for (got, want) in fit.params.as_array().iter().zip(truth.as_array()) {
            let rel = (got - want).abs() / want.abs();
            assert!(rel < 0.05, "got {got}, want {want} (rel {rel})");
        }
        assert!(fit.sse < 1e-12);
    }

    #[test]
    fn recovers_known_parameters_from_noisy_data() {
        let truth = FluxParams::new(0.02, -0.05, 0.015);
        let mut rng = StdRng::seed_from_u64(11);
        let noise = Normal::new(0.0, 1e-7).unwrap();

        let mut samples = Vec::new();
        for &q in &[0.5, 1.0, 1.5] {
            for i in 0..10 {
                let p = 0.5 + i as f64 * 0.35;
                samples.push(FluxSample {
                    pressure: p,
                    flow_rate: q,
                    flux: predict(&truth, p, q) + noise.sample(&mut rng),
                });
            }
        }

        let fit = fit_flux_model(&samples, FluxParams::INITIAL_GUESS, &SolverOptions::default())
            .unwrap();

        assert!(fit.termination.converged());
        for (got, want) in fit.params.as_array().iter().zip(truth.as_array()) {
            let rel = (got - want).abs() / want.abs();
            assert!(rel < 1e-2, "got {got}, want {want} (rel {rel})");
        }
    }

    #[test]
    fn empty_dataset_is_a_data_error() {
        let err = fit_flux_model(&[], FluxParams::INITIAL_GUESS, &SolverOptions::default())
            .unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn underdetermined_dataset_is_a_data_error() {
        let truth = FluxParams::new(0.02, -0.05, 0.015);
        let samples = synthetic(&truth, &[1.0, 2.0], 0.5);
        let err = fit_flux_model(&samples, FluxParams::INITIAL_GUESS, &SolverOptions::default())
            .unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn singular_initial_guess_is_a_numeric_error() {
        // pressure == flow_rate·b for the default guess (b = -0.1).
        let guess = FluxParams::INITIAL_GUESS;
        let q = 10.0;
        let samples = vec![
            FluxSample { pressure: q * guess.b, flow_rate: q, flux: 1.0 },
            FluxSample { pressure: 1.0, flow_rate: q, flux: 1.0 },
            FluxSample { pressure: 2.0, flow_rate: q, flux: 1.0 },
        ];

        let err = fit_flux_model(&samples, guess, &SolverOptions::default()).unwrap_err();
        assert!(err.is_numeric());
        assert!(err.to_string().contains("iteration 0"), "message: {err}");
    }

    #[test]
    fn iteration_cap_reports_non_convergence_with_finite_params() {
        let truth = FluxParams::new(0.02, -0.05, 0.015);
        let samples = synthetic(&truth, &[1.0, 2.0, 3.0, 4.0], 0.5);

        let options = SolverOptions {
            max_iterations: 2,
            ..SolverOptions::default()
        };
        let fit = fit_flux_model(&samples, FluxParams::INITIAL_GUESS, &options).unwrap();

        assert_eq!(fit.termination, Termination::IterationLimit);
        assert!(!fit.termination.converged());
        assert!(fit.params.is_finite());
        assert_eq!(fit.iterations, 2);
    }

    #[test]
    fn verbosity_does_not_change_the_result() {
        let truth = FluxParams::new(0.02, -0.05, 0.015);
        let samples = synthetic(&truth, &[1.0, 2.0, 3.0, 4.0], 0.5);

        let quiet = fit_flux_model(&samples, FluxParams::INITIAL_GUESS, &SolverOptions::default())
            .unwrap();
        let loud = fit_flux_model(
            &samples,
            FluxParams::INITIAL_GUESS,
            &SolverOptions {
                verbose: true,
                ..SolverOptions::default()
            },
        )
        .unwrap();

        assert_eq!(quiet.params, loud.params);
        assert_eq!(quiet.iterations, loud.iterations);
        assert_eq!(quiet.termination, loud.termination);
    }

    #[test]
    fn cost_never_increases_across_accepted_iterations() {
        // Indirect check on the accept/reject discipline: the returned SSE
        // must not exceed the initial cost.
        let truth = FluxParams::new(0.02, -0.05, 0.015);
        let samples = synthetic(&truth, &[1.0, 2.0, 3.0, 4.0], 0.5);

        let initial = residual_vector(&FluxParams::INITIAL_GUESS, &samples).norm_squared();
        let fit = fit_flux_model(&samples, FluxParams::INITIAL_GUESS, &SolverOptions::default())
            .unwrap();
        assert!(fit.sse <= initial);
    }
}
