//! Damped normal-equations step for the solver's inner loop.
//!
//! Each Levenberg-Marquardt iteration proposes a parameter update `Δ` from
//!
//! ```text
//! (JᵀJ + λI)·Δ = −Jᵀr
//! ```
//!
//! where `J` is the residual Jacobian, `r` the residual vector, and `λ` the
//! damping parameter.
//!
//! Implementation choices:
//! - Cholesky first: for `λ > 0` the damped normal matrix is symmetric
//!   positive definite unless the Jacobian is badly degenerate, and Cholesky
//!   is the cheapest exact solve for a 3×3 system.
//! - SVD fallback with progressively looser tolerances when Cholesky fails.
//!   Near the model's pole the Jacobian columns become nearly collinear, so
//!   the tolerance ladder balances numerical stability with step acceptance.
//!
//! Returns `None` if the system is too ill-conditioned to solve robustly;
//! the caller increases the damping and retries.

use nalgebra::{DMatrix, DVector};

/// Solve `(JᵀJ + λI)·Δ = −Jᵀr` for the update `Δ`.
///
/// `jtj` is `JᵀJ` (n×n) and `gradient` is `Jᵀr` (the cost gradient up to a
/// factor of 2).
pub fn solve_damped_step(
    jtj: &DMatrix<f64>,
    gradient: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let n = jtj.nrows();
    let mut damped = jtj.clone();
    for i in 0..n {
        damped[(i, i)] += lambda;
    }
    let rhs = -gradient;

    if let Some(chol) = damped.clone().cholesky() {
        let step = chol.solve(&rhs);
        if step.iter().all(|v| v.is_finite()) {
            return Some(step);
        }
    }

    let svd = damped.svd(true, true);
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(step) = svd.solve(&rhs, tol) {
            if step.iter().all(|v| v.is_finite()) {
                return Some(step);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undamped_step_solves_the_normal_equations() {
        // J = I, r = [1, 2, 3]: the step must be exactly -r.
        let jtj = DMatrix::<f64>::identity(3, 3);
        let gradient = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let step = solve_damped_step(&jtj, &gradient, 0.0).unwrap();
        for i in 0..3 {
            assert!((step[i] + gradient[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn damping_shrinks_the_step() {
        let jtj = DMatrix::<f64>::identity(3, 3);
        let gradient = DVector::from_row_slice(&[1.0, 1.0, 1.0]);
        let free = solve_damped_step(&jtj, &gradient, 0.0).unwrap();
        let damped = solve_damped_step(&jtj, &gradient, 9.0).unwrap();
        // (1 + 9)·Δ = -1 → |Δ| = 0.1 per component.
        assert!(damped.norm() < free.norm());
        assert!((damped[0] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn singular_system_is_rescued_by_damping() {
        // Rank-deficient JᵀJ: without damping the solve may fail or blow up,
        // with damping it must return a finite step.
        let jtj = DMatrix::<f64>::from_row_slice(3, 3, &[
            1.0, 1.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 0.0, 0.0,
        ]);
        let gradient = DVector::from_row_slice(&[1.0, 1.0, 1.0]);
        let step = solve_damped_step(&jtj, &gradient, 1e-3).unwrap();
        assert!(step.iter().all(|v| v.is_finite()));
    }
}
