//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Parameters of the permeate-flux model, in the order `[a, b, d]`:
///
/// ```text
/// J(p, q) = (a·q) / (p − q·b) + q·d
/// ```
///
/// where `p` is transmembrane pressure, `q` is cross-flow rate, and `J` is
/// the steady-state permeate flux.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxParams {
    pub a: f64,
    pub b: f64,
    pub d: f64,
}

impl FluxParams {
    /// Fixed default starting point for the solver.
    ///
    /// Seeds `a` and `d` small and positive and `b` small and negative,
    /// which keeps the model denominator `p − q·b` away from zero for
    /// typical positive pressure and flow-rate ranges.
    pub const INITIAL_GUESS: FluxParams = FluxParams {
        a: 0.01,
        b: -0.1,
        d: 0.01,
    };

    pub fn new(a: f64, b: f64, d: f64) -> Self {
        Self { a, b, d }
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self {
            a: v[0],
            b: v[1],
            d: v[2],
        }
    }

    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.d)
    }

    pub fn as_array(self) -> [f64; 3] {
        [self.a, self.b, self.d]
    }

    pub fn is_finite(self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.d.is_finite()
    }
}

impl std::fmt::Display for FluxParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[a={:.6e}, b={:.6e}, d={:.6e}]", self.a, self.b, self.d)
    }
}

/// One measurement row.
///
/// Units follow the lab convention: pressure in bar, flux in L/(m²·h).
/// The flow rate is whatever the rig's dial reads; it only has to be
/// consistent across the file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxSample {
    /// Transmembrane pressure (TMP).
    pub pressure: f64,
    /// Cross-flow rate.
    pub flow_rate: f64,
    /// Observed steady-state permeate flux.
    pub flux: f64,
}

/// Fitted value and residual (`fitted − observed`) for one sample.
#[derive(Debug, Clone, Copy)]
pub struct SampleResidual {
    pub sample: FluxSample,
    pub flux_fit: f64,
    pub residual: f64,
}

/// Samples sharing one exact flow-rate value.
///
/// Measured flow settings are discrete dial values, so grouping uses exact
/// equality. Used by reporting and plotting only; the fit itself consumes
/// the flat sample list.
#[derive(Debug, Clone)]
pub struct FlowGroup {
    pub flow_rate: f64,
    pub samples: Vec<FluxSample>,
}

/// Partition samples by flow rate, groups sorted ascending.
pub fn group_by_flow_rate(samples: &[FluxSample]) -> Vec<FlowGroup> {
    let mut groups: Vec<FlowGroup> = Vec::new();
    for s in samples {
        match groups.iter_mut().find(|g| g.flow_rate == s.flow_rate) {
            Some(g) => g.samples.push(*s),
            None => groups.push(FlowGroup {
                flow_rate: s.flow_rate,
                samples: vec![*s],
            }),
        }
    }
    groups.sort_by(|a, b| {
        a.flow_rate
            .partial_cmp(&b.flow_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    groups
}

/// Summary stats about the samples actually used for fitting.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_samples: usize,
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub flux_min: f64,
    pub flux_max: f64,
    pub n_flow_groups: usize,
}

impl DatasetStats {
    pub fn from_samples(samples: &[FluxSample]) -> Option<Self> {
        let mut pressure_min = f64::INFINITY;
        let mut pressure_max = f64::NEG_INFINITY;
        let mut flux_min = f64::INFINITY;
        let mut flux_max = f64::NEG_INFINITY;

        for s in samples {
            pressure_min = pressure_min.min(s.pressure);
            pressure_max = pressure_max.max(s.pressure);
            flux_min = flux_min.min(s.flux);
            flux_max = flux_max.max(s.flux);
        }

        if !pressure_min.is_finite()
            || !pressure_max.is_finite()
            || !flux_min.is_finite()
            || !flux_max.is_finite()
        {
            return None;
        }

        Some(DatasetStats {
            n_samples: samples.len(),
            pressure_min,
            pressure_max,
            flux_min,
            flux_max,
            n_flow_groups: group_by_flow_rate(samples).len(),
        })
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Relative cost decrease fell below `ftol`.
    CostTolerance,
    /// Parameter step norm fell below `xtol`.
    StepTolerance,
    /// Gradient infinity-norm fell below `gtol`.
    GradientTolerance,
    /// Damping hit its ceiling without any step decreasing the cost.
    Stalled,
    /// Iteration cap reached before any tolerance was met.
    IterationLimit,
}

impl Termination {
    /// Whether the solver met a convergence tolerance.
    ///
    /// `Stalled` and `IterationLimit` still return the best-so-far
    /// parameters; callers decide whether to trust them.
    pub fn converged(self) -> bool {
        matches!(
            self,
            Termination::CostTolerance
                | Termination::StepTolerance
                | Termination::GradientTolerance
        )
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Termination::CostTolerance => "converged (cost tolerance)",
            Termination::StepTolerance => "converged (step tolerance)",
            Termination::GradientTolerance => "converged (gradient tolerance)",
            Termination::Stalled => "stalled (no further improvement possible)",
            Termination::IterationLimit => "iteration limit reached (not converged)",
        }
    }
}

/// Output of one solver run: fitted parameters plus fit diagnostics.
///
/// Owned by the caller once returned; the solver keeps no state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FluxFit {
    pub params: FluxParams,
    /// Sum of squared residuals at the returned parameters.
    pub sse: f64,
    pub rmse: f64,
    /// Accepted parameter updates.
    pub iterations: usize,
    /// Residual evaluations, including rejected trial steps.
    pub evaluations: usize,
    pub termination: Termination,
}

/// Resolved configuration for one `fluxfit fit` run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    /// Emit per-iteration solver diagnostics to stderr.
    pub verbose: bool,
    pub initial_guess: FluxParams,
    pub max_iterations: usize,
    /// Number of worst-fit samples to list in the report.
    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Optional PNG chart output path.
    pub chart: Option<PathBuf>,
    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// Portable representation of a fitted curve.
///
/// Schema of the JSON written by `fluxfit fit --export-curve` and read back
/// by `fluxfit plot`: fitted parameters + fit quality + a precomputed grid
/// per flow group for plotting without re-running the fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub fit: FluxFit,
    pub groups: Vec<CurveGroup>,
}

/// Fitted-model grid for one flow-rate value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGroup {
    pub flow_rate: f64,
    pub pressure: Vec<f64>,
    pub flux: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_partitions_and_sorts_by_flow_rate() {
        let samples = [
            FluxSample { pressure: 1.0, flow_rate: 1.5, flux: 10.0 },
            FluxSample { pressure: 2.0, flow_rate: 0.5, flux: 11.0 },
            FluxSample { pressure: 3.0, flow_rate: 1.5, flux: 12.0 },
            FluxSample { pressure: 4.0, flow_rate: 0.5, flux: 13.0 },
        ];

        let groups = group_by_flow_rate(&samples);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].flow_rate, 0.5);
        assert_eq!(groups[1].flow_rate, 1.5);
        assert_eq!(groups[0].samples.len(), 2);
        assert_eq!(groups[1].samples.len(), 2);
        // Within a group the file order is preserved.
        assert_eq!(groups[0].samples[0].pressure, 2.0);
        assert_eq!(groups[0].samples[1].pressure, 4.0);
    }

    #[test]
    fn stats_cover_both_axes() {
        let samples = [
            FluxSample { pressure: 1.0, flow_rate: 0.5, flux: 5.0 },
            FluxSample { pressure: 4.0, flow_rate: 1.0, flux: 2.0 },
        ];
        let stats = DatasetStats::from_samples(&samples).unwrap();
        assert_eq!(stats.n_samples, 2);
        assert_eq!(stats.pressure_min, 1.0);
        assert_eq!(stats.pressure_max, 4.0);
        assert_eq!(stats.flux_min, 2.0);
        assert_eq!(stats.flux_max, 5.0);
        assert_eq!(stats.n_flow_groups, 2);
    }

    #[test]
    fn stats_reject_empty_input() {
        assert!(DatasetStats::from_samples(&[]).is_none());
    }

    #[test]
    fn termination_converged_flags() {
        assert!(Termination::CostTolerance.converged());
        assert!(Termination::StepTolerance.converged());
        assert!(Termination::GradientTolerance.converged());
        assert!(!Termination::Stalled.converged());
        assert!(!Termination::IterationLimit.converged());
    }
}
