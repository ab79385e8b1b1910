//! Command-line parsing for the permeate-flux fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fluxfit", version, about = "Membrane permeate-flux model fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the flux model to a measurement CSV, print diagnostics, and
    /// optionally plot/export.
    Fit(FitArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Generate a synthetic measurement CSV from known parameters.
    Sample(SampleArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Measurement CSV: a header row, then `pressure,flow_rate,flux` columns.
    pub csv: PathBuf,

    /// Print per-iteration solver diagnostics to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Maximum solver iterations before reporting non-convergence.
    #[arg(long, default_value_t = 100)]
    pub max_iterations: usize,

    /// Initial guess for `a`.
    #[arg(long, default_value_t = 0.01, allow_hyphen_values = true)]
    pub guess_a: f64,

    /// Initial guess for `b`.
    #[arg(long, default_value_t = -0.1, allow_hyphen_values = true)]
    pub guess_b: f64,

    /// Initial guess for `d`.
    #[arg(long, default_value_t = 0.01, allow_hyphen_values = true)]
    pub guess_d: f64,

    /// Show the top-N worst-fit samples.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Render a PNG chart to this path.
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Export per-sample results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export curve (params + fitted grid) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `fluxfit fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    pub out: PathBuf,

    /// Ground-truth `a`.
    #[arg(long, default_value_t = 0.02, allow_hyphen_values = true)]
    pub a: f64,

    /// Ground-truth `b`.
    #[arg(long, default_value_t = -0.05, allow_hyphen_values = true)]
    pub b: f64,

    /// Ground-truth `d`.
    #[arg(long, default_value_t = 0.015, allow_hyphen_values = true)]
    pub d: f64,

    /// Flow rates to sweep, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.5, 1.0, 1.5])]
    pub flow_rates: Vec<f64>,

    /// Evenly spaced pressures per flow rate.
    #[arg(long, default_value_t = 8)]
    pub pressures_per_flow: usize,

    /// Minimum pressure (bar).
    #[arg(long, default_value_t = 0.5)]
    pub pressure_min: f64,

    /// Maximum pressure (bar).
    #[arg(long, default_value_t = 4.0)]
    pub pressure_max: f64,

    /// Standard deviation of the additive flux noise.
    #[arg(long, default_value_t = 1e-4)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
