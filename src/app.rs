//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fit pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, FitArgs, PlotArgs, SampleArgs};
use crate::domain::{FitConfig, FluxParams};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fluxfit` binary.
pub fn run() -> Result<(), AppError> {
    // We want `fluxfit run.csv` to behave like `fluxfit fit run.csv`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    // Print terminal output.
    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest.stats, &run.fit, &config)
    );
    println!("{}", crate::report::format_worst_table(&run.worst));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.groups,
            &run.fit.params,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional file outputs.
    if let Some(path) = &config.chart {
        crate::plot::render_chart_png(path, &run.groups, &run.fit.params, 1024, 768)?;
    }
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.residuals)?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.fit, &run.ingest.samples)?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;

    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        params: FluxParams::new(args.a, args.b, args.d),
        flow_rates: args.flow_rates.clone(),
        pressures_per_flow: args.pressures_per_flow,
        pressure_min: args.pressure_min,
        pressure_max: args.pressure_max,
        noise_sigma: args.noise,
        seed: args.seed,
    };

    let samples = crate::data::generate_sample(&config)?;
    crate::data::write_sample_csv(&args.out, &samples)?;
    println!("Wrote {} samples to {}", samples.len(), args.out.display());
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        csv_path: args.csv.clone(),
        verbose: args.verbose,
        initial_guess: FluxParams::new(args.guess_a, args.guess_b, args.guess_d),
        max_iterations: args.max_iterations,
        top_n: args.top,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        chart: args.chart.clone(),
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
    }
}

/// Rewrite argv so a bare CSV path defaults to `fluxfit fit`.
///
/// Rules:
/// - `fluxfit run.csv ...`         -> `fluxfit fit run.csv ...`
/// - `fluxfit -v run.csv`          -> `fluxfit fit -v run.csv`
/// - `fluxfit --help/--version/-h` -> unchanged (show top-level help/version)
/// - an explicit subcommand        -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "plot" | "sample");
    if is_subcommand {
        return argv;
    }

    argv.insert(1, "fit".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_csv_path_defaults_to_fit() {
        assert_eq!(
            rewrite_args(argv(&["fluxfit", "run.csv"])),
            argv(&["fluxfit", "fit", "run.csv"])
        );
    }

    #[test]
    fn explicit_subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(argv(&["fluxfit", "sample", "out.csv"])),
            argv(&["fluxfit", "sample", "out.csv"])
        );
        assert_eq!(
            rewrite_args(argv(&["fluxfit", "--help"])),
            argv(&["fluxfit", "--help"])
        );
        assert_eq!(rewrite_args(argv(&["fluxfit"])), argv(&["fluxfit"]));
    }
}
