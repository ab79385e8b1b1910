//! Synthetic measurement generation.
//!
//! Generates a filtration campaign from known parameters plus seeded
//! Gaussian noise: a pressure sweep at each requested flow rate, mirroring
//! how the lab actually runs a rig. Useful for demos and for exercising the
//! fitter without lab data; deterministic under a fixed seed.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{FluxParams, FluxSample};
use crate::error::AppError;
use crate::models::{denominator, predict};

/// Settings for one synthetic campaign.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Ground-truth parameters the flux values are generated from.
    pub params: FluxParams,
    pub flow_rates: Vec<f64>,
    /// Evenly spaced pressures per flow rate.
    pub pressures_per_flow: usize,
    pub pressure_min: f64,
    pub pressure_max: f64,
    /// Standard deviation of the additive flux noise. Zero is allowed and
    /// reproduces the model exactly.
    pub noise_sigma: f64,
    pub seed: u64,
}

/// Generate a synthetic measurement set.
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<FluxSample>, AppError> {
    if config.flow_rates.is_empty() {
        return Err(AppError::usage("At least one flow rate is required."));
    }
    if config.flow_rates.iter().any(|q| !q.is_finite() || *q <= 0.0) {
        return Err(AppError::usage("Flow rates must be finite and > 0."));
    }
    if config.pressures_per_flow == 0 {
        return Err(AppError::usage("Pressures per flow rate must be > 0."));
    }
    if !(config.pressure_min.is_finite()
        && config.pressure_max.is_finite()
        && config.pressure_max > config.pressure_min)
    {
        return Err(AppError::usage("Invalid pressure range for sample generation."));
    }
    if !config.noise_sigma.is_finite() || config.noise_sigma < 0.0 {
        return Err(AppError::usage("Noise sigma must be finite and >= 0."));
    }
    if !config.params.is_finite() {
        return Err(AppError::usage("Generator parameters must be finite."));
    }

    // The model pole sits at p = q·b. Refuse a sweep that crosses it: the
    // generated fluxes would be arbitrarily large on either side and useless
    // as a test set.
    for &q in &config.flow_rates {
        let lo = denominator(&config.params, config.pressure_min, q);
        let hi = denominator(&config.params, config.pressure_max, q);
        if lo == 0.0 || hi == 0.0 || (lo < 0.0) != (hi < 0.0) {
            return Err(AppError::usage(format!(
                "Pressure range [{}, {}] crosses the model pole for flow rate {q}.",
                config.pressure_min, config.pressure_max
            )));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| AppError::usage(format!("Noise distribution error: {e}")))?;

    let n = config.pressures_per_flow;
    let mut samples = Vec::with_capacity(config.flow_rates.len() * n);

    for &q in &config.flow_rates {
        for i in 0..n {
            let p = if n == 1 {
                config.pressure_min
            } else {
                let u = i as f64 / (n as f64 - 1.0);
                config.pressure_min + u * (config.pressure_max - config.pressure_min)
            };
            let flux = predict(&config.params, p, q) + noise.sample(&mut rng);
            samples.push(FluxSample {
                pressure: p,
                flow_rate: q,
                flux,
            });
        }
    }

    Ok(samples)
}

/// Write a generated measurement set as an ingestable CSV.
pub fn write_sample_csv(path: &Path, samples: &[FluxSample]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::usage(format!(
            "Failed to create sample CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(file, "pressure,flow_rate,flux")
        .map_err(|e| AppError::usage(format!("Failed to write sample CSV header: {e}")))?;

    for s in samples {
        writeln!(file, "{:.10},{:.10},{:.10}", s.pressure, s.flow_rate, s.flux)
            .map_err(|e| AppError::usage(format!("Failed to write sample CSV row: {e}")))?;
    }

    Ok(())
}
