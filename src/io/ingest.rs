//! CSV ingest and validation.
//!
//! Turns a delimited measurement file into clean [`FluxSample`]s that are
//! safe to fit.
//!
//! Expected schema: a header record (skipped), then three numeric columns
//! per row in fixed order:
//!
//! ```text
//! pressure,flow_rate,flux
//! ```
//!
//! Extra trailing columns are ignored. A ragged, non-numeric, or non-finite
//! row is a hard data error naming the offending line: a fit over silently
//! patched lab data is worse than no fit.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{DatasetStats, FluxSample};
use crate::error::AppError;

/// Ingest output: validated samples + dataset stats.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub samples: Vec<FluxSample>,
    pub stats: DatasetStats,
    pub rows_read: usize,
}

/// Load and validate a measurement CSV.
pub fn load_measurements(path: &Path) -> Result<Ingested, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::usage(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_measurements(file)
}

/// Parse measurements from any reader. Split out from [`load_measurements`]
/// so parsing is testable without touching the filesystem.
pub fn read_measurements(input: impl Read) -> Result<Ingested, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    // The csv reader consumes the first record as a header; we never look at
    // it. Column order is fixed, names are not required.
    let mut samples = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after the header
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = result
            .map_err(|e| AppError::data(format!("Line {line}: CSV parse error: {e}")))?;
        samples.push(parse_row(&record, line)?);
    }

    if samples.is_empty() {
        return Err(AppError::data(
            "No measurement rows found (the first record is treated as a header).",
        ));
    }

    let stats = DatasetStats::from_samples(&samples)
        .ok_or_else(|| AppError::data("Measurement set has no finite values."))?;

    Ok(Ingested {
        samples,
        stats,
        rows_read,
    })
}

fn parse_row(record: &StringRecord, line: usize) -> Result<FluxSample, AppError> {
    if record.len() < 3 {
        return Err(AppError::data(format!(
            "Line {line}: expected 3 columns (pressure, flow_rate, flux), got {}.",
            record.len()
        )));
    }

    let pressure = parse_field(record, 0, "pressure", line)?;
    let flow_rate = parse_field(record, 1, "flow_rate", line)?;
    let flux = parse_field(record, 2, "flux", line)?;

    Ok(FluxSample {
        pressure,
        flow_rate,
        flux,
    })
}

fn parse_field(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<f64, AppError> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::data(format!("Line {line}: missing `{name}` value.")))?;

    let value: f64 = raw
        .parse()
        .map_err(|_| AppError::data(format!("Line {line}: invalid `{name}` value '{raw}'.")))?;

    if !value.is_finite() {
        return Err(AppError::data(format!(
            "Line {line}: non-finite `{name}` value '{raw}'."
        )));
    }
    Ok(value)
}
