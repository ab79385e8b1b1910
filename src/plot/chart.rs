//! Plotters-powered PNG chart output.
//!
//! Why Plotters for the file output when the terminal already has the ASCII
//! plot?
//! - publication-ready axes, ticks, and legend
//! - easy to extend later (error bars, residual panel, SVG backend, etc.)
//!
//! The chart draws, per flow group, the fitted curve as a line plus the
//! observed samples as filled circles, both in the group's palette color.
//! The curve is resampled from the fitted parameters over
//! `[0, 1.5·max observed pressure]`, independent of the solver run.

use std::path::Path;

use plotters::prelude::*;

use crate::domain::{FlowGroup, FluxParams};
use crate::error::AppError;
use crate::models::predict;

/// Resampled curve points per flow group.
const CURVE_POINTS: usize = 50;

/// Render the fitted model and the observations to a PNG file.
pub fn render_chart_png(
    path: &Path,
    groups: &[FlowGroup],
    params: &FluxParams,
    width: u32,
    height: u32,
) -> Result<(), AppError> {
    let ((x0, x1), (y0, y1)) = chart_bounds(groups, params).ok_or_else(|| {
        AppError::usage("Cannot render chart: no finite observations to plot.")
    })?;

    let root = BitMapBackend::new(path, (width.max(320), height.max(240))).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc("TMP (bar)")
        .y_desc("Steady-state permeate flux (L/(m^2*h))")
        .draw()
        .map_err(chart_error)?;

    for (i, group) in groups.iter().enumerate() {
        let color = Palette99::pick(i);
        let curve = sample_curve(params, group.flow_rate, x0, x1);

        chart
            .draw_series(LineSeries::new(curve, color.stroke_width(2)))
            .map_err(chart_error)?
            .label(format!("q={} model", group.flow_rate))
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], Palette99::pick(i).stroke_width(2))
            });

        chart
            .draw_series(
                group
                    .samples
                    .iter()
                    .filter(|s| s.pressure.is_finite() && s.flux.is_finite())
                    .map(|s| Circle::new((s.pressure, s.flux), 3, color.filled())),
            )
            .map_err(chart_error)?
            .label(format!("q={} measured", group.flow_rate))
            .legend(move |(x, y)| Circle::new((x + 10, y), 3, Palette99::pick(i).filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

fn chart_error(e: impl std::fmt::Display) -> AppError {
    AppError::usage(format!("Failed to render chart: {e}"))
}

/// Axis bounds: pressure `[0, 1.5·max]`, flux from observations and curves
/// with 5% padding. `None` when nothing finite is available.
fn chart_bounds(groups: &[FlowGroup], params: &FluxParams) -> Option<((f64, f64), (f64, f64))> {
    let p_max = groups
        .iter()
        .flat_map(|g| g.samples.iter().map(|s| s.pressure))
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max);
    if p_max <= 0.0 {
        return None;
    }
    let (x0, x1) = (0.0, p_max * 1.5);

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for g in groups {
        for s in &g.samples {
            if s.flux.is_finite() {
                y_min = y_min.min(s.flux);
                y_max = y_max.max(s.flux);
            }
        }
        for (_, flux) in sample_curve(params, g.flow_rate, x0, x1) {
            y_min = y_min.min(flux);
            y_max = y_max.max(flux);
        }
    }
    if !(y_min.is_finite() && y_max.is_finite() && y_max > y_min) {
        return None;
    }

    let pad = ((y_max - y_min) * 0.05).max(1e-12);
    Some(((x0, x1), (y_min - pad, y_max + pad)))
}

fn sample_curve(params: &FluxParams, flow_rate: f64, p_min: f64, p_max: f64) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(CURVE_POINTS);
    for i in 0..CURVE_POINTS {
        let u = i as f64 / (CURVE_POINTS as f64 - 1.0);
        let p = p_min + u * (p_max - p_min);
        let flux = predict(params, p, flow_rate);
        if flux.is_finite() {
            out.push((p, flux));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FluxSample, group_by_flow_rate};

    #[test]
    fn bounds_cover_observations_and_curves() {
        let params = FluxParams::new(0.02, -0.05, 0.015);
        let samples = [
            FluxSample { pressure: 1.0, flow_rate: 0.5, flux: 0.01 },
            FluxSample { pressure: 4.0, flow_rate: 0.5, flux: 0.013 },
        ];
        let groups = group_by_flow_rate(&samples);

        let ((x0, x1), (y0, y1)) = chart_bounds(&groups, &params).unwrap();
        assert_eq!(x0, 0.0);
        assert!((x1 - 6.0).abs() < 1e-12);
        assert!(y0 < 0.01);
        assert!(y1 > 0.013);
    }

    #[test]
    fn bounds_require_finite_observations() {
        let params = FluxParams::INITIAL_GUESS;
        assert!(chart_bounds(&[], &params).is_none());
    }
}
