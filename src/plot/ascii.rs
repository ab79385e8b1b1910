//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - fitted curves: `-` lines, one per flow group
//! - observed points: a per-group marker cycle (`o`, `x`, `+`, ...)
//!
//! The pressure axis spans `[0, 1.5·max observed pressure]`, matching the
//! exported curve grid, so the fitted tail past the data stays visible.

use crate::domain::{CurveFile, FlowGroup, FluxParams};
use crate::models::predict;

/// Marker cycle for observed points, one marker per flow group.
const GROUP_MARKERS: [char; 6] = ['o', 'x', '+', '*', '#', '@'];

pub fn group_marker(index: usize) -> char {
    GROUP_MARKERS[index % GROUP_MARKERS.len()]
}

/// Render a plot for an in-memory fit result.
pub fn render_ascii_plot(
    groups: &[FlowGroup],
    params: &FluxParams,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);

    let p_max = groups
        .iter()
        .flat_map(|g| g.samples.iter().map(|s| s.pressure))
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max);
    let (p_min, p_max) = if p_max > 0.0 { (0.0, p_max * 1.5) } else { (0.0, 1.0) };

    let curves: Vec<(f64, Vec<(f64, f64)>)> = groups
        .iter()
        .map(|g| {
            (
                g.flow_rate,
                sample_curve(params, g.flow_rate, p_min, p_max, width),
            )
        })
        .collect();

    let points: Vec<(usize, f64, f64)> = groups
        .iter()
        .enumerate()
        .flat_map(|(i, g)| g.samples.iter().map(move |s| (i, s.pressure, s.flux)))
        .collect();

    render_plot(&curves, &points, p_min, p_max, width, height)
}

/// Render a plot from a saved curve JSON file (curves only, no overlay
/// points).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let mut p_min = f64::INFINITY;
    let mut p_max = f64::NEG_INFINITY;
    for g in &curve.groups {
        for &p in &g.pressure {
            p_min = p_min.min(p);
            p_max = p_max.max(p);
        }
    }
    if !(p_min.is_finite() && p_max.is_finite() && p_max > p_min) {
        p_min = 0.0;
        p_max = 1.0;
    }

    let curves: Vec<(f64, Vec<(f64, f64)>)> = curve
        .groups
        .iter()
        .map(|g| {
            (
                g.flow_rate,
                g.pressure.iter().copied().zip(g.flux.iter().copied()).collect(),
            )
        })
        .collect();

    render_plot(&curves, &[], p_min, p_max, width, height)
}

fn render_plot(
    curves: &[(f64, Vec<(f64, f64)>)],
    points: &[(usize, f64, f64)],
    p_min: f64,
    p_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = flux_range(curves, points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so points can overlay).
    for (_, curve) in curves {
        draw_curve(&mut grid, curve, p_min, p_max, y_min, y_max);
    }

    for &(group_idx, p, flux) in points {
        if !(p.is_finite() && flux.is_finite()) {
            continue;
        }
        let x = map_x(p, p_min, p_max, width);
        let y = map_y(flux, y_min, y_max, height);
        grid[y][x] = group_marker(group_idx);
    }

    // Build the final string: header with ranges, a marker legend, then the grid.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: pressure=[{p_min:.3}, {p_max:.3}] bar | flux=[{y_min:.4}, {y_max:.4}] L/(m^2*h)\n"
    ));
    let legend = curves
        .iter()
        .enumerate()
        .map(|(i, (q, _))| format!("{} q={q}", group_marker(i)))
        .collect::<Vec<_>>()
        .join(" | ");
    out.push_str(&format!("Legend: {legend}\n"));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn sample_curve(
    params: &FluxParams,
    flow_rate: f64,
    p_min: f64,
    p_max: f64,
    n: usize,
) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let p = p_min + u * (p_max - p_min);
        let flux = predict(params, p, flow_rate);
        if flux.is_finite() {
            out.push((p, flux));
        }
    }
    out
}

fn flux_range(
    curves: &[(f64, Vec<(f64, f64)>)],
    points: &[(usize, f64, f64)],
) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, _, flux) in points {
        min_y = min_y.min(flux);
        max_y = max_y.max(flux);
    }
    for (_, curve) in curves {
        for &(_, y) in curve {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(p: f64, p_min: f64, p_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((p - p_min) / (p_max - p_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    p_min: f64,
    p_max: f64,
    y_min: f64,
    y_max: f64,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(p, y) in curve {
        let x = map_x(p, p_min, p_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
