//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - band: `:` fill between lower and upper bound
//! - first line series: `-`, further line series: `=`
//! - dashed series: `.`
//! - point series: `o`

use crate::chart::{ChartSpec, SeriesStyle};

/// Render a chart into a `width` x `height` character grid with a header line
/// and a tick row.
pub fn render_chart(chart: &ChartSpec, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max, y_min, y_max)) = chart.bounds() else {
        return format!("{}\n(no data)\n", chart.title);
    };
    let (x_min, x_max) = widen(x_min, x_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Band first so every series draws over it.
    if let Some(band) = &chart.band {
        for &(x, lo, hi) in &band.points {
            let col = map_x(x, x_min, x_max, width);
            let top = map_y(hi.max(lo), y_min, y_max, height);
            let bottom = map_y(lo.min(hi), y_min, y_max, height);
            for row in grid.iter_mut().take(bottom + 1).skip(top) {
                row[col] = ':';
            }
        }
    }

    let mut line_index = 0;
    for series in &chart.series {
        let ch = match series.style {
            SeriesStyle::Line => {
                line_index += 1;
                if line_index == 1 { '-' } else { '=' }
            }
            SeriesStyle::Dashed => '.',
            SeriesStyle::Points => 'o',
        };
        match series.style {
            SeriesStyle::Points => {
                for &(x, y) in &series.points {
                    if x.is_finite() && y.is_finite() {
                        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = ch;
                    }
                }
            }
            _ => draw_curve(&mut grid, &series.points, x_min, x_max, y_min, y_max, ch),
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", chart.title));
    out.push_str(&format!("Plot: x=[{x_min:.2}, {x_max:.2}] | y=[{y_min:.2}, {y_max:.2}]\n"));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let ticks = tick_row(chart, x_min, x_max, width);
    if !ticks.trim().is_empty() {
        out.push_str(ticks.trim_end());
        out.push('\n');
    }

    out
}

/// Place tick labels under their columns, skipping labels that would overlap.
fn tick_row(chart: &ChartSpec, x_min: f64, x_max: f64, width: usize) -> String {
    let mut row = vec![' '; width];
    let mut next_free = 0;
    for (x, label) in &chart.x_ticks {
        let col = map_x(*x, x_min, x_max, width);
        if col < next_free || col + label.chars().count() > width {
            continue;
        }
        for (i, ch) in label.chars().enumerate() {
            row[col + i] = ch;
        }
        next_free = col + label.chars().count() + 1;
    }
    row.into_iter().collect()
}

fn widen(min: f64, max: f64) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
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
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !x.is_finite() || !y.is_finite() {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank or band cells are overwritten.
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
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            let cell = &mut grid[y0 as usize][x0 as usize];
            if *cell == ' ' || *cell == ':' {
                *cell = ch;
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BandSeries, Series};

    fn chart(series: Vec<Series>) -> ChartSpec {
        ChartSpec {
            title: "Test".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            x_ticks: vec![(1.0, "Jan".to_string()), (10.0, "Oct".to_string())],
            series,
            band: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let c = chart(vec![
            Series::new("Mean", SeriesStyle::Line, vec![(1.0, 100.0), (10.0, 100.0)]),
            Series::new("Obs", SeriesStyle::Points, vec![(10.0, 110.0)]),
        ]);

        let txt = render_chart(&c, 10, 5);
        let expected = concat!(
            "Test\n",
            "Plot: x=[1.00, 10.00] | y=[99.50, 110.50]\n",
            "         o\n",
            "\n",
            "\n",
            "\n",
            "----------\n",
            "Jan\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn band_is_drawn_under_lines() {
        let mut c = chart(vec![Series::new("Mean", SeriesStyle::Line, vec![(0.0, 5.0), (1.0, 5.0)])]);
        c.band = Some(BandSeries {
            label: "band".to_string(),
            points: vec![(0.0, 0.0, 10.0), (1.0, 0.0, 10.0)],
        });
        c.x_ticks.clear();
        let txt = render_chart(&c, 10, 5);
        let grid: Vec<&str> = txt.lines().skip(2).collect();
        assert_eq!(grid.len(), 5);
        assert!(grid[0].starts_with(':'));
        assert!(grid[2].starts_with('-'));
        assert!(grid[2].ends_with('-'));
    }

    #[test]
    fn empty_chart_says_no_data() {
        let c = chart(vec![Series::new("Mean", SeriesStyle::Line, Vec::new())]);
        assert_eq!(render_chart(&c, 20, 5), "Test\n(no data)\n");
    }
}
