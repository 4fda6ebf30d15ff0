//! Plotters-powered chart widget for Ratatui.
//!
//! Any `ChartSpec` renders through this widget:
//! - band as vertical segments between its bounds
//! - line series in a rotating palette
//! - dashed overlays in yellow
//! - point series as pixels
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{ChartSpec, SeriesStyle};

const LINE_COLORS: [RGBColor; 3] = [
    RGBColor(0, 255, 255), // cyan
    RGBColor(0, 255, 0),   // green
    RGBColor(255, 0, 255), // magenta
];
const OVERLAY_COLOR: RGBColor = RGBColor(255, 255, 0);
const BAND_COLOR: RGBColor = RGBColor(90, 90, 90);

/// Render-only view over a chart; bounds are computed outside the render call.
pub struct PlottersChart<'a> {
    pub chart: &'a ChartSpec,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> PlottersChart<'a> {
    /// `None` when the chart has nothing finite to draw.
    pub fn new(chart: &'a ChartSpec) -> Option<Self> {
        let (x_bounds, y_bounds) = padded_bounds(chart)?;
        Some(Self {
            chart,
            x_bounds,
            y_bounds,
        })
    }
}

/// Chart bounds with 5% vertical padding; degenerate ranges are widened.
pub fn padded_bounds(chart: &ChartSpec) -> Option<([f64; 2], [f64; 2])> {
    let (mut x0, mut x1, mut y0, mut y1) = chart.bounds()?;
    if x1 <= x0 {
        x0 -= 0.5;
        x1 += 0.5;
    }
    if y1 <= y0 {
        let pad = (y0.abs() * 0.05).max(1.0);
        y0 -= pad;
        y1 += pad;
    } else {
        let pad = (y1 - y0) * 0.05;
        y0 -= pad;
        y1 += pad;
    }
    Some(([x0, x1], [y0, y1]))
}

/// Label for `v`: the nearest labelled tick when close enough, else the number.
fn tick_label(ticks: &[(f64, String)], span: f64, v: f64) -> String {
    ticks
        .iter()
        .map(|(x, label)| ((x - v).abs(), label))
        .filter(|(d, _)| *d <= span / 20.0)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, label)| label.clone())
        .unwrap_or_else(|| format!("{v:.0}"))
}

impl<'a> Widget for PlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let chart = self.chart;
        let widget = widget_fn(move |root| {
            let mut ctx = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            let x_label = |v: &f64| tick_label(&chart.x_ticks, x1 - x0, *v);
            ctx.configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(chart.x_label.as_str())
                .y_desc(chart.y_label.as_str())
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&x_label)
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            if let Some(band) = &chart.band {
                ctx.draw_series(
                    band.points
                        .iter()
                        .map(|&(x, lo, hi)| PathElement::new(vec![(x, lo), (x, hi)], &BAND_COLOR)),
                )?;
            }

            let mut palette = LINE_COLORS.iter().cycle();
            for series in &chart.series {
                match series.style {
                    SeriesStyle::Line => {
                        let color = palette.next().copied().unwrap_or(WHITE);
                        ctx.draw_series(LineSeries::new(series.points.iter().copied(), &color))?;
                    }
                    SeriesStyle::Dashed => {
                        // Every other segment.
                        ctx.draw_series(
                            series
                                .points
                                .windows(2)
                                .step_by(2)
                                .map(|w| PathElement::new(vec![w[0], w[1]], &OVERLAY_COLOR)),
                        )?;
                    }
                    SeriesStyle::Points => {
                        // `Circle` radii come out oversized through the ratatui backend.
                        ctx.draw_series(series.points.iter().map(|&p| Pixel::new(p, WHITE)))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Series;

    fn chart(points: Vec<(f64, f64)>) -> ChartSpec {
        ChartSpec {
            title: "t".into(),
            x_label: "x".into(),
            y_label: "y".into(),
            x_ticks: vec![(1.0, "Jan".into()), (2.0, "Feb".into())],
            series: vec![Series::new("s", SeriesStyle::Line, points)],
            band: None,
            notes: Vec::new(),
        }
    }

    #[test]
    fn bounds_are_padded_and_widened() {
        let (x, y) = padded_bounds(&chart(vec![(1.0, 0.0), (3.0, 100.0)])).unwrap();
        assert_eq!(x, [1.0, 3.0]);
        assert_eq!(y, [-5.0, 105.0]);

        let (x, y) = padded_bounds(&chart(vec![(2.0, 10.0)])).unwrap();
        assert_eq!(x, [1.5, 2.5]);
        assert_eq!(y, [9.0, 11.0]);

        assert!(PlottersChart::new(&chart(Vec::new())).is_none());
    }

    #[test]
    fn tick_labels_snap_to_nearest_tick() {
        let ticks = chart(Vec::new()).x_ticks;
        assert_eq!(tick_label(&ticks, 11.0, 1.2), "Jan");
        assert_eq!(tick_label(&ticks, 11.0, 7.0), "7");
    }

    #[test]
    fn render_into_buffer_does_not_panic() {
        let spec = chart(vec![(1.0, 1.0), (2.0, 4.0), (3.0, 9.0)]);
        let widget = PlottersChart::new(&spec).unwrap();
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let small = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(small);
        PlottersChart::new(&spec).unwrap().render(small, &mut buf);
        assert!(buf.content().iter().any(|c| c.symbol() == "C"));
    }
}
