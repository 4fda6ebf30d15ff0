//! Chart assembly.
//!
//! Builders in `build` turn a site catalog plus loaded tables into
//! renderer-agnostic `ChartSpec`s. The ASCII plot, the TUI and CSV export all
//! consume the same spec.

pub mod build;

pub use build::*;

use serde::Serialize;

/// How a series should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesStyle {
    Line,
    /// Overlays (day-ahead price, mean markers, fitted curves).
    Dashed,
    Points,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub style: SeriesStyle,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(label: impl Into<String>, style: SeriesStyle, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            style,
            points,
        }
    }
}

/// Shaded area between two bounds: `(x, lower, upper)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSeries {
    pub label: String,
    pub points: Vec<(f64, f64, f64)>,
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Labelled tick positions on the x axis.
    pub x_ticks: Vec<(f64, String)>,
    pub series: Vec<Series>,
    pub band: Option<BandSeries>,
    /// Free-form annotations (percentile marks, overlay failures, ...).
    pub notes: Vec<String>,
}

impl ChartSpec {
    /// `(x_min, x_max, y_min, y_max)` over every series and the band.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut xs = (f64::INFINITY, f64::NEG_INFINITY);
        let mut ys = (f64::INFINITY, f64::NEG_INFINITY);
        let mut push = |x: f64, y: f64| {
            if x.is_finite() && y.is_finite() {
                xs = (xs.0.min(x), xs.1.max(x));
                ys = (ys.0.min(y), ys.1.max(y));
            }
        };
        for s in &self.series {
            for &(x, y) in &s.points {
                push(x, y);
            }
        }
        if let Some(band) = &self.band {
            for &(x, lo, hi) in &band.points {
                push(x, lo);
                push(x, hi);
            }
        }
        (xs.0 <= xs.1 && ys.0 <= ys.1).then_some((xs.0, xs.1, ys.0, ys.1))
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

/// Result of building one view.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome<T = ChartSpec> {
    Ready(T),
    /// The source exists but could not be turned into a chart.
    Unavailable(String),
    /// No source file for this view.
    Missing,
}

impl<T> ChartOutcome<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ChartOutcome::Ready(chart) => Some(chart),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ChartOutcome::Ready(_))
    }

    /// One-line status for views that did not produce a chart.
    pub fn status_message(&self) -> Option<String> {
        match self {
            ChartOutcome::Ready(_) => None,
            ChartOutcome::Unavailable(reason) => Some(format!("Visualization unavailable for this file: {reason}")),
            ChartOutcome::Missing => Some("No data available for this view".to_string()),
        }
    }
}

/// Stacked monthly panels, one per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedCharts {
    pub title: String,
    pub panels: Vec<(crate::domain::MetricCategory, ChartOutcome)>,
}
