//! Chart builders.
//!
//! Every builder locates its source file through the site catalog, loads it
//! with the caller's `DataLoader` and aggregates it. A file that fails to load
//! or aggregate yields `ChartOutcome::Unavailable` and never affects other
//! views.

use std::sync::Arc;

use tracing::warn;

use crate::chart::{BandSeries, ChartOutcome, ChartSpec, CombinedCharts, Series, SeriesStyle};
use crate::domain::{ChartView, ContentKind, DataFile, MetricCategory, Resolution, SiteCatalog, month_abbrev, month_name};
use crate::io::loader::{DataLoader, LoadedTable};
use crate::report::format::{fmt_amount, fmt_money};
use crate::stats::{
    DAILY_ROLLING_WINDOW, SeriesSummary, hour_of_day, hourly_profile, month_distribution, month_duration_curve, rolling_mean_grouped,
    summarize_rows,
};

/// Tick spacing (rows) on daily charts.
const DAILY_TICK_EVERY: usize = 30;

/// Histogram bins on distribution charts.
const DISTRIBUTION_BINS: usize = 10;

/// Metrics shown on the combined view. Day-ahead price is drawn as an overlay
/// on the price panel instead.
const COMBINED_METRICS: [MetricCategory; 3] = [MetricCategory::Generation, MetricCategory::Price, MetricCategory::Revenue];

/// Build the chart for one view.
pub fn build(
    loader: &mut DataLoader,
    site: &SiteCatalog,
    metric: MetricCategory,
    view: ChartView,
    month: u32,
) -> ChartOutcome {
    match view {
        ChartView::Monthly => monthly_chart(loader, site, metric),
        ChartView::Daily => daily_chart(loader, site, metric),
        ChartView::Hourly => hourly_chart(loader, site, metric),
        ChartView::Duration => duration_chart(loader, site, month),
        ChartView::Distribution => distribution_chart(loader, site, metric, month),
    }
}

/// Mean by month with a p5–p95 band; price charts overlay day-ahead price.
pub fn monthly_chart(loader: &mut DataLoader, site: &SiteCatalog, metric: MetricCategory) -> ChartOutcome {
    let Some(file) = site.find_chart_source(metric, Resolution::Monthly) else {
        return ChartOutcome::Missing;
    };
    let (table, summary) = match load_summary(loader, file) {
        Ok(loaded) => loaded,
        Err(reason) => return ChartOutcome::Unavailable(reason),
    };

    let xs = month_positions(&table);
    let mut chart = ChartSpec {
        title: format!("Monthly {} Forecast - {}", metric.display_name(), site.site.display_name),
        x_label: String::new(),
        y_label: metric.unit_label(Resolution::Monthly).to_string(),
        x_ticks: month_ticks(&table, &xs),
        series: Vec::new(),
        band: None,
        notes: Vec::new(),
    };

    if metric == MetricCategory::Price {
        chart
            .series
            .push(Series::new("Real-Time Price", SeriesStyle::Line, zip_points(&xs, &summary.mean)));
        overlay_day_ahead(loader, site, Resolution::Monthly, &mut chart, |table, summary| {
            Some(zip_points(&month_positions(table), &summary.mean))
        });
    } else {
        if let Some(band) = summary.band() {
            chart.band = Some(band_series("P5-P95 Confidence Band", &xs, &band.lower, &band.upper));
        }
        chart
            .series
            .push(Series::new("Mean", SeriesStyle::Line, zip_points(&xs, &summary.mean)));
    }

    ready_or_empty(chart, file)
}

/// Daily mean smoothed with a trailing 7-row window.
pub fn daily_chart(loader: &mut DataLoader, site: &SiteCatalog, metric: MetricCategory) -> ChartOutcome {
    let Some(file) = site.find_chart_source(metric, Resolution::Daily) else {
        return ChartOutcome::Missing;
    };
    let (table, summary) = match load_summary(loader, file) {
        Ok(loaded) => loaded,
        Err(reason) => return ChartOutcome::Unavailable(reason),
    };

    let xs: Vec<f64> = (0..table.row_count).map(|i| i as f64).collect();
    let smooth = |values: &[Option<f64>]| rolling_mean_grouped(values, table.year(), DAILY_ROLLING_WINDOW);

    let mut chart = ChartSpec {
        title: format!(
            "Daily {} Forecast ({}-day Rolling Average) - {}",
            metric.display_name(),
            DAILY_ROLLING_WINDOW,
            site.site.display_name
        ),
        x_label: String::new(),
        y_label: metric.unit_label(Resolution::Daily).to_string(),
        x_ticks: daily_ticks(&table),
        series: Vec::new(),
        band: None,
        notes: Vec::new(),
    };

    if metric == MetricCategory::Price {
        chart.series.push(Series::new(
            "Real-Time Price (7-day avg)",
            SeriesStyle::Line,
            zip_points(&xs, &smooth(&summary.mean)),
        ));
        let expected_rows = table.row_count;
        overlay_day_ahead(loader, site, Resolution::Daily, &mut chart, |da, da_summary| {
            (da.row_count == expected_rows).then(|| {
                let smoothed = rolling_mean_grouped(&da_summary.mean, da.year(), DAILY_ROLLING_WINDOW);
                zip_points(&xs, &smoothed)
            })
        });
    } else {
        if let Some(band) = summary.interquartile() {
            chart.band = Some(band_series(
                "P25-P75 Confidence Band (7-day avg)",
                &xs,
                &smooth(&band.lower),
                &smooth(&band.upper),
            ));
        }
        chart.series.push(Series::new(
            "Mean (7-day avg)",
            SeriesStyle::Line,
            zip_points(&xs, &smooth(&summary.mean)),
        ));
    }

    ready_or_empty(chart, file)
}

/// Average profile over the 24 hours of the day.
pub fn hourly_chart(loader: &mut DataLoader, site: &SiteCatalog, metric: MetricCategory) -> ChartOutcome {
    if metric == MetricCategory::Revenue {
        return ChartOutcome::Unavailable("hourly profiles are not shown for revenue".to_string());
    }
    let Some(file) = site.find_chart_source(metric, Resolution::Hourly) else {
        return ChartOutcome::Missing;
    };
    let (table, summary) = match load_summary(loader, file) {
        Ok(loaded) => loaded,
        Err(reason) => return ChartOutcome::Unavailable(reason),
    };
    if file.kind == ContentKind::Stats && hour_of_day(&table).is_none() {
        return unavailable(file, "stats table has no `hour` or timestamp column");
    }

    let profile = hourly_profile(&table, &summary, None);
    let xs: Vec<f64> = profile.iter().map(|p| f64::from(p.hour)).collect();
    let means: Vec<Option<f64>> = profile.iter().map(|p| p.mean).collect();
    let lower: Vec<Option<f64>> = profile.iter().map(|p| p.p5).collect();
    let upper: Vec<Option<f64>> = profile.iter().map(|p| p.p95).collect();

    let (band_label, mean_label) = if metric == MetricCategory::Price {
        ("P5-P95 RT Price", "Real-Time Price Mean")
    } else {
        ("P5-P95 Confidence Band", "Mean")
    };

    let mut chart = ChartSpec {
        title: format!("Average Hourly {} Profile - {}", metric.display_name(), site.site.display_name),
        x_label: "Hour of Day".to_string(),
        y_label: metric.unit_label(Resolution::Hourly).to_string(),
        x_ticks: (0..24).step_by(2).map(|h| (f64::from(h), h.to_string())).collect(),
        series: vec![Series::new(mean_label, SeriesStyle::Line, zip_points(&xs, &means))],
        band: None,
        notes: Vec::new(),
    };
    if lower.iter().any(Option::is_some) && upper.iter().any(Option::is_some) {
        chart.band = Some(band_series(band_label, &xs, &lower, &upper));
    }

    if metric == MetricCategory::Price {
        overlay_day_ahead(loader, site, Resolution::Hourly, &mut chart, |da, da_summary| {
            // Stats tables need real hours; scenario tables fall back to row order.
            if hour_of_day(da).is_none() && da.scenario_columns().is_empty() {
                return None;
            }
            let points = hourly_profile(da, da_summary, None)
                .into_iter()
                .filter_map(|p| Some((f64::from(p.hour), p.mean?)))
                .collect();
            Some(points)
        });
    }

    ready_or_empty(chart, file)
}

/// Price duration curve for one month of the hourly price timeseries.
pub fn duration_chart(loader: &mut DataLoader, site: &SiteCatalog, month: u32) -> ChartOutcome {
    let Some(file) = duration_source(site) else {
        return ChartOutcome::Missing;
    };
    let table = match load_table(loader, file) {
        Ok(table) => table,
        Err(reason) => return ChartOutcome::Unavailable(reason),
    };
    let curve = match month_duration_curve(&table, month) {
        Ok(curve) => curve,
        Err(err) => return unavailable(file, err),
    };

    let month_label = month_name(month).unwrap_or("Unknown month");
    let mut title = format!("Price Duration Curve - {month_label} - {}", site.site.display_name);
    if curve.has_negative {
        title.push_str(" (includes negative prices)");
    }

    let marks: Vec<(f64, f64)> = curve.marks.iter().map(|m| (m.exceedance_pct, m.value)).collect();
    let mut notes = vec![format!("Mean: {}", fmt_money(curve.mean, 2))];
    notes.extend(
        curve
            .marks
            .iter()
            .map(|m| format!("P{}: {} (exceeded {:.0}% of the time)", m.percentile, fmt_money(m.value, 1), m.exceedance_pct)),
    );

    let chart = ChartSpec {
        title,
        x_label: "Duration (% of time)".to_string(),
        y_label: "Price ($/MWh)".to_string(),
        x_ticks: (0..=100).step_by(20).map(|p| (f64::from(p), format!("{p}%"))).collect(),
        series: vec![
            Series::new("Price", SeriesStyle::Line, curve.points()),
            Series::new(
                format!("Mean: {}", fmt_money(curve.mean, 2)),
                SeriesStyle::Dashed,
                vec![(0.0, curve.mean), (100.0, curve.mean)],
            ),
            Series::new("Percentiles", SeriesStyle::Points, marks),
        ],
        band: None,
        notes,
    };
    ChartOutcome::Ready(chart)
}

/// Spread of one month across scenario years (generation and revenue only).
pub fn distribution_chart(
    loader: &mut DataLoader,
    site: &SiteCatalog,
    metric: MetricCategory,
    month: u32,
) -> ChartOutcome {
    if !matches!(metric, MetricCategory::Generation | MetricCategory::Revenue) {
        return ChartOutcome::Unavailable("distributions are shown for generation and revenue only".to_string());
    }
    let Some(file) = site.find(metric, Resolution::Monthly, ContentKind::Timeseries) else {
        return ChartOutcome::Missing;
    };
    let table = match load_table(loader, file) {
        Ok(table) => table,
        Err(reason) => return ChartOutcome::Unavailable(reason),
    };
    let dist = match month_distribution(&table, month) {
        Ok(dist) => dist,
        Err(err) => return unavailable(file, err),
    };

    let n = dist.values.len();
    let histogram = dist.histogram(DISTRIBUTION_BINS);
    let bin_width = match histogram.as_slice() {
        [a, b, ..] => b.0 - a.0,
        _ => 1.0,
    };
    let density: Vec<(f64, f64)> = histogram
        .iter()
        .map(|&(center, count)| (center, count as f64 / (n as f64 * bin_width)))
        .collect();

    let mean = dist.summary.mean.unwrap_or(f64::NAN);
    let std = dist.summary.std_dev.unwrap_or(f64::NAN);
    let fmt = |v: f64| match metric {
        MetricCategory::Revenue => fmt_money(v, 0),
        _ => fmt_amount(v, 0),
    };
    let cv = if mean != 0.0 { std / mean * 100.0 } else { 0.0 };

    let mut series = vec![Series::new(format!("Histogram density (n={n})"), SeriesStyle::Points, density)];
    let normal = dist.normal_curve(60);
    if !normal.is_empty() {
        series.push(Series::new(
            format!("Normal fit (mean={}, std={})", fmt(mean), fmt(std)),
            SeriesStyle::Dashed,
            normal,
        ));
    }

    let month_label = month_name(month).unwrap_or("Unknown month");
    let chart = ChartSpec {
        title: format!("Monthly {} Distribution - {month_label} - {}", metric.display_name(), site.site.display_name),
        x_label: format!("Monthly {}", metric.unit_label(Resolution::Monthly)),
        y_label: "Probability Density".to_string(),
        x_ticks: Vec::new(),
        series,
        band: None,
        notes: vec![
            format!("Distribution across {n} simulation years"),
            format!("Mean: {}", fmt(mean)),
            format!("Median: {}", fmt(dist.median)),
            format!("P5: {}", fmt(dist.p5)),
            format!("P95: {}", fmt(dist.p95)),
            format!("Std Dev: {}", fmt(std)),
            format!("CV: {cv:.1}%"),
            format!("Min: {}", fmt(dist.summary.min.unwrap_or(f64::NAN))),
            format!("Max: {}", fmt(dist.summary.max.unwrap_or(f64::NAN))),
        ],
    };
    ChartOutcome::Ready(chart)
}

/// Monthly panels for every metric that has monthly data; needs at least two.
pub fn combined_charts(loader: &mut DataLoader, site: &SiteCatalog) -> ChartOutcome<CombinedCharts> {
    let available: Vec<MetricCategory> = COMBINED_METRICS
        .into_iter()
        .filter(|m| site.files(*m).iter().any(|f| f.resolution == Resolution::Monthly))
        .collect();

    match available.len() {
        0 => return ChartOutcome::Missing,
        1 => {
            return ChartOutcome::Unavailable(format!(
                "combined view needs monthly data for at least two metrics (found {})",
                available[0].display_name()
            ));
        }
        _ => {}
    }

    let panels = available
        .into_iter()
        .map(|metric| {
            let outcome = match monthly_chart(loader, site, metric) {
                ChartOutcome::Ready(mut chart) => {
                    chart.title = format!("Monthly {}", metric.unit_label(Resolution::Monthly));
                    ChartOutcome::Ready(chart)
                }
                other => other,
            };
            (metric, outcome)
        })
        .collect();

    ChartOutcome::Ready(CombinedCharts {
        title: format!("Combined Monthly Forecasts - {}", site.site.display_name),
        panels,
    })
}

/// The hourly price timeseries used for duration curves.
///
/// Prefers the conventional `{site}_price_hourly_timeseries_compressed.csv`,
/// then any hourly price timeseries.
pub fn duration_source(site: &SiteCatalog) -> Option<&DataFile> {
    let conventional = format!("{}_price_hourly_timeseries_compressed.csv", site.site.folder_name);
    site.find_by_name(MetricCategory::Price, &conventional)
        .or_else(|| site.find(MetricCategory::Price, Resolution::Hourly, ContentKind::Timeseries))
}

fn load_table(loader: &mut DataLoader, file: &DataFile) -> Result<Arc<LoadedTable>, String> {
    loader.load(file).map_err(|err| {
        warn!(file = %file.path.display(), error = %err, "chart source failed to load");
        format!("{}: {err}", file.file_name)
    })
}

fn load_summary(loader: &mut DataLoader, file: &DataFile) -> Result<(Arc<LoadedTable>, SeriesSummary), String> {
    let table = load_table(loader, file)?;
    let summary = summarize_rows(&table).map_err(|err| {
        warn!(file = %file.path.display(), error = %err, "chart source could not be summarized");
        format!("{}: {err}", file.file_name)
    })?;
    Ok((table, summary))
}

fn unavailable(file: &DataFile, reason: impl std::fmt::Display) -> ChartOutcome {
    warn!(file = %file.path.display(), reason = %reason, "chart unavailable");
    ChartOutcome::Unavailable(format!("{}: {reason}", file.file_name))
}

fn ready_or_empty(chart: ChartSpec, file: &DataFile) -> ChartOutcome {
    if chart.is_empty() {
        unavailable(file, "no values to plot")
    } else {
        ChartOutcome::Ready(chart)
    }
}

/// Add the day-ahead series to a price chart. Overlay failures become notes.
fn overlay_day_ahead<F>(loader: &mut DataLoader, site: &SiteCatalog, resolution: Resolution, chart: &mut ChartSpec, points: F)
where
    F: FnOnce(&LoadedTable, &SeriesSummary) -> Option<Vec<(f64, f64)>>,
{
    let Some(file) = site.find_chart_source(MetricCategory::PriceDa, resolution) else {
        return;
    };
    let label = match resolution {
        Resolution::Daily => "Day-Ahead Price (7-day avg)",
        Resolution::Hourly => "Day-Ahead Price Mean",
        _ => "Day-Ahead Price",
    };
    match load_summary(loader, file) {
        Ok((table, summary)) => match points(&table, &summary) {
            Some(points) if !points.is_empty() => chart.series.push(Series::new(label, SeriesStyle::Dashed, points)),
            _ => chart.notes.push(format!("Day-ahead overlay skipped: {} does not line up", file.file_name)),
        },
        Err(reason) => chart.notes.push(format!("Day-ahead overlay unavailable: {reason}")),
    }
}

/// Month number per row when there is a month column, else `1..=n`.
fn month_positions(table: &LoadedTable) -> Vec<f64> {
    match table.month() {
        Some(months) => months.iter().map(|&m| f64::from(m)).collect(),
        None => (1..=table.row_count).map(|i| i as f64).collect(),
    }
}

fn month_ticks(table: &LoadedTable, xs: &[f64]) -> Vec<(f64, String)> {
    let names = table.label("month_name");
    xs.iter()
        .enumerate()
        .map(|(row, &x)| {
            let label = names
                .and_then(|c| c.values.get(row))
                .filter(|s| !s.is_empty())
                .map(|s| s.chars().take(3).collect::<String>())
                .or_else(|| month_abbrev(x as u32).map(str::to_string))
                .unwrap_or_else(|| format!("{x:.0}"));
            (x, label)
        })
        .collect()
}

fn daily_ticks(table: &LoadedTable) -> Vec<(f64, String)> {
    let labels = table.label("date_label");
    (0..table.row_count)
        .step_by(DAILY_TICK_EVERY)
        .map(|row| {
            let label = labels
                .and_then(|c| c.values.get(row).cloned())
                .or_else(|| {
                    let month = *table.month()?.get(row)?;
                    let day = *table.day()?.get(row)?;
                    Some(format!("{} {day}", month_abbrev(month as u32)?))
                })
                .unwrap_or_else(|| (row + 1).to_string());
            (row as f64, label)
        })
        .collect()
}

fn zip_points(xs: &[f64], ys: &[Option<f64>]) -> Vec<(f64, f64)> {
    xs.iter()
        .zip(ys)
        .filter_map(|(&x, y)| y.filter(|v| v.is_finite()).map(|y| (x, y)))
        .collect()
}

fn band_series(label: &str, xs: &[f64], lower: &[Option<f64>], upper: &[Option<f64>]) -> BandSeries {
    let points = xs
        .iter()
        .zip(lower.iter().zip(upper))
        .filter_map(|(&x, (lo, hi))| Some((x, (*lo)?, (*hi)?)))
        .collect();
    BandSeries {
        label: label.to_string(),
        points,
    }
}
