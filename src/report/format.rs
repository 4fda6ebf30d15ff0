//! Formatted terminal output: site lists, catalogs and summary tables.
//!
//! We keep formatting code in one place so:
//! - the catalog and stats code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::catalog::Portfolio;
use crate::chart::{ChartOutcome, ChartSpec};
use crate::domain::{MetricCategory, SiteCatalog};
use crate::stats::YearSummary;

/// Ordered site list with display names and per-metric file counts.
pub fn format_site_list(portfolio: &Portfolio) -> String {
    let mut out = String::new();
    out.push_str(&format!("Portfolio: {}\n", portfolio.root.path().display()));
    out.push_str(&format!("Sites: {}\n\n", portfolio.sites.len()));

    out.push_str(&header(&[("#", 4), ("site", 28), ("display name", 24), ("gen", 5), ("price", 5), ("da", 5), ("revenue", 7)]));
    for (idx, site) in portfolio.sites.iter().enumerate() {
        let counts: Vec<String> = MetricCategory::ALL
            .iter()
            .map(|m| site.files(*m).len().to_string())
            .collect();
        out.push_str(
            format!(
                "{:<4} {:<28} {:<24} {:>5} {:>5} {:>5} {:>7}\n",
                idx + 1,
                truncate(&site.site.folder_name, 28),
                truncate(&site.site.display_name, 24),
                counts[0],
                counts[1],
                counts[2],
                counts[3],
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if !portfolio.warnings.is_empty() {
        out.push_str("\nSkipped folders:\n");
        for w in &portfolio.warnings {
            out.push_str(&format!("- {}: {}\n", w.folder_name, w.reason));
        }
    }
    out
}

/// Explorer-style listing of one site's files.
pub fn format_catalog(site: &SiteCatalog) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ({}) ===\n", site.site.display_name, site.site.folder_name));

    for (metric, files) in &site.metrics {
        out.push_str(&format!("\n{} [{}]\n", metric.display_name(), metric.folder_name()));
        out.push_str(&header(&[("file", 52), ("resolution", 10), ("kind", 10), ("compressed", 10)]));
        for f in files {
            out.push_str(
                format!(
                    "{:<52} {:<10} {:<10} {:<10}\n",
                    truncate(&f.file_name, 52),
                    f.resolution.label(),
                    f.kind.label(),
                    if f.compressed { "yes" } else { "" },
                )
                .trim_end(),
            );
            out.push('\n');
        }
    }
    out
}

/// Per-year distribution table.
pub fn format_year_summary(title: &str, rows: &[YearSummary]) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&header(&[("year", 6), ("n", 6), ("mean", 16), ("std", 16), ("min", 16), ("max", 16)]));
    for r in rows {
        let s = &r.summary;
        out.push_str(
            format!(
                "{:<6} {:>6} {:>16} {:>16} {:>16} {:>16}\n",
                r.year,
                s.count,
                fmt_opt(s.mean),
                fmt_opt(s.std_dev),
                fmt_opt(s.min),
                fmt_opt(s.max),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Title, axis labels and notes printed around a plotted chart.
pub fn format_chart_notes(chart: &ChartSpec) -> String {
    let mut out = String::new();
    if !chart.y_label.is_empty() {
        out.push_str(&format!("y: {}", chart.y_label));
        if !chart.x_label.is_empty() {
            out.push_str(&format!(" | x: {}", chart.x_label));
        }
        out.push('\n');
    }
    for s in &chart.series {
        out.push_str(&format!("- {} ({} points)\n", s.label, s.points.len()));
    }
    if let Some(band) = &chart.band {
        out.push_str(&format!("- {} (shaded)\n", band.label));
    }
    for note in &chart.notes {
        out.push_str(&format!("  {note}\n"));
    }
    out
}

/// One line per chart outcome that is not ready.
pub fn format_outcome_status<T>(label: &str, outcome: &ChartOutcome<T>) -> Option<String> {
    outcome.status_message().map(|msg| format!("{label}: {msg}"))
}

/// `1234567.8` -> `1,234,568` (with `decimals = 0`).
pub fn fmt_amount(v: f64, decimals: usize) -> String {
    if !v.is_finite() {
        return "-".to_string();
    }
    let raw = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (raw, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && raw_is_nonzero(&grouped, frac_part.as_deref()) { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Dollar amount with thousands separators: `-$1,234.50`.
pub fn fmt_money(v: f64, decimals: usize) -> String {
    let amount = fmt_amount(v, decimals);
    match amount.strip_prefix('-') {
        Some(rest) if rest.is_empty() => amount,
        Some(rest) => format!("-${rest}"),
        None => format!("${amount}"),
    }
}

fn raw_is_nonzero(int_part: &str, frac: Option<&str>) -> bool {
    int_part.chars().chain(frac.unwrap_or("").chars()).any(|c| c.is_ascii_digit() && c != '0')
}

pub(crate) fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => fmt_amount(v, 2),
        _ => "-".to_string(),
    }
}

/// Column names over a dashed rule, left-aligned to the given widths.
fn header(columns: &[(&str, usize)]) -> String {
    let mut names = String::new();
    let mut rule = String::new();
    for &(col, w) in columns {
        names.push_str(&format!("{col:<w$} "));
        rule.push_str(&format!("{:-<w$} ", ""));
    }
    format!("{}\n{}\n", names.trim_end(), rule.trim_end())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
