//! Site reports and terminal formatting.
//!
//! `write_site_report` produces a markdown snapshot of one site: its catalog,
//! per-year summaries of the monthly data, duration-curve percentiles and the
//! status of every chart view.

pub mod format;

pub use format::*;

use std::fs::{File, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::chart::{build, combined_charts, duration_source};
use crate::domain::{ChartView, MetricCategory, Resolution, SiteCatalog, month_name};
use crate::error::AppError;
use crate::io::loader::DataLoader;
use crate::stats::{DURATION_PERCENTILES, month_duration_curve, summarize_by_year};

/// Month used for the duration/distribution rows of the view status table.
const STATUS_MONTH: u32 = 1;

/// Write a markdown report for `site` under `dir`; returns the report path.
pub fn write_site_report(loader: &mut DataLoader, site: &SiteCatalog, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create report dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_report_{ts}.md", site.site.folder_name));

    let file = File::create(&path).map_err(|e| AppError::new(4, format!("Failed to create report file: {e}")))?;
    let mut out = BufWriter::new(file);
    render_site_report(&mut out, loader, site)
        .and_then(|()| out.flush())
        .map_err(|e| AppError::new(4, format!("Failed to write report: {e}")))?;

    Ok(path)
}

/// Render the markdown report body.
pub fn render_site_report<W: Write>(out: &mut W, loader: &mut DataLoader, site: &SiteCatalog) -> io::Result<()> {
    writeln!(out, "# {} site report", site.site.display_name)?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- folder: {}", site.site.folder_name)?;
    writeln!(out, "- files: {}", site.file_count())?;

    writeln!(out, "\n## Catalog")?;
    writeln!(out, "| metric | file | resolution | kind | compressed |")?;
    writeln!(out, "| - | - | - | - | - |")?;
    for (metric, files) in &site.metrics {
        for f in files {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                metric.folder_name(),
                f.file_name,
                f.resolution.label(),
                f.kind.label(),
                if f.compressed { "yes" } else { "no" }
            )?;
        }
    }

    writeln!(out, "\n## Per-year summary (monthly data)")?;
    for metric in MetricCategory::ALL {
        let Some(file) = site.find_chart_source(metric, Resolution::Monthly) else {
            continue;
        };
        writeln!(out, "\n### {} ({})", metric.display_name(), file.file_name)?;
        let rows = match loader.load(file) {
            Ok(table) => summarize_by_year(&table, None).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match rows {
            Ok(rows) => {
                writeln!(out, "| year | n | mean | std | min | max |")?;
                writeln!(out, "| - | - | - | - | - | - |")?;
                for r in rows {
                    let s = r.summary;
                    writeln!(
                        out,
                        "| {} | {} | {} | {} | {} | {} |",
                        r.year,
                        s.count,
                        format::fmt_opt(s.mean),
                        format::fmt_opt(s.std_dev),
                        format::fmt_opt(s.min),
                        format::fmt_opt(s.max)
                    )?;
                }
            }
            Err(reason) => writeln!(out, "Summary unavailable: {reason}")?,
        }
    }

    if let Some(file) = duration_source(site) {
        writeln!(out, "\n## Price duration percentiles ({})", file.file_name)?;
        match loader.load(file) {
            Ok(table) => {
                let header: Vec<String> = DURATION_PERCENTILES.iter().map(|p| format!("P{p}")).collect();
                writeln!(out, "| month | mean | {} |", header.join(" | "))?;
                writeln!(out, "|{}", " - |".repeat(header.len() + 2))?;
                for month in 1..=12 {
                    let Ok(curve) = month_duration_curve(&table, month) else {
                        continue;
                    };
                    let marks: Vec<String> = curve.marks.iter().map(|m| fmt_money(m.value, 2)).collect();
                    writeln!(
                        out,
                        "| {} | {} | {} |",
                        month_name(month).unwrap_or("?"),
                        fmt_money(curve.mean, 2),
                        marks.join(" | ")
                    )?;
                }
            }
            Err(e) => writeln!(out, "Duration curves unavailable: {e}")?,
        }
    }

    writeln!(out, "\n## Chart views")?;
    writeln!(out, "| metric | view | status |")?;
    writeln!(out, "| - | - | - |")?;
    for metric in MetricCategory::ALL {
        for view in [ChartView::Monthly, ChartView::Daily, ChartView::Hourly, ChartView::Distribution] {
            let outcome = build(loader, site, metric, view, STATUS_MONTH);
            let status = outcome.status_message().unwrap_or_else(|| "ok".to_string());
            writeln!(out, "| {} | {} | {} |", metric.display_name(), view.display_name(), status)?;
        }
    }
    let duration = build(loader, site, MetricCategory::Price, ChartView::Duration, STATUS_MONTH);
    writeln!(
        out,
        "| {} | {} | {} |",
        MetricCategory::Price.display_name(),
        ChartView::Duration.display_name(),
        duration.status_message().unwrap_or_else(|| "ok".to_string())
    )?;
    let combined = combined_charts(loader, site);
    writeln!(
        out,
        "| all | Combined | {} |",
        combined.status_message().unwrap_or_else(|| "ok".to_string())
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::open_portfolio;

    #[test]
    fn report_covers_catalog_summary_and_views() {
        let dir = tempfile::tempdir().unwrap();
        let gen_dir = dir.path().join("portfolio/Acme/Generation");
        std::fs::create_dir_all(&gen_dir).unwrap();
        std::fs::write(
            gen_dir.join("Acme_generation_monthly_stats.csv"),
            "year,month,mean,p5,p95\n2025,1,10,8,12\n2025,2,20,18,22\n2026,1,30,28,32\n",
        )
        .unwrap();

        let portfolio = open_portfolio(&dir.path().join("portfolio")).unwrap();
        let site = portfolio.site("Acme").unwrap();
        let mut loader = DataLoader::uncached();

        let report_dir = dir.path().join("reports");
        let path = write_site_report(&mut loader, site, &report_dir).unwrap();
        let text = std::fs::read_to_string(path).unwrap();

        assert!(text.starts_with("# Acme site report"));
        assert!(text.contains("| Generation | Acme_generation_monthly_stats.csv | monthly | stats | no |"));
        assert!(text.contains("| 2025 | 2 | 15.00 | 7.07 | 10.00 | 20.00 |"));
        assert!(text.contains("| 2026 | 1 | 30.00 | - | 30.00 | 30.00 |"));
        assert!(text.contains("| Generation | Monthly | ok |"));
        assert!(text.contains("| Revenue | Monthly | No data available for this view |"));
        assert!(!text.contains("Price duration percentiles"));
    }
}
