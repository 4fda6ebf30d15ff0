//! Per-site metric catalog.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::catalog::classify::classify_file_name;
use crate::domain::{DataFile, MetricCategory, Site, SiteCatalog};

/// Build the catalog for one site.
///
/// A category is present only when its folder exists and holds at least one
/// regular, non-hidden file. Unreadable folders are treated as absent.
pub fn build_site_catalog(site: &Site) -> SiteCatalog {
    let mut metrics = BTreeMap::new();

    for metric in MetricCategory::ALL {
        let folder = site.path.join(metric.folder_name());
        if !folder.is_dir() {
            continue;
        }

        let files = list_metric_files(&folder, metric);
        if files.is_empty() {
            debug!(site = %site.folder_name, metric = metric.folder_name(), "metric folder has no files");
            continue;
        }
        metrics.insert(metric, files);
    }

    SiteCatalog {
        site: site.clone(),
        metrics,
    }
}

fn list_metric_files(folder: &Path, metric: MetricCategory) -> Vec<DataFile> {
    let mut paths = list_files(folder);
    paths.sort_by(|a, b| file_name_of(a).cmp(&file_name_of(b)));

    paths
        .into_iter()
        .map(|path| {
            let file_name = file_name_of(&path);
            let class = classify_file_name(&file_name);
            DataFile {
                path,
                file_name,
                metric,
                resolution: class.resolution,
                kind: class.kind,
                compressed: class.compressed,
            }
        })
        .collect()
}

fn list_files(folder: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(folder) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = match fs::metadata(&path) {
            Ok(meta) => meta.is_file(),
            Err(_) => continue,
        };
        if is_file && !is_hidden(&path) {
            out.push(path);
        }
    }
    out
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentKind, Resolution};

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "month,2025\n1,10\n").unwrap();
    }

    #[test]
    fn lists_present_categories_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let site_dir = dir.path().join("Acme");
        touch(&site_dir.join("Price/Acme_price_monthly_stats.csv"));
        touch(&site_dir.join("Price/Acme_price_hourly_timeseries_compressed.csv"));
        touch(&site_dir.join("Revenue/Acme_notes.csv"));
        fs::create_dir_all(site_dir.join("Generation")).unwrap();

        let catalog = build_site_catalog(&Site::new("Acme", site_dir));

        assert!(!catalog.has_metric(MetricCategory::Generation));
        assert!(!catalog.has_metric(MetricCategory::PriceDa));
        let price = catalog.files(MetricCategory::Price);
        assert_eq!(price.len(), 2);
        assert_eq!(price[0].file_name, "Acme_price_hourly_timeseries_compressed.csv");
        assert_eq!(price[0].resolution, Resolution::Hourly);
        assert_eq!(price[1].kind, ContentKind::Stats);

        let revenue = catalog.files(MetricCategory::Revenue);
        assert_eq!(revenue.len(), 1);
        assert!(!revenue[0].is_chartable());
    }

    #[test]
    fn hidden_files_and_subfolders_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let site_dir = dir.path().join("Acme");
        touch(&site_dir.join("Generation/.DS_Store"));
        touch(&site_dir.join("Generation/archive/old_monthly_stats.csv"));

        let catalog = build_site_catalog(&Site::new("Acme", site_dir));
        assert!(catalog.metrics.is_empty());
    }

    #[test]
    fn find_chart_source_prefers_timeseries() {
        let dir = tempfile::tempdir().unwrap();
        let site_dir = dir.path().join("Acme");
        touch(&site_dir.join("Generation/Acme_generation_monthly_stats.csv"));
        touch(&site_dir.join("Generation/Acme_generation_monthly_timeseries.csv"));

        let catalog = build_site_catalog(&Site::new("Acme", site_dir));
        let source = catalog
            .find_chart_source(MetricCategory::Generation, Resolution::Monthly)
            .unwrap();
        assert_eq!(source.kind, ContentKind::Timeseries);
        assert!(catalog.find_chart_source(MetricCategory::Generation, Resolution::Daily).is_none());
    }
}
