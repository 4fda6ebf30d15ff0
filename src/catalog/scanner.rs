//! Site discovery.
//!
//! The scanner walks the immediate subdirectories of the portfolio root and
//! keeps those whose catalog is non-empty. A site folder that cannot be used is
//! never an error for the caller: it is left out and reported as a warning.

use std::fs;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::builder::{build_site_catalog, is_hidden};
use crate::catalog::resolver::PortfolioRoot;
use crate::domain::{MetricCategory, Site, SiteCatalog};
use crate::error::ConfigurationError;

/// Why a candidate site folder was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptySiteWarning {
    pub folder_name: String,
    pub reason: String,
}

/// Scan output: ordered sites plus excluded candidates.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub root: PortfolioRoot,
    /// Sorted by folder name.
    pub sites: Vec<SiteCatalog>,
    pub warnings: Vec<EmptySiteWarning>,
}

impl Portfolio {
    pub fn site(&self, folder_name: &str) -> Option<&SiteCatalog> {
        self.sites.iter().find(|s| s.site.folder_name == folder_name)
    }

    /// Look a site up by folder name, then by display name (case-insensitive).
    pub fn find_site(&self, name: &str) -> Option<&SiteCatalog> {
        let name = name.trim();
        self.site(name).or_else(|| {
            self.sites.iter().find(|s| {
                s.site.folder_name.eq_ignore_ascii_case(name) || s.site.display_name.eq_ignore_ascii_case(name)
            })
        })
    }

    pub fn site_names(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.site.folder_name.as_str()).collect()
    }
}

/// Scan the root and build every site's catalog.
pub fn scan_portfolio(root: &PortfolioRoot) -> Result<Portfolio, ConfigurationError> {
    let entries = fs::read_dir(root.path()).map_err(|e| ConfigurationError::RootUnreadable {
        path: root.path().to_path_buf(),
        message: e.to_string(),
    })?;

    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if is_hidden(&path) || !path.is_dir() {
            continue;
        }
        let folder_name = entry.file_name().to_string_lossy().into_owned();
        candidates.push(Site::new(folder_name, path));
    }
    candidates.sort_by(|a, b| a.folder_name.cmp(&b.folder_name));

    let mut sites = Vec::new();
    let mut warnings = Vec::new();

    for site in candidates {
        let has_metric_folder = MetricCategory::ALL
            .iter()
            .any(|m| site.path.join(m.folder_name()).is_dir());
        if !has_metric_folder {
            warnings.push(EmptySiteWarning {
                folder_name: site.folder_name.clone(),
                reason: "no Generation, Price, Price_da or Revenue folder".to_string(),
            });
            continue;
        }

        let catalog = build_site_catalog(&site);
        if catalog.metrics.is_empty() {
            warnings.push(EmptySiteWarning {
                folder_name: site.folder_name.clone(),
                reason: "metric folders contain no files".to_string(),
            });
            continue;
        }
        sites.push(catalog);
    }

    for w in &warnings {
        warn!(site = %w.folder_name, reason = %w.reason, "site excluded from catalog");
    }
    info!(
        root = %root.path().display(),
        sites = sites.len(),
        excluded = warnings.len(),
        "portfolio scanned"
    );

    Ok(Portfolio {
        root: root.clone(),
        sites,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "month,2025\n1,10\n").unwrap();
    }

    fn scan(dir: &Path) -> Portfolio {
        let root = PortfolioRoot::resolve(dir).unwrap();
        scan_portfolio(&root).unwrap()
    }

    #[test]
    fn includes_only_sites_with_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SiteA/Generation/SiteA_generation_monthly_stats.csv"));
        fs::create_dir_all(dir.path().join("SiteB")).unwrap();

        let portfolio = scan(dir.path());
        assert_eq!(portfolio.site_names(), vec!["SiteA"]);
        assert_eq!(portfolio.warnings.len(), 1);
        assert_eq!(portfolio.warnings[0].folder_name, "SiteB");
    }

    #[test]
    fn empty_category_does_not_exclude_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("SiteA/Generation")).unwrap();
        touch(&dir.path().join("SiteA/Price/SiteA_price_hourly_stats.csv"));
        fs::create_dir_all(dir.path().join("SiteC/Revenue")).unwrap();

        let portfolio = scan(dir.path());
        assert_eq!(portfolio.site_names(), vec!["SiteA"]);
        let site = portfolio.site("SiteA").unwrap();
        assert!(!site.has_metric(MetricCategory::Generation));
        assert!(site.has_metric(MetricCategory::Price));
    }

    #[test]
    fn ordering_is_lexicographic_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Zeta", "Alpha", "Mid_Site"] {
            touch(&dir.path().join(format!("{name}/Revenue/{name}_revenue_monthly_stats.csv")));
        }
        touch(&dir.path().join("loose_file.csv"));
        fs::create_dir_all(dir.path().join(".git/Price")).unwrap();

        let first = scan(dir.path());
        let second = scan(dir.path());
        assert_eq!(first.site_names(), vec!["Alpha", "Mid_Site", "Zeta"]);
        assert_eq!(first.sites, second.sites);
    }

    #[test]
    fn unrelated_folders_are_excluded_without_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Docs/readme.csv"));

        let portfolio = scan(dir.path());
        assert!(portfolio.sites.is_empty());
        assert_eq!(portfolio.warnings.len(), 1);
    }

    #[test]
    fn find_site_accepts_display_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("wind_ridge_LLC/Price/x_price_daily_stats.csv"));

        let portfolio = scan(dir.path());
        assert!(portfolio.find_site("Wind Ridge").is_some());
        assert!(portfolio.find_site("WIND_RIDGE_llc").is_some());
        assert!(portfolio.find_site("Other").is_none());
    }
}
