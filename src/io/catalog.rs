//! Catalog JSON listing.
//!
//! The listing is the explorer's view of the portfolio in a portable form:
//! - the resolved root
//! - each site with its classified files per metric folder
//! - folders that were skipped and why

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::catalog::{EmptySiteWarning, Portfolio};
use crate::domain::SiteCatalog;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct CatalogListing<'a> {
    pub tool: &'static str,
    pub root: &'a Path,
    pub sites: Vec<&'a SiteCatalog>,
    pub warnings: &'a [EmptySiteWarning],
}

impl<'a> CatalogListing<'a> {
    /// Whole portfolio, or a single site when `site` is given.
    pub fn new(portfolio: &'a Portfolio, site: Option<&'a SiteCatalog>) -> Self {
        Self {
            tool: "pdash",
            root: portfolio.root.path(),
            sites: match site {
                Some(site) => vec![site],
                None => portfolio.sites.iter().collect(),
            },
            warnings: &portfolio.warnings,
        }
    }
}

/// Write the listing as pretty-printed JSON.
pub fn write_catalog_json<W: Write>(writer: W, listing: &CatalogListing<'_>) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, listing)
        .map_err(|e| AppError::new(4, format!("Failed to write catalog JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::open_portfolio;

    #[test]
    fn listing_serializes_metric_folders_and_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let gen_dir = dir.path().join("SiteA").join("Generation");
        std::fs::create_dir_all(&gen_dir).unwrap();
        std::fs::write(gen_dir.join("SiteA_generation_monthly_stats.csv"), "month,mean\n1,2\n").unwrap();
        std::fs::create_dir_all(dir.path().join("SiteB")).unwrap();

        let portfolio = open_portfolio(dir.path()).unwrap();
        let listing = CatalogListing::new(&portfolio, None);
        let mut buf = Vec::new();
        write_catalog_json(&mut buf, &listing).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["tool"], "pdash");
        let site = &value["sites"][0];
        assert_eq!(site["site"]["folder_name"], "SiteA");
        let file = &site["metrics"]["generation"][0];
        assert_eq!(file["file_name"], "SiteA_generation_monthly_stats.csv");
        assert_eq!(file["resolution"], "monthly");
        assert_eq!(file["kind"], "stats");
        assert_eq!(value["warnings"][0]["folder_name"], "SiteB");
    }
}
