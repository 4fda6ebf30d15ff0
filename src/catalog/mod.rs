//! Portfolio discovery.
//!
//! - root validation (`resolver`)
//! - site scanning (`scanner`)
//! - per-site catalogs (`builder`)
//! - file-name classification rules (`classify`)

pub mod builder;
pub mod classify;
pub mod resolver;
pub mod scanner;

pub use builder::build_site_catalog;
pub use classify::{Classification, classify_file_name};
pub use resolver::PortfolioRoot;
pub use scanner::{EmptySiteWarning, Portfolio, scan_portfolio};

use crate::error::ConfigurationError;

/// Resolve the root and scan it in one step.
pub fn open_portfolio(path: &std::path::Path) -> Result<Portfolio, ConfigurationError> {
    let root = PortfolioRoot::resolve(path)?;
    scan_portfolio(&root)
}
