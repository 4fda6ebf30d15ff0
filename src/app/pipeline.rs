//! Shared session state used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! resolve root -> scan sites -> build catalogs -> load tables through the cache
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::catalog::{Portfolio, open_portfolio};
use crate::domain::DashboardConfig;
use crate::error::AppError;
use crate::io::DataLoader;

/// Scanned portfolio plus the loader that serves its tables.
pub struct Session {
    pub config: DashboardConfig,
    pub portfolio: Portfolio,
    pub loader: DataLoader,
}

impl Session {
    /// Resolve and scan the configured root.
    ///
    /// An unusable root is fatal here (exit code 2); unusable site folders are
    /// only reported as warnings on the portfolio.
    pub fn open(config: DashboardConfig) -> Result<Self, AppError> {
        let portfolio = open_portfolio(&config.root)?;
        info!(
            root = %portfolio.root.path().display(),
            sites = portfolio.sites.len(),
            skipped = portfolio.warnings.len(),
            "portfolio scanned"
        );
        let loader = DataLoader::from_config(&config);
        Ok(Self {
            config,
            portfolio,
            loader,
        })
    }

    /// Re-scan the root and drop every cached table; returns the site count.
    pub fn rescan(&mut self) -> Result<usize, AppError> {
        let portfolio = open_portfolio(self.portfolio.root.path())?;
        self.portfolio = portfolio;
        self.loader.clear_cache();
        info!(sites = self.portfolio.sites.len(), "portfolio rescanned");
        Ok(self.portfolio.sites.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescan_picks_up_new_sites_and_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let gen_dir = dir.path().join("Alpha/Generation");
        std::fs::create_dir_all(&gen_dir).unwrap();
        std::fs::write(gen_dir.join("Alpha_generation_monthly_stats.csv"), "month,mean\n1,5\n").unwrap();

        let config = DashboardConfig {
            root: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };
        let mut session = Session::open(config).unwrap();
        assert_eq!(session.portfolio.sites.len(), 1);

        let file = session.portfolio.sites[0].files(crate::domain::MetricCategory::Generation)[0].clone();
        session.loader.load(&file).unwrap();
        assert_eq!(session.loader.cached_tables(), 1);

        let rev_dir = dir.path().join("Bravo/Revenue");
        std::fs::create_dir_all(&rev_dir).unwrap();
        std::fs::write(rev_dir.join("Bravo_revenue_monthly_stats.csv"), "month,mean\n1,5\n").unwrap();

        assert_eq!(session.rescan().unwrap(), 2);
        assert_eq!(session.loader.cached_tables(), 0);
    }

    #[test]
    fn missing_root_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            root: dir.path().join("nope"),
            ..DashboardConfig::default()
        };
        let err = Session::open(config).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }
}
