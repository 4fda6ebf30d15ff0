//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built by the scanner and kept in memory for the process lifetime
//! - exported to JSON for the explorer listing
//! - passed to the terminal front-ends without conversion

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One of the four recognized metric folders under a site.
///
/// Ordering follows the folder list below and is used for display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Generation,
    Price,
    /// Day-ahead price.
    #[value(name = "price-da", alias = "price_da")]
    PriceDa,
    Revenue,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 4] = [
        MetricCategory::Generation,
        MetricCategory::Price,
        MetricCategory::PriceDa,
        MetricCategory::Revenue,
    ];

    /// Exact folder name on disk.
    pub fn folder_name(self) -> &'static str {
        match self {
            MetricCategory::Generation => "Generation",
            MetricCategory::Price => "Price",
            MetricCategory::PriceDa => "Price_da",
            MetricCategory::Revenue => "Revenue",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MetricCategory::Generation => "Generation",
            MetricCategory::Price => "Real-Time Price",
            MetricCategory::PriceDa => "Day-Ahead Price",
            MetricCategory::Revenue => "Revenue",
        }
    }

    /// Y-axis label for a chart of this metric at a given resolution.
    pub fn unit_label(self, resolution: Resolution) -> &'static str {
        match (self, resolution) {
            (MetricCategory::Generation, Resolution::Daily | Resolution::Monthly) => "Generation (MWh)",
            (MetricCategory::Generation, _) => "Generation (MW)",
            (MetricCategory::Price | MetricCategory::PriceDa, _) => "Price ($/MWh)",
            (MetricCategory::Revenue, _) => "Revenue ($)",
        }
    }

    pub fn from_folder_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.folder_name() == name)
    }
}

/// Temporal granularity inferred from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Hourly,
    Daily,
    Monthly,
    Unknown,
}

impl Resolution {
    pub fn label(self) -> &'static str {
        match self {
            Resolution::Hourly => "hourly",
            Resolution::Daily => "daily",
            Resolution::Monthly => "monthly",
            Resolution::Unknown => "unknown",
        }
    }
}

/// Content kind inferred from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// One column per scenario year (`2025`, `2026`, ...).
    Timeseries,
    /// Precomputed statistics (`mean`, `p5`, `p95`, ...).
    Stats,
    /// Anything else. Listed in the explorer, never charted automatically.
    Other,
}

impl ContentKind {
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Timeseries => "timeseries",
            ContentKind::Stats => "stats",
            ContentKind::Other => "other",
        }
    }
}

/// A site folder under the portfolio root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Raw folder name (identity).
    pub folder_name: String,
    /// Human-readable name for selection lists.
    pub display_name: String,
    /// Absolute path of the site folder.
    pub path: PathBuf,
}

impl Site {
    pub fn new(folder_name: impl Into<String>, path: PathBuf) -> Self {
        let folder_name = folder_name.into();
        let display_name = clean_site_name(&folder_name);
        Self {
            folder_name,
            display_name,
            path,
        }
    }
}

/// Turn a folder name like `Sunny_Acres_Power_LLC` into `Sunny Acres`.
pub fn clean_site_name(folder_name: &str) -> String {
    let stripped = folder_name.replace("_LLC", "").replace("_Power", "");
    stripped
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_start = true;
    for ch in word.chars() {
        if at_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_start = !ch.is_alphanumeric();
    }
    out
}

/// A classified file inside a metric folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    pub path: PathBuf,
    pub file_name: String,
    pub metric: MetricCategory,
    pub resolution: Resolution,
    pub kind: ContentKind,
    /// The name carried a `compressed` token.
    pub compressed: bool,
}

impl DataFile {
    /// Whether the file takes part in automatic chart generation.
    pub fn is_chartable(&self) -> bool {
        self.kind != ContentKind::Other && self.resolution != Resolution::Unknown
    }
}

/// Per-site catalog: metric category -> classified files (file-name order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteCatalog {
    pub site: Site,
    pub metrics: BTreeMap<MetricCategory, Vec<DataFile>>,
}

impl SiteCatalog {
    pub fn has_metric(&self, metric: MetricCategory) -> bool {
        self.metrics.get(&metric).is_some_and(|files| !files.is_empty())
    }

    pub fn files(&self, metric: MetricCategory) -> &[DataFile] {
        self.metrics.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First file (in file-name order) matching the requested classification.
    pub fn find(&self, metric: MetricCategory, resolution: Resolution, kind: ContentKind) -> Option<&DataFile> {
        self.files(metric)
            .iter()
            .find(|f| f.resolution == resolution && f.kind == kind)
    }

    /// Prefer a timeseries file, fall back to a stats file.
    pub fn find_chart_source(&self, metric: MetricCategory, resolution: Resolution) -> Option<&DataFile> {
        self.find(metric, resolution, ContentKind::Timeseries)
            .or_else(|| self.find(metric, resolution, ContentKind::Stats))
    }

    pub fn file_count(&self) -> usize {
        self.metrics.values().map(Vec::len).sum()
    }

    pub fn find_by_name(&self, metric: MetricCategory, file_name: &str) -> Option<&DataFile> {
        self.files(metric).iter().find(|f| f.file_name == file_name)
    }
}

/// Chart views offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartView {
    Monthly,
    Daily,
    Hourly,
    Duration,
    Distribution,
}

impl ChartView {
    pub fn display_name(self) -> &'static str {
        match self {
            ChartView::Monthly => "Monthly",
            ChartView::Daily => "Daily",
            ChartView::Hourly => "Hourly",
            ChartView::Duration => "Duration",
            ChartView::Distribution => "Distribution",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment (`.env`) and defaults.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub root: PathBuf,
    /// `None` disables the load cache.
    pub cache_ttl: Option<Duration>,
    pub use_cache: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Where explorer "save copy" writes files.
    pub download_dir: PathBuf,
    /// Where site reports are written.
    pub report_dir: PathBuf,
    /// Rows shown in the explorer preview.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_PORTFOLIO_ROOT),
            cache_ttl: Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
            use_cache: true,
            plot_width: 100,
            plot_height: 25,
            download_dir: PathBuf::from("downloads"),
            report_dir: PathBuf::from("reports"),
            preview_rows: 15,
        }
    }
}

pub const DEFAULT_PORTFOLIO_ROOT: &str = "Renewable Portfolio LLC";

/// One hour: the documented upper bound on how long a cached table may be served.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Full month name for `1..=12`.
pub fn month_name(month: u32) -> Option<&'static str> {
    let month = u8::try_from(month).ok()?;
    chrono::Month::try_from(month).ok().map(|m| m.name())
}

/// Three-letter month abbreviation for `1..=12`.
pub fn month_abbrev(month: u32) -> Option<&'static str> {
    month_name(month).map(|name| &name[..3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_site_name_strips_suffixes_and_title_cases() {
        assert_eq!(clean_site_name("sunny_acres_Power_LLC"), "Sunny Acres");
        assert_eq!(clean_site_name("WIND_RIDGE"), "Wind Ridge");
        assert_eq!(clean_site_name("Acme"), "Acme");
    }

    #[test]
    fn metric_folder_names_round_trip() {
        for metric in MetricCategory::ALL {
            assert_eq!(MetricCategory::from_folder_name(metric.folder_name()), Some(metric));
        }
        assert_eq!(MetricCategory::from_folder_name("price_da"), None);
    }

    #[test]
    fn month_name_bounds() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(month_abbrev(9), Some("Sep"));
    }
}
