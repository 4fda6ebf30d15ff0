//! Command-line parsing for the portfolio dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the catalog/aggregation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ChartView, DEFAULT_CACHE_TTL_SECS, DEFAULT_PORTFOLIO_ROOT, MetricCategory};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pdash", version, about = "Renewable energy portfolio dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List sites with display names and per-metric file counts.
    Sites(CommonArgs),
    /// Show the file explorer listing for the portfolio or one site.
    Catalog(CatalogArgs),
    /// Render one chart view in the terminal and optionally export its series.
    Chart(ChartArgs),
    /// Per-year distribution summary of a metric's monthly data.
    Summary(SummaryArgs),
    /// Stream a raw data file unmodified.
    Download(DownloadArgs),
    /// Write a markdown report for a site.
    Report(ReportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same catalog and chart builders as the other subcommands,
    /// but renders results in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

impl Command {
    /// Shared flags of whichever subcommand was given.
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Sites(args) => args,
            Command::Catalog(args) => &args.common,
            Command::Chart(args) => &args.common,
            Command::Summary(args) => &args.common,
            Command::Download(args) => &args.common,
            Command::Report(args) => &args.common,
            Command::Tui(args) => &args.common,
        }
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Portfolio root directory (one sub-folder per site).
    #[arg(short = 'r', long, env = "PDASH_ROOT", default_value = DEFAULT_PORTFOLIO_ROOT)]
    pub root: PathBuf,

    /// Re-read files on every request instead of caching parsed tables.
    #[arg(long)]
    pub no_cache: bool,

    /// Upper bound (seconds) on how long a cached table is served; 0 keeps
    /// entries until the file changes.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Log filter (e.g. `info`, `portfolio_dash=debug`).
    #[arg(long, env = "PDASH_LOG")]
    pub log: Option<String>,

    /// Write logs to this file instead of stderr (always used in TUI mode).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Limit the listing to one site (folder or display name).
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Site (folder or display name); prompts when omitted.
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// Metric folder to chart.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricCategory::Generation)]
    pub metric: MetricCategory,

    /// Chart view.
    #[arg(short = 'v', long, value_enum, default_value_t = ChartView::Monthly)]
    pub view: ChartView,

    /// Month (1-12) for duration and distribution views.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: u32,

    /// Export the plotted series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Site (folder or display name); prompts when omitted.
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// Metric folder to summarize.
    #[arg(short = 'm', long, value_enum, default_value_t = MetricCategory::Generation)]
    pub metric: MetricCategory,

    /// Value column (default: `mean` or each scenario-year column).
    #[arg(long)]
    pub column: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Site (folder or display name).
    #[arg(short = 's', long)]
    pub site: String,

    /// Metric folder holding the file.
    #[arg(short = 'm', long, value_enum)]
    pub metric: MetricCategory,

    /// File name inside the metric folder.
    #[arg(short = 'f', long)]
    pub file: String,

    /// Destination path (stdout when omitted).
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Site (folder or display name); prompts when omitted.
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// Directory for report files.
    #[arg(long, default_value = "reports")]
    pub out_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Site selected on start.
    #[arg(short = 's', long)]
    pub site: Option<String>,

    /// Where the explorer saves file copies.
    #[arg(long, default_value = "downloads")]
    pub download_dir: PathBuf,
}
