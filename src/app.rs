//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - scans the portfolio
//! - prints site lists, catalogs, charts and summaries
//! - writes optional exports, downloads and reports

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::chart::{ChartOutcome, build};
use crate::cli::picker::{resolve_site, select_site};
use crate::cli::{CatalogArgs, ChartArgs, Command, CommonArgs, DownloadArgs, ReportArgs, SummaryArgs, TuiArgs};
use crate::domain::{DashboardConfig, Resolution};
use crate::error::AppError;
use crate::io::{CatalogListing, copy_raw, ensure_outside_dataset, write_catalog_json, write_chart_csv};
use crate::plot::render_chart;
use crate::report::{format_catalog, format_chart_notes, format_outcome_status, format_site_list, format_year_summary};
use crate::stats::{StatsError, summarize_by_year};

pub mod logging;
pub mod pipeline;

use pipeline::Session;

/// Entry point for the `pdash` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may supply PDASH_ROOT / PDASH_LOG; a missing file is fine.
    dotenvy::dotenv().ok();

    // We want `pdash` and `pdash --root X` to behave like `pdash tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let common = cli.command.common();
    let is_tui = matches!(cli.command, Command::Tui(_));
    logging::init_logging(
        common.log.as_deref(),
        logging::log_target(is_tui, common.log_file.as_deref()),
    )?;

    match cli.command {
        Command::Sites(args) => handle_sites(&args),
        Command::Catalog(args) => handle_catalog(&args),
        Command::Chart(args) => handle_chart(&args),
        Command::Summary(args) => handle_summary(&args),
        Command::Download(args) => handle_download(&args),
        Command::Report(args) => handle_report(&args),
        Command::Tui(args) => handle_tui(&args),
    }
}

fn handle_sites(args: &CommonArgs) -> Result<(), AppError> {
    let session = Session::open(dashboard_config_from_args(args))?;
    print!("{}", format_site_list(&session.portfolio));
    Ok(())
}

fn handle_catalog(args: &CatalogArgs) -> Result<(), AppError> {
    let session = Session::open(dashboard_config_from_args(&args.common))?;
    let portfolio = &session.portfolio;
    let site = args.site.as_deref().map(|name| resolve_site(portfolio, name)).transpose()?;

    if args.json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_catalog_json(&mut out, &CatalogListing::new(portfolio, site))?;
        writeln!(out).map_err(|e| AppError::new(4, format!("Failed to write stdout: {e}")))?;
        return Ok(());
    }

    match site {
        Some(site) => print!("{}", format_catalog(site)),
        None => {
            for site in &portfolio.sites {
                println!("{}", format_catalog(site));
            }
        }
    }
    Ok(())
}

fn handle_chart(args: &ChartArgs) -> Result<(), AppError> {
    let mut config = dashboard_config_from_args(&args.common);
    config.plot_width = args.width;
    config.plot_height = args.height;

    let mut session = Session::open(config)?;
    let site = select_site(&session.portfolio, args.site.as_deref())?;
    let outcome = build(&mut session.loader, site, args.metric, args.view, args.month);

    let chart = ready_or_error(&outcome, args.view.display_name())?;
    println!(
        "{}",
        render_chart(chart, session.config.plot_width, session.config.plot_height)
    );
    print!("{}", format_chart_notes(chart));

    if let Some(path) = &args.export {
        write_chart_csv(path, chart)?;
        info!(path = %path.display(), "chart exported");
        println!("Exported chart series to {}", path.display());
    }
    Ok(())
}

/// CLI mapping for views without a chart: missing source -> 2, unusable source -> 3.
fn ready_or_error<'a>(outcome: &'a ChartOutcome, label: &str) -> Result<&'a crate::chart::ChartSpec, AppError> {
    let message = format_outcome_status(label, outcome).unwrap_or_default();
    match outcome {
        ChartOutcome::Ready(chart) => Ok(chart),
        ChartOutcome::Missing => Err(AppError::new(2, message)),
        ChartOutcome::Unavailable(_) => Err(AppError::new(3, message)),
    }
}

fn handle_summary(args: &SummaryArgs) -> Result<(), AppError> {
    let mut session = Session::open(dashboard_config_from_args(&args.common))?;
    let site = select_site(&session.portfolio, args.site.as_deref())?;

    let file = site
        .find_chart_source(args.metric, Resolution::Monthly)
        .ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "No monthly {} data for {}.",
                    args.metric.display_name(),
                    site.site.display_name
                ),
            )
        })?;
    let table = session.loader.load(file)?;
    let rows = summarize_by_year(&table, args.column.as_deref()).map_err(|e| match e {
        StatsError::MissingColumn(_) => AppError::new(2, format!("{}: {e}", file.file_name)),
        other => AppError::new(3, format!("{}: {other}", file.file_name)),
    })?;

    let title = format!(
        "{} {} per-year summary ({})",
        site.site.display_name,
        args.metric.display_name(),
        file.file_name
    );
    print!("{}", format_year_summary(&title, &rows));
    Ok(())
}

fn handle_download(args: &DownloadArgs) -> Result<(), AppError> {
    let session = Session::open(dashboard_config_from_args(&args.common))?;
    let site = resolve_site(&session.portfolio, &args.site)?;
    let file = site.find_by_name(args.metric, &args.file).ok_or_else(|| {
        let available: Vec<&str> = site.files(args.metric).iter().map(|f| f.file_name.as_str()).collect();
        AppError::new(
            2,
            format!(
                "No file '{}' in {}/{}. Available: {}",
                args.file,
                site.site.folder_name,
                args.metric.folder_name(),
                if available.is_empty() { "-".to_string() } else { available.join(", ") }
            ),
        )
    })?;

    let bytes = match &args.out {
        Some(path) => {
            ensure_outside_dataset(path, file, session.portfolio.root.path())?;
            let dest = File::create(path)
                .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
            let mut dest = BufWriter::new(dest);
            let n = copy_raw(file, &mut dest)?;
            dest.flush()
                .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
            n
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            copy_raw(file, &mut out)?
        }
    };
    info!(file = %file.file_name, bytes, "download complete");
    Ok(())
}

fn handle_report(args: &ReportArgs) -> Result<(), AppError> {
    let mut config = dashboard_config_from_args(&args.common);
    config.report_dir = args.out_dir.clone();

    let mut session = Session::open(config)?;
    let site = select_site(&session.portfolio, args.site.as_deref())?;
    let path = crate::report::write_site_report(&mut session.loader, site, &session.config.report_dir)?;
    println!("Wrote report: {}", path.display());
    Ok(())
}

fn handle_tui(args: &TuiArgs) -> Result<(), AppError> {
    let mut config = dashboard_config_from_args(&args.common);
    config.download_dir = args.download_dir.clone();
    crate::tui::run(config, args.site.as_deref())
}

/// Translate shared flags into a dashboard configuration.
///
/// `--cache-ttl-secs 0` keeps cached tables until their file changes.
pub fn dashboard_config_from_args(args: &CommonArgs) -> DashboardConfig {
    DashboardConfig {
        root: args.root.clone(),
        cache_ttl: (args.cache_ttl_secs > 0).then(|| Duration::from_secs(args.cache_ttl_secs)),
        use_cache: !args.no_cache,
        ..DashboardConfig::default()
    }
}

/// Rewrite argv so `pdash` defaults to `pdash tui`.
///
/// Rules:
/// - `pdash`                         -> `pdash tui`
/// - `pdash --root X ...`            -> `pdash tui --root X ...`
/// - `pdash --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "sites" | "catalog" | "chart" | "summary" | "download" | "report" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn common(root: PathBuf) -> CommonArgs {
        CommonArgs {
            root,
            no_cache: false,
            cache_ttl_secs: 3600,
            log: None,
            log_file: None,
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let gen_dir = dir.path().join("Acme/Generation");
        std::fs::create_dir_all(&gen_dir).unwrap();
        std::fs::write(
            gen_dir.join("Acme_generation_monthly_stats.csv"),
            "year,month,mean\n2025,1,10\n2025,2,20\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn bare_invocation_and_leading_flags_open_the_tui() {
        assert_eq!(rewrite_args(args(&["pdash"])), args(&["pdash", "tui"]));
        assert_eq!(
            rewrite_args(args(&["pdash", "--root", "x"])),
            args(&["pdash", "tui", "--root", "x"])
        );
        assert_eq!(rewrite_args(args(&["pdash", "sites"])), args(&["pdash", "sites"]));
        assert_eq!(rewrite_args(args(&["pdash", "--help"])), args(&["pdash", "--help"]));
    }

    #[test]
    fn config_from_args_maps_cache_flags() {
        let mut a = common(PathBuf::from("root"));
        let config = dashboard_config_from_args(&a);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(3600)));
        assert!(config.use_cache);

        a.cache_ttl_secs = 0;
        a.no_cache = true;
        let config = dashboard_config_from_args(&a);
        assert_eq!(config.cache_ttl, None);
        assert!(!config.use_cache);
        assert_eq!(config.root, PathBuf::from("root"));
    }

    #[test]
    fn download_copies_bytes_and_rejects_unknown_files() {
        let dir = fixture();
        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("copy.csv");
        let mut download = DownloadArgs {
            common: common(dir.path().to_path_buf()),
            site: "Acme".to_string(),
            metric: crate::domain::MetricCategory::Generation,
            file: "Acme_generation_monthly_stats.csv".to_string(),
            out: Some(out.clone()),
        };
        handle_download(&download).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "year,month,mean\n2025,1,10\n2025,2,20\n"
        );

        download.file = "nope.csv".to_string();
        let err = handle_download(&download).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Acme_generation_monthly_stats.csv"));
    }

    #[test]
    fn download_never_overwrites_files_under_the_root() {
        let dir = fixture();
        let source = dir.path().join("Acme/Generation/Acme_generation_monthly_stats.csv");
        let mut download = DownloadArgs {
            common: common(dir.path().to_path_buf()),
            site: "Acme".to_string(),
            metric: crate::domain::MetricCategory::Generation,
            file: "Acme_generation_monthly_stats.csv".to_string(),
            out: Some(source.clone()),
        };
        let err = handle_download(&download).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            std::fs::read_to_string(&source).unwrap(),
            "year,month,mean\n2025,1,10\n2025,2,20\n"
        );

        // A new file elsewhere under the root is refused and not created.
        let sibling = dir.path().join("Acme/copy.csv");
        download.out = Some(sibling.clone());
        assert_eq!(handle_download(&download).unwrap_err().exit_code(), 4);
        assert!(!sibling.exists());
    }

    #[test]
    fn summary_reports_missing_metric_and_column_as_usage_errors() {
        let dir = fixture();
        let mut summary = SummaryArgs {
            common: common(dir.path().to_path_buf()),
            site: Some("Acme".to_string()),
            metric: crate::domain::MetricCategory::Revenue,
            column: None,
        };
        assert_eq!(handle_summary(&summary).unwrap_err().exit_code(), 2);

        summary.metric = crate::domain::MetricCategory::Generation;
        handle_summary(&summary).unwrap();

        summary.column = Some("p99".to_string());
        assert_eq!(handle_summary(&summary).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn missing_view_maps_to_exit_code_2() {
        let dir = fixture();
        let chart = ChartArgs {
            common: common(dir.path().to_path_buf()),
            site: Some("Acme".to_string()),
            metric: crate::domain::MetricCategory::Price,
            view: crate::domain::ChartView::Monthly,
            month: 1,
            export: None,
            width: 60,
            height: 15,
        };
        let err = handle_chart(&chart).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("No data available"));
    }
}
