//! Interactive site picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `pdash chart` and choose a site" UX
//!
//! Sites come from the scanned portfolio, in catalog order.

use std::io::{self, BufRead, Write};

use crate::catalog::Portfolio;
use crate::domain::SiteCatalog;
use crate::error::AppError;

/// Resolve `--site` when given, otherwise prompt on stdin/stdout.
pub fn select_site<'a>(portfolio: &'a Portfolio, site: Option<&str>) -> Result<&'a SiteCatalog, AppError> {
    match site {
        Some(name) => resolve_site(portfolio, name),
        None => {
            let stdin = io::stdin();
            prompt_for_site(portfolio, &mut stdin.lock(), &mut io::stdout())
        }
    }
}

/// Look a site up by folder or display name.
pub fn resolve_site<'a>(portfolio: &'a Portfolio, name: &str) -> Result<&'a SiteCatalog, AppError> {
    portfolio.find_site(name).ok_or_else(|| {
        AppError::new(
            2,
            format!("Unknown site '{name}'. Available: {}", portfolio.site_names().join(", ")),
        )
    })
}

/// Prompt the user to select a site.
///
/// Behavior:
/// - list sites by display name
/// - accept either a number (from the list) or a site name
/// - `q` cancels
pub fn prompt_for_site<'a, R: BufRead, W: Write>(
    portfolio: &'a Portfolio,
    input: &mut R,
    output: &mut W,
) -> Result<&'a SiteCatalog, AppError> {
    if portfolio.sites.is_empty() {
        return Err(AppError::new(
            2,
            format!("No sites found under {}.", portfolio.root.path().display()),
        ));
    }

    let write_err = |e: io::Error| AppError::new(4, format!("Failed to write prompt: {e}"));

    writeln!(output, "Found {} site(s):", portfolio.sites.len()).map_err(write_err)?;
    for (idx, site) in portfolio.sites.iter().enumerate() {
        writeln!(output, "{:>3}) {}", idx + 1, site.site.display_name).map_err(write_err)?;
    }

    loop {
        write!(
            output,
            "Select a site by number (1-{}) or name (q to quit): ",
            portfolio.sites.len()
        )
        .map_err(write_err)?;
        output.flush().map_err(write_err)?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(4, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(2, "No input received. Provide a site with `--site <name>`."));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if let Ok(choice) = line.parse::<usize>() {
            if (1..=portfolio.sites.len()).contains(&choice) {
                return Ok(&portfolio.sites[choice - 1]);
            }
            writeln!(
                output,
                "Invalid choice: {choice}. Enter a number between 1 and {}.",
                portfolio.sites.len()
            )
            .map_err(write_err)?;
            continue;
        }

        match portfolio.find_site(line) {
            Some(site) => return Ok(site),
            None => writeln!(output, "Unknown site: {line}").map_err(write_err)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::open_portfolio;

    fn portfolio(dir: &tempfile::TempDir) -> Portfolio {
        for site in ["Alpha_Power_LLC", "Bravo"] {
            let path = dir.path().join(site).join("Revenue");
            std::fs::create_dir_all(&path).unwrap();
            std::fs::write(path.join(format!("{site}_revenue_monthly_stats.csv")), "month,mean\n1,1\n").unwrap();
        }
        open_portfolio(dir.path()).unwrap()
    }

    #[test]
    fn picks_by_number_after_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let p = portfolio(&dir);
        let mut input = "9\nnope\n2\n".as_bytes();
        let mut output = Vec::new();
        let site = prompt_for_site(&p, &mut input, &mut output).unwrap();
        assert_eq!(site.site.folder_name, "Bravo");

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("  1) Alpha"));
        assert!(shown.contains("Invalid choice: 9"));
        assert!(shown.contains("Unknown site: nope"));
    }

    #[test]
    fn picks_by_display_name_and_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let p = portfolio(&dir);
        let mut output = Vec::new();
        let site = prompt_for_site(&p, &mut "alpha\n".as_bytes(), &mut output).unwrap();
        assert_eq!(site.site.folder_name, "Alpha_Power_LLC");

        let err = prompt_for_site(&p, &mut "q\n".as_bytes(), &mut output).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(prompt_for_site(&p, &mut "".as_bytes(), &mut output).is_err());
    }

    #[test]
    fn unknown_site_flag_lists_available_sites() {
        let dir = tempfile::tempdir().unwrap();
        let p = portfolio(&dir);
        let err = resolve_site(&p, "Zulu").unwrap_err();
        assert!(err.to_string().contains("Alpha_Power_LLC, Bravo"));
    }
}
