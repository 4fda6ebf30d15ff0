//! File-name classification.
//!
//! Classification is a pure function of the file name; file contents are never
//! inspected. The name is lower-cased, its extension dropped, and the stem is
//! split into tokens on `_`, `-`, `.` and whitespace. Tokens are then matched
//! against two ordered rule tables.
//!
//! Conflicting tokens (e.g. both `daily` and `monthly`) resolve by scan order:
//! the first token, left to right, that matches any rule in a table wins.

use crate::domain::{ContentKind, Resolution};

/// Resolution rules, checked per token in this order.
pub const RESOLUTION_RULES: [(&str, Resolution); 3] = [
    ("hourly", Resolution::Hourly),
    ("daily", Resolution::Daily),
    ("monthly", Resolution::Monthly),
];

/// Content-kind rules, checked per token in this order.
pub const KIND_RULES: [(&str, ContentKind); 2] = [
    ("timeseries", ContentKind::Timeseries),
    ("stats", ContentKind::Stats),
];

/// Marks a compressed timeseries export; implies `Timeseries` when no kind token is present.
pub const COMPRESSED_TOKEN: &str = "compressed";

/// Extension required for a file to be chartable.
pub const TABLE_EXTENSION: &str = "csv";

/// Result of classifying one file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub resolution: Resolution,
    pub kind: ContentKind,
    pub compressed: bool,
}

/// Classify a file name (not a path).
pub fn classify_file_name(file_name: &str) -> Classification {
    let lower = file_name.to_lowercase();
    let (stem, extension) = match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (lower.as_str(), None),
    };

    let mut resolution = None;
    let mut kind = None;
    let mut compressed = false;

    for token in tokenize(stem) {
        if token == COMPRESSED_TOKEN {
            compressed = true;
            continue;
        }

        let (res, k) = match_token(token);
        if resolution.is_none() {
            resolution = res;
        }
        if kind.is_none() {
            kind = k;
        }
    }

    let mut kind = match kind {
        Some(k) => k,
        None if compressed => ContentKind::Timeseries,
        None => ContentKind::Other,
    };

    let is_table = extension.is_some_and(|ext| ext == TABLE_EXTENSION);
    if !is_table {
        kind = ContentKind::Other;
    }

    Classification {
        resolution: resolution.unwrap_or(Resolution::Unknown),
        kind,
        compressed,
    }
}

fn tokenize(stem: &str) -> impl Iterator<Item = &str> {
    stem.split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|t| !t.is_empty())
}

/// Match one token against both rule tables.
///
/// Besides exact tokens, a resolution word directly followed by a kind word
/// (`monthlystats`, `dailytimeseries`) yields both.
fn match_token(token: &str) -> (Option<Resolution>, Option<ContentKind>) {
    if let Some(res) = lookup_resolution(token) {
        return (Some(res), None);
    }
    if let Some(kind) = lookup_kind(token) {
        return (None, Some(kind));
    }

    for (word, res) in RESOLUTION_RULES {
        if let Some(rest) = token.strip_prefix(word) {
            if let Some(kind) = lookup_kind(rest) {
                return (Some(res), Some(kind));
            }
        }
    }

    (None, None)
}

fn lookup_resolution(token: &str) -> Option<Resolution> {
    RESOLUTION_RULES
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, res)| *res)
}

fn lookup_kind(token: &str) -> Option<ContentKind> {
    KIND_RULES
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> (Resolution, ContentKind) {
        let c = classify_file_name(name);
        (c.resolution, c.kind)
    }

    #[test]
    fn compressed_hourly_timeseries() {
        let c = classify_file_name("Acme_price_hourly_timeseries_compressed.csv");
        assert_eq!(c.resolution, Resolution::Hourly);
        assert_eq!(c.kind, ContentKind::Timeseries);
        assert!(c.compressed);
    }

    #[test]
    fn monthly_stats() {
        assert_eq!(
            classify("Acme_generation_monthly_stats.csv"),
            (Resolution::Monthly, ContentKind::Stats)
        );
    }

    #[test]
    fn unrecognized_name_is_other_and_unknown() {
        assert_eq!(classify("Acme_notes.csv"), (Resolution::Unknown, ContentKind::Other));
    }

    #[test]
    fn each_resolution_rule_matches_its_token() {
        for (word, res) in RESOLUTION_RULES {
            let name = format!("Site_price_{word}_stats.csv");
            assert_eq!(classify(&name), (res, ContentKind::Stats), "rule {word}");
        }
    }

    #[test]
    fn each_kind_rule_matches_its_token() {
        for (word, kind) in KIND_RULES {
            let name = format!("Site_price_daily_{word}.csv");
            assert_eq!(classify(&name), (Resolution::Daily, kind), "rule {word}");
        }
    }

    #[test]
    fn first_resolution_token_wins() {
        assert_eq!(
            classify("Site_daily_monthly_stats.csv"),
            (Resolution::Daily, ContentKind::Stats)
        );
        assert_eq!(
            classify("Site_monthly_daily_stats.csv"),
            (Resolution::Monthly, ContentKind::Stats)
        );
    }

    #[test]
    fn first_kind_token_wins() {
        assert_eq!(
            classify("Site_hourly_stats_timeseries.csv"),
            (Resolution::Hourly, ContentKind::Stats)
        );
    }

    #[test]
    fn compressed_without_kind_is_timeseries() {
        let c = classify_file_name("Site_price_hourly_compressed.csv");
        assert_eq!((c.resolution, c.kind), (Resolution::Hourly, ContentKind::Timeseries));
    }

    #[test]
    fn compound_tokens_yield_both() {
        assert_eq!(classify("Site_monthlystats.csv"), (Resolution::Monthly, ContentKind::Stats));
        assert_eq!(
            classify("Site-dailytimeseries.csv"),
            (Resolution::Daily, ContentKind::Timeseries)
        );
    }

    #[test]
    fn tokens_are_case_insensitive_and_whole_words() {
        assert_eq!(
            classify("SITE_Price_HOURLY_Stats.CSV"),
            (Resolution::Hourly, ContentKind::Stats)
        );
        // "statsfile" is not a kind token.
        assert_eq!(classify("Site_hourly_statsfile.csv"), (Resolution::Hourly, ContentKind::Other));
    }

    #[test]
    fn non_csv_files_are_other_but_keep_resolution() {
        assert_eq!(
            classify("Site_price_monthly_stats.xlsx"),
            (Resolution::Monthly, ContentKind::Other)
        );
        assert_eq!(classify("README"), (Resolution::Unknown, ContentKind::Other));
    }

    #[test]
    fn classification_is_deterministic() {
        let names = [
            "Acme_price_hourly_timeseries_compressed.csv",
            "Acme_generation_monthly_stats.csv",
            "Acme_notes.csv",
        ];
        let first: Vec<_> = names.iter().map(|n| classify_file_name(n)).collect();
        let second: Vec<_> = names.iter().map(|n| classify_file_name(n)).collect();
        assert_eq!(first, second);
    }
}
