//! Per-row scenario summaries, confidence bands and hourly profiles.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::io::loader::LoadedTable;
use crate::stats::StatsError;
use crate::stats::percentile::{percentile_sorted, sorted_finite};

/// Lower/upper band columns, row-aligned with the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub lower: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
}

/// Per-row summary statistics of a table.
///
/// For timeseries tables these are computed across the scenario-year columns;
/// for stats tables they are the table's own columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub mean: Vec<Option<f64>>,
    pub p5: Option<Vec<Option<f64>>>,
    pub p95: Option<Vec<Option<f64>>>,
    pub p25: Option<Vec<Option<f64>>>,
    pub p75: Option<Vec<Option<f64>>>,
}

impl SeriesSummary {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// The p5–p95 band when both bounds are known.
    pub fn band(&self) -> Option<Band> {
        Some(Band {
            lower: self.p5.clone()?,
            upper: self.p95.clone()?,
        })
    }

    /// The p25–p75 band when both bounds are known.
    pub fn interquartile(&self) -> Option<Band> {
        Some(Band {
            lower: self.p25.clone()?,
            upper: self.p75.clone()?,
        })
    }
}

/// Pass the table's `p5`/`p95` columns through unmodified; `None` when either
/// is absent.
pub fn confidence_band(table: &LoadedTable) -> Option<Band> {
    let lower = table.value("p5")?;
    let upper = table.value("p95")?;
    Some(Band {
        lower: lower.values.clone(),
        upper: upper.values.clone(),
    })
}

/// Summarize each row of `table`.
///
/// With scenario-year columns the mean and percentiles are computed across
/// them; otherwise the `mean` column and any `p5`/`p95`/`p25`/`p75` columns are
/// taken as-is.
pub fn summarize_rows(table: &LoadedTable) -> Result<SeriesSummary, StatsError> {
    let scenarios = table.scenario_columns();
    if scenarios.is_empty() {
        let mean = table
            .value("mean")
            .ok_or_else(|| StatsError::MissingColumn("mean".to_string()))?;
        let column = |name: &str| table.value(name).map(|c| c.values.clone());
        let band = confidence_band(table);
        return Ok(SeriesSummary {
            mean: mean.values.clone(),
            p5: band.as_ref().map(|b| b.lower.clone()),
            p95: band.map(|b| b.upper),
            p25: column("p25"),
            p75: column("p75"),
        });
    }

    let rows = table.row_count;
    let mut mean = Vec::with_capacity(rows);
    let mut p5 = Vec::with_capacity(rows);
    let mut p95 = Vec::with_capacity(rows);
    let mut p25 = Vec::with_capacity(rows);
    let mut p75 = Vec::with_capacity(rows);

    for row in 0..rows {
        let sorted = sorted_finite(scenarios.iter().map(|c| c.values[row]));
        mean.push((!sorted.is_empty()).then(|| sorted.iter().sum::<f64>() / sorted.len() as f64));
        p5.push(percentile_sorted(&sorted, 5.0));
        p95.push(percentile_sorted(&sorted, 95.0));
        p25.push(percentile_sorted(&sorted, 25.0));
        p75.push(percentile_sorted(&sorted, 75.0));
    }

    Ok(SeriesSummary {
        mean,
        p5: Some(p5),
        p95: Some(p95),
        p25: Some(p25),
        p75: Some(p75),
    })
}

/// Average of a summary for one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourPoint {
    pub hour: i32,
    pub mean: Option<f64>,
    pub p5: Option<f64>,
    pub p95: Option<f64>,
}

/// Label columns that may carry a timestamp per row.
const TIMESTAMP_COLUMNS: [&str; 3] = ["datetime", "timestamp", "date"];

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
];

/// Hour of day (0..=23) per row, from real time information only.
///
/// The `hour` column wins, folded modulo 24 so hour-ending 24 and
/// hour-of-year values land on their clock hour. Otherwise a timestamp label
/// column is used when every row parses. `None` when neither exists.
pub fn hour_of_day(table: &LoadedTable) -> Option<Vec<i32>> {
    if let Some(hours) = table.hour() {
        return Some(hours.iter().map(|h| h.rem_euclid(24)).collect());
    }
    TIMESTAMP_COLUMNS.iter().find_map(|name| {
        let column = table.label(name)?;
        column.values.iter().map(|raw| parse_timestamp_hour(raw)).collect()
    })
}

fn parse_timestamp_hour(raw: &str) -> Option<i32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.hour() as i32);
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.hour() as i32)
}

/// Group rows by hour of day and average mean/p5/p95 within each hour.
///
/// Hours come from [`hour_of_day`]; without any time information rows are
/// assumed to start at midnight and `row_index % 24` is used. When `month` is
/// given only rows of that month are used.
pub fn hourly_profile(table: &LoadedTable, summary: &SeriesSummary, month: Option<u32>) -> Vec<HourPoint> {
    let rows: Vec<usize> = match month {
        Some(m) if table.month().is_some() => table.rows_in_month(m),
        _ => (0..summary.len()).collect(),
    };

    let hours = hour_of_day(table);
    let hour_of = |row: usize| match &hours {
        Some(hours) => hours[row],
        None => (row % 24) as i32,
    };

    #[derive(Default)]
    struct Acc {
        mean: Vec<Option<f64>>,
        p5: Vec<Option<f64>>,
        p95: Vec<Option<f64>>,
    }

    let mut groups: BTreeMap<i32, Acc> = BTreeMap::new();
    for row in rows {
        let acc = groups.entry(hour_of(row)).or_default();
        acc.mean.push(summary.mean[row]);
        acc.p5.push(summary.p5.as_ref().and_then(|v| v[row]));
        acc.p95.push(summary.p95.as_ref().and_then(|v| v[row]));
    }

    groups
        .into_iter()
        .map(|(hour, acc)| HourPoint {
            hour,
            mean: average(&acc.mean),
            p5: average(&acc.p5),
            p95: average(&acc.p95),
        })
        .collect()
}

fn average(values: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = values.iter().flatten().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::loader::parse_table;
    use std::path::Path;

    fn table(text: &str) -> LoadedTable {
        parse_table(Path::new("t.csv"), text.as_bytes()).unwrap()
    }

    #[test]
    fn band_is_passed_through_unmodified() {
        let t = table("month,mean,p5,p95\n1,10,3,17\n2,11,,18\n");
        let band = confidence_band(&t).unwrap();
        assert_eq!(band.lower, vec![Some(3.0), None]);
        assert_eq!(band.upper, vec![Some(17.0), Some(18.0)]);
    }

    #[test]
    fn no_band_without_both_bounds() {
        assert!(confidence_band(&table("month,mean,p5\n1,10,3\n")).is_none());
        let summary = summarize_rows(&table("month,mean\n1,10\n")).unwrap();
        assert!(summary.band().is_none());
    }

    #[test]
    fn stats_tables_pass_columns_through() {
        let t = table("month,mean,p5,p95,p25,p75\n1,10,3,17,8,12\n");
        let s = summarize_rows(&t).unwrap();
        assert_eq!(s.mean, vec![Some(10.0)]);
        assert_eq!(s.interquartile().unwrap().upper, vec![Some(12.0)]);
    }

    #[test]
    fn scenario_columns_are_summarized_per_row() {
        let t = table("month,2025,2026,2027,2028,2029\n1,1,2,3,4,5\n2,,,,,\n");
        let s = summarize_rows(&t).unwrap();
        assert_eq!(s.mean, vec![Some(3.0), None]);
        let p5 = s.p5.as_ref().unwrap()[0].unwrap();
        assert!((p5 - 1.2).abs() < 1e-12);
        let p95 = s.p95.as_ref().unwrap()[0].unwrap();
        assert!((p95 - 4.8).abs() < 1e-12);
        assert_eq!(s.p25.as_ref().unwrap()[0], Some(2.0));
    }

    #[test]
    fn missing_mean_is_an_error() {
        assert!(matches!(
            summarize_rows(&table("month,value\n1,2\n")),
            Err(StatsError::MissingColumn(_))
        ));
    }

    #[test]
    fn hourly_profile_uses_hour_column() {
        let t = table("month,hour,mean\n1,0,10\n1,1,20\n2,0,30\n2,1,40\n");
        let s = summarize_rows(&t).unwrap();
        let all = hourly_profile(&t, &s, None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].mean, Some(20.0));
        assert_eq!(all[1].mean, Some(30.0));
        assert_eq!(all[0].p5, None);

        let jan = hourly_profile(&t, &s, Some(1));
        assert_eq!(jan[1].mean, Some(20.0));
    }

    #[test]
    fn hour_ending_24_folds_into_midnight() {
        let t = table("hour,mean\n0,10\n1,20\n24,30\n25,40\n");
        let s = summarize_rows(&t).unwrap();
        let profile = hourly_profile(&t, &s, None);
        let hours: Vec<i32> = profile.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![0, 1]);
        assert_eq!(profile[0].mean, Some(20.0));
        assert_eq!(profile[1].mean, Some(30.0));
    }

    #[test]
    fn mixed_0_and_24_hours_give_24_buckets() {
        let mut text = String::from("hour,mean\n");
        for h in 0..24 {
            text.push_str(&format!("{h},1\n"));
        }
        for h in 1..=24 {
            text.push_str(&format!("{h},3\n"));
        }
        let t = table(&text);
        let profile = hourly_profile(&t, &summarize_rows(&t).unwrap(), None);
        assert_eq!(profile.len(), 24);
        assert!(profile.iter().all(|p| p.mean == Some(2.0)));
    }

    #[test]
    fn timestamps_place_rows_on_their_clock_hour() {
        // Starts at 05:00 and skips 07:00.
        let t = table(
            "datetime,mean\n2025-01-01 05:00:00,5\n2025-01-01 06:00:00,6\n2025-01-01T08:00:00Z,8\n01/02/2025 05:00,15\n",
        );
        assert_eq!(hour_of_day(&t), Some(vec![5, 6, 8, 5]));
        let profile = hourly_profile(&t, &summarize_rows(&t).unwrap(), None);
        let points: Vec<(i32, Option<f64>)> = profile.iter().map(|p| (p.hour, p.mean)).collect();
        assert_eq!(points, vec![(5, Some(10.0)), (6, Some(6.0)), (8, Some(8.0))]);
    }

    #[test]
    fn unparsable_timestamps_give_no_hours() {
        let t = table("datetime,mean\n2025-01-01 05:00,5\nlater,6\n");
        assert_eq!(hour_of_day(&t), None);
        assert_eq!(hour_of_day(&table("mean\n1\n")), None);
    }

    #[test]
    fn hourly_profile_falls_back_to_row_index() {
        let text = (0..48).fold(String::from("mean\n"), |mut acc, i| {
            acc.push_str(&format!("{}\n", if i < 24 { 0 } else { 10 }));
            acc
        });
        let t = table(&text);
        let s = summarize_rows(&t).unwrap();
        let profile = hourly_profile(&t, &s, None);
        assert_eq!(profile.len(), 24);
        assert!(profile.iter().all(|p| p.mean == Some(5.0)));
    }
}
