//! Distribution summaries.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::io::loader::LoadedTable;
use crate::stats::StatsError;
use crate::stats::percentile::{percentile_sorted, sorted_finite};

/// Mean, sample standard deviation, min and max over non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (divisor `n - 1`); `None` when `count < 2`.
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarize_values(values: impl IntoIterator<Item = Option<f64>>) -> DistributionSummary {
    let values: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
    let count = values.len();
    if count == 0 {
        return DistributionSummary {
            count,
            mean: None,
            std_dev: None,
            min: None,
            max: None,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let std_dev = (count >= 2).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    DistributionSummary {
        count,
        mean: Some(mean),
        std_dev,
        min: Some(min),
        max: Some(max),
    }
}

/// Summary for one year group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub summary: DistributionSummary,
}

/// Summarize each `(year, values)` group; output sorted by year.
///
/// Groups sharing a year are merged.
pub fn summarize_groups(groups: impl IntoIterator<Item = (i32, Vec<Option<f64>>)>) -> Vec<YearSummary> {
    let mut merged: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    for (year, values) in groups {
        merged.entry(year).or_default().extend(values);
    }
    merged
        .into_iter()
        .map(|(year, values)| YearSummary {
            year,
            summary: summarize_values(values),
        })
        .collect()
}

/// Per-year summary of a table.
///
/// - With a `year` column: rows are grouped by year over `column` (default
///   `mean`, else the first statistic column).
/// - Without one: each scenario-year column is a group (`column` may restrict
///   it to a single year).
pub fn summarize_by_year(table: &LoadedTable, column: Option<&str>) -> Result<Vec<YearSummary>, StatsError> {
    if let Some(years) = table.year() {
        let values = match column {
            Some(name) => table.value(name).ok_or_else(|| StatsError::MissingColumn(name.to_string()))?,
            None => table
                .value("mean")
                .or_else(|| table.statistic_columns().into_iter().next())
                .ok_or_else(|| StatsError::MissingColumn("mean".to_string()))?,
        };
        let mut groups: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
        for (year, value) in years.iter().zip(values.values.iter()) {
            groups.entry(*year).or_default().push(*value);
        }
        return Ok(summarize_groups(groups));
    }

    let scenarios = table.scenario_columns();
    if scenarios.is_empty() {
        return Err(StatsError::NoYearGrouping);
    }

    let groups = scenarios
        .into_iter()
        .filter(|c| column.is_none_or(|name| c.name == name))
        .filter_map(|c| c.scenario_year().map(|year| (year, c.values.clone())))
        .collect::<Vec<_>>();
    if groups.is_empty() {
        return Err(StatsError::MissingColumn(column.unwrap_or_default().to_string()));
    }
    Ok(summarize_groups(groups))
}

/// Minimum scenario values needed for a month distribution.
pub const MIN_DISTRIBUTION_VALUES: usize = 3;

/// Spread of one month's value across scenario years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDistribution {
    pub month: u32,
    /// Ascending.
    pub values: Vec<f64>,
    pub summary: DistributionSummary,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
}

impl MonthDistribution {
    /// Equal-width histogram over `[min, max]`: `(bin_center, count)`.
    pub fn histogram(&self, bins: usize) -> Vec<(f64, usize)> {
        let bins = bins.max(1);
        let (Some(min), Some(max)) = (self.summary.min, self.summary.max) else {
            return Vec::new();
        };
        let width = (max - min) / bins as f64;
        if width <= 0.0 {
            return vec![(min, self.values.len())];
        }

        let mut counts = vec![0usize; bins];
        for v in &self.values {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
            .into_iter()
            .enumerate()
            .map(|(i, c)| (min + width * (i as f64 + 0.5), c))
            .collect()
    }

    /// Normal density with this distribution's mean and std, sampled on `n` points.
    pub fn normal_curve(&self, n: usize) -> Vec<(f64, f64)> {
        let (Some(mean), Some(std), Some(min), Some(max)) =
            (self.summary.mean, self.summary.std_dev, self.summary.min, self.summary.max)
        else {
            return Vec::new();
        };
        if std <= 0.0 || n < 2 {
            return Vec::new();
        }
        let lo = min - std;
        let hi = max + std;
        let norm = 1.0 / (std * (2.0 * std::f64::consts::PI).sqrt());
        (0..n)
            .map(|i| {
                let x = lo + (hi - lo) * i as f64 / (n - 1) as f64;
                let z = (x - mean) / std;
                (x, norm * (-0.5 * z * z).exp())
            })
            .collect()
    }
}

/// Distribution of a month's value across scenario years of a monthly table.
pub fn month_distribution(table: &LoadedTable, month: u32) -> Result<MonthDistribution, StatsError> {
    if table.month().is_none() {
        return Err(StatsError::MissingColumn("month".to_string()));
    }
    let scenarios = table.scenario_columns();
    if scenarios.is_empty() {
        return Err(StatsError::NoYearGrouping);
    }
    let rows = table.rows_in_month(month);
    let Some(&row) = rows.first() else {
        return Err(StatsError::NoRowsForMonth(month));
    };

    let values = sorted_finite(scenarios.iter().map(|c| c.values[row]));
    if values.len() < MIN_DISTRIBUTION_VALUES {
        return Err(StatsError::NotEnoughValues {
            needed: MIN_DISTRIBUTION_VALUES,
            found: values.len(),
        });
    }

    let summary = summarize_values(values.iter().copied().map(Some));
    let pct = |p: f64| percentile_sorted(&values, p).unwrap_or(f64::NAN);
    let (median, p5, p95) = (pct(50.0), pct(5.0), pct(95.0));

    Ok(MonthDistribution {
        month,
        values,
        summary,
        median,
        p5,
        p95,
    })
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
    fn single_value_has_missing_std() {
        let s = summarize_values([Some(5.0)]);
        assert_eq!(s.count, 1);
        assert_eq!(s.mean, Some(5.0));
        assert_eq!(s.std_dev, None);
        assert_eq!(s.min, Some(5.0));
        assert_eq!(s.max, Some(5.0));
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let s = summarize_values([Some(2.0), Some(4.0), Some(4.0), Some(4.0), Some(5.0), Some(5.0), Some(7.0), Some(9.0)]);
        assert!((s.mean.unwrap() - 5.0).abs() < 1e-12);
        // Population std is 2.0; sample std is sqrt(32/7).
        assert!((s.std_dev.unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn missing_values_are_ignored() {
        let s = summarize_values([None, Some(1.0), None, Some(3.0)]);
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(2.0));
        let empty = summarize_values([None, None]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, None);
    }

    #[test]
    fn groups_by_year_column() {
        let t = table("year,month,mean\n2025,1,10\n2025,2,20\n2026,1,7\n");
        let out = summarize_by_year(&t, None).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].year, 2025);
        assert_eq!(out[0].summary.mean, Some(15.0));
        assert_eq!(out[1].summary.std_dev, None);
    }

    #[test]
    fn groups_by_scenario_columns() {
        let t = table("month,2026,2025\n1,1,10\n2,3,\n");
        let out = summarize_by_year(&t, None).unwrap();
        assert_eq!(out.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2025, 2026]);
        assert_eq!(out[0].summary.count, 1);
        assert_eq!(out[0].summary.std_dev, None);
        assert_eq!(out[1].summary.mean, Some(2.0));

        let only = summarize_by_year(&t, Some("2026")).unwrap();
        assert_eq!(only.len(), 1);
        assert!(matches!(summarize_by_year(&t, Some("1999")), Err(StatsError::MissingColumn(_))));
    }

    #[test]
    fn no_grouping_is_an_error() {
        let t = table("month,mean\n1,2\n");
        assert!(matches!(summarize_by_year(&t, None), Err(StatsError::NoYearGrouping)));
    }

    #[test]
    fn month_distribution_requires_three_values() {
        let t = table("month,2025,2026,2027\n1,10,20,30\n2,1,,\n");
        let d = month_distribution(&t, 1).unwrap();
        assert_eq!(d.values, vec![10.0, 20.0, 30.0]);
        assert!((d.median - 20.0).abs() < 1e-12);
        assert!((d.p5 - 11.0).abs() < 1e-12);
        assert!((d.p95 - 29.0).abs() < 1e-12);
        assert!(matches!(
            month_distribution(&t, 2),
            Err(StatsError::NotEnoughValues { needed: 3, found: 1 })
        ));
    }

    #[test]
    fn histogram_counts_every_value() {
        let t = table("month,2025,2026,2027,2028\n1,0,1,2,10\n");
        let d = month_distribution(&t, 1).unwrap();
        let hist = d.histogram(5);
        assert_eq!(hist.len(), 5);
        assert_eq!(hist.iter().map(|(_, c)| c).sum::<usize>(), 4);
        assert_eq!(hist[4].1, 1);
        assert!(!d.normal_curve(20).is_empty());
    }
}
