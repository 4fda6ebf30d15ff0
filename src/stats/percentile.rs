//! Percentiles and price duration curves.
//!
//! Percentiles use the standard linear-interpolation rule (the default of most
//! statistics packages): for ascending values `x[0..n]` and percentile `p`,
//! `h = (n - 1) * p / 100`, and the result interpolates between `x[floor(h)]`
//! and `x[ceil(h)]`.

use serde::Serialize;

use crate::io::loader::LoadedTable;
use crate::stats::StatsError;

/// Percentiles marked on a duration curve.
pub const DURATION_PERCENTILES: [u8; 9] = [1, 5, 10, 25, 50, 75, 90, 95, 99];

/// Linear-interpolation percentile of already sorted (ascending) values.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !p.is_finite() {
        return None;
    }
    let p = p.clamp(0.0, 100.0);
    let h = (sorted.len() - 1) as f64 * p / 100.0;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Percentile of unsorted values, ignoring missing/non-finite entries.
pub fn percentile(values: &[Option<f64>], p: f64) -> Option<f64> {
    let sorted = sorted_finite(values.iter().copied());
    percentile_sorted(&sorted, p)
}

pub(crate) fn sorted_finite(values: impl IntoIterator<Item = Option<f64>>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().flatten().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// A labelled point on the duration curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileMark {
    pub percentile: u8,
    pub value: f64,
    /// Share of time the value is exceeded (`100 - percentile`).
    pub exceedance_pct: f64,
}

/// Values sorted descending against percent-of-time exceeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationCurve {
    pub values_desc: Vec<f64>,
    /// Evenly spaced over `0..=100`, same length as `values_desc`.
    pub exceedance_pct: Vec<f64>,
    pub marks: Vec<PercentileMark>,
    pub mean: f64,
    pub has_negative: bool,
}

impl DurationCurve {
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.exceedance_pct
            .iter()
            .copied()
            .zip(self.values_desc.iter().copied())
            .collect()
    }

    pub fn mark(&self, percentile: u8) -> Option<&PercentileMark> {
        self.marks.iter().find(|m| m.percentile == percentile)
    }
}

/// Build a duration curve; `None` when there are no finite values.
pub fn duration_curve(values: &[Option<f64>], percentiles: &[u8]) -> Option<DurationCurve> {
    let ascending = sorted_finite(values.iter().copied());
    if ascending.is_empty() {
        return None;
    }

    let n = ascending.len();
    let mean = ascending.iter().sum::<f64>() / n as f64;
    let has_negative = ascending[0] < 0.0;

    let mut marks = Vec::with_capacity(percentiles.len());
    for &p in percentiles {
        if let Some(value) = percentile_sorted(&ascending, f64::from(p)) {
            marks.push(PercentileMark {
                percentile: p,
                value,
                exceedance_pct: 100.0 - f64::from(p),
            });
        }
    }

    let exceedance_pct = if n == 1 {
        vec![0.0]
    } else {
        (0..n).map(|i| 100.0 * i as f64 / (n - 1) as f64).collect()
    };

    let mut values_desc = ascending;
    values_desc.reverse();

    Some(DurationCurve {
        values_desc,
        exceedance_pct,
        marks,
        mean,
        has_negative,
    })
}

/// Duration curve of every value in `month` (all scenario years pooled).
///
/// Falls back to the `mean` column, then the first numeric column, when the
/// table has no scenario-year columns.
pub fn month_duration_curve(table: &LoadedTable, month: u32) -> Result<DurationCurve, StatsError> {
    if table.month().is_none() {
        return Err(StatsError::MissingColumn("month".to_string()));
    }
    let rows = table.rows_in_month(month);
    if rows.is_empty() {
        return Err(StatsError::NoRowsForMonth(month));
    }

    let mut pooled = Vec::new();
    let scenarios = table.scenario_columns();
    if scenarios.is_empty() {
        let column = table
            .value("mean")
            .or_else(|| table.statistic_columns().into_iter().next())
            .ok_or_else(|| StatsError::MissingColumn("mean".to_string()))?;
        pooled.extend(rows.iter().map(|&r| column.values[r]));
    } else {
        for column in scenarios {
            pooled.extend(rows.iter().map(|&r| column.values[r]));
        }
    }

    duration_curve(&pooled, &DURATION_PERCENTILES).ok_or(StatsError::NotEnoughValues { needed: 1, found: 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::loader::parse_table;
    use std::path::Path;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn linear_percentile_matches_standard_rule() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile_sorted(&sorted, 100.0), Some(4.0));
        assert!((percentile_sorted(&sorted, 50.0).unwrap() - 2.5).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 90.0).unwrap() - 3.7).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 10.0).unwrap() - 1.3).abs() < 1e-12);
        assert_eq!(percentile_sorted(&[], 50.0), None);
    }

    #[test]
    fn percentile_ignores_missing() {
        let values = vec![Some(5.0), None, Some(1.0), Some(f64::NAN), Some(3.0)];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
    }

    #[test]
    fn duration_curve_is_descending_and_marks_are_monotonic() {
        let values = some(&[12.0, -3.0, 45.0, 30.0, 7.5, 60.0, 22.0, 18.0, 5.0, 41.0, 33.0]);
        let curve = duration_curve(&values, &DURATION_PERCENTILES).unwrap();

        assert!(curve.values_desc.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(curve.exceedance_pct.first(), Some(&0.0));
        assert_eq!(curve.exceedance_pct.last(), Some(&100.0));
        assert!(curve.has_negative);

        // Non-increasing as the percentile rank goes from 90 down to 10.
        let ranks = [90u8, 75, 50, 25, 10];
        let marks: Vec<f64> = ranks.iter().map(|p| curve.mark(*p).unwrap().value).collect();
        assert!(marks.windows(2).all(|w| w[0] >= w[1]), "{marks:?}");
    }

    #[test]
    fn duration_curve_of_single_value() {
        let curve = duration_curve(&some(&[4.0]), &[10, 90]).unwrap();
        assert_eq!(curve.values_desc, vec![4.0]);
        assert_eq!(curve.exceedance_pct, vec![0.0]);
        assert_eq!(curve.mark(90).unwrap().value, 4.0);
        assert!(duration_curve(&[None], &[50]).is_none());
    }

    #[test]
    fn month_duration_curve_pools_scenario_years() {
        let text = "month,hour,2025,2026\n1,0,10,20\n1,1,30,40\n2,0,99,99\n";
        let table = parse_table(Path::new("p.csv"), text.as_bytes()).unwrap();
        let curve = month_duration_curve(&table, 1).unwrap();
        assert_eq!(curve.values_desc, vec![40.0, 30.0, 20.0, 10.0]);
        assert!((curve.mean - 25.0).abs() < 1e-12);
        assert!(matches!(month_duration_curve(&table, 5), Err(StatsError::NoRowsForMonth(5))));
    }
}
