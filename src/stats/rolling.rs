//! Trailing rolling averages.

/// Window used for daily series.
pub const DAILY_ROLLING_WINDOW: usize = 7;

/// Trailing mean over up to `window` rows ending at each row.
///
/// The window shrinks at the start of the series (no wraparound, no
/// look-ahead). Missing values inside a window are skipped; a window with no
/// values yields `None`. Output length always equals input length.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let (sum, count) = values[start..=i]
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        out.push(if count > 0 { Some(sum / count as f64) } else { None });
    }

    out
}

/// Trailing mean that restarts whenever `keys` changes value between rows.
///
/// `keys` is typically the `year` column; without it the rows are treated as
/// one contiguous series.
pub fn rolling_mean_grouped<K: PartialEq>(values: &[Option<f64>], keys: Option<&[K]>, window: usize) -> Vec<Option<f64>> {
    let Some(keys) = keys.filter(|k| k.len() == values.len()) else {
        return rolling_mean(values, window);
    };

    let mut out = Vec::with_capacity(values.len());
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && keys[end] == keys[start] {
            end += 1;
        }
        out.extend(rolling_mean(&values[start..end], window));
        start = end;
    }
    out
}
