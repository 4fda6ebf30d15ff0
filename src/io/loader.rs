//! CSV table loading and normalization.
//!
//! This module is responsible for turning a classified data file into a
//! `LoadedTable`: integer time columns plus numeric value columns.
//!
//! Design goals:
//! - **Strict time columns**: `year`/`month`/`day`/`hour` must coerce to integers
//!   or the whole load fails with a `DataFormatError`; ranges are left to consumers
//! - **Lenient value columns**: empty cells and the usual missing markers
//!   (`NaN`, `N/A`, `#N/A`, `NULL`, ...) become missing values; scenario-year
//!   columns stay numeric even when a cell is junk
//! - **Deterministic behavior**: same bytes in, same table out
//! - **Separation of concerns**: no aggregation logic here

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{DashboardConfig, DataFile};
use crate::error::DataFormatError;
use crate::io::cache::{FileStamp, ModTimeCache, NoCache, TableCache};

/// Time component columns recognized by name (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeField {
    Year,
    Month,
    Day,
    Hour,
}

impl TimeField {
    pub const ALL: [TimeField; 4] = [TimeField::Year, TimeField::Month, TimeField::Day, TimeField::Hour];

    pub fn column_name(self) -> &'static str {
        match self {
            TimeField::Year => "year",
            TimeField::Month => "month",
            TimeField::Day => "day",
            TimeField::Hour => "hour",
        }
    }

    fn from_header(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

/// A numeric column; missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl ValueColumn {
    /// Column header is a year (e.g. `2031`): one scenario year per column.
    pub fn is_scenario_year(&self) -> bool {
        !self.name.is_empty() && self.name.chars().all(|c| c.is_ascii_digit())
    }

    pub fn scenario_year(&self) -> Option<i32> {
        if self.is_scenario_year() { self.name.parse().ok() } else { None }
    }
}

/// A text column kept for labelling (e.g. `month_name`, `date_label`).
#[derive(Debug, Clone, PartialEq)]
pub struct LabelColumn {
    pub name: String,
    pub values: Vec<String>,
}

/// A parsed table. Ephemeral: rebuilt per request unless cached.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub source: PathBuf,
    /// Original header order (trimmed).
    pub headers: Vec<String>,
    pub row_count: usize,
    time: Vec<(TimeField, Vec<i32>)>,
    pub values: Vec<ValueColumn>,
    pub labels: Vec<LabelColumn>,
}

impl LoadedTable {
    pub fn time(&self, field: TimeField) -> Option<&[i32]> {
        self.time
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_slice())
    }

    pub fn year(&self) -> Option<&[i32]> {
        self.time(TimeField::Year)
    }

    pub fn month(&self) -> Option<&[i32]> {
        self.time(TimeField::Month)
    }

    pub fn day(&self) -> Option<&[i32]> {
        self.time(TimeField::Day)
    }

    pub fn hour(&self) -> Option<&[i32]> {
        self.time(TimeField::Hour)
    }

    /// Case-insensitive lookup of a numeric column.
    pub fn value(&self, name: &str) -> Option<&ValueColumn> {
        self.values.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn label(&self, name: &str) -> Option<&LabelColumn> {
        self.labels.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Scenario-year columns in header order.
    pub fn scenario_columns(&self) -> Vec<&ValueColumn> {
        self.values.iter().filter(|c| c.is_scenario_year()).collect()
    }

    /// Numeric columns that are not scenario years (`mean`, `p5`, ...).
    pub fn statistic_columns(&self) -> Vec<&ValueColumn> {
        self.values.iter().filter(|c| !c.is_scenario_year()).collect()
    }

    /// Indices of rows whose `month` equals `month`.
    pub fn rows_in_month(&self, month: u32) -> Vec<usize> {
        let Some(months) = self.month() else {
            return Vec::new();
        };
        months
            .iter()
            .enumerate()
            .filter(|(_, m)| i64::from(**m) == i64::from(month))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Loads tables through an injected cache.
pub struct DataLoader {
    cache: Box<dyn TableCache>,
}

impl DataLoader {
    pub fn new(cache: Box<dyn TableCache>) -> Self {
        Self { cache }
    }

    /// A loader that re-reads every file on every request.
    pub fn uncached() -> Self {
        Self::new(Box::new(NoCache))
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        if config.use_cache {
            Self::new(Box::new(ModTimeCache::new(config.cache_ttl)))
        } else {
            Self::uncached()
        }
    }

    pub fn load(&mut self, file: &DataFile) -> Result<Arc<LoadedTable>, DataFormatError> {
        self.load_path(&file.path)
    }

    pub fn load_path(&mut self, path: &Path) -> Result<Arc<LoadedTable>, DataFormatError> {
        let stamp = FileStamp::of(path).map_err(|e| DataFormatError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let now = Instant::now();
        if let Some(table) = self.cache.get(path, &stamp, now) {
            debug!(path = %path.display(), "table cache hit");
            return Ok(table);
        }

        let table = Arc::new(read_table(path)?);
        debug!(
            path = %path.display(),
            rows = table.row_count,
            columns = table.headers.len(),
            "table loaded"
        );
        self.cache.put(path, stamp, Arc::clone(&table), now);
        Ok(table)
    }

    /// Drop every cached table (used on rescan).
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_tables(&self) -> usize {
        self.cache.len()
    }
}

/// Read and normalize a CSV file from disk.
pub fn read_table(path: &Path) -> Result<LoadedTable, DataFormatError> {
    let file = File::open(path).map_err(|e| DataFormatError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_table(path, file)
}

/// Parse CSV bytes into a table; `path` is used for error messages only.
pub fn parse_table<R: Read>(path: &Path, input: R) -> Result<LoadedTable, DataFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| DataFormatError::Parse {
            path: path.to_path_buf(),
            line: 1,
            message: e.to_string(),
        })?
        .clone();

    let headers: Vec<String> = headers.iter().map(normalize_header_name).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataFormatError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut records: Vec<StringRecord> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        let record = result.map_err(|e| DataFormatError::Parse {
            path: path.to_path_buf(),
            line,
            message: e.to_string(),
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record);
    }

    let mut time: Vec<(TimeField, Vec<i32>)> = Vec::new();
    let mut values = Vec::new();
    let mut labels = Vec::new();

    for (col, name) in headers.iter().enumerate() {
        let field = TimeField::from_header(&name.to_ascii_lowercase());
        if let Some(field) = field.filter(|f| time.iter().all(|(seen, _)| seen != f)) {
            time.push((field, parse_time_column(path, &records, col, field)?));
            continue;
        }

        let scenario_year = !name.is_empty() && name.chars().all(|c| c.is_ascii_digit());
        match parse_value_column(&records, col, scenario_year) {
            Some(parsed) => values.push(ValueColumn {
                name: name.clone(),
                values: parsed,
            }),
            None => labels.push(LabelColumn {
                name: name.clone(),
                values: records
                    .iter()
                    .map(|r| r.get(col).unwrap_or("").to_string())
                    .collect(),
            }),
        }
    }

    Ok(LoadedTable {
        source: path.to_path_buf(),
        headers,
        row_count: records.len(),
        time,
        values,
        labels,
    })
}

/// Read the header and the first `max_rows` raw records (explorer preview).
pub fn preview_rows(path: &Path, max_rows: usize) -> Result<(Vec<String>, Vec<Vec<String>>), DataFormatError> {
    let file = File::open(path).map_err(|e| DataFormatError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DataFormatError::Parse {
            path: path.to_path_buf(),
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().take(max_rows).enumerate() {
        let record = result.map_err(|e| DataFormatError::Parse {
            path: path.to_path_buf(),
            line: idx + 2,
            message: e.to_string(),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, `month` would not be recognized.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_time_column(
    path: &Path,
    records: &[StringRecord],
    col: usize,
    field: TimeField,
) -> Result<Vec<i32>, DataFormatError> {
    let mut out = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let raw = record.get(col).unwrap_or("");
        let value = parse_integer(raw).ok_or_else(|| DataFormatError::TimeColumn {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line() as usize).unwrap_or(idx + 2),
                column: field.column_name().to_string(),
                value: raw.to_string(),
            })?;
        out.push(value);
    }
    Ok(out)
}

/// Accepts `7` and `7.0`; rejects fractions, empty cells and overflow.
fn parse_integer(s: &str) -> Option<i32> {
    if let Ok(v) = s.parse::<i32>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

/// `Some` when every non-missing cell is numeric.
///
/// With `keep_numeric` (scenario-year headers) unparsable cells become `None`
/// instead of turning the column into labels.
fn parse_value_column(records: &[StringRecord], col: usize, keep_numeric: bool) -> Option<Vec<Option<f64>>> {
    let mut out = Vec::with_capacity(records.len());
    let mut any_numeric = false;
    for (idx, record) in records.iter().enumerate() {
        let raw = record.get(col).unwrap_or("");
        if is_missing_marker(raw) {
            out.push(None);
            continue;
        }
        let v = match raw.parse::<f64>() {
            Ok(v) => v,
            Err(_) if keep_numeric => {
                debug!(column = col, row = idx, value = raw, "non-numeric cell in scenario column treated as missing");
                out.push(None);
                continue;
            }
            Err(_) => return None,
        };
        any_numeric = true;
        out.push(if v.is_finite() { Some(v) } else { None });
    }
    // An all-empty column is numeric only when there are no rows at all,
    // unless the header names a scenario year.
    if any_numeric || keep_numeric || records.is_empty() { Some(out) } else { None }
}

/// Spreadsheet and dataframe spellings of a missing cell, compared case-insensitively.
const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL",
    "NaN", "None",
];

fn is_missing_marker(s: &str) -> bool {
    s.is_empty() || MISSING_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m))
}
