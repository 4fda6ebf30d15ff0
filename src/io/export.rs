//! Exports: plotted chart series to CSV and raw file downloads.
//!
//! Chart exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. Downloads copy the source bytes unmodified.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::chart::ChartSpec;
use crate::domain::DataFile;
use crate::error::AppError;

/// Write every plotted series of a chart to a CSV file.
///
/// Long format: one row per point, `series,x,y,lower,upper`; band rows carry
/// `lower`/`upper` and leave `y` empty.
pub fn write_chart_csv(path: &Path, chart: &ChartSpec) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_chart_records(file, chart)
}

pub fn write_chart_records<W: Write>(writer: W, chart: &ChartSpec) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write export CSV: {e}"));

    out.write_record(["series", "x", "y", "lower", "upper"]).map_err(write_err)?;

    for s in &chart.series {
        for &(x, y) in &s.points {
            out.write_record([s.label.as_str(), x.to_string().as_str(), y.to_string().as_str(), "", ""])
                .map_err(write_err)?;
        }
    }
    if let Some(band) = &chart.band {
        for &(x, lo, hi) in &band.points {
            out.write_record([
                band.label.as_str(),
                x.to_string().as_str(),
                "",
                lo.to_string().as_str(),
                hi.to_string().as_str(),
            ])
                .map_err(write_err)?;
        }
    }

    out.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Stream a source file's bytes to `dest` unmodified. Returns the byte count.
pub fn copy_raw<W: Write>(file: &DataFile, dest: &mut W) -> Result<u64, AppError> {
    let mut src = File::open(&file.path)
        .map_err(|e| AppError::new(4, format!("Failed to open '{}': {e}", file.path.display())))?;
    io::copy(&mut src, dest).map_err(|e| AppError::new(4, format!("Failed to copy '{}': {e}", file.file_name)))
}

/// Save a copy of `file` under `dir` (created if needed), keeping its name.
///
/// `data_root` is the portfolio root; destinations inside it are refused.
pub fn save_copy(file: &DataFile, dir: &Path, data_root: &Path) -> Result<PathBuf, AppError> {
    let dest_path = dir.join(&file.file_name);
    ensure_outside_dataset(&dest_path, file, data_root)?;
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", dir.display())))?;
    let mut dest = File::create(&dest_path)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", dest_path.display())))?;
    copy_raw(file, &mut dest)?;
    Ok(dest_path)
}

/// Refuse destinations that are the source file or lie under the data root.
///
/// Must run before the destination is opened: `File::create` truncates.
pub fn ensure_outside_dataset(dest: &Path, file: &DataFile, data_root: &Path) -> Result<(), AppError> {
    let dest = resolve_lenient(dest);
    if dest == resolve_lenient(&file.path) || dest.starts_with(resolve_lenient(data_root)) {
        return Err(AppError::new(
            4,
            format!(
                "Refusing to write '{}': destination is inside the portfolio data directory",
                dest.display()
            ),
        ));
    }
    Ok(())
}

/// Canonicalize the longest existing ancestor and re-append the rest,
/// resolving `.` and `..` in the part that does not exist yet.
fn resolve_lenient(path: &Path) -> PathBuf {
    let mut components = path.components();
    let mut existing = path.to_path_buf();
    let mut rest: Vec<Component<'_>> = Vec::new();
    loop {
        if let Ok(mut base) = existing.canonicalize() {
            for part in rest.iter().rev() {
                match part {
                    Component::ParentDir => {
                        base.pop();
                    }
                    Component::CurDir => {}
                    other => base.push(other.as_os_str()),
                }
            }
            return base;
        }
        let Some(component) = components.next_back() else {
            return path.to_path_buf();
        };
        rest.push(component);
        existing.pop();
        if existing.as_os_str().is_empty() {
            existing.push(".");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BandSeries, Series, SeriesStyle};
    use crate::domain::{ContentKind, MetricCategory, Resolution};

    #[test]
    fn chart_export_has_series_and_band_rows() {
        let chart = ChartSpec {
            title: "t".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            x_ticks: Vec::new(),
            series: vec![Series::new("Mean", SeriesStyle::Line, vec![(1.0, 2.5), (2.0, 3.0)])],
            band: Some(BandSeries {
                label: "P5-P95".to_string(),
                points: vec![(1.0, 1.0, 4.0)],
            }),
            notes: Vec::new(),
        };
        let mut buf = Vec::new();
        write_chart_records(&mut buf, &chart).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "series,x,y,lower,upper\nMean,1,2.5,,\nMean,2,3,,\nP5-P95,1,,1,4\n");
    }

    fn data_file(path: PathBuf) -> DataFile {
        DataFile {
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            path,
            metric: MetricCategory::Price,
            resolution: Resolution::Monthly,
            kind: ContentKind::Stats,
            compressed: false,
        }
    }

    #[test]
    fn download_copies_bytes_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("portfolio");
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("Acme_notes.csv");
        let bytes = b"\xef\xbb\xbfa,b\r\n1,2\r\n";
        std::fs::write(&path, bytes).unwrap();
        let file = data_file(path);

        let mut out = Vec::new();
        assert_eq!(copy_raw(&file, &mut out).unwrap(), bytes.len() as u64);
        assert_eq!(out, bytes);

        let saved = save_copy(&file, &dir.path().join("downloads"), &root).unwrap();
        assert_eq!(std::fs::read(saved).unwrap(), bytes);
    }

    #[test]
    fn save_copy_into_data_directory_is_refused_and_source_kept() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("portfolio");
        let price_dir = root.join("Acme/Price");
        std::fs::create_dir_all(&price_dir).unwrap();
        let path = price_dir.join("Acme_price_monthly_stats.csv");
        std::fs::write(&path, "month,mean\n1,2\n").unwrap();
        let file = data_file(path.clone());

        let err = save_copy(&file, &price_dir, &root).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "month,mean\n1,2\n");

        // Another folder under the root is refused too and never created.
        let nested = root.join("Acme/exports");
        assert!(save_copy(&file, &nested, &root).is_err());
        assert!(!nested.exists());

        let sneaky = dir.path().join("downloads/../portfolio/Acme/Price");
        assert_eq!(save_copy(&file, &sneaky, &root).unwrap_err().exit_code(), 4);
    }

    #[test]
    fn source_path_is_refused_even_outside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Acme_price_monthly_stats.csv");
        std::fs::write(&path, "month,mean\n1,2\n").unwrap();
        let file = data_file(path.clone());

        let other_root = dir.path().join("elsewhere");
        assert!(ensure_outside_dataset(&path, &file, &other_root).is_err());
        assert!(ensure_outside_dataset(&dir.path().join("copy.csv"), &file, &other_root).is_ok());
    }
}
