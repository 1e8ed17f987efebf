pub mod csv;
pub mod image;
pub mod json;
pub mod text;

use crate::error::CardioError;
use crate::signal::TimeSeries;
use ::image::RgbImage;
use anyhow::{Context, Result};
use std::path::Path;

/// How an uploaded file is routed into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Json,
    Text,
    Csv,
    Image,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self, CardioError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "png" | "jpg" | "jpeg" | "webp" => Ok(Self::Image),
            _ => Err(CardioError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A decoded upload.
#[derive(Debug, Clone)]
pub enum Upload {
    Signal(TimeSeries),
    Image(RgbImage),
}

/// Decode `path` by extension. `default_fs` applies to numeric files that do
/// not carry their own sampling rate; `csv_column` names the CSV lead column.
pub fn load_upload(path: &Path, default_fs: f64, csv_column: &str) -> Result<Upload> {
    let kind = InputKind::from_path(path)?;
    let upload = match kind {
        InputKind::Json => {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let up = json::parse_signal_json(&bytes)
                .with_context(|| format!("decoding {}", path.display()))?;
            Upload::Signal(TimeSeries::new(up.fs.unwrap_or(default_fs), up.signal))
        }
        InputKind::Text => Upload::Signal(TimeSeries::new(default_fs, text::read_f64_series(path)?)),
        InputKind::Csv => Upload::Signal(TimeSeries::new(
            default_fs,
            csv::read_column(path, csv_column, b',')?,
        )),
        InputKind::Image => {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            Upload::Image(
                image::decode_rgb(&bytes).with_context(|| format!("decoding {}", path.display()))?,
            )
        }
    };
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn routes_by_extension() {
        let kind = |p: &str| InputKind::from_path(Path::new(p));
        assert_eq!(kind("ecg.json").unwrap(), InputKind::Json);
        assert_eq!(kind("scan.JPG").unwrap(), InputKind::Image);
        assert_eq!(kind("photo.webp").unwrap(), InputKind::Image);
        assert_eq!(kind("lead.csv").unwrap(), InputKind::Csv);
        assert!(matches!(
            kind("trace.pdf"),
            Err(CardioError::UnsupportedFormat(_))
        ));
        assert!(kind("noext").is_err());
        assert!(matches!(
            kind("scan.bmp"),
            Err(CardioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn json_rate_overrides_default() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace")
            .join("test_data/short_signal.json");
        match load_upload(&path, 360.0, "ecg").unwrap() {
            Upload::Signal(ts) => {
                assert_eq!(ts.fs, 250.0);
                assert_eq!(ts.len(), 12);
            }
            Upload::Image(_) => panic!("expected a signal"),
        }
    }
}
