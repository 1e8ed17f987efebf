use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read one numeric column (matched case-insensitively by header) from a CSV file.
pub fn read_column(path: &Path, column: &str, delimiter: u8) -> Result<Vec<f64>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_column(file, column, delimiter)
        .with_context(|| format!("reading column {} from {}", column, path.display()))
}

pub fn parse_column<R: Read>(reader: R, column: &str, delimiter: u8) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers().context("reading header")?.clone();
    let idx = locate_column(&headers, column)?;

    let mut samples = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.context("reading record")?;
        let value = record
            .get(idx)
            .ok_or_else(|| anyhow::anyhow!("row {} has no {} field", row + 1, column))?;
        let parsed = value
            .parse::<f64>()
            .with_context(|| format!("row {} is not f64: {}", row + 1, value))?;
        samples.push(parsed);
    }
    Ok(samples)
}

fn locate_column(headers: &StringRecord, requested: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.eq_ignore_ascii_case(requested))
        .ok_or_else(|| anyhow::anyhow!("missing {} column", requested))
}
