use anyhow::{Context, Result};
use std::path::Path;

/// Parse a sample series from text. Each line holds one or more samples
/// separated by commas or whitespace; `#` starts a comment and a pasted
/// array's surrounding brackets are ignored. A file with no samples yields an
/// empty series, which the pipeline reports as too short.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default();
        let fields = content
            .split(|c: char| c == ',' || c.is_whitespace() || c == '[' || c == ']')
            .filter(|f| !f.is_empty());
        for (col, field) in fields.enumerate() {
            let val: f64 = field.parse().with_context(|| {
                format!("line {} value {} is not f64: {}", idx + 1, col + 1, field)
            })?;
            out.push(val);
        }
    }
    Ok(out)
}

/// Read a sample series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// One sample per line, full precision.
pub fn format_f64_series(data: &[f64]) -> String {
    let mut out = String::with_capacity(data.len() * 12);
    for v in data {
        out.push_str(&v.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let parsed = parse_f64_series("# lead II\n0.5\n\n -1.25 \n3e-2\n").unwrap();
        assert_eq!(parsed, vec![0.5, -1.25, 0.03]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("1.0\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn accepts_pasted_arrays() {
        let parsed = parse_f64_series("[0.1, 0.2,\n 0.3 0.4] # tail\n").unwrap();
        assert_eq!(parsed, vec![0.1, 0.2, 0.3, 0.4]);
        let err = parse_f64_series("1, 2, x\n").unwrap_err();
        assert!(err.to_string().contains("line 1 value 3"));
    }

    #[test]
    fn empty_file_is_an_empty_series() {
        assert!(parse_f64_series("# no data yet\n\n").unwrap().is_empty());
    }

    #[test]
    fn format_parses_back() {
        let data = vec![0.1, -2.0, 1.0 / 3.0];
        assert_eq!(parse_f64_series(&format_f64_series(&data)).unwrap(), data);
    }
}
