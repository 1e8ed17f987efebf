use crate::error::{CardioError, Result};
use serde::{Deserialize, Serialize};

/// Numeric upload: `{"signal": [...], "fs": 360}`; `fs` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalUpload {
    pub signal: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<f64>,
}

#[derive(Deserialize)]
struct RawUpload {
    signal: Option<Vec<f64>>,
    #[serde(default)]
    fs: Option<f64>,
}

pub fn parse_signal_json(bytes: &[u8]) -> Result<SignalUpload> {
    let raw: RawUpload = serde_json::from_slice(bytes)?;
    let signal = raw.signal.ok_or(CardioError::MissingSignal)?;
    if let Some(fs) = raw.fs {
        if !(fs.is_finite() && fs > 0.0) {
            return Err(CardioError::InvalidSamplingRate(fs));
        }
    }
    Ok(SignalUpload { signal, fs: raw.fs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signal_and_rate() {
        let up = parse_signal_json(br#"{"signal": [0.1, -0.2, 3], "fs": 250}"#).unwrap();
        assert_eq!(up.signal, vec![0.1, -0.2, 3.0]);
        assert_eq!(up.fs, Some(250.0));
    }

    #[test]
    fn rate_is_optional() {
        let up = parse_signal_json(br#"{"signal": [1.0]}"#).unwrap();
        assert!(up.fs.is_none());
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = parse_signal_json(br#"{"samples": [1.0]}"#).unwrap_err();
        assert!(matches!(err, CardioError::MissingSignal));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_signal_json(b"{\"signal\": [1.0, \"x\"]}"),
            Err(CardioError::Json(_))
        ));
    }

    #[test]
    fn empty_array_is_a_valid_upload() {
        // Too short to analyse, but well formed.
        let up = parse_signal_json(br#"{"signal": []}"#).unwrap();
        assert!(up.signal.is_empty());
    }
}
