use crate::classify::{BeatClassification, BeatLabel};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NORMAL_SINUS_RHYTHM: &str = "Normal Sinus Rhythm";
pub const OCCASIONAL_ECTOPY: &str = "Occasional Ectopic/Abnormal beats detected.";
pub const FREQUENT_ARRHYTHMIA: &str =
    "Frequent Arrhythmia Detected. Please consult a cardiologist immediately.";
pub const SIGNAL_TOO_SHORT: &str = "Error: Signal too short.";
pub const NO_CLEAR_BEATS: &str = "Could not detect any clear heartbeats.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Share of abnormal beats (percent) above which risk is High.
    pub high_risk_percent: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            high_risk_percent: 15.0,
        }
    }
}

/// A classification tied back to the peak it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedBeat {
    pub peak_index: usize,
    pub label: BeatLabel,
    pub confidence: f64,
}

impl ClassifiedBeat {
    pub fn new(peak_index: usize, c: BeatClassification) -> Self {
        Self {
            peak_index,
            label: c.label,
            confidence: c.confidence,
        }
    }
}

/// Clinician-facing summary for one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub total_beats: usize,
    pub abnormal_beats: usize,
    pub diagnosis: String,
    pub risk_level: RiskLevel,
    /// Mean beat confidence in percent, one decimal place.
    pub confidence: f64,
    /// Peak indices of abnormal beats, ascending.
    pub anomaly_indices: Vec<usize>,
}

impl DiagnosticReport {
    fn sentinel(diagnosis: &str) -> Self {
        Self {
            total_beats: 0,
            abnormal_beats: 0,
            diagnosis: diagnosis.to_string(),
            risk_level: RiskLevel::Unknown,
            confidence: 0.0,
            anomaly_indices: Vec::new(),
        }
    }

    pub fn too_short() -> Self {
        Self::sentinel(SIGNAL_TOO_SHORT)
    }

    pub fn no_beats() -> Self {
        Self::sentinel(NO_CLEAR_BEATS)
    }

    pub fn is_sentinel(&self) -> bool {
        self.risk_level == RiskLevel::Unknown
    }
}

pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Aggregate per-beat classifications into a report.
///
/// Callers are expected to route empty input to [`DiagnosticReport::no_beats`];
/// an empty slice is mapped to that sentinel here as well.
pub fn synthesize(beats: &[ClassifiedBeat], cfg: &ReportConfig) -> DiagnosticReport {
    if beats.is_empty() {
        return DiagnosticReport::no_beats();
    }
    let total = beats.len();
    let mut anomaly_indices: Vec<usize> = beats
        .iter()
        .filter(|b| b.label.is_abnormal())
        .map(|b| b.peak_index)
        .collect();
    anomaly_indices.sort_unstable();
    let abnormal = anomaly_indices.len();
    let percentage = abnormal as f64 * 100.0 / total as f64;

    let (diagnosis, risk_level) = if abnormal == 0 {
        (NORMAL_SINUS_RHYTHM, RiskLevel::Low)
    } else if percentage <= cfg.high_risk_percent {
        (OCCASIONAL_ECTOPY, RiskLevel::Medium)
    } else {
        (FREQUENT_ARRHYTHMIA, RiskLevel::High)
    };
    let confidence = round1(beats.iter().map(|b| b.confidence).sum::<f64>() / total as f64 * 100.0);
    info!(
        "report: {}/{} abnormal ({:.1}%), risk {}",
        abnormal, total, percentage, risk_level
    );

    DiagnosticReport {
        total_beats: total,
        abnormal_beats: abnormal,
        diagnosis: diagnosis.to_string(),
        risk_level,
        confidence,
        anomaly_indices,
    }
}
