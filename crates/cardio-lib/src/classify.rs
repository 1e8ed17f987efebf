use crate::error::{CardioError, Result};
use crate::signal::{mean, BeatWindow};
use serde::{Deserialize, Serialize};

/// Binary beat class. Index 0 is Normal and 1 is Arrhythmia, matching the
/// output layout of the two-logit beat models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeatLabel {
    Normal,
    Arrhythmia,
}

impl BeatLabel {
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Normal),
            1 => Some(Self::Arrhythmia),
            _ => None,
        }
    }

    pub fn is_abnormal(self) -> bool {
        matches!(self, Self::Arrhythmia)
    }
}

/// Classifier verdict for one beat window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatClassification {
    pub label: BeatLabel,
    /// Probability of `label`, in [0, 1].
    pub confidence: f64,
}

impl BeatClassification {
    pub fn new(label: BeatLabel, confidence: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Softmax over `[normal, arrhythmia]` logits, then argmax.
    pub fn from_scores(logits: [f64; 2]) -> Self {
        let max = logits[0].max(logits[1]);
        let e0 = (logits[0] - max).exp();
        let e1 = (logits[1] - max).exp();
        let (p0, p1) = (e0 / (e0 + e1), e1 / (e0 + e1));
        if p1 > p0 {
            Self::new(BeatLabel::Arrhythmia, p1)
        } else {
            Self::new(BeatLabel::Normal, p0)
        }
    }
}

/// Batch beat classifier. Implementations must return exactly one
/// classification per window, in window order, and be safe to call from
/// several request threads at once.
pub trait BeatClassifier: Send + Sync {
    fn classify(&self, beats: &[BeatWindow]) -> Result<Vec<BeatClassification>>;
}

/// Rule-based fallback used when no trained model is wired in. Each beat is
/// compared against the per-sample median of the whole batch; beats that do
/// not correlate with that template are flagged. This is a morphology
/// heuristic, not a clinical classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateClassifier {
    /// Pearson correlation below which a beat is labelled Arrhythmia.
    pub min_correlation: f64,
}

impl Default for TemplateClassifier {
    fn default() -> Self {
        Self {
            min_correlation: 0.8,
        }
    }
}

impl TemplateClassifier {
    fn verdict(&self, corr: f64) -> BeatClassification {
        let cut = self.min_correlation;
        if corr >= cut {
            let span = (1.0 - cut).max(f64::EPSILON);
            BeatClassification::new(BeatLabel::Normal, 0.5 + 0.5 * (corr - cut) / span)
        } else {
            let span = (cut + 1.0).max(f64::EPSILON);
            BeatClassification::new(BeatLabel::Arrhythmia, 0.5 + 0.5 * (cut - corr) / span)
        }
    }
}

impl BeatClassifier for TemplateClassifier {
    fn classify(&self, beats: &[BeatWindow]) -> Result<Vec<BeatClassification>> {
        let Some(len) = beats.first().map(BeatWindow::len) else {
            return Ok(Vec::new());
        };
        if beats.iter().any(|b| b.len() != len) {
            return Err(CardioError::Classifier(
                "beat windows differ in length".into(),
            ));
        }
        let template = median_template(beats, len);
        Ok(beats
            .iter()
            .map(|b| self.verdict(pearson(&b.samples, &template)))
            .collect())
    }
}

fn median_template(beats: &[BeatWindow], len: usize) -> Vec<f64> {
    let mut column = Vec::with_capacity(beats.len());
    (0..len)
        .map(|i| {
            column.clear();
            column.extend(beats.iter().map(|b| b.samples[i]));
            column.sort_by(|a, b| a.total_cmp(b));
            let mid = column.len() / 2;
            if column.len() % 2 == 0 {
                0.5 * (column[mid - 1] + column[mid])
            } else {
                column[mid]
            }
        })
        .collect()
}

/// Pearson correlation; zero when either side has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma).powi(2);
        vb += (y - mb).powi(2);
    }
    let denom = (va * vb).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    cov / denom
}
