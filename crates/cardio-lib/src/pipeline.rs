use crate::{
    classify::BeatClassifier,
    detectors::ecg::{segment_beats, SegmenterConfig},
    error::{CardioError, Result},
    extract::{extract_series, ExtractorConfig},
    filter::{condition, FilterConfig},
    report::{synthesize, ClassifiedBeat, DiagnosticReport, ReportConfig},
    signal::{BeatWindow, Events, TimeSeries},
};
use image::RgbImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Every tunable of the request pipeline. All fields default, so a partial
/// TOML file is enough.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sampling rate assumed for numeric uploads that do not declare one (Hz).
    pub array_fs: f64,
    pub extractor: ExtractorConfig,
    pub filter: FilterConfig,
    pub segmenter: SegmenterConfig,
    pub report: ReportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            array_fs: 360.0,
            extractor: ExtractorConfig::default(),
            filter: FilterConfig::default(),
            segmenter: SegmenterConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Conditioned signal plus the beats cut from it, ready for a classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedBeats {
    pub filtered: TimeSeries,
    pub threshold: f64,
    pub peaks: Events,
    pub windows: Vec<BeatWindow>,
}

/// Stateless request pipeline; one value can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub cfg: PipelineConfig,
}

impl Pipeline {
    pub fn new(cfg: PipelineConfig) -> Self {
        Self { cfg }
    }

    /// Condition and segment without classifying.
    pub fn prepare(&self, ts: &TimeSeries) -> Result<PreparedBeats> {
        validate(ts)?;
        Ok(self.prepare_valid(ts))
    }

    fn prepare_valid(&self, ts: &TimeSeries) -> PreparedBeats {
        let filtered = condition(ts, &self.cfg.filter);
        let seg = segment_beats(&filtered, &self.cfg.segmenter);
        PreparedBeats {
            filtered,
            threshold: seg.threshold,
            peaks: seg.peaks,
            windows: seg.windows,
        }
    }

    /// Full analysis of a numeric signal. Too-short input and signals without
    /// usable beats produce sentinel reports; the classifier is not called.
    pub fn analyze_signal(
        &self,
        ts: &TimeSeries,
        classifier: &dyn BeatClassifier,
    ) -> Result<DiagnosticReport> {
        validate(ts)?;
        if ts.len() < self.cfg.segmenter.window_len {
            warn!(
                "signal has {} samples, need at least {}",
                ts.len(),
                self.cfg.segmenter.window_len
            );
            return Ok(DiagnosticReport::too_short());
        }
        let prepared = self.prepare_valid(ts);
        if prepared.windows.is_empty() {
            warn!("no beats survived detection ({} peaks)", prepared.peaks.len());
            return Ok(DiagnosticReport::no_beats());
        }
        let classified = classify_windows(&prepared.windows, classifier)?;
        Ok(synthesize(&classified, &self.cfg.report))
    }

    /// Extract a trace from `image` and analyse it at the extractor's rate.
    pub fn analyze_image(
        &self,
        image: &RgbImage,
        classifier: &dyn BeatClassifier,
    ) -> Result<DiagnosticReport> {
        let ts = extract_series(image, &self.cfg.extractor);
        debug!("image trace: {} samples at {} Hz", ts.len(), ts.fs);
        self.analyze_signal(&ts, classifier)
    }
}

/// Run `classifier` over `windows` and pair each verdict with its peak.
pub fn classify_windows(
    windows: &[BeatWindow],
    classifier: &dyn BeatClassifier,
) -> Result<Vec<ClassifiedBeat>> {
    let results = classifier.classify(windows)?;
    if results.len() != windows.len() {
        return Err(CardioError::ClassifierMismatch {
            expected: windows.len(),
            got: results.len(),
        });
    }
    Ok(windows
        .iter()
        .zip(results)
        .map(|(w, c)| ClassifiedBeat::new(w.peak_index, c))
        .collect())
}

fn validate(ts: &TimeSeries) -> Result<()> {
    if !(ts.fs.is_finite() && ts.fs > 0.0) {
        return Err(CardioError::InvalidSamplingRate(ts.fs));
    }
    if let Some(index) = ts.data.iter().position(|v| !v.is_finite()) {
        return Err(CardioError::InvalidSample { index });
    }
    Ok(())
}
