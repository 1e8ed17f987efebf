use crate::signal::{mean, std_dev, BeatWindow, Events, TimeSeries};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configurable parameters for peak detection and beat windowing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Number of standard deviations above the mean a peak must reach.
    pub threshold_k: f64,
    /// Minimum distance between accepted peaks (seconds).
    pub min_distance_s: f64,
    /// Beat window length in samples, centred on the peak.
    pub window_len: usize,
    /// Added to each window's standard deviation before dividing.
    pub epsilon: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            threshold_k: 0.8,
            min_distance_s: 0.4,
            window_len: 360,
            epsilon: 1e-8,
        }
    }
}

impl SegmenterConfig {
    pub fn min_distance_samples(&self, fs: f64) -> usize {
        ((self.min_distance_s * fs).ceil() as usize).max(1)
    }
}

/// Peak set and windows produced for one filtered signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segmentation {
    pub threshold: f64,
    pub peaks: Events,
    pub windows: Vec<BeatWindow>,
}

/// Amplitude threshold derived from the signal's own statistics.
pub fn adaptive_threshold(data: &[f64], k: f64) -> f64 {
    mean(data) + k * std_dev(data)
}

/// Local maxima of `data`. A flat-topped maximum reports the middle of its plateau.
pub fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut out = Vec::new();
    if data.len() < 3 {
        return out;
    }
    let mut i = 1;
    while i < data.len() - 1 {
        if data[i - 1] < data[i] {
            let mut ahead = i + 1;
            while ahead < data.len() - 1 && data[ahead] == data[i] {
                ahead += 1;
            }
            if data[ahead] < data[i] {
                out.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    out
}

/// Detect R-peaks above the adaptive threshold, accepting candidates greedily
/// left to right and skipping any that fall inside the refractory distance of
/// the last accepted peak.
pub fn detect_r_peaks(ts: &TimeSeries, cfg: &SegmenterConfig) -> Events {
    let threshold = adaptive_threshold(&ts.data, cfg.threshold_k);
    Events::from_indices(pick_peaks(&ts.data, threshold, cfg.min_distance_samples(ts.fs)))
}

fn pick_peaks(data: &[f64], threshold: f64, min_distance: usize) -> Vec<usize> {
    let mut peaks: Vec<usize> = Vec::new();
    for idx in local_maxima(data) {
        if data[idx] <= threshold {
            continue;
        }
        match peaks.last() {
            Some(&last) if idx - last < min_distance => {}
            _ => peaks.push(idx),
        }
    }
    peaks
}

/// Slice a z-scored window of `cfg.window_len` samples around each peak.
/// Peaks whose window would leave the signal are dropped.
pub fn extract_windows(ts: &TimeSeries, peaks: &Events, cfg: &SegmenterConfig) -> Vec<BeatWindow> {
    let half = cfg.window_len / 2;
    let mut windows = Vec::with_capacity(peaks.len());
    for &peak in &peaks.indices {
        let Some(left) = peak.checked_sub(half) else {
            continue;
        };
        let right = left + cfg.window_len;
        if right >= ts.len() {
            continue;
        }
        windows.push(BeatWindow {
            peak_index: peak,
            samples: zscore(&ts.data[left..right], cfg.epsilon),
        });
    }
    windows
}

/// Subtract the mean and divide by `std + epsilon`.
pub fn zscore(segment: &[f64], epsilon: f64) -> Vec<f64> {
    let m = mean(segment);
    let sd = std_dev(segment) + epsilon;
    segment.iter().map(|x| (x - m) / sd).collect()
}

/// Peak detection followed by windowing, in peak time order.
pub fn segment_beats(ts: &TimeSeries, cfg: &SegmenterConfig) -> Segmentation {
    let threshold = adaptive_threshold(&ts.data, cfg.threshold_k);
    let peaks = Events::from_indices(pick_peaks(
        &ts.data,
        threshold,
        cfg.min_distance_samples(ts.fs),
    ));
    let windows = extract_windows(ts, &peaks, cfg);
    debug!(
        "segmenter: threshold {:.4}, {} peaks, {} windows ({} dropped at edges)",
        threshold,
        peaks.len(),
        windows.len(),
        peaks.len() - windows.len()
    );
    Segmentation {
        threshold,
        peaks,
        windows,
    }
}
