use serde::{Deserialize, Serialize};

/// Uniformly sampled single-lead trace. Raw and filtered signals share this type;
/// conditioning always produces a new value rather than mutating one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn new(fs: f64, data: Vec<f64>) -> Self {
        Self { fs, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// Detected peak positions (sample indices), strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// One z-scored, fixed-length slice of a filtered signal centred on a peak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatWindow {
    /// Peak position in the coordinates of the originating signal.
    pub peak_index: usize,
    pub samples: Vec<f64>,
}

impl BeatWindow {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by `n`).
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    (data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64).sqrt()
}

/// Linear interpolation of `data` onto `target_len` points spread evenly over
/// the same normalised [0, 1] position axis.
pub fn resample_linear(data: &[f64], target_len: usize) -> Vec<f64> {
    if target_len == 0 || data.is_empty() {
        return vec![0.0; target_len];
    }
    if data.len() == 1 {
        return vec![data[0]; target_len];
    }
    if target_len == 1 {
        return vec![data[0]];
    }
    let last = (data.len() - 1) as f64;
    let step = 1.0 / (target_len - 1) as f64;
    (0..target_len)
        .map(|i| {
            let pos = (i as f64 * step * last).min(last);
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(data.len() - 1);
            let frac = pos - lo as f64;
            data[lo] + (data[hi] - data[lo]) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_hits_target_length_and_endpoints() {
        let data = [0.0, 1.0, 4.0, 9.0];
        let out = resample_linear(&data, 7);
        assert_eq!(out.len(), 7);
        assert!((out[0] - 0.0).abs() < 1e-12);
        assert!((out[6] - 9.0).abs() < 1e-12);
        assert!((out[3] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn resample_is_idempotent_at_fixed_target() {
        let data: Vec<f64> = (0..913).map(|i| (i as f64 * 0.07).sin()).collect();
        let once = resample_linear(&data, 2500);
        let twice = resample_linear(&once, 2500);
        assert_eq!(twice.len(), 2500);
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn std_dev_of_constant_is_zero() {
        assert_eq!(std_dev(&[3.0; 12]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
    }
}
