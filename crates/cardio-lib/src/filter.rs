//! Zero-phase Butterworth band-pass conditioning.
//!
//! The band-pass is a low-pass cascade followed by a high-pass cascade, each
//! realised as second-order sections designed through the bilinear transform.
//! Filtering runs forward and then backward over an odd-extended copy of the
//! input so the net phase is zero and peak positions in the output line up with
//! the input sample-for-sample.

use crate::signal::TimeSeries;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Band edges and order of the conditioning filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// High-pass edge (Hz); removes baseline wander. `<= 0` disables it.
    pub lowcut_hz: f64,
    /// Low-pass edge (Hz); removes mains and muscle noise. Ignored at or above Nyquist.
    pub highcut_hz: f64,
    /// Butterworth order of each edge.
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lowcut_hz: 0.5,
            highcut_hz: 40.0,
            order: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Lowpass,
    Highpass,
}

/// Second-order section, `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`.
///
/// Coefficients only; the delay line lives on the stack of each filtering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Biquad {
    /// Gain at z = 1.
    fn dc_gain(&self) -> f64 {
        let den = 1.0 + self.a[0] + self.a[1];
        if den.abs() < f64::EPSILON {
            return 0.0;
        }
        (self.b[0] + self.b[1] + self.b[2]) / den
    }

    /// Direct Form II transposed state that a constant input `x` would settle into.
    fn steady_state(&self, x: f64) -> [f64; 2] {
        let y = self.dc_gain() * x;
        let s1 = self.b[2] * x - self.a[1] * y;
        let s0 = self.b[1] * x - self.a[0] * y + s1;
        [s0, s1]
    }

    #[inline]
    fn step(&self, state: &mut [f64; 2], x: f64) -> f64 {
        let y = self.b[0] * x + state[0];
        state[0] = self.b[1] * x - self.a[0] * y + state[1];
        state[1] = self.b[2] * x - self.a[1] * y;
        y
    }

    /// Poles inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a[1].abs() < 1.0 && self.a[0].abs() < 1.0 + self.a[1]
    }
}

/// Butterworth band-pass as a cascade of biquads. A pure function of the
/// sampling rate and [`FilterConfig`].
#[derive(Debug, Clone)]
pub struct ButterworthBandpass {
    sections: Vec<Biquad>,
}

impl ButterworthBandpass {
    pub fn design(cfg: &FilterConfig, fs: f64) -> Self {
        let mut sections = Vec::new();
        let order = cfg.order.max(1);
        if cfg.highcut_hz > 0.0 && cfg.highcut_hz < fs * 0.5 {
            sections.extend(design_edge(order, cfg.highcut_hz, fs, Edge::Lowpass));
        }
        if cfg.lowcut_hz > 0.0 && cfg.lowcut_hz < fs * 0.5 {
            sections.extend(design_edge(order, cfg.lowcut_hz, fs, Edge::Highpass));
        }
        Self { sections }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// Single causal pass, starting each section from the steady state of `data[0]`.
    fn run(&self, data: &[f64]) -> Vec<f64> {
        let Some(&first) = data.first() else {
            return Vec::new();
        };
        let mut states = Vec::with_capacity(self.sections.len());
        let mut level = first;
        for section in &self.sections {
            states.push(section.steady_state(level));
            level *= section.dc_gain();
        }
        data.iter()
            .map(|&x| {
                self.sections
                    .iter()
                    .zip(states.iter_mut())
                    .fold(x, |acc, (section, state)| section.step(state, acc))
            })
            .collect()
    }

    /// Forward-backward application over an odd extension of the input.
    pub fn filtfilt(&self, data: &[f64]) -> Vec<f64> {
        if data.is_empty() || self.sections.is_empty() {
            return data.to_vec();
        }
        let n = data.len();
        let pad = (3 * (2 * self.sections.len() + 1)).min(n - 1);
        let extended = odd_extend(data, pad);
        let mut forward = self.run(&extended);
        forward.reverse();
        let mut backward = self.run(&forward);
        backward.reverse();
        backward[pad..pad + n].to_vec()
    }
}

/// Band-limit `ts` with a zero-phase Butterworth band-pass. Output has the same
/// length and sampling rate as the input.
pub fn condition(ts: &TimeSeries, cfg: &FilterConfig) -> TimeSeries {
    let filter = ButterworthBandpass::design(cfg, ts.fs);
    TimeSeries {
        fs: ts.fs,
        data: filter.filtfilt(&ts.data),
    }
}

fn odd_extend(data: &[f64], pad: usize) -> Vec<f64> {
    let n = data.len();
    let first = data[0];
    let last = data[n - 1];
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - data[i]));
    out.extend_from_slice(data);
    out.extend((1..=pad).map(|i| 2.0 * last - data[n - 1 - i]));
    out
}

/// Bilinear-transform frequency pre-warp.
fn prewarp(freq_hz: f64, fs: f64) -> f64 {
    2.0 * fs * (PI * freq_hz / fs).tan()
}

fn design_edge(order: usize, cutoff_hz: f64, fs: f64, edge: Edge) -> Vec<Biquad> {
    let wc = prewarp(cutoff_hz, fs);
    let k = 2.0 * fs;
    let mut sections = Vec::with_capacity(order / 2 + 1);
    // Upper-half-plane prototype poles; conjugates are implied by each biquad.
    for i in 0..order / 2 {
        let theta = PI * (2 * i + order + 1) as f64 / (2 * order) as f64;
        sections.push(bilinear_pair(wc * theta.cos(), wc * theta.sin(), k, edge));
    }
    if order % 2 == 1 {
        sections.push(bilinear_real(-wc, k, edge));
    }
    sections
}

fn bilinear_real(p: f64, k: f64, edge: Edge) -> Biquad {
    let alpha = k - p;
    let beta = k + p;
    let b = match edge {
        Edge::Lowpass => [-p / alpha, -p / alpha, 0.0],
        Edge::Highpass => [k / alpha, -k / alpha, 0.0],
    };
    Biquad {
        b,
        a: [-beta / alpha, 0.0],
    }
}

fn bilinear_pair(re: f64, im: f64, k: f64, edge: Edge) -> Biquad {
    let mag_sq = re * re + im * im;
    let k2 = k * k;
    let d = k2 - 2.0 * k * re + mag_sq;
    let num = match edge {
        Edge::Lowpass => mag_sq,
        Edge::Highpass => k2,
    };
    let b = match edge {
        Edge::Lowpass => [num / d, 2.0 * num / d, num / d],
        Edge::Highpass => [num / d, -2.0 * num / d, num / d],
    };
    Biquad {
        b,
        a: [2.0 * (mag_sq - k2) / d, (k2 + 2.0 * k * re + mag_sq) / d],
    }
}
