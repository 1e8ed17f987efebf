//! Waveform extraction from a photographed or scanned single-lead trace.
//!
//! The trace is assumed dark on a lighter background. Pixels are binarised with
//! Otsu's threshold, cleaned with a 2×2 opening, and every column is reduced to
//! the mean row of its trace pixels.

use crate::signal::{resample_linear, TimeSeries};
use image::{GrayImage, Luma, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Number of samples the extracted trace is resampled to.
    pub target_length: usize,
    /// Sampling rate assigned to the extracted trace (Hz).
    pub fs: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        // 10 s at 250 Hz
        Self {
            target_length: 2500,
            fs: 250.0,
        }
    }
}

/// Extract exactly `target_length` samples, min-max scaled to [-1, 1].
///
/// A blank image yields a flat line rather than an error.
pub fn extract(image: &RgbImage, target_length: usize) -> Vec<f64> {
    let gray = to_intensity(image);
    let threshold = otsu_threshold(&gray);
    let mask = binarize_inv(&gray, threshold);
    let cleaned = open_2x2(&mask);
    let trace = column_trace(&cleaned);
    debug!(
        "extract: {}x{} image, otsu threshold {}, {} of {} columns traced",
        image.width(),
        image.height(),
        threshold,
        traced_columns(&cleaned),
        image.width()
    );
    resample_linear(&minmax_scale(&trace), target_length)
}

/// [`extract`] wrapped as a time series at `cfg.fs`.
pub fn extract_series(image: &RgbImage, cfg: &ExtractorConfig) -> TimeSeries {
    TimeSeries {
        fs: cfg.fs,
        data: extract(image, cfg.target_length),
    }
}

/// ITU-R BT.601 luma, rounded to the nearest level.
pub fn to_intensity(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let v = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Level that maximises the between-class variance of the intensity histogram.
/// A single-level histogram has no split and returns 0.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for p in gray.pixels() {
        hist[p.0[0] as usize] += 1;
    }
    let total = gray.pixels().len() as f64;
    if total == 0.0 {
        return 0;
    }
    let mu: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum::<f64>()
        / total;

    let mut best = 0u8;
    let mut best_sigma = 0.0;
    let mut w0 = 0.0;
    let mut m0 = 0.0;
    for (level, &count) in hist.iter().enumerate() {
        let p = count as f64 / total;
        w0 += p;
        m0 += level as f64 * p;
        let w1 = 1.0 - w0;
        if w0 < f64::EPSILON || w1 < f64::EPSILON {
            continue;
        }
        let sigma = (mu * w0 - m0).powi(2) / (w0 * w1);
        if sigma > best_sigma {
            best_sigma = sigma;
            best = level as u8;
        }
    }
    best
}

/// Pixels at or below `threshold` become foreground.
pub fn binarize_inv(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > threshold {
            Luma([BACKGROUND])
        } else {
            Luma([FOREGROUND])
        }
    })
}

fn is_fg(mask: &GrayImage, x: i64, y: i64, outside: bool) -> bool {
    if x < 0 || y < 0 || x >= mask.width() as i64 || y >= mask.height() as i64 {
        return outside;
    }
    mask.get_pixel(x as u32, y as u32).0[0] == FOREGROUND
}

/// Morphological opening with a 2×2 square: a pixel survives only if some
/// fully-foreground 2×2 block covers it. Isolated specks vanish.
pub fn open_2x2(mask: &GrayImage) -> GrayImage {
    let (w, h) = mask.dimensions();
    // erosion anchors each block at its top-left pixel; the border never erodes
    let eroded = GrayImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let keep = [(0, 0), (1, 0), (0, 1), (1, 1)]
            .iter()
            .all(|&(dx, dy)| is_fg(mask, x + dx, y + dy, true));
        Luma([if keep { FOREGROUND } else { BACKGROUND }])
    });
    GrayImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let hit = [(0, 0), (-1, 0), (0, -1), (-1, -1)]
            .iter()
            .any(|&(dx, dy)| is_fg(&eroded, x + dx, y + dy, false));
        Luma([if hit { FOREGROUND } else { BACKGROUND }])
    })
}

/// One value per column: image height minus the mean foreground row, so
/// upward deflections map to larger values. Empty columns repeat the previous
/// value; leading empty columns sit at mid-height.
pub fn column_trace(mask: &GrayImage) -> Vec<f64> {
    let (w, h) = mask.dimensions();
    let mut out: Vec<f64> = Vec::with_capacity(w as usize);
    for x in 0..w {
        let (sum, count) = (0..h)
            .filter(|&y| mask.get_pixel(x, y).0[0] == FOREGROUND)
            .fold((0.0, 0usize), |(s, c), y| (s + y as f64, c + 1));
        let value = if count > 0 {
            h as f64 - sum / count as f64
        } else {
            out.last().copied().unwrap_or(h as f64 / 2.0)
        };
        out.push(value);
    }
    out
}

fn traced_columns(mask: &GrayImage) -> usize {
    (0..mask.width())
        .filter(|&x| (0..mask.height()).any(|y| mask.get_pixel(x, y).0[0] == FOREGROUND))
        .count()
}

/// Scale to [-1, 1]; a constant sequence is returned unscaled.
pub fn minmax_scale(data: &[f64]) -> Vec<f64> {
    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range == 0.0 {
        return data.to_vec();
    }
    data.iter().map(|v| 2.0 * (v - min) / range - 1.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    /// Draws a 3-pixel-thick dark polyline through `rows`, one row per column.
    fn draw_trace(img: &mut RgbImage, rows: &[u32]) {
        for (x, &row) in rows.iter().enumerate() {
            for y in row.saturating_sub(1)..=(row + 1).min(img.height() - 1) {
                img.put_pixel(x as u32, y, Rgb([20, 20, 30]));
            }
        }
    }

    #[test]
    fn output_length_is_target_regardless_of_width() {
        for (w, target) in [(37u32, 2500usize), (640, 100), (2500, 2500), (3000, 7)] {
            let mut img = blank(w, 60);
            let rows: Vec<u32> = (0..w).map(|x| 30 + ((x / 5) % 10)).collect();
            draw_trace(&mut img, &rows);
            let out = extract(&img, target);
            assert_eq!(out.len(), target);
            assert!(out.iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn upward_deflection_maps_to_higher_value() {
        let mut img = blank(100, 80);
        let mut rows = vec![60u32; 100];
        for r in rows.iter_mut().skip(45).take(10) {
            *r = 10;
        }
        draw_trace(&mut img, &rows);
        let trace = column_trace(&open_2x2(&binarize_inv(
            &to_intensity(&img),
            otsu_threshold(&to_intensity(&img)),
        )));
        assert!((trace[50] - (80.0 - 10.0)).abs() < 1e-9);
        assert!((trace[10] - (80.0 - 60.0)).abs() < 1e-9);
        let scaled = extract(&img, 100);
        assert!((scaled[50] - 1.0).abs() < 1e-9);
        assert!((scaled[10] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn blank_image_is_flat_mid_scale() {
        let img = blank(120, 40);
        let out = extract(&img, 500);
        assert_eq!(out.len(), 500);
        assert!(out.iter().all(|&v| v == 20.0));
    }

    #[test]
    fn gaps_carry_previous_column() {
        let mut mask = GrayImage::new(5, 10);
        for y in 2..4 {
            mask.put_pixel(1, y, Luma([FOREGROUND]));
            mask.put_pixel(3, y + 4, Luma([FOREGROUND]));
        }
        let trace = column_trace(&mask);
        assert_eq!(trace, vec![5.0, 7.5, 7.5, 3.5, 3.5]);
    }

    #[test]
    fn opening_removes_specks_and_keeps_thick_lines() {
        let mut mask = GrayImage::new(20, 20);
        mask.put_pixel(3, 3, Luma([FOREGROUND]));
        for x in 0..20 {
            for y in 10..12 {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let opened = open_2x2(&mask);
        assert_eq!(opened.get_pixel(3, 3).0[0], BACKGROUND);
        for x in 0..20 {
            assert_eq!(opened.get_pixel(x, 10).0[0], FOREGROUND);
            assert_eq!(opened.get_pixel(x, 11).0[0], FOREGROUND);
        }
    }

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let gray = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 3 { 30 } else { 220 }]));
        let t = otsu_threshold(&gray);
        assert!((30..220).contains(&t));
    }

    #[test]
    fn minmax_passes_constant_through() {
        assert_eq!(minmax_scale(&[4.0, 4.0]), vec![4.0, 4.0]);
        assert_eq!(minmax_scale(&[0.0, 5.0, 10.0]), vec![-1.0, 0.0, 1.0]);
    }
}
