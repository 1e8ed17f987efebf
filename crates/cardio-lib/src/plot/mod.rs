use crate::signal::TimeSeries;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub color: Color,
}

impl Style {
    /// Line width rounded to whole pixels for raster backends, at least one.
    pub fn stroke_px(&self) -> u32 {
        self.width.round().max(1.0) as u32
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Discrete events drawn as circles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every series; unit box when empty.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut b = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in self.series.iter().flat_map(|s| s.points()) {
            b.0 = b.0.min(p[0]);
            b.1 = b.1.max(p[0]);
            b.2 = b.2.min(p[1]);
            b.3 = b.3.max(p[1]);
        }
        if !b.0.is_finite() {
            return (0.0, 1.0, 0.0, 1.0);
        }
        if b.1 <= b.0 {
            b.1 = b.0 + 1.0;
        }
        if b.3 <= b.2 {
            b.3 = b.2 + 1.0;
        }
        b
    }
}

/// Reduce `points` to at most `max_points` by keeping the lowest and highest
/// sample of each bucket, in time order. Narrow R-peaks survive decimation.
pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let buckets = (max_points / 2).max(1);
    let mut result = Vec::with_capacity(buckets * 2);
    for chunk in 0..buckets {
        let start = chunk * points.len() / buckets;
        let end = ((chunk + 1) * points.len() / buckets).max(start + 1);
        let bucket = &points[start..end];
        let (mut lo, mut hi) = (0, 0);
        for (i, p) in bucket.iter().enumerate() {
            if p[1] < bucket[lo][1] {
                lo = i;
            }
            if p[1] > bucket[hi][1] {
                hi = i;
            }
        }
        result.push(bucket[lo.min(hi)]);
        if lo != hi {
            result.push(bucket[lo.max(hi)]);
        }
    }
    result
}

fn markers_at(name: &str, ts: &TimeSeries, indices: &[usize], color: u32, radius: u32) -> Series {
    let dt = 1.0 / ts.fs.max(1.0);
    Series::Markers(MarkerSeries {
        name: name.into(),
        points: indices
            .iter()
            .filter_map(|&i| ts.data.get(i).map(|v| [i as f64 * dt, *v]))
            .collect(),
        radius,
        color: Color(color),
    })
}

/// Signal trace over time with detected peaks and abnormal beats overlaid.
pub fn figure_from_analysis(
    ts: &TimeSeries,
    peaks: &[usize],
    anomalies: &[usize],
    max_points: usize,
) -> Figure {
    let dt = 1.0 / ts.fs.max(1.0);
    let points: Vec<[f64; 2]> = ts
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt, *value])
        .collect();
    let mut fig = Figure::new(Some("ECG".to_string()));
    fig.x.label = Some("time (s)".into());
    fig.add_series(Series::Line(LineSeries {
        name: "filtered".into(),
        points: decimate_points(&points, max_points),
        style: Style {
            width: 1.4,
            color: Color(0x1F4E79),
        },
    }));
    fig.add_series(markers_at("peaks", ts, peaks, 0x2E8B57, 3));
    fig.add_series(markers_at("anomalies", ts, anomalies, 0xFF0033, 6));
    fig
}
