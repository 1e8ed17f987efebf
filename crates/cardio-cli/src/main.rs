use anyhow::{Context, Result};
use cardio_lib::{
    classify::TemplateClassifier,
    extract::extract,
    io::{load_upload, text as text_io, Upload},
    pipeline::{classify_windows, Pipeline, PipelineConfig},
    plot::{figure_from_analysis, Figure, Series},
    report::{synthesize, ClassifiedBeat},
    synth::spike_train,
};
use clap::{Parser, Subcommand};
use log::info;
use plotters::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "cardio",
    version,
    about = "Single-lead ECG beat extraction and rhythm summary"
)]
struct Cli {
    /// TOML file overriding pipeline defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a JSON/text/CSV signal or an ECG image and print the report
    Analyze {
        #[arg(long)]
        input: PathBuf,
        /// Sampling rate for numeric input without its own rate
        #[arg(long)]
        fs: Option<f64>,
        /// CSV column holding the lead
        #[arg(long, default_value = "ecg")]
        column: String,
        /// Correlation with the median beat below which a beat is flagged
        #[arg(long, default_value_t = 0.8)]
        min_correlation: f64,
    },
    /// Extract a waveform from an image and print one sample per line
    ExtractWaveform {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        target_length: Option<usize>,
    },
    /// Filter, detect peaks and print the normalised beat windows as JSON
    FindBeats {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        fs: Option<f64>,
        #[arg(long, default_value = "ecg")]
        column: String,
    },
    /// Build a report from externally classified beats (JSON list)
    Report {
        #[arg(long)]
        input: PathBuf,
    },
    /// Emit a synthetic signal as {"signal": [...], "fs": ...}
    Simulate {
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        #[arg(long, default_value_t = 10.0)]
        duration_s: f64,
        #[arg(long, default_value_t = 1.0)]
        period_s: f64,
        #[arg(long, default_value_t = 0.01)]
        noise: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Render the filtered signal with peaks and flagged beats to a PNG
    Plot {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        fs: Option<f64>,
        #[arg(long, default_value = "ecg")]
        column: String,
        #[arg(long, default_value_t = 0.8)]
        min_correlation: f64,
    },
}

#[derive(Serialize)]
struct BeatsOutput {
    fs: f64,
    threshold: f64,
    peaks: Vec<usize>,
    windows: Vec<cardio_lib::signal::BeatWindow>,
}

#[derive(Serialize)]
struct SimulatedSignal {
    fs: f64,
    signal: Vec<f64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze {
            input,
            fs,
            column,
            min_correlation,
        } => cmd_analyze(cfg, &input, fs, &column, min_correlation)?,
        Commands::ExtractWaveform {
            input,
            target_length,
        } => cmd_extract_waveform(cfg, &input, target_length)?,
        Commands::FindBeats { input, fs, column } => cmd_find_beats(cfg, &input, fs, &column)?,
        Commands::Report { input } => cmd_report(cfg, &input)?,
        Commands::Simulate {
            fs,
            duration_s,
            period_s,
            noise,
            seed,
        } => cmd_simulate(fs, duration_s, period_s, noise, seed)?,
        Commands::Plot {
            input,
            out,
            fs,
            column,
            min_correlation,
        } => cmd_plot(cfg, &input, &out, fs, &column, min_correlation)?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let cfg = toml::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?;
            info!("loaded pipeline config from {}", path.display());
            Ok(cfg)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Decode `input`; images are reduced to a trace at the extractor's rate.
fn load_signal(
    cfg: &PipelineConfig,
    input: &Path,
    fs: Option<f64>,
    column: &str,
) -> Result<cardio_lib::signal::TimeSeries> {
    match load_upload(input, fs.unwrap_or(cfg.array_fs), column)? {
        Upload::Signal(ts) => Ok(ts),
        Upload::Image(img) => Ok(cardio_lib::extract::extract_series(&img, &cfg.extractor)),
    }
}

fn cmd_analyze(
    cfg: PipelineConfig,
    input: &Path,
    fs: Option<f64>,
    column: &str,
    min_correlation: f64,
) -> Result<()> {
    let ts = load_signal(&cfg, input, fs, column)?;
    let classifier = TemplateClassifier { min_correlation };
    let report = Pipeline::new(cfg).analyze_signal(&ts, &classifier)?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_extract_waveform(
    cfg: PipelineConfig,
    input: &Path,
    target_length: Option<usize>,
) -> Result<()> {
    let img = match load_upload(input, cfg.array_fs, "ecg")? {
        Upload::Image(img) => img,
        Upload::Signal(_) => anyhow::bail!("{} is not an image", input.display()),
    };
    let samples = extract(&img, target_length.unwrap_or(cfg.extractor.target_length));
    print!("{}", text_io::format_f64_series(&samples));
    Ok(())
}

fn cmd_find_beats(cfg: PipelineConfig, input: &Path, fs: Option<f64>, column: &str) -> Result<()> {
    let ts = load_signal(&cfg, input, fs, column)?;
    let prepared = Pipeline::new(cfg).prepare(&ts)?;
    let out = BeatsOutput {
        fs: prepared.filtered.fs,
        threshold: prepared.threshold,
        peaks: prepared.peaks.indices,
        windows: prepared.windows,
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_report(cfg: PipelineConfig, input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let beats: Vec<ClassifiedBeat> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a list of classified beats", input.display()))?;
    let report = synthesize(&beats, &cfg.report);
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_simulate(fs: f64, duration_s: f64, period_s: f64, noise: f64, seed: u64) -> Result<()> {
    if !(fs > 0.0 && period_s > 0.0) {
        anyhow::bail!("fs and period must be positive");
    }
    let ts = spike_train(fs, duration_s, period_s, 0.22 * period_s, noise, seed);
    let out = SimulatedSignal {
        fs: ts.fs,
        signal: ts.data,
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_plot(
    cfg: PipelineConfig,
    input: &Path,
    out: &Path,
    fs: Option<f64>,
    column: &str,
    min_correlation: f64,
) -> Result<()> {
    let ts = load_signal(&cfg, input, fs, column)?;
    let prepared = Pipeline::new(cfg).prepare(&ts)?;
    let classifier = TemplateClassifier { min_correlation };
    let beats = classify_windows(&prepared.windows, &classifier)?;
    let report = synthesize(&beats, &cfg.report);
    info!("{}: {} ({} beats)", input.display(), report.diagnosis, report.total_beats);
    let fig = figure_from_analysis(
        &prepared.filtered,
        &prepared.peaks.indices,
        &report.anomaly_indices,
        4096,
    );
    draw_plotters_figure(out, &fig)?;
    Ok(())
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (1200, 400));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (x_min, x_max, y_min, y_max) = fig.bounds();
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    let mut mesh = chart.configure_mesh();
    if let Some(label) = &fig.x.label {
        mesh.x_desc(label.as_str());
    }
    mesh.draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    RGBColor(r, g, b).stroke_width(line.style.stroke_px()),
                ))?;
            }
            Series::Markers(markers) => {
                let (r, g, b) = markers.color.rgb();
                let color = RGBColor(r, g, b);
                chart.draw_series(
                    markers
                        .points
                        .iter()
                        .map(|p| Circle::new((p[0], p[1]), markers.radius, color.filled())),
                )?;
            }
        }
    }
    root.present()?;
    Ok(())
}
