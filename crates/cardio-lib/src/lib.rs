//! Turns a raw ECG array or a photographed single-lead trace into per-beat
//! windows for a classifier, and folds the classifier's verdicts into a
//! diagnostic summary.

pub mod classify;
pub mod detectors;
pub mod error;
pub mod extract;
pub mod filter;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod report;
pub mod signal;
pub mod synth;

pub use classify::*;
pub use error::{CardioError, Result};
pub use pipeline::*;
pub use report::*;
pub use signal::*;
