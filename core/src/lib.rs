//! BreathGraph core: respiration rate (breaths per minute) from a worn
//! tri-axial accelerometer.
//!
//! Pipeline: outlier filter -> Butterworth detrend -> Savitzky–Golay smoothing ->
//! {dominant frequency, adaptive peaks} -> BPM from peak-to-peak intervals.
//! Every pass recomputes from the full retained history of a [`Session`].

pub mod bpm;
pub mod buffer;
pub mod cli;
pub mod detrend;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod outliers;
pub mod peaks;
pub mod pipeline;
pub mod session;
pub mod smoothing;
pub mod spectrum;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use error::{PipelineError, RejectReason, StorageError};
pub use models::{Axis, Estimate, InconclusiveReason, Sample, SAMPLING_RATE_HZ};
pub use pipeline::{analyze, estimate_bpm, estimate_from_window, PipelineTrace, Stage};
pub use session::{format_bpm, ChannelSink, IngestWorker, ResultSink, Session, WorkerStats};
pub use storage::{load_config, read_samples, save_config, SampleRecorder};
pub use types::{BandCfg, BreathCfg, DetrendCfg, EstimateReport, SmoothCfg, WindowPolicy};
