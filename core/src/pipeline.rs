// core/src/pipeline.rs
// Outlier filter -> detrend -> smooth -> {frequency, peaks} -> BPM.
use serde::Serialize;

use crate::bpm::compute_bpm;
use crate::detrend::detrend;
use crate::error::PipelineError;
use crate::metrics::std_dev;
use crate::models::{Estimate, InconclusiveReason, Sample};
use crate::outliers::reject_outliers;
use crate::peaks::detect_peaks_with;
use crate::smoothing::smooth;
use crate::spectrum::dominant_frequency;
use crate::telemetry;
use crate::types::BreathCfg;

/// Pipeline states. `BpmComputed` and `Inconclusive` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Collecting,
    Filtering,
    Detrending,
    Smoothing,
    FrequencyEstimation,
    PeakDetection,
    BpmComputed,
    Inconclusive,
}

/// What one pass saw on its way to the estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineTrace {
    pub estimate: Estimate,
    /// Stage at which the pass stopped (or the last stage for a measurement).
    pub stopped_at: Stage,
    pub window_len: usize,
    pub retained: usize,
    pub dominant_hz: Option<f64>,
    pub peaks: Vec<usize>,
}

impl PipelineTrace {
    fn inconclusive(reason: InconclusiveReason, stopped_at: Stage, window_len: usize) -> Self {
        Self {
            estimate: Estimate::Inconclusive(reason),
            stopped_at,
            window_len,
            retained: 0,
            dominant_hz: None,
            peaks: Vec::new(),
        }
    }
}

/// Single-axis signal window for the configured policy. Never longer than `samples`.
pub fn extract_window(samples: &[Sample], cfg: &BreathCfg) -> Vec<f64> {
    samples[cfg.window.range(samples.len())]
        .iter()
        .map(|s| s.axis(cfg.axis))
        .collect()
}

/// Runs the estimation state machine over one signal window.
///
/// Data-quality problems end in `Estimate::Inconclusive`; only `PipelineError::Numeric`
/// comes back as an error.
pub fn estimate_from_window(window: &[f64], cfg: &BreathCfg) -> Result<PipelineTrace, PipelineError> {
    let fs = cfg.sampling_rate_hz();
    let n = window.len();

    // 1) Filtering: z-score outliers, then the hard sample floor
    let filtered = reject_outliers(window, cfg.z_threshold);
    if filtered.len() < cfg.min_samples {
        log::debug!("pipeline: {} of {} samples retained, need {}", filtered.len(), n, cfg.min_samples);
        return Ok(PipelineTrace::inconclusive(InconclusiveReason::InsufficientSamples, Stage::Filtering, n));
    }
    let retained = filtered.len();

    // 2) Detrending
    let detrended = detrend(&filtered, &cfg.detrend);
    let spread = std_dev(&detrended).unwrap_or(0.0);
    if !(spread > 1e-12) {
        log::debug!("pipeline: flat signal after detrending");
        let mut trace = PipelineTrace::inconclusive(InconclusiveReason::DegenerateSignal, Stage::Detrending, n);
        trace.retained = retained;
        return Ok(trace);
    }

    // 3) Smoothing (normalize + Savitzky-Golay)
    let smoothed = match smooth(&detrended, &cfg.smooth) {
        Ok(s) => s,
        Err(PipelineError::InsufficientSamples { .. }) => {
            let mut trace =
                PipelineTrace::inconclusive(InconclusiveReason::InsufficientSamples, Stage::Smoothing, n);
            trace.retained = retained;
            return Ok(trace);
        }
        Err(e) => return Err(e),
    };

    // 4) Frequency estimation -> expected breath period
    let dominant_hz = dominant_frequency(&smoothed, fs, &cfg.band);
    let expected_period_s = 1.0 / dominant_hz;

    // 5) Peak detection
    let peaks = match detect_peaks_with(&smoothed, expected_period_s, fs, cfg.peak_height_factor) {
        Ok(p) => p,
        Err(PipelineError::InsufficientPeaks { found }) => {
            log::debug!("pipeline: {} peak(s) found, need 2", found);
            return Ok(PipelineTrace {
                estimate: Estimate::Inconclusive(InconclusiveReason::InsufficientPeaks),
                stopped_at: Stage::PeakDetection,
                window_len: n,
                retained,
                dominant_hz: Some(dominant_hz),
                peaks: Vec::new(),
            });
        }
        Err(e) => return Err(e),
    };

    // 6) BPM
    let bpm = compute_bpm(&peaks, fs, cfg.bpm_decimals);
    let (estimate, stopped_at) = if bpm > 0.0 {
        (Estimate::Measured(bpm), Stage::BpmComputed)
    } else {
        (Estimate::Inconclusive(InconclusiveReason::InsufficientPeaks), Stage::Inconclusive)
    };

    Ok(PipelineTrace { estimate, stopped_at, window_len: n, retained, dominant_hz: Some(dominant_hz), peaks })
}

/// Estimate over a sample history. `Ok(None)` for an empty history.
pub fn analyze(samples: &[Sample], cfg: &BreathCfg) -> Result<Option<PipelineTrace>, PipelineError> {
    if samples.is_empty() {
        return Ok(None);
    }
    let window = extract_window(samples, cfg);
    let trace = estimate_from_window(&window, cfg)?;
    telemetry::record_estimate(&trace.estimate);
    Ok(Some(trace))
}

/// Convenience wrapper returning just the estimate.
pub fn estimate_bpm(samples: &[Sample], cfg: &BreathCfg) -> Result<Option<Estimate>, PipelineError> {
    Ok(analyze(samples, cfg)?.map(|t| t.estimate))
}
