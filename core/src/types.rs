use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Axis, SAMPLING_RATE_HZ};

/// Which part of the retained history feeds an estimation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Whole session history (re-processed on every call).
    FullHistory,
    /// ±half_width samples around the midpoint of the history.
    Centered { half_width: usize },
    /// Last `len` samples.
    Recent { len: usize },
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy::FullHistory
    }
}

impl WindowPolicy {
    /// Index range into a history of `n` samples. Never longer than `n`.
    pub fn range(&self, n: usize) -> std::ops::Range<usize> {
        match *self {
            WindowPolicy::FullHistory => 0..n,
            WindowPolicy::Centered { half_width } => {
                let mid = n / 2;
                mid.saturating_sub(half_width)..mid.saturating_add(half_width).min(n)
            }
            WindowPolicy::Recent { len } => n.saturating_sub(len)..n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetrendCfg {
    pub cutoff_hz: f64,
    pub sampling_rate_hz: f64,
    pub order: usize,
}

impl Default for DetrendCfg {
    fn default() -> Self {
        Self { cutoff_hz: 0.01, sampling_rate_hz: SAMPLING_RATE_HZ, order: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothCfg {
    pub window_length: usize,
    pub polyorder: usize,
    /// Min-max rescale to [0, 1] before smoothing.
    pub normalize: bool,
}

impl Default for SmoothCfg {
    fn default() -> Self {
        Self { window_length: 30, polyorder: 3, normalize: true }
    }
}

/// Respiration band in Hz (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandCfg {
    pub low_hz: f64,
    pub high_hz: f64,
    /// Returned when no spectral bin falls inside the band.
    pub fallback_hz: f64,
}

impl Default for BandCfg {
    fn default() -> Self {
        Self { low_hz: 0.2, high_hz: 0.5, fallback_hz: 0.2 }
    }
}

/// Full pipeline configuration. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathCfg {
    pub axis: Axis,
    pub window: WindowPolicy,
    /// Hard floor after outlier rejection.
    pub min_samples: usize,
    /// |z| must be strictly below this to keep a sample.
    pub z_threshold: f64,
    pub detrend: DetrendCfg,
    pub smooth: SmoothCfg,
    pub band: BandCfg,
    /// Peak height threshold = factor × std(window).
    pub peak_height_factor: f64,
    pub bpm_decimals: u32,
    /// Bounded ingestion queue size.
    pub channel_capacity: usize,
}

impl Default for BreathCfg {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            window: WindowPolicy::FullHistory,
            min_samples: 10,
            z_threshold: 3.0,
            detrend: DetrendCfg::default(),
            smooth: SmoothCfg::default(),
            band: BandCfg::default(),
            peak_height_factor: 1.5,
            bpm_decimals: 2,
            channel_capacity: 256,
        }
    }
}

impl BreathCfg {
    /// Sampling rate shared by every stage.
    pub fn sampling_rate_hz(&self) -> f64 {
        self.detrend.sampling_rate_hz
    }
}

/// Serializable summary of one estimation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateReport {
    pub bpm: Option<f64>,
    pub status: String,
    pub samples: usize,
    pub retained: usize,
    pub dominant_hz: Option<f64>,
    pub peaks: Vec<usize>,
    pub computed_at: DateTime<Utc>,
}
