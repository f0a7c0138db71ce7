use serde::{Deserialize, Serialize};

/// Fixed sampling rate of the worn sensor (Hz).
pub const SAMPLING_RATE_HZ: f64 = 11.0;

/// One accelerometer reading. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Carried through, never used in estimation.
    pub timestamp: Option<String>,
    pub user_id: Option<String>,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, timestamp: None, user_id: None }
    }

    pub fn with_meta(mut self, timestamp: Option<String>, user_id: Option<String>) -> Self {
        self.timestamp = timestamp;
        self.user_id = user_id;
        self
    }

    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

/// Why a pipeline run ended without a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconclusiveReason {
    InsufficientSamples,
    DegenerateSignal,
    InsufficientPeaks,
}

impl InconclusiveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InconclusiveReason::InsufficientSamples => "insufficient_samples",
            InconclusiveReason::DegenerateSignal => "degenerate_signal",
            InconclusiveReason::InsufficientPeaks => "insufficient_peaks",
        }
    }
}

/// Result of one estimation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    /// Finite, positive breaths per minute.
    Measured(f64),
    /// Sentinel 0: not enough (or not clean enough) data.
    Inconclusive(InconclusiveReason),
}

impl Estimate {
    /// BPM value as published downstream (0.0 for inconclusive).
    pub fn bpm(&self) -> f64 {
        match self {
            Estimate::Measured(v) => *v,
            Estimate::Inconclusive(_) => 0.0,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Estimate::Measured(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Estimate::Measured(_) => "measured",
            Estimate::Inconclusive(r) => r.as_str(),
        }
    }
}
