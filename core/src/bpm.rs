use crate::metrics::{mean, RoundTo};

/// Breaths per minute from peak sample indices: 60 / mean(peak-to-peak seconds).
///
/// Needs at least two peaks (one interval). Returns 0.0 when the intervals are
/// missing or degenerate; the result is never negative or non-finite.
pub fn compute_bpm(peaks: &[usize], sampling_rate_hz: f64, decimals: u32) -> f64 {
    if peaks.len() < 2 || !(sampling_rate_hz > 0.0) {
        return 0.0;
    }
    let intervals: Vec<f64> = peaks
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]) as f64 / sampling_rate_hz)
        .collect();

    match mean(&intervals) {
        Some(m) if m > 0.0 => {
            let bpm = (60.0 / m).round_to(decimals);
            if bpm.is_finite() && bpm > 0.0 { bpm } else { 0.0 }
        }
        _ => 0.0,
    }
}
