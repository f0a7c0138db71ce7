use ordered_float::OrderedFloat;

use crate::error::PipelineError;
use crate::metrics::std_dev;

/// Default multiplier for the adaptive height threshold.
pub const DEFAULT_HEIGHT_FACTOR: f64 = 1.5;

/// Local maxima, endpoints excluded. A flat top resolves to its middle sample.
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }
    let last = n - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Drops peaks closer than `distance` samples to a taller one.
fn enforce_spacing(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }
    let mut keep = vec![true; peaks.len()];
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by_key(|&k| std::cmp::Reverse(OrderedFloat(x[peaks[k]])));

    for j in order {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < peaks.len() && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks.iter().zip(keep).filter_map(|(&p, kept)| kept.then_some(p)).collect()
}

/// Share of the expected period that two kept peaks must be apart.
pub const SPACING_FRACTION: f64 = 0.75;

/// Minimum spacing in whole samples for one expected breath period.
///
/// `floor(0.75 × fs × period) - 1`, at least 1: tolerates peaks that land a sample
/// early and a period read off a coarse spectral bin.
pub fn min_spacing(expected_period_s: f64, sampling_rate_hz: f64) -> usize {
    let d = (sampling_rate_hz * expected_period_s * SPACING_FRACTION).floor() - 1.0;
    if d.is_finite() && d >= 1.0 { d as usize } else { 1 }
}

pub fn detect_peaks(window: &[f64], expected_period_s: f64, sampling_rate_hz: f64) -> Result<Vec<usize>, PipelineError> {
    detect_peaks_with(window, expected_period_s, sampling_rate_hz, DEFAULT_HEIGHT_FACTOR)
}

/// Peaks at least `height_factor × std(window)` high and `min_spacing` samples apart.
pub fn detect_peaks_with(
    window: &[f64],
    expected_period_s: f64,
    sampling_rate_hz: f64,
    height_factor: f64,
) -> Result<Vec<usize>, PipelineError> {
    let threshold = height_factor * std_dev(window).unwrap_or(0.0);
    let distance = min_spacing(expected_period_s, sampling_rate_hz);

    let candidates: Vec<usize> = local_maxima(window)
        .into_iter()
        .filter(|&i| window[i] >= threshold)
        .collect();
    let peaks = enforce_spacing(window, &candidates, distance);

    log::debug!(
        "peaks: threshold={:.4} distance={} candidates={} kept={}",
        threshold,
        distance,
        candidates.len(),
        peaks.len()
    );

    if peaks.len() < 2 {
        return Err(PipelineError::InsufficientPeaks { found: peaks.len() });
    }
    Ok(peaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_resolves_to_middle() {
        let x = [0.0, 1.0, 2.0, 2.0, 2.0, 1.0, 0.0];
        assert_eq!(local_maxima(&x), vec![3]);
    }

    #[test]
    fn endpoints_are_not_peaks() {
        assert!(local_maxima(&[3.0, 1.0, 2.0]).is_empty());
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn taller_peak_wins_within_spacing() {
        let x = [0.0, 1.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        let cands = local_maxima(&x);
        assert_eq!(cands, vec![1, 3, 8]);
        assert_eq!(enforce_spacing(&x, &cands, 4), vec![3, 8]);
    }

    #[test]
    fn spacing_is_a_fraction_of_the_period() {
        assert_eq!(min_spacing(1.0 / 0.4, 11.0), 19);
        assert_eq!(min_spacing(4.0, 11.0), 32);
        assert_eq!(min_spacing(0.1, 11.0), 1);
        assert_eq!(min_spacing(0.0, 11.0), 1);
        assert_eq!(min_spacing(f64::INFINITY, 11.0), 1);
    }

    #[test]
    fn flat_window_has_no_peaks() {
        let err = detect_peaks(&[0.0; 50], 5.0, 11.0).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientPeaks { found: 0 });
    }

    #[test]
    fn spikes_above_threshold() {
        let mut x = vec![0.0; 100];
        x[20] = 1.0;
        x[60] = 1.0;
        let peaks = detect_peaks(&x, 2.0, 11.0).unwrap();
        assert_eq!(peaks, vec![20, 60]);
    }

    #[test]
    fn one_sample_jitter_keeps_every_breath() {
        // 0.5 Hz at 11 Hz: 22-sample period, sampled peaks alternate 22 / 21 apart
        let mut x = vec![0.0; 100];
        for i in [4, 26, 47, 69, 90] {
            x[i] = 1.0;
        }
        let peaks = detect_peaks(&x, 1.0 / 0.5, 11.0).unwrap();
        assert_eq!(peaks, vec![4, 26, 47, 69, 90]);
    }
}
