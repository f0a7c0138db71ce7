use ordered_float::OrderedFloat;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::types::BandCfg;

/// One-sided magnitude spectrum: (frequency Hz, |X_k|) for k = 0..=N/2.
pub fn magnitude_spectrum(window: &[f64], sampling_rate_hz: f64) -> Vec<(f64, f64)> {
    let n = window.len();
    if n == 0 {
        return Vec::new();
    }

    let mut buf: Vec<Complex<f64>> = window.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buf);

    let df = sampling_rate_hz / n as f64;
    buf.iter()
        .take(n / 2 + 1)
        .enumerate()
        .map(|(k, c)| (k as f64 * df, c.norm()))
        .collect()
}

/// Frequency of the strongest bin inside the respiration band.
///
/// Falls back to `band.fallback_hz` when no bin lands in the band (too few
/// samples for the resolution to reach it) or the band carries no energy.
pub fn dominant_frequency(window: &[f64], sampling_rate_hz: f64, band: &BandCfg) -> f64 {
    let spectrum = magnitude_spectrum(window, sampling_rate_hz);

    let best = spectrum
        .iter()
        .filter(|(f, _)| *f >= band.low_hz && *f <= band.high_hz)
        .filter(|(_, m)| m.is_finite())
        .max_by_key(|(_, m)| OrderedFloat(*m));

    match best {
        Some(&(f, m)) if m > 0.0 => f,
        _ => {
            log::debug!(
                "spectrum: no usable bin in [{:.2}, {:.2}] Hz for {} samples, default {:.2} Hz",
                band.low_hz,
                band.high_hz,
                window.len(),
                band.fallback_hz
            );
            band.fallback_hz
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const FS: f64 = 11.0;

    fn sine(f: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * f * i as f64 / FS).sin()).collect()
    }

    #[test]
    fn finds_in_band_tone() {
        // 660 samples -> 1/60 Hz resolution; 0.35 Hz sits on bin 21
        let f = dominant_frequency(&sine(0.35, 660), FS, &BandCfg::default());
        assert!((f - 0.35).abs() < 1e-9, "got {f}");
    }

    #[test]
    fn ignores_out_of_band_tone() {
        let mut x = sine(0.3, 660);
        for (i, v) in x.iter_mut().enumerate() {
            *v += 5.0 * (2.0 * PI * 2.0 * i as f64 / FS).sin();
        }
        let f = dominant_frequency(&x, FS, &BandCfg::default());
        assert!((f - 0.3).abs() < 1e-9, "got {f}");
    }

    #[test]
    fn short_window_uses_default() {
        // 12 samples -> bins at 0, 0.917 Hz, ... none within 0.2..0.5
        let f = dominant_frequency(&sine(0.3, 12), FS, &BandCfg::default());
        assert_eq!(f, 0.2);
    }

    #[test]
    fn flat_window_uses_default() {
        assert_eq!(dominant_frequency(&[0.0; 200], FS, &BandCfg::default()), 0.2);
        assert_eq!(dominant_frequency(&[], FS, &BandCfg::default()), 0.2);
    }
}
