use nalgebra::DMatrix;

use crate::error::PipelineError;
use crate::types::SmoothCfg;

/// Min-max rescale to [0, 1]. A flat signal (max == min) becomes all zeros.
pub fn min_max_normalize(xs: &[f64]) -> Vec<f64> {
    if xs.is_empty() {
        return Vec::new();
    }
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if !(span > f64::EPSILON) || !span.is_finite() {
        return vec![0.0; xs.len()];
    }
    xs.iter().map(|x| (x - lo) / span).collect()
}

/// Largest odd window length that fits `n` samples.
fn effective_window(window_length: usize, n: usize) -> usize {
    let wl = window_length.min(n);
    if wl % 2 == 0 { wl.saturating_sub(1) } else { wl }
}

/// Least-squares projection ("hat") matrix for a polynomial fit over `window_len` points.
///
/// Row `t` holds the weights that evaluate the fitted polynomial at position `t`.
fn savgol_hat(window_len: usize, polyorder: usize) -> Result<DMatrix<f64>, PipelineError> {
    let half = ((window_len - 1) as f64 / 2.0).max(1.0);
    let a = DMatrix::from_fn(window_len, polyorder + 1, |r, c| {
        let u = (r as f64 - (window_len - 1) as f64 / 2.0) / half;
        u.powi(c as i32)
    });
    let at = a.transpose();
    let gram_inv = (&at * &a)
        .try_inverse()
        .ok_or_else(|| PipelineError::Numeric("singular Savitzky-Golay normal matrix".into()))?;
    Ok(&a * gram_inv * at)
}

/// Local polynomial (Savitzky–Golay) smoothing.
///
/// Interior points use the centered window; the first and last half-windows are
/// evaluated on the polynomial fitted to the edge window, so the output keeps the
/// input length. The window is clamped to the input length and forced odd.
pub fn savgol_filter(xs: &[f64], window_length: usize, polyorder: usize) -> Result<Vec<f64>, PipelineError> {
    let n = xs.len();
    let wl = effective_window(window_length, n);
    if wl == 0 || wl <= polyorder {
        let required = if (polyorder + 1) % 2 == 1 { polyorder + 1 } else { polyorder + 2 };
        return Err(PipelineError::InsufficientSamples { found: n, required });
    }
    if wl != window_length {
        log::debug!("smoothing: window {} -> {} for {} samples", window_length, wl, n);
    }

    let hat = savgol_hat(wl, polyorder)?;
    let half = wl / 2;

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let start = i.saturating_sub(half).min(n - wl);
        let t = i - start;
        let y: f64 = (0..wl).map(|j| hat[(t, j)] * xs[start + j]).sum();
        out.push(y);
    }
    Ok(out)
}

/// Normalize (optional) then smooth.
pub fn smooth(window: &[f64], cfg: &SmoothCfg) -> Result<Vec<f64>, PipelineError> {
    if cfg.normalize {
        let normalized = min_max_normalize(window);
        savgol_filter(&normalized, cfg.window_length, cfg.polyorder)
    } else {
        savgol_filter(window, cfg.window_length, cfg.polyorder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_signal_normalizes_to_zero() {
        assert_eq!(min_max_normalize(&[3.0; 5]), vec![0.0; 5]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn normalize_spans_unit_interval() {
        let v = min_max_normalize(&[-2.0, 0.0, 2.0]);
        assert_eq!(v, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn cubic_is_reproduced_exactly() {
        // A polynomial of degree <= polyorder passes through unchanged, edges included.
        let xs: Vec<f64> = (0..40)
            .map(|i| {
                let t = i as f64 * 0.1;
                0.5 * t * t * t - t * t + 2.0 * t - 1.0
            })
            .collect();
        let ys = savgol_filter(&xs, 30, 3).unwrap();
        assert_eq!(ys.len(), xs.len());
        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(x, y, epsilon = 1e-8);
        }
    }

    #[test]
    fn damps_alternating_jitter() {
        let xs: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let ys = savgol_filter(&xs, 30, 3).unwrap();
        let interior_max = ys[15..45].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(interior_max < 0.2, "jitter left: {interior_max}");
    }

    #[test]
    fn window_is_clamped_to_input() {
        let xs: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let ys = savgol_filter(&xs, 30, 3).unwrap();
        assert_eq!(ys.len(), 12);
        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn too_short_for_polyorder() {
        let err = savgol_filter(&[1.0, 2.0, 3.0], 30, 3).unwrap_err();
        assert_eq!(err, PipelineError::InsufficientSamples { found: 3, required: 5 });
    }
}
