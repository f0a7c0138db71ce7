use crate::metrics::{mean, std_dev};

/// Keeps samples with |z| < `z_threshold` against the window's own mean/std.
///
/// A zero-variance window has z = 0 everywhere and is returned whole.
pub fn reject_outliers(window: &[f64], z_threshold: f64) -> Vec<f64> {
    let (m, sd) = match (mean(window), std_dev(window)) {
        (Some(m), Some(sd)) => (m, sd),
        _ => return Vec::new(),
    };
    if sd <= f64::EPSILON || !sd.is_finite() {
        return window.to_vec();
    }

    let kept: Vec<f64> = window
        .iter()
        .copied()
        .filter(|v| ((v - m) / sd).abs() < z_threshold)
        .collect();

    if kept.len() < window.len() {
        log::debug!("outliers: dropped {} of {} samples", window.len() - kept.len(), window.len());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_single_spike() {
        let mut w = vec![0.0; 30];
        for (i, v) in w.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 1.0 } else { -1.0 };
        }
        w[10] = 50.0;
        let kept = reject_outliers(&w, 3.0);
        assert_eq!(kept.len(), 29);
        assert!(kept.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn flat_window_is_kept() {
        let w = vec![2.5; 12];
        assert_eq!(reject_outliers(&w, 3.0), w);
    }

    #[test]
    fn empty_window() {
        assert!(reject_outliers(&[], 3.0).is_empty());
    }
}
