use crate::models::Sample;

pub trait RoundTo {
    fn round_to(self, dp: u32) -> f64;
}

impl RoundTo for f64 {
    #[inline]
    fn round_to(self, dp: u32) -> f64 {
        if dp == 0 { return self.round(); }
        let factor = 10_f64.powi(dp as i32);
        (self * factor).round() / factor
    }
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() { return None; }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Population standard deviation (ddof = 0).
pub fn std_dev(xs: &[f64]) -> Option<f64> {
    let m = mean(xs)?;
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    Some(var.sqrt())
}

/// Simple averaging variant: mean over samples of (x + y + z) / 3.
/// None for an empty set, never 0 as a stand-in.
pub fn average_reading(samples: &[Sample]) -> Option<f64> {
    if samples.is_empty() { return None; }
    let sum: f64 = samples.iter().map(|s| (s.x + s.y + s.z) / 3.0).sum();
    let avg = sum / samples.len() as f64;
    if avg.is_finite() { Some(avg) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_of_constant_is_zero() {
        assert_eq!(std_dev(&[4.0; 8]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn population_std() {
        // 2,4,4,4,5,5,7,9 -> mean 5, std 2
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&xs), Some(5.0));
        assert_eq!(std_dev(&xs), Some(2.0));
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(15.004_f64.round_to(2), 15.0);
        assert_eq!(16.666_f64.round_to(2), 16.67);
        assert_eq!(2.5_f64.round_to(0), 3.0);
    }
}
