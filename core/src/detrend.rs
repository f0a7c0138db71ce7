// core/src/detrend.rs
// Butterworth high-pass + zero-phase (forward-backward) filtering.
// Removes slow drift/bias so only the breathing-band oscillation is left.
use std::f64::consts::PI;

use crate::types::DetrendCfg;

/// Second-order section, H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sos {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Sos {
    /// Direct Form II transposed. Returns the output and the final state.
    fn filter(&self, data: &[f64], zi: [f64; 2]) -> (Vec<f64>, [f64; 2]) {
        let [mut z1, mut z2] = zi;
        let mut out = Vec::with_capacity(data.len());
        for &x in data {
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            out.push(y);
        }
        (out, [z1, z2])
    }

    /// DC gain H(1).
    fn dc_gain(&self) -> f64 {
        let den = 1.0 + self.a1 + self.a2;
        if den.abs() < f64::EPSILON { 0.0 } else { (self.b0 + self.b1 + self.b2) / den }
    }

    /// State that makes a constant input `u` look like it has always been there.
    fn steady_state(&self, u: f64) -> ([f64; 2], f64) {
        let y = u * self.dc_gain();
        let z2 = self.b2 * u - self.a2 * y;
        let z1 = self.b1 * u - self.a1 * y + z2;
        ([z1, z2], y)
    }
}

/// High-pass Butterworth design as cascaded sections.
///
/// `normalized_cutoff` follows the Nyquist convention (1.0 = fs/2). Poles come
/// from the analog prototype; the bilinear transform is pre-warped so the -3 dB
/// point lands on the requested cutoff.
pub fn butterworth_highpass(normalized_cutoff: f64, order: usize) -> Vec<Sos> {
    let order = order.clamp(1, 8);
    let wn = normalized_cutoff.clamp(1e-6, 1.0 - 1e-6);
    let wc = (PI * wn / 2.0).tan();
    let wc2 = wc * wc;

    let mut sections = Vec::with_capacity(order / 2 + 1);

    // Conjugate pole pairs: damping zeta_k = sin(pi (2k + 1) / 2n)
    for k in 0..order / 2 {
        let zeta = (PI * (2 * k + 1) as f64 / (2 * order) as f64).sin();
        let two_zeta_wc = 2.0 * zeta * wc;
        let denom = 1.0 + two_zeta_wc + wc2;
        sections.push(Sos {
            b0: 1.0 / denom,
            b1: -2.0 / denom,
            b2: 1.0 / denom,
            a1: 2.0 * (wc2 - 1.0) / denom,
            a2: (1.0 - two_zeta_wc + wc2) / denom,
        });
    }

    // Odd order: one real pole -> first-order section
    if order % 2 == 1 {
        let k = 1.0 / (1.0 + wc);
        sections.push(Sos { b0: k, b1: -k, b2: 0.0, a1: (wc - 1.0) / (wc + 1.0), a2: 0.0 });
    }

    sections
}

fn cascade(data: &[f64], sos: &[Sos], x0: f64) -> Vec<f64> {
    let mut level = x0;
    let mut out = data.to_vec();
    for section in sos {
        let (zi, y_ss) = section.steady_state(level);
        out = section.filter(&out, zi).0;
        level = y_ss;
    }
    out
}

/// Odd extension about both endpoints.
fn odd_pad(data: &[f64], pad: usize) -> Vec<f64> {
    let n = data.len();
    let mut padded = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        padded.push(2.0 * data[0] - data[i]);
    }
    padded.extend_from_slice(data);
    for i in 1..=pad {
        padded.push(2.0 * data[n - 1] - data[n - 1 - i]);
    }
    padded
}

/// Forward-backward filtering: no group delay, output length == input length.
pub fn sosfiltfilt(data: &[f64], sos: &[Sos]) -> Vec<f64> {
    let n = data.len();
    if n < 2 || sos.is_empty() {
        return data.to_vec();
    }

    let pad = (3 * (2 * sos.len() + 1)).min(n - 1);
    let padded = odd_pad(data, pad);

    let mut fwd = cascade(&padded, sos, padded[0]);
    fwd.reverse();
    let mut bwd = cascade(&fwd, sos, fwd[0]);
    bwd.reverse();

    bwd[pad..pad + n].to_vec()
}

/// Removes drift below `cfg.cutoff_hz`.
pub fn detrend(window: &[f64], cfg: &DetrendCfg) -> Vec<f64> {
    if window.len() < 2 {
        return window.to_vec();
    }
    let nyquist = cfg.sampling_rate_hz / 2.0;
    if !(nyquist > 0.0) {
        return window.to_vec();
    }

    let cleaned: Vec<f64> = window.iter().map(|&x| if x.is_finite() { x } else { 0.0 }).collect();
    let sos = butterworth_highpass(cfg.cutoff_hz / nyquist, cfg.order);
    sosfiltfilt(&cleaned, &sos)
}
