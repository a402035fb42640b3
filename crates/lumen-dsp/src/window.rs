//! Window functions and small convolutions.

use std::f32::consts::PI;

/// Window function types used before spectral analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hann window (raised cosine)
    Hann,
    /// Hamming window
    Hamming,
}

impl Window {
    /// Applies the window to a buffer in place.
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                    *sample *= w;
                }
            }
            Window::Hamming => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.54 - 0.46 * (2.0 * PI * i as f32 / n as f32).cos();
                    *sample *= w;
                }
            }
        }
    }

    /// Returns the window coefficients for the given size.
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// Same-length convolution of a signal with a small kernel.
///
/// The output has the signal's length; samples past either end are treated
/// as zero. Used to soften spectral bars with a short Hamming tap before
/// they hit the strip.
pub fn convolve_same(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let k = kernel.len();
    if n == 0 || k == 0 {
        return vec![0.0; n];
    }
    let half = k / 2;
    let mut out = vec![0.0; n];
    for (i, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (j, &w) in kernel.iter().enumerate() {
            let idx = i as isize + j as isize - half as isize;
            if idx >= 0 && (idx as usize) < n {
                acc += signal[idx as usize] * w;
            }
        }
        *slot = acc;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_is_zero_at_edges_one_at_center() {
        let c = Window::Hann.coefficients(100);
        assert!(c[0] < 0.01);
        assert!((c[50] - 1.0).abs() < 0.01);
    }

    #[test]
    fn hamming_is_nonzero_at_edges() {
        let c = Window::Hamming.coefficients(64);
        assert!((c[0] - 0.08).abs() < 0.01);
    }

    #[test]
    fn rectangular_leaves_signal_alone() {
        let mut buf = vec![2.5; 16];
        Window::Rectangular.apply(&mut buf);
        assert!(buf.iter().all(|&v| v == 2.5));
    }

    #[test]
    fn convolve_same_identity_kernel() {
        let signal = vec![1.0, 2.0, 3.0, 4.0];
        let out = convolve_same(&signal, &[1.0]);
        assert_eq!(out, signal);
    }

    #[test]
    fn convolve_same_keeps_length() {
        let signal = vec![0.0, 0.0, 1.0, 0.0, 0.0];
        let out = convolve_same(&signal, &[0.25, 0.5, 0.25]);
        assert_eq!(out.len(), 5);
        assert!((out[2] - 0.5).abs() < 1e-6);
        assert!((out[1] - 0.25).abs() < 1e-6);
        assert!((out[3] - 0.25).abs() < 1e-6);
    }
}
