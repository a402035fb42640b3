//! Second-order IIR section and standard coefficient recipes.

use std::f32::consts::PI;

/// A direct-form-I biquad with persistent state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates an identity (pass-through) section.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            ..Self::default()
        }
    }

    /// Sets the coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Clears the filter state, keeping coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// RBJ low-pass coefficients `(b0, b1, b2, a0, a1, a2)`.
pub fn lowpass_coefficients(cutoff_hz: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let w0 = 2.0 * PI * cutoff_hz / sample_rate;
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q);
    let b1 = 1.0 - cos_w0;
    let b0 = b1 / 2.0;
    (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
}

/// RBJ high-pass coefficients `(b0, b1, b2, a0, a1, a2)`.
pub fn highpass_coefficients(cutoff_hz: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let w0 = 2.0 * PI * cutoff_hz / sample_rate;
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q);
    let b0 = (1.0 + cos_w0) / 2.0;
    let b1 = -(1.0 + cos_w0);
    (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_section_passes_through() {
        let mut bq = Biquad::new();
        assert_eq!(bq.process(0.7), 0.7);
        assert_eq!(bq.process(-0.2), -0.2);
    }

    #[test]
    fn lowpass_attenuates_high_frequency() {
        let sample_rate = 44100.0;
        let mut bq = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(500.0, 0.707, sample_rate);
        bq.set_coefficients(b0, b1, b2, a0, a1, a2);

        // 10 kHz tone, well above cutoff.
        let mut peak = 0.0_f32;
        for i in 0..4410 {
            let x = (2.0 * PI * 10_000.0 * i as f32 / sample_rate).sin();
            let y = bq.process(x);
            if i > 1000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.05, "peak {peak}");
    }

    #[test]
    fn highpass_passes_high_frequency() {
        let sample_rate = 44100.0;
        let mut bq = Biquad::new();
        let (b0, b1, b2, a0, a1, a2) = highpass_coefficients(500.0, 0.707, sample_rate);
        bq.set_coefficients(b0, b1, b2, a0, a1, a2);

        let mut peak = 0.0_f32;
        for i in 0..4410 {
            let x = (2.0 * PI * 10_000.0 * i as f32 / sample_rate).sin();
            let y = bq.process(x);
            if i > 1000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak > 0.9, "peak {peak}");
    }
}
