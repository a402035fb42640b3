//! Butterworth-style bandpass with persistent state.
//!
//! Built as cascaded high-pass and low-pass biquad sections (two each, Q
//! values 0.541 and 1.307 for a 4th-order Butterworth response). State
//! persists across chunks, so filtering a live stream chunk by chunk is
//! equivalent to filtering it in one piece.

use crate::biquad::{Biquad, highpass_coefficients, lowpass_coefficients};

const BUTTERWORTH_Q: [f32; 2] = [0.541, 1.307];

/// Stateful bandpass filter for chunked streams.
#[derive(Debug, Clone)]
pub struct Bandpass {
    highpass: [Biquad; 2],
    lowpass: [Biquad; 2],
    low_hz: f32,
    high_hz: f32,
}

impl Bandpass {
    /// Creates a bandpass passing `[low_hz, high_hz]` at `sample_rate`.
    pub fn new(sample_rate: f32, low_hz: f32, high_hz: f32) -> Self {
        let mut highpass = [Biquad::new(), Biquad::new()];
        let mut lowpass = [Biquad::new(), Biquad::new()];
        for (section, q) in highpass.iter_mut().zip(BUTTERWORTH_Q) {
            let (b0, b1, b2, a0, a1, a2) = highpass_coefficients(low_hz, q, sample_rate);
            section.set_coefficients(b0, b1, b2, a0, a1, a2);
        }
        for (section, q) in lowpass.iter_mut().zip(BUTTERWORTH_Q) {
            let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(high_hz, q, sample_rate);
            section.set_coefficients(b0, b1, b2, a0, a1, a2);
        }
        Self {
            highpass,
            lowpass,
            low_hz,
            high_hz,
        }
    }

    /// The passband in Hz.
    pub fn band(&self) -> (f32, f32) {
        (self.low_hz, self.high_hz)
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut sample = input;
        for section in &mut self.highpass {
            sample = section.process(sample);
        }
        for section in &mut self.lowpass {
            sample = section.process(sample);
        }
        sample
    }

    /// Filters a chunk in place.
    pub fn process_chunk(&mut self, chunk: &mut [f32]) {
        for sample in chunk {
            *sample = self.process(*sample);
        }
    }

    /// Clears filter state, keeping the band.
    pub fn reset(&mut self) {
        for section in &mut self.highpass {
            section.clear();
        }
        for section in &mut self.lowpass {
            section.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(freq: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn rms(signal: &[f32]) -> f32 {
        (signal.iter().map(|v| v * v).sum::<f32>() / signal.len() as f32).sqrt()
    }

    #[test]
    fn passband_survives_stopband_does_not() {
        let sample_rate = 44100.0;
        let mut bp = Bandpass::new(sample_rate, 100.0, 400.0);
        let mut inside = tone(200.0, sample_rate, 44100);
        bp.process_chunk(&mut inside);

        bp.reset();
        let mut above = tone(5000.0, sample_rate, 44100);
        bp.process_chunk(&mut above);

        let settled = 22050;
        assert!(rms(&inside[settled..]) > 0.4);
        assert!(rms(&above[settled..]) < 0.05);
    }

    #[test]
    fn chunked_equals_whole() {
        let sample_rate = 44100.0;
        let signal = tone(250.0, sample_rate, 4096);

        let mut whole = Bandpass::new(sample_rate, 100.0, 400.0);
        let mut expected = signal.clone();
        whole.process_chunk(&mut expected);

        let mut chunked = Bandpass::new(sample_rate, 100.0, 400.0);
        let mut actual = signal;
        for chunk in actual.chunks_mut(512) {
            chunked.process_chunk(chunk);
        }
        for (a, b) in actual.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
