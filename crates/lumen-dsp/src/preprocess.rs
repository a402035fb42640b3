//! Chunk conditioning ahead of spectral analysis.
//!
//! Raw capture chunks pass through a small pipeline before any FFT:
//! integer downsampling to the band of interest, a rolling window over the
//! last few chunks, a Hann window, a silence gate, and zero padding up to
//! the next power of two. [`Preprocessor`] bundles the whole pipeline in
//! push form: feed it one capture chunk, get back an analysis window or
//! nothing while the room is quiet.

use thiserror::Error;

use crate::window::Window;

/// RMS below this is treated as silence and produces no analysis window.
const SILENCE_RMS: f32 = 1e-5;

/// Errors planning a conditioning pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DspError {
    /// The capture rate cannot represent the requested band.
    #[error("sample rate {sample_rate} Hz is below the Nyquist rate for {fmax} Hz content")]
    InsufficientSampleRate {
        /// The capture sample rate in Hz.
        sample_rate: f32,
        /// The requested band edge in Hz.
        fmax: f32,
    },
}

/// Integer downsampler keeping content below `fmax`.
///
/// The stride is `floor(fs / (2 * fmax))`; a stride of 1 passes chunks
/// through untouched. Plain decimation, matching the analysis chain this
/// feeds (the triangular filter bank tolerates the aliasing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Downsampler {
    stride: usize,
    out_rate: f32,
}

impl Downsampler {
    /// Plans a downsample from `sample_rate` for content up to `fmax` Hz.
    ///
    /// `sample_rate` below `2 * fmax` cannot represent the band and is an
    /// error; both values come from user configuration.
    pub fn new(sample_rate: f32, fmax: f32) -> Result<Self, DspError> {
        if sample_rate < 2.0 * fmax {
            return Err(DspError::InsufficientSampleRate { sample_rate, fmax });
        }
        let stride = (sample_rate / (2.0 * fmax)).floor() as usize;
        let stride = stride.max(1);
        Ok(Self {
            stride,
            out_rate: sample_rate / stride as f32,
        })
    }

    /// The decimation stride.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Sample rate after decimation.
    pub fn out_rate(&self) -> f32 {
        self.out_rate
    }

    /// Decimates one chunk.
    pub fn apply(&self, chunk: &[f32]) -> Vec<f32> {
        chunk.iter().step_by(self.stride).copied().collect()
    }
}

/// Rolling window over the last `n_overlaps` chunks.
///
/// New chunks enter on the right; the window always has
/// `chunk_len * n_overlaps` samples once the chunk length is known.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    n_overlaps: usize,
    window: Vec<f32>,
    chunk_len: usize,
}

impl RollingWindow {
    /// Creates a window spanning `n_overlaps` chunks.
    pub fn new(n_overlaps: usize) -> Self {
        assert!(n_overlaps >= 1);
        Self {
            n_overlaps,
            window: Vec::new(),
            chunk_len: 0,
        }
    }

    /// Pushes one chunk and returns the current window contents.
    ///
    /// The first push sizes the window; earlier positions start at zero.
    pub fn push(&mut self, chunk: &[f32]) -> &[f32] {
        if self.chunk_len != chunk.len() {
            self.chunk_len = chunk.len();
            self.window = vec![0.0; self.chunk_len * self.n_overlaps];
        }
        let n = self.chunk_len;
        self.window.copy_within(n.., 0);
        let tail = self.window.len() - n;
        self.window[tail..].copy_from_slice(chunk);
        &self.window
    }

    /// Clears accumulated samples.
    pub fn reset(&mut self) {
        self.window.fill(0.0);
    }
}

/// Next power of two at or above `n`.
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Copies `signal` into a zero-padded buffer of power-of-two length.
pub fn pad_to_pow2(signal: &[f32]) -> Vec<f32> {
    let mut out = signal.to_vec();
    out.resize(next_pow2(signal.len()), 0.0);
    out
}

/// Root mean square of a signal; 0 for an empty slice.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|v| v * v).sum::<f32>() / signal.len() as f32).sqrt()
}

/// The full conditioning pipeline in push form.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    downsampler: Downsampler,
    rolling: RollingWindow,
}

impl Preprocessor {
    /// Builds the pipeline for the given capture rate and band of interest.
    pub fn new(sample_rate: f32, fmax: f32, n_overlaps: usize) -> Result<Self, DspError> {
        Ok(Self {
            downsampler: Downsampler::new(sample_rate, fmax)?,
            rolling: RollingWindow::new(n_overlaps),
        })
    }

    /// Effective sample rate of the produced analysis windows.
    pub fn out_rate(&self) -> f32 {
        self.downsampler.out_rate()
    }

    /// Feeds one capture chunk.
    ///
    /// Returns the windowed, padded analysis buffer, or `None` while the
    /// signal is below the silence gate.
    pub fn push(&mut self, chunk: &[f32]) -> Option<Vec<f32>> {
        let decimated = self.downsampler.apply(chunk);
        let window = self.rolling.push(&decimated);
        let mut buf = window.to_vec();
        Window::Hann.apply(&mut buf);
        if rms(&buf) <= SILENCE_RMS {
            return None;
        }
        Some(pad_to_pow2(&buf))
    }

    /// Drops accumulated window contents.
    pub fn reset(&mut self) {
        self.rolling.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsampler_stride_and_rate() {
        let ds = Downsampler::new(44100.0, 11025.0).unwrap();
        assert_eq!(ds.stride(), 2);
        assert_eq!(ds.out_rate(), 22050.0);
        assert_eq!(ds.apply(&[1.0, 2.0, 3.0, 4.0]), vec![1.0, 3.0]);
    }

    #[test]
    fn downsampler_passthrough_when_rate_is_tight() {
        let ds = Downsampler::new(44100.0, 22050.0).unwrap();
        assert_eq!(ds.stride(), 1);
        assert_eq!(ds.apply(&[1.0, 2.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn insufficient_sample_rate_is_an_error() {
        assert_eq!(
            Downsampler::new(8000.0, 6000.0),
            Err(DspError::InsufficientSampleRate {
                sample_rate: 8000.0,
                fmax: 6000.0,
            })
        );
        assert!(Preprocessor::new(8000.0, 6000.0, 4).is_err());
    }

    #[test]
    fn rolling_window_shifts_left() {
        let mut w = RollingWindow::new(2);
        w.push(&[1.0, 2.0]);
        let out = w.push(&[3.0, 4.0]).to_vec();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0]);
        let out = w.push(&[5.0, 6.0]).to_vec();
        assert_eq!(out, vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn pad_reaches_next_power_of_two() {
        assert_eq!(pad_to_pow2(&[1.0; 300]).len(), 512);
        assert_eq!(pad_to_pow2(&[1.0; 256]).len(), 256);
    }

    #[test]
    fn silence_is_gated() {
        let mut p = Preprocessor::new(44100.0, 22050.0, 2).unwrap();
        assert!(p.push(&vec![0.0; 64]).is_none());
        assert!(p.push(&vec![0.5; 64]).is_some());
    }

    #[test]
    fn output_is_power_of_two() {
        let mut p = Preprocessor::new(44100.0, 11025.0, 4).unwrap();
        let out = p.push(&vec![0.5; 300]).unwrap();
        assert!(out.len().is_power_of_two());
    }

    proptest::proptest! {
        #[test]
        fn downsample_length_law(
            chunk in proptest::collection::vec(-1.0_f32..=1.0, 1..512),
            divisor in 1_u32..=8,
        ) {
            let fmax = 44100.0 / (2.0 * divisor as f32);
            let ds = Downsampler::new(44100.0, fmax).unwrap();
            let out = ds.apply(&chunk);
            proptest::prop_assert_eq!(out.len(), chunk.len().div_ceil(ds.stride()));
        }

        #[test]
        fn pad_law(signal in proptest::collection::vec(-1.0_f32..=1.0, 1..600)) {
            let out = pad_to_pow2(&signal);
            proptest::prop_assert!(out.len().is_power_of_two());
            proptest::prop_assert!(out.len() >= signal.len());
            proptest::prop_assert_eq!(&out[..signal.len()], &signal[..]);
            proptest::prop_assert!(out[signal.len()..].iter().all(|&v| v == 0.0));
        }
    }
}
