//! Signal primitives for the lumen LED visualizer.
//!
//! Everything here is plain data-in, data-out DSP with no knowledge of the
//! effect graph: windowing, chunk conditioning, perceptually warped power
//! spectra, attack/release smoothing, bandpass filtering, and the small
//! Gaussian blur the visual effects lean on.

pub mod bandpass;
pub mod biquad;
pub mod filterbank;
pub mod gaussian;
pub mod preprocess;
pub mod smoothing;
pub mod window;

pub use bandpass::Bandpass;
pub use biquad::Biquad;
pub use filterbank::{FilterBank, Scale, cached_filter_bank, power_spectrum, warped_psd};
pub use gaussian::{gaussian_blur_row, gaussian_kernel};
pub use preprocess::{DspError, Downsampler, Preprocessor, RollingWindow, next_pow2, pad_to_pow2, rms};
pub use smoothing::{ExpFilter, ExpFilterVec, alpha_for};
pub use window::{Window, convolve_same};
