//! Perceptually warped power spectra.
//!
//! [`warped_psd`] turns an analysis window into a handful of band energies
//! spaced on a perceptual frequency scale (mel or Bark): take the one-sided
//! power spectrum, then collapse it through an overlapping triangular
//! filter bank whose band centers are equally spaced in the warped scale.
//!
//! Bank construction is deterministic but not free, so banks are memoized
//! process-wide by their full parameter set; the hot path is one FFT and
//! one sparse dot product.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use rustfft::{FftPlanner, num_complex::Complex};

/// Perceptual frequency scale for band spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// Mel scale, `2595 * log10(1 + f / 700)`.
    Mel,
    /// Bark scale, `6 * asinh(f / 600)`.
    Bark,
}

impl Scale {
    /// Hz to warped units.
    pub fn from_hz(&self, hz: f32) -> f32 {
        match self {
            Scale::Mel => 2595.0 * (1.0 + hz / 700.0).log10(),
            Scale::Bark => 6.0 * (hz / 600.0).asinh(),
        }
    }

    /// Warped units back to Hz.
    pub fn to_hz(&self, warped: f32) -> f32 {
        match self {
            Scale::Mel => 700.0 * ((warped / 1127.0).exp() - 1.0),
            Scale::Bark => 600.0 * (warped / 6.0).sinh(),
        }
    }
}

/// An overlapping triangular filter bank over one-sided FFT bins.
#[derive(Debug)]
pub struct FilterBank {
    /// Row-major weights, `n_filters` rows by `n_fft / 2 + 1` columns.
    weights: Vec<f32>,
    n_filters: usize,
    n_bins: usize,
    /// Center frequency of each filter in Hz.
    centers_hz: Vec<f32>,
}

impl FilterBank {
    /// Builds a bank of `n_filters` triangles over an `n_fft`-point
    /// spectrum at `sample_rate`, spanning `[fmin_hz, fmax_hz]` on `scale`.
    pub fn new(
        n_filters: usize,
        n_fft: usize,
        sample_rate: f32,
        fmin_hz: f32,
        fmax_hz: f32,
        scale: Scale,
    ) -> Self {
        let n_bins = n_fft / 2 + 1;
        // Filter edges equally spaced in the warped scale, converted back
        // to Hz and then to bin numbers.
        let lo = scale.from_hz(fmin_hz);
        let hi = scale.from_hz(fmax_hz);
        let edges: Vec<f32> = (0..n_filters + 2)
            .map(|i| {
                let t = i as f32 / (n_filters + 1) as f32;
                scale.to_hz(lo + t * (hi - lo))
            })
            .collect();
        let bins: Vec<f32> = edges
            .iter()
            .map(|&hz| ((n_fft as f32 + 1.0) * hz / sample_rate).floor())
            .collect();

        let mut weights = vec![0.0; n_filters * n_bins];
        for m in 1..=n_filters {
            let left = bins[m - 1];
            let center = bins[m];
            let right = bins[m + 1];
            let row = &mut weights[(m - 1) * n_bins..m * n_bins];
            for k in (left as usize)..(center as usize).min(n_bins) {
                row[k] = (k as f32 - left) / (center - left);
            }
            for k in (center as usize)..(right as usize).min(n_bins) {
                row[k] = (right - k as f32) / (right - center);
            }
        }

        Self {
            weights,
            n_filters,
            n_bins,
            centers_hz: edges[1..=n_filters].to_vec(),
        }
    }

    /// Number of filters (output bands).
    pub fn len(&self) -> usize {
        self.n_filters
    }

    /// Returns true if the bank has no filters.
    pub fn is_empty(&self) -> bool {
        self.n_filters == 0
    }

    /// Center frequencies of the bands in Hz.
    pub fn centers_hz(&self) -> &[f32] {
        &self.centers_hz
    }

    /// Collapses a one-sided power spectrum into band energies.
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        debug_assert_eq!(power.len(), self.n_bins);
        (0..self.n_filters)
            .map(|m| {
                let row = &self.weights[m * self.n_bins..(m + 1) * self.n_bins];
                row.iter().zip(power).map(|(w, p)| w * p).sum()
            })
            .collect()
    }
}

#[derive(PartialEq, Eq, Hash)]
struct BankKey {
    n_filters: usize,
    n_fft: usize,
    sample_rate: u32,
    fmin: u32,
    fmax: u32,
    scale: Scale,
}

fn bank_cache() -> &'static Mutex<HashMap<BankKey, Arc<FilterBank>>> {
    static CACHE: OnceLock<Mutex<HashMap<BankKey, Arc<FilterBank>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Memoized [`FilterBank`] lookup.
pub fn cached_filter_bank(
    n_filters: usize,
    n_fft: usize,
    sample_rate: f32,
    fmin_hz: f32,
    fmax_hz: f32,
    scale: Scale,
) -> Arc<FilterBank> {
    let key = BankKey {
        n_filters,
        n_fft,
        sample_rate: sample_rate.to_bits(),
        fmin: fmin_hz.to_bits(),
        fmax: fmax_hz.to_bits(),
        scale,
    };
    let mut cache = bank_cache().lock().expect("filter bank cache poisoned");
    Arc::clone(cache.entry(key).or_insert_with(|| {
        Arc::new(FilterBank::new(
            n_filters,
            n_fft,
            sample_rate,
            fmin_hz,
            fmax_hz,
            scale,
        ))
    }))
}

/// One-sided power spectrum, `|rfft(y)|^2 * 2 / N`.
pub fn power_spectrum(y: &[f32]) -> Vec<f32> {
    let n = y.len();
    let mut buffer: Vec<Complex<f32>> = y.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);
    let norm = 2.0 / n as f32;
    buffer[..n / 2 + 1]
        .iter()
        .map(|c| c.norm_sqr() * norm)
        .collect()
}

/// Power spectrum of `y` mapped to `bins` bands on a perceptual scale.
///
/// `y` is the already windowed and padded analysis buffer; its length sets
/// the FFT size.
pub fn warped_psd(
    y: &[f32],
    bins: usize,
    sample_rate: f32,
    frange: (f32, f32),
    scale: Scale,
) -> Vec<f32> {
    let power = power_spectrum(y);
    let bank = cached_filter_bank(bins, y.len(), sample_rate, frange.0, frange.1, scale);
    bank.apply(&power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn mel_round_trips() {
        for hz in [50.0_f32, 440.0, 4000.0] {
            let back = Scale::Mel.to_hz(Scale::Mel.from_hz(hz));
            assert!((back - hz).abs() / hz < 0.01, "{hz} -> {back}");
        }
    }

    #[test]
    fn bark_round_trips() {
        for hz in [50.0_f32, 440.0, 4000.0] {
            let back = Scale::Bark.to_hz(Scale::Bark.from_hz(hz));
            assert!((back - hz).abs() / hz < 1e-3, "{hz} -> {back}");
        }
    }

    #[test]
    fn power_spectrum_finds_tone() {
        let n = 1024;
        let freq_bin = 32;
        let y: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * freq_bin as f32 * i as f32 / n as f32).sin())
            .collect();
        let power = power_spectrum(&y);
        let peak = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(peak, freq_bin);
    }

    #[test]
    fn warped_psd_energy_lands_in_right_band() {
        let n = 2048;
        let sample_rate = 22050.0;
        // 100 Hz tone: low band of a bark-spaced bank.
        let y: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 100.0 * i as f32 / sample_rate).sin())
            .collect();
        let bands = warped_psd(&y, 16, sample_rate, (20.0, 8000.0), Scale::Bark);
        assert_eq!(bands.len(), 16);
        let peak = bands
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert!(peak < 4, "100 Hz energy ended up in band {peak}");
    }

    #[test]
    fn cached_bank_is_shared() {
        let a = cached_filter_bank(8, 512, 22050.0, 20.0, 8000.0, Scale::Mel);
        let b = cached_filter_bank(8, 512, 22050.0, 20.0, 8000.0, Scale::Mel);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn silence_maps_to_zero_energy() {
        let bands = warped_psd(&vec![0.0; 512], 8, 22050.0, (20.0, 8000.0), Scale::Mel);
        assert!(bands.iter().all(|&v| v == 0.0));
    }
}
