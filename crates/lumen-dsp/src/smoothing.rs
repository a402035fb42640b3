//! Exponential smoothing with separate attack and release.

/// One-pole smoother with different coefficients for rising and falling
/// input. The classic VU ballistics building block: fast attack, slow
/// release.
#[derive(Debug, Clone, Copy)]
pub struct ExpFilter {
    alpha_rise: f32,
    alpha_decay: f32,
    value: f32,
    primed: bool,
}

impl ExpFilter {
    /// Creates a smoother with the given initial value and coefficients.
    ///
    /// Coefficients are in `(0, 1]`; 1.0 tracks the input exactly.
    pub fn new(initial: f32, alpha_decay: f32, alpha_rise: f32) -> Self {
        debug_assert!(alpha_decay > 0.0 && alpha_decay <= 1.0);
        debug_assert!(alpha_rise > 0.0 && alpha_rise <= 1.0);
        Self {
            alpha_rise,
            alpha_decay,
            value: initial,
            primed: false,
        }
    }

    /// Feeds one sample, returning the smoothed value.
    pub fn update(&mut self, new: f32) -> f32 {
        if !self.primed {
            self.value = new;
            self.primed = true;
            return self.value;
        }
        let alpha = if new > self.value {
            self.alpha_rise
        } else {
            self.alpha_decay
        };
        self.value += alpha * (new - self.value);
        self.value
    }

    /// The current smoothed value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Resets to the given value.
    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.primed = false;
    }
}

/// Element-wise [`ExpFilter`] over a fixed-length vector.
#[derive(Debug, Clone)]
pub struct ExpFilterVec {
    alpha_rise: f32,
    alpha_decay: f32,
    values: Vec<f32>,
}

impl ExpFilterVec {
    /// Creates a vector smoother of length `len` starting at `initial`.
    pub fn new(len: usize, initial: f32, alpha_decay: f32, alpha_rise: f32) -> Self {
        Self {
            alpha_rise,
            alpha_decay,
            values: vec![initial; len],
        }
    }

    /// Feeds one frame, returning the smoothed values.
    pub fn update(&mut self, new: &[f32]) -> &[f32] {
        debug_assert_eq!(new.len(), self.values.len());
        for (v, &n) in self.values.iter_mut().zip(new) {
            let alpha = if n > *v {
                self.alpha_rise
            } else {
                self.alpha_decay
            };
            *v += alpha * (n - *v);
        }
        &self.values
    }

    /// The current smoothed values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Smoothing coefficient for a first-order response with time constant
/// `tau` sampled every `dt` seconds: `1 - exp(-dt / tau)`.
///
/// Frame-rate independent: the same `tau` settles in the same wall time
/// whether the loop runs at 30 or 120 fps.
pub fn alpha_for(dt: f64, tau: f64) -> f32 {
    if tau <= 0.0 {
        return 1.0;
    }
    (1.0 - (-dt / tau).exp()) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_primes_without_smoothing() {
        let mut f = ExpFilter::new(0.0, 0.1, 0.9);
        assert_eq!(f.update(5.0), 5.0);
    }

    #[test]
    fn rise_is_faster_than_decay() {
        let mut f = ExpFilter::new(0.0, 0.05, 0.9);
        f.update(0.0);
        let up = f.update(1.0);
        assert!(up > 0.8);
        let down = f.update(0.0);
        assert!(down > up * 0.9);
    }

    #[test]
    fn vector_filter_smooths_elementwise() {
        let mut f = ExpFilterVec::new(2, 0.0, 0.5, 0.5);
        let out = f.update(&[1.0, 2.0]).to_vec();
        assert_eq!(out, vec![0.5, 1.0]);
    }

    #[test]
    fn alpha_for_matches_limits() {
        assert_eq!(alpha_for(0.016, 0.0), 1.0);
        let a = alpha_for(0.016, 1.0);
        assert!(a > 0.0 && a < 0.02);
        // Long dt relative to tau approaches full tracking.
        assert!(alpha_for(10.0, 0.1) > 0.999);
    }
}
