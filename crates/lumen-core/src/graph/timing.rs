//! Per-node wall-clock statistics.

/// Rolling min/max/average over the last up-to-100 samples.
///
/// The average is exponential with an effective window that saturates at
/// 100 samples, so a long-running graph still reacts to a node that
/// suddenly slows down.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timing {
    count: u32,
    avg: f64,
    min: f64,
    max: f64,
}

impl Timing {
    /// Records one duration in seconds.
    pub fn record(&mut self, secs: f64) {
        if self.count == 0 {
            self.min = secs;
            self.max = secs;
        } else {
            self.min = self.min.min(secs);
            self.max = self.max.max(secs);
        }
        self.count = (self.count + 1).min(100);
        self.avg += (secs - self.avg) / f64::from(self.count);
    }

    /// Number of recorded samples, capped at 100.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Rolling average in seconds.
    pub fn avg(&self) -> f64 {
        self.avg
    }

    /// Fastest recorded duration in seconds.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Slowest recorded duration in seconds.
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "avg {:.3}ms min {:.3}ms max {:.3}ms (n={})",
            self.avg * 1e3,
            self.min * 1e3,
            self.max * 1e3,
            self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_min_max_avg() {
        let mut t = Timing::default();
        t.record(0.010);
        t.record(0.020);
        t.record(0.030);
        assert_eq!(t.min(), 0.010);
        assert_eq!(t.max(), 0.030);
        assert!(t.avg() > 0.010 && t.avg() < 0.030);
        assert_eq!(t.count(), 3);
    }

    #[test]
    fn count_saturates_at_window() {
        let mut t = Timing::default();
        for _ in 0..500 {
            t.record(0.001);
        }
        assert_eq!(t.count(), 100);
        assert!((t.avg() - 0.001).abs() < 1e-9);
    }
}
