//! Time sources for the frame loop.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A monotonic time source the frame loop paces itself against.
///
/// Production uses [`MonotonicClock`]; tests use [`VirtualClock`] so a
/// thousand simulated frames run in microseconds and deadline behavior is
/// reproducible.
pub trait Clock: Send + Sync {
    /// Seconds since the clock's epoch.
    fn now(&self) -> f64;

    /// Blocks until `secs` have passed (or advances virtual time).
    fn sleep(&self, secs: f64);
}

/// Wall-clock implementation over [`Instant`].
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    /// Creates a clock with its epoch at construction time.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn sleep(&self, secs: f64) {
        if secs > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(secs));
        }
    }
}

/// Simulated clock: `sleep` advances time instantly.
pub struct VirtualClock {
    now: Mutex<f64>,
}

impl VirtualClock {
    /// Creates a virtual clock at t = 0.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(0.0),
        }
    }

    /// Manually advances time without sleeping.
    pub fn advance(&self, secs: f64) {
        if let Ok(mut now) = self.now.lock() {
            *now += secs;
        }
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> f64 {
        self.now.lock().map(|now| *now).unwrap_or(0.0)
    }

    fn sleep(&self, secs: f64) {
        if secs > 0.0 {
            self.advance(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_clock_advances_on_sleep() {
        let clock = VirtualClock::new();
        assert_eq!(clock.now(), 0.0);
        clock.sleep(0.5);
        clock.sleep(0.25);
        assert!((clock.now() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        clock.sleep(0.001);
        assert!(clock.now() > a);
    }
}
