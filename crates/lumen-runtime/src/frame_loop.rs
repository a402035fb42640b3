//! The fixed-rate tick driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use lumen_core::{FilterGraph, PixelFrame};
use lumen_effects::EffectContext;

use crate::clock::Clock;

/// Drives a [`FilterGraph`] at a fixed target rate.
///
/// Each iteration takes the graph write lock, runs one tick with the
/// measured `dt`, then sleeps until the next deadline. A tick that
/// overruns its period is logged and counted but never skipped; the
/// schedule re-anchors so the loop does not try to catch up with a burst.
///
/// The loop stops when the shutdown flag is raised or a node reports a
/// fatal device error. On exit the strip is cleared through the shared
/// transport.
pub struct FrameLoop<C: Clock> {
    graph: Arc<RwLock<FilterGraph>>,
    ctx: EffectContext,
    clock: C,
    period: f64,
    shutdown: Arc<AtomicBool>,
    deadline_misses: u64,
    ticks: u64,
}

impl<C: Clock> FrameLoop<C> {
    /// Creates a loop over `graph` targeting `ctx.chunk_rate` ticks/second.
    pub fn new(
        graph: Arc<RwLock<FilterGraph>>,
        ctx: EffectContext,
        clock: C,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let period = 1.0 / f64::from(ctx.chunk_rate);
        Self {
            graph,
            ctx,
            clock,
            period,
            shutdown,
            deadline_misses: 0,
            ticks: 0,
        }
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that overran their period so far.
    pub fn deadline_misses(&self) -> u64 {
        self.deadline_misses
    }

    /// Runs until shutdown or a fatal node error, then clears the strip.
    pub fn run(&mut self) {
        tracing::info!(rate = 1.0 / self.period, "frame loop started");
        let mut last = self.clock.now();
        let mut deadline = last + self.period;
        while !self.shutdown.load(Ordering::Relaxed) {
            let now = self.clock.now();
            let dt = now - last;
            last = now;
            if !self.tick(dt) {
                break;
            }
            let after = self.clock.now();
            if after > deadline {
                self.deadline_misses += 1;
                tracing::warn!(
                    over_by = after - deadline,
                    misses = self.deadline_misses,
                    "tick overran its deadline"
                );
                // Re-anchor instead of bursting to catch up.
                deadline = after + self.period;
            } else {
                self.clock.sleep(deadline - after);
                deadline += self.period;
            }
        }
        self.clear_strip();
        tracing::info!(
            ticks = self.ticks,
            misses = self.deadline_misses,
            "frame loop stopped"
        );
    }

    /// Runs exactly `n` ticks at the nominal period (testing).
    pub fn run_ticks(&mut self, n: u64) {
        for _ in 0..n {
            if !self.tick(self.period) {
                break;
            }
            self.clock.sleep(self.period);
        }
    }

    /// One tick; returns false if the loop should stop.
    fn tick(&mut self, dt: f64) -> bool {
        let Ok(mut graph) = self.graph.write() else {
            tracing::error!("graph lock poisoned, stopping");
            return false;
        };
        graph.tick(dt);
        self.ticks += 1;
        if graph.has_fatal_error() {
            tracing::error!("fatal node error, stopping");
            return false;
        }
        true
    }

    fn clear_strip(&self) {
        let dark = PixelFrame::new(self.ctx.num_pixels);
        if let Ok(mut transport) = self.ctx.transport.lock() {
            if let Err(err) = transport.show(&dark) {
                tracing::warn!(error = %err, "could not clear strip on shutdown");
            }
        }
    }
}
