//! Shared helpers for CLI commands.

use std::sync::{Arc, Mutex};

use lumen_effects::EffectContext;
use lumen_io::{LedTransport, MockBackend, NullTransport};
use lumen_registry::Registry;

/// Context for commands that only inspect effect metadata.
///
/// Listing classes and exporting presets never touch a device, so the
/// capture backend is silent and frames go nowhere.
pub fn offline_context(num_pixels: usize) -> EffectContext {
    EffectContext {
        sample_rate: 44100.0,
        num_pixels,
        chunk_rate: 60.0,
        capture: Arc::new(MockBackend::silent()),
        transport: Arc::new(Mutex::new(
            Box::new(NullTransport) as Box<dyn LedTransport>
        )),
    }
}

/// Registry over an offline context.
pub fn offline_registry(num_pixels: usize) -> Registry {
    Registry::new(offline_context(num_pixels))
}
