//! Shared construction context for effects.

use std::sync::{Arc, Mutex};

use lumen_io::{CaptureBackend, LedTransport};

/// Everything an effect needs at construction beyond its own parameters.
///
/// Effects receive derived configuration (strip size, audio rates) and the
/// device collaborators here instead of owning global state. The transport
/// sits behind a mutex so a sink and the shutdown path can both reach it.
#[derive(Clone)]
pub struct EffectContext {
    /// Capture sample rate in Hz.
    pub sample_rate: f32,
    /// Number of pixels on the strip.
    pub num_pixels: usize,
    /// Audio chunks (and frames) per second.
    pub chunk_rate: f32,
    /// Capture backend for audio source effects.
    pub capture: Arc<dyn CaptureBackend>,
    /// Transport shared by LED sinks and the shutdown path.
    pub transport: Arc<Mutex<Box<dyn LedTransport>>>,
}

impl EffectContext {
    /// Samples per chunk at the configured rates.
    pub fn chunk_frames(&self) -> usize {
        (self.sample_rate / self.chunk_rate) as usize
    }
}

impl std::fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectContext")
            .field("sample_rate", &self.sample_rate)
            .field("num_pixels", &self.num_pixels)
            .field("chunk_rate", &self.chunk_rate)
            .finish_non_exhaustive()
    }
}
