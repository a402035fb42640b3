//! Pluggable audio capture abstraction.
//!
//! [`CaptureBackend`] decouples the effect graph from any specific audio
//! API. The default implementation wraps cpal; a deterministic mock backend
//! exists for tests. The trait is object-safe so the backend can be chosen
//! at runtime from configuration.
//!
//! A [`CaptureStream`] hands out fixed-size mono-interleaved chunks with a
//! read timeout, which is what the audio source blocks on during the
//! graph's update pass.

use std::time::Duration;

use crate::Result;

/// An enumerable audio input device.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Device name as reported by the backend.
    pub name: String,
    /// Whether this is the system default input.
    pub is_default: bool,
}

/// Configuration for opening a capture stream.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per chunk; at 44100 Hz and 60 chunks/s this is 735.
    pub chunk_frames: usize,
    /// Number of interleaved channels to capture.
    pub channels: u16,
    /// Optional device name (uses system default if `None`).
    pub device_name: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            chunk_frames: 735,
            channels: 1,
            device_name: None,
        }
    }
}

impl CaptureConfig {
    /// Chunk size in samples (frames times channels).
    pub fn chunk_samples(&self) -> usize {
        self.chunk_frames * usize::from(self.channels)
    }
}

/// Errors surfaced while reading from an open stream.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CaptureError {
    /// The device produced chunks faster than the graph consumed them and
    /// some were dropped. Recoverable; the stream keeps running.
    #[error("capture overflow, dropped {0} chunk(s)")]
    Overflow(usize),

    /// No chunk arrived within the read timeout.
    #[error("no audio within {0:?}")]
    Timeout(Duration),

    /// The device failed; the stream is unusable.
    #[error("capture device failed: {0}")]
    Device(String),
}

/// An open capture stream yielding fixed-size chunks.
pub trait CaptureStream: Send {
    /// Actual sample rate of the stream.
    fn sample_rate(&self) -> u32;

    /// Number of interleaved channels per chunk.
    fn channels(&self) -> u16;

    /// Blocks for the next chunk of `chunk_samples` interleaved samples.
    ///
    /// An [`CaptureError::Overflow`] reports dropped chunks but still means
    /// the stream is alive; the caller should read again. `Timeout` and
    /// `Device` indicate the device has stalled or died.
    fn read(&mut self, timeout: Duration) -> std::result::Result<Vec<f32>, CaptureError>;
}

/// Pluggable capture backend.
///
/// Backends are shared immutable handles; streams carry all mutable state.
pub trait CaptureBackend: Send + Sync {
    /// Human-readable backend name ("cpal", "mock").
    fn name(&self) -> &str;

    /// Lists available input devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Opens a capture stream with the given configuration.
    ///
    /// The returned stream's sample rate may differ from the requested one
    /// when the device cannot provide it; callers must read it back.
    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureStream>>;
}
