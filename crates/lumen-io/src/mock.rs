//! Deterministic capture backend for tests and headless runs.

use std::f32::consts::PI;
use std::time::Duration;

use crate::capture::{AudioDevice, CaptureBackend, CaptureConfig, CaptureError, CaptureStream};
use crate::Result;

/// What the mock stream plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockSignal {
    /// All-zero chunks.
    Silence,
    /// A sine tone at the given frequency and amplitude.
    Sine {
        /// Tone frequency in Hz.
        freq: f32,
        /// Peak amplitude.
        amplitude: f32,
    },
}

/// Capture backend that synthesizes its input.
///
/// Chunks are produced immediately on every read, so a graph driven by the
/// mock runs as fast as the caller ticks it.
pub struct MockBackend {
    signal: MockSignal,
}

impl MockBackend {
    /// Backend producing the given signal.
    pub fn new(signal: MockSignal) -> Self {
        Self { signal }
    }

    /// Backend producing silence.
    pub fn silent() -> Self {
        Self::new(MockSignal::Silence)
    }
}

impl CaptureBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            name: "mock".into(),
            is_default: true,
        }])
    }

    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureStream>> {
        Ok(Box::new(MockStream {
            signal: self.signal,
            sample_rate: config.sample_rate,
            channels: config.channels,
            chunk_samples: config.chunk_samples(),
            position: 0,
        }))
    }
}

struct MockStream {
    signal: MockSignal,
    sample_rate: u32,
    channels: u16,
    chunk_samples: usize,
    position: u64,
}

impl CaptureStream for MockStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read(&mut self, _timeout: Duration) -> std::result::Result<Vec<f32>, CaptureError> {
        let frames = self.chunk_samples / usize::from(self.channels);
        let mut chunk = Vec::with_capacity(self.chunk_samples);
        for frame in 0..frames {
            let sample = match self.signal {
                MockSignal::Silence => 0.0,
                MockSignal::Sine { freq, amplitude } => {
                    let t = (self.position + frame as u64) as f32 / self.sample_rate as f32;
                    amplitude * (2.0 * PI * freq * t).sin()
                }
            };
            for _ in 0..self.channels {
                chunk.push(sample);
            }
        }
        self.position += frames as u64;
        Ok(chunk)
    }
}
