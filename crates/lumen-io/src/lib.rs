//! Device edges of the lumen pipeline: audio capture in, LED frames out.
//!
//! Capture goes through the object-safe [`CaptureBackend`] trait, with a
//! cpal implementation for real devices and a deterministic mock for tests.
//! On the output side, [`LedTransport`] abstracts over the supported strip
//! protocols: raw UDP records, Open Pixel Control over TCP, gamma-corrected
//! GRB over a serial character device, and a null/test sink.

pub mod capture;
pub mod cpal_capture;
pub mod gamma;
pub mod mock;
pub mod transport;

pub use capture::{
    AudioDevice, CaptureBackend, CaptureConfig, CaptureError, CaptureStream,
};
pub use cpal_capture::CpalBackend;
pub use gamma::{GAMMA_TABLE, gamma_correct};
pub use mock::{MockBackend, MockSignal};
pub use transport::{
    LedTransport, NullTransport, OpcTransport, SerialTransport, TestTransport, UdpTransport,
    pack_rgb,
};

/// Error type for device setup and LED output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No audio input device available on the system.
    #[error("no audio input device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("audio device not found: {0}")]
    DeviceNotFound(String),

    /// The backend rejected the capture configuration.
    #[error("unsupported capture configuration: {0}")]
    UnsupportedConfig(String),

    /// Audio stream setup or runtime error.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// An LED transport rejected the frame.
    #[error("LED transport error: {0}")]
    Transport(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for device operations.
pub type Result<T> = std::result::Result<T, Error>;
