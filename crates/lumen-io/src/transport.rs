//! LED strip transports.
//!
//! A [`LedTransport`] takes the sink's final integral frame and pushes it to
//! hardware. Supported protocols:
//!
//! - [`UdpTransport`]: one datagram of `[index, r, g, b]` records, the
//!   ESP8266 firmware format (256 pixels max);
//! - [`OpcTransport`]: Open Pixel Control over TCP with lazy reconnect;
//! - [`SerialTransport`]: gamma-corrected GRB triples to a character
//!   device;
//! - [`NullTransport`] / [`TestTransport`]: discard or record frames.

use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::time::Duration;

use lumen_core::PixelFrame;

use crate::gamma::gamma_correct;
use crate::{Error, Result};

/// Most pixels addressable by the UDP record format's one-byte index.
pub const UDP_MAX_PIXELS: usize = 256;

/// Output end of the pipeline.
///
/// `show` is called once per frame with values already clamped to
/// `[0, 255]` and rounded by the sink.
pub trait LedTransport: Send {
    /// Transport name for logs and CLI listings.
    fn name(&self) -> &str;

    /// Pushes one frame to the device.
    fn show(&mut self, frame: &PixelFrame) -> Result<()>;
}

/// Packs a frame into interleaved `[r, g, b]` bytes.
pub fn pack_rgb(frame: &PixelFrame) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() * 3);
    for pixel in 0..frame.len() {
        for channel in 0..3 {
            out.push(frame.get(channel, pixel).clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// Datagram transport for ESP8266-style firmware.
///
/// Each pixel becomes a 4-byte `[index, r, g, b]` record; all records go
/// out in a single datagram per frame.
pub struct UdpTransport {
    socket: UdpSocket,
    target: String,
}

impl UdpTransport {
    /// Creates a transport sending to `target` (`host:port`).
    pub fn new(target: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(target)?;
        Ok(Self {
            socket,
            target: target.to_string(),
        })
    }
}

impl LedTransport for UdpTransport {
    fn name(&self) -> &str {
        "udp"
    }

    fn show(&mut self, frame: &PixelFrame) -> Result<()> {
        if frame.len() > UDP_MAX_PIXELS {
            return Err(Error::Transport(format!(
                "udp transport addresses at most {UDP_MAX_PIXELS} pixels, strip has {}",
                frame.len()
            )));
        }
        let mut message = Vec::with_capacity(frame.len() * 4);
        for pixel in 0..frame.len() {
            message.push(pixel as u8);
            for channel in 0..3 {
                message.push(frame.get(channel, pixel).clamp(0.0, 255.0) as u8);
            }
        }
        self.socket.send(&message).map_err(|e| {
            Error::Transport(format!("udp send to {} failed: {e}", self.target))
        })?;
        Ok(())
    }
}

/// Open Pixel Control client.
///
/// Connects lazily on the first frame and reconnects on the next frame
/// after a send failure, so a restarting OPC server only costs the frames
/// sent while it was down.
pub struct OpcTransport {
    server: String,
    channel: u8,
    stream: Option<TcpStream>,
}

impl OpcTransport {
    /// Creates a client for `server` (`host:port`) on the given channel.
    pub fn new(server: &str, channel: u8) -> Self {
        Self {
            server: server.to_string(),
            channel,
            stream: None,
        }
    }

    fn ensure_connected(&mut self) -> Result<&mut TcpStream> {
        if self.stream.is_none() {
            let stream = TcpStream::connect(&self.server)
                .map_err(|e| Error::Transport(format!("opc connect to {}: {e}", self.server)))?;
            stream
                .set_write_timeout(Some(Duration::from_secs(1)))
                .map_err(Error::Io)?;
            tracing::info!(server = %self.server, "opc connected");
            self.stream = Some(stream);
        }
        self.stream
            .as_mut()
            .ok_or_else(|| Error::Transport("opc stream unavailable".into()))
    }
}

impl LedTransport for OpcTransport {
    fn name(&self) -> &str {
        "opc"
    }

    fn show(&mut self, frame: &PixelFrame) -> Result<()> {
        let data = pack_rgb(frame);
        let len = data.len();
        let mut message = Vec::with_capacity(4 + len);
        // Set-pixel-colors command: channel, command 0, big-endian length.
        message.push(self.channel);
        message.push(0);
        message.push((len >> 8) as u8);
        message.push((len & 0xff) as u8);
        message.extend_from_slice(&data);

        let channel = self.channel;
        let result = self
            .ensure_connected()
            .and_then(|stream| stream.write_all(&message).map_err(Error::Io));
        if let Err(err) = result {
            // Drop the connection; the next frame retries.
            self.stream = None;
            tracing::warn!(channel, error = %err, "opc send failed, will reconnect");
            return Err(err);
        }
        Ok(())
    }
}

/// Gamma-corrected GRB output to a serial character device.
///
/// The byte order matches BlinkStick-class controllers: `[g, r, b]` per
/// pixel after gamma correction.
pub struct SerialTransport {
    device: std::fs::File,
    path: String,
}

impl SerialTransport {
    /// Opens the character device at `path` for writing.
    pub fn new(path: &str) -> Result<Self> {
        let device = std::fs::OpenOptions::new().write(true).open(path)?;
        Ok(Self {
            device,
            path: path.to_string(),
        })
    }
}

impl LedTransport for SerialTransport {
    fn name(&self) -> &str {
        "serial"
    }

    fn show(&mut self, frame: &PixelFrame) -> Result<()> {
        let mut message = Vec::with_capacity(frame.len() * 3);
        for pixel in 0..frame.len() {
            let r = gamma_correct(frame.get(0, pixel).clamp(0.0, 255.0) as u8);
            let g = gamma_correct(frame.get(1, pixel).clamp(0.0, 255.0) as u8);
            let b = gamma_correct(frame.get(2, pixel).clamp(0.0, 255.0) as u8);
            message.extend_from_slice(&[g, r, b]);
        }
        self.device.write_all(&message).map_err(|e| {
            Error::Transport(format!("serial write to {} failed: {e}", self.path))
        })?;
        self.device.flush().map_err(Error::Io)?;
        Ok(())
    }
}

/// Discards every frame. Useful for headless benchmarking.
#[derive(Default)]
pub struct NullTransport;

impl LedTransport for NullTransport {
    fn name(&self) -> &str {
        "null"
    }

    fn show(&mut self, _frame: &PixelFrame) -> Result<()> {
        Ok(())
    }
}

/// Records frames for assertions in tests.
///
/// Clones share the same recording, so a test can hand one clone to the
/// pipeline and keep another to inspect what was shown.
#[derive(Default, Clone)]
pub struct TestTransport {
    frames: std::sync::Arc<std::sync::Mutex<Vec<PixelFrame>>>,
}

impl TestTransport {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame shown so far, in order.
    pub fn frames(&self) -> Vec<PixelFrame> {
        self.frames.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// The most recent frame, if any.
    pub fn last(&self) -> Option<PixelFrame> {
        self.frames.lock().ok().and_then(|f| f.last().cloned())
    }

    /// Number of frames shown so far.
    pub fn len(&self) -> usize {
        self.frames.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// Returns true if no frame was shown yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedTransport for TestTransport {
    fn name(&self) -> &str {
        "test"
    }

    fn show(&mut self, frame: &PixelFrame) -> Result<()> {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(frame.clone());
        }
        Ok(())
    }
}
