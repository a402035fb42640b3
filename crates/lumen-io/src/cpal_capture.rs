//! cpal-based capture backend.
//!
//! cpal streams are not `Send`, so the stream lives on a dedicated thread
//! that owns it for its whole life. The audio callback slices the incoming
//! data into fixed-size chunks and pushes them into a small bounded queue;
//! [`CaptureStream::read`] blocks on that queue with a condvar. When the
//! queue is full the oldest chunk is dropped and counted, surfacing as a
//! recoverable [`CaptureError::Overflow`] on the next read.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::capture::{AudioDevice, CaptureBackend, CaptureConfig, CaptureError, CaptureStream};
use crate::{Error, Result};

/// Chunks buffered between the audio callback and the graph before the
/// oldest is dropped.
const QUEUE_DEPTH: usize = 8;

/// Capture backend wrapping the system audio API through cpal.
#[derive(Default)]
pub struct CpalBackend;

impl CpalBackend {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        let host = cpal::default_host();
        let default_name = host
            .default_input_device()
            .and_then(|d| d.name().ok());
        let devices = host
            .input_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;
        Ok(devices
            .filter_map(|d| d.name().ok())
            .map(|name| AudioDevice {
                is_default: Some(&name) == default_name.as_ref(),
                name,
            })
            .collect())
    }

    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureStream>> {
        let stream = CpalStream::open(config)?;
        Ok(Box::new(stream))
    }
}

struct QueueState {
    chunks: VecDeque<Vec<f32>>,
    dropped: usize,
    dead: Option<String>,
}

struct Shared {
    queue: Mutex<QueueState>,
    cond: Condvar,
}

/// An open cpal capture stream.
pub struct CpalStream {
    shared: Arc<Shared>,
    sample_rate: u32,
    channels: u16,
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalStream {
    fn open(config: &CaptureConfig) -> Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                chunks: VecDeque::new(),
                dropped: 0,
                dead: None,
            }),
            cond: Condvar::new(),
        });

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32>>();

        let thread_shared = Arc::clone(&shared);
        let thread_config = config.clone();
        let thread = std::thread::Builder::new()
            .name("lumen-capture".into())
            .spawn(move || run_stream_thread(&thread_config, &thread_shared, &ready_tx, &shutdown_rx))
            .map_err(Error::Io)?;

        match ready_rx
            .recv()
            .map_err(|_| Error::Stream("capture thread died during setup".into()))?
        {
            Ok(sample_rate) => Ok(Self {
                shared,
                sample_rate,
                channels: config.channels,
                shutdown: Some(shutdown_tx),
                thread: Some(thread),
            }),
            Err(err) => {
                let _ = thread.join();
                Err(err)
            }
        }
    }
}

fn run_stream_thread(
    config: &CaptureConfig,
    shared: &Arc<Shared>,
    ready_tx: &mpsc::Sender<Result<u32>>,
    shutdown_rx: &mpsc::Receiver<()>,
) {
    let built = build_stream(config, shared);
    match built {
        Ok((stream, sample_rate)) => {
            if stream.play().is_err() {
                let _ = ready_tx.send(Err(Error::Stream("failed to start capture".into())));
                return;
            }
            let _ = ready_tx.send(Ok(sample_rate));
            // Keep the stream alive until the handle is dropped.
            let _ = shutdown_rx.recv();
            drop(stream);
        }
        Err(err) => {
            let _ = ready_tx.send(Err(err));
        }
    }
}

fn build_stream(
    config: &CaptureConfig,
    shared: &Arc<Shared>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = match &config.device_name {
        Some(name) => host
            .input_devices()
            .map_err(|e| Error::Stream(e.to_string()))?
            .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
            .ok_or_else(|| Error::DeviceNotFound(name.clone()))?,
        None => host.default_input_device().ok_or(Error::NoDevice)?,
    };

    let default_config = device
        .default_input_config()
        .map_err(|e| Error::Stream(e.to_string()))?;
    if default_config.sample_format() != cpal::SampleFormat::F32 {
        return Err(Error::UnsupportedConfig(format!(
            "sample format {:?}",
            default_config.sample_format()
        )));
    }
    // Prefer the requested rate; fall back to the device default.
    let sample_rate = if config.sample_rate > 0 {
        config.sample_rate
    } else {
        default_config.sample_rate().0
    };
    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let chunk_samples = config.chunk_samples();
    let callback_shared = Arc::clone(shared);
    let mut pending: Vec<f32> = Vec::with_capacity(chunk_samples);
    let data_callback = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        pending.extend_from_slice(data);
        while pending.len() >= chunk_samples {
            let chunk: Vec<f32> = pending.drain(..chunk_samples).collect();
            let mut queue = callback_shared
                .queue
                .lock()
                .expect("capture queue poisoned");
            if queue.chunks.len() >= QUEUE_DEPTH {
                queue.chunks.pop_front();
                queue.dropped += 1;
            }
            queue.chunks.push_back(chunk);
            drop(queue);
            callback_shared.cond.notify_one();
        }
    };

    let error_shared = Arc::clone(shared);
    let error_callback = move |err: cpal::StreamError| {
        tracing::error!(error = %err, "capture stream error");
        let mut queue = error_shared.queue.lock().expect("capture queue poisoned");
        queue.dead = Some(err.to_string());
        drop(queue);
        error_shared.cond.notify_all();
    };

    let stream = device
        .build_input_stream(&stream_config, data_callback, error_callback, None)
        .map_err(|e| Error::Stream(e.to_string()))?;
    tracing::info!(
        device = device.name().unwrap_or_default(),
        sample_rate,
        channels = config.channels,
        "capture stream opened"
    );
    Ok((stream, sample_rate))
}

impl CaptureStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read(&mut self, timeout: Duration) -> std::result::Result<Vec<f32>, CaptureError> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.shared.queue.lock().expect("capture queue poisoned");
        loop {
            if let Some(msg) = &queue.dead {
                return Err(CaptureError::Device(msg.clone()));
            }
            if queue.dropped > 0 {
                let dropped = std::mem::take(&mut queue.dropped);
                return Err(CaptureError::Overflow(dropped));
            }
            if let Some(chunk) = queue.chunks.pop_front() {
                return Ok(chunk);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(CaptureError::Timeout(timeout));
            }
            let (guard, _) = self
                .shared
                .cond
                .wait_timeout(queue, remaining)
                .expect("capture queue poisoned");
            queue = guard;
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        // Closing the channel wakes the stream thread and drops the stream.
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
