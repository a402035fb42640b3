//! Run a graph against a strip.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use clap::{Args, ValueEnum};
use lumen_core::{FilterGraph, GraphDoc};
use lumen_effects::EffectContext;
use lumen_io::{
    AudioDevice, CaptureBackend, CaptureConfig, CaptureStream, CpalBackend, LedTransport,
    MockBackend, MockSignal, NullTransport, OpcTransport, SerialTransport, UdpTransport,
};
use lumen_registry::Registry;
use lumen_runtime::{FrameLoop, MonotonicClock, build_preset};

#[derive(Args)]
pub struct RunArgs {
    /// Built-in preset to run
    #[arg(short, long)]
    preset: Option<String>,

    /// Saved graph document (JSON) to run
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// LED transport protocol
    #[arg(short, long, value_enum, default_value_t = TransportKind::Null)]
    transport: TransportKind,

    /// Transport target: `host:port` for udp/opc, device path for serial
    #[arg(long)]
    target: Option<String>,

    /// OPC channel number
    #[arg(long, default_value = "0")]
    opc_channel: u8,

    /// Number of pixels on the strip
    #[arg(long, default_value = "100")]
    pixels: usize,

    /// Audio sample rate in Hz
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Frames per second
    #[arg(long, default_value = "60")]
    rate: u32,

    /// Audio input device name (substring match, system default if omitted)
    #[arg(long)]
    device: Option<String>,

    /// Use a synthetic 440 Hz tone instead of a real audio device
    #[arg(long)]
    mock: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TransportKind {
    Udp,
    Opc,
    Serial,
    Null,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let transport = make_transport(&args)?;
    let capture = make_capture(&args);

    let ctx = EffectContext {
        sample_rate: args.sample_rate as f32,
        num_pixels: args.pixels,
        chunk_rate: args.rate as f32,
        capture,
        transport: Arc::new(Mutex::new(transport)),
    };
    let registry = Registry::new(ctx.clone());

    let graph = match (&args.preset, &args.graph) {
        (Some(name), None) => build_preset(name, &registry)?,
        (None, Some(path)) => {
            let json = std::fs::read_to_string(path)?;
            FilterGraph::from_document(&GraphDoc::from_json(&json)?, &registry)?
        }
        _ => anyhow::bail!("Specify exactly one of --preset or --graph"),
    };

    println!("Running {} node(s) at {} fps", graph.node_count(), args.rate);
    println!("  Pixels:    {}", args.pixels);
    println!("  Transport: {}", transport_name(args.transport));
    println!("\nPress Ctrl+C to stop...\n");

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        flag.store(true, Ordering::SeqCst);
    })?;

    let graph = Arc::new(RwLock::new(graph));
    let mut frame_loop = FrameLoop::new(graph, ctx, MonotonicClock::new(), shutdown);
    frame_loop.run();

    println!(
        "Done: {} frame(s), {} deadline miss(es)",
        frame_loop.ticks(),
        frame_loop.deadline_misses()
    );
    Ok(())
}

fn transport_name(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::Udp => "udp",
        TransportKind::Opc => "opc",
        TransportKind::Serial => "serial",
        TransportKind::Null => "null",
    }
}

fn make_transport(args: &RunArgs) -> anyhow::Result<Box<dyn LedTransport>> {
    let target = |what: &str| {
        args.target
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--target is required for the {} transport", what))
    };
    Ok(match args.transport {
        TransportKind::Udp => Box::new(UdpTransport::new(&target("udp")?)?),
        TransportKind::Opc => Box::new(OpcTransport::new(&target("opc")?, args.opc_channel)),
        TransportKind::Serial => Box::new(SerialTransport::new(&target("serial")?)?),
        TransportKind::Null => Box::new(NullTransport),
    })
}

fn make_capture(args: &RunArgs) -> Arc<dyn CaptureBackend> {
    if args.mock {
        return Arc::new(MockBackend::new(MockSignal::Sine {
            freq: 440.0,
            amplitude: 0.25,
        }));
    }
    match &args.device {
        Some(name) => Arc::new(NamedDeviceBackend {
            inner: CpalBackend::new(),
            device: name.clone(),
        }),
        None => Arc::new(CpalBackend::new()),
    }
}

/// Wraps a backend so every open targets a specific device.
struct NamedDeviceBackend {
    inner: CpalBackend,
    device: String,
}

impl CaptureBackend for NamedDeviceBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_devices(&self) -> lumen_io::Result<Vec<AudioDevice>> {
        self.inner.list_devices()
    }

    fn open(&self, config: &CaptureConfig) -> lumen_io::Result<Box<dyn CaptureStream>> {
        let mut config = config.clone();
        config.device_name = Some(self.device.clone());
        self.inner.open(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_args() -> RunArgs {
        RunArgs {
            preset: Some("beat".to_string()),
            graph: None,
            transport: TransportKind::Null,
            target: None,
            opc_channel: 0,
            pixels: 60,
            sample_rate: 44100,
            rate: 60,
            device: None,
            mock: true,
        }
    }

    #[test]
    fn udp_without_target_is_rejected() {
        let args = RunArgs {
            transport: TransportKind::Udp,
            ..null_args()
        };
        assert!(make_transport(&args).is_err());
    }

    #[test]
    fn null_transport_needs_no_target() {
        assert!(make_transport(&null_args()).is_ok());
    }

    #[test]
    fn mock_flag_selects_the_mock_backend() {
        let capture = make_capture(&null_args());
        assert_eq!(capture.name(), "mock");
    }
}
