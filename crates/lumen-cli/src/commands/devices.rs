//! Audio device listing command.

use clap::Args;
use lumen_io::{CaptureBackend, CpalBackend};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_devices()?;

    if devices.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }

    println!("Available Audio Input Devices");
    println!("=============================\n");

    for (idx, device) in devices.iter().enumerate() {
        let default = if device.is_default { " (default)" } else { "" };
        println!("  [{}] {}{}", idx, device.name, default);
    }

    println!();
    println!("Total: {} input(s)", devices.len());
    println!();
    println!("Tip: Use a device name with run:");
    println!("  lumen run --preset spectrum --device \"USB\"");

    Ok(())
}
