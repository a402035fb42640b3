//! Preset listing command.

use clap::Args;
use lumen_runtime::{PRESET_NAMES, build_preset};

use super::common::offline_registry;

#[derive(Args)]
pub struct PresetsArgs {}

pub fn run(_args: PresetsArgs) -> anyhow::Result<()> {
    let registry = offline_registry(100);

    println!("Built-in Presets");
    println!("================\n");

    for name in PRESET_NAMES {
        let graph = build_preset(name, &registry)?;
        println!(
            "  {:12}  {} node(s), {} connection(s)",
            name,
            graph.node_count(),
            graph.connections().len()
        );
    }

    println!();
    println!("Run one:    lumen run --preset spectrum");
    println!("Export one: lumen export spectrum");
    Ok(())
}
