//! Preset export command.

use std::path::PathBuf;

use clap::Args;
use lumen_runtime::build_preset;

use super::common::offline_registry;

#[derive(Args)]
pub struct ExportArgs {
    /// Preset name to export
    preset: String,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Strip length to build the preset for
    #[arg(long, default_value = "100")]
    pixels: usize,
}

pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let registry = offline_registry(args.pixels);
    let graph = build_preset(&args.preset, &registry)?;
    let json = graph.to_document().to_json()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("Wrote {} to {}", args.preset, path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
