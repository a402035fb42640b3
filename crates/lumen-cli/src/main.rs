//! `lumen` - audio-reactive LED effect graphs from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(author, version, about = "Audio-reactive LED visualizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a preset or saved graph against an LED strip
    Run(commands::run::RunArgs),

    /// List available audio input devices
    Devices(commands::devices::DevicesArgs),

    /// List available effect classes and their parameters
    Effects(commands::effects::EffectsArgs),

    /// List built-in presets
    Presets(commands::presets::PresetsArgs),

    /// Export a built-in preset as a graph document
    Export(commands::export::ExportArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Export(args) => commands::export::run(args),
    }
}
