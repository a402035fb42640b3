//! Ready-made graphs.

use lumen_core::{EffectFactory, FilterGraph, GraphError, ParamMap, ParamValue};
use lumen_registry::Registry;
use thiserror::Error;

/// Errors building a preset.
#[derive(Debug, Error)]
pub enum PresetError {
    /// The preset name is not known.
    #[error("unknown preset: {0}")]
    Unknown(String),

    /// Construction or wiring failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Names of the built-in presets, in listing order.
pub const PRESET_NAMES: &[&str] = &["spectrum", "movinglight", "vu_peak", "beat"];

fn params(entries: &[(&str, ParamValue)]) -> ParamMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Builds a named preset graph through the registry.
pub fn build_preset(name: &str, registry: &Registry) -> Result<FilterGraph, PresetError> {
    let build = match name {
        "spectrum" => spectrum,
        "movinglight" => movinglight,
        "vu_peak" => vu_peak,
        "beat" => beat,
        other => return Err(PresetError::Unknown(other.to_string())),
    };
    build(registry).map_err(Into::into)
}

/// Two out-of-phase color wheels feeding the dual-band spectrum, softened
/// by an afterglow.
fn spectrum(registry: &Registry) -> Result<FilterGraph, GraphError> {
    let mut graph = FilterGraph::new();
    let audio = graph.add_effect(registry.create("audio_input", &ParamMap::new())?);
    let melody_wheel = graph.add_effect(registry.create(
        "color_wheel",
        &params(&[("cycle_time", 30.0.into())]),
    )?);
    let bass_wheel = graph.add_effect(registry.create(
        "color_wheel",
        &params(&[("cycle_time", 30.0.into()), ("offset", 15.0.into())]),
    )?);
    let spectrum = graph.add_effect(registry.create("spectrum", &ParamMap::new())?);
    let glow = graph.add_effect(registry.create(
        "afterglow",
        &params(&[("glow_time", 0.5.into())]),
    )?);
    let out = graph.add_effect(registry.create("led_output", &ParamMap::new())?);
    graph.connect(audio, 0, spectrum, 0)?;
    graph.connect(melody_wheel, 0, spectrum, 1)?;
    graph.connect(bass_wheel, 0, spectrum, 2)?;
    graph.connect(spectrum, 0, glow, 0)?;
    graph.connect(glow, 0, out, 0)?;
    Ok(graph)
}

/// A bass-driven pulse in a slowly rotating color.
fn movinglight(registry: &Registry) -> Result<FilterGraph, GraphError> {
    let mut graph = FilterGraph::new();
    let audio = graph.add_effect(registry.create("audio_input", &ParamMap::new())?);
    let wheel = graph.add_effect(registry.create("color_wheel", &ParamMap::new())?);
    let light = graph.add_effect(registry.create(
        "moving_light",
        &params(&[("speed", 30.0.into()), ("dim_time", 2.0.into())]),
    )?);
    let out = graph.add_effect(registry.create("led_output", &ParamMap::new())?);
    graph.connect(audio, 0, light, 0)?;
    graph.connect(wheel, 0, light, 1)?;
    graph.connect(light, 0, out, 0)?;
    Ok(graph)
}

/// Peak meter in a rotating color with a short afterglow.
fn vu_peak(registry: &Registry) -> Result<FilterGraph, GraphError> {
    let mut graph = FilterGraph::new();
    let audio = graph.add_effect(registry.create("audio_input", &ParamMap::new())?);
    let wheel = graph.add_effect(registry.create("color_wheel", &ParamMap::new())?);
    let meter = graph.add_effect(registry.create("vu_peak", &ParamMap::new())?);
    let glow = graph.add_effect(registry.create(
        "afterglow",
        &params(&[("glow_time", 0.5.into())]),
    )?);
    let out = graph.add_effect(registry.create("led_output", &ParamMap::new())?);
    graph.connect(audio, 0, meter, 0)?;
    graph.connect(wheel, 0, meter, 1)?;
    graph.connect(meter, 0, glow, 0)?;
    graph.connect(glow, 0, out, 0)?;
    Ok(graph)
}

/// Full-strip flashes on bass onsets.
fn beat(registry: &Registry) -> Result<FilterGraph, GraphError> {
    let mut graph = FilterGraph::new();
    let audio = graph.add_effect(registry.create("audio_input", &ParamMap::new())?);
    let wheel = graph.add_effect(registry.create("color_wheel", &ParamMap::new())?);
    let flash = graph.add_effect(registry.create("beat_flash", &ParamMap::new())?);
    let out = graph.add_effect(registry.create("led_output", &ParamMap::new())?);
    graph.connect(audio, 0, flash, 0)?;
    graph.connect(wheel, 0, flash, 1)?;
    graph.connect(flash, 0, out, 0)?;
    Ok(graph)
}
