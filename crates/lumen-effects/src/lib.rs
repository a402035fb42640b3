//! The built-in effect library.
//!
//! Every node class a graph document can name lives here: the audio
//! capture source, spectral and level visualizers, pixel post-processing,
//! color generators, and the LED sink. Construction goes through an
//! [`EffectContext`] carrying the derived configuration (strip size, audio
//! rates) and the shared device collaborators.

mod afterglow;
mod append;
mod audio_input;
mod beat;
mod blend;
mod color;
mod combine;
mod context;
mod led_output;
mod mirror;
mod moving_light;
mod shift;
mod spectrum;
mod support;
mod vu;

pub use afterglow::AfterGlow;
pub use append::{Append, MAX_INPUTS};
pub use audio_input::AudioInput;
pub use beat::BeatFlash;
pub use blend::BlendMode;
pub use color::{ColorWheel, InterpolateHsv, InterpolateRgb, StaticColor};
pub use combine::Combine;
pub use context::EffectContext;
pub use led_output::LedOutput;
pub use mirror::Mirror;
pub use moving_light::MovingLight;
pub use shift::Shift;
pub use spectrum::Spectrum;
pub use vu::{VuMeterPeak, VuMeterRms};
