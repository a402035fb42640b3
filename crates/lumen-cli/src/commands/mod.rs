//! CLI command implementations.

pub mod common;
pub mod devices;
pub mod effects;
pub mod export;
pub mod presets;
pub mod run;
