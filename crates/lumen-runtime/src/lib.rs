//! Runtime glue: the frame loop that drives a graph, the control surface
//! that mutates it, and the built-in presets.

pub mod clock;
pub mod control;
pub mod frame_loop;
pub mod presets;

pub use clock::{Clock, MonotonicClock, VirtualClock};
pub use control::{ConnectionInfo, ControlError, ControlSurface, NodeInfo};
pub use frame_loop::FrameLoop;
pub use presets::{PRESET_NAMES, PresetError, build_preset};
