//! Core [`Effect`] trait: the behavior + parameter bundle hosted by a node.
//!
//! An effect declares a fixed set of input and output channels, a static
//! parameter schema, and splits its per-tick work into `update(dt)` (time
//! advance, may block; the audio source waits for its next chunk here) and
//! `process()` (pure input→output transform). The graph runtime owns the
//! slots; effects only ever see borrowed input slots and write their own
//! output slots.
//!
//! Re-applying parameters re-runs [`init_state`](Effect::init_state), which
//! drops transient filter memory but keeps identity and wiring.

use crate::frame::{ChannelKind, ChannelValue};
use crate::param::{ParamError, ParamMap, ParamSchema};

/// Error raised by a node's `update` or `process` during a tick.
///
/// Tick errors are captured into the owning node's error slot and cleared
/// on the node's next successful tick; they never poison the rest of the
/// graph. Fatal device errors additionally stop the frame loop's use of the
/// affected node.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TickError {
    /// A capture or transport device failed.
    #[error("device error: {message}")]
    Device {
        /// Human-readable cause.
        message: String,
        /// Whether the device is unusable from now on.
        fatal: bool,
    },

    /// The effect's own computation failed this tick.
    #[error("{0}")]
    Failed(String),
}

impl TickError {
    /// A recoverable device error (e.g. a capture overflow).
    pub fn device(message: impl Into<String>) -> Self {
        TickError::Device {
            message: message.into(),
            fatal: false,
        }
    }

    /// A fatal device error (e.g. the capture device cannot be opened).
    pub fn fatal_device(message: impl Into<String>) -> Self {
        TickError::Device {
            message: message.into(),
            fatal: true,
        }
    }

    /// Returns true for fatal device errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TickError::Device { fatal: true, .. })
    }
}

/// The unit of behavior hosted by a graph node.
///
/// Channel arity and kinds are fixed after construction; the runtime sizes
/// the node's slot vectors from them once and never again.
pub trait Effect: Send {
    /// Stable class tag used by the registry allow-list and serialization.
    fn class_name(&self) -> &'static str;

    /// Kinds of the input channels, in channel order.
    fn input_kinds(&self) -> Vec<ChannelKind>;

    /// Kinds of the output channels, in channel order.
    fn output_kinds(&self) -> Vec<ChannelKind>;

    /// Static parameter schema for this effect class.
    fn schema(&self) -> ParamSchema;

    /// Current parameter values, suitable for serialization.
    fn params(&self) -> ParamMap;

    /// Applies a (possibly partial) parameter update.
    ///
    /// Implementations validate against [`schema`](Effect::schema) first and
    /// must leave the effect unchanged on error. On success they re-run
    /// [`init_state`](Effect::init_state).
    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError>;

    /// Allocates working buffers and resets filter memory.
    ///
    /// Called once after construction, after graph load, and after every
    /// successful parameter update.
    fn init_state(&mut self);

    /// Advances time by `dt` seconds; may compute anything that does not
    /// depend on inputs. Only the audio source is allowed to block here.
    fn update(&mut self, dt: f64) -> Result<(), TickError> {
        let _ = dt;
        Ok(())
    }

    /// Reads input slots, writes output slots.
    ///
    /// `inputs[k]` is `None` when nothing is connected to channel `k` or the
    /// producer emitted nothing this tick; effects substitute their
    /// documented defaults (e.g. all-white color) or emit `None`.
    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError>;
}

/// Constructs effects from a serialized class tag and parameter map.
///
/// Implemented by the registry; the graph loader goes through this trait so
/// only allow-listed classes can ever be instantiated from a document.
pub trait EffectFactory {
    /// Creates an effect of class `class` with the given parameters.
    fn create(
        &self,
        class: &str,
        params: &ParamMap,
    ) -> Result<Box<dyn Effect>, crate::error::GraphError>;
}
