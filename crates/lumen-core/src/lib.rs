//! Core effect-graph runtime for the lumen LED visualizer.
//!
//! This crate defines the pieces everything else builds on:
//!
//! - [`Effect`]: the node behavior trait (typed channels, parameter schema,
//!   the update/process tick split);
//! - [`PixelFrame`] and [`ChannelValue`]: the payloads that flow along
//!   connections;
//! - [`FilterGraph`]: the DAG itself, with validated mutations, topological
//!   scheduling, per-node error isolation and timing statistics;
//! - [`GraphDoc`]: the persisted JSON form, loaded through an
//!   [`EffectFactory`] allow-list.
//!
//! It deliberately knows nothing about audio capture, LED transports or
//! concrete effects; those live in `lumen-io` and `lumen-effects`.

pub mod effect;
pub mod error;
pub mod frame;
pub mod graph;
pub mod param;

pub use effect::{Effect, EffectFactory, TickError};
pub use error::GraphError;
pub use frame::{ChannelKind, ChannelValue, PixelFrame};
pub use graph::{Connection, FilterGraph, GraphDoc, Node, NodeId, Timing};
pub use param::{ParamError, ParamMap, ParamSchema, ParamSpec, ParamValue};
