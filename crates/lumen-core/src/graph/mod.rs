//! The effect graph: nodes, typed connections, and the two-pass tick.
//!
//! A [`FilterGraph`] owns a set of nodes (each hosting a boxed
//! [`Effect`](crate::effect::Effect)) and directed connections between typed
//! channels. Mutations (add, remove, connect, disconnect) validate channel
//! ranges and kinds, reject duplicate producers on an input channel, and keep
//! a topological order current; a connection that would close a cycle is
//! rolled back and reported.
//!
//! Each tick runs two passes over the nodes:
//!
//! 1. **update(dt)**: every node concurrently, so the audio source can block
//!    on its device without stalling the rest of the graph;
//! 2. **process**: sequentially in topological order, copying producer
//!    output slots (cheap `Arc` clones) into consumer inputs.
//!
//! Per-node errors are captured, logged once on transition, and cleared on
//! the next good tick; one failing node never takes the graph down.

mod edge;
mod node;
mod processing;
mod serialize;
mod timing;

pub use edge::Connection;
pub use node::{Node, NodeId};
pub use processing::FilterGraph;
pub use serialize::{ConnectionDoc, GraphDoc, NodeDoc};
pub use timing::Timing;
