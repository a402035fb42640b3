//! Graph mutation and load errors.

use crate::frame::ChannelKind;
use crate::graph::NodeId;
use crate::param::ParamError;

/// Errors raised by graph mutations and document loading.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The referenced node does not exist in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// No connection matches the given endpoints.
    #[error("no connection {from}:{from_channel} -> {to}:{to_channel}")]
    ConnectionNotFound {
        /// Producer node.
        from: NodeId,
        /// Producer output channel.
        from_channel: usize,
        /// Consumer node.
        to: NodeId,
        /// Consumer input channel.
        to_channel: usize,
    },

    /// A channel index is past the effect's declared channel count.
    #[error("node {node} has no {direction} channel {channel} (has {count})")]
    ChannelOutOfRange {
        /// Node whose channel was referenced.
        node: NodeId,
        /// "input" or "output".
        direction: &'static str,
        /// Rejected channel index.
        channel: usize,
        /// Declared channel count.
        count: usize,
    },

    /// Producer and consumer channels carry different kinds.
    #[error("cannot connect {from} channel to {to} channel")]
    ChannelKindMismatch {
        /// Producer channel kind.
        from: ChannelKind,
        /// Consumer channel kind.
        to: ChannelKind,
    },

    /// The consumer input channel already has a producer.
    #[error("input channel {channel} of node {node} is already connected")]
    InputOccupied {
        /// Consumer node.
        node: NodeId,
        /// Occupied input channel.
        channel: usize,
    },

    /// This exact connection already exists.
    #[error("connection already exists")]
    DuplicateConnection,

    /// Adding the connection would create a cycle.
    #[error("connection would create a cycle")]
    CyclicGraph,

    /// A serialized document names an effect class outside the registry.
    #[error("unknown effect class '{0}'")]
    UnknownEffectClass(String),

    /// A parameter map failed schema validation.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// A graph document could not be parsed or written.
    #[error("graph document error: {0}")]
    Document(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Document(err.to_string())
    }
}
