//! Directed, channel-addressed connections between nodes.

use super::node::NodeId;

/// One directed connection from a producer output channel to a consumer
/// input channel.
///
/// A producer channel may fan out to any number of consumers; a consumer
/// input channel accepts at most one producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Producer node.
    pub from: NodeId,
    /// Producer output channel.
    pub from_channel: usize,
    /// Consumer node.
    pub to: NodeId,
    /// Consumer input channel.
    pub to_channel: usize,
}
