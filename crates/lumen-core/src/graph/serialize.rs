//! Graph documents: the persisted JSON form of a [`FilterGraph`].
//!
//! A document stores nodes as `{id, effect_class, parameters}` and
//! connections as id/channel 4-tuples. Loading goes through an
//! [`EffectFactory`], so only allow-listed effect classes can be
//! instantiated, and re-uses the normal mutation API so every load gets the
//! same validation as live edits.

use serde::{Deserialize, Serialize};

use crate::effect::EffectFactory;
use crate::error::GraphError;
use crate::param::ParamMap;

use super::node::NodeId;
use super::processing::FilterGraph;

/// Serialized form of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDoc {
    /// Hex node id.
    pub id: String,
    /// Registry class tag.
    pub effect_class: String,
    /// Full parameter map at save time.
    pub parameters: ParamMap,
}

/// Serialized form of one connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDoc {
    /// Producer node id.
    pub from_id: String,
    /// Producer output channel.
    pub from_channel: usize,
    /// Consumer node id.
    pub to_id: String,
    /// Consumer input channel.
    pub to_channel: usize,
}

/// A complete persisted graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDoc {
    /// Nodes in insertion order.
    pub nodes: Vec<NodeDoc>,
    /// Connections in insertion order.
    pub connections: Vec<ConnectionDoc>,
}

impl GraphDoc {
    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FilterGraph {
    /// Captures the graph as a document.
    ///
    /// Node ids, parameters and both insertion orders are preserved, so a
    /// save/load round-trip reproduces the execution order exactly.
    pub fn to_document(&self) -> GraphDoc {
        GraphDoc {
            nodes: self
                .nodes()
                .map(|n| NodeDoc {
                    id: n.id().to_string(),
                    effect_class: n.effect().class_name().to_string(),
                    parameters: n.effect().params(),
                })
                .collect(),
            connections: self
                .connections()
                .iter()
                .map(|c| ConnectionDoc {
                    from_id: c.from.to_string(),
                    from_channel: c.from_channel,
                    to_id: c.to.to_string(),
                    to_channel: c.to_channel,
                })
                .collect(),
        }
    }

    /// Builds a graph from a document via the given factory.
    ///
    /// Every connection passes the same validation as a live `connect`
    /// call, so a hand-edited document cannot smuggle in a cycle or a kind
    /// mismatch.
    pub fn from_document(doc: &GraphDoc, factory: &dyn EffectFactory) -> Result<Self, GraphError> {
        let mut graph = FilterGraph::new();
        for node in &doc.nodes {
            let id = NodeId::parse(&node.id)
                .ok_or_else(|| GraphError::Document(format!("bad node id '{}'", node.id)))?;
            let effect = factory.create(&node.effect_class, &node.parameters)?;
            graph.add_effect_with_id(id, effect);
        }
        for conn in &doc.connections {
            let from = NodeId::parse(&conn.from_id)
                .ok_or_else(|| GraphError::Document(format!("bad node id '{}'", conn.from_id)))?;
            let to = NodeId::parse(&conn.to_id)
                .ok_or_else(|| GraphError::Document(format!("bad node id '{}'", conn.to_id)))?;
            graph.connect(from, conn.from_channel, to, conn.to_channel)?;
        }
        tracing::info!(
            nodes = doc.nodes.len(),
            connections = doc.connections.len(),
            "graph loaded"
        );
        Ok(graph)
    }
}
