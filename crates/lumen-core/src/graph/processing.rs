//! [`FilterGraph`]: mutation API, topological ordering, and the tick passes.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use crate::effect::Effect;
use crate::error::GraphError;
use crate::frame::ChannelValue;
use crate::param::ParamMap;

use super::edge::Connection;
use super::node::{Node, NodeId};

/// A directed acyclic graph of effect nodes with typed channels.
///
/// Nodes and connections keep their insertion order; the topological order
/// used by the process pass breaks ties by insertion order, so two loads of
/// the same document always execute identically.
pub struct FilterGraph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    /// Indices into `nodes`, topologically sorted.
    order: Vec<usize>,
    record_timings: bool,
}

impl Default for FilterGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterGraph")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

impl FilterGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            order: Vec::new(),
            record_timings: false,
        }
    }

    /// Enables or disables per-node timing statistics.
    pub fn set_record_timings(&mut self, on: bool) {
        self.record_timings = on;
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates over the nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// The connections, in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Node ids in topological (execution) order.
    pub fn execution_order(&self) -> Vec<NodeId> {
        self.order.iter().map(|&i| self.nodes[i].id).collect()
    }

    /// Borrows a node by id.
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Mutably borrows a node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        let idx = self.index_of(id)?;
        Ok(&mut self.nodes[idx])
    }

    fn index_of(&self, id: NodeId) -> Result<usize, GraphError> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Adds an effect as a new node, returning its fresh id.
    ///
    /// The effect's state is initialized here; channel kinds are cached and
    /// fixed for the node's lifetime.
    pub fn add_effect(&mut self, effect: Box<dyn Effect>) -> NodeId {
        self.add_effect_with_id(NodeId::fresh(), effect)
    }

    /// Adds an effect under a caller-supplied id (document loading).
    pub(crate) fn add_effect_with_id(&mut self, id: NodeId, mut effect: Box<dyn Effect>) -> NodeId {
        effect.init_state();
        tracing::debug!(node = %id, class = effect.class_name(), "add node");
        self.nodes.push(Node::new(id, effect));
        // A node with no edges cannot create a cycle.
        self.order = self
            .compute_order()
            .expect("adding an unconnected node kept the graph acyclic");
        id
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Box<dyn Effect>, GraphError> {
        let idx = self.index_of(id)?;
        self.connections.retain(|c| c.from != id && c.to != id);
        let node = self.nodes.remove(idx);
        tracing::debug!(node = %id, class = node.effect.class_name(), "remove node");
        self.order = self
            .compute_order()
            .expect("removing a node kept the graph acyclic");
        Ok(node.effect)
    }

    /// Connects a producer output channel to a consumer input channel.
    ///
    /// Validates both endpoints (existence, channel range, kind match),
    /// rejects a second producer on the same input channel, and rejects any
    /// connection that would close a cycle, leaving the graph untouched.
    pub fn connect(
        &mut self,
        from: NodeId,
        from_channel: usize,
        to: NodeId,
        to_channel: usize,
    ) -> Result<(), GraphError> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;

        let out_kinds = &self.nodes[from_idx].output_kinds;
        let from_kind = *out_kinds
            .get(from_channel)
            .ok_or(GraphError::ChannelOutOfRange {
                node: from,
                direction: "output",
                channel: from_channel,
                count: out_kinds.len(),
            })?;
        let in_kinds = &self.nodes[to_idx].input_kinds;
        let to_kind = *in_kinds
            .get(to_channel)
            .ok_or(GraphError::ChannelOutOfRange {
                node: to,
                direction: "input",
                channel: to_channel,
                count: in_kinds.len(),
            })?;
        if from_kind != to_kind {
            return Err(GraphError::ChannelKindMismatch {
                from: from_kind,
                to: to_kind,
            });
        }

        let candidate = Connection {
            from,
            from_channel,
            to,
            to_channel,
        };
        if self.connections.contains(&candidate) {
            return Err(GraphError::DuplicateConnection);
        }
        if self
            .connections
            .iter()
            .any(|c| c.to == to && c.to_channel == to_channel)
        {
            return Err(GraphError::InputOccupied {
                node: to,
                channel: to_channel,
            });
        }

        self.connections.push(candidate);
        match self.compute_order() {
            Ok(order) => {
                self.order = order;
                tracing::debug!(
                    from = %from, from_channel, to = %to, to_channel, "connect"
                );
                Ok(())
            }
            Err(err) => {
                self.connections.pop();
                Err(err)
            }
        }
    }

    /// Removes one connection.
    pub fn disconnect(
        &mut self,
        from: NodeId,
        from_channel: usize,
        to: NodeId,
        to_channel: usize,
    ) -> Result<(), GraphError> {
        let target = Connection {
            from,
            from_channel,
            to,
            to_channel,
        };
        let idx = self
            .connections
            .iter()
            .position(|c| *c == target)
            .ok_or(GraphError::ConnectionNotFound {
                from,
                from_channel,
                to,
                to_channel,
            })?;
        self.connections.remove(idx);
        self.order = self
            .compute_order()
            .expect("removing a connection kept the graph acyclic");
        tracing::debug!(from = %from, from_channel, to = %to, to_channel, "disconnect");
        Ok(())
    }

    /// Applies a partial parameter update to one node.
    ///
    /// Validation happens inside the effect; on success its state is
    /// re-initialized with the merged parameters.
    pub fn set_node_params(&mut self, id: NodeId, params: &ParamMap) -> Result<(), GraphError> {
        let idx = self.index_of(id)?;
        self.nodes[idx].effect.set_params(params)?;
        tracing::debug!(node = %id, ?params, "set params");
        Ok(())
    }

    /// Kahn's algorithm with an insertion-order tie-break.
    ///
    /// Among the ready nodes the one inserted earliest runs first, so the
    /// schedule is a pure function of the document.
    fn compute_order(&self) -> Result<Vec<usize>, GraphError> {
        let n = self.nodes.len();
        // One id-to-index map per rebuild keeps the whole pass linear in
        // nodes plus connections.
        let index: HashMap<NodeId, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id, i))
            .collect();
        let mut indegree = vec![0usize; n];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for conn in &self.connections {
            let from = *index
                .get(&conn.from)
                .expect("connection endpoints always exist");
            let to = *index
                .get(&conn.to)
                .expect("connection endpoints always exist");
            adjacency[from].push(to);
            indegree[to] += 1;
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| indegree[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(idx);
            for &next in &adjacency[idx] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        if order.len() != n {
            return Err(GraphError::CyclicGraph);
        }
        Ok(order)
    }

    /// Runs one full tick: the concurrent update pass, then the sequential
    /// process pass.
    pub fn tick(&mut self, dt: f64) {
        self.update_all(dt);
        self.process_all();
    }

    /// Update pass: every node's `update(dt)` runs on its own scoped thread.
    ///
    /// The audio source blocks here waiting for its next chunk; running the
    /// pass concurrently turns that wait into the graph's natural pacing
    /// instead of a serial stall.
    pub fn update_all(&mut self, dt: f64) {
        let record = self.record_timings;
        std::thread::scope(|scope| {
            for node in &mut self.nodes {
                scope.spawn(move || node.run_update(dt, record));
            }
        });
    }

    /// Process pass: nodes run sequentially in topological order.
    ///
    /// Inputs are gathered by cloning producer output slots first (cheap
    /// `Arc` clones), then the consumer processes; a producer output can fan
    /// out to any number of consumers without copying pixel data.
    pub fn process_all(&mut self) {
        let record = self.record_timings;
        for i in 0..self.order.len() {
            let idx = self.order[i];
            let id = self.nodes[idx].id;
            let mut inputs: Vec<Option<ChannelValue>> =
                vec![None; self.nodes[idx].input_kinds.len()];
            for conn in &self.connections {
                if conn.to != id {
                    continue;
                }
                let producer = self
                    .nodes
                    .iter()
                    .position(|n| n.id == conn.from)
                    .expect("connection endpoints always exist");
                inputs[conn.to_channel] =
                    self.nodes[producer].output_slots[conn.from_channel].clone();
            }
            self.nodes[idx].run_process(&inputs, record);
        }
    }

    /// Re-initializes every node's state (after a load or a strip resize).
    pub fn init_all(&mut self) {
        for node in &mut self.nodes {
            node.effect.init_state();
            node.output_slots.iter_mut().for_each(|s| *s = None);
            node.error = None;
        }
    }

    /// True if any node currently holds a fatal device error.
    pub fn has_fatal_error(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| n.error.as_ref().is_some_and(crate::effect::TickError::is_fatal))
    }
}
