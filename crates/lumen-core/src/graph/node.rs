//! Graph nodes: identity, hosted effect, and per-channel slots.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::effect::{Effect, TickError};
use crate::frame::{ChannelKind, ChannelValue};

use super::timing::Timing;

/// Unique, stable identifier for a graph node.
///
/// Ids survive serialization round-trips, so a control surface can keep
/// referring to a node across save and load. Fresh ids combine a wall-clock
/// timestamp with a process-wide counter; collisions would need two ids
/// minted in the same nanosecond from the same counter value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u128);

static NODE_COUNTER: AtomicU32 = AtomicU32::new(0);

impl NodeId {
    /// Mints a fresh id.
    pub fn fresh() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let counter = NODE_COUNTER.fetch_add(1, Ordering::Relaxed);
        NodeId((nanos << 32) | u128::from(counter))
    }

    /// Parses the hex form produced by [`Display`](std::fmt::Display).
    pub fn parse(s: &str) -> Option<Self> {
        u128::from_str_radix(s, 16).ok().map(NodeId)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// A node: one effect instance plus its channel slots and bookkeeping.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) effect: Box<dyn Effect>,
    /// Cached channel kinds, fixed at insertion.
    pub(crate) input_kinds: Vec<ChannelKind>,
    pub(crate) output_kinds: Vec<ChannelKind>,
    /// Latest produced values, one per output channel.
    pub(crate) output_slots: Vec<Option<ChannelValue>>,
    /// Error from the most recent tick, if any.
    pub(crate) error: Option<TickError>,
    pub(crate) update_timing: Timing,
    pub(crate) process_timing: Timing,
}

impl Node {
    pub(crate) fn new(id: NodeId, effect: Box<dyn Effect>) -> Self {
        let input_kinds = effect.input_kinds();
        let output_kinds = effect.output_kinds();
        let output_slots = vec![None; output_kinds.len()];
        Self {
            id,
            effect,
            input_kinds,
            output_kinds,
            output_slots,
            error: None,
            update_timing: Timing::default(),
            process_timing: Timing::default(),
        }
    }

    /// The node's stable identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The hosted effect.
    pub fn effect(&self) -> &dyn Effect {
        self.effect.as_ref()
    }

    /// Mutable access to the hosted effect.
    pub fn effect_mut(&mut self) -> &mut dyn Effect {
        self.effect.as_mut()
    }

    /// Kinds of the node's input channels.
    pub fn input_kinds(&self) -> &[ChannelKind] {
        &self.input_kinds
    }

    /// Kinds of the node's output channels.
    pub fn output_kinds(&self) -> &[ChannelKind] {
        &self.output_kinds
    }

    /// The value most recently produced on output channel `channel`.
    pub fn output(&self, channel: usize) -> Option<&ChannelValue> {
        self.output_slots.get(channel).and_then(Option::as_ref)
    }

    /// The error from the most recent tick, if the node is failing.
    pub fn error(&self) -> Option<&TickError> {
        self.error.as_ref()
    }

    /// Timing statistics for the update pass.
    pub fn update_timing(&self) -> &Timing {
        &self.update_timing
    }

    /// Timing statistics for the process pass.
    pub fn process_timing(&self) -> &Timing {
        &self.process_timing
    }

    /// Runs the effect's update, capturing errors and timings.
    pub(crate) fn run_update(&mut self, dt: f64, record_timings: bool) {
        let started = record_timings.then(std::time::Instant::now);
        let result = self.effect.update(dt);
        if let Some(started) = started {
            self.update_timing.record(started.elapsed().as_secs_f64());
        }
        self.absorb(result);
    }

    /// Runs the effect's process against gathered inputs.
    ///
    /// On error the output slots are cleared so downstream consumers see
    /// `None` instead of stale frames.
    pub(crate) fn run_process(&mut self, inputs: &[Option<ChannelValue>], record_timings: bool) {
        let mut outputs: Vec<Option<ChannelValue>> = vec![None; self.output_slots.len()];
        let started = record_timings.then(std::time::Instant::now);
        let result = self.effect.process(inputs, &mut outputs);
        if let Some(started) = started {
            self.process_timing.record(started.elapsed().as_secs_f64());
        }
        match result {
            Ok(()) => self.output_slots = outputs,
            Err(_) => self.output_slots.iter_mut().for_each(|s| *s = None),
        }
        self.absorb(result);
    }

    fn absorb(&mut self, result: Result<(), TickError>) {
        match result {
            Ok(()) => {
                if self.error.take().is_some() {
                    tracing::info!(node = %self.id, class = self.effect.class_name(), "node recovered");
                }
            }
            Err(err) => {
                if self.error.as_ref() != Some(&err) {
                    tracing::warn!(node = %self.id, class = self.effect.class_name(), error = %err, "node error");
                }
                self.error = Some(err);
            }
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("class", &self.effect.class_name())
            .field("inputs", &self.input_kinds.len())
            .field("outputs", &self.output_kinds.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let a = NodeId::fresh();
        let b = NodeId::fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn id_round_trips_through_hex() {
        let id = NodeId::fresh();
        let parsed = NodeId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(NodeId::parse("not-hex").is_none());
        assert!(NodeId::parse("").is_none());
    }
}
