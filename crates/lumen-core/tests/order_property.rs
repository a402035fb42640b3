//! Property tests for execution-order invariants over random DAGs.

use lumen_core::{
    ChannelKind, ChannelValue, Effect, FilterGraph, NodeId, ParamError, ParamMap, ParamSchema,
    TickError,
};
use proptest::prelude::*;

const FAN_IN: usize = 4;

/// Pixel relay with a fixed fan-in, for wiring arbitrary DAG shapes.
struct Relay;

impl Effect for Relay {
    fn class_name(&self) -> &'static str {
        "test.relay"
    }
    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels; FAN_IN]
    }
    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }
    fn schema(&self) -> ParamSchema {
        ParamSchema::new()
    }
    fn params(&self) -> ParamMap {
        ParamMap::new()
    }
    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)
    }
    fn init_state(&mut self) {}
    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        outputs[0] = inputs.iter().flatten().next().cloned();
        Ok(())
    }
}

/// Canonicalizes raw triples into valid forward edges for `n` nodes: each
/// edge runs from a lower to a higher insertion index and no input channel
/// gets two producers.
fn forward_edges(n: usize, raw: &[(u8, u8, u8)]) -> Vec<(usize, usize, usize)> {
    let mut used = std::collections::HashSet::new();
    let mut edges = Vec::new();
    for &(a, b, c) in raw {
        let from = a as usize % n;
        let to = b as usize % n;
        let channel = c as usize % FAN_IN;
        if from < to && used.insert((to, channel)) {
            edges.push((from, to, channel));
        }
    }
    edges
}

fn build(n: usize, edges: &[(usize, usize, usize)]) -> (FilterGraph, Vec<NodeId>) {
    let mut graph = FilterGraph::new();
    let ids: Vec<NodeId> = (0..n).map(|_| graph.add_effect(Box::new(Relay))).collect();
    for &(from, to, channel) in edges {
        graph
            .connect(ids[from], 0, ids[to], channel)
            .expect("forward edges cannot cycle");
    }
    (graph, ids)
}

proptest! {
    #[test]
    fn execution_order_is_topological(
        n in 2_usize..10,
        raw in proptest::collection::vec((any::<u8>(), any::<u8>(), any::<u8>()), 0..40),
    ) {
        let edges = forward_edges(n, &raw);
        let (graph, ids) = build(n, &edges);
        let order = graph.execution_order();
        prop_assert_eq!(order.len(), n);

        let position = |id: NodeId| order.iter().position(|&o| o == id).unwrap();
        for &(from, to, _) in &edges {
            prop_assert!(position(ids[from]) < position(ids[to]));
        }
    }

    #[test]
    fn execution_order_is_deterministic(
        n in 2_usize..10,
        raw in proptest::collection::vec((any::<u8>(), any::<u8>(), any::<u8>()), 0..40),
    ) {
        let edges = forward_edges(n, &raw);
        let (first, first_ids) = build(n, &edges);
        let (second, second_ids) = build(n, &edges);

        // Same shape, fresh ids: compare by insertion index.
        let as_indices = |order: Vec<NodeId>, ids: &[NodeId]| -> Vec<usize> {
            order
                .into_iter()
                .map(|id| ids.iter().position(|&candidate| candidate == id).unwrap())
                .collect()
        };
        prop_assert_eq!(
            as_indices(first.execution_order(), &first_ids),
            as_indices(second.execution_order(), &second_ids)
        );
    }
}
