//! Save/load round-trip behavior of graph documents.

use lumen_core::{
    ChannelKind, ChannelValue, Effect, EffectFactory, FilterGraph, GraphDoc, GraphError, ParamError,
    ParamMap, ParamSchema, TickError,
};

/// Minimal gain effect with one numeric parameter.
struct Gain {
    gain: f64,
}

impl Gain {
    fn schema_static() -> ParamSchema {
        ParamSchema::new().number("gain", 1.0, 0.0, 10.0, 0.01)
    }
}

impl Effect for Gain {
    fn class_name(&self) -> &'static str {
        "test.gain"
    }
    fn input_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }
    fn output_kinds(&self) -> Vec<ChannelKind> {
        vec![ChannelKind::Pixels]
    }
    fn schema(&self) -> ParamSchema {
        Self::schema_static()
    }
    fn params(&self) -> ParamMap {
        let mut map = ParamMap::new();
        map.insert("gain".into(), self.gain.into());
        map
    }
    fn set_params(&mut self, params: &ParamMap) -> Result<(), ParamError> {
        self.schema().validate(params)?;
        if let Some(v) = params.get("gain").and_then(|v| v.as_f64()) {
            self.gain = v;
        }
        self.init_state();
        Ok(())
    }
    fn init_state(&mut self) {}
    fn process(
        &mut self,
        inputs: &[Option<ChannelValue>],
        outputs: &mut [Option<ChannelValue>],
    ) -> Result<(), TickError> {
        outputs[0] = inputs[0].clone();
        Ok(())
    }
}

struct TestRegistry;

impl EffectFactory for TestRegistry {
    fn create(&self, class: &str, params: &ParamMap) -> Result<Box<dyn Effect>, GraphError> {
        match class {
            "test.gain" => {
                let mut effect = Gain { gain: 1.0 };
                effect.set_params(params)?;
                Ok(Box::new(effect))
            }
            other => Err(GraphError::UnknownEffectClass(other.to_string())),
        }
    }
}

fn sample_graph() -> FilterGraph {
    let mut g = FilterGraph::new();
    let a = g.add_effect(Box::new(Gain { gain: 2.0 }));
    let b = g.add_effect(Box::new(Gain { gain: 0.5 }));
    let c = g.add_effect(Box::new(Gain { gain: 1.5 }));
    g.connect(a, 0, b, 0).unwrap();
    g.connect(b, 0, c, 0).unwrap();
    g
}

#[test]
fn round_trip_preserves_ids_params_and_order() {
    let graph = sample_graph();
    let json = graph.to_document().to_json().unwrap();

    let doc = GraphDoc::from_json(&json).unwrap();
    let loaded = FilterGraph::from_document(&doc, &TestRegistry).unwrap();

    assert_eq!(loaded.node_count(), graph.node_count());
    assert_eq!(loaded.connections(), graph.connections());
    assert_eq!(loaded.execution_order(), graph.execution_order());
    for (orig, back) in graph.nodes().zip(loaded.nodes()) {
        assert_eq!(orig.id(), back.id());
        assert_eq!(orig.effect().params(), back.effect().params());
    }
}

#[test]
fn load_rejects_unknown_class() {
    let mut doc = sample_graph().to_document();
    doc.nodes[0].effect_class = "test.evil".into();
    let err = FilterGraph::from_document(&doc, &TestRegistry).unwrap_err();
    assert!(matches!(err, GraphError::UnknownEffectClass(_)));
}

#[test]
fn load_rejects_out_of_range_parameter() {
    let mut doc = sample_graph().to_document();
    doc.nodes[0]
        .parameters
        .insert("gain".into(), 99.0_f64.into());
    let err = FilterGraph::from_document(&doc, &TestRegistry).unwrap_err();
    assert!(matches!(err, GraphError::Param(_)));
}

#[test]
fn load_rejects_document_with_cycle() {
    let mut doc = sample_graph().to_document();
    let first = doc.nodes[0].id.clone();
    let last = doc.nodes[2].id.clone();
    doc.connections.push(lumen_core::graph::ConnectionDoc {
        from_id: last,
        from_channel: 0,
        to_id: first,
        to_channel: 0,
    });
    let err = FilterGraph::from_document(&doc, &TestRegistry).unwrap_err();
    assert!(matches!(err, GraphError::CyclicGraph));
}

#[test]
fn load_rejects_bad_node_id() {
    let mut doc = sample_graph().to_document();
    doc.nodes[0].id = "zzz".into();
    let err = FilterGraph::from_document(&doc, &TestRegistry).unwrap_err();
    assert!(matches!(err, GraphError::Document(_)));
}
