//! Mutation and inspection API over a live graph.

use std::sync::{Arc, RwLock};

use lumen_core::{FilterGraph, GraphDoc, GraphError, NodeId, ParamError, ParamMap, Timing};
use lumen_registry::Registry;
use thiserror::Error;

/// Errors surfaced to control clients, with an HTTP-style status code so a
/// remote frontend can map them directly.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Malformed request: bad id, bad document, bad parameter value.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The effect class is outside the allow-list.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The referenced node or connection does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The mutation conflicts with the graph (cycle, occupied input,
    /// kind mismatch).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal failure (poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// The HTTP status code this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            ControlError::BadRequest(_) => 400,
            ControlError::Forbidden(_) => 403,
            ControlError::NotFound(_) => 404,
            ControlError::Conflict(_) => 409,
            ControlError::Internal(_) => 500,
        }
    }
}

impl From<GraphError> for ControlError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::UnknownEffectClass(_) => ControlError::Forbidden(err.to_string()),
            GraphError::NodeNotFound(_) | GraphError::ConnectionNotFound { .. } => {
                ControlError::NotFound(err.to_string())
            }
            GraphError::CyclicGraph
            | GraphError::InputOccupied { .. }
            | GraphError::DuplicateConnection
            | GraphError::ChannelKindMismatch { .. }
            | GraphError::ChannelOutOfRange { .. } => ControlError::Conflict(err.to_string()),
            GraphError::Param(_) | GraphError::Document(_) => {
                ControlError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<ParamError> for ControlError {
    fn from(err: ParamError) -> Self {
        ControlError::BadRequest(err.to_string())
    }
}

/// A node as reported to control clients.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Node id in hex document form.
    pub id: String,
    /// Effect class tag.
    pub class: String,
    /// Current parameter values.
    pub params: ParamMap,
    /// Error from the node's most recent tick, if it is failing.
    pub error: Option<String>,
    /// Update pass timing statistics.
    pub update_timing: Timing,
    /// Process pass timing statistics.
    pub process_timing: Timing,
}

/// A connection as reported to control clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Producer node id (hex).
    pub from: String,
    /// Producer output channel.
    pub from_channel: usize,
    /// Consumer node id (hex).
    pub to: String,
    /// Consumer input channel.
    pub to_channel: usize,
}

/// CRUD surface over a shared live graph.
///
/// Every mutation takes the graph write lock briefly between frame ticks;
/// node creation goes through the registry allow-list only.
pub struct ControlSurface {
    graph: Arc<RwLock<FilterGraph>>,
    registry: Arc<Registry>,
}

impl ControlSurface {
    /// Creates a surface over `graph`, constructing through `registry`.
    pub fn new(graph: Arc<RwLock<FilterGraph>>, registry: Arc<Registry>) -> Self {
        Self { graph, registry }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, FilterGraph>, ControlError> {
        self.graph
            .read()
            .map_err(|_| ControlError::Internal("graph lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, FilterGraph>, ControlError> {
        self.graph
            .write()
            .map_err(|_| ControlError::Internal("graph lock poisoned".into()))
    }

    fn parse_id(id: &str) -> Result<NodeId, ControlError> {
        NodeId::parse(id).ok_or_else(|| ControlError::BadRequest(format!("bad node id: {id}")))
    }

    /// Lists every node with its parameters, error state, and timings.
    pub fn nodes(&self) -> Result<Vec<NodeInfo>, ControlError> {
        let graph = self.read()?;
        Ok(graph
            .nodes()
            .map(|node| NodeInfo {
                id: node.id().to_string(),
                class: node.effect().class_name().to_string(),
                params: node.effect().params(),
                error: node.error().map(ToString::to_string),
                update_timing: *node.update_timing(),
                process_timing: *node.process_timing(),
            })
            .collect())
    }

    /// Lists every connection.
    pub fn connections(&self) -> Result<Vec<ConnectionInfo>, ControlError> {
        let graph = self.read()?;
        Ok(graph
            .connections()
            .iter()
            .map(|c| ConnectionInfo {
                from: c.from.to_string(),
                from_channel: c.from_channel,
                to: c.to.to_string(),
                to_channel: c.to_channel,
            })
            .collect())
    }

    /// Creates a node of `class` with `params`, returning its id.
    pub fn add_node(&self, class: &str, params: &ParamMap) -> Result<String, ControlError> {
        use lumen_core::EffectFactory;
        let effect = self.registry.create(class, params)?;
        let mut graph = self.write()?;
        Ok(graph.add_effect(effect).to_string())
    }

    /// Deletes a node and every connection touching it.
    pub fn remove_node(&self, id: &str) -> Result<(), ControlError> {
        let id = Self::parse_id(id)?;
        let mut graph = self.write()?;
        graph.remove_node(id)?;
        Ok(())
    }

    /// Current parameter values of one node.
    pub fn node_params(&self, id: &str) -> Result<ParamMap, ControlError> {
        let id = Self::parse_id(id)?;
        let graph = self.read()?;
        Ok(graph.node(id)?.effect().params())
    }

    /// Applies a partial parameter update to one node.
    pub fn set_node_params(&self, id: &str, params: &ParamMap) -> Result<(), ControlError> {
        let id = Self::parse_id(id)?;
        let mut graph = self.write()?;
        graph.set_node_params(id, params)?;
        Ok(())
    }

    /// Connects a producer output to a consumer input.
    pub fn connect(
        &self,
        from: &str,
        from_channel: usize,
        to: &str,
        to_channel: usize,
    ) -> Result<(), ControlError> {
        let from = Self::parse_id(from)?;
        let to = Self::parse_id(to)?;
        let mut graph = self.write()?;
        graph.connect(from, from_channel, to, to_channel)?;
        Ok(())
    }

    /// Removes one connection.
    pub fn disconnect(
        &self,
        from: &str,
        from_channel: usize,
        to: &str,
        to_channel: usize,
    ) -> Result<(), ControlError> {
        let from = Self::parse_id(from)?;
        let to = Self::parse_id(to)?;
        let mut graph = self.write()?;
        graph.disconnect(from, from_channel, to, to_channel)?;
        Ok(())
    }

    /// Serializes the live graph to its JSON document.
    pub fn document(&self) -> Result<String, ControlError> {
        let graph = self.read()?;
        graph
            .to_document()
            .to_json()
            .map_err(|e| ControlError::Internal(e.to_string()))
    }

    /// Replaces the live graph with a document.
    pub fn load_document(&self, json: &str) -> Result<(), ControlError> {
        let doc = GraphDoc::from_json(json)
            .map_err(|e| ControlError::BadRequest(format!("bad graph document: {e}")))?;
        let loaded = FilterGraph::from_document(&doc, self.registry.as_ref())?;
        let mut graph = self.write()?;
        *graph = loaded;
        Ok(())
    }

    /// Nodes currently holding an error, as `(id, message)` pairs.
    pub fn node_errors(&self) -> Result<Vec<(String, String)>, ControlError> {
        let graph = self.read()?;
        Ok(graph
            .nodes()
            .filter_map(|n| {
                n.error()
                    .map(|e| (n.id().to_string(), e.to_string()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_effects::EffectContext;
    use lumen_io::{LedTransport, MockBackend, NullTransport};
    use std::sync::Mutex;

    fn surface() -> ControlSurface {
        let ctx = EffectContext {
            sample_rate: 44100.0,
            num_pixels: 16,
            chunk_rate: 60.0,
            capture: Arc::new(MockBackend::silent()),
            transport: Arc::new(Mutex::new(
                Box::new(NullTransport) as Box<dyn LedTransport>
            )),
        };
        ControlSurface::new(
            Arc::new(RwLock::new(FilterGraph::new())),
            Arc::new(Registry::new(ctx)),
        )
    }

    #[test]
    fn add_list_and_remove_nodes() {
        let surface = surface();
        let id = surface.add_node("static_color", &ParamMap::new()).unwrap();
        let nodes = surface.nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].class, "static_color");
        assert_eq!(nodes[0].id, id);
        surface.remove_node(&id).unwrap();
        assert!(surface.nodes().unwrap().is_empty());
    }

    #[test]
    fn unknown_class_maps_to_403() {
        let surface = surface();
        let err = surface.add_node("strobe", &ParamMap::new()).unwrap_err();
        assert_eq!(err.status(), 403);
    }

    #[test]
    fn unknown_node_maps_to_404() {
        let surface = surface();
        let err = surface.node_params("deadbeef").unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn malformed_id_maps_to_400() {
        let surface = surface();
        let err = surface.remove_node("not-hex").unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn cycle_maps_to_409() {
        let surface = surface();
        let a = surface.add_node("afterglow", &ParamMap::new()).unwrap();
        let b = surface.add_node("afterglow", &ParamMap::new()).unwrap();
        surface.connect(&a, 0, &b, 0).unwrap();
        let err = surface.connect(&b, 0, &a, 0).unwrap_err();
        assert_eq!(err.status(), 409);
        assert_eq!(surface.connections().unwrap().len(), 1);
    }

    #[test]
    fn out_of_range_parameter_maps_to_400() {
        let surface = surface();
        let id = surface.add_node("afterglow", &ParamMap::new()).unwrap();
        let mut params = ParamMap::new();
        params.insert("glow_time".into(), 99.0_f64.into());
        let err = surface.set_node_params(&id, &params).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn document_round_trips_through_the_surface() {
        let surface = surface();
        let color = surface.add_node("static_color", &ParamMap::new()).unwrap();
        let glow = surface.add_node("afterglow", &ParamMap::new()).unwrap();
        surface.connect(&color, 0, &glow, 0).unwrap();

        let json = surface.document().unwrap();
        surface.load_document(&json).unwrap();

        let nodes = surface.nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(surface.connections().unwrap().len(), 1);
        assert!(nodes.iter().any(|n| n.id == color));
        assert!(nodes.iter().any(|n| n.id == glow));
    }

    #[test]
    fn bad_document_maps_to_400() {
        let surface = surface();
        let err = surface.load_document("{ nope").unwrap_err();
        assert_eq!(err.status(), 400);
    }
}
