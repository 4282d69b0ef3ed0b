use crate::port::PortHandle;
use serde::{Deserialize, Serialize};

/// One end of a graph edge: a node and the handle of one of its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeEndpoint {
    pub node_id: String,
    pub handle: PortHandle,
}

impl EdgeEndpoint {
    pub fn port(&self) -> &str {
        &self.handle.port
    }
}

/// A directed data dependency from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeInstance {
    pub id: String,
    pub from: EdgeEndpoint,
    pub to: EdgeEndpoint,
}

impl EdgeInstance {
    pub fn touches(&self, node_id: &str) -> bool {
        self.from.node_id == node_id || self.to.node_id == node_id
    }
}

/// A connection as proposed by an editor, before validation.
///
/// Handles follow the `"out:<port>"` / `"in:<port>"` convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEdge {
    pub source: String,
    pub source_handle: String,
    pub target: String,
    pub target_handle: String,
}

impl CandidateEdge {
    pub fn new(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        }
    }

    /// Shorthand for an `out:<port>` to `in:<port>` connection.
    pub fn between(
        source: impl Into<String>,
        source_port: &str,
        target: impl Into<String>,
        target_port: &str,
    ) -> Self {
        Self::new(
            source,
            PortHandle::output(source_port).to_string(),
            target,
            PortHandle::input(target_port).to_string(),
        )
    }
}
