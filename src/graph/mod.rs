//! The mutable, in-progress pipeline graph.
//!
//! Nodes keep their insertion order. Every edge points from an existing output
//! port to an existing input port of the same port type; removing a node
//! removes every edge that touches it.

pub mod conversion;
pub mod edge;
pub mod node;
pub mod palette;

pub use conversion::*;
pub use edge::*;
pub use node::*;
pub use palette::*;

use crate::error::{ConnectionRefused, GraphError};
use crate::id::new_id;
use crate::port::{PortDirection, PortHandle, is_compatible};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct PipelineGraph {
    nodes: Vec<NodeInstance>,
    edges: Vec<EdgeInstance>,
    // Every id ever handed out, so ids of removed nodes are never reused.
    issued_ids: AHashSet<String>,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a node under a fresh id prefixed with the node kind.
    pub fn add_node(&mut self, node: NewNode) -> &NodeInstance {
        let prefix = node.kind.as_str();
        self.add_node_with_prefix(prefix, node)
    }

    /// Places a node under a fresh id of the form `<prefix>_<hex>`.
    pub fn add_node_with_prefix(&mut self, prefix: &str, node: NewNode) -> &NodeInstance {
        let id = loop {
            let candidate = new_id(prefix);
            if !self.issued_ids.contains(&candidate) {
                break candidate;
            }
        };
        self.push_node(node.into_instance(id))
    }

    /// Places a node under a caller-chosen id, used when loading saved drafts
    /// and templates.
    pub fn insert_node(
        &mut self,
        id: impl Into<String>,
        node: NewNode,
    ) -> Result<&NodeInstance, GraphError> {
        let id = id.into();
        if self.issued_ids.contains(&id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        Ok(self.push_node(node.into_instance(id)))
    }

    fn push_node(&mut self, node: NodeInstance) -> &NodeInstance {
        debug!(node_id = %node.id, kind = %node.kind, block = %node.block_ref, "Node added");
        self.issued_ids.insert(node.id.clone());
        let idx = self.nodes.len();
        self.nodes.push(node);
        &self.nodes[idx]
    }

    /// Removes a node and every edge that starts or ends at it.
    pub fn remove_node(&mut self, node_id: &str) -> Option<NodeInstance> {
        let idx = self.nodes.iter().position(|n| n.id == node_id)?;
        let node = self.nodes.remove(idx);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(node_id));
        debug!(
            node_id,
            edges_removed = before - self.edges.len(),
            "Node removed"
        );
        Some(node)
    }

    /// Checks a candidate edge without touching the graph.
    pub fn check_connection(
        &self,
        candidate: &CandidateEdge,
    ) -> Result<(EdgeEndpoint, EdgeEndpoint), ConnectionRefused> {
        let source_handle = parse_handle(&candidate.source_handle, PortDirection::Output)?;
        let target_handle = parse_handle(&candidate.target_handle, PortDirection::Input)?;

        let source = self
            .node(&candidate.source)
            .ok_or_else(|| ConnectionRefused::SourceNodeMissing(candidate.source.clone()))?;
        let target = self
            .node(&candidate.target)
            .ok_or_else(|| ConnectionRefused::TargetNodeMissing(candidate.target.clone()))?;
        if source.id == target.id {
            return Err(ConnectionRefused::SelfLoop(source.id.clone()));
        }

        let source_port = source.output(&source_handle.port).ok_or_else(|| {
            ConnectionRefused::SourcePortMissing {
                node_id: source.id.clone(),
                port: source_handle.port.clone(),
            }
        })?;
        let target_port = target.input(&target_handle.port).ok_or_else(|| {
            ConnectionRefused::TargetPortMissing {
                node_id: target.id.clone(),
                port: target_handle.port.clone(),
            }
        })?;
        if !is_compatible(Some(source_port), Some(target_port)) {
            return Err(ConnectionRefused::PortTypeMismatch {
                source_type: source_port.port_type.clone(),
                target_type: target_port.port_type.clone(),
            });
        }

        let from = EdgeEndpoint {
            node_id: source.id.clone(),
            handle: source_handle,
        };
        let to = EdgeEndpoint {
            node_id: target.id.clone(),
            handle: target_handle,
        };
        if let Some(existing) = self.edges.iter().find(|e| e.from == from && e.to == to) {
            return Err(ConnectionRefused::Duplicate(existing.id.clone()));
        }
        Ok((from, to))
    }

    pub fn is_valid_connection(&self, candidate: &CandidateEdge) -> bool {
        self.check_connection(candidate).is_ok()
    }

    /// Adds an edge if the candidate passes every check. A refusal leaves the
    /// graph untouched. Several edges may feed the same input port, but the
    /// exact same connection is only made once.
    pub fn connect(&mut self, candidate: &CandidateEdge) -> Result<&EdgeInstance, ConnectionRefused> {
        let (from, to) = self.check_connection(candidate).inspect_err(|reason| {
            warn!(
                source = %candidate.source,
                source_handle = %candidate.source_handle,
                target = %candidate.target,
                target_handle = %candidate.target_handle,
                %reason,
                "Connection refused"
            );
        })?;

        // Node ids may themselves contain `_`, so distinct connections can
        // still render to the same text.
        let base = format!("e_{}_{}_{}_{}", from.node_id, from.handle, to.node_id, to.handle);
        let mut id = base.clone();
        let mut n = 2;
        while self.edge(&id).is_some() {
            id = format!("{}_{}", base, n);
            n += 1;
        }

        debug!(edge_id = %id, "Edge added");
        let idx = self.edges.len();
        self.edges.push(EdgeInstance { id, from, to });
        Ok(&self.edges[idx])
    }

    /// Removes one edge; absent ids are ignored.
    pub fn disconnect(&mut self, edge_id: &str) -> Option<EdgeInstance> {
        let idx = self.edges.iter().position(|e| e.id == edge_id)?;
        debug!(edge_id, "Edge removed");
        Some(self.edges.remove(idx))
    }

    /// Drops every node and edge. Ids issued before the clear stay retired.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn node(&self, node_id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn config_mut(&mut self, node_id: &str) -> Option<&mut NodeConfig> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .map(|n| &mut n.config)
    }

    pub fn set_position(&mut self, node_id: &str, position: Position) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == node_id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    pub fn edge(&self, edge_id: &str) -> Option<&EdgeInstance> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    pub fn nodes(&self) -> &[NodeInstance] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeInstance] {
        &self.edges
    }

    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a EdgeInstance> {
        self.edges.iter().filter(move |e| e.to.node_id == node_id)
    }

    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a EdgeInstance> {
        self.edges.iter().filter(move |e| e.from.node_id == node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns one directed cycle as a list of node ids (first id repeated at
    /// the end), or `None` when the graph is acyclic.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let adjacency: AHashMap<&str, Vec<&str>> = self
            .edges
            .iter()
            .map(|e| (e.from.node_id.as_str(), e.to.node_id.as_str()))
            .into_group_map()
            .into_iter()
            .collect();

        let mut marks: AHashMap<&str, Mark> = AHashMap::new();
        let mut stack: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if !marks.contains_key(node.id.as_str()) {
                if let Some(cycle) = visit(node.id.as_str(), &adjacency, &mut marks, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn visit<'a>(
    node_id: &'a str,
    adjacency: &AHashMap<&'a str, Vec<&'a str>>,
    marks: &mut AHashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    marks.insert(node_id, Mark::Visiting);
    stack.push(node_id);
    for &next in adjacency.get(node_id).into_iter().flatten() {
        match marks.get(next) {
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == next).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(next.to_string());
                return Some(cycle);
            }
            Some(Mark::Done) => {}
            None => {
                if let Some(cycle) = visit(next, adjacency, marks, stack) {
                    return Some(cycle);
                }
            }
        }
    }
    stack.pop();
    marks.insert(node_id, Mark::Done);
    None
}

fn parse_handle(handle: &str, expected: PortDirection) -> Result<PortHandle, ConnectionRefused> {
    match PortHandle::parse(handle) {
        Some(parsed) if parsed.direction.is_none_or(|d| d == expected) => Ok(PortHandle {
            direction: Some(expected),
            port: parsed.port,
        }),
        _ => Err(ConnectionRefused::MalformedHandle(handle.to_string())),
    }
}
