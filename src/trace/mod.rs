//! Matching an explain trace back onto graph nodes.

pub mod formatter;
pub mod step;

pub use formatter::TraceFormatter;
pub use step::*;

use crate::graph::PipelineGraph;
use ahash::{AHashMap, AHashSet};

/// Picks the step to show for the current selection.
///
/// - An empty trace yields `None`.
/// - A selected node with a matching step yields that step (the first one,
///   if the service reported several).
/// - Anything else yields the first step, so a non-empty trace always has a
///   focus.
pub fn focus_step<'a>(trace: &'a ExplainResponse, selected: Option<&str>) -> Option<&'a ExplainStep> {
    let (first, _) = trace.steps.split_first()?;
    let matched = selected.and_then(|id| trace.steps.iter().find(|s| s.node_id == id));
    Some(matched.unwrap_or(first))
}

impl ExplainResponse {
    pub fn focus(&self, selected: Option<&str>) -> Option<&ExplainStep> {
        focus_step(self, selected)
    }
}

/// How a trace lines up with the graph it was produced from.
#[derive(Debug, Clone, Default)]
pub struct TraceCorrelation {
    /// Node id to index of its first step in the trace.
    pub by_node: AHashMap<String, usize>,
    /// Indexes of steps whose node is not in the graph.
    pub orphan_steps: Vec<usize>,
    /// Graph nodes, in graph order, that have no step.
    pub missing_nodes: Vec<String>,
}

impl TraceCorrelation {
    pub fn build(trace: &ExplainResponse, graph: &PipelineGraph) -> Self {
        let graph_ids: AHashSet<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();

        let mut by_node = AHashMap::new();
        let mut orphan_steps = Vec::new();
        for (idx, step) in trace.steps.iter().enumerate() {
            if graph_ids.contains(step.node_id.as_str()) {
                by_node.entry(step.node_id.clone()).or_insert(idx);
            } else {
                orphan_steps.push(idx);
            }
        }

        let missing_nodes = graph
            .nodes()
            .iter()
            .filter(|n| !by_node.contains_key(&n.id))
            .map(|n| n.id.clone())
            .collect();

        Self {
            by_node,
            orphan_steps,
            missing_nodes,
        }
    }

    pub fn step_for<'a>(&self, trace: &'a ExplainResponse, node_id: &str) -> Option<&'a ExplainStep> {
        self.by_node.get(node_id).and_then(|&idx| trace.steps.get(idx))
    }

    /// True when every node has a step and every step has a node.
    pub fn is_complete(&self) -> bool {
        self.orphan_steps.is_empty() && self.missing_nodes.is_empty()
    }
}
