use crate::graph::{EdgeInstance, NodeInstance, PipelineGraph};
use crate::registry::{BlockVersion, RegistryCache};
use crate::spec::{PortRef, SpecEdge, SpecGraph};
use itertools::Itertools;

/// Copies nodes verbatim, in insertion order, and reduces edge handles to
/// bare port names.
pub(super) fn lower_graph(graph: &PipelineGraph) -> SpecGraph {
    SpecGraph {
        nodes: graph.nodes().to_vec(),
        edges: graph.edges().iter().map(lower_edge).collect(),
    }
}

fn lower_edge(edge: &EdgeInstance) -> SpecEdge {
    SpecEdge {
        id: edge.id.clone(),
        from: PortRef::new(edge.from.node_id.as_str(), edge.from.port()),
        to: PortRef::new(edge.to.node_id.as_str(), edge.to.port()),
    }
}

/// Collects the registry entry of every referenced block, once per block id,
/// in the order nodes first reference them. Unregistered blocks contribute
/// nothing.
pub(super) fn lock_blocks(nodes: &[NodeInstance], registry: &RegistryCache) -> Vec<BlockVersion> {
    nodes
        .iter()
        .filter_map(|node| registry.lookup(&node.block_ref.block_id))
        .unique_by(|block| block.block_id.as_str())
        .cloned()
        .collect()
}
