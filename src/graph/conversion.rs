use super::{BlockRef, CandidateEdge, NewNode, NodeConfig, NodeKind, PipelineGraph, Position};
use crate::error::{ConnectionRefused, GraphConversionError};
use crate::port::PortDecl;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The outcome of turning a draft into a graph. Edges that fail validation
/// are reported instead of aborting the conversion.
#[derive(Debug, Clone)]
pub struct GraphConversion {
    pub graph: PipelineGraph,
    pub refused: Vec<(CandidateEdge, ConnectionRefused)>,
}

/// A trait for editor or file formats that can be loaded into a `PipelineGraph`.
///
/// Implement it on your own structs to load drafts saved by another editor.
/// Every edge must go through [`PipelineGraph::connect`] so the port rules
/// still hold.
///
/// # Example
///
/// ```rust,no_run
/// use blockflow::prelude::*;
/// use blockflow::error::GraphConversionError;
///
/// struct MyDraft { blocks: Vec<(String, String)> }
///
/// impl IntoGraph for MyDraft {
///     fn into_graph(self) -> std::result::Result<GraphConversion, GraphConversionError> {
///         let mut graph = PipelineGraph::new();
///         for (id, block_id) in self.blocks {
///             graph.insert_node(id, NewNode::new(NodeKind::Fusion, BlockRef::new(block_id, "1.0.0")))?;
///         }
///         Ok(GraphConversion { graph, refused: vec![] })
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into a validated graph.
    fn into_graph(self) -> Result<GraphConversion, GraphConversionError>;
}

/// The saved-draft JSON format: canvas nodes with their block data, and
/// edges expressed with `out:`/`in:` handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftGraph {
    pub nodes: Vec<DraftNode>,
    #[serde(default)]
    pub edges: Vec<CandidateEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftNode {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    pub data: DraftNodeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftNodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub kind: NodeKind,
    pub block_id: String,
    pub version: String,
    #[serde(default)]
    pub inputs: Vec<PortDecl>,
    #[serde(default)]
    pub outputs: Vec<PortDecl>,
    #[serde(default)]
    pub config: NodeConfig,
}

impl DraftGraph {
    pub fn from_json(text: &str) -> Result<Self, GraphConversionError> {
        serde_json::from_str(text).map_err(|e| GraphConversionError::Parse(e.to_string()))
    }

    /// Snapshots a graph into the draft format.
    pub fn from_graph(graph: &PipelineGraph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|n| DraftNode {
                id: n.id.clone(),
                position: n.position,
                data: DraftNodeData {
                    label: None,
                    kind: n.kind,
                    block_id: n.block_ref.block_id.clone(),
                    version: n.block_ref.version.clone(),
                    inputs: n.inputs.clone(),
                    outputs: n.outputs.clone(),
                    config: n.config.clone(),
                },
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|e| CandidateEdge {
                source: e.from.node_id.clone(),
                source_handle: e.from.handle.to_string(),
                target: e.to.node_id.clone(),
                target_handle: e.to.handle.to_string(),
            })
            .collect();
        Self { nodes, edges }
    }
}

impl IntoGraph for DraftGraph {
    fn into_graph(self) -> Result<GraphConversion, GraphConversionError> {
        let mut graph = PipelineGraph::new();
        for node in self.nodes {
            if node.id.is_empty() {
                return Err(GraphConversionError::Validation(
                    "node id must not be empty".to_string(),
                ));
            }
            let data = node.data;
            let new_node = NewNode::new(data.kind, BlockRef::new(data.block_id, data.version))
                .with_inputs(data.inputs)
                .with_outputs(data.outputs)
                .with_config(data.config)
                .at(node.position);
            graph.insert_node(node.id, new_node)?;
        }

        let mut refused = Vec::new();
        for edge in self.edges {
            if let Err(reason) = graph.connect(&edge) {
                refused.push((edge, reason));
            }
        }

        info!(
            nodes = graph.nodes().len(),
            edges = graph.edges().len(),
            refused = refused.len(),
            "Draft converted to graph"
        );
        Ok(GraphConversion { graph, refused })
    }
}
