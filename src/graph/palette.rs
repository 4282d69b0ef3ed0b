use super::{
    BlockRef, CandidateEdge, DatasetConfig, EncoderConfig, EvaluatorConfig, NewNode, NodeConfig,
    NodeInstance, NodeKind, PipelineGraph, Position, TrainerConfig,
};
use crate::port::PortDecl;
use crate::registry::RegistryCache;
use tracing::warn;

/// Version placed when a block is not in the registry snapshot.
pub const UNREGISTERED_VERSION: &str = "1.0.0";
/// Version the quick-start template falls back to.
pub const TEMPLATE_FALLBACK_VERSION: &str = "1.1.0";

/// A block template that can be dropped onto a graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteItem {
    pub key: String,
    pub label: String,
    pub kind: NodeKind,
    pub block_id: String,
    pub inputs: Vec<PortDecl>,
    pub outputs: Vec<PortDecl>,
    pub config: NodeConfig,
}

impl PaletteItem {
    fn new_node(&self, version: &str, position: Position) -> NewNode {
        NewNode::new(self.kind, BlockRef::new(self.block_id.as_str(), version))
            .with_inputs(self.inputs.clone())
            .with_outputs(self.outputs.clone())
            .with_config(self.config.clone())
            .at(position)
    }
}

/// A non-empty, ordered set of block templates. The first template is the
/// default selection.
#[derive(Debug, Clone)]
pub struct Palette {
    first: PaletteItem,
    rest: Vec<PaletteItem>,
}

impl Palette {
    /// Returns `None` for an empty list.
    pub fn new(items: Vec<PaletteItem>) -> Option<Self> {
        let mut items = items.into_iter();
        let first = items.next()?;
        Some(Self {
            first,
            rest: items.collect(),
        })
    }

    /// The templates of the toy audio/vision classification pipeline.
    pub fn builtin() -> Self {
        let batch = || PortDecl::new("batch", "batch.multimodal.v1");
        let labels = || PortDecl::new("labels", "labels.class");
        Self {
            first: PaletteItem {
                key: "dataset".into(),
                label: "Toy A/V dataset".into(),
                kind: NodeKind::Dataset,
                block_id: "datasets.toy_av".into(),
                inputs: vec![],
                outputs: vec![batch(), labels()],
                config: DatasetConfig {
                    n: Some(800),
                    ..Default::default()
                }
                .into(),
            },
            rest: vec![
                PaletteItem {
                    key: "encA".into(),
                    label: "Linear encoder (audio)".into(),
                    kind: NodeKind::Encoder,
                    block_id: "unimodals.linear".into(),
                    inputs: vec![batch()],
                    outputs: vec![PortDecl::new("embedA", "tensor.embed")],
                    config: encoder_config("audio"),
                },
                PaletteItem {
                    key: "encV".into(),
                    label: "Linear encoder (vision)".into(),
                    kind: NodeKind::Encoder,
                    block_id: "unimodals.linear".into(),
                    inputs: vec![batch()],
                    outputs: vec![PortDecl::new("embedV", "tensor.embed")],
                    config: encoder_config("vision"),
                },
                PaletteItem {
                    key: "fusion".into(),
                    label: "Concat fusion".into(),
                    kind: NodeKind::Fusion,
                    block_id: "fusions.concat".into(),
                    inputs: vec![
                        PortDecl::new("embedA", "tensor.embed"),
                        PortDecl::new("embedV", "tensor.embed"),
                    ],
                    outputs: vec![PortDecl::new("fused", "tensor.fused")],
                    config: NodeConfig::new(),
                },
                PaletteItem {
                    key: "trainer".into(),
                    label: "SGD classifier trainer".into(),
                    kind: NodeKind::Trainer,
                    block_id: "training_structures.sgd_classifier".into(),
                    inputs: vec![PortDecl::new("fused", "tensor.fused"), labels()],
                    outputs: vec![PortDecl::new("model", "model.classifier")],
                    config: TrainerConfig {
                        max_iter: Some(300),
                        alpha: Some(0.0001),
                        ..Default::default()
                    }
                    .into(),
                },
                PaletteItem {
                    key: "evaluator".into(),
                    label: "Basic evaluator".into(),
                    kind: NodeKind::Evaluator,
                    block_id: "eval_scripts.basic".into(),
                    inputs: vec![PortDecl::new("model", "model.classifier")],
                    outputs: vec![PortDecl::new("metrics", "metrics.report")],
                    config: EvaluatorConfig {
                        noise_std: Some(0.2),
                        ..Default::default()
                    }
                    .into(),
                },
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaletteItem> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    pub fn get(&self, key: &str) -> Option<&PaletteItem> {
        self.iter().find(|item| item.key == key)
    }

    /// The template for `key`, or the first template when `key` is unknown.
    pub fn select(&self, key: &str) -> &PaletteItem {
        self.get(key).unwrap_or(&self.first)
    }

    /// Drops the template for `key` onto `graph`. The node is pinned to the
    /// registry's published version, or [`UNREGISTERED_VERSION`]. Unknown
    /// keys place nothing.
    pub fn place<'g>(
        &self,
        key: &str,
        graph: &'g mut PipelineGraph,
        registry: &RegistryCache,
        position: Position,
    ) -> Option<&'g NodeInstance> {
        let Some(item) = self.get(key) else {
            warn!(key, "Unknown palette key, nothing placed");
            return None;
        };
        let version = registry
            .version_of(&item.block_id)
            .unwrap_or(UNREGISTERED_VERSION);
        Some(graph.add_node_with_prefix(&item.key, item.new_node(version, position)))
    }
}

fn encoder_config(modality: &str) -> NodeConfig {
    EncoderConfig {
        modality_key: Some(modality.to_string()),
        out_dim: Some(16),
        ..Default::default()
    }
    .into()
}

/// Builds the six-node quick-start pipeline: dataset, two encoders, fusion,
/// trainer and evaluator, wired with seven edges.
pub fn demo_graph(registry: &RegistryCache) -> PipelineGraph {
    let palette = Palette::builtin();
    let mut graph = PipelineGraph::new();

    let layout = [
        ("n_ds", "dataset", Position::new(40.0, 120.0)),
        ("n_encA", "encA", Position::new(320.0, 40.0)),
        ("n_encV", "encV", Position::new(320.0, 220.0)),
        ("n_fus", "fusion", Position::new(620.0, 120.0)),
        ("n_tr", "trainer", Position::new(920.0, 120.0)),
        ("n_ev", "evaluator", Position::new(1200.0, 120.0)),
    ];
    for (id, key, position) in layout {
        let item = palette.select(key);
        let version = registry
            .version_of(&item.block_id)
            .unwrap_or(TEMPLATE_FALLBACK_VERSION);
        if let Err(e) = graph.insert_node(id, item.new_node(version, position)) {
            warn!(error = %e, "Template node skipped");
        }
    }

    let wiring = [
        ("n_ds", "batch", "n_encA", "batch"),
        ("n_ds", "batch", "n_encV", "batch"),
        ("n_encA", "embedA", "n_fus", "embedA"),
        ("n_encV", "embedV", "n_fus", "embedV"),
        ("n_fus", "fused", "n_tr", "fused"),
        ("n_ds", "labels", "n_tr", "labels"),
        ("n_tr", "model", "n_ev", "model"),
    ];
    for (source, source_port, target, target_port) in wiring {
        // Refusals are logged by `connect`.
        let _ = graph.connect(&CandidateEdge::between(source, source_port, target, target_port));
    }

    graph
}
