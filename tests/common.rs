//! Common test utilities: graph fixtures, registry snapshots and an in-memory
//! pipeline service.
use async_trait::async_trait;
use blockflow::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const BATCH: &str = "batch.multimodal.v1";
pub const LABELS: &str = "labels.class";
pub const EMBED: &str = "tensor.embed";

/// A dataset node with `batch` and `labels` outputs.
#[allow(dead_code)]
pub fn dataset_node() -> NewNode {
    NewNode::new(NodeKind::Dataset, BlockRef::new("datasets.toy_av", "1.1.0")).with_outputs(vec![
        PortDecl::new("batch", BATCH),
        PortDecl::new("labels", LABELS),
    ])
}

/// An encoder node with one `batch` input and an `embed` output.
#[allow(dead_code)]
pub fn encoder_node() -> NewNode {
    NewNode::new(NodeKind::Encoder, BlockRef::new("unimodals.linear", "1.0.0"))
        .with_inputs(vec![PortDecl::new("batch", BATCH)])
        .with_outputs(vec![PortDecl::new("embed", EMBED)])
}

/// A fusion node with two `tensor.embed` inputs.
#[allow(dead_code)]
pub fn fusion_node() -> NewNode {
    NewNode::new(NodeKind::Fusion, BlockRef::new("fusions.concat", "1.0.0"))
        .with_inputs(vec![PortDecl::new("a", EMBED), PortDecl::new("b", EMBED)])
        .with_outputs(vec![PortDecl::new("fused", "tensor.fused")])
}

/// Registry snapshot holding only `datasets.toy_av@1.1.0` with digest `d1`.
#[allow(dead_code)]
pub fn toy_registry() -> RegistryCache {
    RegistryCache::from_versions(vec![BlockVersion::new("datasets.toy_av", "1.1.0", "d1")])
}

/// Registry snapshot covering every block of the built-in palette.
#[allow(dead_code)]
pub fn full_registry() -> RegistryCache {
    let mut registry = RegistryCache::new();
    registry.replace_with(&block_records());
    registry
}

/// What `GET /blocks` returns for the built-in palette, plus one block that
/// has nothing published yet.
#[allow(dead_code)]
pub fn block_records() -> Vec<BlockRecord> {
    serde_json::from_value(json!([
        {
            "blockId": "datasets.toy_av",
            "category": "datasets",
            "latestPublished": {"version": "1.1.0", "digest": "d1d1d1d1d1"}
        },
        {
            "blockId": "unimodals.linear",
            "latestPublished": {"version": "1.0.2", "digest": "e2e2e2e2e2"}
        },
        {
            "blockId": "fusions.concat",
            "latestPublished": {"version": "1.0.0", "digest": "f3f3f3f3f3"}
        },
        {
            "blockId": "training_structures.sgd_classifier",
            "latestPublished": {
                "version": "2.0.0",
                "digest": "a4a4a4a4a4",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "maxIter": {"type": "integer"},
                        "alpha": {"type": "number"}
                    },
                    "additionalProperties": false
                }
            }
        },
        {
            "blockId": "eval_scripts.basic",
            "latestPublished": {"version": "1.0.0", "digest": "b5b5b5b5b5", "deprecated": true}
        },
        {"blockId": "objectives.draft"}
    ]))
    .expect("fixture records are valid")
}

/// A graph with a dataset feeding one encoder. Returns the graph and the
/// dataset and encoder ids.
#[allow(dead_code)]
pub fn dataset_encoder_graph() -> (PipelineGraph, String, String) {
    let mut graph = PipelineGraph::new();
    let ds = graph.add_node(dataset_node()).id.clone();
    let enc = graph.add_node(encoder_node()).id.clone();
    graph
        .connect(&CandidateEdge::between(ds.as_str(), "batch", enc.as_str(), "batch"))
        .expect("batch ports share a type");
    (graph, ds, enc)
}

/// A fixed stamp so compiled specs can be compared whole.
#[allow(dead_code)]
pub fn fixed_stamp() -> Stamp {
    Stamp {
        id: "pipe_0000abcd".to_string(),
        created_at: "2024-05-01T12:00:00Z".parse().expect("valid timestamp"),
    }
}

#[allow(dead_code)]
pub fn step(node_id: &str, title: &str) -> ExplainStep {
    serde_json::from_value(json!({
        "nodeId": node_id,
        "nodeType": "encoder",
        "blockId": "unimodals.linear",
        "version": "1.0.0",
        "title": title,
    }))
    .expect("fixture step is valid")
}

#[allow(dead_code)]
pub fn trace_of(steps: Vec<ExplainStep>) -> ExplainResponse {
    ExplainResponse::new(steps)
}

/// An in-memory [`PipelineService`] with canned responses. Every spec it
/// receives is recorded.
///
/// `online` and `submitted` are shared handles, so a test can keep them
/// after moving the service into a `Session`.
#[allow(dead_code)]
pub struct FakeService {
    pub blocks: Vec<BlockRecord>,
    pub run: RunCreateResponse,
    pub trace: ExplainResponse,
    pub runs: Vec<RunListItem>,
    pub online: Arc<AtomicBool>,
    pub submitted: Arc<Mutex<Vec<PipelineSpec>>>,
}

#[allow(dead_code)]
impl FakeService {
    pub fn new() -> Self {
        Self {
            blocks: block_records(),
            run: RunCreateResponse {
                run_id: "run_00000001".to_string(),
                status: "succeeded".to_string(),
                metrics: None,
            },
            trace: trace_of(vec![step("n_ds", "Load"), step("n_encA", "Encode audio")]),
            runs: vec![],
            online: Arc::new(AtomicBool::new(true)),
            submitted: Arc::new(Mutex::new(vec![])),
        }
    }

    /// A service whose every call fails with a transport error.
    pub fn unreachable() -> Self {
        let service = Self::new();
        service.online.store(false, Ordering::SeqCst);
        service
    }

    fn reachable(&self) -> std::result::Result<(), ServiceError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ServiceError::Transport("connection refused".to_string()))
        }
    }
}

/// Number of specs a [`FakeService`] has received through `create_run`.
#[allow(dead_code)]
pub fn submitted_count(submitted: &Arc<Mutex<Vec<PipelineSpec>>>) -> usize {
    submitted.lock().map(|s| s.len()).unwrap_or(0)
}

#[async_trait]
impl PipelineService for FakeService {
    async fn list_blocks(&self) -> std::result::Result<Vec<BlockRecord>, ServiceError> {
        self.reachable()?;
        Ok(self.blocks.clone())
    }

    async fn create_run(&self, spec: &PipelineSpec) -> std::result::Result<RunCreateResponse, ServiceError> {
        self.reachable()?;
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(spec.clone());
        }
        Ok(self.run.clone())
    }

    async fn explain(&self, _spec: &PipelineSpec) -> std::result::Result<ExplainResponse, ServiceError> {
        self.reachable()?;
        Ok(self.trace.clone())
    }

    async fn list_runs(&self) -> std::result::Result<Vec<RunListItem>, ServiceError> {
        self.reachable()?;
        Ok(self.runs.clone())
    }
}
