use crate::graph::PipelineGraph;
use crate::id::new_id;
use crate::registry::RegistryCache;
use crate::spec::{PipelineMeta, PipelineSpec, RunConfig, RunMode, RunResources, SPEC_VERSION};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

mod diagnostics;
mod lowering;

pub use diagnostics::Diagnostic;

use lowering::{lock_blocks, lower_graph};

pub const DEFAULT_PIPELINE_NAME: &str = "MVP Pipeline";

/// The identity a compilation stamps onto its spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl Stamp {
    /// A new `pipe_<hex>` id and the current time.
    pub fn fresh() -> Self {
        Self {
            id: new_id("pipe"),
            created_at: Utc::now(),
        }
    }
}

/// Compiles pipeline graphs into [`PipelineSpec`]s.
///
/// A compiler carries only settings; the graph and registry snapshot are
/// passed per call, so one compiler can be reused across edits.
#[derive(Debug, Clone)]
pub struct Compiler {
    name: String,
    description: Option<String>,
    run_config: RunConfig,
}

pub struct CompilerBuilder {
    name: String,
    description: Option<String>,
    run_config: RunConfig,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_PIPELINE_NAME.to_string(),
            description: None,
            run_config: RunConfig::default(),
        }
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.run_config.seed = seed;
        self
    }
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.run_config.mode = mode;
        self
    }
    pub fn with_resources(mut self, resources: RunResources) -> Self {
        self.run_config.resources = Some(resources);
        self
    }
    pub fn build(self) -> Compiler {
        Compiler {
            name: self.name,
            description: self.description,
            run_config: self.run_config,
        }
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        CompilerBuilder::new().build()
    }
}

impl Compiler {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    /// Compiles under a fresh pipeline id and the current time.
    pub fn compile(&self, graph: &PipelineGraph, registry: &RegistryCache) -> PipelineSpec {
        self.compile_with_stamp(graph, registry, Stamp::fresh())
    }

    /// Compiles under a caller-supplied stamp. Apart from the stamp the
    /// output depends only on the graph and the registry snapshot.
    ///
    /// Nodes whose block is not in the snapshot still compile; they simply
    /// contribute no locked block.
    pub fn compile_with_stamp(
        &self,
        graph: &PipelineGraph,
        registry: &RegistryCache,
        stamp: Stamp,
    ) -> PipelineSpec {
        let locked_blocks = lock_blocks(graph.nodes(), registry);
        let spec_graph = lower_graph(graph);

        info!(
            pipeline_id = %stamp.id,
            nodes = spec_graph.nodes.len(),
            edges = spec_graph.edges.len(),
            locked = locked_blocks.len(),
            "Pipeline compiled"
        );

        PipelineSpec {
            spec_version: SPEC_VERSION.to_string(),
            pipeline: PipelineMeta {
                id: stamp.id,
                name: self.name.clone(),
                description: self.description.clone(),
                created_at: stamp.created_at,
            },
            graph: spec_graph,
            locked_blocks,
            run_config: self.run_config.clone(),
        }
    }

    /// Reports advisory findings about a graph against a registry snapshot
    /// and logs each one.
    pub fn diagnose(&self, graph: &PipelineGraph, registry: &RegistryCache) -> Vec<Diagnostic> {
        let found = diagnostics::diagnose(graph, registry);
        for diagnostic in &found {
            warn!(%diagnostic, "Pipeline diagnostic");
        }
        found
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }
}
