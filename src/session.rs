//! An editing session: one graph, one registry snapshot, and the latest
//! results of the remote calls made on its behalf.
//!
//! Remote results simply overwrite what was there before; when two requests
//! overlap, whichever resolves last wins. Failures are recorded in
//! `last_error` and leave every other piece of state untouched.

use crate::client::{PipelineService, RunCreateResponse, RunListItem};
use crate::compiler::{Compiler, Diagnostic};
use crate::error::{ConnectionRefused, SessionError};
use crate::graph::{CandidateEdge, PaletteItem, Palette, PipelineGraph, Position, demo_graph};
use crate::registry::RegistryCache;
use crate::spec::PipelineSpec;
use crate::trace::{ExplainResponse, ExplainStep, focus_step};
use tracing::{info, warn};

pub struct Session<S: PipelineService> {
    service: S,
    compiler: Compiler,
    palette: Palette,
    graph: PipelineGraph,
    registry: RegistryCache,
    spec_json: Option<String>,
    last_run: Option<RunCreateResponse>,
    trace: Option<ExplainResponse>,
    selected_node: Option<String>,
    selected_palette_key: String,
    last_error: Option<String>,
}

impl<S: PipelineService> Session<S> {
    pub fn new(service: S) -> Self {
        let palette = Palette::builtin();
        let selected_palette_key = palette.select("").key.clone();
        Self {
            service,
            compiler: Compiler::default(),
            palette,
            graph: PipelineGraph::new(),
            registry: RegistryCache::new(),
            spec_json: None,
            last_run: None,
            trace: None,
            selected_node: None,
            selected_palette_key,
            last_error: None,
        }
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.selected_palette_key = palette.select("").key.clone();
        self.palette = palette;
        self
    }

    /// Reloads the registry snapshot. On failure the old snapshot is kept.
    pub async fn refresh_registry(&mut self) -> Result<usize, SessionError> {
        match self.registry.refresh(&self.service).await {
            Ok(blocks) => Ok(blocks.len()),
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// The palette template for `key`; unknown keys select the first one.
    pub fn select_palette(&mut self, key: &str) -> &PaletteItem {
        let item = self.palette.select(key);
        self.selected_palette_key = item.key.clone();
        item
    }

    pub fn selected_palette(&self) -> &PaletteItem {
        self.palette.select(&self.selected_palette_key)
    }

    /// Drops a palette template onto the graph and returns the new node id,
    /// or `None` when `key` names no template.
    pub fn place(&mut self, key: &str, position: Position) -> Option<String> {
        let id = self
            .palette
            .place(key, &mut self.graph, &self.registry, position)?
            .id
            .clone();
        self.selected_palette_key = key.to_string();
        Some(id)
    }

    pub fn connect(&mut self, candidate: &CandidateEdge) -> Result<String, ConnectionRefused> {
        self.graph.connect(candidate).map(|edge| edge.id.clone())
    }

    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let removed = self.graph.remove_node(node_id).is_some();
        if removed && self.selected_node.as_deref() == Some(node_id) {
            self.selected_node = None;
        }
        removed
    }

    pub fn select_node(&mut self, node_id: Option<&str>) {
        self.selected_node = node_id.map(str::to_string);
    }

    /// Replaces the graph with the quick-start template and selects its
    /// dataset node.
    pub fn load_template(&mut self) {
        self.graph = demo_graph(&self.registry);
        self.selected_node = self.graph.nodes().first().map(|n| n.id.clone());
    }

    /// Empties the canvas and forgets the exported spec, last run and error.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.selected_node = None;
        self.spec_json = None;
        self.last_run = None;
        self.last_error = None;
    }

    /// Compiles the current graph and keeps its pretty-printed JSON.
    pub fn export_spec(&mut self) -> PipelineSpec {
        let spec = self.compiler.compile(&self.graph, &self.registry);
        match spec.to_json_pretty() {
            Ok(json) => self.spec_json = Some(json),
            Err(e) => warn!(error = %e, "Spec could not be rendered as JSON"),
        }
        spec
    }

    pub fn diagnose(&self) -> Vec<Diagnostic> {
        self.compiler.diagnose(&self.graph, &self.registry)
    }

    /// Compiles and submits the current graph.
    pub async fn run(&mut self) -> Result<&RunCreateResponse, SessionError> {
        self.last_error = None;
        let spec = self.export_spec();
        self.submit(spec).await
    }

    /// Parses a hand-edited spec and submits it. Nothing is submitted unless
    /// the whole payload parses and validates.
    pub async fn submit_spec_json(&mut self, text: &str) -> Result<&RunCreateResponse, SessionError> {
        self.last_error = None;
        match PipelineSpec::from_json(text) {
            Ok(spec) => self.submit(spec).await,
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    async fn submit(&mut self, spec: PipelineSpec) -> Result<&RunCreateResponse, SessionError> {
        match self.service.create_run(&spec).await {
            Ok(response) => {
                info!(run_id = %response.run_id, pipeline_id = %spec.pipeline.id, "Run recorded");
                Ok(self.last_run.insert(response))
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Compiles the current graph and asks the explain service for a trace.
    pub async fn build_trace(&mut self) -> Result<&ExplainResponse, SessionError> {
        self.last_error = None;
        let spec = self.export_spec();
        match self.service.explain(&spec).await {
            Ok(trace) => Ok(self.trace.insert(trace)),
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn list_runs(&mut self) -> Result<Vec<RunListItem>, SessionError> {
        self.service.list_runs().await.map_err(|e| {
            self.last_error = Some(e.to_string());
            e.into()
        })
    }

    /// The trace step for the selected node, or the first step.
    pub fn focused_step(&self) -> Option<&ExplainStep> {
        self.trace
            .as_ref()
            .and_then(|trace| focus_step(trace, self.selected_node.as_deref()))
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    pub fn registry(&self) -> &RegistryCache {
        &self.registry
    }

    pub fn spec_json(&self) -> Option<&str> {
        self.spec_json.as_deref()
    }

    pub fn last_run(&self) -> Option<&RunCreateResponse> {
        self.last_run.as_ref()
    }

    pub fn trace(&self) -> Option<&ExplainResponse> {
        self.trace.as_ref()
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
