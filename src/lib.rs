//! # Blockflow - Pipeline Graph Compilation Engine
//!
//! **Blockflow** lets you assemble typed processing blocks into a directed
//! graph and compiles that graph into a self-contained, immutable
//! [`PipelineSpec`](spec::PipelineSpec) that a separate execution service can
//! run deterministically.
//!
//! ## Core Workflow
//!
//! 1.  **Snapshot the registry**: Refresh a [`RegistryCache`](registry::RegistryCache)
//!     from the block registry so published versions are known.
//! 2.  **Build the graph**: Place nodes on a [`PipelineGraph`](graph::PipelineGraph)
//!     and `connect` their ports. A connection is only accepted between an
//!     output and an input port carrying the same port type tag.
//! 3.  **Compile**: Use `Compiler::builder()` to configure name, seed and run
//!     mode, then compile the graph against the registry snapshot. Every
//!     referenced block is locked at its published version and digest.
//! 4.  **Inspect**: Send the spec to the explain service and use
//!     [`focus_step`](trace::focus_step) to match the returned trace back onto
//!     graph nodes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockflow::prelude::*;
//!
//! let registry = RegistryCache::from_versions(vec![
//!     BlockVersion::new("datasets.toy_av", "1.1.0", "d1d1d1d1"),
//! ]);
//!
//! let mut graph = PipelineGraph::new();
//! let dataset = graph
//!     .add_node(
//!         NewNode::new(NodeKind::Dataset, BlockRef::new("datasets.toy_av", "1.1.0"))
//!             .with_outputs(vec![PortDecl::new("batch", "batch.multimodal.v1")]),
//!     )
//!     .id
//!     .clone();
//! let encoder = graph
//!     .add_node(
//!         NewNode::new(NodeKind::Encoder, BlockRef::new("unimodals.linear", "1.0.0"))
//!             .with_inputs(vec![PortDecl::new("batch", "batch.multimodal.v1")]),
//!     )
//!     .id
//!     .clone();
//!
//! graph
//!     .connect(&CandidateEdge::between(dataset.as_str(), "batch", encoder.as_str(), "batch"))
//!     .expect("ports share a type");
//!
//! let spec = Compiler::builder().with_seed(7).build().compile(&graph, &registry);
//! println!("{}", spec.to_json_pretty().unwrap());
//! ```

pub mod client;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod id;
pub mod port;
pub mod prelude;
pub mod registry;
pub mod session;
pub mod spec;
pub mod trace;
