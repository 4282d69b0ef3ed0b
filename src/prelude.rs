//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the blockflow crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use blockflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let draft_json = std::fs::read_to_string("path/to/draft.json")?;
//! let conversion = DraftGraph::from_json(&draft_json)?.into_graph()?;
//!
//! let spec = Compiler::default().compile(&conversion.graph, &RegistryCache::new());
//! println!("{}", spec.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

// Graph construction
pub use crate::graph::{
    BlockRef, CandidateEdge, DraftGraph, EdgeInstance, GraphConversion, IntoGraph, NewNode,
    NodeConfig, NodeInstance, NodeKind, Palette, PipelineGraph, Position, demo_graph,
};
pub use crate::port::{PortDecl, PortHandle, is_compatible};

// Registry and compilation
pub use crate::compiler::{Compiler, Diagnostic, Stamp};
pub use crate::registry::{BlockRecord, BlockVersion, RegistryCache};
pub use crate::spec::{PipelineSpec, RunConfig, RunMode, SPEC_VERSION};

// Tracing and remote services
pub use crate::client::{
    ClientConfig, HttpPipelineService, PipelineService, RunCreateResponse, RunListItem,
};
pub use crate::session::Session;
pub use crate::trace::{ExplainResponse, ExplainStep, TraceCorrelation, TraceFormatter, focus_step};

// Error types
pub use crate::error::{
    ConnectionRefused, GraphConversionError, GraphError, RegistryError, ServiceError,
    SessionError, SpecError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
