use thiserror::Error;

/// Reasons a candidate edge was not added to a graph.
///
/// A refusal is an ordinary outcome of `connect`, not a failure of the graph:
/// the graph is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRefused {
    #[error("Handle '{0}' does not name a port")]
    MalformedHandle(String),

    #[error("Source node '{0}' does not exist")]
    SourceNodeMissing(String),

    #[error("Target node '{0}' does not exist")]
    TargetNodeMissing(String),

    #[error("Node '{0}' cannot be connected to itself")]
    SelfLoop(String),

    #[error("Node '{node_id}' has no output port named '{port}'")]
    SourcePortMissing { node_id: String, port: String },

    #[error("Node '{node_id}' has no input port named '{port}'")]
    TargetPortMissing { node_id: String, port: String },

    #[error("Port type mismatch: '{source_type}' cannot feed '{target_type}'")]
    PortTypeMismatch {
        source_type: String,
        target_type: String,
    },

    #[error("Edge '{0}' already makes this connection")]
    Duplicate(String),
}

/// Errors raised while talking to the registry, run or explain services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Transport(String),

    /// A non-2xx response. `message` is the best text found in the body,
    /// or `HTTP <status>` when the body had nothing usable.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Errors raised by the block registry cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Block registry unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors raised when reading a pipeline spec from hand-edited or remote JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("Failed to parse pipeline spec JSON: {0}")]
    Parse(String),

    #[error("Unsupported specVersion '{0}'")]
    UnsupportedVersion(String),

    #[error("Invalid pipeline spec at '{field}': {message}")]
    Invalid { field: String, message: String },
}

/// Errors raised by structural graph edits that cannot be expressed as a refusal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node id '{0}' is already in use in this graph")]
    DuplicateNodeId(String),
}

/// Errors that can occur when converting a draft format into a `PipelineGraph`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphConversionError {
    #[error("Failed to parse draft graph JSON: {0}")]
    Parse(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Invalid draft data: {0}")]
    Validation(String),
}

/// Errors surfaced by an editor `Session`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Spec(#[from] SpecError),
}
