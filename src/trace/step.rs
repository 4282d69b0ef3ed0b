use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_TRACE_VERSION: &str = "0.1.0";

fn default_trace_version() -> String {
    DEFAULT_TRACE_VERSION.to_string()
}

/// One port value observed while explaining a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainPortIO {
    pub name: String,
    pub port_type: String,
    #[serde(default)]
    pub shape: Option<Vec<u64>>,
    #[serde(default)]
    pub preview: Option<Vec<f64>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// The execution record of one graph node, as returned by the explain service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainStep {
    pub node_id: String,
    pub node_type: String,
    pub block_id: String,
    pub version: String,
    pub title: String,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub inputs: Vec<ExplainPortIO>,
    #[serde(default)]
    pub outputs: Vec<ExplainPortIO>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub why_it_works: Option<String>,
    #[serde(rename = "impl", default)]
    pub implementation: Vec<String>,
}

/// An ordered execution trace. Step order is the service's, which need not
/// match graph order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResponse {
    #[serde(default = "default_trace_version")]
    pub trace_version: String,
    #[serde(default)]
    pub metrics: Option<Map<String, Value>>,
    pub steps: Vec<ExplainStep>,
}

impl ExplainResponse {
    pub fn new(steps: Vec<ExplainStep>) -> Self {
        Self {
            trace_version: default_trace_version(),
            metrics: None,
            steps,
        }
    }
}
