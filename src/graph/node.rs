use crate::port::PortDecl;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The role a block plays in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Dataset,
    Encoder,
    Fusion,
    Objective,
    Trainer,
    Evaluator,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Dataset => "dataset",
            NodeKind::Encoder => "encoder",
            NodeKind::Fusion => "fusion",
            NodeKind::Objective => "objective",
            NodeKind::Trainer => "trainer",
            NodeKind::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which block, at which version, a node was placed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRef {
    pub block_id: String,
    pub version: String,
}

impl BlockRef {
    pub fn new(block_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.block_id, self.version)
    }
}

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A block's configuration: an open key-value bag whose shape is defined by
/// the block, not by this crate.
///
/// Typed views are available for the known block families through
/// [`NodeConfig::view`]; anything else is read through the raw map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeConfig(Map<String, Value>);

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interprets the config according to the node kind. Kinds without a
    /// typed shape, and configs that do not fit the typed shape, fall back
    /// to the generic map.
    pub fn view(&self, kind: NodeKind) -> ConfigView<'_> {
        let value = Value::Object(self.0.clone());
        let typed = match kind {
            NodeKind::Dataset => serde_json::from_value(value).ok().map(ConfigView::Dataset),
            NodeKind::Encoder => serde_json::from_value(value).ok().map(ConfigView::Encoder),
            NodeKind::Trainer => serde_json::from_value(value).ok().map(ConfigView::Trainer),
            NodeKind::Evaluator => serde_json::from_value(value).ok().map(ConfigView::Evaluator),
            NodeKind::Fusion | NodeKind::Objective => None,
        };
        typed.unwrap_or(ConfigView::Generic(&self.0))
    }
}

impl From<Map<String, Value>> for NodeConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn typed_to_config<T: Serialize>(typed: &T) -> NodeConfig {
    match serde_json::to_value(typed) {
        Ok(Value::Object(map)) => NodeConfig(map),
        _ => NodeConfig::default(),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dim: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iter: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_std: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! impl_config_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for NodeConfig {
                fn from(typed: $ty) -> Self {
                    typed_to_config(&typed)
                }
            }
        )*
    };
}

impl_config_from!(DatasetConfig, EncoderConfig, TrainerConfig, EvaluatorConfig);

/// A kind-specific reading of a [`NodeConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigView<'a> {
    Dataset(DatasetConfig),
    Encoder(EncoderConfig),
    Trainer(TrainerConfig),
    Evaluator(EvaluatorConfig),
    Generic(&'a Map<String, Value>),
}

/// A block instance placed on a graph.
///
/// `kind`, `block_ref` and the port lists are fixed when the node is placed;
/// only `config` and `position` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub block_ref: BlockRef,
    #[serde(default)]
    pub inputs: Vec<PortDecl>,
    #[serde(default)]
    pub outputs: Vec<PortDecl>,
    #[serde(default)]
    pub config: NodeConfig,
    #[serde(rename = "ui", default)]
    pub position: Position,
}

impl NodeInstance {
    pub fn input(&self, name: &str) -> Option<&PortDecl> {
        crate::port::find_port(&self.inputs, name)
    }

    pub fn output(&self, name: &str) -> Option<&PortDecl> {
        crate::port::find_port(&self.outputs, name)
    }
}

/// The caller-supplied parts of a node about to be placed. The graph assigns
/// the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub kind: NodeKind,
    pub block_ref: BlockRef,
    pub inputs: Vec<PortDecl>,
    pub outputs: Vec<PortDecl>,
    pub config: NodeConfig,
    pub position: Position,
}

impl NewNode {
    pub fn new(kind: NodeKind, block_ref: BlockRef) -> Self {
        Self {
            kind,
            block_ref,
            inputs: Vec::new(),
            outputs: Vec::new(),
            config: NodeConfig::default(),
            position: Position::default(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<PortDecl>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<PortDecl>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_config(mut self, config: impl Into<NodeConfig>) -> Self {
        self.config = config.into();
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub(crate) fn into_instance(self, id: String) -> NodeInstance {
        NodeInstance {
            id,
            kind: self.kind,
            block_ref: self.block_ref,
            inputs: self.inputs,
            outputs: self.outputs,
            config: self.config,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encoder_config_view_reads_known_keys_and_keeps_extra() {
        let map = json!({"modalityKey": "audio", "outDim": 16, "dropout": 0.1});
        let config = NodeConfig::from(map.as_object().cloned().unwrap_or_default());
        match config.view(NodeKind::Encoder) {
            ConfigView::Encoder(enc) => {
                assert_eq!(enc.modality_key.as_deref(), Some("audio"));
                assert_eq!(enc.out_dim, Some(16));
                assert_eq!(enc.extra.get("dropout"), Some(&json!(0.1)));
            }
            other => panic!("expected encoder view, got {:?}", other),
        }
    }

    #[test]
    fn mistyped_config_falls_back_to_generic() {
        let mut config = NodeConfig::new();
        config.set("n", json!("many"));
        assert!(matches!(config.view(NodeKind::Dataset), ConfigView::Generic(_)));
        assert!(matches!(NodeConfig::new().view(NodeKind::Fusion), ConfigView::Generic(_)));
    }

    #[test]
    fn typed_config_serializes_to_camel_case_map() {
        let config: NodeConfig = TrainerConfig {
            max_iter: Some(300),
            alpha: Some(0.0001),
            ..Default::default()
        }
        .into();
        assert_eq!(config.get("maxIter"), Some(&json!(300)));
        assert_eq!(config.get("alpha"), Some(&json!(0.0001)));
    }
}
