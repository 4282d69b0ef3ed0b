use super::lowering::lock_blocks;
use crate::graph::{NodeInstance, PipelineGraph};
use crate::registry::{BlockVersion, RegistryCache};
use ahash::AHashMap;
use itertools::Itertools;
use serde_json::Value;
use std::fmt;

/// An advisory finding about a graph. None of these stop compilation; the
/// execution service remains the authority on what it will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The node's block has no published version in the registry snapshot.
    Unlocked { node_id: String, block_id: String },
    /// The node was placed at a different version than the one being locked.
    VersionDrift {
        node_id: String,
        placed: String,
        locked: String,
    },
    Deprecated { block_id: String, version: String },
    /// A config key the locked block's schema does not allow.
    UnknownConfigKey { node_id: String, key: String },
    ConfigTypeMismatch {
        node_id: String,
        key: String,
        expected: String,
    },
    /// More than one edge feeds the same input port.
    FanIn {
        node_id: String,
        port: String,
        sources: Vec<String>,
    },
    UnconnectedInput { node_id: String, port: String },
    Cycle { path: Vec<String> },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Unlocked { node_id, block_id } => write!(
                f,
                "node '{}': block '{}' has no published version and will not be locked",
                node_id, block_id
            ),
            Diagnostic::VersionDrift {
                node_id,
                placed,
                locked,
            } => write!(
                f,
                "node '{}': placed at version {} but the registry locks {}",
                node_id, placed, locked
            ),
            Diagnostic::Deprecated { block_id, version } => {
                write!(f, "block '{}@{}' is deprecated", block_id, version)
            }
            Diagnostic::UnknownConfigKey { node_id, key } => {
                write!(f, "node '{}': config key '{}' is not in the block schema", node_id, key)
            }
            Diagnostic::ConfigTypeMismatch {
                node_id,
                key,
                expected,
            } => write!(
                f,
                "node '{}': config key '{}' should be of type {}",
                node_id, key, expected
            ),
            Diagnostic::FanIn {
                node_id,
                port,
                sources,
            } => write!(
                f,
                "node '{}': input '{}' is fed by {} edges (from {})",
                node_id,
                port,
                sources.len(),
                sources.join(", ")
            ),
            Diagnostic::UnconnectedInput { node_id, port } => {
                write!(f, "node '{}': input '{}' is not connected", node_id, port)
            }
            Diagnostic::Cycle { path } => write!(f, "cycle: {}", path.join(" -> ")),
        }
    }
}

pub(super) fn diagnose(graph: &PipelineGraph, registry: &RegistryCache) -> Vec<Diagnostic> {
    let mut found = Vec::new();

    for node in graph.nodes() {
        match registry.lookup(&node.block_ref.block_id) {
            None => found.push(Diagnostic::Unlocked {
                node_id: node.id.clone(),
                block_id: node.block_ref.block_id.clone(),
            }),
            Some(locked) => {
                if locked.version != node.block_ref.version {
                    found.push(Diagnostic::VersionDrift {
                        node_id: node.id.clone(),
                        placed: node.block_ref.version.clone(),
                        locked: locked.version.clone(),
                    });
                }
                check_config(node, locked, &mut found);
            }
        }
    }

    for block in lock_blocks(graph.nodes(), registry) {
        if block.is_deprecated() {
            found.push(Diagnostic::Deprecated {
                block_id: block.block_id,
                version: block.version,
            });
        }
    }

    let feeds: AHashMap<(&str, &str), Vec<&str>> = graph
        .edges()
        .iter()
        .map(|e| ((e.to.node_id.as_str(), e.to.port()), e.from.node_id.as_str()))
        .into_group_map()
        .into_iter()
        .collect();
    for node in graph.nodes() {
        for port in &node.inputs {
            match feeds.get(&(node.id.as_str(), port.name.as_str())) {
                None => found.push(Diagnostic::UnconnectedInput {
                    node_id: node.id.clone(),
                    port: port.name.clone(),
                }),
                Some(sources) if sources.len() > 1 => found.push(Diagnostic::FanIn {
                    node_id: node.id.clone(),
                    port: port.name.clone(),
                    sources: sources.iter().map(|s| s.to_string()).collect(),
                }),
                Some(_) => {}
            }
        }
    }

    if let Some(path) = graph.find_cycle() {
        found.push(Diagnostic::Cycle { path });
    }

    found
}

/// Checks a node's config against the `properties` / `additionalProperties`
/// of the locked block's input schema.
fn check_config(node: &NodeInstance, locked: &BlockVersion, found: &mut Vec<Diagnostic>) {
    let schema = &locked.input_schema;
    let properties = schema.get("properties").and_then(Value::as_object);
    let additional = schema
        .get("additionalProperties")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    for (key, value) in node.config.as_map() {
        match properties.and_then(|p| p.get(key)) {
            Some(property) => {
                if let Some(expected) = property.get("type").and_then(Value::as_str) {
                    if !json_type_matches(expected, value) {
                        found.push(Diagnostic::ConfigTypeMismatch {
                            node_id: node.id.clone(),
                            key: key.clone(),
                            expected: expected.to_string(),
                        });
                    }
                }
            }
            None if !additional => found.push(Diagnostic::UnknownConfigKey {
                node_id: node.id.clone(),
                key: key.clone(),
            }),
            None => {}
        }
    }
}

fn json_type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_types_match_json_values() {
        assert!(json_type_matches("integer", &json!(300)));
        assert!(!json_type_matches("integer", &json!(0.5)));
        assert!(json_type_matches("number", &json!(0.5)));
        assert!(!json_type_matches("string", &json!(1)));
        assert!(json_type_matches("custom.tag", &json!(1)));
    }
}
