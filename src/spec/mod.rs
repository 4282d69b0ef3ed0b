//! The pipeline specification wire format and its all-or-nothing parser.

pub mod model;

pub use model::*;

use crate::error::SpecError;
use ahash::AHashSet;
use serde_json::Value;

const MIN_DIGEST_LEN: usize = 8;
// Shortest semantic version, e.g. `1.0.0`.
const MIN_VERSION_LEN: usize = 5;

impl PipelineSpec {
    /// Parses a spec from JSON, rejecting it as a whole on any problem.
    ///
    /// Hand-edited payloads go through here before they are submitted, so a
    /// spec is either fully accepted or not used at all.
    pub fn from_json(text: &str) -> Result<Self, SpecError> {
        let raw: Value = serde_json::from_str(text).map_err(|e| SpecError::Parse(e.to_string()))?;
        if let Some(version) = raw.get("specVersion") {
            match version.as_str() {
                Some(SPEC_VERSION) => {}
                Some(other) => return Err(SpecError::UnsupportedVersion(other.to_string())),
                None => return Err(SpecError::UnsupportedVersion(version.to_string())),
            }
        }
        let spec: PipelineSpec =
            serde_json::from_value(raw).map_err(|e| SpecError::Parse(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        serde_json::to_string_pretty(self).map_err(|e| SpecError::Parse(e.to_string()))
    }

    /// Checks the structural rules a run service relies on.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.spec_version != SPEC_VERSION {
            return Err(SpecError::UnsupportedVersion(self.spec_version.clone()));
        }
        require_non_empty("pipeline.id", &self.pipeline.id)?;
        require_non_empty("pipeline.name", &self.pipeline.name)?;

        let mut node_ids = AHashSet::new();
        for (i, node) in self.graph.nodes.iter().enumerate() {
            let at = |field: &str| format!("graph.nodes[{}].{}", i, field);
            require_non_empty(&at("id"), &node.id)?;
            if !node_ids.insert(node.id.as_str()) {
                return Err(invalid(at("id"), format!("duplicate node id '{}'", node.id)));
            }
            require_non_empty(&at("blockRef.blockId"), &node.block_ref.block_id)?;
            require_version(&at("blockRef.version"), &node.block_ref.version)?;
            for (j, port) in node.inputs.iter().chain(node.outputs.iter()).enumerate() {
                require_non_empty(&at(&format!("ports[{}].name", j)), &port.name)?;
                require_non_empty(&at(&format!("ports[{}].portType", j)), &port.port_type)?;
            }
        }

        for (i, edge) in self.graph.edges.iter().enumerate() {
            let at = |field: &str| format!("graph.edges[{}].{}", i, field);
            require_non_empty(&at("id"), &edge.id)?;
            require_non_empty(&at("from.nodeId"), &edge.from.node_id)?;
            require_non_empty(&at("from.port"), &edge.from.port)?;
            require_non_empty(&at("to.nodeId"), &edge.to.node_id)?;
            require_non_empty(&at("to.port"), &edge.to.port)?;
        }

        let mut block_ids = AHashSet::new();
        for (i, block) in self.locked_blocks.iter().enumerate() {
            let at = |field: &str| format!("lockedBlocks[{}].{}", i, field);
            require_non_empty(&at("blockId"), &block.block_id)?;
            require_version(&at("version"), &block.version)?;
            if block.digest.len() < MIN_DIGEST_LEN {
                return Err(invalid(
                    at("digest"),
                    format!("digest must be at least {} characters", MIN_DIGEST_LEN),
                ));
            }
            if !block_ids.insert(block.block_id.as_str()) {
                return Err(invalid(
                    at("blockId"),
                    format!("block '{}' is locked more than once", block.block_id),
                ));
            }
        }
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), SpecError> {
    if value.is_empty() {
        Err(invalid(field.to_string(), "must not be empty".to_string()))
    } else {
        Ok(())
    }
}

fn require_version(field: &str, version: &str) -> Result<(), SpecError> {
    require_non_empty(field, version)?;
    if version.len() < MIN_VERSION_LEN {
        return Err(invalid(
            field.to_string(),
            format!("version must be at least {} characters", MIN_VERSION_LEN),
        ));
    }
    Ok(())
}

fn invalid(field: String, message: String) -> SpecError {
    SpecError::Invalid { field, message }
}
