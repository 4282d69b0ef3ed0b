use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An immutable, published snapshot of a block's interface.
///
/// This is what gets recorded in a spec's `lockedBlocks` when a block is
/// selected at compile time. The core never mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVersion {
    pub block_id: String,
    pub version: String,
    pub digest: String,
    #[serde(default)]
    pub input_schema: Map<String, Value>,
    #[serde(default)]
    pub output_schema: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
}

impl BlockVersion {
    pub fn new(
        block_id: impl Into<String>,
        version: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            version: version.into(),
            digest: digest.into(),
            input_schema: Map::new(),
            output_schema: Map::new(),
            changelog: None,
            deprecated: None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.unwrap_or(false)
    }
}

/// The latest published version of a block as reported by `GET /blocks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedVersion {
    pub version: String,
    pub digest: String,
    #[serde(default)]
    pub input_schema: Option<Map<String, Value>>,
    #[serde(default)]
    pub output_schema: Option<Map<String, Value>>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub deprecated: Option<bool>,
}

/// One entry of the registry listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub block_id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latest_published: Option<PublishedVersion>,
}

impl BlockRecord {
    /// The locked form of this record, or `None` when nothing is published yet.
    pub fn to_block_version(&self) -> Option<BlockVersion> {
        let published = self.latest_published.as_ref()?;
        Some(BlockVersion {
            block_id: self.block_id.clone(),
            version: published.version.clone(),
            digest: published.digest.clone(),
            input_schema: published.input_schema.clone().unwrap_or_default(),
            output_schema: published.output_schema.clone().unwrap_or_default(),
            changelog: published.changelog.clone(),
            deprecated: published.deprecated,
        })
    }
}
