use super::record::{BlockRecord, BlockVersion};
use crate::client::PipelineService;
use crate::error::RegistryError;
use ahash::AHashMap;
use tracing::{info, warn};

/// An in-memory snapshot of published block versions, keyed by block id.
///
/// The cache never merges: every successful refresh replaces the whole
/// snapshot, and a failed refresh keeps the previous one.
#[derive(Debug, Clone, Default)]
pub struct RegistryCache {
    blocks: AHashMap<String, BlockVersion>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot directly from locked versions. Later entries with the
    /// same block id win.
    pub fn from_versions(versions: impl IntoIterator<Item = BlockVersion>) -> Self {
        let blocks = versions
            .into_iter()
            .map(|v| (v.block_id.clone(), v))
            .collect();
        Self { blocks }
    }

    /// Replaces the snapshot with the published entries of `records`.
    /// Records without a published version are skipped.
    pub fn replace_with(&mut self, records: &[BlockRecord]) -> &AHashMap<String, BlockVersion> {
        self.blocks = records
            .iter()
            .filter_map(|record| record.to_block_version())
            .map(|v| (v.block_id.clone(), v))
            .collect();
        &self.blocks
    }

    /// Fetches the registry listing and replaces the snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh<S>(
        &mut self,
        service: &S,
    ) -> Result<&AHashMap<String, BlockVersion>, RegistryError>
    where
        S: PipelineService + ?Sized,
    {
        match service.list_blocks().await {
            Ok(records) => {
                let total = records.len();
                self.replace_with(&records);
                info!(
                    listed = total,
                    published = self.blocks.len(),
                    "Block registry refreshed"
                );
                Ok(&self.blocks)
            }
            Err(e) => {
                warn!(error = %e, kept = self.blocks.len(), "Block registry refresh failed");
                Err(RegistryError::Unavailable {
                    message: e.to_string(),
                })
            }
        }
    }

    pub fn lookup(&self, block_id: &str) -> Option<&BlockVersion> {
        self.blocks.get(block_id)
    }

    /// The locked version string for a block, if it is published.
    pub fn version_of(&self, block_id: &str) -> Option<&str> {
        self.lookup(block_id).map(|v| v.version.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockVersion> {
        self.blocks.values()
    }
}
