use async_trait::async_trait;
use reelcache_model::{PosterLookup, QueryKey, Record};

use crate::error::TransportError;

/// Remote source of movie metadata.
///
/// Per-key failures come back as `Ok(Resolution::Failed(..))`; `Err` is reserved
/// for transport problems that should end the batch.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the metadata record for `key`.
    async fn fetch(&self, key: &QueryKey) -> Result<Record, TransportError>;

    /// Fetch only the poster URL for `key`.
    async fn fetch_poster_url(
        &self,
        key: &QueryKey,
    ) -> Result<PosterLookup, TransportError>;
}
