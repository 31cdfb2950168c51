use std::sync::Arc;

use async_trait::async_trait;
use reelcache_model::{
    MetadataFields, MetadataRecord, PosterRef, QueryKey, Resolution,
};

use crate::error::TransportError;
use crate::providers::MetadataSource;

/// One cache namespace plus the remote call that fills it.
#[async_trait]
pub trait CacheNamespace: Send + Sync {
    type Item: Send + Sync;

    /// Short name used in log lines.
    fn label(&self) -> &'static str;

    fn cache_key(&self, key: &QueryKey) -> String;

    /// Rebuild an item from its cached value. `Err` carries the reason the
    /// value was rejected.
    fn decode(&self, key: &QueryKey, cached: String) -> Result<Self::Item, String>;

    fn encode(&self, item: &Self::Item) -> Result<String, String>;

    async fn fetch(
        &self,
        key: &QueryKey,
    ) -> Result<Resolution<Self::Item>, TransportError>;
}

/// Metadata records, cached as a JSON object under the key itself.
#[derive(Debug)]
pub struct MetadataNamespace<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> MetadataNamespace<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S> CacheNamespace for MetadataNamespace<S>
where
    S: MetadataSource + ?Sized,
{
    type Item = MetadataRecord;

    fn label(&self) -> &'static str {
        "metadata"
    }

    fn cache_key(&self, key: &QueryKey) -> String {
        key.metadata_cache_key()
    }

    fn decode(&self, key: &QueryKey, cached: String) -> Result<MetadataRecord, String> {
        serde_json::from_str::<MetadataFields>(&cached)
            .map(|fields| MetadataRecord::new(key.clone(), fields))
            .map_err(|e| e.to_string())
    }

    fn encode(&self, item: &MetadataRecord) -> Result<String, String> {
        serde_json::to_string(&item.fields).map_err(|e| e.to_string())
    }

    async fn fetch(
        &self,
        key: &QueryKey,
    ) -> Result<Resolution<MetadataRecord>, TransportError> {
        self.source.fetch(key).await
    }
}

/// Poster URLs, cached as the raw URL under `key + "poster"`.
#[derive(Debug)]
pub struct PosterNamespace<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> PosterNamespace<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S> CacheNamespace for PosterNamespace<S>
where
    S: MetadataSource + ?Sized,
{
    type Item = PosterRef;

    fn label(&self) -> &'static str {
        "poster"
    }

    fn cache_key(&self, key: &QueryKey) -> String {
        key.poster_cache_key()
    }

    fn decode(&self, key: &QueryKey, cached: String) -> Result<PosterRef, String> {
        if cached.trim().is_empty() {
            return Err("empty poster url".to_string());
        }
        Ok(PosterRef::new(key.clone(), cached))
    }

    fn encode(&self, item: &PosterRef) -> Result<String, String> {
        Ok(item.url.clone())
    }

    async fn fetch(
        &self,
        key: &QueryKey,
    ) -> Result<Resolution<PosterRef>, TransportError> {
        self.source.fetch_poster_url(key).await
    }
}
