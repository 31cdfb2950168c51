//! Cache-or-fetch batch resolution.
//!
//! A batch runs in four steps:
//!
//! 1. **Partition** distinct keys into cache hits and pending keys. A
//!    connection-level cache failure moves every remaining key to pending.
//! 2. **Fan out** one remote fetch per pending key and wait for all of them.
//! 3. **Merge** hits with fetched values, dropping per-key failures.
//! 4. **Write back** freshly fetched values; hits are never rewritten. Writes
//!    are attempted even after a read outage, since the connection may have
//!    been re-established.
//!
//! Output order is hits first (input order), then fetched values (input
//! order). Repeated keys resolve once. Callers must not rely on positional
//! correspondence with the input.

mod namespace;

pub use namespace::{CacheNamespace, MetadataNamespace, PosterNamespace};

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use reelcache_model::{QueryKey, Resolution};
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::error::{PipelineError, Result, TransportError};
use crate::providers::MetadataSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Maximum in-flight fetches; `None` dispatches every pending key at once.
    pub concurrency: Option<NonZeroUsize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub requested: usize,
    pub cache_hits: usize,
    pub fetched: usize,
    pub failed: usize,
    pub cached: usize,
    pub cache_write_failures: usize,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub items: Vec<T>,
    pub stats: BatchStats,
}

struct Partition<T> {
    resolved: Vec<T>,
    pending: Vec<QueryKey>,
}

#[derive(Debug)]
pub struct BatchResolver<N> {
    namespace: N,
    options: ResolverOptions,
}

pub type MetadataResolver<S> = BatchResolver<MetadataNamespace<S>>;
pub type PosterUrlResolver<S> = BatchResolver<PosterNamespace<S>>;

impl<S: MetadataSource + ?Sized> BatchResolver<MetadataNamespace<S>> {
    pub fn metadata(source: Arc<S>, options: ResolverOptions) -> Self {
        Self::new(MetadataNamespace::new(source), options)
    }
}

impl<S: MetadataSource + ?Sized> BatchResolver<PosterNamespace<S>> {
    pub fn poster_urls(source: Arc<S>, options: ResolverOptions) -> Self {
        Self::new(PosterNamespace::new(source), options)
    }
}

impl<N: CacheNamespace> BatchResolver<N> {
    pub fn new(namespace: N, options: ResolverOptions) -> Self {
        Self { namespace, options }
    }

    /// Resolve `keys` against `cache` (`None` when no cache is reachable) and
    /// the remote source.
    ///
    /// A transport failure in the fetch stage fails the whole batch, including
    /// values already read from the cache.
    pub async fn resolve(
        &self,
        cache: Option<&dyn CacheStore>,
        keys: &[QueryKey],
    ) -> Result<BatchOutcome<N::Item>> {
        if keys.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        let label = self.namespace.label();
        let mut seen = HashSet::with_capacity(keys.len());
        let distinct: Vec<QueryKey> = keys
            .iter()
            .filter(|key| seen.insert(key.as_str()))
            .cloned()
            .collect();
        if distinct.len() < keys.len() {
            debug!(
                namespace = label,
                repeated = keys.len() - distinct.len(),
                "ignoring repeated keys"
            );
        }

        let partition = self.partition(cache, &distinct).await;
        let mut stats = BatchStats {
            requested: distinct.len(),
            cache_hits: partition.resolved.len(),
            fetched: partition.pending.len(),
            ..BatchStats::default()
        };
        debug!(
            namespace = label,
            hits = stats.cache_hits,
            misses = stats.fetched,
            "partitioned batch"
        );

        let fetched = self.fan_out(&partition.pending).await?;

        let mut fresh = Vec::with_capacity(fetched.len());
        for (key, resolution) in fetched {
            match resolution {
                Resolution::Valid(item) => fresh.push((key, item)),
                Resolution::Failed(failure) => {
                    stats.failed += 1;
                    debug!(namespace = label, key = %key, %failure, "dropping failed lookup");
                }
            }
        }

        let (cached, write_failures) = self.write_back(cache, &fresh).await;
        stats.cached = cached;
        stats.cache_write_failures = write_failures;

        let mut items = partition.resolved;
        items.extend(fresh.into_iter().map(|(_, item)| item));

        info!(
            namespace = label,
            requested = stats.requested,
            hits = stats.cache_hits,
            fetched = stats.fetched,
            failed = stats.failed,
            cached = stats.cached,
            "batch resolved"
        );

        Ok(BatchOutcome { items, stats })
    }

    async fn partition(
        &self,
        cache: Option<&dyn CacheStore>,
        keys: &[QueryKey],
    ) -> Partition<N::Item> {
        let Some(cache) = cache else {
            info!("No cache connection, requesting each key from the API");
            return Partition {
                resolved: Vec::new(),
                pending: keys.to_vec(),
            };
        };

        let mut resolved = Vec::new();
        let mut pending = Vec::new();

        for (index, key) in keys.iter().enumerate() {
            let cache_key = self.namespace.cache_key(key);
            match cache.get(&cache_key).await {
                Ok(Some(raw)) => match self.namespace.decode(key, raw) {
                    Ok(item) => {
                        debug!("Cache HIT: {}", cache_key);
                        resolved.push(item);
                    }
                    Err(reason) => {
                        warn!(key = %key, %reason, "discarding unreadable cache entry");
                        pending.push(key.clone());
                    }
                },
                Ok(None) => {
                    debug!("Cache MISS: {}", cache_key);
                    pending.push(key.clone());
                }
                Err(err) if err.is_connection() => {
                    warn!(
                        error = %err,
                        remaining = keys.len() - index,
                        "Unable to connect to cache, requesting remaining keys from the API"
                    );
                    pending.extend(keys[index..].iter().cloned());
                    return Partition { resolved, pending };
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "cache read failed, treating as miss");
                    pending.push(key.clone());
                }
            }
        }

        Partition { resolved, pending }
    }

    /// Dispatch one fetch per key and wait for every one of them before
    /// reporting the first transport failure.
    async fn fan_out(
        &self,
        pending: &[QueryKey],
    ) -> std::result::Result<Vec<(QueryKey, Resolution<N::Item>)>, TransportError>
    {
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let limit = self
            .options
            .concurrency
            .map_or(pending.len(), NonZeroUsize::get);

        let results: Vec<_> = stream::iter(pending.iter().cloned())
            .map(|key| async move {
                let result = self.namespace.fetch(&key).await;
                (key, result)
            })
            .buffered(limit)
            .collect()
            .await;

        let mut fetched = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (key, result) in results {
            match result {
                Ok(resolution) => fetched.push((key, resolution)),
                Err(err) => {
                    error!(key = %key, error = %err, "request to the API failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(fetched),
        }
    }

    async fn write_back(
        &self,
        cache: Option<&dyn CacheStore>,
        fresh: &[(QueryKey, N::Item)],
    ) -> (usize, usize) {
        let Some(cache) = cache else {
            return (0, 0);
        };
        if fresh.is_empty() {
            return (0, 0);
        }

        let writes = fresh.iter().map(|(key, item)| async move {
            let value = match self.namespace.encode(item) {
                Ok(value) => value,
                Err(reason) => {
                    warn!(key = %key, %reason, "could not encode value for cache");
                    return false;
                }
            };
            match cache.set(&self.namespace.cache_key(key), &value).await {
                Ok(()) => true,
                Err(err) => {
                    warn!(key = %key, error = %err, "value was not saved to cache");
                    false
                }
            }
        });

        let results = join_all(writes).await;
        let cached = results.iter().filter(|saved| **saved).count();
        (cached, results.len() - cached)
    }
}
