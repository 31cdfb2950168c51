use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use reelcache_core::config::Config;
use reelcache_core::{
    CacheStore, MetadataResolver, OmdbProvider, PosterPipeline, RedisCache,
    ResolverOptions, cache, http_client,
};
use reelcache_model::QueryKey;
use tracing::debug;

use crate::report;

/// Shared state for one invocation: configuration, the HTTP session and the
/// metadata client built on it.
#[derive(Debug)]
pub struct Context {
    config: Config,
    http: reqwest::Client,
    source: Arc<OmdbProvider>,
    options: ResolverOptions,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let http =
            http_client(&config.fetch).context("failed to build HTTP client")?;
        let source = Arc::new(OmdbProvider::new(http.clone(), &config.api));
        let options = ResolverOptions {
            concurrency: config.fetch.concurrency,
        };
        Ok(Self {
            config,
            http,
            source,
            options,
        })
    }

    async fn open_cache(&self) -> Option<RedisCache> {
        cache::open(self.config.redis.as_ref()).await
    }
}

fn as_store(cache: &Option<RedisCache>) -> Option<&dyn CacheStore> {
    cache.as_ref().map(|c| c as &dyn CacheStore)
}

pub async fn search(ctx: &Context, keys: Vec<QueryKey>, json: bool) -> Result<()> {
    let resolver = MetadataResolver::metadata(Arc::clone(&ctx.source), ctx.options);

    // Connection lives for this batch only.
    let cache = ctx.open_cache().await;
    let outcome = resolver
        .resolve(as_store(&cache), &keys)
        .await
        .context("search failed")?;
    drop(cache);

    debug!(stats = ?outcome.stats, "search finished");

    let mut stdout = std::io::stdout().lock();
    if json {
        report::write_json(&mut stdout, &outcome.items)?;
    } else {
        report::write_records(&mut stdout, &outcome.items)?;
    }
    Ok(())
}

pub async fn poster(
    ctx: &Context,
    keys: Vec<QueryKey>,
    out: Option<PathBuf>,
) -> Result<()> {
    let out_dir = out.unwrap_or_else(|| ctx.config.posters.output_dir.clone());
    let pipeline =
        PosterPipeline::new(Arc::clone(&ctx.source), ctx.http.clone(), ctx.options);

    let cache = ctx.open_cache().await;
    let run = pipeline
        .run(as_store(&cache), &keys, &out_dir)
        .await
        .context("poster download failed")?;
    drop(cache);

    debug!(stats = ?run.resolution, "poster urls resolved");

    let mut stdout = std::io::stdout().lock();
    report::write_downloads(&mut stdout, &run.downloads)?;
    Ok(())
}
