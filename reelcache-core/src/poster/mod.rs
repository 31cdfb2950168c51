//! Poster lookup and download.
//!
//! Runs in two stages. URL resolution reuses the batch resolver against the
//! poster cache namespace. The download stage then fetches every resolved URL
//! concurrently, normalizes the image and writes it into the output directory.
//! Download failures are reported per item and never abort the stage.
//!
//! Titles that sanitize to the same file stem share an output path. Only the
//! first of them is downloaded; the rest are reported as not downloaded.

pub mod transform;

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use image::ImageFormat;
use reelcache_model::{PosterRef, QueryKey};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::{DownloadError, PipelineError, Result, TransportError};
use crate::providers::MetadataSource;
use crate::resolver::{BatchOutcome, BatchStats, PosterUrlResolver, ResolverOptions};

/// Outcome of one download. `path` is `None` when no file was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterDownload {
    pub title: QueryKey,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub total: usize,
    pub items: Vec<PosterDownload>,
}

#[derive(Debug, Clone)]
pub struct PosterRun {
    pub resolution: BatchStats,
    pub downloads: DownloadSummary,
}

#[derive(Debug)]
pub struct PosterPipeline<S: ?Sized> {
    resolver: PosterUrlResolver<S>,
    http: reqwest::Client,
    options: ResolverOptions,
}

impl<S> PosterPipeline<S>
where
    S: MetadataSource + ?Sized,
{
    pub fn new(
        source: Arc<S>,
        http: reqwest::Client,
        options: ResolverOptions,
    ) -> Self {
        Self {
            resolver: PosterUrlResolver::poster_urls(source, options),
            http,
            options,
        }
    }

    /// Resolve poster URLs for `keys`, cache first.
    pub async fn resolve_urls(
        &self,
        cache: Option<&dyn CacheStore>,
        keys: &[QueryKey],
    ) -> Result<BatchOutcome<PosterRef>> {
        self.resolver.resolve(cache, keys).await
    }

    /// Download every poster into `out_dir`, creating it if needed.
    pub async fn download_all(
        &self,
        posters: &[PosterRef],
        out_dir: &Path,
    ) -> Result<DownloadSummary> {
        tokio::fs::create_dir_all(out_dir).await.map_err(|source| {
            PipelineError::OutputDir {
                path: out_dir.to_path_buf(),
                source,
            }
        })?;

        let total = posters.len();
        if total == 0 {
            return Ok(DownloadSummary::default());
        }

        let limit = self.options.concurrency.map_or(total, NonZeroUsize::get);

        let mut stems = HashSet::with_capacity(total);
        let claimed: Vec<bool> = posters
            .iter()
            .map(|poster| stems.insert(poster.file_stem()))
            .collect();

        let items: Vec<PosterDownload> = stream::iter(posters.iter().zip(claimed))
            .map(|(poster, claimed)| async move {
                if !claimed {
                    warn!(
                        title = %poster.title,
                        stem = %poster.file_stem(),
                        "output file already claimed by another poster, skipping"
                    );
                    return PosterDownload {
                        title: poster.title.clone(),
                        path: None,
                    };
                }
                let path = match self.download_one(poster, out_dir).await {
                    Ok(path) => {
                        info!("Poster {} downloaded", poster.title);
                        Some(path)
                    }
                    Err(err) => {
                        warn!(title = %poster.title, url = %poster.url, error = %err, "poster download failed");
                        None
                    }
                };
                PosterDownload {
                    title: poster.title.clone(),
                    path,
                }
            })
            .buffered(limit)
            .collect()
            .await;

        let downloaded = items.iter().filter(|item| item.path.is_some()).count();
        info!("Downloaded {}/{} posters", downloaded, total);

        Ok(DownloadSummary {
            downloaded,
            total,
            items,
        })
    }

    /// Resolve URLs for `keys`, then download them into `out_dir`.
    pub async fn run(
        &self,
        cache: Option<&dyn CacheStore>,
        keys: &[QueryKey],
        out_dir: &Path,
    ) -> Result<PosterRun> {
        let outcome = self.resolve_urls(cache, keys).await?;
        let downloads = self.download_all(&outcome.items, out_dir).await?;
        Ok(PosterRun {
            resolution: outcome.stats,
            downloads,
        })
    }

    async fn download_one(
        &self,
        poster: &PosterRef,
        out_dir: &Path,
    ) -> std::result::Result<PathBuf, DownloadError> {
        debug!(title = %poster.title, url = %poster.url, "downloading poster");

        let response = self
            .http
            .get(&poster.url)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::Status(status));
        }

        let bytes = response.bytes().await.map_err(TransportError::from)?;
        let extension = poster.extension();

        let normalized = tokio::task::spawn_blocking(move || {
            let format = transform::output_format(extension.as_deref(), &bytes)?;
            transform::normalize(&bytes, format)
        })
        .await??;

        let path = out_dir.join(output_file_name(poster, normalized.format));
        tokio::fs::write(&path, &normalized.bytes).await?;
        Ok(path)
    }
}

/// The URL's own file name when it matches the encoded format, otherwise the
/// sanitized title with the format's canonical extension.
fn output_file_name(poster: &PosterRef, format: ImageFormat) -> String {
    let url_matches = poster
        .extension()
        .and_then(ImageFormat::from_extension)
        .is_some_and(|named| named == format);

    if url_matches {
        return poster.file_name();
    }

    match format.extensions_str().first() {
        Some(ext) => format!("{}.{}", poster.file_stem(), ext),
        None => poster.file_stem(),
    }
}
