//! Cache-augmented batch lookup of movie metadata and posters.
//!
//! Keys are resolved against a key-value cache first; misses are fetched from
//! the metadata API concurrently and written back. The poster pipeline runs the
//! same resolution against a separate cache namespace and then downloads and
//! normalizes each image.

pub mod cache;
pub mod config;
pub mod error;
pub mod poster;
pub mod providers;
pub mod resolver;

pub use cache::{CacheStore, RedisCache};
pub use config::{Config, ConfigLoadError};
pub use error::{CacheError, DownloadError, PipelineError, Result, TransportError};
pub use poster::{DownloadSummary, PosterDownload, PosterPipeline, PosterRun};
pub use providers::{MetadataSource, OmdbProvider, http_client};
pub use resolver::{
    BatchOutcome, BatchResolver, BatchStats, MetadataResolver, ResolverOptions,
};
