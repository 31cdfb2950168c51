use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a whole batch's remote phase.
///
/// Per-key problems (no match, non-200 status, missing poster) are not errors;
/// they travel as [`reelcache_model::Failure`] values.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection to the API failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("API URL is invalid: {0}")]
    InvalidUrl(String),

    #[error("response from the API was damaged: {0}")]
    MalformedPayload(String),

    #[error("server terminated the connection: {0}")]
    Disconnected(#[source] reqwest::Error),

    #[error("server is not responding: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("too many requests (rate limited by {url})")]
    RateLimited { url: String },

    #[error("request to the API failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err)
        } else if err.is_connect() {
            TransportError::Connect(err)
        } else if err.is_builder() {
            TransportError::InvalidUrl(err.to_string())
        } else if err.is_decode() {
            TransportError::MalformedPayload(err.to_string())
        } else if err.is_body() {
            TransportError::Disconnected(err)
        } else {
            TransportError::Request(err)
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::MalformedPayload(err.to_string())
    }
}

/// Cache-layer failures. Never fatal; see [`CacheError::is_connection`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store itself is unreachable; remaining reads are pointless.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// A single command failed while the connection stayed usable.
    #[error("cache command failed: {0}")]
    Command(String),
}

impl CacheError {
    pub fn is_connection(&self) -> bool {
        matches!(self, CacheError::Unavailable(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
            || err.is_io_error()
        {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Command(err.to_string())
        }
    }
}

/// Batch-level failures returned by the resolver and the poster pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no titles or IDs were provided")]
    EmptyBatch,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to prepare poster directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Why a single poster download produced no file. Never fails the batch.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("image server answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("image could not be processed: {0}")]
    Image(#[from] image::ImageError),

    #[error("poster could not be written: {0}")]
    Io(#[from] std::io::Error),

    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
