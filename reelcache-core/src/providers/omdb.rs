use std::fmt;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reelcache_model::{
    Failure, MetadataFields, MetadataRecord, PosterLookup, PosterRef, QueryKey,
    Record, Resolution,
};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use super::traits::MetadataSource;
use crate::config::ApiConfig;
use crate::error::TransportError;

/// Fields dropped from every record: image/location fields, the list-valued
/// `Ratings` field and the API envelope.
pub const EXCLUDED_FIELDS: [&str; 4] = ["Poster", "Website", "Response", "Ratings"];

const ERROR_FIELD: &str = "Error";
const POSTER_FIELD: &str = "Poster";
const POSTER_UNAVAILABLE: &str = "N/A";

/// Characters escaped in the key. `+` is left alone so it still reads as a
/// space on the API side.
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'<')
    .add(b'>')
    .add(b'=');

enum ApiReply {
    Status(StatusCode),
    Body(MetadataFields),
}

/// Client for an OMDb-style API: one GET per key, JSON object replies with an
/// optional `Error` field.
#[derive(Clone)]
pub struct OmdbProvider {
    http: reqwest::Client,
    base_endpoint: String,
    api_key: String,
}

impl fmt::Debug for OmdbProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbProvider")
            .field("base_endpoint", &self.base_endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OmdbProvider {
    pub fn new(http: reqwest::Client, api: &ApiConfig) -> Self {
        Self {
            http,
            base_endpoint: api.base_endpoint.clone(),
            api_key: api.api_key.clone(),
        }
    }

    /// `base_endpoint + api_key + param=key`, with the param chosen by the
    /// key's shape.
    pub fn request_url(&self, key: &QueryKey) -> Result<Url, TransportError> {
        let encoded = utf8_percent_encode(key.as_str(), KEY_ENCODE_SET);
        let raw = format!(
            "{}{}{}={}",
            self.base_endpoint,
            self.api_key,
            key.mode().param(),
            encoded
        );
        Ok(Url::parse(&raw)?)
    }

    async fn get_reply(&self, key: &QueryKey) -> Result<ApiReply, TransportError> {
        let url = self.request_url(key)?;
        debug!(key = %key, mode = %key.mode(), "requesting metadata");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited {
                url: url.host_str().unwrap_or_default().to_string(),
            });
        }

        if status != StatusCode::OK {
            return Ok(ApiReply::Status(status));
        }

        let bytes = response.bytes().await?;
        let body: MetadataFields = serde_json::from_slice(&bytes)?;
        Ok(ApiReply::Body(body))
    }
}

/// The API-level error message, if the reply carries one.
fn api_error(body: &MetadataFields) -> Option<String> {
    match body.get(ERROR_FIELD)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn strip_excluded(mut body: MetadataFields) -> MetadataFields {
    for field in EXCLUDED_FIELDS {
        body.remove(field);
    }
    body
}

fn no_response<T>(key: &QueryKey, status: StatusCode) -> Resolution<T> {
    warn!(key = %key, status = %status, "data from the API was not received");
    Resolution::Failed(Failure::NoResponse {
        status: status.as_u16(),
    })
}

#[async_trait]
impl MetadataSource for OmdbProvider {
    async fn fetch(&self, key: &QueryKey) -> Result<Record, TransportError> {
        let body = match self.get_reply(key).await? {
            ApiReply::Status(status) => return Ok(no_response(key, status)),
            ApiReply::Body(body) => body,
        };

        if let Some(message) = api_error(&body) {
            warn!(key = %key, %message, "movie not found");
            return Ok(Resolution::Failed(Failure::NotFound { message }));
        }

        Ok(Resolution::Valid(MetadataRecord::new(
            key.clone(),
            strip_excluded(body),
        )))
    }

    async fn fetch_poster_url(
        &self,
        key: &QueryKey,
    ) -> Result<PosterLookup, TransportError> {
        let body = match self.get_reply(key).await? {
            ApiReply::Status(status) => return Ok(no_response(key, status)),
            ApiReply::Body(body) => body,
        };

        if let Some(message) = api_error(&body) {
            warn!(key = %key, %message, "movie not found");
            return Ok(Resolution::Failed(Failure::NotFound { message }));
        }

        match body.get(POSTER_FIELD).and_then(|value| value.as_str()) {
            Some(url) if !url.is_empty() && url != POSTER_UNAVAILABLE => {
                Ok(Resolution::Valid(PosterRef::new(key.clone(), url)))
            }
            _ => {
                warn!(key = %key, "movie has no poster");
                Ok(Resolution::Failed(Failure::NoPoster))
            }
        }
    }
}
