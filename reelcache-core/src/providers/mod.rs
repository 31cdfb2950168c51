pub mod omdb;
pub mod traits;

pub use omdb::OmdbProvider;
pub use traits::MetadataSource;

use crate::config::FetchConfig;
use crate::error::TransportError;

/// Build the HTTP session shared by every request in a batch.
pub fn http_client(config: &FetchConfig) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("reelcache/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(TransportError::from)
}
