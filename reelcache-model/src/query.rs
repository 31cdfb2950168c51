use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

const IMDB_ID_PREFIX: &str = "tt";
const IMDB_ID_LEN: usize = 9;
const POSTER_NAMESPACE_SUFFIX: &str = "poster";

/// How a query key is sent to the metadata API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// `tt` followed by seven digits, looked up by identifier.
    ImdbId,
    /// Anything else, looked up by title.
    Title,
}

impl QueryMode {
    /// Query-string parameter name used for this mode.
    pub fn param(self) -> &'static str {
        match self {
            QueryMode::ImdbId => "i",
            QueryMode::Title => "t",
        }
    }
}

impl Display for QueryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::ImdbId => write!(f, "id"),
            QueryMode::Title => write!(f, "title"),
        }
    }
}

/// A caller-supplied movie title or IMDb identifier.
///
/// The key is used verbatim as the metadata cache key and, suffixed with
/// `poster`, as the poster URL cache key.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ModelError::EmptyQueryKey);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn mode(&self) -> QueryMode {
        let key = self.0.as_bytes();
        let is_id = key.len() == IMDB_ID_LEN
            && self.0.starts_with(IMDB_ID_PREFIX)
            && key[IMDB_ID_PREFIX.len()..].iter().all(u8::is_ascii_digit);

        if is_id {
            QueryMode::ImdbId
        } else {
            QueryMode::Title
        }
    }

    /// Cache key holding the serialized metadata record.
    pub fn metadata_cache_key(&self) -> String {
        self.0.clone()
    }

    /// Cache key holding the raw poster URL.
    pub fn poster_cache_key(&self) -> String {
        format!("{}{}", self.0, POSTER_NAMESPACE_SUFFIX)
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QueryKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        QueryKey::new(s)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> QueryKey {
        QueryKey::new(value).expect("valid key")
    }

    #[test]
    fn imdb_shaped_keys_use_id_mode() {
        assert_eq!(key("tt1234567").mode(), QueryMode::ImdbId);
        assert_eq!(key("tt0111161").mode().param(), "i");
    }

    #[test]
    fn short_ids_and_titles_use_title_mode() {
        assert_eq!(key("tt12345").mode(), QueryMode::Title);
        assert_eq!(key("The Matrix").mode(), QueryMode::Title);
        assert_eq!(key("tt12345678").mode(), QueryMode::Title);
        assert_eq!(key("tt12a4567").mode(), QueryMode::Title);
        assert_eq!(key("The Matrix").mode().param(), "t");
    }

    #[test]
    fn poster_namespace_is_suffixed() {
        let k = key("tt0111161");
        assert_eq!(k.metadata_cache_key(), "tt0111161");
        assert_eq!(k.poster_cache_key(), "tt0111161poster");
    }

    #[test]
    fn blank_keys_are_rejected() {
        assert_eq!(QueryKey::new(""), Err(ModelError::EmptyQueryKey));
        assert_eq!("   ".parse::<QueryKey>(), Err(ModelError::EmptyQueryKey));
    }
}
