use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::poster::PosterRef;
use crate::query::QueryKey;

/// Field name to value mapping of one resolved movie, as returned by the API.
pub type MetadataFields = serde_json::Map<String, serde_json::Value>;

/// Why a single key could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Failure {
    /// The API answered but reported no match.
    NotFound { message: String },
    /// The API answered with a non-200 status.
    NoResponse { status: u16 },
    /// The movie exists but has no usable poster URL.
    NoPoster,
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Failure::NotFound { message } => write!(f, "not found: {message}"),
            Failure::NoResponse { status } => {
                write!(f, "received no response (status {status})")
            }
            Failure::NoPoster => write!(f, "movie has no poster"),
        }
    }
}

/// Outcome of resolving one key: a value, or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Valid(T),
    Failed(Failure),
}

impl<T> Resolution<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Resolution::Valid(_))
    }

    pub fn valid(self) -> Option<T> {
        match self {
            Resolution::Valid(value) => Some(value),
            Resolution::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Resolution::Valid(_) => None,
            Resolution::Failed(failure) => Some(failure),
        }
    }
}

/// One resolved movie, stripped of the excluded API fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub key: QueryKey,
    pub fields: MetadataFields,
}

impl MetadataRecord {
    pub fn new(key: QueryKey, fields: MetadataFields) -> Self {
        Self { key, fields }
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// The `Title` field when present, otherwise the query key.
    pub fn display_title(&self) -> &str {
        self.fields
            .get("Title")
            .and_then(|value| value.as_str())
            .unwrap_or_else(|| self.key.as_str())
    }
}

pub type Record = Resolution<MetadataRecord>;

pub type PosterLookup = Resolution<PosterRef>;
