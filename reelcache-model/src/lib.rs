//! Core data model definitions shared across reelcache crates.

pub mod error;
pub mod poster;
pub mod query;
pub mod record;

pub use error::ModelError;
pub use poster::PosterRef;
pub use query::{QueryKey, QueryMode};
pub use record::{
    Failure, MetadataFields, MetadataRecord, PosterLookup, Record, Resolution,
};
