use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::query::QueryKey;

const TITLE_SEPARATORS: [char; 3] = ['+', '/', '\\'];

/// A resolved key paired with the URL of its poster image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterRef {
    pub title: QueryKey,
    pub url: String,
}

impl PosterRef {
    pub fn new(title: QueryKey, url: impl Into<String>) -> Self {
        Self {
            title,
            url: url.into(),
        }
    }

    /// Title with separator characters rendered as spaces, usable as a file stem.
    pub fn file_stem(&self) -> String {
        self.title
            .as_str()
            .chars()
            .map(|c| if TITLE_SEPARATORS.contains(&c) { ' ' } else { c })
            .collect()
    }

    /// Suffix of the URL's final path segment, without the leading dot.
    pub fn extension(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        let segment = url.path_segments()?.next_back()?;
        Path::new(segment)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_owned)
    }

    /// Output file name: sanitized title plus the URL's extension, if any.
    pub fn file_name(&self) -> String {
        match self.extension() {
            Some(ext) => format!("{}.{}", self.file_stem(), ext),
            None => self.file_stem(),
        }
    }
}
