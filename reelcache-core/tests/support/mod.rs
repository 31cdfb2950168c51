#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reelcache_core::{CacheError, CacheStore, MetadataSource, TransportError};
use reelcache_model::{
    Failure, MetadataFields, MetadataRecord, PosterLookup, PosterRef, QueryKey,
    Record, Resolution,
};
use serde_json::json;

pub fn key(value: &str) -> QueryKey {
    QueryKey::new(value).expect("valid key")
}

pub fn keys(values: &[&str]) -> Vec<QueryKey> {
    values.iter().map(|v| key(v)).collect()
}

pub fn movie_fields(title: &str, year: &str) -> MetadataFields {
    let serde_json::Value::Object(fields) = json!({
        "Title": title,
        "Year": year,
        "Genre": "Drama",
    }) else {
        unreachable!("object literal");
    };
    fields
}

/// In-memory cache with switchable failure modes.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    outage_after: Option<usize>,
    down: AtomicBool,
    recovers: bool,
    failing_writes: bool,
    failing_reads: Vec<String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read fails with a connection-level error.
    pub fn unavailable() -> Self {
        Self::unavailable_after(0)
    }

    /// The first `reads` reads succeed; the connection drops on the next one
    /// and stays down.
    pub fn unavailable_after(reads: usize) -> Self {
        Self {
            outage_after: Some(reads),
            ..Self::default()
        }
    }

    /// Writes succeed again once an outage has been hit.
    pub fn recovering(mut self) -> Self {
        self.recovers = true;
        self
    }

    /// Every write fails with a command error.
    pub fn with_failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    /// Reads of `key` fail with a command error.
    pub fn with_failing_read(mut self, key: &str) -> Self {
        self.failing_reads.push(key.to_string());
        self
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), value.to_string());
    }

    pub fn insert_record(&self, key: &str, fields: &MetadataFields) {
        self.insert(key, &serde_json::to_string(fields).expect("encode"));
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("cache lock").get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst);
        if self.outage_after.is_some_and(|limit| read >= limit) {
            self.down.store(true, Ordering::SeqCst);
            return Err(CacheError::Unavailable("connection refused".into()));
        }
        if self.failing_reads.iter().any(|k| k == key) {
            return Err(CacheError::Command("WRONGTYPE".into()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        if self.down.load(Ordering::SeqCst) && !self.recovers {
            return Err(CacheError::Unavailable("connection refused".into()));
        }
        if self.failing_writes {
            return Err(CacheError::Command("READONLY".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(key, value);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Script {
    Movie {
        fields: MetadataFields,
        poster: Option<String>,
    },
    NotFound,
    NoResponse(u16),
    RateLimited,
}

/// Metadata source answering from a fixed script. Unscripted keys are
/// reported as not found.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: HashMap<String, Script>,
    fetch_calls: AtomicUsize,
    poster_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn movie(mut self, key: &str, title: &str, poster: Option<&str>) -> Self {
        self.script.insert(
            key.to_string(),
            Script::Movie {
                fields: movie_fields(title, "1994"),
                poster: poster.map(str::to_string),
            },
        );
        self
    }

    pub fn reply(mut self, key: &str, script: Script) -> Self {
        self.script.insert(key.to_string(), script);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn poster_calls(&self) -> usize {
        self.poster_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("requested lock").clone()
    }

    async fn lookup(&self, key: &QueryKey) -> Result<Script, TransportError> {
        self.requested
            .lock()
            .expect("requested lock")
            .push(key.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script.get(key.as_str()).cloned() {
            Some(Script::RateLimited) => Err(TransportError::RateLimited {
                url: "api.test".into(),
            }),
            Some(script) => Ok(script),
            None => Ok(Script::NotFound),
        }
    }
}

fn not_found<T>() -> Resolution<T> {
    Resolution::Failed(Failure::NotFound {
        message: "Movie not found!".into(),
    })
}

#[async_trait]
impl MetadataSource for ScriptedSource {
    async fn fetch(&self, key: &QueryKey) -> Result<Record, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match self.lookup(key).await? {
            Script::Movie { fields, .. } => {
                Resolution::Valid(MetadataRecord::new(key.clone(), fields))
            }
            Script::NoResponse(status) => {
                Resolution::Failed(Failure::NoResponse { status })
            }
            Script::NotFound | Script::RateLimited => not_found(),
        })
    }

    async fn fetch_poster_url(
        &self,
        key: &QueryKey,
    ) -> Result<PosterLookup, TransportError> {
        self.poster_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match self.lookup(key).await? {
            Script::Movie {
                poster: Some(url), ..
            } => Resolution::Valid(PosterRef::new(key.clone(), url)),
            Script::Movie { poster: None, .. } => Resolution::Failed(Failure::NoPoster),
            Script::NoResponse(status) => {
                Resolution::Failed(Failure::NoResponse { status })
            }
            Script::NotFound | Script::RateLimited => not_found(),
        })
    }
}
