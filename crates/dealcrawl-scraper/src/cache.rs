//! File-backed cache of fetched page bodies.
//!
//! The file is a JSON object `{ url: { "html": ..., "timestamp": ... } }`
//! loaded on first use. A missing or corrupted file starts an empty cache and
//! malformed entries are treated as absent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    html: String,
    /// Unix seconds at which the body was stored.
    timestamp: i64,
}

#[derive(Debug)]
pub struct HttpCache {
    path: PathBuf,
    max_age_secs: u64,
    entries: Option<HashMap<String, Value>>,
}

impl HttpCache {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_age_secs: u64) -> Self {
        Self {
            path: path.into(),
            max_age_secs,
            entries: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached body for `url` when present and younger than the max age.
    pub fn get(&mut self, url: &str) -> Option<String> {
        let max_age = self.max_age_secs;
        let now = now_secs();
        let value = self.entries().get(url)?;
        let entry = parse_entry(value)?;
        (!is_expired(entry.timestamp, now, max_age)).then_some(entry.html)
    }

    /// Stores `html` for `url` and writes the cache file.
    pub fn set(&mut self, url: &str, html: &str) {
        let entry = CacheEntry {
            html: html.to_owned(),
            timestamp: now_secs(),
        };
        match serde_json::to_value(entry) {
            Ok(value) => {
                self.entries().insert(url.to_owned(), value);
                self.save();
            }
            Err(e) => tracing::warn!(url, error = %e, "failed to encode cache entry"),
        }
    }

    /// Drops `url` from the cache and writes the file if anything changed.
    pub fn remove(&mut self, url: &str) {
        if self.entries().remove(url).is_some() {
            self.save();
        }
    }

    /// Removes expired and malformed entries. Returns how many were dropped.
    pub fn clear_expired(&mut self) -> usize {
        let max_age = self.max_age_secs;
        let now = now_secs();
        let entries = self.entries();
        let before = entries.len();
        entries.retain(|_, value| {
            parse_entry(value).is_some_and(|entry| !is_expired(entry.timestamp, now, max_age))
        });
        before - entries.len()
    }

    /// Purges expired entries and writes the cache file. Write failures are
    /// logged and otherwise ignored.
    pub fn save(&mut self) {
        if self.entries.is_none() {
            return;
        }
        self.clear_expired();

        let Some(entries) = self.entries.as_ref() else {
            return;
        };
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|body| std::fs::write(&self.path, body));
        if let Err(e) = result {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to save HTTP cache"
            );
        }
    }

    fn entries(&mut self) -> &mut HashMap<String, Value> {
        let path = &self.path;
        self.entries.get_or_insert_with(|| load_entries(path))
    }
}

fn load_entries(path: &Path) -> HashMap<String, Value> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring corrupted HTTP cache");
            HashMap::new()
        }
    }
}

fn parse_entry(value: &Value) -> Option<CacheEntry> {
    serde_json::from_value(value.clone()).ok()
}

fn is_expired(timestamp: i64, now: i64, max_age_secs: u64) -> bool {
    let age = now.saturating_sub(timestamp);
    u64::try_from(age).is_ok_and(|age| age > max_age_secs)
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
