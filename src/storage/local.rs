//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Tracker configuration
//! ├── sources.json          # Watched career pages (admin managed)
//! ├── postings.json         # Every posting ever discovered
//! └── runs.json             # Append-only run history
//! ```
//!
//! Every write replaces the whole document atomically (temp file, then
//! rename). Read-modify-write cycles are serialized by one async mutex, so a
//! single `LocalStorage` (and its clones) never interleaves updates.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{NewPosting, Posting, RunSummary, Source};
use crate::storage::{
    PostingStore, RunHistory, SourceStore, enabled_sorted, insert_posting, insert_source,
    set_notified,
};

const POSTINGS: &str = "postings.json";
const SOURCES: &str = "sources.json";
const RUNS: &str = "runs.json";

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read a JSON list, treating a missing file as empty.
    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::storage(format!("{key} is corrupt: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    /// All configured sources, enabled or not, in insertion order.
    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        self.read_list(SOURCES).await
    }

    /// Register a new source and return it with its assigned id.
    pub async fn add_source(&self, source: Source) -> Result<Source> {
        let _guard = self.write_lock.lock().await;
        let mut sources: Vec<Source> = self.read_list(SOURCES).await?;
        let added = insert_source(&mut sources, source)?;
        self.write_json(SOURCES, &sources).await?;
        Ok(added)
    }

    /// Enable or disable a source.
    pub async fn set_source_enabled(&self, id: u64, enabled: bool) -> Result<Source> {
        let _guard = self.write_lock.lock().await;
        let mut sources: Vec<Source> = self.read_list(SOURCES).await?;
        let source = sources
            .iter_mut()
            .find(|s| s.id == Some(id))
            .ok_or_else(|| AppError::NotFound(format!("source {id}")))?;
        source.enabled = enabled;
        let updated = source.clone();
        self.write_json(SOURCES, &sources).await?;
        Ok(updated)
    }

    /// Delete a source.
    pub async fn remove_source(&self, id: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut sources: Vec<Source> = self.read_list(SOURCES).await?;
        let before = sources.len();
        sources.retain(|s| s.id != Some(id));
        if sources.len() == before {
            return Err(AppError::NotFound(format!("source {id}")));
        }
        self.write_json(SOURCES, &sources).await
    }

    /// Postings, newest first.
    pub async fn list_postings(&self, unnotified_only: bool) -> Result<Vec<Posting>> {
        let mut postings: Vec<Posting> = self.read_list(POSTINGS).await?;
        if unnotified_only {
            postings.retain(|p| !p.notified);
        }
        postings.sort_by(|a, b| b.discovered_at.cmp(&a.discovered_at));
        Ok(postings)
    }

    /// Run summaries, newest first, at most `limit`.
    pub async fn recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let mut runs: Vec<RunSummary> = self.read_list(RUNS).await?;
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);
        Ok(runs)
    }

    /// The complete run history.
    pub async fn all_runs(&self) -> Result<Vec<RunSummary>> {
        self.read_list(RUNS).await
    }
}

#[async_trait]
impl PostingStore for LocalStorage {
    async fn create(&self, posting: &NewPosting) -> Result<Posting> {
        let _guard = self.write_lock.lock().await;
        let mut postings: Vec<Posting> = self.read_list(POSTINGS).await?;
        let created = insert_posting(&mut postings, posting)?;
        self.write_json(POSTINGS, &postings).await?;
        Ok(created)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Posting>> {
        let postings: Vec<Posting> = self.read_list(POSTINGS).await?;
        Ok(postings.into_iter().find(|p| p.url == url))
    }

    async fn mark_notified(&self, id: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut postings: Vec<Posting> = self.read_list(POSTINGS).await?;
        set_notified(&mut postings, id)?;
        self.write_json(POSTINGS, &postings).await
    }
}

#[async_trait]
impl SourceStore for LocalStorage {
    async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        let sources: Vec<Source> = self.read_list(SOURCES).await?;
        Ok(enabled_sorted(&sources))
    }
}

#[async_trait]
impl RunHistory for LocalStorage {
    async fn append_run_summary(&self, summary: &RunSummary) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut runs: Vec<RunSummary> = self.read_list(RUNS).await?;
        runs.push(summary.clone());
        self.write_json(RUNS, &runs).await
    }
}
