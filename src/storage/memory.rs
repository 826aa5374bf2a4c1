// src/storage/memory.rs

//! In-memory storage backend.
//!
//! Nothing survives the process. Used for dry runs and as the deterministic
//! store in tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{NewPosting, Posting, RunSummary, Source};
use crate::storage::{
    PostingStore, RunHistory, SourceStore, enabled_sorted, insert_posting, insert_source,
    set_notified,
};

#[derive(Debug, Default)]
struct MemoryState {
    postings: Vec<Posting>,
    sources: Vec<Source>,
    runs: Vec<RunSummary>,
}

/// Store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with sources; each gets an id.
    pub async fn with_sources(sources: Vec<Source>) -> Result<Self> {
        let storage = Self::new();
        for source in sources {
            storage.add_source(source).await?;
        }
        Ok(storage)
    }

    pub async fn add_source(&self, source: Source) -> Result<Source> {
        let mut state = self.state.lock().await;
        insert_source(&mut state.sources, source)
    }

    /// Load postings already known elsewhere, keeping their ids and flags.
    pub async fn import_postings(&self, postings: Vec<Posting>) {
        self.state.lock().await.postings.extend(postings);
    }

    /// Snapshot of every stored posting, in insertion order.
    pub async fn postings(&self) -> Vec<Posting> {
        self.state.lock().await.postings.clone()
    }

    /// Snapshot of the run history, oldest first.
    pub async fn runs(&self) -> Vec<RunSummary> {
        self.state.lock().await.runs.clone()
    }
}

#[async_trait]
impl PostingStore for MemoryStorage {
    async fn create(&self, posting: &NewPosting) -> Result<Posting> {
        let mut state = self.state.lock().await;
        insert_posting(&mut state.postings, posting)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Posting>> {
        let state = self.state.lock().await;
        Ok(state.postings.iter().find(|p| p.url == url).cloned())
    }

    async fn mark_notified(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        set_notified(&mut state.postings, id)
    }
}

#[async_trait]
impl SourceStore for MemoryStorage {
    async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        let state = self.state.lock().await;
        Ok(enabled_sorted(&state.sources))
    }
}

#[async_trait]
impl RunHistory for MemoryStorage {
    async fn append_run_summary(&self, summary: &RunSummary) -> Result<()> {
        self.state.lock().await.runs.push(summary.clone());
        Ok(())
    }
}
