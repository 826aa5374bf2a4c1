//! Storage abstractions for postings, sources and run history.
//!
//! The run pipeline only sees the capability traits below. Two backends
//! implement all of them:
//!
//! ```text
//! LocalStorage   {root}/postings.json, sources.json, runs.json
//! MemoryStorage  process memory (dry runs, tests)
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{NewPosting, Posting, RunSummary, Source};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Posting persistence keyed by canonical URL.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Persist a candidate, assigning `id` and `discovered_at`.
    ///
    /// Fails with [`AppError::Duplicate`] if the URL is already stored.
    async fn create(&self, posting: &NewPosting) -> Result<Posting>;

    /// Look up a posting by its canonical URL.
    async fn find_by_url(&self, url: &str) -> Result<Option<Posting>>;

    /// Flag a posting as announced. There is no way to clear the flag.
    async fn mark_notified(&self, id: u64) -> Result<()>;
}

/// Read access to configured sources.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Enabled sources, ordered by name.
    async fn list_enabled_sources(&self) -> Result<Vec<Source>>;
}

/// Append-only run history.
#[async_trait]
pub trait RunHistory: Send + Sync {
    async fn append_run_summary(&self, summary: &RunSummary) -> Result<()>;
}

/// Insert a candidate into a posting list, enforcing URL uniqueness.
fn insert_posting(postings: &mut Vec<Posting>, candidate: &NewPosting) -> Result<Posting> {
    if postings.iter().any(|p| p.url == candidate.url) {
        return Err(AppError::Duplicate(candidate.url.clone()));
    }

    let id = postings.iter().map(|p| p.id).max().unwrap_or(0) + 1;
    let posting = Posting::from_new(id, candidate, Utc::now());
    postings.push(posting.clone());
    Ok(posting)
}

/// Set the notified flag on the posting with `id`.
fn set_notified(postings: &mut [Posting], id: u64) -> Result<()> {
    let posting = postings
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| AppError::NotFound(format!("posting {id}")))?;
    posting.notified = true;
    Ok(())
}

/// Append a source, assigning the next id.
fn insert_source(sources: &mut Vec<Source>, mut source: Source) -> Result<Source> {
    source.validate()?;
    if sources.iter().any(|s| s.name == source.name) {
        return Err(AppError::validation(format!(
            "source '{}' already exists",
            source.name
        )));
    }

    let id = sources.iter().filter_map(|s| s.id).max().unwrap_or(0) + 1;
    source.id = Some(id);
    sources.push(source.clone());
    Ok(source)
}

/// Enabled sources sorted by name.
fn enabled_sorted(sources: &[Source]) -> Vec<Source> {
    let mut enabled: Vec<Source> = sources.iter().filter(|s| s.enabled).cloned().collect();
    enabled.sort_by(|a, b| a.name.cmp(&b.name));
    enabled
}
