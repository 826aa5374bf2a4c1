//! Deterministic collaborators for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{NewPosting, Posting, RunSummary, Source};
use crate::services::{Notifier, SourceCrawler};
use crate::storage::{MemoryStorage, PostingStore, RunHistory, SourceStore};

pub fn candidate(company: &str, title: &str, url: &str) -> NewPosting {
    NewPosting {
        company: company.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        location: None,
    }
}

/// Crawler returning canned results per source name.
#[derive(Default)]
pub struct StubCrawler {
    pages: HashMap<String, std::result::Result<Vec<NewPosting>, u16>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl StubCrawler {
    pub fn page(mut self, source: &str, postings: Vec<NewPosting>) -> Self {
        self.pages.insert(source.to_string(), Ok(postings));
        self
    }

    pub fn status(mut self, source: &str, status: u16) -> Self {
        self.pages.insert(source.to_string(), Err(status));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceCrawler for StubCrawler {
    async fn crawl(&self, source: &Source) -> Result<Vec<NewPosting>> {
        self.calls.lock().unwrap().push(source.name.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.pages.get(&source.name) {
            Some(Ok(postings)) => Ok(postings.clone()),
            Some(Err(status)) => Err(AppError::fetch_status(&source.career_url, *status)),
            None => Ok(Vec::new()),
        }
    }
}

/// Notifier that records everything it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records attempts but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        if self.fail {
            return Err(AppError::notify("transport offline"));
        }
        Ok(())
    }
}

/// Posting store that fails `create` for chosen URLs.
pub struct FlakyPostings {
    inner: MemoryStorage,
    fail_urls: Vec<String>,
}

impl FlakyPostings {
    pub fn failing_create(url: &str) -> Self {
        Self {
            inner: MemoryStorage::new(),
            fail_urls: vec![url.to_string()],
        }
    }

    pub async fn postings(&self) -> Vec<Posting> {
        self.inner.postings().await
    }
}

#[async_trait]
impl PostingStore for FlakyPostings {
    async fn create(&self, posting: &NewPosting) -> Result<Posting> {
        if self.fail_urls.contains(&posting.url) {
            return Err(AppError::storage("disk full"));
        }
        self.inner.create(posting).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Posting>> {
        self.inner.find_by_url(url).await
    }

    async fn mark_notified(&self, id: u64) -> Result<()> {
        self.inner.mark_notified(id).await
    }
}

/// Source store that cannot enumerate anything.
pub struct BrokenSources;

#[async_trait]
impl SourceStore for BrokenSources {
    async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        Err(AppError::storage("sources table unavailable"))
    }
}

/// Run history that rejects every write.
pub struct BrokenHistory;

#[async_trait]
impl RunHistory for BrokenHistory {
    async fn append_run_summary(&self, _summary: &RunSummary) -> Result<()> {
        Err(AppError::storage("runs table unavailable"))
    }
}
