// src/pipeline/orchestrator.rs

//! Run orchestration.
//!
//! One run walks every enabled source in order, resolves each candidate
//! posting, and records a [`RunSummary`]:
//!
//! ```text
//! Idle ─► Running ─┬─► Completed   (status = success)
//!                  └─► Failed      (sources could not be listed)
//! ```
//!
//! A failing source or posting is logged and skipped; only a failure to
//! enumerate sources fails the run. At most one run executes at a time;
//! a second request while one is in flight is rejected with
//! [`AppError::Busy`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{RunState, RunSummary, Source};
use crate::pipeline::dedup::{NoveltyResolver, Resolution};
use crate::services::{Notifier, SourceCrawler, format_no_news_message};
use crate::storage::{PostingStore, RunHistory, SourceStore};
use crate::utils::report;

/// The discovery-and-dedup pipeline.
pub struct Tracker {
    crawler: Arc<dyn SourceCrawler>,
    notifier: Arc<dyn Notifier>,
    postings: Arc<dyn PostingStore>,
    sources: Arc<dyn SourceStore>,
    history: Arc<dyn RunHistory>,
    recipient: String,
    default_sources: Vec<Source>,
    state: Mutex<RunState>,
}

impl Tracker {
    /// Create a tracker whose store provides postings, sources and history.
    pub fn new<S>(crawler: Arc<dyn SourceCrawler>, notifier: Arc<dyn Notifier>, store: Arc<S>) -> Self
    where
        S: PostingStore + SourceStore + RunHistory + 'static,
    {
        Self::from_parts(crawler, notifier, store.clone(), store.clone(), store)
    }

    /// Create a tracker from individual store capabilities.
    pub fn from_parts(
        crawler: Arc<dyn SourceCrawler>,
        notifier: Arc<dyn Notifier>,
        postings: Arc<dyn PostingStore>,
        sources: Arc<dyn SourceStore>,
        history: Arc<dyn RunHistory>,
    ) -> Self {
        Self {
            crawler,
            notifier,
            postings,
            sources,
            history,
            recipient: String::new(),
            default_sources: Vec::new(),
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Set who receives notifications.
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    /// Sources crawled when the store has none enabled.
    pub fn with_default_sources(mut self, sources: Vec<Source>) -> Self {
        self.default_sources = sources;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        // the state is a plain enum, a poisoned lock still holds a valid value
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim the run slot, or fail with `Busy` if a run holds it.
    fn begin_run(&self) -> Result<RunSlot<'_>> {
        let mut state = self.lock_state();
        if *state == RunState::Running {
            return Err(AppError::Busy);
        }
        *state = RunState::Running;
        Ok(RunSlot {
            tracker: self,
            finished: RunState::Failed,
        })
    }

    /// Execute one full run now.
    ///
    /// Returns the recorded summary, `Err(AppError::Busy)` if a run is
    /// already in progress, or the error that failed the run (its summary is
    /// still recorded).
    pub async fn run_now(&self) -> Result<RunSummary> {
        let mut slot = self.begin_run()?;

        let clock = Instant::now();
        let mut summary = RunSummary::started(Utc::now());

        report::header("Starting job check");
        log::info!("Time: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));

        let outcome = self.check_sources(&mut summary).await;

        summary.duration_ms = clock.elapsed().as_millis() as u64;
        if let Err(e) = &outcome {
            log::error!("Error getting sources: {}", e);
            summary.fail(e.to_string());
        }
        self.record(&summary).await;

        if outcome.is_ok() {
            slot.finished = RunState::Completed;
        }
        outcome.map(|()| summary)
    }

    /// Resolve the source list, falling back to the defaults when empty.
    async fn sources_to_check(&self) -> Result<Vec<Source>> {
        let sources = self.sources.list_enabled_sources().await?;
        if !sources.is_empty() {
            return Ok(sources);
        }

        log::warn!(
            "No sources configured, using {} defaults",
            self.default_sources.len()
        );
        Ok(self
            .default_sources
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect())
    }

    async fn check_sources(&self, summary: &mut RunSummary) -> Result<()> {
        let sources = self.sources_to_check().await?;
        summary.sources_checked = sources.len();

        log::info!("Sources to check: {}", sources.len());
        report::separator();

        let resolver = NoveltyResolver::new(
            Arc::clone(&self.postings),
            Arc::clone(&self.notifier),
            self.recipient.clone(),
        );

        for source in &sources {
            log::info!("Checking: {}", source.name);

            let candidates = match self.crawler.crawl(source).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    log::warn!("   Error scraping {}: {}", source.name, e);
                    continue;
                }
            };

            log::info!("   Found {} job listings", candidates.len());
            summary.postings_seen += candidates.len();

            for candidate in &candidates {
                match resolver.resolve(candidate).await {
                    Ok(Resolution::Notified(_)) => {
                        summary.new_postings += 1;
                        summary.notifications_sent += 1;
                    }
                    Ok(Resolution::Known) | Ok(Resolution::Unannounced(_)) => {}
                    Err(e) => log::warn!("   Error saving {}: {}", candidate.url, e),
                }
            }
        }

        report::separator();
        report::summary(
            "Run",
            &[
                ("Sources checked", summary.sources_checked.to_string()),
                ("Total jobs found", summary.postings_seen.to_string()),
                ("New positions", summary.new_postings.to_string()),
                ("Notifications sent", summary.notifications_sent.to_string()),
            ],
        );

        if summary.new_postings == 0 {
            let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
            let message =
                format_no_news_message(summary.sources_checked, summary.postings_seen, &names);
            if let Err(e) = self.notifier.send(&self.recipient, &message).await {
                log::warn!("   Error sending summary: {}", e);
            }
        }

        Ok(())
    }

    /// Persist the summary. Failures are logged, never returned.
    async fn record(&self, summary: &RunSummary) {
        if let Err(e) = self.history.append_run_summary(summary).await {
            log::error!("Error saving run summary: {}", e);
        }
        log::info!("Duration: {}ms", summary.duration_ms);
    }
}

/// Holds the run slot; releases it on drop, even if the run was cancelled.
struct RunSlot<'a> {
    tracker: &'a Tracker,
    finished: RunState,
}

impl Drop for RunSlot<'_> {
    fn drop(&mut self) {
        *self.tracker.lock_state() = self.finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::models::RunStatus;
    use crate::pipeline::fakes::{
        BrokenHistory, BrokenSources, FlakyPostings, RecordingNotifier, StubCrawler, candidate,
    };
    use crate::storage::MemoryStorage;

    fn acme() -> Source {
        Source::new("Acme", "https://acme.example/careers", "intern")
    }

    fn acme_page() -> Vec<crate::models::NewPosting> {
        vec![
            candidate("Acme", "Software Intern", "https://acme.example/jobs/1"),
            candidate("Acme", "Data Intern", "https://acme.example/jobs/2"),
        ]
    }

    async fn store_with(sources: Vec<Source>) -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::with_sources(sources).await.unwrap())
    }

    #[tokio::test]
    async fn test_first_run_announces_and_second_run_reports_no_news() {
        let store = store_with(vec![acme()]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker = Tracker::new(crawler, notifier.clone(), store.clone());

        let first = tracker.run_now().await.unwrap();
        assert_eq!(first.sources_checked, 1);
        assert_eq!(first.postings_seen, 2);
        assert_eq!(first.new_postings, 2);
        assert_eq!(first.notifications_sent, 2);
        assert_eq!(first.status, RunStatus::Success);
        assert_eq!(notifier.messages().len(), 2);

        let second = tracker.run_now().await.unwrap();
        assert_eq!(second.postings_seen, 2);
        assert_eq!(second.new_postings, 0);
        assert_eq!(second.notifications_sent, 0);

        let messages = notifier.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[2].contains("No new positions found"));
        assert!(messages[2].contains("Checked 1 sources"));
        assert!(messages[2].contains("Found 2 job listings"));

        assert_eq!(store.postings().await.len(), 2);
        assert_eq!(store.runs().await.len(), 2);
        assert_eq!(tracker.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_source_failure_is_contained() {
        let store = store_with(vec![
            Source::new("Alpha", "https://alpha.example", "intern"),
            Source::new("Beta", "https://beta.example", "intern"),
        ])
        .await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().status("Alpha", 503).page(
            "Beta",
            vec![candidate("Beta", "Intern", "https://beta.example/1")],
        ));
        let tracker = Tracker::new(crawler.clone(), notifier, store.clone());

        let summary = tracker.run_now().await.unwrap();

        assert_eq!(crawler.calls(), vec!["Alpha", "Beta"]);
        assert_eq!(summary.sources_checked, 2);
        assert_eq!(summary.postings_seen, 1);
        assert_eq!(summary.new_postings, 1);
        assert_eq!(summary.status, RunStatus::Success);
    }

    #[tokio::test]
    async fn test_only_source_returning_500_still_succeeds() {
        let store = store_with(vec![acme()]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().status("Acme", 500));
        let tracker = Tracker::new(crawler, notifier.clone(), store.clone());

        let summary = tracker.run_now().await.unwrap();

        assert_eq!(summary.sources_checked, 1);
        assert_eq!(summary.postings_seen, 0);
        assert_eq!(summary.new_postings, 0);
        assert_eq!(summary.status, RunStatus::Success);
        assert_eq!(store.runs().await, vec![summary]);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_default_sources() {
        let store = store_with(Vec::new()).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let mut disabled = Source::new("Dormant", "https://dormant.example", "intern");
        disabled.enabled = false;
        let tracker = Tracker::new(crawler.clone(), notifier, store)
            .with_default_sources(vec![acme(), disabled]);

        let summary = tracker.run_now().await.unwrap();

        assert_eq!(crawler.calls(), vec!["Acme"]);
        assert_eq!(summary.sources_checked, 1);
        assert_eq!(summary.new_postings, 2);
    }

    #[tokio::test]
    async fn test_source_listing_failure_fails_run() {
        let store = Arc::new(MemoryStorage::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default());
        let tracker = Tracker::from_parts(
            crawler.clone(),
            notifier.clone(),
            store.clone(),
            Arc::new(BrokenSources),
            store.clone(),
        );

        let err = tracker.run_now().await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(crawler.calls().is_empty());
        assert!(notifier.messages().is_empty());
        let runs = store.runs().await;
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Error);
        assert!(runs[0].error_detail.as_deref().unwrap().contains("sources table unavailable"));
        assert_eq!(tracker.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn test_posting_failure_skips_only_that_posting() {
        let postings = Arc::new(FlakyPostings::failing_create("https://acme.example/jobs/1"));
        let store = store_with(vec![acme()]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker = Tracker::from_parts(
            crawler,
            notifier.clone(),
            postings.clone(),
            store.clone(),
            store.clone(),
        );

        let summary = tracker.run_now().await.unwrap();

        assert_eq!(summary.postings_seen, 2);
        assert_eq!(summary.new_postings, 1);
        let stored = postings.postings().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].url, "https://acme.example/jobs/2");
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_posting_and_is_not_counted() {
        let store = store_with(vec![acme()]).await;
        let notifier = Arc::new(RecordingNotifier::failing());
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker = Tracker::new(crawler, notifier.clone(), store.clone());

        let summary = tracker.run_now().await.unwrap();

        assert_eq!(summary.status, RunStatus::Success);
        assert_eq!(summary.new_postings, 0);
        assert_eq!(summary.notifications_sent, 0);
        let stored = store.postings().await;
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|p| !p.notified));
        // two posting attempts plus the no-news summary attempt
        assert_eq!(notifier.messages().len(), 3);

        let again = tracker.run_now().await.unwrap();
        assert_eq!(again.new_postings, 0);
        assert_eq!(store.postings().await.len(), 2);
    }

    #[tokio::test]
    async fn test_notified_flag_never_reverts() {
        let store = store_with(vec![acme()]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker = Tracker::new(crawler, notifier, store.clone());

        tracker.run_now().await.unwrap();
        assert!(store.postings().await.iter().all(|p| p.notified));

        tracker.run_now().await.unwrap();
        tracker.run_now().await.unwrap();
        assert!(store.postings().await.iter().all(|p| p.notified));
    }

    #[tokio::test]
    async fn test_same_url_from_two_sources_is_stored_once() {
        let store = store_with(vec![
            Source::new("Alpha", "https://alpha.example", "intern"),
            Source::new("Beta", "https://beta.example", "intern"),
        ])
        .await;
        let shared = "https://jobs.example/shared";
        let crawler = Arc::new(
            StubCrawler::default()
                .page("Alpha", vec![candidate("Alpha", "Intern", shared)])
                .page("Beta", vec![candidate("Beta", "Intern", shared)]),
        );
        let tracker = Tracker::new(crawler, Arc::new(RecordingNotifier::default()), store.clone());

        let summary = tracker.run_now().await.unwrap();

        assert_eq!(summary.postings_seen, 2);
        assert_eq!(summary.new_postings, 1);
        let stored = store.postings().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].company, "Alpha");
    }

    #[tokio::test]
    async fn test_history_failure_does_not_mask_outcome() {
        let store = store_with(vec![acme()]).await;
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker = Tracker::from_parts(
            crawler,
            Arc::new(RecordingNotifier::default()),
            store.clone(),
            store.clone(),
            Arc::new(BrokenHistory),
        );

        let summary = tracker.run_now().await.unwrap();
        assert_eq!(summary.new_postings, 2);
        assert_eq!(tracker.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_concurrent_run_is_rejected_as_busy() {
        let store = store_with(vec![acme()]).await;
        let crawler = Arc::new(
            StubCrawler::default()
                .page("Acme", acme_page())
                .delayed(Duration::from_millis(200)),
        );
        let tracker = Arc::new(Tracker::new(
            crawler,
            Arc::new(RecordingNotifier::default()),
            store.clone(),
        ));

        assert_eq!(tracker.state(), RunState::Idle);

        let background = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move { tracker.run_now().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(tracker.state(), RunState::Running);
        assert!(matches!(tracker.run_now().await, Err(AppError::Busy)));

        let summary = background.await.unwrap().unwrap();
        assert_eq!(summary.new_postings, 2);
        assert_eq!(store.runs().await.len(), 1);
        assert_eq!(tracker.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_cancelled_run_releases_the_slot() {
        let store = store_with(vec![acme()]).await;
        let crawler = Arc::new(
            StubCrawler::default()
                .page("Acme", acme_page())
                .delayed(Duration::from_millis(500)),
        );
        let tracker = Tracker::new(crawler, Arc::new(RecordingNotifier::default()), store.clone());

        let cancelled = tokio::time::timeout(Duration::from_millis(50), tracker.run_now()).await;
        assert!(cancelled.is_err());
        assert_eq!(tracker.state(), RunState::Failed);

        let summary = tracker.run_now().await.unwrap();
        assert_eq!(summary.new_postings, 2);
        assert_eq!(tracker.state(), RunState::Completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_state_reads_never_make_runs_busy() {
        let store = store_with(vec![acme()]).await;
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker = Arc::new(Tracker::new(
            crawler,
            Arc::new(RecordingNotifier::default()),
            store,
        ));

        let reader = {
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                for _ in 0..5_000 {
                    let _ = tracker.state();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..200 {
            assert!(tracker.run_now().await.is_ok());
        }
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_recipient_is_used_for_every_message() {
        let store = store_with(vec![acme()]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let crawler = Arc::new(StubCrawler::default().page("Acme", acme_page()));
        let tracker =
            Tracker::new(crawler, notifier.clone(), store).with_recipient("#intern-alerts");

        tracker.run_now().await.unwrap();
        tracker.run_now().await.unwrap();

        assert!(notifier.recipients().iter().all(|r| r == "#intern-alerts"));
    }
}
