// src/pipeline/dedup.rs

//! Novelty resolution for candidate postings.
//!
//! A candidate is new when no stored posting has its URL. The first stored
//! values win: a known URL is never updated or re-announced, even when the
//! title changed on the page.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{NewPosting, Posting};
use crate::services::Notifier;
use crate::storage::PostingStore;

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The URL is already stored; nothing was written or sent.
    Known,
    /// Persisted and announced.
    Notified(Posting),
    /// Persisted, but the announcement failed. Stays unnotified.
    Unannounced(Posting),
}

/// Insert-if-absent keyed on canonical URL, followed by notification.
///
/// Not atomic against concurrent writers: callers must not resolve the same
/// URL from two tasks at once.
pub struct NoveltyResolver {
    postings: Arc<dyn PostingStore>,
    notifier: Arc<dyn Notifier>,
    recipient: String,
}

impl NoveltyResolver {
    pub fn new(
        postings: Arc<dyn PostingStore>,
        notifier: Arc<dyn Notifier>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            postings,
            notifier,
            recipient: recipient.into(),
        }
    }

    /// Resolve one candidate.
    ///
    /// Errors are store failures (lookup or insert); notification failures
    /// are reported as [`Resolution::Unannounced`].
    pub async fn resolve(&self, candidate: &NewPosting) -> Result<Resolution> {
        if self.postings.find_by_url(&candidate.url).await?.is_some() {
            return Ok(Resolution::Known);
        }

        let posting = match self.postings.create(candidate).await {
            Ok(posting) => posting,
            Err(AppError::Duplicate(_)) => return Ok(Resolution::Known),
            Err(e) => return Err(e),
        };
        log::info!("   NEW: {}", posting.title);

        if let Err(e) = self.notifier.notify_posting(&self.recipient, &posting).await {
            log::warn!("   Error sending notification for {}: {}", posting.url, e);
            return Ok(Resolution::Unannounced(posting));
        }

        match self.postings.mark_notified(posting.id).await {
            Ok(()) => Ok(Resolution::Notified(Posting {
                notified: true,
                ..posting
            })),
            Err(e) => {
                log::warn!("   Error marking posting {} notified: {}", posting.id, e);
                Ok(Resolution::Notified(posting))
            }
        }
    }
}
