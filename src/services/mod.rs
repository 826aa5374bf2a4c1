//! Service layer for the tracker.
//!
//! This module contains the collaborators a run drives:
//! - Link extraction (`LinkExtractor`)
//! - Page retrieval (`PageFetcher`, `HttpFetcher`)
//! - Per-source crawling (`SourceCrawler`, `CareerPageCrawler`)
//! - Notification delivery (`Notifier`, `WebhookNotifier`, `LogNotifier`)

mod crawler;
mod extractor;
mod fetcher;
mod notifier;

pub use crawler::{CareerPageCrawler, SourceCrawler};
pub use extractor::{JobLink, LinkExtractor};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{
    LogNotifier, Notifier, WebhookNotifier, format_no_news_message, format_posting_message,
};
