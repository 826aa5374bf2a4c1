// src/services/crawler.rs

//! Company source crawler.
//!
//! Fetches a source's career page and turns matching links into candidate
//! postings.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::models::{NewPosting, Source};
use crate::services::{LinkExtractor, PageFetcher};

/// Produces candidate postings for one source.
#[async_trait]
pub trait SourceCrawler: Send + Sync {
    /// Crawl a single source. Errors only when the page could not be
    /// retrieved; an unhelpful page yields an empty list.
    async fn crawl(&self, source: &Source) -> Result<Vec<NewPosting>>;
}

/// Crawler that reads the career page with a [`PageFetcher`].
pub struct CareerPageCrawler {
    fetcher: Arc<dyn PageFetcher>,
}

impl CareerPageCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SourceCrawler for CareerPageCrawler {
    async fn crawl(&self, source: &Source) -> Result<Vec<NewPosting>> {
        let base = Url::parse(&source.career_url)?;
        let html = self.fetcher.fetch(&source.career_url).await?;

        let postings = LinkExtractor::new(&source.search_term)
            .extract(&html, &base)
            .into_iter()
            .map(|link| NewPosting {
                company: source.name.clone(),
                title: link.title,
                url: link.url,
                location: None,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "{}: {} links matched '{}'",
            source.name,
            postings.len(),
            source.search_term
        );

        Ok(postings)
    }
}
