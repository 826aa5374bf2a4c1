// src/services/extractor.rs

//! Job link extraction.
//!
//! An anchor's text is the text node that immediately follows its opening
//! tag. Anchors whose first child is an element (`<a><span>..</span></a>`)
//! or that are empty contribute nothing, even if text appears deeper inside.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use url::Url;

use crate::utils::resolve_url;

/// A link whose visible text matched the search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLink {
    /// Absolute URL, resolved against the page URL
    pub url: String,

    /// Trimmed visible text
    pub title: String,
}

/// Extracts job links whose text contains a search term (case-insensitive).
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    needle: String,
}

impl LinkExtractor {
    /// Create an extractor for the given search term.
    pub fn new(search_term: &str) -> Self {
        Self {
            needle: search_term.to_lowercase(),
        }
    }

    /// Scan `html` once in document order and return matching links.
    ///
    /// Relative hrefs are resolved against `base`; hrefs that cannot be
    /// resolved are skipped. Repeated URLs keep only their first occurrence.
    pub fn extract(&self, html: &str, base: &Url) -> Vec<JobLink> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        let anchors = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "a");

        for anchor in anchors {
            let Some(href) = anchor.value().attr("href").filter(|h| !h.is_empty()) else {
                continue;
            };
            let Some(title) = leading_text(&anchor) else {
                continue;
            };
            if !title.to_lowercase().contains(&self.needle) {
                continue;
            }
            let Some(url) = resolve_url(base, href) else {
                log::debug!("Skipping unresolvable href '{}' on {}", href, base);
                continue;
            };

            if seen.insert(url.clone()) {
                links.push(JobLink { url, title });
            }
        }

        links
    }
}

/// Text of the node right after the anchor's opening tag, if it is text.
fn leading_text(anchor: &ElementRef<'_>) -> Option<String> {
    let first = anchor.first_child()?;
    let text = first.value().as_text()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
