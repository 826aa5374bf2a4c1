//! Posting data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate posting produced by a crawl, before the store has seen it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPosting {
    /// Company (source) name
    pub company: String,

    /// Visible link text
    pub title: String,

    /// Absolute link URL; the dedup key
    pub url: String,

    /// Location, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A posting persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Posting {
    /// Store-assigned identifier
    pub id: u64,

    pub company: String,

    pub title: String,

    /// Canonical URL; unique across the store
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Set by the store on first persistence
    pub discovered_at: DateTime<Utc>,

    /// Once true, never reset
    #[serde(default)]
    pub notified: bool,
}

impl Posting {
    /// Build the stored record for a candidate.
    pub fn from_new(id: u64, candidate: &NewPosting, discovered_at: DateTime<Utc>) -> Self {
        Self {
            id,
            company: candidate.company.clone(),
            title: candidate.title.clone(),
            url: candidate.url.clone(),
            location: candidate.location.clone(),
            discovered_at,
            notified: false,
        }
    }

    /// Format posting for display using a template.
    ///
    /// Supported placeholders:
    /// - `{id}`, `{company}`, `{title}`, `{url}`, `{location}`, `{discovered_at}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{id}", &self.id.to_string())
            .replace("{company}", &self.company)
            .replace("{title}", &self.title)
            .replace("{url}", &self.url)
            .replace("{location}", self.location.as_deref().unwrap_or(""))
            .replace(
                "{discovered_at}",
                &self.discovered_at.format("%Y-%m-%d %H:%M").to_string(),
            )
    }
}
