// src/models/source.rs

//! Career page source configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// A company career page watched for postings matching a search term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Store-assigned identifier (absent for built-in defaults)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Company name, copied onto every posting found here
    pub name: String,

    /// Career page URL
    pub career_url: String,

    /// Case-insensitive term the link text must contain
    pub search_term: String,

    /// Disabled sources are never crawled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Source {
    /// Create an enabled source without a store id.
    pub fn new(
        name: impl Into<String>,
        career_url: impl Into<String>,
        search_term: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            career_url: career_url.into(),
            search_term: search_term.into(),
            enabled: true,
        }
    }

    /// Check that the source can be crawled.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("source name is empty"));
        }
        Url::parse(&self.career_url).map_err(|e| {
            AppError::validation(format!(
                "source '{}' has an invalid career URL '{}': {e}",
                self.name, self.career_url
            ))
        })?;
        Ok(())
    }
}
