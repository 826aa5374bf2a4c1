// src/error.rs

//! Unified error handling for the tracker.

use std::fmt;

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client failed outside of a page fetch
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A career page could not be retrieved
    #[error("Fetch failed for {url}: {message}")]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store read/write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A posting with this URL is already stored
    #[error("Posting already exists: {0}")]
    Duplicate(String),

    /// Record lookup by id failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notify(String),

    /// Scheduler could not be started or stopped
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Another run holds the run guard
    #[error("A run is already in progress")]
    Busy,
}

impl AppError {
    /// Create a fetch error for a non-success HTTP status.
    pub fn fetch_status(url: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            url: url.into(),
            status: Some(status),
            message: format!("unexpected status code {status}"),
        }
    }

    /// Create a fetch error for a transport failure.
    pub fn fetch_transport(url: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            status: None,
            message: cause.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Create a scheduler error.
    pub fn scheduler(message: impl fmt::Display) -> Self {
        Self::Scheduler(message.to_string())
    }

    /// HTTP status carried by a fetch failure, if any.
    pub fn fetch_status_code(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => *status,
            _ => None,
        }
    }
}
