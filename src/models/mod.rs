// src/models/mod.rs

//! Domain models for the tracker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod posting;
mod run;
mod source;

// Re-export all public types
pub use config::{Config, CrawlerConfig, LoggingConfig, NotifyConfig, ScheduleConfig};
pub use posting::{NewPosting, Posting};
pub use run::{RunState, RunStats, RunStatus, RunSummary};
pub use source::Source;
