// src/models/run.rs

//! Run outcome records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final status of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("success"),
            RunStatus::Error => f.write_str("error"),
        }
    }
}

/// Lifecycle of the run orchestrator.
///
/// `Idle` until the first run; afterwards the outcome of the last run is kept
/// until the next one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Summary of one orchestration run. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,

    /// Sources attempted, including ones whose fetch failed
    pub sources_checked: usize,

    /// Candidates returned by successful sources
    pub postings_seen: usize,

    /// Postings persisted and successfully announced
    pub new_postings: usize,

    pub notifications_sent: usize,

    pub duration_ms: u64,

    pub status: RunStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RunSummary {
    /// Start an empty, successful summary.
    pub fn started(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            sources_checked: 0,
            postings_seen: 0,
            new_postings: 0,
            notifications_sent: 0,
            duration_ms: 0,
            status: RunStatus::Success,
            error_detail: None,
        }
    }

    /// Mark the run as failed with the triggering error's message.
    pub fn fail(&mut self, detail: impl Into<String>) {
        self.status = RunStatus::Error;
        self.error_detail = Some(detail.into());
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Aggregated statistics over run history.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunStats {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub total_new_postings: usize,
    pub avg_duration_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

impl RunStats {
    /// Compute statistics over a run history in any order.
    pub fn from_history(runs: &[RunSummary]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let total_duration: u64 = runs.iter().map(|r| r.duration_ms).sum();

        Self {
            total_runs: runs.len(),
            successful_runs: runs.iter().filter(|r| r.is_success()).count(),
            total_new_postings: runs.iter().map(|r| r.new_postings).sum(),
            avg_duration_ms: total_duration as f64 / runs.len() as f64,
            last_run: runs.iter().map(|r| r.started_at).max(),
        }
    }
}
