// src/pipeline/scheduler.rs

//! Time-based triggering of tracker runs.
//!
//! Schedules use six-field cron syntax with seconds first, e.g.
//! `0 0 9 * * *` for 09:00 every day. A tick that lands while a run is in
//! progress is skipped.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::{AppError, Result};
use crate::models::RunSummary;
use crate::pipeline::orchestrator::Tracker;

/// Whether the scheduler is currently firing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct ActiveSchedule {
    jobs: JobScheduler,
    schedule: String,
}

/// Fires [`Tracker::run_now`] on a cron schedule.
pub struct Scheduler {
    tracker: Arc<Tracker>,
    active: Mutex<Option<ActiveSchedule>>,
}

impl Scheduler {
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self {
            tracker,
            active: Mutex::new(None),
        }
    }

    /// Begin firing runs on `schedule`.
    ///
    /// Fails if the schedule does not parse or the scheduler is already
    /// running; in both cases the current state is left unchanged.
    pub async fn start(&self, schedule: &str) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            return Err(AppError::scheduler(format!(
                "already running on '{}'",
                current.schedule
            )));
        }

        let tracker = Arc::clone(&self.tracker);
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let tracker = Arc::clone(&tracker);
            Box::pin(async move { scheduled_tick(&tracker).await })
        })
        .map_err(|e| AppError::scheduler(format!("invalid schedule '{}': {}", schedule, e)))?;

        let jobs = JobScheduler::new().await.map_err(AppError::scheduler)?;
        jobs.add(job).await.map_err(AppError::scheduler)?;
        jobs.start().await.map_err(AppError::scheduler)?;

        log::info!("Scheduler started: {}", schedule);
        *active = Some(ActiveSchedule {
            jobs,
            schedule: schedule.to_string(),
        });
        Ok(())
    }

    /// Stop firing runs. A run already in flight finishes on its own.
    pub async fn stop(&self) -> Result<()> {
        let Some(mut current) = self.active.lock().await.take() else {
            return Ok(());
        };

        current.jobs.shutdown().await.map_err(AppError::scheduler)?;
        log::info!("Scheduler stopped");
        Ok(())
    }

    pub async fn state(&self) -> SchedulerState {
        if self.active.lock().await.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// The active cron expression, if running.
    pub async fn schedule(&self) -> Option<String> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|current| current.schedule.clone())
    }

    /// Manual trigger, subject to the same one-run-at-a-time rule.
    pub async fn run_now(&self) -> Result<RunSummary> {
        self.tracker.run_now().await
    }
}

async fn scheduled_tick(tracker: &Tracker) {
    match tracker.run_now().await {
        Ok(summary) => log::info!(
            "Scheduled run finished: {} new of {} seen",
            summary.new_postings,
            summary.postings_seen
        ),
        Err(AppError::Busy) => log::warn!("Scheduled run skipped: a run is already in progress"),
        Err(e) => log::error!("Scheduled run failed: {}", e),
    }
}
