//! Pipeline entry points for tracker runs.
//!
//! - `Tracker`: one discovery-and-dedup run over every enabled source
//! - `Scheduler`: fires runs on a cron schedule
//! - `NoveltyResolver`: decides whether a candidate posting is new

pub mod dedup;
pub mod orchestrator;
pub mod scheduler;

#[cfg(test)]
mod fakes;

pub use dedup::{NoveltyResolver, Resolution};
pub use orchestrator::Tracker;
pub use scheduler::{Scheduler, SchedulerState};
