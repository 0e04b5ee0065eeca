//! Application layer
//!
//! Orchestrates a crawl run on top of the infrastructure adapters.

pub mod progress;
pub mod scheduler;

pub use progress::{LogProgressReporter, ProgressReporter, ProgressTracker};
pub use scheduler::{
    CompetitionReport, CrawlError, FetchPermits, RunSummary, Scheduler, TaskFailure, TaskOutcome,
};
