//! Run progress reporting
//!
//! Progress advances once per finished competition, in completion order,
//! whatever the outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use super::scheduler::{CompetitionReport, TaskOutcome};

/// Receives progress notifications from the scheduler
pub trait ProgressReporter: Send + Sync {
    fn on_started(&self, total: usize);

    /// Called once per finished competition; `completed` counts from 1
    fn on_completed(&self, completed: usize, total: usize, report: &CompetitionReport);
}

/// Thread-safe completion counter
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
        }
    }

    /// Record one completion and return the new count
    pub fn advance(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Reports progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn on_started(&self, total: usize) {
        info!("🚀 Processing {} competitions", total);
    }

    fn on_completed(&self, completed: usize, total: usize, report: &CompetitionReport) {
        let status = match &report.outcome {
            TaskOutcome::Written { rows, .. } => format!("written ({rows} rows)"),
            TaskOutcome::Skipped(reason) => format!("skipped ({reason})"),
            TaskOutcome::Failed(error) => format!("failed ({error})"),
        };
        info!("[{}/{}] \"{}\": {}", completed, total, report.competition.name, status);
    }
}
