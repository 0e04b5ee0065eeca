//! Crawl scheduler
//!
//! One run fetches the landing page, discovers competitions and then processes
//! every competition as its own task:
//!
//! ```text
//! Queued -> Fetching -> Extracting -> Written | Skipped | Failed
//! ```
//!
//! Fetches are gated by [`FetchPermits`]; a permit is held only while the page
//! is downloaded, so parsing and writing never block other fetches. Outcomes
//! are collected in completion order. A failing competition is recorded and
//! never aborts its siblings.

use chrono::{DateTime, Local};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::progress::{LogProgressReporter, ProgressReporter, ProgressTracker};
use crate::domain::{CompetitionRef, SkipReason};
use crate::infrastructure::config::{AppConfig, ColumnLayout, CrawlerConfig};
use crate::infrastructure::csv_sink::{CompetitionSink, CsvSink, SinkError, create_session_folder};
use crate::infrastructure::parsing::{
    CategoryResolver, CompetitionOutcome, CompetitionParser, ExtractionError, PageParser, RejectedAnchor,
};
use crate::infrastructure::simple_http_client::{FetchError, PageFetcher};

/// Errors that end a run before any competition is processed
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to fetch landing page: {0}")]
    LandingPage(#[source] FetchError),

    #[error("Run cancelled before discovery finished")]
    Cancelled,

    #[error("Invalid crawler configuration: {0}")]
    Configuration(#[source] ExtractionError),

    #[error("Failed to prepare output folder: {0}")]
    Output(#[source] SinkError),
}

/// Why a single competition produced no file
#[derive(Error, Debug)]
pub enum TaskFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("cancelled before the page was fetched")]
    Cancelled,

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Terminal state of one competition task
#[derive(Debug)]
pub enum TaskOutcome {
    Written { path: PathBuf, rows: usize },
    Skipped(SkipReason),
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug)]
pub struct CompetitionReport {
    pub competition: CompetitionRef,
    pub outcome: TaskOutcome,
}

/// Scoreboard of a finished run
#[derive(Debug)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    /// `None` when discovery found nothing and no folder was created
    pub session_dir: Option<PathBuf>,
    pub rejected_anchors: Vec<RejectedAnchor>,
    /// One report per discovered competition, in completion order
    pub reports: Vec<CompetitionReport>,
}

impl RunSummary {
    pub fn written_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_written()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Report for the competition named `name`, if it was processed
    pub fn report_for(&self, name: &str) -> Option<&CompetitionReport> {
        self.reports.iter().find(|r| r.competition.name == name)
    }

    pub fn log_scoreboard(&self) {
        info!(
            "🏁 Run finished: {} written, {} skipped, {} failed, {} anchors rejected",
            self.written_count(),
            self.skipped_count(),
            self.failed_count(),
            self.rejected_anchors.len()
        );
        for report in self.reports.iter().filter(|r| r.outcome.is_failed()) {
            if let TaskOutcome::Failed(failure) = &report.outcome {
                warn!("⚠️ {}: {}", report.competition, failure);
            }
        }
    }
}

/// Shared cap on simultaneous competition fetches
#[derive(Debug, Clone)]
pub struct FetchPermits {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl FetchPermits {
    /// A capacity of zero is raised to one so the run can make progress
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Everything a competition task needs, cloned into each task
#[derive(Clone)]
struct TaskContext {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<CompetitionParser>,
    sink: Arc<dyn CompetitionSink>,
    permits: FetchPermits,
    cancellation: CancellationToken,
}

impl TaskContext {
    async fn process(self, competition: CompetitionRef) -> CompetitionReport {
        let outcome = match AssertUnwindSafe(self.execute(&competition)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => TaskOutcome::Failed(TaskFailure::Panicked(panic_message(panic.as_ref()))),
        };

        match &outcome {
            TaskOutcome::Written { path, rows } => info!("✅ {} -> {:?} ({} rows)", competition, path, rows),
            TaskOutcome::Skipped(reason) => info!("⏭️ {} skipped: {}", competition, reason),
            TaskOutcome::Failed(failure) => error!("❌ {} failed: {}", competition, failure),
        }

        CompetitionReport { competition, outcome }
    }

    async fn execute(&self, competition: &CompetitionRef) -> TaskOutcome {
        let body = match self.fetch(competition).await {
            Ok(body) => body,
            Err(failure) => return TaskOutcome::Failed(failure),
        };

        debug!("Extracting {}", competition);
        match self.parser.parse_bytes(&body) {
            CompetitionOutcome::Eligible(records) => match self.sink.write(&competition.name, &records) {
                Ok(path) => TaskOutcome::Written {
                    path,
                    rows: records.len(),
                },
                Err(e) => TaskOutcome::Failed(e.into()),
            },
            CompetitionOutcome::Skipped(reason) => TaskOutcome::Skipped(reason),
            CompetitionOutcome::Failed(e) => TaskOutcome::Failed(e.into()),
        }
    }

    /// Download the page while holding a fetch permit
    async fn fetch(&self, competition: &CompetitionRef) -> Result<Vec<u8>, TaskFailure> {
        let _permit = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => return Err(TaskFailure::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| TaskFailure::Cancelled)?,
        };

        debug!("Fetch permit acquired, {} left", self.permits.available());
        info!("Processing list {}", competition);
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                warn!("🛑 Fetch cancelled for {}", competition.link);
                Err(TaskFailure::Cancelled)
            }
            result = self.fetcher.fetch(&competition.link) => result.map_err(TaskFailure::from),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Cancels a token after a delay unless dropped first
struct RunDeadline(Option<JoinHandle<()>>);

impl RunDeadline {
    fn arm(timeout: Option<Duration>, token: CancellationToken) -> Self {
        Self(timeout.map(|timeout| {
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!("⏰ Run timeout of {:?} elapsed, cancelling outstanding fetches", timeout);
                token.cancel();
            })
        }))
    }
}

impl Drop for RunDeadline {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.abort();
        }
    }
}

/// Drives a complete crawl
pub struct Scheduler {
    config: CrawlerConfig,
    columns: ColumnLayout,
    fetcher: Arc<dyn PageFetcher>,
    reporter: Arc<dyn ProgressReporter>,
    cancellation: CancellationToken,
}

impl Scheduler {
    pub fn new(config: &AppConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config: config.crawler.clone(),
            columns: config.columns,
            fetcher,
            reporter: Arc::new(LogProgressReporter),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Token that cancels every outstanding fetch of the current and later runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run a full crawl: discovery, session folder, then every competition
    pub async fn run(&self) -> Result<RunSummary, CrawlError> {
        let started_at = Local::now();
        let run_token = self.cancellation.child_token();
        let _deadline = RunDeadline::arm(self.run_timeout(), run_token.clone());

        let resolver = CategoryResolver::new(&self.config).map_err(CrawlError::Configuration)?;

        info!("🌐 Fetching landing page {}", self.config.landing_url);
        let landing = tokio::select! {
            biased;
            _ = run_token.cancelled() => return Err(CrawlError::Cancelled),
            result = self.fetcher.fetch(&self.config.landing_url) => result.map_err(CrawlError::LandingPage)?,
        };

        let discovery = resolver.parse_page(&String::from_utf8_lossy(&landing));
        for rejected in &discovery.rejected {
            debug!("Rejected anchor {}: {}", rejected.href, rejected.reason);
        }

        if discovery.competitions.is_empty() {
            info!("No competitions discovered, nothing to write");
            return Ok(RunSummary {
                started_at,
                session_dir: None,
                rejected_anchors: discovery.rejected,
                reports: Vec::new(),
            });
        }

        let session_dir =
            create_session_folder(&self.config.output_root, started_at).map_err(CrawlError::Output)?;
        let sink: Arc<dyn CompetitionSink> = Arc::new(CsvSink::new(&session_dir));

        let reports = self
            .process_competitions(discovery.competitions, sink, run_token)
            .await?;

        Ok(RunSummary {
            started_at,
            session_dir: Some(session_dir),
            rejected_anchors: discovery.rejected,
            reports,
        })
    }

    async fn process_competitions(
        &self,
        competitions: Vec<CompetitionRef>,
        sink: Arc<dyn CompetitionSink>,
        cancellation: CancellationToken,
    ) -> Result<Vec<CompetitionReport>, CrawlError> {
        let parser = CompetitionParser::new(self.columns).map_err(CrawlError::Configuration)?;
        let permits = FetchPermits::new(self.config.max_concurrent_fetches);
        let progress = ProgressTracker::new(competitions.len());

        let context = TaskContext {
            fetcher: Arc::clone(&self.fetcher),
            parser: Arc::new(parser),
            sink,
            permits,
            cancellation,
        };

        self.reporter.on_started(progress.total());
        debug!(
            "Spawning {} competition tasks, at most {} fetches in flight",
            progress.total(),
            context.permits.capacity()
        );

        let mut tasks = JoinSet::new();
        for competition in competitions {
            tasks.spawn(context.clone().process(competition));
        }

        let mut reports = Vec::with_capacity(progress.total());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    let completed = progress.advance();
                    self.reporter.on_completed(completed, progress.total(), &report);
                    reports.push(report);
                }
                // Panics are caught inside the task, so only an aborted runtime lands here
                Err(e) => {
                    progress.advance();
                    error!("Competition task ended abnormally: {}", e);
                }
            }
        }

        Ok(reports)
    }

    fn run_timeout(&self) -> Option<Duration> {
        self.config.run_timeout_seconds.map(Duration::from_secs)
    }
}
