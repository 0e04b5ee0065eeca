//! End-to-end crawl runs against an in-memory site

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

use timacad_crawler_lib::application::{
    CompetitionReport, CrawlError, ProgressReporter, Scheduler, TaskFailure, TaskOutcome,
};
use timacad_crawler_lib::domain::SkipReason;
use timacad_crawler_lib::infrastructure::config::{AppConfig, timacad};
use timacad_crawler_lib::infrastructure::parsing::ExtractionError;
use timacad_crawler_lib::infrastructure::{FetchError, PageFetcher};

const HEADER: &str = "СНИЛС;Сумма баллов;Дополнительные баллы;Приоритет;Вид документов";
const BASE: &str = "https://www.timacad.ru/incoming/lists";

/// Serves canned pages and records how many fetches overlap
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, Vec<u8>>,
    slow: HashSet<String>,
    delay: Duration,
    slow_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: AtomicUsize,
}

impl FakeSite {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into().into_bytes());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn slow_page(mut self, url: &str, delay: Duration) -> Self {
        self.slow.insert(url.to_string());
        self.slow_delay = delay;
        self
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = if self.slow.contains(url) { self.slow_delay } else { self.delay };
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[derive(Default)]
struct RecordingReporter {
    started: Mutex<Option<usize>>,
    completed: Mutex<Vec<(usize, usize)>>,
}

impl ProgressReporter for RecordingReporter {
    fn on_started(&self, total: usize) {
        *self.started.lock().unwrap() = Some(total);
    }

    fn on_completed(&self, completed: usize, total: usize, _report: &CompetitionReport) {
        self.completed.lock().unwrap().push((completed, total));
    }
}

/// Landing page with one full-time master's card per `(direction, sub-direction, slug)`
fn landing(entries: &[(&str, &str, &str)]) -> String {
    let cards: String = entries
        .iter()
        .map(|(direction, sub, slug)| {
            format!(
                r#"<div class="card"><div class="card-header">{direction}</div><div><div class="card-body">
                   <div class="card"><div class="card-header">{sub}</div><div><div class="card-body">
                     <a href="/incoming/lists/{slug}.html">на общих основаниях</a>
                     <a href="/incoming/lists/{slug}-target.html">целевая квота</a>
                   </div></div></div>
                 </div></div></div>"#
            )
        })
        .collect();

    format!(
        r#"<html><body>
        <div class="card"><div class="card-header">Очная форма обучения</div><div><div class="card-body">
          <div class="card"><div class="card-header">Магистратура</div><div><div class="card-body">{cards}</div></div></div>
        </div></div></div>
        </body></html>"#
    )
}

fn ranking_page(funding: &str, rows: &[(&str, u32)]) -> String {
    let rows: String = rows
        .iter()
        .enumerate()
        .map(|(i, (id, score))| {
            format!(
                "<tr class=\"R0\"><td>{}</td><td>{id}</td><td>{score}</td><td></td><td></td><td>0</td><td>Оригинал</td><td>1</td></tr>",
                i + 1
            )
        })
        .collect();

    format!(
        "<html><body>\
         <p>Уровень подготовки - Магистратура</p><p>Форма обучения - Очная</p><p>Основание поступления - {funding}</p>\
         <table><tr class=\"R13\"><td>№</td><td>СНИЛС</td></tr>{rows}</table>\
         </body></html>"
    )
}

fn url(slug: &str) -> String {
    format!("{BASE}/{slug}.html")
}

fn config(output_root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.crawler.output_root = output_root.to_path_buf();
    config
}

fn csv_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_eligible_competition_is_written_and_ineligible_is_skipped() {
    let root = tempfile::tempdir().unwrap();
    let site = FakeSite::new()
        .page(
            timacad::LANDING_PAGE,
            landing(&[("Агрономия", "Защита растений", "a"), ("Экономика", "Финансы", "b")]),
        )
        .page(
            &url("a"),
            ranking_page("Бюджетная основа", &[("12345678901", 250), ("109 876 543 21", 240)]),
        )
        .page(&url("b"), ranking_page("Полное возмещение затрат", &[("12345678901", 250)]));

    let summary = assert_ok!(Scheduler::new(&config(root.path()), Arc::new(site)).run().await);

    let session_dir = summary.session_dir.clone().unwrap();
    assert_eq!(session_dir.parent(), Some(root.path()));
    assert_eq!(session_dir.file_name().unwrap().len(), "DDMMYYYY-HHMM".len());
    assert_eq!(csv_files(&session_dir), vec!["Агрономия (Защита растений).csv"]);

    let content = std::fs::read_to_string(session_dir.join("Агрономия (Защита растений).csv")).unwrap();
    assert_eq!(
        content,
        format!("{HEADER}\n123-456-789-01;250;0;1;Оригинал\n109-876-543-21;240;0;1;Оригинал\n")
    );

    assert_eq!(summary.written_count(), 1);
    assert_eq!(summary.skipped_count(), 1);
    assert!(matches!(
        summary.report_for("Экономика (Финансы)").unwrap().outcome,
        TaskOutcome::Skipped(SkipReason::NotBudget)
    ));
}

#[tokio::test]
async fn test_landing_fixture_is_crawled_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let eligible = include_str!("fixtures/competition_eligible.html");
    let site = FakeSite::new()
        .page(timacad::LANDING_PAGE, include_str!("fixtures/landing_page.html"))
        .page(&url("m-agro-protect"), eligible)
        .page("https://lists.example.org/m-agro-breeding.html", eligible);

    let summary = Scheduler::new(&config(root.path()), Arc::new(site))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.reports.len(), 3);
    assert_eq!(summary.rejected_anchors.len(), 3);
    assert_eq!(summary.written_count(), 2);
    // m-general is not served
    let failed = summary.report_for("Магистратура").unwrap();
    assert!(matches!(
        failed.outcome,
        TaskOutcome::Failed(TaskFailure::Fetch(FetchError::Status { status: 404, .. }))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_more_than_three_fetches_in_flight() {
    let root = tempfile::tempdir().unwrap();
    let slugs: Vec<String> = (0..9).map(|i| format!("c{i}")).collect();
    let entries: Vec<(String, String, String)> = slugs
        .iter()
        .map(|slug| (format!("Направление {slug}"), "Программа".to_string(), slug.clone()))
        .collect();
    let entry_refs: Vec<(&str, &str, &str)> = entries
        .iter()
        .map(|(d, s, slug)| (d.as_str(), s.as_str(), slug.as_str()))
        .collect();

    let mut site = FakeSite::new()
        .with_delay(Duration::from_millis(40))
        .page(timacad::LANDING_PAGE, landing(&entry_refs));
    for slug in &slugs {
        site = site.page(&url(slug), ranking_page("Бюджетная основа", &[("12345678901", 200)]));
    }
    let site = Arc::new(site);

    let summary = Scheduler::new(&config(root.path()), Arc::clone(&site) as Arc<dyn PageFetcher>)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.written_count(), 9);
    assert_eq!(site.requests.load(Ordering::SeqCst), 10);
    assert_eq!(site.max_in_flight.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failures_are_isolated_per_competition() {
    let root = tempfile::tempdir().unwrap();
    let site = FakeSite::new()
        .page(
            timacad::LANDING_PAGE,
            landing(&[("Good", "One", "good"), ("Bad", "Id", "bad-id"), ("Gone", "Missing", "gone")]),
        )
        .page(&url("good"), ranking_page("Бюджетная основа", &[("12345678901", 199)]))
        .page(&url("bad-id"), ranking_page("Бюджетная основа", &[("123-45", 199)]));

    let reporter = Arc::new(RecordingReporter::default());
    let summary = Scheduler::new(&config(root.path()), Arc::new(site))
        .with_reporter(Arc::clone(&reporter) as Arc<dyn ProgressReporter>)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.written_count(), 1);
    assert_eq!(summary.failed_count(), 2);
    assert!(matches!(
        summary.report_for("Bad (Id)").unwrap().outcome,
        TaskOutcome::Failed(TaskFailure::Extraction(ExtractionError::InvalidField {
            field: "identifier",
            ..
        }))
    ));

    let session_dir = summary.session_dir.unwrap();
    assert_eq!(csv_files(&session_dir), vec!["Good (One).csv"]);

    assert_eq!(*reporter.started.lock().unwrap(), Some(3));
    assert_eq!(*reporter.completed.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn test_empty_discovery_creates_no_output() {
    let root = tempfile::tempdir().unwrap();
    let output_root = root.path().join("downloads");
    let site = FakeSite::new().page(timacad::LANDING_PAGE, "<html><body><p>Приём завершён</p></body></html>");

    let summary = Scheduler::new(&config(&output_root), Arc::new(site))
        .run()
        .await
        .unwrap();

    assert!(summary.session_dir.is_none());
    assert!(summary.reports.is_empty());
    assert!(!output_root.exists());
}

#[tokio::test]
async fn test_landing_failure_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let site = FakeSite::new();

    let result = Scheduler::new(&config(root.path()), Arc::new(site)).run().await;
    let error = assert_err!(result);
    assert!(matches!(
        error,
        CrawlError::LandingPage(FetchError::Status { status: 404, .. })
    ));
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_run_timeout_cancels_outstanding_fetches() {
    let root = tempfile::tempdir().unwrap();
    let mut config = config(root.path());
    config.crawler.run_timeout_seconds = Some(1);

    let site = FakeSite::new()
        .page(timacad::LANDING_PAGE, landing(&[("Fast", "One", "fast"), ("Slow", "Two", "slow")]))
        .page(&url("fast"), ranking_page("Бюджетная основа", &[("12345678901", 210)]))
        .page(&url("slow"), ranking_page("Бюджетная основа", &[("12345678901", 220)]))
        .slow_page(&url("slow"), Duration::from_secs(30));

    let summary = tokio::time::timeout(Duration::from_secs(10), Scheduler::new(&config, Arc::new(site)).run())
        .await
        .expect("timeout must end the run")
        .unwrap();

    assert!(summary.report_for("Fast (One)").unwrap().outcome.is_written());
    assert!(matches!(
        summary.report_for("Slow (Two)").unwrap().outcome,
        TaskOutcome::Failed(TaskFailure::Cancelled)
    ));
}

#[tokio::test]
async fn test_cancelled_scheduler_stops_before_discovery() {
    let root = tempfile::tempdir().unwrap();
    let site = FakeSite::new().page(timacad::LANDING_PAGE, landing(&[("A", "B", "a")]));

    let scheduler = Scheduler::new(&config(root.path()), Arc::new(site));
    scheduler.cancellation_token().cancel();

    assert!(matches!(scheduler.run().await, Err(CrawlError::Cancelled)));
}
