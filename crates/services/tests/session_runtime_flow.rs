use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use exam_core::model::{Category, EndReason, QuestionId, QuestionRecord, SessionReport};
use exam_core::time::fixed_clock;
use serde_json::json;
use services::catalog::SAMPLE_CATEGORY;
use services::{
    CatalogLoader, CatalogProvider, ExamConfig, FetchError, InMemoryCatalogProvider, Phase,
    ResultsSink, SessionError, SessionHandle, SessionRuntime,
};

#[derive(Default)]
struct RecordingSink {
    reports: Mutex<Vec<SessionReport>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl ResultsSink for RecordingSink {
    fn deliver(&self, report: &SessionReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

fn config(duration_secs: u32) -> ExamConfig {
    ExamConfig {
        duration_secs,
        tick_period: Duration::from_secs(1),
        max_attempts: 1,
        retry_delay: Duration::ZERO,
        ..ExamConfig::default()
    }
}

fn spawn_sample(
    duration_secs: u32,
) -> (SessionHandle, Arc<RecordingSink>, tokio::task::JoinHandle<()>) {
    let sink = Arc::new(RecordingSink::default());
    let loader = CatalogLoader::new(Arc::new(InMemoryCatalogProvider::sample()));
    let (handle, task) = SessionRuntime::spawn_with_clock(
        loader,
        &config(duration_secs),
        sink.clone(),
        fixed_clock(),
    );
    (handle, sink, task)
}

async fn start_sample(handle: &SessionHandle) -> u64 {
    let generation = handle.start(Category::new(SAMPLE_CATEGORY)).await.unwrap();
    handle
        .wait_until(|s| s.phase == Phase::InProgress && s.generation == generation)
        .await
        .unwrap();
    generation
}

fn alive_tasks() -> usize {
    tokio::runtime::Handle::current().metrics().num_alive_tasks()
}

#[tokio::test(start_paused = true)]
async fn countdown_auto_submits_at_zero() {
    let (handle, sink, _task) = spawn_sample(3);
    let generation = start_sample(&handle).await;
    assert_eq!(handle.snapshot().remaining_label().as_deref(), Some("0:03"));

    handle.select_answer(QuestionId::number(1), "Option A").unwrap();
    handle.select_answer(QuestionId::number(2), "Option C").unwrap();

    let report = handle.wait_for_end(generation).await.unwrap();
    assert_eq!(report.reason, EndReason::TimedOut);
    assert_eq!(report.remaining_secs, 0);
    assert_eq!(report.outcome.score, 1);
    assert_eq!(report.outcome.total, 20);
    assert_eq!(report.outcome.percentage, 5);
    assert_eq!(sink.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn clock_stops_once_the_session_ends() {
    let (handle, sink, _task) = spawn_sample(600);
    let generation = start_sample(&handle).await;

    // The runtime loop plus its timer; the finished fetch is gone.
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let during = alive_tasks();
    assert_eq!(during, 2);

    for n in 1..=20_u64 {
        handle.select_answer(QuestionId::number(n), "Option A").unwrap();
    }
    handle.request_submit().unwrap();

    let report = handle.wait_for_end(generation).await.unwrap();
    assert_eq!(report.reason, EndReason::Completed);
    assert_eq!(report.outcome.percentage, 100);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(alive_tasks(), during - 1);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.phase, Phase::Ended);
    assert_eq!(snapshot.remaining_secs, Some(report.remaining_secs));
    assert_eq!(sink.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn wait_for_end_ignores_previous_session() {
    let (handle, sink, _task) = spawn_sample(600);
    let first = start_sample(&handle).await;
    for n in 1..=20_u64 {
        handle.select_answer(QuestionId::number(n), "Option A").unwrap();
    }
    handle.request_submit().unwrap();
    let report = handle.wait_for_end(first).await.unwrap();
    assert_eq!(report.outcome.score, 20);

    let second = handle.start(Category::new(SAMPLE_CATEGORY)).await.unwrap();
    assert!(second > first);
    let pending =
        tokio::time::timeout(Duration::from_secs(5), handle.wait_for_end(second)).await;
    assert!(pending.is_err(), "returned the earlier session's report");

    handle.request_submit().unwrap();
    handle.confirm_submit().unwrap();
    let report = handle.wait_for_end(second).await.unwrap();
    assert_eq!(report.reason, EndReason::Confirmed);
    assert_eq!(report.outcome.score, 0);
    assert_eq!(sink.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn confirmation_gate_round_trip() {
    let (handle, _sink, _task) = spawn_sample(600);
    let generation = start_sample(&handle).await;

    handle.select_answer(QuestionId::number(1), "Option A").unwrap();
    handle.request_submit().unwrap();
    let snapshot = handle
        .wait_until(|s| s.phase == Phase::AwaitingConfirmation)
        .await
        .unwrap();
    assert_eq!(snapshot.unanswered, Some(19));

    handle.cancel_submit().unwrap();
    let snapshot = handle
        .wait_until(|s| s.phase == Phase::InProgress)
        .await
        .unwrap();
    assert_eq!(snapshot.progress.map(|p| p.answered), Some(1));

    handle.request_submit().unwrap();
    handle.confirm_submit().unwrap();
    let report = handle.wait_for_end(generation).await.unwrap();
    assert_eq!(report.reason, EndReason::Confirmed);
    assert_eq!(report.outcome.score, 1);
}

/// Serves one question once `available` is set, 503 before that.
struct SwitchProvider {
    available: AtomicBool,
    calls: AtomicU32,
}

#[async_trait]
impl CatalogProvider for SwitchProvider {
    async fn fetch(&self, _category: &Category) -> Result<Vec<QuestionRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(FetchError::HttpStatus(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(vec![QuestionRecord {
            id: None,
            prompt: "2 + 2?".into(),
            options: json!({ "a": "3", "b": "4" }),
            correct: "4".into(),
            category: None,
            explanation: None,
            difficulty: None,
        }])
    }
}

#[tokio::test(start_paused = true)]
async fn failed_load_recovers_through_retry() {
    let provider = Arc::new(SwitchProvider {
        available: AtomicBool::new(false),
        calls: AtomicU32::new(0),
    });
    let loader = CatalogLoader::new(provider.clone()).with_retries(2, Duration::from_millis(50));
    let sink = Arc::new(RecordingSink::default());
    let (handle, _task) = SessionRuntime::spawn(loader, &config(600), sink);

    handle.start(Category::new("math")).await.unwrap();
    let failed = handle
        .wait_until(|s| s.phase == Phase::Failed)
        .await
        .unwrap();
    assert!(failed.error.is_some());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    // Events other than retry are ignored while failed.
    handle.request_submit().unwrap();
    handle.select_answer(QuestionId::number(1), "4").unwrap();

    provider.available.store(true, Ordering::SeqCst);
    handle.retry_load().unwrap();
    let snapshot = handle
        .wait_until(|s| s.phase == Phase::InProgress)
        .await
        .unwrap();
    assert_eq!(snapshot.questions[0].choices, ["3", "4"]);
    assert_eq!(snapshot.progress.map(|p| p.answered), Some(0));
    assert!(snapshot.generation > failed.generation);
}

/// Takes ten seconds for the `slow` category.
struct SlowProvider;

#[async_trait]
impl CatalogProvider for SlowProvider {
    async fn fetch(&self, category: &Category) -> Result<Vec<QuestionRecord>, FetchError> {
        if category.as_str() == "slow" {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        Ok(vec![QuestionRecord {
            id: None,
            prompt: format!("from {category}"),
            options: json!(["yes", "no"]),
            correct: "yes".into(),
            category: None,
            explanation: None,
            difficulty: None,
        }])
    }
}

#[tokio::test(start_paused = true)]
async fn restart_discards_in_flight_fetch() {
    let loader = CatalogLoader::new(Arc::new(SlowProvider));
    let (handle, _task) =
        SessionRuntime::spawn(loader, &config(600), Arc::new(services::DiscardResults));

    let slow = handle.start(Category::new("slow")).await.unwrap();
    let fast = handle.start(Category::new("fast")).await.unwrap();
    assert!(fast > slow);
    handle
        .wait_until(|s| s.phase == Phase::InProgress && s.generation == fast)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20_500)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.category, Some(Category::new("fast")));
    assert_eq!(snapshot.questions[0].prompt, "from fast");
    assert_eq!(snapshot.remaining_secs, Some(580));
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_the_handle() {
    let (handle, _sink, task) = spawn_sample(600);
    let generation = start_sample(&handle).await;

    handle.shutdown().unwrap();
    task.await.unwrap();

    assert_eq!(handle.request_submit(), Err(SessionError::Closed));
    assert_eq!(handle.wait_for_end(generation).await, Err(SessionError::Closed));
    assert_eq!(
        handle.start(Category::new(SAMPLE_CATEGORY)).await,
        Err(SessionError::Closed)
    );
}

#[tokio::test]
async fn dropping_every_handle_stops_the_runtime() {
    let (handle, _sink, task) = spawn_sample(600);
    start_sample(&handle).await;

    drop(handle);
    task.await.unwrap();
}
