use async_trait::async_trait;
use seed_check::{
    analyzer::{AnalysisResult, Analyzer, SelectedFile},
    config::{OverlapPolicy, RenderFormat},
    display::DisplayRegion,
    error::AnalysisFailure,
    handler::{Outcome, SubmissionState, UploadHandler},
    render::FAILURE_MESSAGE,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers with the file name after a delay taken from the name: `slow.jpg`
/// takes longer than `fast.jpg`.
#[derive(Default)]
struct DelayedAnalyzer {
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Analyzer for DelayedAnalyzer {
    async fn analyze(&self, file: Option<&SelectedFile>) -> Result<AnalysisResult, AnalysisFailure> {
        let name = file.map(|f| f.name.clone()).unwrap_or_default();
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = if name.starts_with("slow") { 200 } else { 20 };
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(AnalysisResult {
            object_name: Some(serde_json::json!(name)),
            ..Default::default()
        })
    }
}

struct FailingAnalyzer;

#[async_trait]
impl Analyzer for FailingAnalyzer {
    async fn analyze(&self, _file: Option<&SelectedFile>) -> Result<AnalysisResult, AnalysisFailure> {
        Err(AnalysisFailure::Status { status: 503 })
    }
}

/// Panics on `boom.jpg`, answers immediately otherwise.
struct PanicsOnBoom;

#[async_trait]
impl Analyzer for PanicsOnBoom {
    async fn analyze(&self, file: Option<&SelectedFile>) -> Result<AnalysisResult, AnalysisFailure> {
        let name = file.map(|f| f.name.clone()).unwrap_or_default();
        if name == "boom.jpg" {
            panic!("analyzer blew up");
        }
        Ok(AnalysisResult {
            object_name: Some(serde_json::json!(name)),
            ..Default::default()
        })
    }
}

fn file(name: &str) -> SelectedFile {
    SelectedFile {
        name: name.into(),
        media_type: "image/jpeg".into(),
        bytes: vec![1, 2, 3],
    }
}

fn handler(analyzer: Arc<DelayedAnalyzer>, policy: OverlapPolicy) -> UploadHandler {
    UploadHandler::new(analyzer, DisplayRegion::new(), policy, RenderFormat::Text)
}

#[tokio::test]
async fn last_writer_wins_shows_last_resolved() {
    let analyzer = Arc::new(DelayedAnalyzer::default());
    let handler = handler(Arc::clone(&analyzer), OverlapPolicy::LastWriterWins);
    assert_eq!(handler.state(), SubmissionState::Idle);

    let slow = handler.trigger(Some(file("slow.jpg")));
    let fast = handler.trigger(Some(file("fast.jpg")));
    assert_eq!(handler.state(), SubmissionState::Submitting { seq: 2 });

    let fast = fast.settled().await;
    let slow = slow.settled().await;

    assert!(fast.displayed && slow.displayed);
    assert_eq!(analyzer.peak.load(Ordering::SeqCst), 2);
    assert!(handler.display().contains("Name: slow.jpg"));
    assert!(matches!(handler.state(), SubmissionState::Succeeded { seq: 1, .. }));
}

#[tokio::test]
async fn serialize_runs_one_at_a_time_in_trigger_order() {
    let analyzer = Arc::new(DelayedAnalyzer::default());
    let handler = handler(Arc::clone(&analyzer), OverlapPolicy::Serialize);

    let slow = handler.trigger(Some(file("slow.jpg")));
    let fast = handler.trigger(Some(file("fast.jpg")));

    let slow = slow.settled().await;
    let fast = fast.settled().await;

    assert!(slow.displayed && fast.displayed);
    assert_eq!(analyzer.peak.load(Ordering::SeqCst), 1);
    assert!(handler.display().contains("Name: fast.jpg"));
    assert!(matches!(handler.state(), SubmissionState::Succeeded { seq: 2, .. }));
}

#[tokio::test]
async fn cancel_previous_aborts_in_flight_submission() {
    let analyzer = Arc::new(DelayedAnalyzer::default());
    let handler = handler(Arc::clone(&analyzer), OverlapPolicy::CancelPrevious);

    let slow = handler.trigger(Some(file("slow.jpg")));
    tokio::time::sleep(Duration::from_millis(5)).await;
    let fast = handler.trigger(Some(file("fast.jpg")));

    let slow = slow.settled().await;
    let fast = fast.settled().await;

    assert_eq!(slow.outcome, Outcome::Cancelled);
    assert!(!slow.displayed);
    assert!(fast.displayed);
    assert!(handler.display().contains("Name: fast.jpg"));
    assert!(!handler.display().contains("slow.jpg"));
}

#[tokio::test]
async fn failure_leaves_fixed_message_and_failed_state() {
    let handler = UploadHandler::new(
        Arc::new(FailingAnalyzer),
        DisplayRegion::new(),
        OverlapPolicy::LastWriterWins,
        RenderFormat::Text,
    );
    let settlement = handler.submit(Some(file("fast.jpg"))).await;
    assert_eq!(settlement.outcome, Outcome::Failed);
    assert!(settlement.displayed);
    assert_eq!(handler.display(), FAILURE_MESSAGE);
    assert_eq!(handler.state(), SubmissionState::Failed { seq: 1 });
}

#[tokio::test]
async fn serialize_continues_after_a_panicked_submission() {
    let handler = UploadHandler::new(
        Arc::new(PanicsOnBoom),
        DisplayRegion::new(),
        OverlapPolicy::Serialize,
        RenderFormat::Text,
    );

    let first = handler.trigger(Some(file("boom.jpg")));
    let second = handler.trigger(Some(file("fast.jpg")));

    assert_eq!(first.settled().await.outcome, Outcome::Cancelled);
    let second = tokio::time::timeout(Duration::from_secs(2), second.settled())
        .await
        .expect("second submission settles");
    assert!(second.displayed);
    assert!(handler.display().contains("Name: fast.jpg"));
}

#[tokio::test]
async fn earlier_settlement_keeps_later_submission_in_flight() {
    let analyzer = Arc::new(DelayedAnalyzer::default());
    let handler = handler(Arc::clone(&analyzer), OverlapPolicy::LastWriterWins);

    let fast = handler.trigger(Some(file("fast.jpg")));
    let slow = handler.trigger(Some(file("slow.jpg")));

    let fast = fast.settled().await;
    assert!(fast.displayed);
    assert!(handler.display().contains("Name: fast.jpg"));
    assert_eq!(handler.state(), SubmissionState::Submitting { seq: 2 });

    slow.settled().await;
    assert!(matches!(handler.state(), SubmissionState::Succeeded { seq: 2, .. }));
}
