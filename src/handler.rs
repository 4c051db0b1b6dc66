use crate::{
    analyzer::{AnalysisResult, Analyzer, SelectedFile},
    config::{OverlapPolicy, RenderFormat},
    display::DisplayRegion,
    error::AnalysisFailure,
    render::render,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info};

/// What the display region currently reflects.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting { seq: u64 },
    Succeeded { seq: u64, result: AnalysisResult },
    Failed { seq: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded(AnalysisResult),
    Failed,
    Cancelled,
}

/// How one submission ended and whether it reached the display region.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub seq: u64,
    pub outcome: Outcome,
    pub displayed: bool,
}

/// A submission in flight.
pub struct Submission {
    seq: u64,
    handle: JoinHandle<Settlement>,
}

impl Submission {
    pub async fn settled(self) -> Settlement {
        match self.handle.await {
            Ok(settlement) => settlement,
            Err(err) => {
                if err.is_panic() {
                    error!(seq = self.seq, "submission task panicked");
                } else {
                    debug!(seq = self.seq, "submission cancelled");
                }
                Settlement {
                    seq: self.seq,
                    outcome: Outcome::Cancelled,
                    displayed: false,
                }
            }
        }
    }
}

struct Tracker {
    last_issued: u64,
    state: SubmissionState,
    in_flight: Option<AbortHandle>,
    region: DisplayRegion,
}

struct Inner {
    analyzer: Arc<dyn Analyzer>,
    policy: OverlapPolicy,
    format: RenderFormat,
    tracker: Mutex<Tracker>,
    // Highest sequence number that has finished; drives `serialize` ordering.
    finished: watch::Sender<u64>,
}

/// Reacts to triggers: sends the selected file, renders the outcome and
/// overwrites the display region.
#[derive(Clone)]
pub struct UploadHandler {
    inner: Arc<Inner>,
}

impl UploadHandler {
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        region: DisplayRegion,
        policy: OverlapPolicy,
        format: RenderFormat,
    ) -> Self {
        let (finished, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                analyzer,
                policy,
                format,
                tracker: Mutex::new(Tracker {
                    last_issued: 0,
                    state: SubmissionState::Idle,
                    in_flight: None,
                    region,
                }),
                finished,
            }),
        }
    }

    /// Starts one submission and returns without waiting for it. Must be
    /// called from within a tokio runtime.
    pub fn trigger(&self, file: Option<SelectedFile>) -> Submission {
        let mut tracker = self.inner.lock();
        tracker.last_issued += 1;
        let seq = tracker.last_issued;
        tracker.state = SubmissionState::Submitting { seq };

        if self.inner.policy == OverlapPolicy::CancelPrevious {
            if let Some(previous) = tracker.in_flight.take() {
                debug!(seq, "aborting previous submission");
                previous.abort();
            }
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run(seq, file).await });
        if self.inner.policy == OverlapPolicy::CancelPrevious {
            tracker.in_flight = Some(handle.abort_handle());
        }
        Submission { seq, handle }
    }

    /// Triggers and waits for the submission to settle.
    pub async fn submit(&self, file: Option<SelectedFile>) -> Settlement {
        self.trigger(file).settled().await
    }

    pub fn state(&self) -> SubmissionState {
        self.inner.lock().state.clone()
    }

    pub fn display(&self) -> String {
        self.inner.lock().region.content().to_string()
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.inner.policy
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(&self, seq: u64, file: Option<SelectedFile>) -> Settlement {
        // Advances `finished` however this task ends, panics included, so
        // later serialized submissions are never left waiting.
        let _finished = FinishedGuard {
            finished: &self.finished,
            seq,
        };

        if self.policy == OverlapPolicy::Serialize {
            let mut rx = self.finished.subscribe();
            let _ = rx.wait_for(|done| *done + 1 >= seq).await;
        }

        debug!(seq, file = file.as_ref().map(|f| f.name.as_str()), "submitting");
        let outcome = self.analyzer.analyze(file.as_ref()).await;
        drop(file);

        self.settle(seq, outcome)
    }

    fn settle(&self, seq: u64, outcome: Result<AnalysisResult, AnalysisFailure>) -> Settlement {
        match &outcome {
            Ok(result) => info!(
                seq,
                name = %crate::render::field_text(result.object_name.as_ref()),
                "analysis succeeded"
            ),
            Err(failure) => error!(seq, kind = failure.kind(), error = %failure, "analysis failed"),
        }

        let mut tracker = self.lock();
        let current = match self.policy {
            OverlapPolicy::CancelPrevious => seq == tracker.last_issued,
            OverlapPolicy::LastWriterWins | OverlapPolicy::Serialize => true,
        };

        if current {
            let content = render(outcome.as_ref(), self.format);
            if let Err(err) = tracker.region.replace(content) {
                error!(seq, "display mirror write failed: {err:#}");
            }
            // While a later submission is still in flight the state stays
            // `Submitting`.
            let later_in_flight = seq != tracker.last_issued
                && matches!(tracker.state, SubmissionState::Submitting { .. });
            if !later_in_flight {
                tracker.state = match &outcome {
                    Ok(result) => SubmissionState::Succeeded {
                        seq,
                        result: result.clone(),
                    },
                    Err(_) => SubmissionState::Failed { seq },
                };
            }
        } else {
            debug!(seq, latest = tracker.last_issued, "discarding superseded response");
        }

        Settlement {
            seq,
            outcome: match outcome {
                Ok(result) => Outcome::Succeeded(result),
                Err(_) => Outcome::Failed,
            },
            displayed: current,
        }
    }
}

struct FinishedGuard<'a> {
    finished: &'a watch::Sender<u64>,
    seq: u64,
}

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        let seq = self.seq;
        self.finished.send_modify(|done| *done = (*done).max(seq));
    }
}
