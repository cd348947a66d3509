use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::{
    application::{
        dto::upload_dto::{UploadEvent, UploadOutcome},
        error::{CancelReason, UploadError},
    },
    domain::models::progress::UploadProgress,
};

#[derive(Debug, Default)]
struct ReporterState {
    last: Option<UploadProgress>,
    completed: bool,
}

/// Serializes every event of one upload call. Progress only moves forward and
/// nothing is emitted once the outcome has been recorded.
#[derive(Debug)]
pub(crate) struct Reporter {
    state: Mutex<ReporterState>,
    superseded: AtomicBool,
    events: mpsc::UnboundedSender<UploadEvent>,
}

impl Reporter {
    pub(crate) fn new(events: mpsc::UnboundedSender<UploadEvent>) -> Self {
        Self {
            state: Mutex::new(ReporterState::default()),
            superseded: AtomicBool::new(false),
            events,
        }
    }

    pub(crate) fn progress(&self, progress: UploadProgress) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed || state.last.is_some_and(|last| progress <= last) {
            return;
        }
        state.last = Some(progress);
        let _ = self.events.send(UploadEvent::Progress(progress));
    }

    /// Records the terminal outcome. Returns false if one was already recorded.
    pub(crate) fn complete(&self, outcome: UploadOutcome) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed {
            return false;
        }
        state.completed = true;
        let _ = self.events.send(UploadEvent::Completed(outcome));
        true
    }

    fn cancel(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed {
            return false;
        }
        state.completed = true;
        self.superseded.store(true, Ordering::Release);
        let _ = self.events.send(UploadEvent::Completed(UploadOutcome::Failure(
            UploadError::Cancelled(CancelReason::Requested),
        )));
        true
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .completed
    }
}

/// Completes the call with `Cancelled(Aborted)` if the worker goes away
/// without reporting.
pub(crate) struct CompletionGuard(pub(crate) Arc<Reporter>);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.complete(UploadOutcome::Failure(UploadError::Cancelled(
            CancelReason::Aborted,
        )));
    }
}

#[derive(Debug, Clone)]
pub struct CancelHandle {
    reporter: Arc<Reporter>,
    signal: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub(crate) fn new(reporter: Arc<Reporter>, signal: watch::Sender<bool>) -> Self {
        Self {
            reporter,
            signal: Arc::new(signal),
        }
    }

    /// Aborts the in-flight transfer. Returns false, and does nothing, if the
    /// upload had already completed.
    pub fn cancel(&self) -> bool {
        if !self.reporter.cancel() {
            return false;
        }
        info!("Upload cancelled by caller");
        let _ = self.signal.send(true);
        true
    }

    pub fn is_finished(&self) -> bool {
        self.reporter.is_completed()
    }
}

/// Receiving side of one upload call. Drain it on the task that owns the UI;
/// callbacks passed to [`UploadEvents::dispatch`] run there.
///
/// The completion event is the only end signal. A server may answer before it
/// has read the whole body, in which case `Success` arrives without a preceding
/// [`UploadProgress::COMPLETE`].
#[derive(Debug)]
pub struct UploadEvents {
    receiver: mpsc::UnboundedReceiver<UploadEvent>,
    reporter: Arc<Reporter>,
    finished: bool,
}

impl UploadEvents {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<UploadEvent>,
        reporter: Arc<Reporter>,
    ) -> Self {
        Self {
            receiver,
            reporter,
            finished: false,
        }
    }

    /// Next event, or `None` once the completion has been delivered.
    pub async fn next(&mut self) -> Option<UploadEvent> {
        if self.finished {
            return None;
        }
        loop {
            let event = match self.receiver.recv().await {
                Some(event) => event,
                // Every sender lives in the reporter we hold, so this is unreachable
                // unless the reporter itself was torn down.
                None => UploadEvent::Completed(UploadOutcome::Failure(UploadError::Cancelled(
                    CancelReason::Aborted,
                ))),
            };
            match event {
                UploadEvent::Progress(_) if self.reporter.superseded.load(Ordering::Acquire) => {
                    continue
                }
                UploadEvent::Completed(_) => {
                    self.finished = true;
                    return Some(event);
                }
                UploadEvent::Progress(_) => return Some(event),
            }
        }
    }

    /// Drives the upload to its end, invoking `on_progress` for each progress
    /// value and `on_complete` exactly once with the outcome.
    pub async fn dispatch<P, C, R>(mut self, mut on_progress: P, on_complete: C) -> R
    where
        P: FnMut(UploadProgress),
        C: FnOnce(UploadOutcome) -> R,
    {
        loop {
            match self.next().await {
                Some(UploadEvent::Progress(progress)) => on_progress(progress),
                Some(UploadEvent::Completed(outcome)) => return on_complete(outcome),
                None => {
                    return on_complete(UploadOutcome::Failure(UploadError::Cancelled(
                        CancelReason::Aborted,
                    )))
                }
            }
        }
    }

    /// Waits for the outcome, discarding progress.
    pub async fn outcome(self) -> UploadOutcome {
        self.dispatch(|_| {}, |outcome| outcome).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (Arc<Reporter>, UploadEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Arc::new(Reporter::new(tx));
        let events = UploadEvents::new(rx, reporter.clone());
        (reporter, events)
    }

    #[tokio::test]
    async fn test_progress_never_moves_backwards() {
        let (reporter, mut events) = channel();
        reporter.progress(UploadProgress::new(0.2));
        reporter.progress(UploadProgress::new(0.1));
        reporter.progress(UploadProgress::new(0.2));
        reporter.progress(UploadProgress::new(0.5));
        assert!(reporter.complete(UploadOutcome::Success { status: 200 }));

        assert_eq!(
            events.next().await,
            Some(UploadEvent::Progress(UploadProgress::new(0.2)))
        );
        assert_eq!(
            events.next().await,
            Some(UploadEvent::Progress(UploadProgress::new(0.5)))
        );
        assert_eq!(
            events.next().await,
            Some(UploadEvent::Completed(UploadOutcome::Success { status: 200 }))
        );
        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn test_completion_is_recorded_once() {
        let (reporter, events) = channel();
        assert!(reporter.complete(UploadOutcome::Success { status: 201 }));
        assert!(!reporter.complete(UploadOutcome::Failure(UploadError::NetworkError(
            "late".to_string()
        ))));
        reporter.progress(UploadProgress::COMPLETE);

        let mut progress_calls = 0;
        let outcome = events
            .dispatch(|_| progress_calls += 1, |outcome| outcome)
            .await;
        assert_eq!(outcome, UploadOutcome::Success { status: 201 });
        assert_eq!(progress_calls, 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_queued_progress() {
        let (reporter, mut events) = channel();
        let (signal, _watch) = watch::channel(false);
        let handle = CancelHandle::new(reporter.clone(), signal);

        reporter.progress(UploadProgress::new(0.3));
        reporter.progress(UploadProgress::new(0.6));
        assert!(handle.cancel());
        assert!(handle.is_finished());
        assert!(!handle.cancel());

        assert_eq!(
            events.next().await,
            Some(UploadEvent::Completed(UploadOutcome::Failure(
                UploadError::Cancelled(CancelReason::Requested)
            )))
        );
        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn test_guard_completes_abandoned_upload() {
        let (reporter, events) = channel();
        drop(CompletionGuard(reporter.clone()));
        assert_eq!(
            events.outcome().await,
            UploadOutcome::Failure(UploadError::Cancelled(CancelReason::Aborted))
        );
    }
}
