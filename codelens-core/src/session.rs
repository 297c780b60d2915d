//! Analysis lifecycle controller.
//!
//! [`AnalysisController`] owns at most one session at a time. A session moves
//! `idle -> connecting -> streaming -> complete | error` and never skips or
//! reorders a step. The network exchange runs in a spawned task that reports
//! back through [`SessionEvent`]s; the owner feeds those into
//! [`AnalysisController::handle`] from its event loop, so every state change
//! happens on the owner's task.
//!
//! A new submission supersedes the current session: the old exchange is told
//! to stop, its task is awaited (which closes its channel), and only then does
//! the new session start. Events still queued from the old exchange carry the
//! old session number and are dropped by `handle`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backend::{AnalysisBackend, ResultChannel};
use crate::error::{AnalysisError, ValidationError};
use crate::progress::{ProgressPlan, ProgressSimulator};
use crate::types::{AnalysisResult, SessionSnapshot, SessionStatus};
use crate::validate::{validate, ValidationLimits};

/// Default bound on submit + connect + first message.
pub const DEFAULT_RESULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of user-initiated retries offered after a failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub result_timeout: Duration,
    pub limits: ValidationLimits,
    pub plan: ProgressPlan,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            result_timeout: DEFAULT_RESULT_TIMEOUT,
            limits: ValidationLimits::default(),
            plan: ProgressPlan::standard(),
        }
    }
}

/// Progress of one exchange, reported by its task.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The service accepted the code; the result channel is being opened.
    Streaming { session: u64, analysis_id: String },
    Delivered { session: u64, result: AnalysisResult },
    Failed { session: u64, error: AnalysisError },
}

impl SessionEvent {
    pub fn session(&self) -> u64 {
        match self {
            SessionEvent::Streaming { session, .. }
            | SessionEvent::Delivered { session, .. }
            | SessionEvent::Failed { session, .. } => *session,
        }
    }
}

struct Exchange {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

pub struct AnalysisController<B: AnalysisBackend> {
    backend: Arc<B>,
    events: mpsc::UnboundedSender<SessionEvent>,
    simulator: ProgressSimulator,
    result_timeout: Duration,
    limits: ValidationLimits,

    session: u64,
    status: SessionStatus,
    analysis_id: Option<String>,
    result: Option<AnalysisResult>,
    error: Option<AnalysisError>,
    retry_count: u32,
    last_code: Option<String>,
    exchange: Option<Exchange>,
}

impl<B: AnalysisBackend> AnalysisController<B> {
    /// Creates an idle controller. Exchange progress is sent on `events`.
    pub fn new(
        backend: B,
        options: ControllerOptions,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            events,
            simulator: ProgressSimulator::new(options.plan),
            result_timeout: options.result_timeout,
            limits: options.limits,
            session: 0,
            status: SessionStatus::Idle,
            analysis_id: None,
            result: None,
            error: None,
            retry_count: 0,
            last_code: None,
            exchange: None,
        }
    }

    /// Starts a fresh session for `code`, superseding any current one.
    ///
    /// Returns `Ok(false)` without touching state when `code` is blank.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `code` is over the size limits or has
    /// unbalanced brackets. Nothing is sent and state is left untouched.
    pub async fn submit(&mut self, code: &str) -> Result<bool, ValidationError> {
        if code.trim().is_empty() {
            return Ok(false);
        }
        validate(code, &self.limits)?;
        self.begin(code.to_owned(), 0).await;
        Ok(true)
    }

    /// Resubmits the last submitted code, counting the attempt.
    ///
    /// Returns `false` when nothing has been submitted yet.
    pub async fn retry(&mut self) -> bool {
        let Some(code) = self.last_code.clone() else {
            return false;
        };
        let attempts = self.retry_count.saturating_add(1);
        self.begin(code, attempts).await;
        true
    }

    /// Whether the UI should offer a retry: the session failed and fewer than
    /// `max_retries` retries have been made.
    pub fn can_retry(&self, max_retries: u32) -> bool {
        self.status == SessionStatus::Error && self.retry_count < max_retries
    }

    /// Applies one event from an exchange task. Returns `false` for events of a
    /// superseded session, which are ignored.
    pub fn handle(&mut self, event: SessionEvent) -> bool {
        if event.session() != self.session || self.status.is_terminal() {
            tracing::debug!(
                event_session = event.session(),
                current = self.session,
                "dropping stale session event"
            );
            return false;
        }

        match event {
            SessionEvent::Streaming { analysis_id, .. } => {
                if self.status != SessionStatus::Connecting {
                    return false;
                }
                self.status = SessionStatus::Streaming;
                self.analysis_id = Some(analysis_id);
            }
            SessionEvent::Delivered { result, .. } => {
                if self.status != SessionStatus::Streaming {
                    return false;
                }
                tracing::info!(
                    analysis_id = self.analysis_id.as_deref().unwrap_or(""),
                    bugs = result.bugs.len(),
                    "analysis complete"
                );
                self.simulator.complete();
                self.status = SessionStatus::Complete;
                self.result = Some(result);
                self.exchange = None;
            }
            SessionEvent::Failed { error, .. } => {
                tracing::warn!(error = %error, stage = ?error.stage(), "analysis failed");
                self.simulator.fail();
                self.status = SessionStatus::Error;
                self.error = Some(error);
                self.exchange = None;
            }
        }
        true
    }

    /// Closes any open channel and halts the simulator, leaving the displayed
    /// progress as it is.
    pub async fn shutdown(&mut self) {
        self.cancel_exchange().await;
        self.simulator.stop();
    }

    /// Current session state merged with the simulator's progress.
    pub fn snapshot(&self) -> SessionSnapshot {
        let progress = self.simulator.progress();
        SessionSnapshot {
            status: self.status,
            analysis_id: self.analysis_id.clone(),
            progress_percent: progress.percent,
            stage_label: progress.label,
            result: self.result.clone(),
            retry_count: self.retry_count,
            error: self.error.clone(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Number of the current session; 0 before the first submission.
    pub fn session_number(&self) -> u64 {
        self.session
    }

    pub fn last_code(&self) -> Option<&str> {
        self.last_code.as_deref()
    }

    async fn begin(&mut self, code: String, retry_count: u32) {
        self.cancel_exchange().await;

        self.session += 1;
        self.status = SessionStatus::Connecting;
        self.analysis_id = None;
        self.result = None;
        self.error = None;
        self.retry_count = retry_count;
        self.last_code = Some(code.clone());
        self.simulator.start();

        tracing::info!(
            session = self.session,
            retry = retry_count,
            chars = code.chars().count(),
            "starting analysis"
        );

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(run_exchange(
            Arc::clone(&self.backend),
            code,
            self.session,
            self.result_timeout,
            self.events.clone(),
            cancel_rx,
        ));
        self.exchange = Some(Exchange {
            cancel: Some(cancel_tx),
            task,
        });
    }

    async fn cancel_exchange(&mut self) {
        let Some(mut exchange) = self.exchange.take() else {
            return;
        };
        if let Some(cancel) = exchange.cancel.take() {
            let _ = cancel.send(());
        }
        if let Err(e) = exchange.task.await {
            if e.is_panic() {
                tracing::error!(error = %e, "analysis exchange task panicked");
            }
        }
    }
}

/// One submit/connect/receive exchange. Exits early, closing whatever it
/// opened, when `cancel` fires or its sender is dropped.
async fn run_exchange<B: AnalysisBackend>(
    backend: Arc<B>,
    code: String,
    session: u64,
    timeout: Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut cancel: oneshot::Receiver<()>,
) {
    let deadline = Instant::now() + timeout;
    let fail = |error: AnalysisError| {
        let _ = events.send(SessionEvent::Failed { session, error });
    };

    let analysis_id = tokio::select! {
        _ = &mut cancel => return,
        submitted = tokio::time::timeout_at(deadline, backend.submit(&code)) => match submitted {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => return fail(e),
            Err(_) => return fail(AnalysisError::Timeout(timeout)),
        },
    };

    let _ = events.send(SessionEvent::Streaming {
        session,
        analysis_id: analysis_id.clone(),
    });

    let mut channel = tokio::select! {
        _ = &mut cancel => return,
        connected = tokio::time::timeout_at(deadline, backend.connect(&analysis_id)) => match connected {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => return fail(e),
            Err(_) => return fail(AnalysisError::Timeout(timeout)),
        },
    };

    let outcome = tokio::select! {
        _ = &mut cancel => None,
        received = tokio::time::timeout_at(deadline, channel.next_message()) => Some(match received {
            Ok(Ok(Some(text))) => AnalysisResult::from_json(&text),
            Ok(Ok(None)) => Err(AnalysisError::ChannelClosed),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AnalysisError::Timeout(timeout)),
        }),
    };

    channel.close().await;

    match outcome {
        None => tracing::debug!(session, "exchange cancelled; channel closed"),
        Some(Ok(result)) => {
            let _ = events.send(SessionEvent::Delivered { session, result });
        }
        Some(Err(e)) => fail(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_report_their_session() {
        let e = SessionEvent::Failed {
            session: 7,
            error: AnalysisError::ChannelClosed,
        };
        assert_eq!(e.session(), 7);
    }

    #[test]
    fn default_options_bound_the_exchange() {
        let options = ControllerOptions::default();
        assert_eq!(options.result_timeout, Duration::from_secs(120));
        assert_eq!(options.limits, ValidationLimits::default());
    }
}
