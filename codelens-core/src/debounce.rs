//! Debounce gate for re-analysis on edit.
//!
//! `schedule` replaces any pending invocation with a fresh quiet window. The
//! pending invocation is a single tokio task; re-scheduling aborts it and bumps a
//! generation counter, so a task that already woke from its sleep cannot fire
//! either. Dropping the gate cancels whatever is pending.
//!
//! `action` receives the generation it fired under. When the action only queues
//! the text for someone else (a channel send), a `cancel` can still land after
//! the send; the receiver drops the text unless [`DebounceGate::is_current`]
//! holds for that generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delays `action` until input has been quiet for `window`.
pub struct DebounceGate<F> {
    window: Duration,
    action: Arc<F>,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl<F> DebounceGate<F>
where
    F: Fn(u64, String) + Send + Sync + 'static,
{
    /// Creates a gate that calls `action` once per quiet period.
    ///
    /// Must be used from within a tokio runtime: `schedule` spawns.
    pub fn new(window: Duration, action: F) -> Self {
        Self {
            window,
            action: Arc::new(action),
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    /// Records intent to analyse `text`, restarting the quiet window.
    ///
    /// After the window elapses with no further call, `action` runs exactly once
    /// with this text, unless it is empty after trimming.
    pub fn schedule(&mut self, text: impl Into<String>) {
        self.cancel();
        let text = text.into();
        let window = self.window;
        let action = Arc::clone(&self.action);
        let generation = Arc::clone(&self.generation);
        let mine = generation.load(Ordering::SeqCst);

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if generation.load(Ordering::SeqCst) != mine {
                return;
            }
            if text.trim().is_empty() {
                tracing::debug!("debounce window elapsed on blank input; not analysing");
                return;
            }
            action(mine, text);
        }));
    }

    /// Cancels the pending invocation, if any, without scheduling a new one.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// True while an invocation is waiting for its quiet window.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// True if nothing was scheduled or cancelled since `generation` fired.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<F> Drop for DebounceGate<F> {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
