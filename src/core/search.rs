//! # Search input
//!
//! Typed queries go through two filters before they reach an interactor:
//!
//! - [`SearchInput`] drops empty text and repeats of the last query.
//! - [`Debouncer`] waits for typing to pause, so only the last keystroke
//!   in a burst triggers a request.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct SearchInput {
    last_submitted: Option<String>,
}

impl SearchInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the query to run for `text`, or `None` if it would be a
    /// no-op (blank, or identical to the previous query).
    pub fn submit(&mut self, text: &str) -> Option<String> {
        let query = text.trim();
        if query.is_empty() || self.last_submitted.as_deref() == Some(query) {
            return None;
        }
        self.last_submitted = Some(query.to_string());
        Some(query.to_string())
    }

    pub fn last_submitted(&self) -> Option<&str> {
        self.last_submitted.as_deref()
    }
}

/// Delays an action, dropping it if a newer one is scheduled before the
/// delay elapses.
pub struct Debouncer {
    delay: Duration,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedules `action` to run after the delay. Any previously scheduled
    /// action that has not fired yet is dropped.
    pub fn schedule<F>(&mut self, action: F) -> JoinHandle<bool>
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Debounced action dropped");
                    false
                }
                _ = tokio::time::sleep(delay) => {
                    action();
                    true
                }
            }
        })
    }

    /// Drops the pending action, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
