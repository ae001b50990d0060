//! Single-shot debounce timer
//!
//! The first request after idle arms a timer; requests arriving while it is
//! armed are coalesced into the same batch and do not push the deadline back.
//! When the timer fires its slot is cleared before the batch runs, so
//! requests made during the fetch arm a fresh timer for the next batch.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one arming of the timer so stale fires can be ignored
pub type FireToken = u64;

/// Receiving side of the timer; yields a token each time a timer fires
pub type FireReceiver = mpsc::UnboundedReceiver<FireToken>;

/// Debounce timer owning at most one outstanding tokio sleep
#[derive(Debug)]
pub struct BatchScheduler {
    window: Duration,
    fire_tx: mpsc::UnboundedSender<FireToken>,
    armed: Option<(FireToken, JoinHandle<()>)>,
    next_token: FireToken,
}

impl BatchScheduler {
    /// Create a scheduler and the receiver its fires are delivered on
    #[must_use]
    pub fn new(window: Duration) -> (Self, FireReceiver) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            window,
            fire_tx,
            armed: None,
            next_token: 0,
        };
        (scheduler, fire_rx)
    }

    /// Arm the timer unless one is already pending. Returns whether a new timer was started.
    pub fn arm(&mut self) -> bool {
        if self.armed.is_some() {
            return false;
        }

        self.next_token += 1;
        let token = self.next_token;
        let window = self.window;
        let fire_tx = self.fire_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Receiver gone means the aggregator stopped
            let _ = fire_tx.send(token);
        });

        self.armed = Some((token, handle));
        tracing::trace!(token, window_ms = window.as_millis() as u64, "Batch timer armed");
        true
    }

    /// Accept a fire, clearing the slot. Returns `false` for a stale token.
    pub fn take_fire(&mut self, token: FireToken) -> bool {
        match self.armed {
            Some((current, _)) if current == token => {
                self.armed = None;
                true
            }
            _ => {
                tracing::trace!(token, "Ignoring stale batch timer");
                false
            }
        }
    }

    /// Abort the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some((token, handle)) = self.armed.take() {
            handle.abort();
            tracing::trace!(token, "Batch timer cancelled");
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for BatchScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
