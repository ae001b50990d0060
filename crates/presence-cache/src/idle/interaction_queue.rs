//! Idle-deferral queue.
//!
//! Deferred tasks run on a background worker, one at a time and in the order
//! they were queued, but only while no [`InteractionGuard`] is alive. UI code
//! holds a guard for the duration of a gesture or animation.

use presence_core::{DeferredTask, IdleScheduler};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Scheduler implementing [`IdleScheduler`] on a tokio worker task
#[derive(Clone)]
pub struct InteractionQueue {
    task_tx: mpsc::UnboundedSender<DeferredTask>,
    active: Arc<watch::Sender<usize>>,
}

impl InteractionQueue {
    /// Create the queue and start its worker
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn() -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (active_tx, active_rx) = watch::channel(0usize);

        tokio::spawn(Self::worker_loop(task_rx, active_rx));

        Self {
            task_tx,
            active: Arc::new(active_tx),
        }
    }

    /// Run deferred tasks as soon as no interaction is in progress
    async fn worker_loop(
        mut task_rx: mpsc::UnboundedReceiver<DeferredTask>,
        mut active_rx: watch::Receiver<usize>,
    ) {
        while let Some(task) = task_rx.recv().await {
            if active_rx.wait_for(|count| *count == 0).await.is_err() {
                // All queue handles dropped mid-interaction; run anyway
                tracing::debug!("Interaction tracker closed");
            }

            // Let in-flight work settle before running deferred work
            tokio::task::yield_now().await;
            task();
        }

        tracing::debug!("Interaction queue drained and closed");
    }

    /// Mark an interaction as started; deferred work waits until the guard is dropped
    #[must_use]
    pub fn begin_interaction(&self) -> InteractionGuard {
        self.active.send_modify(|count| *count += 1);
        InteractionGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of interactions currently in progress
    #[must_use]
    pub fn active_interactions(&self) -> usize {
        *self.active.borrow()
    }
}

impl IdleScheduler for InteractionQueue {
    fn run_after_interactions(&self, task: DeferredTask) {
        if self.task_tx.send(task).is_err() {
            tracing::warn!("Interaction queue worker stopped, dropping deferred task");
        }
    }
}

/// Keeps deferred work parked while alive
pub struct InteractionGuard {
    active: Arc<watch::Sender<usize>>,
}

impl Drop for InteractionGuard {
    fn drop(&mut self) {
        self.active.send_modify(|count| *count = count.saturating_sub(1));
    }
}
