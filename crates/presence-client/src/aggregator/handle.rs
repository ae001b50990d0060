//! Public handle of the presence aggregator
//!
//! One aggregator per connection. The handle is cheap to clone; every clone
//! talks to the same worker task.

use presence_core::{PresenceRecord, UserId};
use tokio::sync::{mpsc, oneshot};

use crate::services::{AggregatorError, ServiceContext, Subscription};

use super::worker::{BatchOutcome, Command, Worker};

/// Handle to a running presence aggregator
#[derive(Debug, Clone)]
pub struct PresenceAggregator {
    commands: mpsc::UnboundedSender<Command>,
}

impl PresenceAggregator {
    /// Start the worker task on the current tokio runtime
    #[must_use]
    pub fn spawn(ctx: ServiceContext) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (worker, fires) = Worker::new(ctx);

        tokio::spawn(worker.run(command_rx, fires));

        Self { commands }
    }

    /// Queue `id` for the next batch. Never blocks.
    pub fn request_presence(&self, id: UserId) -> Result<(), AggregatorError> {
        self.send(Command::Request(id))
    }

    /// Fetch everything pending right now, bypassing the debounce window
    ///
    /// Resolves once the batch has been distributed. A batch already in
    /// flight finishes first; this one then drains whatever is pending.
    pub async fn refresh_all_pending(&self) -> Result<BatchOutcome, AggregatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Refresh(reply))?;
        rx.await.map_err(|_| AggregatorError::Closed)
    }

    /// Open the live-update streams for a (re)connect
    pub async fn establish_subscriptions(
        &self,
        server_version: Option<String>,
    ) -> Result<Vec<Subscription>, AggregatorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Establish {
            server_version,
            reply,
        })?;
        rx.await.map_err(|_| AggregatorError::Closed)
    }

    /// Distribute a record received from a live stream
    pub fn apply_presence(&self, record: PresenceRecord) -> Result<(), AggregatorError> {
        self.send(Command::Apply(record))
    }

    /// Cancel timers and stop the worker
    ///
    /// A batch still in flight is aborted and its waiters see
    /// [`AggregatorError::Closed`].
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(Command::Shutdown(reply)).is_ok() {
            let _ = rx.await;
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, cmd: Command) -> Result<(), AggregatorError> {
        self.commands.send(cmd).map_err(|_| AggregatorError::Closed)
    }
}
