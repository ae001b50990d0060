//! Aggregator worker task
//!
//! Sole owner of the pending set, the debounce timer, and the subscription
//! manager. Each batch runs in its own task so a slow fetch never stalls the
//! command loop. At most one batch is in flight; a fire or refresh that
//! arrives meanwhile is queued and started when the running batch reports
//! back. Requests that arrive during a fetch land in the next batch.

use std::collections::VecDeque;

use presence_core::{PresenceRecord, UserId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::batch::{BatchScheduler, FireReceiver, PendingIdSet};
use crate::services::{
    DistributionReport, FetchError, FetchedPresence, PresenceFetcher, ResultDistributor,
    ServiceContext, Subscription, SubscriptionManager,
};

/// Result of one batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Ids drained from the pending set
    pub requested: usize,
    /// Records produced for requested ids, synthesized offline entries included
    pub delivered: usize,
    /// What the distributor did with them
    pub report: DistributionReport,
    /// Set when the fetch failed and the batch degraded to empty
    pub error: Option<FetchError>,
}

impl BatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Messages from handles to the worker
#[derive(Debug)]
pub(crate) enum Command {
    Request(UserId),
    Refresh(oneshot::Sender<BatchOutcome>),
    Establish {
        server_version: Option<String>,
        reply: oneshot::Sender<Vec<Subscription>>,
    },
    Apply(PresenceRecord),
    Shutdown(oneshot::Sender<()>),
}

pub(crate) type CommandReceiver = mpsc::UnboundedReceiver<Command>;

type DoneSender = mpsc::UnboundedSender<BatchOutcome>;

/// Who is waiting on a batch; `None` for timer fires
type Waiter = Option<oneshot::Sender<BatchOutcome>>;

struct InFlight {
    task: JoinHandle<()>,
    reply: Waiter,
}

pub(crate) struct Worker {
    ctx: ServiceContext,
    pending: PendingIdSet,
    scheduler: BatchScheduler,
    subscriptions: SubscriptionManager,
    in_flight: Option<InFlight>,
    backlog: VecDeque<Waiter>,
}

impl Worker {
    pub(crate) fn new(ctx: ServiceContext) -> (Self, FireReceiver) {
        let (scheduler, fires) = BatchScheduler::new(ctx.config().debounce_window());
        let worker = Self {
            subscriptions: SubscriptionManager::new(ctx.clone()),
            ctx,
            pending: PendingIdSet::new(),
            scheduler,
            in_flight: None,
            backlog: VecDeque::new(),
        };
        (worker, fires)
    }

    /// Run until shut down or every handle is dropped
    pub(crate) async fn run(mut self, mut commands: CommandReceiver, mut fires: FireReceiver) {
        debug!(
            window_ms = self.scheduler.window().as_millis() as u64,
            "Presence aggregator started"
        );

        let (done, mut finished) = mpsc::unbounded_channel();

        let shutdown_reply = loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown(reply)) => break Some(reply),
                    Some(cmd) => self.handle(cmd, &done).await,
                    None => break None,
                },

                Some(token) = fires.recv() => {
                    if self.scheduler.take_fire(token) {
                        self.schedule_batch(None, &done);
                    }
                }

                Some(outcome) = finished.recv() => self.finish_batch(outcome, &done),
            }
        };

        // Handles observe the closure before the shutdown call returns
        drop(commands);
        self.stop();

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    async fn handle(&mut self, cmd: Command, done: &DoneSender) {
        match cmd {
            Command::Request(id) => {
                if self.pending.insert(id) {
                    self.scheduler.arm();
                }
            }
            Command::Refresh(reply) => self.schedule_batch(Some(reply), done),
            Command::Establish {
                server_version,
                reply,
            } => {
                let opened = self.subscriptions.establish(server_version.as_deref()).await;
                let _ = reply.send(opened);
            }
            Command::Apply(record) => {
                ResultDistributor::new(&self.ctx)
                    .distribute(&FetchedPresence::from_record(record))
                    .await;
            }
            // Handled by the run loop
            Command::Shutdown(_) => {}
        }
    }

    /// Start a batch now, or queue it behind the one in flight
    fn schedule_batch(&mut self, reply: Waiter, done: &DoneSender) {
        if self.in_flight.is_none() {
            self.start_batch(reply, done);
            return;
        }

        // One queued fire already covers every id requested since
        if reply.is_none() && self.backlog.iter().any(Option::is_none) {
            return;
        }

        self.backlog.push_back(reply);
        debug!(queued = self.backlog.len(), "Batch queued behind in-flight fetch");
    }

    fn start_batch(&mut self, reply: Waiter, done: &DoneSender) {
        let ids = self.pending.drain();
        let ctx = self.ctx.clone();
        let done = done.clone();

        let task = tokio::spawn(async move {
            let outcome = Self::run_batch(&ctx, ids).await;
            let _ = done.send(outcome);
        });

        self.in_flight = Some(InFlight { task, reply });
    }

    fn finish_batch(&mut self, outcome: BatchOutcome, done: &DoneSender) {
        if let Some(InFlight {
            reply: Some(reply), ..
        }) = self.in_flight.take()
        {
            let _ = reply.send(outcome);
        }

        if let Some(next) = self.backlog.pop_front() {
            self.start_batch(next, done);
        }
    }

    /// Fetch `ids` and distribute the result
    async fn run_batch(ctx: &ServiceContext, ids: Vec<UserId>) -> BatchOutcome {
        let server_version = ctx.store().state().server_version;

        let mut outcome = BatchOutcome {
            requested: ids.len(),
            ..BatchOutcome::default()
        };

        match PresenceFetcher::new(ctx)
            .fetch(server_version.as_deref(), &ids)
            .await
        {
            Ok(presences) => {
                outcome.delivered = presences.requested.len();
                outcome.report = ResultDistributor::new(ctx).distribute(&presences).await;
            }
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    error = %e,
                    dropped = ids.len(),
                    "Presence fetch failed"
                );
                outcome.error = Some(e);
            }
        }

        outcome
    }

    fn stop(&mut self) {
        if let Some(batch) = self.in_flight.take() {
            batch.task.abort();
            debug!("In-flight batch aborted");
        }
        self.backlog.clear();
        self.scheduler.cancel();
        self.subscriptions.cancel();
        info!(dropped = self.pending.len(), "Presence aggregator stopped");
    }
}
