//! Background polling task and its handle

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::{Cadence, RentalFeed, RentalLists, Snapshot, SyncScope};
use crate::client::ClientError;

#[derive(Debug)]
enum SyncCommand {
    Refresh,
    Visibility(bool),
    Shutdown,
}

type FetchResult = (u64, Result<RentalLists, ClientError>);

/// Handle to a running [`SyncController`]
#[derive(Clone)]
pub struct SyncHandle {
    commands: mpsc::Sender<SyncCommand>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SyncHandle {
    /// Fetch now and poll fast for the burst window
    pub async fn trigger_refresh(&self) {
        self.send(SyncCommand::Refresh).await;
    }

    /// Suspend polling while hidden; becoming visible fetches once at once
    pub async fn set_visible(&self, visible: bool) {
        self.send(SyncCommand::Visibility(visible)).await;
    }

    pub async fn shutdown(&self) {
        self.send(SyncCommand::Shutdown).await;
    }

    /// Latest applied state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    async fn send(&self, command: SyncCommand) {
        if self.commands.send(command).await.is_err() {
            tracing::debug!("Sync controller already stopped");
        }
    }
}

/// Owns the rental lists of one user and keeps them fresh.
///
/// Every fetch gets a sequence number. Starting a fetch aborts the one in
/// flight, and a response is applied only if it is newer than the last
/// applied one. Hiding the view aborts the fetch in flight and discards any
/// response issued before it.
pub struct SyncController<F: RentalFeed> {
    feed: Arc<F>,
    scope: SyncScope,
    cadence: Cadence,
    visible: bool,
    issued: u64,
    applied: u64,
    /// Responses up to this sequence number are dropped unapplied
    discarded: u64,
    in_flight: Option<JoinHandle<()>>,
    results: mpsc::Sender<FetchResult>,
    snapshots: watch::Sender<Snapshot>,
}

impl<F: RentalFeed> SyncController<F> {
    /// Start polling for `scope`. A visible controller fetches immediately.
    pub fn spawn(
        feed: Arc<F>,
        scope: SyncScope,
        cadence: Cadence,
        visible: bool,
    ) -> (SyncHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (result_tx, result_rx) = mpsc::channel(8);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

        let controller = Self::new(feed, scope, cadence, visible, result_tx, snapshot_tx);
        let task = tokio::spawn(controller.run(command_rx, result_rx));

        (
            SyncHandle {
                commands: command_tx,
                snapshots: snapshot_rx,
            },
            task,
        )
    }

    fn new(
        feed: Arc<F>,
        scope: SyncScope,
        cadence: Cadence,
        visible: bool,
        results: mpsc::Sender<FetchResult>,
        snapshots: watch::Sender<Snapshot>,
    ) -> Self {
        Self {
            feed,
            scope,
            cadence,
            visible,
            issued: 0,
            applied: 0,
            discarded: 0,
            in_flight: None,
            results,
            snapshots,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SyncCommand>,
        mut results: mpsc::Receiver<FetchResult>,
    ) {
        tracing::info!(
            user_id = %self.scope.user_id,
            seller = self.scope.owner_username.is_some(),
            "Rental sync started"
        );
        let mut next_due = Instant::now();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SyncCommand::Refresh) => {
                        let now = Instant::now();
                        self.cadence.trigger(now);
                        if self.visible {
                            self.fetch();
                            next_due = self.cadence.next_due(now);
                        }
                    }
                    Some(SyncCommand::Visibility(visible)) => {
                        let was_visible = std::mem::replace(&mut self.visible, visible);
                        if visible && !was_visible {
                            let now = Instant::now();
                            self.fetch();
                            next_due = self.cadence.next_due(now);
                        } else if !visible && was_visible {
                            self.cancel_in_flight();
                            tracing::debug!("View hidden, polling suspended");
                        }
                    }
                    Some(SyncCommand::Shutdown) | None => break,
                },
                Some((seq, result)) = results.recv() => self.apply(seq, result),
                _ = sleep_until(next_due), if self.visible => {
                    let now = Instant::now();
                    self.fetch();
                    next_due = self.cadence.next_due(now);
                }
            }
        }

        if let Some(fetch) = self.in_flight.take() {
            fetch.abort();
        }
        tracing::info!(user_id = %self.scope.user_id, "Rental sync stopped");
    }

    fn fetch(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
        self.issued += 1;
        let seq = self.issued;

        let feed = self.feed.clone();
        let scope = self.scope.clone();
        let results = self.results.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = fetch_lists(feed.as_ref(), &scope).await;
            let _ = results.send((seq, result)).await;
        }));
    }

    fn cancel_in_flight(&mut self) {
        if let Some(fetch) = self.in_flight.take() {
            fetch.abort();
        }
        // a finished fetch may already be queued in `results`
        self.discarded = self.issued;
    }

    fn apply(&mut self, seq: u64, result: Result<RentalLists, ClientError>) {
        if seq <= self.applied {
            tracing::debug!(seq, applied = self.applied, "Dropping stale rental response");
            return;
        }
        if seq <= self.discarded {
            tracing::debug!(seq, "Dropping response fetched before the view was hidden");
            return;
        }

        match result {
            Ok(lists) => {
                self.applied = seq;
                self.snapshots.send_replace(Snapshot {
                    seq,
                    lists,
                    fetched_at: Some(Utc::now()),
                });
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Rental sync failed, retrying on next tick");
            }
        }
    }
}

async fn fetch_lists<F: RentalFeed>(
    feed: &F,
    scope: &SyncScope,
) -> Result<RentalLists, ClientError> {
    match &scope.owner_username {
        Some(username) => {
            let (as_renter, as_owner) = tokio::try_join!(
                feed.renter_rentals(scope.user_id),
                feed.owner_rentals(username)
            )?;
            Ok(RentalLists {
                as_renter,
                as_owner,
            })
        }
        None => Ok(RentalLists {
            as_renter: feed.renter_rentals(scope.user_id).await?,
            as_owner: Vec::new(),
        }),
    }
}
