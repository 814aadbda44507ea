//! Reconciler - 预约过期处理
//!
//! Background worker that owns the floor snapshot for a hosting view:
//!
//! 1. Loads the snapshot and reconciles once on start
//! 2. Every interval, completes seated reservations whose window has ended
//! 3. Reloads the snapshot once per pass when any completion succeeded
//! 4. Reloads on demand through [`ReconcilerHandle::reload`]
//!
//! Completions are best-effort: each one is sent independently and a
//! failure is logged and retried on a later pass.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use shared::ReservationId;
use shared::models::{Reservation, ReservationStatus};
use shared::types::Instant;

use crate::ClientError;
use crate::http::FloorApi;
use crate::snapshot::{FloorSnapshot, load_snapshot};

const COMMAND_BUFFER: usize = 1;

/// Source of "now"
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Ids already committed (or acknowledged by a 409) against a snapshot.
///
/// They are skipped instead of being sent again for as long as a snapshot
/// still shows them seated.
#[derive(Debug, Default)]
pub struct CompletionLedger {
    committed: HashSet<ReservationId>,
}

impl CompletionLedger {
    pub fn contains(&self, id: ReservationId) -> bool {
        self.committed.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Forget every id that `reservations` no longer shows as seated
    pub fn prune(&mut self, reservations: &[Reservation]) {
        self.committed.retain(|id| {
            reservations
                .iter()
                .any(|r| r.id == *id && r.status == ReservationStatus::Seated)
        });
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Expired seated reservations found in the snapshot
    pub selected: usize,
    /// Already committed earlier against the same snapshot
    pub skipped: usize,
    pub completed: usize,
    /// Answered `409 Conflict`: nothing changed on the server
    pub already_done: usize,
    pub failed: usize,
}

impl ReconcileReport {
    pub fn needs_reload(&self) -> bool {
        self.completed > 0
    }
}

/// Complete every seated reservation whose window ended before `now`.
///
/// Requests run concurrently and independently. A `409 Conflict` means the
/// reservation is already completed: it is not retried, and it does not ask
/// for a reload.
pub async fn reconcile_expired<A: FloorApi + ?Sized>(
    api: &A,
    reservations: &[Reservation],
    now: Instant,
    ledger: &mut CompletionLedger,
) -> ReconcileReport {
    let selected = shared::availability::select_expired(reservations, now);
    let mut report = ReconcileReport {
        selected: selected.len(),
        ..Default::default()
    };

    let pending: Vec<ReservationId> = selected
        .into_iter()
        .filter(|id| !ledger.contains(*id))
        .collect();
    report.skipped = report.selected - pending.len();

    if pending.is_empty() {
        return report;
    }

    tracing::info!(count = pending.len(), "Completing expired reservations");

    let results = join_all(pending.iter().map(|&id| async move {
        (id, api.set_reservation_status(id, ReservationStatus::Completed).await)
    }))
    .await;

    for (id, result) in results {
        match result {
            Ok(()) => {
                tracing::debug!(reservation_id = id, "Reservation completed");
                ledger.committed.insert(id);
                report.completed += 1;
            }
            Err(ClientError::Conflict(message)) => {
                tracing::debug!(reservation_id = id, reason = %message, "Reservation already completed");
                ledger.committed.insert(id);
                report.already_done += 1;
            }
            Err(e) => {
                tracing::warn!(reservation_id = id, error = %e, "Failed to complete reservation");
                report.failed += 1;
            }
        }
    }

    report
}

/// What the hosting view renders from
#[derive(Debug, Clone, Default)]
pub struct FloorState {
    pub snapshot: Arc<FloorSnapshot>,
    /// User-visible warning, set only when every collection failed to load
    pub warning: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reload,
}

/// Owned by the hosting view. Dropping it stops the worker.
#[derive(Debug)]
pub struct ReconcilerHandle {
    state_rx: watch::Receiver<FloorState>,
    commands: mpsc::Sender<Command>,
    shutdown: CancellationToken,
}

impl ReconcilerHandle {
    /// Latest published state
    pub fn current(&self) -> FloorState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<FloorState> {
        self.state_rx.clone()
    }

    /// User-triggered reload. Coalesced if one is already queued.
    pub fn reload(&self) {
        if self.commands.try_send(Command::Reload).is_err() {
            tracing::debug!("Reload already queued");
        }
    }

    /// Stop the worker. Results of in-flight calls are discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Reconciliation worker
pub struct Reconciler<A: FloorApi + ?Sized> {
    api: Arc<A>,
    interval: Duration,
    clock: Clock,
    shutdown: CancellationToken,
    state_tx: watch::Sender<FloorState>,
    commands: mpsc::Receiver<Command>,
    ledger: CompletionLedger,
    loaded: bool,
}

impl<A: FloorApi + ?Sized + 'static> Reconciler<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> (Self, ReconcilerHandle) {
        let (state_tx, state_rx) = watch::channel(FloorState::default());
        let (command_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let shutdown = CancellationToken::new();

        let worker = Self {
            api,
            interval,
            clock: Arc::new(shared::util::now_utc),
            shutdown: shutdown.clone(),
            state_tx,
            commands,
            ledger: CompletionLedger::default(),
            loaded: false,
        };
        let handle = ReconcilerHandle {
            state_rx,
            commands: command_tx,
            shutdown,
        };
        (worker, handle)
    }

    /// Replace the wall clock (tests, simulations)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Spawn the worker on the current runtime
    pub fn spawn(api: Arc<A>, interval: Duration) -> (ReconcilerHandle, JoinHandle<()>) {
        let (worker, handle) = Self::new(api, interval);
        (handle, tokio::spawn(worker.run()))
    }

    /// Run until cancelled or the handle is dropped
    pub async fn run(mut self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Reconciler started");

        // First tick fires immediately: initial load + reconcile
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    tracing::info!("Reconciler shutting down");
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(Command::Reload) => self.reload().await,
                    None => {
                        tracing::info!("Reconciler handle dropped, stopping");
                        break;
                    }
                },

                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// One interval pass
    async fn tick(&mut self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        if !self.loaded {
            self.reload().await;
            // discarded after shutdown
            if !self.loaded {
                return;
            }
        }

        let snapshot = self.state_tx.borrow().snapshot.clone();
        let now = (self.clock)();
        let report =
            reconcile_expired(&*self.api, &snapshot.reservations, now, &mut self.ledger)
                .await;

        if report.failed > 0 {
            tracing::warn!(
                failed = report.failed,
                completed = report.completed,
                "Some reservations could not be completed"
            );
        }
        if report.needs_reload() {
            self.reload().await;
        }
    }

    /// Fetch and publish a fresh snapshot, unless cancelled meanwhile
    async fn reload(&mut self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        let load = load_snapshot(&*self.api, (self.clock)()).await;
        if self.shutdown.is_cancelled() {
            tracing::debug!("Discarding snapshot loaded after shutdown");
            return;
        }

        self.loaded = true;
        self.ledger.prune(&load.snapshot.reservations);
        self.state_tx.send_replace(FloorState {
            snapshot: Arc::new(load.snapshot),
            warning: load.warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockApi, at, order, reservation, table};
    use shared::TableStatus;
    use shared::models::OrderStatus;

    fn fixed_clock(now: Instant) -> Clock {
        Arc::new(move || now)
    }

    fn expired_floor() -> MockApi {
        MockApi::with_floor(
            vec![table(1), table(2), table(3), table(4)],
            vec![order(1, 4, OrderStatus::Ready)],
            vec![
                reservation(10, 1, ReservationStatus::Seated, at(18, 0), at(20, 0)),
                reservation(11, 2, ReservationStatus::Seated, at(17, 30), at(19, 45)),
                reservation(12, 3, ReservationStatus::Seated, at(19, 0), at(21, 0)),
            ],
        )
    }

    #[tokio::test]
    async fn test_second_pass_on_same_snapshot_sends_nothing() {
        let api = expired_floor();
        let reservations = api.fetch_reservations().await.unwrap();
        let mut ledger = CompletionLedger::default();

        let first = reconcile_expired(&api, &reservations, at(20, 5), &mut ledger).await;
        assert_eq!(first.completed, 2);
        assert!(first.needs_reload());

        let second = reconcile_expired(&api, &reservations, at(20, 5), &mut ledger).await;
        assert_eq!(second.selected, 2);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.completed, 0);
        assert!(!second.needs_reload());
        assert_eq!(api.status_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_the_rest() {
        let api = expired_floor();
        api.fail_completion(10);
        let reservations = api.fetch_reservations().await.unwrap();
        let mut ledger = CompletionLedger::default();

        let report = reconcile_expired(&api, &reservations, at(20, 5), &mut ledger).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.completed, 1);
        assert!(ledger.contains(11));
        // The failed one is retried on the next pass
        assert!(!ledger.contains(10));
    }

    #[tokio::test]
    async fn test_conflict_is_accepted_without_reload() {
        let api = expired_floor();
        api.conflict_on(10);
        api.conflict_on(11);
        let reservations = api.fetch_reservations().await.unwrap();
        let mut ledger = CompletionLedger::default();

        let report = reconcile_expired(&api, &reservations, at(20, 5), &mut ledger).await;
        assert_eq!(report.completed, 0);
        assert_eq!(report.already_done, 2);
        assert_eq!(report.failed, 0);
        assert!(!report.needs_reload());
        assert!(ledger.contains(10) && ledger.contains(11));
    }

    #[tokio::test]
    async fn test_persistent_conflict_is_sent_once() {
        // Server answers 409 but keeps listing the reservation as seated
        let api = Arc::new(MockApi::with_floor(
            vec![table(1)],
            vec![],
            vec![reservation(10, 1, ReservationStatus::Seated, at(18, 0), at(20, 0))],
        ));
        api.conflict_on(10);
        let (worker, _handle) = Reconciler::new(api.clone(), Duration::from_secs(30));
        let mut worker = worker.with_clock(fixed_clock(at(20, 5)));

        for _ in 0..3 {
            worker.tick().await;
        }
        assert_eq!(api.reservation_fetches(), 1);
        assert_eq!(api.status_calls().len(), 1);
    }

    #[test]
    fn test_ledger_prune_keeps_only_still_seated() {
        let mut ledger = CompletionLedger::default();
        ledger.committed.extend([10, 11, 12]);

        ledger.prune(&[
            reservation(10, 1, ReservationStatus::Seated, at(18, 0), at(20, 0)),
            reservation(11, 2, ReservationStatus::Completed, at(18, 0), at(20, 0)),
        ]);

        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains(10));
        assert!(!ledger.contains(11));
        // 12 is gone from the listing altogether
        assert!(!ledger.contains(12));
    }

    #[tokio::test]
    async fn test_tick_reloads_once_after_multiple_completions() {
        let api = Arc::new(expired_floor());
        let (worker, handle) = Reconciler::new(api.clone(), Duration::from_secs(30));
        let mut worker = worker.with_clock(fixed_clock(at(20, 5)));

        worker.tick().await;
        // initial load + one reload after two completions
        assert_eq!(api.reservation_fetches(), 2);

        let state = handle.current();
        let board = state.snapshot.board(at(20, 5));
        let statuses: Vec<TableStatus> = board.iter().map(|v| v.status).collect();
        assert_eq!(
            statuses,
            vec![
                TableStatus::Free,
                TableStatus::Free,
                TableStatus::Occupied,
                TableStatus::Occupied,
            ]
        );
        assert!(state.snapshot.expired_reservations(at(20, 5)).is_empty());

        // Nothing left to do: no calls, no reload
        worker.tick().await;
        assert_eq!(api.reservation_fetches(), 2);
        assert_eq!(api.status_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_only_pass_does_not_reload() {
        let api = Arc::new(expired_floor());
        api.fail_completion(10);
        api.fail_completion(11);
        let (worker, _handle) = Reconciler::new(api.clone(), Duration::from_secs(30));
        let mut worker = worker.with_clock(fixed_clock(at(20, 5)));

        worker.tick().await;
        assert_eq!(api.reservation_fetches(), 1);
    }

    #[tokio::test]
    async fn test_all_collections_failing_sets_warning() {
        let api = Arc::new(MockApi::default());
        api.fail_collections(true, true, true);
        let (worker, handle) = Reconciler::new(api.clone(), Duration::from_secs(30));
        let mut worker = worker.with_clock(fixed_clock(at(12, 0)));

        worker.tick().await;
        assert!(handle.current().warning.is_some());
    }

    #[tokio::test]
    async fn test_run_publishes_and_stops_on_shutdown() {
        let api = Arc::new(expired_floor());
        let (worker, handle) = Reconciler::new(api.clone(), Duration::from_secs(3600));
        let worker = worker.with_clock(fixed_clock(at(20, 5)));
        let mut rx = handle.subscribe();
        let task = tokio::spawn(worker.run());

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("initial snapshot published")
            .unwrap();
        assert_eq!(rx.borrow().snapshot.tables.len(), 4);

        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("worker stopped")
            .unwrap();
    }

    #[tokio::test]
    async fn test_user_reload_publishes_new_snapshot() {
        let api = Arc::new(expired_floor());
        let (worker, handle) = Reconciler::new(api.clone(), Duration::from_secs(3600));
        let worker = worker.with_clock(fixed_clock(at(20, 5)));
        let mut rx = handle.subscribe();
        let task = tokio::spawn(worker.run());

        // initial load, then the reload after the two completions
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|state| {
                !state.snapshot.tables.is_empty()
                    && state.snapshot.expired_reservations(at(20, 5)).is_empty()
            }),
        )
        .await
        .expect("initial pass finished")
        .unwrap();
        assert_eq!(handle.current().snapshot.tables.len(), 4);
        assert_eq!(api.reservation_fetches(), 2);

        api.add_table(table(5));
        handle.reload();
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("reloaded snapshot published")
            .unwrap();
        assert_eq!(handle.current().snapshot.tables.len(), 5);
        assert_eq!(api.reservation_fetches(), 3);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_requests_are_coalesced() {
        let api = Arc::new(MockApi::default());
        let (mut worker, handle) = Reconciler::new(api, Duration::from_secs(3600));

        handle.reload();
        handle.reload();
        handle.reload();

        assert_eq!(worker.commands.try_recv(), Ok(Command::Reload));
        assert!(worker.commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_calls_after_shutdown() {
        let api = Arc::new(expired_floor());
        let (worker, handle) = Reconciler::new(api.clone(), Duration::from_secs(30));
        let mut worker = worker.with_clock(fixed_clock(at(20, 5)));

        handle.shutdown();
        worker.tick().await;
        worker.reload().await;

        assert_eq!(api.reservation_fetches(), 0);
        assert!(api.status_calls().is_empty());
        assert!(handle.current().snapshot.tables.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_loaded_after_shutdown_is_discarded() {
        let api = Arc::new(expired_floor());
        let (worker, handle) = Reconciler::new(api.clone(), Duration::from_secs(30));
        let mut worker = worker.with_clock(fixed_clock(at(20, 5)));
        // The view goes away while the load is in flight
        api.cancel_during_load(handle.shutdown.clone());

        worker.tick().await;

        assert_eq!(api.reservation_fetches(), 1);
        assert!(api.status_calls().is_empty());
        let state = handle.current();
        assert!(state.snapshot.tables.is_empty());
        assert!(state.warning.is_none());
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_worker() {
        let api = Arc::new(MockApi::default());
        let (handle, task) = Reconciler::spawn(api, Duration::from_secs(3600));
        drop(handle);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("worker stopped")
            .unwrap();
    }
}
