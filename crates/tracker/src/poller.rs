//! Timer-driven status polling for in-flight tasks.
//!
//! [`StatusPoller`] is a two-state machine (`Idle` / `Active`). Arming it
//! spawns one loop task that ticks on a fixed period; each tick fetches
//! the status of every `WAITING` / `PROCESSING` task concurrently, then
//! commits all results to the [`TaskRegistry`] in a single merge. The loop
//! disarms itself once a tick finds no active tasks.
//!
//! At most one loop is live at a time: [`StatusPoller::start`] cancels the
//! previous loop before arming a new one, and each loop carries a
//! generation number so a superseded loop can never clear its successor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use ocrdesk_client::OcrService;
use ocrdesk_core::task::OcrTask;

use crate::events::TrackerEvent;
use crate::registry::TaskRegistry;

/// Period between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// How long [`StatusPoller::shutdown`] waits for the loop task to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No timer armed.
    Idle,
    /// Timer armed; a tick is scheduled or in progress.
    Active,
}

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No task was in a non-terminal state; nothing was fetched.
    Idle,
    /// Status was fetched for `fetched` tasks; `updated` records were
    /// replaced and `failed` fetches left their task untouched.
    Merged {
        fetched: usize,
        updated: usize,
        failed: usize,
    },
}

/// Run a single poll tick against the registry.
///
/// Fetches run concurrently and independently; a failed fetch keeps that
/// task's previous record and never affects its siblings. Results are
/// committed once, after every fetch has settled.
pub async fn poll_once(registry: &TaskRegistry, service: &dyn OcrService) -> TickOutcome {
    let active = registry.active_tasks();
    if active.is_empty() {
        return TickOutcome::Idle;
    }

    let fetched = active.len();
    let results = join_all(active.into_iter().map(|task| fetch_task(service, task))).await;

    let mut failed = 0;
    let mut updates = HashMap::with_capacity(fetched);
    for result in results {
        match result {
            Some(task) => {
                updates.insert(task.task_id.clone(), task);
            }
            None => failed += 1,
        }
    }

    let updated = registry.merge(updates);
    TickOutcome::Merged {
        fetched,
        updated,
        failed,
    }
}

/// Fetch one task's status and merge it onto a copy of the task.
///
/// Returns `None` on any failure so the caller keeps the prior record.
async fn fetch_task(service: &dyn OcrService, task: OcrTask) -> Option<OcrTask> {
    match service.task_status(&task.task_id).await {
        Ok(update) => {
            if update.status != task.status {
                tracing::debug!(
                    task_id = %task.task_id,
                    from = %task.status,
                    to = %update.status,
                    "Task status changed",
                );
            }
            Some(task.merged_with(update))
        }
        Err(e) => {
            tracing::warn!(
                task_id = %task.task_id,
                error = %e,
                "Status fetch failed, keeping previous state",
            );
            None
        }
    }
}

/// Owner of the recurring poll loop.
///
/// Dropping the poller disarms it, so the loop never outlives its owner.
/// [`start`](Self::start) must be called from within a tokio runtime.
pub struct StatusPoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    registry: Arc<TaskRegistry>,
    service: Arc<dyn OcrService>,
    interval: Duration,
    /// The currently armed loop, if any.
    slot: Mutex<Option<ArmedLoop>>,
    generation: AtomicU64,
    state_tx: watch::Sender<PollerState>,
    event_tx: broadcast::Sender<TrackerEvent>,
}

struct ArmedLoop {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    pub fn new(
        registry: Arc<TaskRegistry>,
        service: Arc<dyn OcrService>,
        interval: Duration,
        event_tx: broadcast::Sender<TrackerEvent>,
    ) -> Self {
        let (state_tx, _) = watch::channel(PollerState::Idle);
        Self {
            inner: Arc::new(PollerInner {
                registry,
                service,
                interval,
                slot: Mutex::new(None),
                generation: AtomicU64::new(0),
                state_tx,
                event_tx,
            }),
        }
    }

    /// Arm the timer. If a loop is already running it is cancelled first.
    pub fn start(&self) {
        let mut slot = self.inner.lock_slot();
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            tracing::debug!(generation = previous.generation, "Cancelled previous poll loop");
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run_poll_loop(&inner, generation, &loop_cancel).await;
        });

        *slot = Some(ArmedLoop {
            generation,
            cancel,
            handle,
        });
        self.inner.state_tx.send_replace(PollerState::Active);
        drop(slot);

        tracing::info!(
            generation,
            interval = ?self.inner.interval,
            "Status poller armed",
        );
        let _ = self.inner.event_tx.send(TrackerEvent::PollerArmed);
    }

    /// Disarm the timer. Returns `false` if it was not armed.
    pub fn stop(&self) -> bool {
        self.inner.disarm(None).is_some()
    }

    /// Disarm the timer and wait for the loop task to exit.
    pub async fn shutdown(&self) {
        if let Some(armed) = self.inner.disarm(None) {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, armed.handle)
                .await
                .is_err()
            {
                tracing::warn!("Poll loop did not exit within the shutdown timeout");
            }
        }
    }

    pub fn state(&self) -> PollerState {
        *self.inner.state_tx.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == PollerState::Active
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PollerState> {
        self.inner.state_tx.subscribe()
    }

    /// Resolve once the poller is idle (immediately if it already is).
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.state_tx.subscribe();
        let _ = rx.wait_for(|state| *state == PollerState::Idle).await;
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.inner.disarm(None);
    }
}

impl PollerInner {
    fn lock_slot(&self) -> MutexGuard<'_, Option<ArmedLoop>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the slot and cancel its loop.
    ///
    /// With `Some(generation)` the slot is only cleared if it still holds
    /// that generation, which is how a loop disarms itself.
    fn disarm(&self, generation: Option<u64>) -> Option<ArmedLoop> {
        let mut slot = self.lock_slot();
        let owned = match (slot.as_ref(), generation) {
            (Some(armed), Some(g)) => armed.generation == g,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !owned {
            return None;
        }

        let armed = slot.take()?;
        armed.cancel.cancel();
        self.state_tx.send_replace(PollerState::Idle);
        drop(slot);

        tracing::info!(generation = armed.generation, "Status poller disarmed");
        let _ = self.event_tx.send(TrackerEvent::PollerDisarmed);
        Some(armed)
    }
}

/// Tick on a fixed period until cancelled or until no task is active.
///
/// Ticks never overlap: each tick is awaited before the next one is
/// scheduled, and late ticks are delayed rather than bunched.
async fn run_poll_loop(inner: &PollerInner, generation: u64, cancel: &CancellationToken) {
    let period = inner.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return,
            outcome = poll_once(&inner.registry, inner.service.as_ref()) => outcome,
        };

        match outcome {
            TickOutcome::Idle => {
                tracing::info!(generation, "No active tasks left, stopping poll loop");
                inner.disarm(Some(generation));
                return;
            }
            TickOutcome::Merged {
                fetched,
                updated,
                failed,
            } => {
                tracing::debug!(generation, fetched, updated, failed, "Poll tick committed");
                let _ = inner.event_tx.send(TrackerEvent::TickCompleted {
                    fetched,
                    updated,
                    failed,
                });
            }
        }
    }
}
