// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: drains the pending queue against the remote submitter.
//!
//! One drain pass runs at a time. A pass walks the queue oldest first and
//! attempts every eligible entry sequentially, so at most one submission is
//! outstanding. Per entry:
//!
//! 1. Entries at the retry ceiling are skipped
//! 2. Connectivity is re-checked; offline aborts the rest of the pass
//! 3. The attempt is charged (`attempts + 1`, `lastAttemptAt`) before submitting,
//!    against the stored count; an entry that reached the ceiling meanwhile
//!    is skipped
//! 4. Success removes the entry; failure records `lastError`
//! 5. The pass moves on regardless of the outcome
//!
//! Passes are started by connectivity coming back (after a settle delay), by
//! a periodic tick, or manually. A trigger that arrives mid-pass is dropped.
//! With a [`SyncLock`] that also holds for passes in other processes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ob_core::clock::{self, ClockSource};
use ob_core::{
    EntryPatch, EntryQueue, Error, PendingEntry, Result, ServerRecord, MAX_RETRY_ATTEMPTS,
};
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::connectivity::ConnectivityMonitor;
use super::lock::SyncLock;
use super::submitter::Submitter;

/// Configuration for the sync coordinator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Attempts after which an entry waits for manual action.
    pub max_attempts: u32,
    /// Wait after reconnecting before syncing, to ride out flapping.
    pub settle_delay: Duration,
    /// Period of the background sync tick.
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_attempts: MAX_RETRY_ATTEMPTS,
            settle_delay: Duration::from_secs(2),
            interval: Duration::from_secs(30),
        }
    }
}

/// Whether a drain pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Syncing => write!(f, "syncing"),
        }
    }
}

/// What asked for a drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Connectivity came back and stayed up for the settle delay.
    Online,
    /// Periodic timer.
    Tick,
    /// Explicit user request.
    Manual,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTrigger::Online => write!(f, "online"),
            SyncTrigger::Tick => write!(f, "tick"),
            SyncTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Tally of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Entries whose submission was attempted.
    pub attempted: usize,
    /// Attempts that succeeded (entry removed).
    pub succeeded: usize,
    /// Attempts that failed with retries left.
    pub failed: usize,
    /// Attempts that failed and hit the retry ceiling.
    pub exhausted: usize,
    /// Entries not attempted: at the ceiling, or discarded mid-pass.
    pub skipped: usize,
    /// The pass stopped early because connectivity dropped.
    pub aborted: bool,
}

/// Result of asking for a drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Offline: the pass did not start.
    Offline,
    /// Nothing queued.
    Empty,
    /// Another pass is running; this trigger was dropped.
    Busy,
    /// A pass ran to completion or was aborted by a disconnect.
    Completed(PassReport),
}

impl SyncOutcome {
    /// The pass report, if a pass ran.
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            SyncOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of a single submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Submitted; the entry was removed.
    Succeeded(ServerRecord),
    /// Failed with retries left.
    Failed { message: String },
    /// Failed and reached the retry ceiling.
    Exhausted { message: String },
    /// The entry was removed by someone else before its result was recorded.
    Discarded,
    /// The entry reached the retry ceiling before it could be charged.
    Skipped,
}

/// Snapshot of what a UI needs for its sync indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub online: bool,
    pub syncing: bool,
    /// Entries in the queue, eligible or not.
    pub pending: usize,
    /// Entries at the retry ceiling.
    pub needs_attention: usize,
}

/// Receives per-entry sync results.
pub trait SyncObserver: Send + Sync {
    /// An entry was accepted by the server.
    fn on_sync_success(&self, record: &ServerRecord);

    /// An entry failed and reached the retry ceiling. Fired once per
    /// exhaustion so the caller can offer retry or discard.
    fn on_sync_error(&self, message: &str, entry: &PendingEntry);

    /// An entry failed but will be retried automatically.
    fn on_attempt_failed(&self, _message: &str, _entry: &PendingEntry) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_sync_success(&self, _record: &ServerRecord) {}
    fn on_sync_error(&self, _message: &str, _entry: &PendingEntry) {}
}

/// Publishes `Syncing` for its lifetime, `Idle` when dropped.
struct SyncingGuard<'a> {
    state: &'a watch::Sender<SyncState>,
}

impl<'a> SyncingGuard<'a> {
    fn enter(state: &'a watch::Sender<SyncState>) -> Self {
        state.send_replace(SyncState::Syncing);
        SyncingGuard { state }
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(SyncState::Idle);
    }
}

/// Drives drain passes of a queue against a submitter.
pub struct SyncCoordinator<Q: EntryQueue, S: Submitter> {
    queue: Arc<Q>,
    submitter: Arc<S>,
    monitor: ConnectivityMonitor,
    config: SyncConfig,
    observer: Arc<dyn SyncObserver>,
    clock: Arc<dyn ClockSource>,
    state: watch::Sender<SyncState>,
    /// Held for the whole of a pass or manual retry.
    pass_lock: Mutex<()>,
    /// Claimed alongside `pass_lock` when other processes share the queue.
    sync_lock: Option<SyncLock>,
}

impl<Q: EntryQueue, S: Submitter> SyncCoordinator<Q, S> {
    pub fn new(
        queue: Arc<Q>,
        submitter: Arc<S>,
        monitor: ConnectivityMonitor,
        config: SyncConfig,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        SyncCoordinator {
            queue,
            submitter,
            monitor,
            config,
            observer: Arc::new(NoopObserver),
            clock: clock::system(),
            state,
            pass_lock: Mutex::new(()),
            sync_lock: None,
        }
    }

    /// Set the observer notified of per-entry results.
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the clock used for `lastAttemptAt`.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Also claim `lock` for every pass and retry.
    pub fn with_sync_lock(mut self, lock: SyncLock) -> Self {
        self.sync_lock = Some(lock);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Current pass state.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn is_syncing(&self) -> bool {
        self.state() == SyncState::Syncing
    }

    /// Async view of the pass state, for UIs that render a sync indicator.
    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Number of queued entries, eligible or not.
    pub async fn pending_count(&self) -> Result<usize> {
        self.queue.count().await
    }

    /// All queued entries, oldest first.
    pub async fn pending_entries(&self) -> Result<Vec<PendingEntry>> {
        self.queue.list().await
    }

    /// Snapshot for status indicators.
    pub async fn status(&self) -> Result<SyncStatus> {
        let entries = self.queue.list().await?;
        let needs_attention = entries
            .iter()
            .filter(|e| !e.is_eligible(self.config.max_attempts))
            .count();
        Ok(SyncStatus {
            online: self.monitor.is_online(),
            syncing: self.is_syncing(),
            pending: entries.len(),
            needs_attention,
        })
    }

    /// Run a drain pass now if online, idle, and something is queued.
    ///
    /// Storage errors abort the pass and are returned; submission failures
    /// are recorded on their entries and never surface here.
    pub async fn trigger(&self, trigger: SyncTrigger) -> Result<SyncOutcome> {
        if !self.monitor.is_online() {
            tracing::debug!(%trigger, "offline, not syncing");
            return Ok(SyncOutcome::Offline);
        }
        let Ok(_pass) = self.pass_lock.try_lock() else {
            tracing::debug!(%trigger, "sync already running, trigger dropped");
            return Ok(SyncOutcome::Busy);
        };
        let _claim = match &self.sync_lock {
            Some(lock) => match lock.try_claim()? {
                Some(claim) => Some(claim),
                None => {
                    tracing::debug!(%trigger, "sync running in another process, trigger dropped");
                    return Ok(SyncOutcome::Busy);
                }
            },
            None => None,
        };
        if self.queue.count().await? == 0 {
            return Ok(SyncOutcome::Empty);
        }

        let _syncing = SyncingGuard::enter(&self.state);
        let report = self.drain(trigger).await?;
        Ok(SyncOutcome::Completed(report))
    }

    /// Manual sync request.
    pub async fn sync_now(&self) -> Result<SyncOutcome> {
        self.trigger(SyncTrigger::Manual).await
    }

    /// Reset an entry's attempts and error, then attempt it once.
    ///
    /// Bypasses the retry ceiling for this one attempt; afterwards the entry
    /// is subject to the normal rules again. Waits for a running pass to
    /// finish first. Fails with `EntryNotFound` for unknown ids.
    pub async fn retry_entry(&self, id: &str) -> Result<AttemptOutcome> {
        let _pass = self.pass_lock.lock().await;
        let _claim = match &self.sync_lock {
            Some(lock) => Some(lock.claim().await?),
            None => None,
        };
        let _syncing = SyncingGuard::enter(&self.state);

        self.queue.update(id, EntryPatch::reset()).await?;
        tracing::info!(id, "manual retry");
        self.attempt(id).await
    }

    /// Discard an entry without submitting it. Missing ids are not an error.
    pub async fn remove_pending(&self, id: &str) -> Result<bool> {
        let removed = self.queue.remove(id).await?;
        if removed {
            tracing::info!(id, "discarded pending entry");
        }
        Ok(removed)
    }

    async fn drain(&self, trigger: SyncTrigger) -> Result<PassReport> {
        let entries = self.queue.list().await?;
        let mut report = PassReport::default();
        tracing::info!(%trigger, entries = entries.len(), "sync pass started");

        for entry in entries {
            if !entry.is_eligible(self.config.max_attempts) {
                report.skipped += 1;
                continue;
            }
            if !self.monitor.is_online() {
                tracing::info!("connectivity lost, aborting sync pass");
                report.aborted = true;
                break;
            }

            match self.attempt(&entry.id).await? {
                AttemptOutcome::Succeeded(_) => {
                    report.attempted += 1;
                    report.succeeded += 1;
                }
                AttemptOutcome::Failed { .. } => {
                    report.attempted += 1;
                    report.failed += 1;
                }
                AttemptOutcome::Exhausted { .. } => {
                    report.attempted += 1;
                    report.exhausted += 1;
                }
                AttemptOutcome::Discarded | AttemptOutcome::Skipped => report.skipped += 1,
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            exhausted = report.exhausted,
            skipped = report.skipped,
            aborted = report.aborted,
            "sync pass finished"
        );
        Ok(report)
    }

    async fn attempt(&self, id: &str) -> Result<AttemptOutcome> {
        // Charge first: a crash mid-submit must still count against the ceiling.
        let charged = self
            .queue
            .charge(id, self.config.max_attempts, self.clock.now())
            .await;
        let entry = match charged {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::debug!(id, "entry reached the retry ceiling, skipped");
                return Ok(AttemptOutcome::Skipped);
            }
            Err(Error::EntryNotFound(_)) => {
                tracing::debug!(id, "entry discarded before attempt");
                return Ok(AttemptOutcome::Discarded);
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(id = %entry.id, attempt = entry.attempts, "submitting entry");
        match self.submitter.submit(entry.payload.clone()).await {
            Ok(record) => {
                self.queue.remove(&entry.id).await?;
                tracing::debug!(id = %entry.id, record = %record.id, "entry synced");
                self.observer.on_sync_success(&record);
                Ok(AttemptOutcome::Succeeded(record))
            }
            Err(err) => {
                let message = err.to_string();
                let entry = match self
                    .queue
                    .update(&entry.id, EntryPatch::failure(message.as_str()))
                    .await
                {
                    Ok(entry) => entry,
                    Err(Error::EntryNotFound(_)) => return Ok(AttemptOutcome::Discarded),
                    Err(e) => return Err(e),
                };

                if entry.attempts >= self.config.max_attempts {
                    tracing::warn!(id = %entry.id, attempts = entry.attempts, error = %message, "entry needs attention");
                    self.observer.on_sync_error(&message, &entry);
                    Ok(AttemptOutcome::Exhausted { message })
                } else {
                    tracing::debug!(id = %entry.id, attempts = entry.attempts, error = %message, "attempt failed");
                    self.observer.on_attempt_failed(&message, &entry);
                    Ok(AttemptOutcome::Failed { message })
                }
            }
        }
    }
}

impl<Q, S> SyncCoordinator<Q, S>
where
    Q: EntryQueue + 'static,
    S: Submitter + 'static,
{
    /// Event loop: periodic ticks and settled reconnects start passes.
    ///
    /// The first tick fires immediately. Returns once `cancel` fires and any
    /// running pass has finished.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut online = self.monitor.watch();
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut settle_deadline: Option<Instant> = None;

        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "sync loop started"
        );

        loop {
            let deadline = settle_deadline;
            let settled = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if self.monitor.is_online() {
                        self.spawn_trigger(SyncTrigger::Tick);
                    }
                }
                changed = online.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let is_online = *online.borrow_and_update();
                    settle_deadline = is_online.then(|| Instant::now() + self.config.settle_delay);
                }
                _ = settled => {
                    settle_deadline = None;
                    self.spawn_trigger(SyncTrigger::Online);
                }
            }
        }

        let _drained = self.pass_lock.lock().await;
        tracing::info!("sync loop stopped");
    }

    fn spawn_trigger(self: &Arc<Self>, trigger: SyncTrigger) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.trigger(trigger).await {
                Ok(outcome) => tracing::trace!(%trigger, ?outcome, "trigger handled"),
                Err(e) => tracing::error!(%trigger, error = %e, "sync pass failed"),
            }
        });
    }
}
