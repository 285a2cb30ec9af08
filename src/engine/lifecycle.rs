// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Engine lifecycle management: start, run loop, shutdown.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::note::Note;
use crate::state::{INITIALIZED_KEY, VISITED_KEY};
use crate::time::Timestamp;

use super::{PullOutcome, SyncEngine, SyncError, SyncOutcome, SyncState, SyncTrigger};

/// Notes created on the very first launch of an installation.
const EXAMPLE_NOTES: [(&str, &str, &str); 3] = [
    ("example_1", "Welcome to Notes App", "This is your first note!"),
    ("example_2", "Click to Expand", "Notes work like spoilers - click me!"),
    ("example_3", "Creating New Notes", "Use the + button to add notes."),
];

impl SyncEngine {
    /// Seed example notes once per installation.
    ///
    /// Flow:
    /// 1. `notesAppInitialized` set → nothing to do
    /// 2. First visit (`hasVisitedBefore` unset) → mark visited, and if the
    ///    remote collection is empty create the example notes directly
    /// 3. Set `notesAppInitialized`
    ///
    /// Without a state store there is nowhere to remember this, so nothing
    /// is seeded.
    #[tracing::instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        let Some(state) = self.state_store.as_ref() else {
            debug!("No state store, skipping first-run seeding");
            return Ok(());
        };

        if state.is_set(INITIALIZED_KEY).await? {
            return Ok(());
        }

        if !state.is_set(VISITED_KEY).await? {
            state.set_flag(VISITED_KEY).await?;

            if self.config.seed_examples && self.remote.list().await.is_empty() {
                let created_at = Timestamp::now();
                for (id, title, description) in EXAMPLE_NOTES {
                    let note = Note::with_id(id, title, description, created_at.clone());
                    if self.remote.create(&note).await.is_none() {
                        warn!(id, "Failed to seed example note");
                    }
                }
                info!(count = EXAMPLE_NOTES.len(), "Seeded example notes");
            }
        }

        state.set_flag(INITIALIZED_KEY).await?;
        Ok(())
    }

    /// Seed on first run, then hydrate the cache from the remote.
    ///
    /// An unreachable remote leaves the cache empty; the periodic sync
    /// fills it in later.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<(), SyncError> {
        info!(remote = self.remote.store().name(), "Starting notes sync engine");
        self.bootstrap().await?;

        match self.pull().await {
            Some(PullOutcome::Failed(e)) => warn!(error = %e, "Initial load failed, starting empty"),
            Some(_) => info!(notes = self.cache.lock().len(), "Notes loaded"),
            None => debug!("Initial load skipped, sync already running"),
        }
        self.publish_gauges();
        self.set_state(SyncState::Idle);
        Ok(())
    }

    /// Run the timers until [`shutdown()`](Self::shutdown).
    ///
    /// One loop owns every trigger:
    /// - mutation signal → (re)arm the debounce
    /// - debounce deadline → full sync
    /// - backoff deadline → full sync after a failed drain
    /// - periodic tick → full sync
    ///
    /// A sync in progress runs to completion; shutdown is seen on the next
    /// turn of the loop. Nothing is flushed on the way out.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) {
        let mut shutdown_rx = self.shutdown.subscribe();
        if *shutdown_rx.borrow_and_update() {
            self.set_state(SyncState::Stopped);
            return;
        }

        self.set_state(SyncState::Idle);
        info!(
            debounce_ms = self.config.debounce_ms,
            periodic_ms = self.config.periodic_sync_ms,
            "Sync engine running"
        );

        let debounce = sleep(self.config.debounce());
        tokio::pin!(debounce);
        let mut debounce_armed = false;

        let retry = sleep(self.backoff.initial_delay);
        tokio::pin!(retry);
        let mut retry_armed = false;

        let period = self.config.periodic_interval();
        let mut periodic = interval_at(Instant::now() + period, period);
        periodic.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }

                _ = self.mutation_signal.notified() => {
                    debounce.as_mut().reset(Instant::now() + self.config.debounce());
                    debounce_armed = true;
                    continue;
                }

                _ = &mut debounce, if debounce_armed => {
                    debounce_armed = false;
                    SyncTrigger::Debounce
                }

                _ = &mut retry, if retry_armed => {
                    retry_armed = false;
                    SyncTrigger::Backoff
                }

                _ = periodic.tick() => SyncTrigger::Periodic,
            };

            if let SyncOutcome::Completed { drain, .. } = self.full_sync(trigger).await {
                let failures = self.consecutive_failures.load(Ordering::Acquire);
                if drain.failed.is_some() && failures > 0 {
                    let delay = self.backoff.delay_for(failures);
                    debug!(failures, delay_ms = delay.as_millis() as u64, "Retry scheduled");
                    retry.as_mut().reset(Instant::now() + delay);
                    retry_armed = true;
                } else {
                    retry_armed = false;
                }
            }
        }

        self.set_state(SyncState::Stopped);
        info!(pending = self.pending_operations(), "Sync engine stopped");
    }

    /// Spawn [`run()`](Self::run) on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run().await })
    }

    /// Signal the run loop to stop.
    ///
    /// Returns immediately. Pending operations stay queued in memory.
    pub fn shutdown(&self) {
        info!(pending = self.pending_operations(), "Initiating sync engine shutdown...");
        self.shutdown.send_replace(true);
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }
}
