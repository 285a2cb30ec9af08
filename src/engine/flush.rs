// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Queue draining and reconciliation pulls.
//!
//! Both run under the [`DrainLock`](crate::queue::DrainLock): a drain, a
//! pull or a full sync (drain then pull) never overlaps another. A caller
//! that finds the lock held returns immediately instead of waiting.

use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use crate::metrics::LatencyTimer;
use crate::note::Note;
use crate::policy;
use crate::queue::{Mutation, Operation};
use crate::remote::RemoteError;

use super::{
    CacheEvent, DeliveryFailure, DrainReport, PullOutcome, SyncEngine, SyncOutcome, SyncState,
    SyncTrigger,
};

impl SyncEngine {
    /// Deliver queued operations oldest first.
    ///
    /// Stops at the first failed delivery, which goes back to the head of
    /// the queue. Returns `None` if another sync holds the lock.
    #[tracing::instrument(skip(self))]
    pub async fn drain(&self) -> Option<DrainReport> {
        let Some(_guard) = self.drain_lock.try_acquire() else {
            debug!("Sync already in progress, skipping drain");
            crate::metrics::record_drain_skipped();
            return None;
        };
        Some(self.drain_locked().await)
    }

    /// Fetch the remote collection and reconcile the cache with it.
    ///
    /// Returns `None` if another sync holds the lock.
    #[tracing::instrument(skip(self))]
    pub async fn pull(&self) -> Option<PullOutcome> {
        let Some(_guard) = self.drain_lock.try_acquire() else {
            debug!("Sync already in progress, skipping pull");
            return None;
        };
        Some(self.pull_locked().await)
    }

    /// Drain, then pull, under one lock acquisition.
    pub(super) async fn full_sync(&self, trigger: SyncTrigger) -> SyncOutcome {
        let Some(_guard) = self.drain_lock.try_acquire() else {
            debug!(trigger = trigger.as_str(), "Sync already in progress, skipping");
            crate::metrics::record_drain_skipped();
            return SyncOutcome::Skipped;
        };

        let _timer = LatencyTimer::new("full_sync");
        debug!(
            trigger = trigger.as_str(),
            pending = self.pending_operations(),
            "Running full sync"
        );

        let drain = self.drain_locked().await;
        let pull = self.pull_locked().await;
        SyncOutcome::Completed { drain, pull }
    }

    async fn drain_locked(&self) -> DrainReport {
        let _timer = LatencyTimer::new("drain");
        self.set_state(SyncState::Draining);

        let mut delivered = 0;
        let mut failed = None;

        loop {
            let next = self.queue.lock().dequeue_oldest();
            let Some(op) = next else { break };
            let kind = op.kind();

            match self.deliver(&op).await {
                Ok(()) => {
                    delivered += 1;
                    crate::metrics::record_delivery(kind, "success");
                    debug!(%kind, id = op.note_id(), "Synced operation");
                }
                Err(error) => {
                    crate::metrics::record_delivery(kind, "error");
                    warn!(%kind, id = op.note_id(), error = %error, "Sync failed, operation requeued");
                    failed = Some(DeliveryFailure {
                        kind,
                        note_id: op.note_id().to_string(),
                        error,
                    });
                    self.queue.lock().requeue_front(op);
                    break;
                }
            }
        }

        let failures = if failed.is_some() {
            self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1
        } else {
            self.consecutive_failures.store(0, Ordering::Release);
            0
        };
        crate::metrics::set_consecutive_failures(failures);

        let remaining = self.pending_operations();
        self.publish_gauges();
        self.set_state(SyncState::Idle);

        if delivered > 0 || failed.is_some() {
            info!(delivered, remaining, failures, "Drain pass finished");
        }
        DrainReport {
            delivered,
            failed,
            remaining,
        }
    }

    /// Dispatch one operation by kind.
    ///
    /// Updates are PUTs: a note the remote never received is created
    /// instead. Deleting a note the remote no longer has is done.
    async fn deliver(&self, op: &Operation) -> Result<(), RemoteError> {
        let store = self.remote.store();
        match op.mutation() {
            Mutation::Create(note) => store.create(note).await.map(|_| ()),
            Mutation::Update(note) => match store.update(op.note_id(), note).await {
                Ok(_) => Ok(()),
                Err(RemoteError::NotFound(_)) => {
                    debug!(id = op.note_id(), "Update target missing on remote, creating");
                    store.create(note).await.map(|_| ())
                }
                Err(e) => Err(e),
            },
            Mutation::Delete => match store.delete(op.note_id()).await {
                Ok(()) | Err(RemoteError::NotFound(_)) => Ok(()),
                Err(e) => Err(e),
            },
        }
    }

    async fn pull_locked(&self) -> PullOutcome {
        let _timer = LatencyTimer::new("pull");
        self.set_state(SyncState::Pulling);

        let outcome = match self.remote.fetch_all().await {
            Ok(remote_notes) => self.reconcile(remote_notes),
            Err(error) => {
                warn!(error = %error, "Error pulling updates, keeping local cache");
                crate::metrics::record_pull("failed");
                PullOutcome::Failed(error)
            }
        };

        self.set_state(SyncState::Idle);
        outcome
    }

    /// Replace the cache with the remote snapshot if they differ.
    ///
    /// Operations still queued are replayed over the snapshot first, so a
    /// pull never hides a local change that has not been delivered yet.
    fn reconcile(&self, remote_notes: Vec<Note>) -> PullOutcome {
        let replaced = {
            let mut cache = self.cache.lock();
            let rebased = {
                let queue = self.queue.lock();
                policy::dedup_by_id(rebase(remote_notes, queue.iter()))
            };

            if policy::snapshots_equal(cache.as_slice(), &rebased) {
                None
            } else {
                cache.replace_all(rebased);
                cache.sort();
                Some(cache.len())
            }
        };

        match replaced {
            None => {
                debug!("No changes from remote detected");
                crate::metrics::record_pull("unchanged");
                PullOutcome::Unchanged
            }
            Some(total) => {
                info!(total, "Cache updated with remote changes");
                crate::metrics::record_pull("changed");
                self.notify(CacheEvent::Reconciled { total });
                self.publish_gauges();
                PullOutcome::Reconciled { total }
            }
        }
    }
}

/// Apply pending operations, oldest first, on top of a remote snapshot.
fn rebase<'a>(mut notes: Vec<Note>, pending: impl Iterator<Item = &'a Operation>) -> Vec<Note> {
    for op in pending {
        match op.mutation() {
            Mutation::Create(note) | Mutation::Update(note) => {
                match notes.iter().position(|n| n.id() == note.id()) {
                    Some(index) => notes[index] = note.clone(),
                    None => notes.insert(0, note.clone()),
                }
            }
            Mutation::Delete => notes.retain(|n| n.id() != op.note_id()),
        }
    }
    notes
}
