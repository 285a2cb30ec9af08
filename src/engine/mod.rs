// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync engine.
//!
//! The [`SyncEngine`] ties the pieces together:
//! - Local cache, mutated synchronously and rendered from
//! - Operation queue, drained FIFO to the remote store
//! - Reconciliation pulls that replace the cache when the remote differs
//! - A run loop driving the debounce, backoff and periodic timers
//!
//! # Lifecycle
//!
//! ```text
//! Created → Idle ⇄ Draining → Pulling → Idle … → Stopped
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notes_sync::{InMemoryRemote, SyncConfig, SyncEngine, SyncState};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = Arc::new(SyncEngine::new(SyncConfig::default(), Arc::new(InMemoryRemote::new())));
//! assert_eq!(engine.state(), SyncState::Created);
//!
//! engine.start().await.expect("start failed");
//! let handle = engine.spawn();
//!
//! engine.create_note("Groceries", "milk, eggs").unwrap();
//!
//! engine.shutdown();
//! handle.await.unwrap();
//! # }
//! ```

mod api;
mod flush;
mod lifecycle;
mod types;

pub use types::{
    CacheEvent, DeleteRequest, DeliveryFailure, DrainReport, PullOutcome, SyncError, SyncOutcome,
    SyncState, SyncStatus, SyncTrigger,
};

use std::sync::atomic::{AtomicU32, AtomicU64};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch, Notify};
use tracing::info;

use crate::cache::LocalCache;
use crate::config::SyncConfig;
use crate::queue::{DrainLock, OperationQueue};
use crate::remote::{HttpRemoteStore, LocalRemoteStore, RemoteClient, RemoteStore};
use crate::resilience::BackoffPolicy;
use crate::state::{MemoryStateStore, SqliteStateStore, StateStore};

const EVENT_CAPACITY: usize = 256;

/// Offline-first sync engine for one note collection.
///
/// # Thread Safety
///
/// The engine is `Send + Sync` and meant to be shared as `Arc<SyncEngine>`.
/// Cache and queue sit behind `parking_lot` mutexes that are never held
/// across an `.await`; lock order is always cache before queue.
pub struct SyncEngine {
    pub(super) config: SyncConfig,

    pub(super) remote: RemoteClient,

    /// Durable state for first-run flags (optional)
    pub(super) state_store: Option<Arc<dyn StateStore>>,

    pub(super) cache: Mutex<LocalCache>,

    pub(super) queue: Mutex<OperationQueue>,

    /// Held for the whole of a drain or pull
    pub(super) drain_lock: DrainLock,

    /// Engine state (broadcast to watchers)
    pub(super) state: watch::Sender<SyncState>,

    /// Engine state receiver (for internal use)
    pub(super) state_rx: watch::Receiver<SyncState>,

    pub(super) events: broadcast::Sender<CacheEvent>,

    /// Poked on every accepted mutation to re-arm the debounce
    pub(super) mutation_signal: Notify,

    pub(super) shutdown: watch::Sender<bool>,

    pub(super) pending_delete: Mutex<Option<DeleteRequest>>,
    pub(super) next_delete_token: AtomicU64,

    pub(super) consecutive_failures: AtomicU32,
    pub(super) backoff: BackoffPolicy,
}

impl SyncEngine {
    /// Create an engine over `remote`.
    ///
    /// The engine starts in `Created` with an empty cache. Call
    /// [`start()`](Self::start) to seed and hydrate, then
    /// [`spawn()`](Self::spawn) or [`run()`](Self::run) for the timers.
    pub fn new(config: SyncConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let (state_tx, state_rx) = watch::channel(SyncState::Created);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (shutdown, _) = watch::channel(false);
        let backoff = config.backoff_policy();

        Self {
            config,
            remote: RemoteClient::new(remote),
            state_store: None,
            cache: Mutex::new(LocalCache::new()),
            queue: Mutex::new(OperationQueue::new()),
            drain_lock: DrainLock::new(),
            state: state_tx,
            state_rx,
            events,
            mutation_signal: Notify::new(),
            shutdown,
            pending_delete: Mutex::new(None),
            next_delete_token: AtomicU64::new(1),
            consecutive_failures: AtomicU32::new(0),
            backoff,
        }
    }

    /// Attach a durable state store, enabling first-run seeding.
    #[must_use]
    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    /// Build the engine the config describes.
    ///
    /// State lives in SQLite at `state_path`, or in memory when unset. The
    /// remote is the HTTP collection at `remote_url`, or local-only mode
    /// backed by the same state store.
    pub async fn from_config(config: SyncConfig) -> Result<Self, SyncError> {
        let state: Arc<dyn StateStore> = match &config.state_path {
            Some(path) => Arc::new(SqliteStateStore::open(path).await?),
            None => Arc::new(MemoryStateStore::new()),
        };

        let remote: Arc<dyn RemoteStore> = match &config.remote_url {
            Some(url) => Arc::new(HttpRemoteStore::new(url.clone(), config.request_timeout())?),
            None => Arc::new(LocalRemoteStore::new(state.clone())),
        };

        info!(
            remote = remote.name(),
            durable = config.state_path.is_some(),
            "Sync engine configured"
        );
        Ok(Self::new(config, remote).with_state_store(state))
    }

    /// Get current engine state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<SyncState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The degrading remote client.
    #[must_use]
    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    /// Move to `next`. Once stopped, the engine stays stopped.
    pub(super) fn set_state(&self, next: SyncState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next || *current == SyncState::Stopped {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            crate::metrics::set_engine_state(next.as_str());
        }
    }

    pub(super) fn notify(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub(super) fn publish_gauges(&self) {
        let counts = self.cache.lock().counts();
        crate::metrics::set_cache_notes(counts.total, counts.completed);
        crate::metrics::set_queue_depth(self.queue.lock().len());
    }
}
