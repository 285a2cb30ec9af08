// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Notes Sync
//!
//! An offline-first sync engine for a note collection.
//!
//! ## Architecture
//!
//! Mutations land in a local cache immediately and are queued for eventual
//! delivery to a remote store; a periodic pull reconciles the two.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Collaborator API                        │
//! │  • create / update / toggle / confirmed delete             │
//! │  • Title validation, nothing queued on error               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Local Cache                           │
//! │  • Source of truth for rendering                           │
//! │  • Incomplete first, most recent activity first            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                    (Debounced, FIFO drain)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Operation Queue                          │
//! │  • Create / Update / Delete, oldest first                  │
//! │  • Failed head requeued, retried with backoff              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Remote Store                           │
//! │  • HTTP collection, local-only (SQLite) or in-memory       │
//! │  • Periodic pull, diffed and reconciled into the cache     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use notes_sync::{SyncConfig, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SyncConfig {
//!         remote_url: Some("http://localhost:3000/api/notes".into()),
//!         state_path: Some("notes-state.db".into()),
//!         ..Default::default()
//!     };
//!
//!     let engine = Arc::new(SyncEngine::from_config(config).await.expect("Failed to configure"));
//!     engine.start().await.expect("Failed to start");
//!     let handle = engine.spawn();
//!
//!     // Mutations are local and immediate; delivery happens after the debounce
//!     let note = engine.create_note("Buy milk", "semi-skimmed").expect("valid title");
//!     engine.toggle_completion(note.id()).expect("note exists");
//!     println!("{}", engine.status());
//!
//!     engine.shutdown();
//!     handle.await.expect("run loop panicked");
//! }
//! ```
//!
//! ## Features
//!
//! - **Optimistic local cache**: reads never wait on the network
//! - **Debounced delivery**: bursts of edits become one sync
//! - **At-least-once**: an operation leaves the queue only once delivered
//! - **Reconciliation**: periodic pulls, replaced only on real content change
//! - **Local-only mode**: the collection persisted in SQLite, no server needed
//!
//! ## Configuration
//!
//! See [`SyncConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`engine`]: The main [`SyncEngine`] and its run loop
//! - [`remote`]: Remote store backends (HTTP, local-only, memory)
//! - [`state`]: Durable key-value state (SQLite, memory)
//! - [`cache`], [`queue`], [`policy`]: Local cache, operation queue, ordering rules
//! - [`note`], [`time`]: The note model and its timestamps
//! - [`resilience`]: Drain retry backoff

pub mod cache;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod note;
pub mod policy;
pub mod queue;
pub mod remote;
pub mod resilience;
pub mod state;
pub mod time;

pub use cache::{LocalCache, NoteCounts};
pub use config::SyncConfig;
pub use engine::{
    CacheEvent, DeleteRequest, DeliveryFailure, DrainReport, PullOutcome, SyncEngine, SyncError,
    SyncOutcome, SyncState, SyncStatus, SyncTrigger,
};
pub use metrics::LatencyTimer;
pub use note::{Completion, Note, NoteError};
pub use queue::{OpKind, Operation, OperationQueue};
pub use remote::{
    HttpRemoteStore, InMemoryRemote, LocalRemoteStore, RemoteClient, RemoteError, RemoteStore,
};
pub use resilience::BackoffPolicy;
pub use state::{MemoryStateStore, SqliteStateStore, StateError, StateStore};
pub use time::Timestamp;
