// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Durable key-value state that survives restarts.
//!
//! Holds the note collection when running in local-only mode, plus the
//! first-run flags used to seed example notes exactly once.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStateStore;
pub use sqlite::SqliteStateStore;

use async_trait::async_trait;
use thiserror::Error;

/// Serialized note collection (local-only mode).
pub const NOTES_KEY: &str = "notes";
/// Set once bootstrap has finished.
pub const INITIALIZED_KEY: &str = "notesAppInitialized";
/// Set on the very first launch of an installation.
pub const VISITED_KEY: &str = "hasVisitedBefore";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("State backend error: {0}")]
    Backend(String),
    #[error("State serialization error for '{key}': {message}")]
    Serialization { key: String, message: String },
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StateError>;
    async fn remove(&self, key: &str) -> Result<(), StateError>;

    /// Whether a flag key has been set.
    async fn is_set(&self, key: &str) -> Result<bool, StateError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Set a flag key to `"true"`.
    async fn set_flag(&self, key: &str) -> Result<(), StateError> {
        self.set(key, "true").await
    }
}
