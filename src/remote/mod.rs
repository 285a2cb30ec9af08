// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote note collection.
//!
//! [`RemoteStore`] is the transport seam: four operations, each returning a
//! typed [`RemoteError`] instead of panicking. Backends:
//!
//! - [`HttpRemoteStore`]: JSON over HTTP against one collection URL
//! - [`LocalRemoteStore`]: local-only mode, collection kept in the durable state store
//! - [`InMemoryRemote`]: in-process store for tests and embedding
//!
//! [`RemoteClient`] wraps a store with the degrading contract collaborators
//! expect: `list` falls back to `[]`, `create`/`update` to `None`, `delete`
//! to `false`. Nothing at this layer retries; that is the sync engine's job.

pub mod http;
pub mod local;
pub mod memory;

pub use http::HttpRemoteStore;
pub use local::LocalRemoteStore;
pub use memory::InMemoryRemote;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::note::Note;
use crate::state::StateError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Remote {operation} failed with status {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("Failed to decode remote response: {0}")]
    Decode(String),
    #[error("Note not found on remote: {0}")]
    NotFound(String),
    #[error("Remote store unavailable")]
    Unavailable,
    #[error("Local collection error: {0}")]
    Local(String),
}

impl From<StateError> for RemoteError {
    fn from(e: StateError) -> Self {
        Self::Local(e.to_string())
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short backend name for logs and metrics.
    fn name(&self) -> &'static str;

    async fn list(&self) -> Result<Vec<Note>, RemoteError>;
    async fn create(&self, note: &Note) -> Result<Note, RemoteError>;
    async fn update(&self, id: &str, note: &Note) -> Result<Note, RemoteError>;
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Degrading front for a [`RemoteStore`].
#[derive(Clone)]
pub struct RemoteClient {
    store: Arc<dyn RemoteStore>,
}

impl RemoteClient {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// The wrapped store, for callers that need the typed outcome.
    #[must_use]
    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    /// All notes with the raw outcome, so a failed fetch is
    /// distinguishable from an empty collection.
    pub async fn fetch_all(&self) -> Result<Vec<Note>, RemoteError> {
        self.store.list().await
    }

    /// All notes, or `[]` on failure.
    pub async fn list(&self) -> Vec<Note> {
        match self.store.list().await {
            Ok(notes) => notes,
            Err(e) => {
                warn!(backend = self.store.name(), error = %e, "Error fetching notes");
                Vec::new()
            }
        }
    }

    /// The stored note, or `None` on failure.
    pub async fn create(&self, note: &Note) -> Option<Note> {
        self.store
            .create(note)
            .await
            .map_err(|e| warn!(backend = self.store.name(), id = note.id(), error = %e, "Error creating note"))
            .ok()
    }

    /// The stored note, or `None` on failure.
    pub async fn update(&self, id: &str, note: &Note) -> Option<Note> {
        self.store
            .update(id, note)
            .await
            .map_err(|e| warn!(backend = self.store.name(), id, error = %e, "Error updating note"))
            .ok()
    }

    /// Whether the delete was acknowledged.
    pub async fn delete(&self, id: &str) -> bool {
        match self.store.delete(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(backend = self.store.name(), id, error = %e, "Error deleting note");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Timestamp;

    fn note(id: &str) -> Note {
        Note::with_id(id, "t", "", Timestamp::from_millis(1))
    }

    #[tokio::test]
    async fn test_client_passes_through_when_online() {
        let remote = Arc::new(InMemoryRemote::new());
        let client = RemoteClient::new(remote.clone());

        assert!(client.create(&note("a")).await.is_some());
        assert!(client.update("a", &note("a")).await.is_some());
        assert_eq!(client.list().await.len(), 1);
        assert!(client.delete("a").await);
        assert!(client.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_client_degrades_when_offline() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed(vec![note("a")]);
        remote.set_offline(true);
        let client = RemoteClient::new(remote.clone());

        assert!(client.list().await.is_empty());
        assert!(client.create(&note("b")).await.is_none());
        assert!(client.update("a", &note("a")).await.is_none());
        assert!(!client.delete("a").await);

        remote.set_offline(false);
        assert_eq!(client.list().await.len(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = RemoteError::Status { operation: "update", status: 503 };
        assert_eq!(err.to_string(), "Remote update failed with status 503");
        assert_eq!(
            RemoteError::from(StateError::Backend("disk".into())).to_string(),
            "Local collection error: State backend error: disk"
        );
    }
}
