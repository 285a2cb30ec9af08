// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local-only mode: the "remote" collection is a JSON array stored under
//! [`NOTES_KEY`] in the durable state store.
//!
//! Writes are read-modify-write on the whole array, serialized by a mutex
//! so two deliveries can never interleave and lose one another.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{RemoteError, RemoteStore};
use crate::note::Note;
use crate::state::{StateError, StateStore, NOTES_KEY};

pub struct LocalRemoteStore {
    state: Arc<dyn StateStore>,
    write_lock: Mutex<()>,
}

impl LocalRemoteStore {
    #[must_use]
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self {
            state,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Note>, RemoteError> {
        match self.state.get(NOTES_KEY).await? {
            Some(json) => Ok(serde_json::from_str(&json).map_err(collection_error)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, notes: &[Note]) -> Result<(), RemoteError> {
        let json = serde_json::to_string(notes).map_err(collection_error)?;
        self.state.set(NOTES_KEY, &json).await?;
        debug!(count = notes.len(), "Local collection saved");
        Ok(())
    }
}

fn collection_error(e: serde_json::Error) -> StateError {
    StateError::Serialization {
        key: NOTES_KEY.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl RemoteStore for LocalRemoteStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> Result<Vec<Note>, RemoteError> {
        self.load().await
    }

    async fn create(&self, note: &Note) -> Result<Note, RemoteError> {
        let _lock = self.write_lock.lock().await;
        let mut notes = self.load().await?;
        match notes.iter().position(|n| n.id() == note.id()) {
            Some(index) => notes[index] = note.clone(),
            None => notes.insert(0, note.clone()),
        }
        self.save(&notes).await?;
        Ok(note.clone())
    }

    async fn update(&self, id: &str, note: &Note) -> Result<Note, RemoteError> {
        let _lock = self.write_lock.lock().await;
        let mut notes = self.load().await?;
        let index = notes
            .iter()
            .position(|n| n.id() == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        notes[index] = note.clone();
        self.save(&notes).await?;
        Ok(note.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let _lock = self.write_lock.lock().await;
        let mut notes = self.load().await?;
        let index = notes
            .iter()
            .position(|n| n.id() == id)
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        notes.remove(index);
        self.save(&notes).await
    }
}
