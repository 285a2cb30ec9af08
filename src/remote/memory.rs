// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{RemoteError, RemoteStore};
use crate::note::Note;
use crate::queue::OpKind;

/// In-process remote collection.
///
/// Keeps insertion order (newest first on `list`), counts every applied
/// write per `(kind, id)`, and can be switched offline to simulate a lost
/// network.
pub struct InMemoryRemote {
    notes: DashMap<String, (u64, Note)>,
    sequence: AtomicU64,
    writes: DashMap<(OpKind, String), u64>,
    offline: AtomicBool,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self {
            notes: DashMap::new(),
            sequence: AtomicU64::new(0),
            writes: DashMap::new(),
            offline: AtomicBool::new(false),
        }
    }

    /// Preload notes without counting them as writes.
    pub fn seed(&self, notes: Vec<Note>) {
        for note in notes {
            self.insert(note);
        }
    }

    /// Every call fails with [`RemoteError::Unavailable`] while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Note> {
        self.notes.get(id).map(|r| r.value().1.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Current content, newest insertion first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Note> {
        let mut entries: Vec<(u64, Note)> = self
            .notes
            .iter()
            .map(|r| r.value().clone())
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, note)| note).collect()
    }

    /// How many times a write of `kind` was applied to `id`.
    #[must_use]
    pub fn applied(&self, kind: OpKind, id: &str) -> u64 {
        self.writes
            .get(&(kind, id.to_string()))
            .map_or(0, |r| *r.value())
    }

    /// Total applied writes of any kind.
    #[must_use]
    pub fn total_writes(&self) -> u64 {
        self.writes.iter().map(|r| *r.value()).sum()
    }

    fn insert(&self, note: Note) {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.notes
            .entry(note.id().to_string())
            .and_modify(|entry| entry.1 = note.clone())
            .or_insert((seq, note));
    }

    fn record_write(&self, kind: OpKind, id: &str) {
        *self.writes.entry((kind, id.to_string())).or_insert(0) += 1;
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.is_offline() {
            Err(RemoteError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Note>, RemoteError> {
        self.check_online()?;
        Ok(self.snapshot())
    }

    async fn create(&self, note: &Note) -> Result<Note, RemoteError> {
        self.check_online()?;
        self.insert(note.clone());
        self.record_write(OpKind::Create, note.id());
        Ok(note.clone())
    }

    async fn update(&self, id: &str, note: &Note) -> Result<Note, RemoteError> {
        self.check_online()?;
        match self.notes.get_mut(id) {
            Some(mut entry) => entry.1 = note.clone(),
            None => return Err(RemoteError::NotFound(id.to_string())),
        }
        self.record_write(OpKind::Update, id);
        Ok(note.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.check_online()?;
        if self.notes.remove(id).is_none() {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        self.record_write(OpKind::Delete, id);
        Ok(())
    }
}
