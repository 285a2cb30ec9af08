// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory note cache, the single source of truth for rendering.
//!
//! Written only through [`LocalCache::upsert`], [`LocalCache::remove`] and
//! [`LocalCache::replace_all`]. The sync engine owns the one instance and
//! guards it with a lock; nothing here is async or fallible.

use serde::Serialize;

use crate::note::Note;
use crate::policy;

/// Counts shown by badges and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NoteCounts {
    pub total: usize,
    pub completed: usize,
}

/// Ordered collection of notes with at most one note per id.
#[derive(Debug, Default, Clone)]
pub struct LocalCache {
    notes: Vec<Note>,
}

impl LocalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cache from an initial set (deduplicated, then sorted).
    #[must_use]
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut cache = Self::new();
        cache.replace_all(notes);
        cache.sort();
        cache
    }

    /// Insert at the front if the id is new, otherwise replace in place.
    ///
    /// Returns `true` if the note was newly inserted.
    pub fn upsert(&mut self, note: Note) -> bool {
        match self.position(note.id()) {
            Some(index) => {
                self.notes[index] = note;
                false
            }
            None => {
                self.notes.insert(0, note);
                true
            }
        }
    }

    /// Remove a note by id. Missing ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Note> {
        self.position(id).map(|index| self.notes.remove(index))
    }

    /// Replace the whole content, keeping the first note seen for each id.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = policy::dedup_by_id(notes);
    }

    /// Apply the display order.
    pub fn sort(&mut self) {
        policy::sort_notes(&mut self.notes);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Clone of the current ordered content.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Note> {
        self.notes.clone()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[must_use]
    pub fn counts(&self) -> NoteCounts {
        NoteCounts {
            total: self.notes.len(),
            completed: self.notes.iter().filter(|n| n.is_completed()).count(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|n| n.id() == id)
    }
}
