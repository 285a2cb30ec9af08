// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The note data model.
//!
//! [`Note`] is the only persistent entity. Its completion state is a sum
//! type ([`Completion`]) rather than a flag plus an optional timestamp, so a
//! completed note always knows when it was completed and a pending note
//! cannot carry a stale completion time.
//!
//! On the wire a note keeps the collection's historical JSON shape:
//!
//! ```json
//! { "id": "note_1700000000000", "title": "Buy milk", "description": "",
//!   "isCompleted": true,
//!   "date": "14/11/2023", "time": "22:13:20", "timestamp": 1700000000000,
//!   "completedAt": { "date": "...", "time": "...", "timestamp": 1700000100000 } }
//! ```
//!
//! Decoding always normalizes: missing display fields are backfilled from
//! `timestamp`, then from the digits in `id`, then from the current time.
//!
//! # Example
//!
//! ```
//! use notes_sync::note::Note;
//!
//! let mut note = Note::new("Buy milk", "2 litres").unwrap();
//! assert!(!note.is_completed());
//!
//! note.toggle_completion(notes_sync::time::Timestamp::now());
//! assert!(note.completed_at().is_some());
//!
//! let json = serde_json::to_value(&note).unwrap();
//! assert_eq!(json["isCompleted"], true);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{deserialize_loose_millis, millis_from_id, next_note_stamp, now_millis, Timestamp};

/// Errors surfaced synchronously to the caller of a note mutation.
///
/// None of these ever reach the operation queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error("Note title must not be empty")]
    EmptyTitle,
    #[error("Note not found: {0}")]
    NotFound(String),
    #[error("A delete confirmation is already pending for '{0}'")]
    ConfirmationPending(String),
    #[error("Unknown or expired delete confirmation for '{0}'")]
    UnknownConfirmation(String),
}

/// Completion state of a note.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Completion {
    /// Never completed, or completion was toggled off
    #[default]
    Pending,
    /// Completed at the given instant
    Completed(Timestamp),
}

impl Completion {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// A single note.
///
/// Fields are private so the invariants hold: the id never changes, the
/// title is never blank after a local edit, and `completedAt` exists
/// exactly when the note is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NoteRecord", into = "NoteRecord")]
pub struct Note {
    id: String,
    title: String,
    description: String,
    created_at: Timestamp,
    last_edited: Option<Timestamp>,
    completion: Completion,
}

/// Check a user-supplied title and return its trimmed form.
pub fn validate_title(title: &str) -> Result<&str, NoteError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(NoteError::EmptyTitle)
    } else {
        Ok(trimmed)
    }
}

impl Note {
    /// Create a new note with a freshly generated `note_<millis>` id.
    pub fn new(title: &str, description: &str) -> Result<Self, NoteError> {
        let title = validate_title(title)?;
        let (id, created_at) = next_note_stamp();
        Ok(Self::with_id(id, title, description, created_at))
    }

    /// Build a note with a known id (seed notes, remote-assigned ids).
    ///
    /// The title is taken as-is; use [`Note::new`] for user input.
    #[must_use]
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            created_at,
            last_edited: None,
            completion: Completion::Pending,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    #[must_use]
    pub fn last_edited(&self) -> Option<&Timestamp> {
        self.last_edited.as_ref()
    }

    #[must_use]
    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<&Timestamp> {
        match &self.completion {
            Completion::Completed(at) => Some(at),
            Completion::Pending => None,
        }
    }

    /// Millis of the most recent edit, or of creation if never edited.
    #[must_use]
    pub fn last_activity_millis(&self) -> i64 {
        self.last_edited
            .as_ref()
            .map_or(self.created_at.epoch_millis, |t| t.epoch_millis)
    }

    /// Replace title and description, stamping `lastEdited`.
    pub fn edit(&mut self, title: &str, description: &str, at: Timestamp) -> Result<(), NoteError> {
        let title = validate_title(title)?;
        self.title = title.to_string();
        self.description = description.to_string();
        self.last_edited = Some(at);
        Ok(())
    }

    /// Flip completion. Completing stamps `completedAt`; un-completing
    /// removes it entirely.
    pub fn toggle_completion(&mut self, at: Timestamp) {
        self.completion = match self.completion {
            Completion::Pending => Completion::Completed(at),
            Completion::Completed(_) => Completion::Pending,
        };
    }

    #[must_use]
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    #[must_use]
    pub fn with_last_edited(mut self, at: Timestamp) -> Self {
        self.last_edited = Some(at);
        self
    }
}

/// Wire shape of a note as the collection stores it.
///
/// Every display field is optional here; [`From<NoteRecord>`] for [`Note`]
/// fills the gaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRecord {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_loose_millis",
        skip_serializing_if = "Option::is_none"
    )]
    timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_edited: Option<TimestampRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<TimestampRecord>,
}

/// Wire shape of a nested timestamp; any field may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimestampRecord {
    #[serde(default)]
    date: String,
    #[serde(default)]
    time: String,
    #[serde(
        default,
        deserialize_with = "deserialize_loose_millis",
        skip_serializing_if = "Option::is_none"
    )]
    timestamp: Option<i64>,
}

impl TimestampRecord {
    /// Complete the record, taking `fallback_millis` if it has no instant.
    fn resolve(self, fallback_millis: i64) -> Timestamp {
        match self.timestamp {
            Some(epoch_millis) => Timestamp {
                date: self.date,
                time: self.time,
                epoch_millis,
            }
            .normalized(),
            None => Timestamp::from_millis(fallback_millis),
        }
    }
}

impl From<Timestamp> for TimestampRecord {
    fn from(ts: Timestamp) -> Self {
        Self {
            date: ts.date,
            time: ts.time,
            timestamp: Some(ts.epoch_millis),
        }
    }
}

impl NoteRecord {
    fn created_at(&self) -> Timestamp {
        match (&self.date, &self.time, self.timestamp) {
            (Some(date), Some(time), Some(millis)) if !date.is_empty() && !time.is_empty() => {
                Timestamp {
                    date: date.clone(),
                    time: time.clone(),
                    epoch_millis: millis,
                }
            }
            _ => {
                let millis = self
                    .timestamp
                    .or_else(|| millis_from_id(&self.id))
                    .unwrap_or_else(now_millis);
                Timestamp::from_millis(millis)
            }
        }
    }
}

impl From<NoteRecord> for Note {
    fn from(record: NoteRecord) -> Self {
        let created_at = record.created_at();
        let last_edited = record
            .last_edited
            .map(|ts| ts.resolve(created_at.epoch_millis));

        // A completed note that lost its completedAt falls back to its last
        // activity; a stray completedAt on a pending note is dropped.
        let completion = if record.is_completed {
            let fallback = last_edited.as_ref().unwrap_or(&created_at).epoch_millis;
            let at = record
                .completed_at
                .map(|ts| ts.resolve(fallback))
                .or_else(|| last_edited.clone())
                .unwrap_or_else(|| created_at.clone());
            Completion::Completed(at)
        } else {
            Completion::Pending
        };

        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            created_at,
            last_edited,
            completion,
        }
    }
}

impl From<Note> for NoteRecord {
    fn from(note: Note) -> Self {
        let (is_completed, completed_at) = match note.completion {
            Completion::Pending => (false, None),
            Completion::Completed(at) => (true, Some(at)),
        };

        Self {
            id: note.id,
            title: note.title,
            description: note.description,
            is_completed,
            date: Some(note.created_at.date),
            time: Some(note.created_at.time),
            timestamp: Some(note.created_at.epoch_millis),
            last_edited: note.last_edited.map(TimestampRecord::from),
            completed_at: completed_at.map(TimestampRecord::from),
        }
    }
}
