// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Ordering and equality rules applied whenever the cache is refreshed.
//!
//! - **Order**: incomplete notes first, then completed; inside each group
//!   newest activity first (`lastEdited`, falling back to `createdAt`).
//! - **Equality**: two snapshots match when they hold the same ids and,
//!   per id, the same title, description and completion flag. Timestamps
//!   never make two snapshots differ.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::note::Note;

/// Display order of two notes.
#[must_use]
pub fn compare(a: &Note, b: &Note) -> Ordering {
    a.is_completed()
        .cmp(&b.is_completed())
        .then_with(|| b.last_activity_millis().cmp(&a.last_activity_millis()))
}

/// Sort notes into display order.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(compare);
}

/// Whether two notes carry the same user-visible content.
#[must_use]
pub fn content_matches(a: &Note, b: &Note) -> bool {
    a.title() == b.title()
        && a.description() == b.description()
        && a.is_completed() == b.is_completed()
}

/// Drop repeated ids, keeping the first note seen for each.
#[must_use]
pub fn dedup_by_id(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::with_capacity(notes.len());
    notes
        .into_iter()
        .filter(|note| seen.insert(note.id().to_string()))
        .collect()
}

/// Equality rule between a pulled snapshot and the cache.
#[must_use]
pub fn snapshots_equal(left: &[Note], right: &[Note]) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let left_ids: HashSet<&str> = left.iter().map(Note::id).collect();
    let right_by_id: HashMap<&str, &Note> = right.iter().map(|n| (n.id(), n)).collect();
    if left_ids.len() != left.len() || right_by_id.len() != right.len() {
        // Duplicate ids can never match a deduplicated cache
        return false;
    }

    left.iter().all(|note| {
        right_by_id
            .get(note.id())
            .is_some_and(|other| content_matches(note, other))
    })
}
