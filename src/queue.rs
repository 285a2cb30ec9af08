// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Pending mutations awaiting delivery to the remote store.
//!
//! The queue is strictly FIFO. A failed delivery puts the operation back at
//! the head with [`OperationQueue::requeue_front`], so retries keep the
//! original order and nothing queued behind it can overtake it.
//!
//! Draining is gated by a single flag ([`DrainLock`]). The guard it hands
//! out releases the flag on drop, including early returns and panics, so
//! the debounce path and the periodic path never drain at the same time.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::note::Note;
use crate::time::now_millis;

/// Kind of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl OpKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an operation does. Create and update carry the full note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(Note),
    Update(Note),
    Delete,
}

/// A queued mutation for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    note_id: String,
    mutation: Mutation,
    enqueued_at: i64,
}

impl Operation {
    #[must_use]
    pub fn create(note: Note) -> Self {
        Self::new(note.id().to_string(), Mutation::Create(note))
    }

    #[must_use]
    pub fn update(note: Note) -> Self {
        Self::new(note.id().to_string(), Mutation::Update(note))
    }

    #[must_use]
    pub fn delete(note_id: impl Into<String>) -> Self {
        Self::new(note_id.into(), Mutation::Delete)
    }

    fn new(note_id: String, mutation: Mutation) -> Self {
        Self {
            note_id,
            mutation,
            enqueued_at: now_millis(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> OpKind {
        match self.mutation {
            Mutation::Create(_) => OpKind::Create,
            Mutation::Update(_) => OpKind::Update,
            Mutation::Delete => OpKind::Delete,
        }
    }

    #[must_use]
    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    #[must_use]
    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// The note carried by a create or update.
    #[must_use]
    pub fn payload(&self) -> Option<&Note> {
        match &self.mutation {
            Mutation::Create(note) | Mutation::Update(note) => Some(note),
            Mutation::Delete => None,
        }
    }

    /// Epoch millis at which the operation was queued.
    #[must_use]
    pub fn enqueued_at(&self) -> i64 {
        self.enqueued_at
    }
}

/// FIFO of pending operations.
#[derive(Debug, Default)]
pub struct OperationQueue {
    ops: VecDeque<Operation>,
}

impl OperationQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail.
    pub fn enqueue(&mut self, op: Operation) {
        self.ops.push_back(op);
    }

    /// Remove and return the head, or `None` if empty.
    pub fn dequeue_oldest(&mut self) -> Option<Operation> {
        self.ops.pop_front()
    }

    /// Put an operation back at the head after a failed delivery.
    pub fn requeue_front(&mut self, op: Operation) {
        self.ops.push_front(op);
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Operation> {
        self.ops.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of queued operations that target `note_id`.
    #[must_use]
    pub fn pending_for(&self, note_id: &str) -> usize {
        self.ops.iter().filter(|op| op.note_id == note_id).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.iter()
    }
}

/// The `syncInProgress` flag.
#[derive(Debug, Default)]
pub struct DrainLock {
    in_progress: AtomicBool,
}

impl DrainLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag, or `None` if a drain is already running.
    #[must_use]
    pub fn try_acquire(&self) -> Option<DrainGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DrainGuard { flag: &self.in_progress })
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }
}

/// Scoped ownership of the drain flag; released on drop.
#[derive(Debug)]
pub struct DrainGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
