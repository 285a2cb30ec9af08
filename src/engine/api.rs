// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collaborator-facing API: mutations, delete confirmation, reads.
//!
//! Every mutation updates the cache synchronously, enqueues exactly one
//! operation and re-arms the debounce. Validation failures return before
//! anything is touched.

use std::sync::atomic::Ordering;

use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::NoteCounts;
use crate::note::{validate_title, Note, NoteError};
use crate::queue::{OpKind, Operation};
use crate::time::Timestamp;

use super::{CacheEvent, DeleteRequest, SyncEngine, SyncOutcome, SyncStatus, SyncTrigger};

impl SyncEngine {
    /// Create a note and queue it for delivery.
    #[tracing::instrument(skip(self, description))]
    pub fn create_note(&self, title: &str, description: &str) -> Result<Note, NoteError> {
        let note = Note::new(title, description)?;

        {
            let mut cache = self.cache.lock();
            cache.upsert(note.clone());
            cache.sort();
            self.queue.lock().enqueue(Operation::create(note.clone()));
        }

        self.after_mutation(OpKind::Create, CacheEvent::Created(note.id().to_string()));
        Ok(note)
    }

    /// Replace title and description, stamping `lastEdited`.
    #[tracing::instrument(skip(self, description))]
    pub fn update_note(&self, id: &str, title: &str, description: &str) -> Result<Note, NoteError> {
        validate_title(title)?;

        let note = {
            let mut cache = self.cache.lock();
            let mut note = cache
                .get(id)
                .cloned()
                .ok_or_else(|| NoteError::NotFound(id.to_string()))?;
            note.edit(title, description, Timestamp::now())?;
            cache.upsert(note.clone());
            cache.sort();
            self.queue.lock().enqueue(Operation::update(note.clone()));
            note
        };

        self.after_mutation(OpKind::Update, CacheEvent::Updated(id.to_string()));
        Ok(note)
    }

    /// Flip completion and queue the change.
    #[tracing::instrument(skip(self))]
    pub fn toggle_completion(&self, id: &str) -> Result<Note, NoteError> {
        let note = {
            let mut cache = self.cache.lock();
            let mut note = cache
                .get(id)
                .cloned()
                .ok_or_else(|| NoteError::NotFound(id.to_string()))?;
            note.toggle_completion(Timestamp::now());
            cache.upsert(note.clone());
            cache.sort();
            self.queue.lock().enqueue(Operation::update(note.clone()));
            note
        };

        self.after_mutation(OpKind::Update, CacheEvent::Updated(id.to_string()));
        Ok(note)
    }

    /// Ask to delete a note. Nothing changes until the returned request is
    /// confirmed.
    ///
    /// Only one confirmation may be open at a time.
    pub fn request_delete(&self, id: &str) -> Result<DeleteRequest, NoteError> {
        if !self.cache.lock().contains(id) {
            return Err(NoteError::NotFound(id.to_string()));
        }

        let mut pending = self.pending_delete.lock();
        if let Some(open) = pending.as_ref() {
            return Err(NoteError::ConfirmationPending(open.note_id.clone()));
        }

        let request = DeleteRequest {
            token: self.next_delete_token.fetch_add(1, Ordering::Relaxed),
            note_id: id.to_string(),
        };
        *pending = Some(request.clone());
        debug!(id, token = request.token, "Delete awaiting confirmation");
        Ok(request)
    }

    /// Confirm an open delete request: remove locally and queue the delete.
    #[tracing::instrument(skip(self))]
    pub fn confirm_delete(&self, token: u64) -> Result<(), NoteError> {
        let request = self.take_delete_request(token)?;
        self.apply_delete(&request.note_id);
        Ok(())
    }

    /// Drop an open delete request. Cache and queue are untouched.
    pub fn cancel_delete(&self, token: u64) -> Result<(), NoteError> {
        let request = self.take_delete_request(token)?;
        debug!(id = %request.note_id, token, "Delete cancelled");
        Ok(())
    }

    /// The open delete request, if any.
    #[must_use]
    pub fn pending_delete(&self) -> Option<DeleteRequest> {
        self.pending_delete.lock().clone()
    }

    /// Run a full sync now, outside the timers.
    ///
    /// Skipped if another sync is in flight.
    #[tracing::instrument(skip(self))]
    pub async fn sync_now(&self) -> SyncOutcome {
        self.full_sync(SyncTrigger::Manual).await
    }

    /// Snapshot of the cache in display order.
    #[must_use]
    pub fn notes(&self) -> Vec<Note> {
        self.cache.lock().snapshot()
    }

    #[must_use]
    pub fn note(&self, id: &str) -> Option<Note> {
        self.cache.lock().get(id).cloned()
    }

    #[must_use]
    pub fn counts(&self) -> NoteCounts {
        self.cache.lock().counts()
    }

    /// Operations waiting for delivery.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.queue.lock().len()
    }

    /// Queued operations in delivery order, as `(kind, note id)`.
    #[must_use]
    pub fn queued(&self) -> Vec<(OpKind, String)> {
        self.queue
            .lock()
            .iter()
            .map(|op| (op.kind(), op.note_id().to_string()))
            .collect()
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        let pending = self.pending_operations();
        if pending > 0 || self.drain_lock.is_held() {
            SyncStatus::Syncing { pending }
        } else {
            SyncStatus::Saved
        }
    }

    /// Subscribe to cache change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn take_delete_request(&self, token: u64) -> Result<DeleteRequest, NoteError> {
        let mut pending = self.pending_delete.lock();
        match pending.take() {
            Some(request) if request.token == token => Ok(request),
            other => {
                *pending = other;
                Err(NoteError::UnknownConfirmation(token.to_string()))
            }
        }
    }

    fn apply_delete(&self, id: &str) {
        {
            let mut cache = self.cache.lock();
            cache.remove(id);
            self.queue.lock().enqueue(Operation::delete(id));
        }
        self.after_mutation(OpKind::Delete, CacheEvent::Deleted(id.to_string()));
    }

    fn after_mutation(&self, kind: OpKind, event: CacheEvent) {
        crate::metrics::record_mutation(kind);
        self.mutation_signal.notify_one();
        self.notify(event);
        self.publish_gauges();
        debug!(%kind, pending = self.pending_operations(), "Mutation queued");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SyncConfig;
    use crate::remote::InMemoryRemote;

    fn engine() -> SyncEngine {
        SyncEngine::new(SyncConfig::default(), Arc::new(InMemoryRemote::new()))
    }

    #[test]
    fn test_create_validates_title() {
        let engine = engine();
        assert_eq!(engine.create_note("   ", "body"), Err(NoteError::EmptyTitle));
        assert!(engine.notes().is_empty());
        assert_eq!(engine.pending_operations(), 0);
    }

    #[test]
    fn test_create_enqueues_and_notifies() {
        let engine = engine();
        let mut events = engine.subscribe();

        let note = engine.create_note("  Title ", "body").unwrap();
        assert_eq!(note.title(), "Title");
        assert_eq!(engine.notes(), vec![note.clone()]);
        assert_eq!(engine.queued(), vec![(OpKind::Create, note.id().to_string())]);
        assert_eq!(events.try_recv().unwrap(), CacheEvent::Created(note.id().to_string()));
        assert_eq!(engine.status(), SyncStatus::Syncing { pending: 1 });
    }

    #[test]
    fn test_update_missing_note() {
        let engine = engine();
        assert_eq!(
            engine.update_note("ghost", "t", ""),
            Err(NoteError::NotFound("ghost".into()))
        );
        assert_eq!(engine.pending_operations(), 0);
    }

    #[test]
    fn test_update_empty_title_touches_nothing() {
        let engine = engine();
        let note = engine.create_note("A", "").unwrap();

        assert_eq!(engine.update_note(note.id(), "", "x"), Err(NoteError::EmptyTitle));
        assert_eq!(engine.note(note.id()).unwrap().title(), "A");
        assert_eq!(engine.pending_operations(), 1);
    }

    #[test]
    fn test_update_stamps_last_edited() {
        let engine = engine();
        let note = engine.create_note("A", "").unwrap();

        let edited = engine.update_note(note.id(), "B", "desc").unwrap();
        assert_eq!(edited.title(), "B");
        assert!(edited.last_edited().is_some());
        assert_eq!(engine.pending_operations(), 2);
    }

    #[test]
    fn test_toggle_moves_note_to_completed_group() {
        let engine = engine();
        let first = engine.create_note("first", "").unwrap();
        let second = engine.create_note("second", "").unwrap();
        assert_eq!(engine.notes()[0].id(), second.id());

        let toggled = engine.toggle_completion(second.id()).unwrap();
        assert!(toggled.is_completed());
        assert!(toggled.completed_at().is_some());

        let ids: Vec<String> = engine.notes().iter().map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec![first.id().to_string(), second.id().to_string()]);
        assert_eq!(engine.counts(), NoteCounts { total: 2, completed: 1 });

        let back = engine.toggle_completion(second.id()).unwrap();
        assert!(!back.is_completed());
        assert!(back.completed_at().is_none());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let engine = engine();
        let note = engine.create_note("A", "").unwrap();

        let request = engine.request_delete(note.id()).unwrap();
        assert!(engine.note(note.id()).is_some());
        assert_eq!(engine.pending_operations(), 1);

        engine.confirm_delete(request.token).unwrap();
        assert!(engine.note(note.id()).is_none());
        assert_eq!(
            engine.queued().last(),
            Some(&(OpKind::Delete, note.id().to_string()))
        );
        assert!(engine.pending_delete().is_none());
    }

    #[test]
    fn test_cancel_delete_leaves_everything() {
        let engine = engine();
        let note = engine.create_note("A", "").unwrap();

        let request = engine.request_delete(note.id()).unwrap();
        engine.cancel_delete(request.token).unwrap();

        assert!(engine.note(note.id()).is_some());
        assert_eq!(engine.pending_operations(), 1);
        assert_eq!(
            engine.confirm_delete(request.token),
            Err(NoteError::UnknownConfirmation(request.token.to_string()))
        );
    }

    #[test]
    fn test_single_open_confirmation() {
        let engine = engine();
        let a = engine.create_note("A", "").unwrap();
        let b = engine.create_note("B", "").unwrap();

        let request = engine.request_delete(a.id()).unwrap();
        assert_eq!(
            engine.request_delete(b.id()),
            Err(NoteError::ConfirmationPending(a.id().to_string()))
        );
        assert_eq!(
            engine.confirm_delete(request.token + 1),
            Err(NoteError::UnknownConfirmation((request.token + 1).to_string()))
        );

        // The open request is still intact and nothing was queued for it
        assert_eq!(engine.pending_delete(), Some(request.clone()));
        assert_eq!(engine.pending_operations(), 2);
        assert!(engine.note(b.id()).is_some());

        engine.confirm_delete(request.token).unwrap();
        let request = engine.request_delete(b.id()).unwrap();
        engine.confirm_delete(request.token).unwrap();
        assert!(engine.notes().is_empty());
    }

    #[test]
    fn test_delete_missing_note() {
        let engine = engine();
        assert_eq!(engine.request_delete("ghost"), Err(NoteError::NotFound("ghost".into())));
        assert_eq!(engine.pending_delete(), None);
        assert_eq!(engine.pending_operations(), 0);
    }
}
