// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the sync engine.

use std::fmt;

use thiserror::Error;

use crate::queue::OpKind;
use crate::remote::RemoteError;
use crate::state::StateError;

/// Engine state.
///
/// Use [`super::SyncEngine::state()`] to check the current state or
/// [`super::SyncEngine::state_receiver()`] to watch for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Just created, run loop not started
    Created,
    /// Waiting for the next trigger
    Idle,
    /// Delivering queued operations
    Draining,
    /// Fetching the remote collection for reconciliation
    Pulling,
    /// Run loop has exited
    Stopped,
}

impl SyncState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Idle => "Idle",
            Self::Draining => "Draining",
            Self::Pulling => "Pulling",
            Self::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The "still syncing" indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing queued, nothing in flight
    Saved,
    /// Operations waiting for delivery
    Syncing { pending: usize },
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "All changes saved"),
            Self::Syncing { pending } => write!(f, "Syncing {} changes...", pending),
        }
    }
}

/// Cache change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Created(String),
    Updated(String),
    Deleted(String),
    /// The cache was replaced from a pull
    Reconciled { total: usize },
}

/// A pending delete confirmation.
///
/// Returned by [`super::SyncEngine::request_delete`]; pass it back to
/// `confirm_delete` or `cancel_delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub token: u64,
    pub note_id: String,
}

/// Why a full sync ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Debounce,
    Periodic,
    Backoff,
    Manual,
}

impl SyncTrigger {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::Periodic => "periodic",
            Self::Backoff => "backoff",
            Self::Manual => "manual",
        }
    }
}

/// The delivery that stopped a drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub kind: OpKind,
    pub note_id: String,
    pub error: RemoteError,
}

/// Result of one drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Operations acknowledged by the remote store
    pub delivered: usize,
    /// Set if the pass stopped on a failed delivery
    pub failed: Option<DeliveryFailure>,
    /// Operations still queued when the pass ended
    pub remaining: usize,
}

impl DrainReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// Result of one reconciliation pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote matched the cache
    Unchanged,
    /// Cache replaced with the remote snapshot
    Reconciled { total: usize },
    /// Fetch failed, cache kept as it was
    Failed(RemoteError),
}

/// Result of a full sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another sync held the drain lock
    Skipped,
    Completed { drain: DrainReport, pull: PullOutcome },
}

impl SyncOutcome {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Errors from engine construction and startup.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_state_display() {
        assert_eq!(format!("{}", SyncState::Created), "Created");
        assert_eq!(format!("{}", SyncState::Draining), "Draining");
        assert_eq!(format!("{}", SyncState::Stopped), "Stopped");
    }

    #[test]
    fn test_sync_status_display() {
        assert_eq!(SyncStatus::Saved.to_string(), "All changes saved");
        assert_eq!(SyncStatus::Syncing { pending: 3 }.to_string(), "Syncing 3 changes...");
    }

    #[test]
    fn test_drain_report_is_success() {
        let ok = DrainReport { delivered: 2, failed: None, remaining: 0 };
        assert!(ok.is_success());

        let stuck = DrainReport {
            delivered: 0,
            failed: Some(DeliveryFailure {
                kind: OpKind::Create,
                note_id: "note_1".into(),
                error: RemoteError::Unavailable,
            }),
            remaining: 1,
        };
        assert!(!stuck.is_success());
    }
}
