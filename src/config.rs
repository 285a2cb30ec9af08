// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the notes sync engine.
//!
//! # Example
//!
//! ```
//! use notes_sync::SyncConfig;
//!
//! // Minimal config (local-only, in-memory state)
//! let config = SyncConfig::default();
//! assert_eq!(config.debounce_ms, 5000);
//!
//! // Against a REST collection, state persisted to disk
//! let config = SyncConfig {
//!     remote_url: Some("https://example.com/api/notes".into()),
//!     state_path: Some("notes-state.db".into()),
//!     debounce_ms: 1000,
//!     ..Default::default()
//! };
//! assert!(config.seed_examples);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::resilience::BackoffPolicy;

/// Configuration for the notes sync engine.
///
/// Every field has a default. Without `remote_url` the engine runs in
/// local-only mode against the state store.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Quiet period after the last mutation before a sync (default: 5 s)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Interval of the background full sync (default: 30 s)
    #[serde(default = "default_periodic_sync_ms")]
    pub periodic_sync_ms: u64,

    /// First retry delay after a failed drain
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// REST collection URL (e.g., "https://host/api/notes")
    #[serde(default)]
    pub remote_url: Option<String>,

    /// SQLite file for durable state; in-memory when unset
    #[serde(default)]
    pub state_path: Option<String>,

    /// Per-request timeout for the HTTP backend
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Seed the example notes on first run
    #[serde(default = "default_seed_examples")]
    pub seed_examples: bool,
}

fn default_debounce_ms() -> u64 { 5000 }
fn default_periodic_sync_ms() -> u64 { 30_000 }
fn default_backoff_initial_ms() -> u64 { 1000 }
fn default_backoff_factor() -> f64 { 2.0 }
fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_seed_examples() -> bool { true }

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            periodic_sync_ms: default_periodic_sync_ms(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_factor: default_backoff_factor(),
            remote_url: None,
            state_path: None,
            request_timeout_ms: default_request_timeout_ms(),
            seed_examples: default_seed_examples(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn periodic_interval(&self) -> Duration {
        // A zero period would make the interval spin
        Duration::from_millis(self.periodic_sync_ms.max(1))
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Drain retry policy, capped at the periodic interval.
    #[must_use]
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::from_millis(self.backoff_initial_ms),
            max_delay: self.periodic_interval(),
            factor: if self.backoff_factor.is_finite() {
                self.backoff_factor.max(1.0)
            } else {
                f64::MAX
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.debounce(), Duration::from_secs(5));
        assert_eq!(config.periodic_interval(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.remote_url.is_none());
        assert!(config.state_path.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"debounce_ms": 250, "remote_url": "http://x/notes"}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.remote_url.as_deref(), Some("http://x/notes"));
        assert_eq!(config.periodic_sync_ms, 30_000);
        assert!(config.seed_examples);
    }

    #[test]
    fn test_backoff_capped_at_period() {
        let config = SyncConfig {
            periodic_sync_ms: 4000,
            ..Default::default()
        };
        let policy = config.backoff_policy();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(10), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_factor_out_of_range() {
        let config = SyncConfig {
            backoff_factor: f64::INFINITY,
            ..Default::default()
        };
        let policy = config.backoff_policy();
        assert!(policy.factor.is_finite());
        assert_eq!(policy.delay_for(2), Duration::from_secs(30));

        let config: SyncConfig = serde_json::from_str(r#"{"backoff_factor": 1e300}"#).unwrap();
        assert_eq!(config.backoff_policy().delay_for(2), Duration::from_secs(30));

        let config = SyncConfig {
            backoff_factor: 0.1,
            ..Default::default()
        };
        assert_eq!(config.backoff_policy().factor, 1.0);
    }
}
