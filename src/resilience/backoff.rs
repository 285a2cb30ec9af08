// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Exponential backoff for failed drain passes.
//!
//! The remote client never retries on its own. When a drain pass stops on
//! a failed delivery, the engine asks a [`BackoffPolicy`] how long to wait
//! before the next attempt and arms a one-shot timer for it. Delays only
//! grow while failures are consecutive; one clean pass resets them.
//!
//! # Example
//!
//! ```
//! use notes_sync::resilience::backoff::BackoffPolicy;
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::drain(Duration::from_secs(30));
//! assert_eq!(policy.delay_for(1), Duration::from_secs(1));
//! assert_eq!(policy.delay_for(2), Duration::from_secs(2));
//! assert_eq!(policy.delay_for(10), Duration::from_secs(30)); // capped
//! ```

use std::time::Duration;

/// Delay schedule for consecutive failures.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::drain(Duration::from_secs(30))
    }
}

impl BackoffPolicy {
    /// Drain retries: start at one second, double, never wait longer than
    /// the periodic sync would anyway.
    #[must_use]
    pub fn drain(cap: Duration) -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: cap,
            factor: 2.0,
        }
    }

    /// Fast schedule for tests (minimal delays)
    #[must_use]
    pub fn test() -> Self {
        Self {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
        }
    }

    /// Delay before retry number `attempt` (1-based). Attempt 0 means no
    /// failure yet and yields zero.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let mut delay = self.initial_delay.min(self.max_delay);
        for _ in 1..attempt {
            // Overflowing or non-finite products saturate at the cap
            delay = Duration::try_from_secs_f64(delay.as_secs_f64() * self.factor)
                .unwrap_or(self.max_delay)
                .min(self.max_delay);
            if delay == self.max_delay {
                break;
            }
        }
        delay
    }
}
