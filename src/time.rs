// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Timestamp records and note id generation.
//!
//! A [`Timestamp`] carries the same instant three ways: a display date,
//! a display time and epoch millis. Only `epoch_millis` takes part in
//! ordering; the strings exist for rendering and are always derived from it.
//!
//! # Example
//!
//! ```
//! use notes_sync::time::{Timestamp, millis_from_id};
//!
//! let ts = Timestamp::from_millis(1_700_000_000_000);
//! assert_eq!(ts.epoch_millis, 1_700_000_000_000);
//! assert_eq!(ts.date.len(), 10); // dd/mm/yyyy
//! assert_eq!(ts.time.len(), 8);  // HH:MM:SS
//!
//! assert_eq!(millis_from_id("note_1700000000000"), Some(1_700_000_000_000));
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of client-generated note ids.
pub const NOTE_ID_PREFIX: &str = "note_";

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Last millis handed out by [`next_note_stamp`].
static LAST_ISSUED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// A display-ready timestamp.
///
/// Serialized as `{ "date", "time", "timestamp" }`, the shape the note
/// collection stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    /// Local date, `dd/mm/yyyy`
    #[serde(default)]
    pub date: String,
    /// Local time, `HH:MM:SS` (24h)
    #[serde(default)]
    pub time: String,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "timestamp", default, deserialize_with = "deserialize_epoch_millis")]
    pub epoch_millis: i64,
}

impl Timestamp {
    /// Timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self::from_millis(now_millis())
    }

    /// Build all three fields from one instant.
    ///
    /// Out-of-range values collapse to the epoch so the record stays
    /// self-consistent.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        let instant = DateTime::<Utc>::from_timestamp_millis(millis)
            .unwrap_or_default()
            .with_timezone(&Local);

        Self {
            date: instant.format(DATE_FORMAT).to_string(),
            time: instant.format(TIME_FORMAT).to_string(),
            epoch_millis: instant.timestamp_millis(),
        }
    }

    /// Whether the display fields are missing.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.date.is_empty() || self.time.is_empty()
    }

    /// Rebuild the display fields from `epoch_millis` if either is missing.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.is_partial() {
            Self::from_millis(self.epoch_millis)
        } else {
            self
        }
    }
}

/// Epoch millis as other clients write them.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseMillis {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl LooseMillis {
    fn into_millis(self) -> Option<i64> {
        match self {
            Self::Int(millis) => Some(millis),
            // Saturating cast; fractional millis are dropped
            Self::Float(millis) if millis.is_finite() => Some(millis as i64),
            Self::Text(text) => {
                let text = text.trim();
                text.parse::<i64>().ok().or_else(|| {
                    text.parse::<f64>()
                        .ok()
                        .filter(|millis| millis.is_finite())
                        .map(|millis| millis as i64)
                })
            }
            _ => None,
        }
    }
}

/// Read epoch millis from an integer, a float or a numeric string.
///
/// Anything else (including `null`) reads as absent rather than failing
/// the surrounding record.
pub(crate) fn deserialize_loose_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LooseMillis>::deserialize(deserializer)?.and_then(LooseMillis::into_millis))
}

fn deserialize_epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_loose_millis(deserializer)?.unwrap_or_default())
}

/// Current wall-clock time in epoch millis.
#[must_use]
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a fresh note id together with its creation timestamp.
///
/// Ids are `note_<epoch-millis>`. Two notes created within the same
/// millisecond get consecutive millis, so ids never collide within a
/// process and the id always agrees with `createdAt`.
#[must_use]
pub fn next_note_stamp() -> (String, Timestamp) {
    let now = now_millis();
    let previous = LAST_ISSUED_MILLIS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    let millis = now.max(previous + 1);

    (format!("{NOTE_ID_PREFIX}{millis}"), Timestamp::from_millis(millis))
}

/// Recover epoch millis from the digits embedded in a note id.
///
/// All ASCII digits in the id are concatenated, so `note_1700000000000`
/// yields `1700000000000`. Returns `None` if the id has no digits or the
/// number does not fit.
#[must_use]
pub fn millis_from_id(id: &str) -> Option<i64> {
    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
