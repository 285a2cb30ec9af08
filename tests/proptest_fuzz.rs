// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property-based tests (fuzzing) for the notes sync engine.
//!
//! Uses proptest to generate random/malformed inputs and verify decoding
//! never panics, ordering rules hold, and no mutation is ever lost however
//! the remote flaps.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use notes_sync::policy::{compare, snapshots_equal, sort_notes};
use notes_sync::{
    Completion, InMemoryRemote, Note, NoteError, RemoteStore, SyncConfig, SyncEngine, Timestamp,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Millis within chrono's comfortable range (1970 to ~2096)
fn millis_strategy() -> impl Strategy<Value = i64> {
    0i64..4_000_000_000_000
}

/// A note as it might come back from any remote: display fields optional
fn wire_note_strategy() -> impl Strategy<Value = Value> {
    (
        "[a-z_]{0,6}[0-9]{0,14}",
        ".{0,20}",
        any::<bool>(),
        proptest::option::of(millis_strategy()),
        proptest::option::of("[0-9/]{0,10}"),
        proptest::option::of("[0-9:]{0,8}"),
        proptest::option::of(millis_strategy()),
        proptest::option::of(millis_strategy()),
    )
        .prop_map(|(id, title, done, ts, date, time, edited, completed)| {
            let mut value = json!({ "id": id, "title": title, "isCompleted": done });
            if let Some(ts) = ts {
                value["timestamp"] = json!(ts);
            }
            if let Some(date) = date {
                value["date"] = json!(date);
            }
            if let Some(time) = time {
                value["time"] = json!(time);
            }
            if let Some(edited) = edited {
                value["lastEdited"] = json!({ "timestamp": edited });
            }
            if let Some(completed) = completed {
                value["completedAt"] = json!({ "timestamp": completed });
            }
            value
        })
}

/// Generate arbitrary JSON values (including invalid structures)
fn arbitrary_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        4,  // depth
        64, // max nodes
        10, // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
                prop::collection::hash_map(
                    prop_oneof![
                        Just("id".to_string()),
                        Just("title".to_string()),
                        Just("isCompleted".to_string()),
                        Just("timestamp".to_string()),
                        Just("completedAt".to_string()),
                        "[a-z]{1,10}".prop_map(String::from),
                    ],
                    inner,
                    0..10
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// A fully-formed note with a random position in display order
fn sortable_note_strategy() -> impl Strategy<Value = Note> {
    (
        "[a-z]{1,8}",
        millis_strategy(),
        proptest::option::of(millis_strategy()),
        proptest::option::of(millis_strategy()),
    )
        .prop_map(|(id, created, edited, completed)| {
            let mut note = Note::with_id(&id, "t", "", Timestamp::from_millis(created));
            if let Some(edited) = edited {
                note = note.with_last_edited(Timestamp::from_millis(edited));
            }
            if let Some(completed) = completed {
                note = note.with_completion(Completion::Completed(Timestamp::from_millis(completed)));
            }
            note
        })
}

/// One user action against the engine, or a sync with the network up or down
#[derive(Debug, Clone)]
enum Step {
    Create(String),
    Update(usize, String),
    Toggle(usize),
    Delete(usize),
    Sync { offline: bool },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => "[a-zA-Z ]{0,10}".prop_map(Step::Create),
        2 => (any::<usize>(), "[a-z]{1,8}").prop_map(|(i, t)| Step::Update(i, t)),
        2 => any::<usize>().prop_map(Step::Toggle),
        1 => any::<usize>().prop_map(Step::Delete),
        2 => any::<bool>().prop_map(|offline| Step::Sync { offline }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Expected `(title, completed)` per note id
type Model = BTreeMap<String, (String, bool)>;

fn matches_model(notes: &[Note], model: &Model) -> bool {
    notes.len() == model.len()
        && notes.iter().all(|note| {
            model
                .get(note.id())
                .is_some_and(|(title, done)| note.title() == title && note.is_completed() == *done)
        })
}

// =============================================================================
// Fuzz: note decoding
// =============================================================================

proptest! {
    /// Random bytes never panic the decoder.
    #[test]
    fn fuzz_note_from_random_bytes(bytes in prop::collection::vec(any::<u8>(), 0..1000)) {
        let _ = serde_json::from_slice::<Note>(&bytes);
        let _ = serde_json::from_slice::<Vec<Note>>(&bytes);
    }

    /// Arbitrary JSON structures decode or fail cleanly.
    #[test]
    fn fuzz_note_from_arbitrary_json(value in arbitrary_json_strategy()) {
        let _ = serde_json::from_value::<Note>(value.clone());
        let _ = serde_json::from_value::<Vec<Note>>(Value::Array(vec![value]));
    }

    /// Flipping bytes in a valid note never panics.
    #[test]
    fn fuzz_corrupted_note(
        value in wire_note_strategy(),
        corruptions in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..8),
    ) {
        let mut bytes = serde_json::to_vec(&value).unwrap();
        for (index, byte) in corruptions {
            let at = index.index(bytes.len());
            bytes[at] = byte;
        }
        let _ = serde_json::from_slice::<Note>(&bytes);
    }
}

// =============================================================================
// Properties: normalization
// =============================================================================

proptest! {
    /// Any record with an id decodes into a complete note.
    #[test]
    fn prop_decoded_notes_are_complete(value in wire_note_strategy()) {
        let note: Note = serde_json::from_value(value.clone()).unwrap();

        prop_assert!(!note.created_at().is_partial());
        prop_assert!(note.last_edited().map_or(true, |t| !t.is_partial()));
        prop_assert_eq!(note.is_completed(), value["isCompleted"] == true);
        prop_assert_eq!(note.completed_at().is_some(), note.is_completed());
    }

    /// Normalizing an already normalized note changes nothing.
    #[test]
    fn prop_normalization_is_idempotent(value in wire_note_strategy()) {
        let once: Note = serde_json::from_value(value).unwrap();
        let twice: Note = serde_json::from_value(serde_json::to_value(&once).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// A pending note never serializes a completion time.
    #[test]
    fn prop_pending_notes_omit_completed_at(value in wire_note_strategy()) {
        let note: Note = serde_json::from_value(value).unwrap();
        let json = serde_json::to_value(&note).unwrap();
        prop_assert_eq!(json.get("completedAt").is_some(), note.is_completed());
    }
}

// =============================================================================
// Properties: ordering and equality
// =============================================================================

proptest! {
    /// Incomplete first, then newest activity first.
    #[test]
    fn prop_sort_order(mut notes in prop::collection::vec(sortable_note_strategy(), 0..30)) {
        sort_notes(&mut notes);

        let first_completed = notes.iter().position(Note::is_completed).unwrap_or(notes.len());
        prop_assert!(notes[first_completed..].iter().all(Note::is_completed));

        for pair in notes.windows(2) {
            prop_assert_ne!(compare(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
            if pair[0].is_completed() == pair[1].is_completed() {
                prop_assert!(pair[0].last_activity_millis() >= pair[1].last_activity_millis());
            }
        }
    }

    /// Order and timestamps never make two snapshots differ.
    #[test]
    fn prop_snapshot_equality_ignores_order_and_timestamps(
        notes in prop::collection::btree_map("[a-z]{1,6}", ".{0,8}", 0..15),
        touched in millis_strategy(),
    ) {
        let left: Vec<Note> = notes
            .iter()
            .map(|(id, title)| Note::with_id(id, title, "", Timestamp::from_millis(1)))
            .collect();
        let mut right: Vec<Note> = left
            .iter()
            .cloned()
            .map(|n| n.with_last_edited(Timestamp::from_millis(touched)))
            .collect();
        right.reverse();

        prop_assert!(snapshots_equal(&left, &right));
        prop_assert!(snapshots_equal(&right, &left));

        if let Some(first) = right.first_mut() {
            *first = Note::with_id(first.id(), "changed!", "", Timestamp::from_millis(1));
            let changed = left.iter().any(|n| n.id() == first.id() && n.title() != "changed!");
            prop_assert_eq!(snapshots_equal(&left, &right), !changed);
        }
    }
}

// =============================================================================
// Properties: no lost mutations
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the sequence of edits and outages, the cache always shows
    /// every local edit, nothing leaves the queue undelivered, and once the
    /// network is back the remote converges to the cache.
    #[test]
    fn prop_no_mutation_is_lost(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let remote = Arc::new(InMemoryRemote::new());
            let engine = SyncEngine::new(SyncConfig::default(), remote.clone());
            let mut model = Model::new();
            let mut queued = 0usize;

            let pick = |model: &Model, i: usize| model.keys().nth(i % model.len()).cloned();

            for step in steps {
                match step {
                    Step::Create(title) => match engine.create_note(&title, "") {
                        Ok(note) => {
                            model.insert(note.id().to_string(), (title.trim().to_string(), false));
                            queued += 1;
                        }
                        Err(e) => prop_assert_eq!(e, NoteError::EmptyTitle),
                    },
                    Step::Update(i, title) if !model.is_empty() => {
                        let id = pick(&model, i).unwrap();
                        engine.update_note(&id, &title, "").unwrap();
                        model.get_mut(&id).unwrap().0 = title;
                        queued += 1;
                    }
                    Step::Toggle(i) if !model.is_empty() => {
                        let id = pick(&model, i).unwrap();
                        engine.toggle_completion(&id).unwrap();
                        let entry = model.get_mut(&id).unwrap();
                        entry.1 = !entry.1;
                        queued += 1;
                    }
                    Step::Delete(i) if !model.is_empty() => {
                        let id = pick(&model, i).unwrap();
                        let request = engine.request_delete(&id).unwrap();
                        engine.confirm_delete(request.token).unwrap();
                        model.remove(&id);
                        queued += 1;
                    }
                    Step::Sync { offline } => {
                        remote.set_offline(offline);
                        if let notes_sync::SyncOutcome::Completed { drain, .. } = engine.sync_now().await {
                            prop_assert_eq!(drain.delivered + drain.remaining, queued);
                            queued = drain.remaining;
                        }
                    }
                    _ => {}
                }

                prop_assert_eq!(engine.pending_operations(), queued);
                prop_assert!(matches_model(&engine.notes(), &model));
            }

            remote.set_offline(false);
            engine.sync_now().await;

            prop_assert_eq!(engine.pending_operations(), 0);
            prop_assert!(matches_model(&engine.notes(), &model));
            prop_assert!(snapshots_equal(&engine.notes(), &remote.snapshot()));
            Ok::<(), TestCaseError>(())
        })?;
    }
}

proptest! {
    /// Delivering the same update again leaves the remote where the first
    /// delivery put it.
    #[test]
    fn prop_update_delivery_is_idempotent(
        title in "[a-zA-Z]{1,12}",
        description in ".{0,20}",
        repeats in 2usize..5,
    ) {
        let rt = runtime();
        rt.block_on(async {
            let remote = InMemoryRemote::new();
            remote.seed(vec![Note::with_id("n", "Original", "", Timestamp::from_millis(1))]);
            let edited = Note::with_id("n", title.as_str(), description.as_str(), Timestamp::from_millis(1))
                .with_last_edited(Timestamp::from_millis(2));

            remote.update("n", &edited).await.unwrap();
            let after_first = remote.snapshot();
            for _ in 1..repeats {
                remote.update("n", &edited).await.unwrap();
            }

            prop_assert_eq!(remote.snapshot(), after_first);
            prop_assert_eq!(remote.applied(notes_sync::OpKind::Update, "n"), repeats as u64);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
