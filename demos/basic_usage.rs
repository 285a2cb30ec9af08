// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic notes-sync usage example.
//!
//! Demonstrates:
//! 1. Starting in local-only mode (collection persisted in SQLite)
//! 2. First-run seeding of the example notes
//! 3. Creating, editing and completing notes (instant, local)
//! 4. The delete confirmation handshake
//! 5. Forcing a sync and reading the status indicator
//! 6. Displaying metrics and shutting down
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```
//!
//! Set `RUST_LOG=notes_sync=debug` to watch the drain and pull passes.

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use notes_sync::{SyncConfig, SyncEngine, SyncOutcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notes_sync=info")))
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║             notes-sync: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Configure and start the engine
    // ─────────────────────────────────────────────────────────────────────────
    let dir = tempfile::tempdir()?;
    let config = SyncConfig {
        // No remote_url: the collection lives next to the engine state
        state_path: Some(dir.path().join("notes.db").to_string_lossy().to_string()),
        // Deliver quickly for the demo
        debounce_ms: 200,
        ..Default::default()
    };

    println!("📦 Configuring notes-sync (local-only mode)...");
    let engine = Arc::new(SyncEngine::from_config(config).await?);
    println!("   State: {}", engine.state());

    engine.start().await?;
    let handle = engine.spawn();
    println!("   ✅ Engine running! State: {}", engine.state());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. First run seeds the example notes
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📖 Notes after first start:");
    for note in engine.notes() {
        println!("   └─ {} → {}", note.id(), note.title());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Local mutations (no network round-trip)
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Editing...");
    let milk = engine.create_note("Buy milk", "semi-skimmed, 2 litres")?;
    engine.update_note(milk.id(), "Buy milk and bread", "semi-skimmed, 2 litres")?;
    engine.toggle_completion("example_3")?;
    println!("   └─ Status: {}", engine.status());

    if let Err(e) = engine.create_note("   ", "") {
        println!("   └─ Rejected blank title: {e}");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Delete needs confirmation
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🗑️  Deleting example_2...");
    let request = engine.request_delete("example_2")?;
    println!("   └─ Confirmation pending for '{}'", request.note_id);
    engine.confirm_delete(request.token)?;

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Sync
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n⏳ Syncing...");
    match engine.sync_now().await {
        SyncOutcome::Completed { drain, pull } => {
            println!("   └─ Delivered {} operations, pull: {:?}", drain.delivered, pull);
        }
        SyncOutcome::Skipped => println!("   └─ Debounced sync already running"),
    }
    println!("   └─ Status: {}", engine.status());

    let counts = engine.counts();
    println!("\n📋 {} notes ({} completed):", counts.total, counts.completed);
    for note in engine.notes() {
        let mark = if note.is_completed() { "✔" } else { " " };
        println!("   [{mark}] {}", note.title());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics and shutdown
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📊 Engine Metrics:");
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let rendered = match value {
            DebugValue::Counter(v) => v.to_string(),
            DebugValue::Gauge(v) => format!("{}", v.into_inner()),
            DebugValue::Histogram(samples) => format!("{} samples", samples.len()),
        };
        println!("   └─ {} = {}", key.key().name(), rendered);
    }

    println!("\n🛑 Shutting down...");
    engine.shutdown();
    handle.await?;
    println!("   ✅ Stopped. State: {}", engine.state());

    Ok(())
}
