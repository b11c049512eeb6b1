//! Tally simulation binary.
//!
//! Wires the synchronization engine to the in-memory reference store and
//! runs a short two-client session against one shared counter room,
//! demonstrating join, speculative increments, and convergence.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use tally_core::config::AppConfig;
use tally_core::error::AppError;
use tally_engine::RoomEngine;
use tally_entity::Direction;
use tally_realtime::RoomUpdate;
use tally_store::{JsonFileVault, MemoryStore, RoomStore};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Simulation error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TALLY_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Durable session vault for one simulated client.
///
/// A real client owns the configured vault path outright; the simulation
/// runs several clients in one process, so each gets its own file next
/// to the configured one.
fn client_vault(config: &AppConfig, client: &str) -> JsonFileVault {
    let configured = Path::new(&config.session.vault_path);
    let file_name = match configured.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => format!("{stem}-{client}.json"),
        None => format!("session-{client}.json"),
    };
    JsonFileVault::new(configured.with_file_name(file_name))
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Tally simulation v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MemoryStore::new(config.realtime.channel_buffer_size));
    let room = store.create_room("demo", "laps", Direction::Both, None);
    tracing::info!(room_id = %room.id, "Seeded demo room");

    let alice = RoomEngine::open(
        room.id,
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(client_vault(&config, "alice")),
        &config,
    )
    .await?;
    let bob = RoomEngine::open(
        room.id,
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(client_vault(&config, "bob")),
        &config,
    )
    .await?;

    alice.join("Alice", "cat").await?;
    bob.join("Bob", "dog").await?;

    let mut bob_updates = bob.subscribe();

    for _ in 0..3 {
        let local = alice.increment().await?;
        tracing::info!(local, "Alice incremented");
    }
    let local = bob.decrement().await?;
    tracing::info!(local, "Bob decremented");

    // Drain Bob's update stream until his cache converges on the
    // canonical value.
    let target = store.read_room(room.id).await?.current_count;
    while bob.snapshot().await.current_count != target {
        match bob_updates.recv().await {
            Ok(RoomUpdate::RoomChanged { room, .. }) => {
                tracing::info!(count = room.current_count, "Bob observed snapshot");
            }
            Ok(RoomUpdate::RosterChanged { participants, .. }) => {
                tracing::info!(roster = participants.len(), "Bob observed roster");
            }
            Err(_) => break,
        }
    }

    tracing::info!(
        alice = alice.snapshot().await.current_count,
        bob = bob.snapshot().await.current_count,
        canonical = target,
        "Converged"
    );

    alice.leave().await;
    bob.leave().await;

    Ok(())
}
