//! Integration tests for counter mutation, rollback, and the documented
//! lost-update hazard.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

use helpers::{FailingEventLog, FlakyRoomStore, TestBed};
use tally_core::config::{AppConfig, LimiterConfig};
use tally_core::error::ErrorKind;
use tally_core::types::ParticipantId;
use tally_engine::{CounterSync, RateLimiter, RoomEngine};
use tally_entity::Direction;
use tally_store::{MemoryVault, RoomStore};

fn counter_sync(
    bed: &TestBed,
    rooms: Arc<dyn RoomStore>,
    starting_count: i64,
) -> CounterSync {
    let mut cached = bed.room.clone();
    cached.current_count = starting_count;
    CounterSync::new(
        bed.room.id,
        Arc::new(RwLock::new(cached)),
        rooms,
        bed.store.clone(),
        Arc::new(Mutex::new(RateLimiter::new(&bed.config.limiter))),
    )
}

#[tokio::test]
async fn test_up_room_rejects_decrement() {
    let bed = TestBed::new(Direction::Up);
    let engine = bed.engine().await;
    engine.join("Alice", "cat").await.expect("join");

    assert_eq!(engine.increment().await.expect("increment"), 1);

    let err = engine.decrement().await.expect_err("decrement must fail");
    assert!(err.is(ErrorKind::Validation));

    // Rejected as a no-op: neither the local view nor the store moved.
    assert_eq!(engine.snapshot().await.current_count, 1);
    let canonical = bed.store.read_room(bed.room.id).await.expect("read");
    assert_eq!(canonical.current_count, 1);
}

#[tokio::test]
async fn test_down_room_has_no_floor() {
    let bed = TestBed::new(Direction::Down);
    let engine = bed.engine().await;
    engine.join("Alice", "cat").await.expect("join");

    assert_eq!(engine.decrement().await.expect("decrement"), -1);
    assert_eq!(engine.decrement().await.expect("decrement"), -2);

    let err = engine.increment().await.expect_err("increment must fail");
    assert!(err.is(ErrorKind::Validation));
    assert_eq!(engine.snapshot().await.current_count, -2);
}

#[tokio::test]
async fn test_mutation_requires_identity() {
    let bed = TestBed::new(Direction::Both);
    let engine = bed.engine().await;

    let err = engine.increment().await.expect_err("must require join");
    assert!(err.is(ErrorKind::Auth));
}

#[tokio::test]
async fn test_rate_limit_surfaces_cooldown() {
    let config = AppConfig {
        limiter: LimiterConfig {
            max_events: 2,
            window_millis: 60_000,
        },
        ..AppConfig::default()
    };
    let bed = TestBed::with_config(Direction::Both, config);
    let engine = bed.engine().await;
    engine.join("Alice", "cat").await.expect("join");

    engine.increment().await.expect("first");
    engine.increment().await.expect("second");

    let err = engine.increment().await.expect_err("third must throttle");
    assert!(err.is(ErrorKind::RateLimit));
    let cooldown = err.retry_after.expect("cooldown attached");
    assert!(cooldown > Duration::ZERO);

    // Throttled call mutated nothing.
    assert_eq!(engine.snapshot().await.current_count, 2);
    let canonical = bed.store.read_room(bed.room.id).await.expect("read");
    assert_eq!(canonical.current_count, 2);
}

#[tokio::test]
async fn test_speculative_update_rolls_back_on_write_failure() {
    let bed = TestBed::new(Direction::Both);
    let flaky = FlakyRoomStore::new(bed.store.clone());
    bed.store
        .write_room_count(bed.room.id, 5, chrono::Utc::now())
        .await
        .expect("seed count");

    let sync = Arc::new(counter_sync(&bed, flaky.clone(), 5));
    flaky.hold_writes();
    flaky.fail_writes(true);

    let actor = ParticipantId::new();
    let apply = tokio::spawn({
        let sync = sync.clone();
        async move { sync.apply(1, actor).await }
    });

    // While the authoritative write is in flight the speculative value
    // is already visible locally.
    flaky.write_in_flight().await;
    assert_eq!(sync.snapshot().await.current_count, 6);

    flaky.release();
    let err = apply
        .await
        .expect("task")
        .expect_err("write failure must surface");
    assert!(err.is(ErrorKind::Io));

    // Rolled back to the value held before the speculative update.
    assert_eq!(sync.snapshot().await.current_count, 5);
    let canonical = bed.store.read_room(bed.room.id).await.expect("read");
    assert_eq!(canonical.current_count, 5);
}

#[tokio::test]
async fn test_lost_update_last_write_wins() {
    let bed = TestBed::new(Direction::Both);
    bed.store
        .write_room_count(bed.room.id, 5, chrono::Utc::now())
        .await
        .expect("seed count");

    // Two clients that both observed count = 5 and never see each
    // other's write before issuing their own.
    let first = counter_sync(&bed, bed.store.clone(), 5);
    let second = counter_sync(&bed, bed.store.clone(), 5);

    first.apply(1, ParticipantId::new()).await.expect("first");
    second.apply(1, ParticipantId::new()).await.expect("second");

    // No atomic increment: both wrote 6, one update was lost.
    let canonical = bed.store.read_room(bed.room.id).await.expect("read");
    assert_eq!(canonical.current_count, 6);
}

#[tokio::test]
async fn test_audit_events_recorded_best_effort() {
    let bed = TestBed::new(Direction::Both);
    let engine = bed.engine().await;
    engine.join("Alice", "cat").await.expect("join");

    engine.increment().await.expect("increment");
    engine.increment().await.expect("increment");
    engine.leave().await;

    // Appends run detached from the mutation path.
    timeout(Duration::from_secs(2), async {
        loop {
            if bed.store.events_for(bed.room.id).await.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("events recorded");

    let events = bed.store.events_for(bed.room.id).await;
    assert!(events.iter().all(|e| e.delta == 1));
}

#[tokio::test]
async fn test_audit_failure_never_surfaces() {
    let bed = TestBed::new(Direction::Both);
    let engine = RoomEngine::open(
        bed.room.id,
        bed.store.clone(),
        bed.store.clone(),
        Arc::new(FailingEventLog),
        Arc::new(MemoryVault::new()),
        &bed.config,
    )
    .await
    .expect("open engine");
    engine.join("Alice", "cat").await.expect("join");

    // The mutation succeeds even though every audit append fails.
    assert_eq!(engine.increment().await.expect("increment"), 1);
    let canonical = bed.store.read_room(bed.room.id).await.expect("read");
    assert_eq!(canonical.current_count, 1);
}
