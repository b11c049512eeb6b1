//! Integration tests for session issue, verification, and reconnect.

mod helpers;

use std::sync::Arc;

use helpers::TestBed;
use tally_core::error::ErrorKind;
use tally_engine::SessionManager;
use tally_entity::{Direction, PresenceStatus, StoredSession};
use tally_store::{MemoryVault, ParticipantStore, SessionVault};

#[tokio::test]
async fn test_verify_rejects_wrong_token() {
    let bed = TestBed::new(Direction::Both);
    let engine = bed.engine().await;
    let participant = engine.join("Alice", "cat").await.expect("join");

    let sessions = SessionManager::new(bed.store.clone(), &bed.config.session);

    let err = sessions
        .verify(participant.id, "not-the-token")
        .await
        .expect_err("wrong token must fail");
    assert!(err.is(ErrorKind::Auth));

    let err = sessions
        .verify(tally_core::types::ParticipantId::new(), &participant.session_token)
        .await
        .expect_err("unknown participant must fail");
    assert!(err.is(ErrorKind::Auth));
}

#[tokio::test]
async fn test_verify_is_idempotent() {
    let bed = TestBed::new(Direction::Both);
    let engine = bed.engine().await;
    let participant = engine.join("Alice", "cat").await.expect("join");

    let sessions = SessionManager::new(bed.store.clone(), &bed.config.session);

    // Duplicate tabs may verify the same identity concurrently; every
    // verification with the correct token succeeds.
    for _ in 0..3 {
        let verified = sessions
            .verify(participant.id, &participant.session_token)
            .await
            .expect("verify");
        assert_eq!(verified.id, participant.id);
        assert_eq!(verified.status, PresenceStatus::Active);
    }
}

#[tokio::test]
async fn test_resume_restores_identity_without_duplicate() {
    let bed = TestBed::new(Direction::Both);
    let vault: Arc<dyn SessionVault> = Arc::new(MemoryVault::new());

    let joined = {
        let engine = bed.engine_with_vault(vault.clone()).await;
        engine.join("Alice", "cat").await.expect("join")
    };

    // A fresh engine (new tab, restarted client) resumes the identity.
    let engine = bed.engine_with_vault(vault.clone()).await;
    let resumed = engine
        .resume()
        .await
        .expect("resume")
        .expect("session present");
    assert_eq!(resumed.id, joined.id);

    // No duplicate participant was created.
    let roster = bed
        .store
        .read_active_participants(bed.room.id)
        .await
        .expect("roster");
    assert_eq!(roster.len(), 1);

    // And the restored identity can count.
    assert_eq!(engine.increment().await.expect("increment"), 1);
}

#[tokio::test]
async fn test_resume_with_empty_vault() {
    let bed = TestBed::new(Direction::Both);
    let engine = bed.engine().await;
    assert!(engine.resume().await.expect("resume").is_none());
}

#[tokio::test]
async fn test_resume_ignores_other_rooms_session() {
    let bed = TestBed::new(Direction::Both);
    let vault: Arc<dyn SessionVault> = Arc::new(MemoryVault::new());
    vault
        .save(&StoredSession {
            participant_id: tally_core::types::ParticipantId::new(),
            token: "irrelevant".to_string(),
            room_id: tally_core::types::RoomId::new(),
        })
        .expect("save");

    let engine = bed.engine_with_vault(vault.clone()).await;
    assert!(engine.resume().await.expect("resume").is_none());

    // The foreign session is left untouched.
    assert!(vault.load().expect("load").is_some());
}

#[tokio::test]
async fn test_resume_with_tampered_token_clears_vault() {
    let bed = TestBed::new(Direction::Both);
    let vault: Arc<dyn SessionVault> = Arc::new(MemoryVault::new());

    let joined = {
        let engine = bed.engine_with_vault(vault.clone()).await;
        engine.join("Alice", "cat").await.expect("join")
    };

    vault
        .save(&StoredSession {
            participant_id: joined.id,
            token: "tampered".to_string(),
            room_id: bed.room.id,
        })
        .expect("save");

    let engine = bed.engine_with_vault(vault.clone()).await;
    let err = engine.resume().await.expect_err("tampered token must fail");
    assert!(err.is(ErrorKind::Auth));
    assert!(vault.load().expect("load").is_none());
}

#[tokio::test]
async fn test_leave_clears_vault_but_keeps_participant() {
    let bed = TestBed::new(Direction::Both);
    let vault: Arc<dyn SessionVault> = Arc::new(MemoryVault::new());
    let engine = bed.engine_with_vault(vault.clone()).await;
    let participant = engine.join("Alice", "cat").await.expect("join");

    engine.leave().await;

    assert!(vault.load().expect("load").is_none());
    assert!(engine.identity().await.is_none());

    // Participants are soft-deactivated, never deleted.
    let stored = bed
        .store
        .find_participant(participant.id)
        .await
        .expect("find")
        .expect("still present");
    assert_eq!(stored.status, PresenceStatus::Inactive);
}
