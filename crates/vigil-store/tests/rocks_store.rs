// crates/vigil-store/tests/rocks_store.rs
//
// RocksStore integration tests: journal sequencing across reopen, and a full
// StakingEngine persist/load cycle on disk.

use std::sync::Arc;

use uuid::Uuid;

use vigil_core::traits::SnapshotStore;
use vigil_core::{Account, AuthContext, Capability, StakeSubjectValidator, StaticSubjectRegistry, Subject, SubjectType};
use vigil_economics::{ManualClock, SlashingParams, StakingEngine, MIN_WITHDRAWAL_DELAY};
use vigil_store::RocksStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a temporary directory path using UUID to avoid conflicts.
fn temp_db_path(label: &str) -> String {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("vigil_test_{}_{}", label, Uuid::now_v7()));
    path.to_string_lossy().to_string()
}

fn subject() -> Subject {
    Subject::new(SubjectType::Scanner, 7)
}

fn registry() -> Arc<dyn StakeSubjectValidator> {
    Arc::new(StaticSubjectRegistry::new().with_subject(subject(), 0, 1_000_000))
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_journal_sequence_survives_reopen() {
    let path = temp_db_path("journal");
    {
        let store = RocksStore::open(&path).unwrap();
        assert_eq!(store.append_events(&[]).await.unwrap(), 0);
        assert_eq!(store.append_events(&[b"a".to_vec(), b"b".to_vec()]).await.unwrap(), 2);
    }

    let store = RocksStore::open(&path).unwrap();
    assert_eq!(store.last_sequence().await, 2);
    assert_eq!(store.append_events(&[b"c".to_vec()]).await.unwrap(), 3);

    let all = store.read_events(0, 100).await.unwrap();
    assert_eq!(
        all,
        vec![(1, b"a".to_vec()), (2, b"b".to_vec()), (3, b"c".to_vec())]
    );
    assert_eq!(store.read_events(2, 1).await.unwrap(), vec![(2, b"b".to_vec())]);
    assert!(store.read_events(4, 10).await.unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&path);
}

#[tokio::test]
async fn test_journal_read_ignores_snapshot_key() {
    let path = temp_db_path("keyspace");
    let store = RocksStore::open(&path).unwrap();
    store.save_snapshot(b"{}").await.unwrap();
    store.append_events(&[b"x".to_vec()]).await.unwrap();

    assert_eq!(store.read_events(1, 10).await.unwrap().len(), 1);
    assert_eq!(store.load_snapshot().await.unwrap(), Some(b"{}".to_vec()));

    let _ = std::fs::remove_dir_all(&path);
}

#[tokio::test]
async fn test_concurrent_appends_get_distinct_sequences() {
    let path = temp_db_path("concurrent");
    let store = Arc::new(RocksStore::open(&path).unwrap());

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.append_events(&[vec![i], vec![i]]).await.unwrap()
        }));
    }
    let mut lasts = Vec::new();
    for handle in handles {
        lasts.push(handle.await.unwrap());
    }
    lasts.sort();
    assert_eq!(lasts, vec![2, 4, 6, 8, 10, 12, 14, 16]);

    let seqs: Vec<u64> = store.read_events(1, 100).await.unwrap().into_iter().map(|(s, _)| s).collect();
    assert_eq!(seqs, (1..=16).collect::<Vec<u64>>());

    let _ = std::fs::remove_dir_all(&path);
}

#[tokio::test]
async fn test_commit_writes_snapshot_with_events() {
    let path = temp_db_path("commit");
    {
        let store = RocksStore::open(&path).unwrap();
        store.append_events(&[b"a".to_vec()]).await.unwrap();
        assert_eq!(store.commit(&[b"b".to_vec(), b"c".to_vec()], b"snap-1").await.unwrap(), 3);
        // A snapshot-only commit keeps the journal where it was.
        assert_eq!(store.commit(&[], b"snap-2").await.unwrap(), 3);
    }

    let store = RocksStore::open(&path).unwrap();
    assert_eq!(store.last_sequence().await, 3);
    assert_eq!(store.load_snapshot().await.unwrap(), Some(b"snap-2".to_vec()));
    let seqs: Vec<u64> = store.read_events(1, 10).await.unwrap().into_iter().map(|(s, _)| s).collect();
    assert_eq!(seqs, vec![1, 2, 3]);

    let _ = std::fs::remove_dir_all(&path);
}

// ---------------------------------------------------------------------------
// Engine round-trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_engine_persist_and_reload_from_disk() {
    let path = temp_db_path("engine");
    let clock = ManualClock::new(10_000);
    let alice = Account::from_label("alice");
    let admin = AuthContext::new(Account::from_label("admin")).with(Capability::Admin);

    let expected = {
        let store = RocksStore::open(&path).unwrap();
        let mut engine = StakingEngine::new(
            registry(),
            MIN_WITHDRAWAL_DELAY,
            SlashingParams::default(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        engine.mint(alice, 5_000).unwrap();
        engine.deposit(&subject(), 2_000, alice).unwrap();
        engine.reward(&subject(), 300, alice).unwrap();
        engine.initiate_withdrawal(&subject(), 500, alice).unwrap();
        engine.set_delay(&admin, 2 * MIN_WITHDRAWAL_DELAY).unwrap();
        engine.persist(&store).await.unwrap();
        engine.snapshot()
    };

    let store = RocksStore::open(&path).unwrap();
    let mut engine = StakingEngine::load(&store, registry(), Arc::new(clock.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(engine.snapshot(), expected);
    assert_eq!(engine.ledger().withdrawal_delay(), 2 * MIN_WITHDRAWAL_DELAY);
    assert_eq!(engine.ledger().available_reward(&subject(), &alice).unwrap(), 300);

    // The unlock time was fixed when the withdrawal started.
    clock.advance(MIN_WITHDRAWAL_DELAY);
    assert_eq!(engine.withdraw(&subject(), alice).unwrap(), 500);
    engine.persist(&store).await.unwrap();

    let names: Vec<&'static str> = StakingEngine::read_events(&store, 1, 100)
        .await
        .unwrap()
        .iter()
        .map(|(_, e)| e.name())
        .collect();
    assert_eq!(
        names,
        vec!["StakeDeposited", "Rewarded", "WithdrawalInitiated", "DelaySet", "WithdrawalExecuted"]
    );

    let _ = std::fs::remove_dir_all(&path);
}
