// crates/vigil-economics/src/shared.rs
//
// SharedEngine: one StakingEngine behind one async mutex.
//
// Every closure passed to `with` runs to completion while holding the lock,
// so a ledger operation and its reward settlement are never observed half
// applied by another task.

use std::sync::Arc;

use tokio::sync::Mutex;

use vigil_core::error::VigilError;
use vigil_core::traits::SnapshotStore;

use crate::engine::StakingEngine;

/// Cloneable handle to a shared engine.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<StakingEngine>>,
}

impl SharedEngine {
    pub fn new(engine: StakingEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub async fn with<R>(&self, f: impl FnOnce(&mut StakingEngine) -> R) -> R {
        let mut engine = self.inner.lock().await;
        f(&mut engine)
    }

    /// Persist under the lock so no operation lands between the event drain
    /// and the snapshot.
    pub async fn persist(&self, store: &dyn SnapshotStore) -> Result<u64, VigilError> {
        let mut engine = self.inner.lock().await;
        engine.persist(store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::identity::Account;
    use vigil_core::registry::StaticSubjectRegistry;
    use vigil_core::subject::{Subject, SubjectType};

    use crate::clock::ManualClock;
    use crate::slashing::SlashingParams;

    #[tokio::test]
    async fn test_concurrent_deposits_conserve_shares() {
        let subject = Subject::new(SubjectType::Agent, 3);
        let registry = StaticSubjectRegistry::new().with_subject(subject, 0, u128::MAX);
        let engine = StakingEngine::new(
            Arc::new(registry),
            0,
            SlashingParams::default(),
            Arc::new(ManualClock::new(0)),
        )
        .unwrap();
        let shared = SharedEngine::new(engine);

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let who = Account::from_label(&format!("depositor-{}", i));
                shared
                    .with(|e| {
                        e.mint(who, 1_000)?;
                        e.deposit(&subject, 100 + i as u128, who)
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        shared
            .with(|e| {
                e.check_invariants().unwrap();
                let pool = e.ledger().pool(&subject).unwrap();
                let expected: u128 = (0..16u128).map(|i| 100 + i).sum();
                assert_eq!(pool.total_active_stake, expected);
                assert_eq!(pool.total_active_shares, expected);
            })
            .await;
    }
}
