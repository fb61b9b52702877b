// crates/vigil-economics/src/engine.rs
//
// StakingEngine: the unit of state the CLI drives and the store persists.
//
// Bundles the stake ledger (with its token custody), the slashing controller
// and a clock. Every operation stamps the current time from the clock and
// forwards to the ledger or controller. Events recorded by an operation stay
// in the ledger's journal until `persist` writes them out with the next
// snapshot.

use std::sync::Arc;

use vigil_core::auth::{AuthContext, Capability};
use vigil_core::error::VigilError;
use vigil_core::identity::Account;
use vigil_core::subject::{ShareKind, Subject};
use vigil_core::traits::{SnapshotStore, StakeSubjectValidator};

use crate::clock::Clock;
use crate::controller::SlashingController;
use crate::events::EngineEvent;
use crate::proposal::ProposalState;
use crate::schema::{self, EngineSnapshot, HolderRecord, PoolRecord, CURRENT_SCHEMA_VERSION};
use crate::slashing::{ReasonCode, SlashPenalty, SlashingParams};
use crate::staking::StakeLedger;
use crate::token::{Amount, Shares};
use crate::treasury::SlashSplit;

pub struct StakingEngine {
    ledger: StakeLedger,
    controller: SlashingController,
    clock: Arc<dyn Clock>,
}

impl StakingEngine {
    /// Fresh engine with empty pools.
    pub fn new(
        validator: Arc<dyn StakeSubjectValidator>,
        withdrawal_delay: u64,
        params: SlashingParams,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VigilError> {
        Ok(Self {
            ledger: StakeLedger::new(validator, withdrawal_delay)?,
            controller: SlashingController::new(params)?,
            clock,
        })
    }

    /// Rebuild an engine from a decoded snapshot and verify its invariants.
    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        validator: Arc<dyn StakeSubjectValidator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VigilError> {
        let pools = snapshot
            .pools
            .into_iter()
            .map(|r| (r.subject, r.pool))
            .collect();
        let holders = snapshot
            .holders
            .into_iter()
            .map(|r| ((r.subject, r.account), r.balance))
            .collect();
        let ledger = StakeLedger::from_parts(
            validator,
            snapshot.withdrawal_delay,
            snapshot.token,
            pools,
            holders,
        )?;
        let controller = SlashingController::from_state(snapshot.controller)?;
        let engine = Self {
            ledger,
            controller,
            clock,
        };
        engine.check_invariants()?;
        Ok(engine)
    }

    /// Current state in the persisted layout.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            schema_version: CURRENT_SCHEMA_VERSION,
            withdrawal_delay: self.ledger.withdrawal_delay(),
            token: self.ledger.token().clone(),
            pools: self
                .ledger
                .pools()
                .map(|(subject, pool)| PoolRecord {
                    subject: *subject,
                    pool: pool.clone(),
                })
                .collect(),
            holders: self
                .ledger
                .holders()
                .map(|((subject, account), balance)| HolderRecord {
                    subject: *subject,
                    account: *account,
                    balance: balance.clone(),
                })
                .collect(),
            controller: self.controller.to_state(),
        }
    }

    pub fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    pub fn controller(&self) -> &SlashingController {
        &self.controller
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Drain events recorded since the last drain.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        self.ledger.take_events()
    }

    /// Ledger invariants plus: escrow holds exactly the outstanding bonds.
    pub fn check_invariants(&self) -> Result<(), VigilError> {
        self.ledger.check_invariants()?;
        let escrow = self.ledger.token().balance_of(&self.controller.escrow());
        let bonds = self.controller.escrowed_bonds();
        if escrow != bonds {
            return Err(VigilError::InvariantViolation(format!(
                "escrow holds {}, open proposals account for {}",
                escrow, bonds
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    /// Create tokens out of thin air. Development networks only.
    pub fn mint(&mut self, to: Account, amount: Amount) -> Result<(), VigilError> {
        self.ledger.token_mut().mint(to, amount)
    }

    pub fn balance_of(&self, account: &Account) -> Amount {
        self.ledger.token().balance_of(account)
    }

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------

    pub fn deposit(&mut self, subject: &Subject, amount: Amount, depositor: Account) -> Result<Shares, VigilError> {
        let now = self.now();
        self.ledger.deposit(subject, amount, depositor, now)
    }

    pub fn initiate_withdrawal(&mut self, subject: &Subject, shares: Shares, holder: Account) -> Result<u64, VigilError> {
        let now = self.now();
        self.ledger.initiate_withdrawal(subject, shares, holder, now)
    }

    pub fn withdraw(&mut self, subject: &Subject, holder: Account) -> Result<Amount, VigilError> {
        let now = self.now();
        self.ledger.withdraw(subject, holder, now)
    }

    pub fn reward(&mut self, subject: &Subject, amount: Amount, payer: Account) -> Result<(), VigilError> {
        let now = self.now();
        self.ledger.reward(subject, amount, payer, now)
    }

    pub fn release_reward(&mut self, subject: &Subject, holder: Account) -> Result<Amount, VigilError> {
        self.ledger.release_reward(subject, holder)
    }

    pub fn transfer(
        &mut self,
        subject: &Subject,
        from: Account,
        to: Account,
        kind: ShareKind,
        shares: Shares,
    ) -> Result<(), VigilError> {
        self.ledger.transfer(subject, from, to, kind, shares)
    }

    /// Direct slash of a frozen pool, outside the proposal flow. Proceeds
    /// are split with the configured treasury.
    pub fn slash(
        &mut self,
        auth: &AuthContext,
        subject: &Subject,
        amount: Amount,
        proposer: Account,
    ) -> Result<SlashSplit, VigilError> {
        let treasury = self.controller.params().treasury.clone();
        self.ledger.slash(auth, subject, amount, proposer, &treasury)
    }

    /// Manual freeze toggle. A pool held by open slash proposals stays frozen
    /// until the last of them closes.
    pub fn freeze(&mut self, auth: &AuthContext, subject: &Subject, frozen: bool) -> Result<(), VigilError> {
        let open = self.controller.open_proposals(subject);
        if !frozen && open > 0 {
            auth.require(Capability::Slasher)?;
            return Err(VigilError::StakeFrozen(format!(
                "{} is held by {} open slash proposal(s)",
                subject, open
            )));
        }
        self.ledger.freeze(auth, subject, frozen)
    }

    pub fn set_delay(&mut self, auth: &AuthContext, seconds: u64) -> Result<(), VigilError> {
        self.ledger.set_delay(auth, seconds)
    }

    // ------------------------------------------------------------------
    // Slash proposals
    // ------------------------------------------------------------------

    pub fn set_penalty(&mut self, auth: &AuthContext, reason: ReasonCode, penalty: SlashPenalty) -> Result<(), VigilError> {
        self.controller.set_penalty(&mut self.ledger, auth, reason, penalty)
    }

    pub fn propose_slash(
        &mut self,
        auth: &AuthContext,
        subject: Subject,
        reason: ReasonCode,
        evidence: Vec<String>,
        bond: Amount,
    ) -> Result<u64, VigilError> {
        let now = self.now();
        self.controller
            .propose_slash(&mut self.ledger, auth, subject, reason, evidence, bond, now)
    }

    pub fn mark_as_in_review_slash_proposal(&mut self, auth: &AuthContext, id: u64) -> Result<(), VigilError> {
        let now = self.now();
        self.controller
            .mark_as_in_review_slash_proposal(&mut self.ledger, auth, id, now)
    }

    pub fn mark_as_reviewed_slash_proposal(&mut self, auth: &AuthContext, id: u64) -> Result<(), VigilError> {
        let now = self.now();
        self.controller
            .mark_as_reviewed_slash_proposal(&mut self.ledger, auth, id, now)
    }

    pub fn dismiss_slash_proposal(&mut self, auth: &AuthContext, id: u64) -> Result<(), VigilError> {
        let now = self.now();
        self.controller.dismiss_slash_proposal(&mut self.ledger, auth, id, now)
    }

    pub fn reject_slash_proposal(&mut self, auth: &AuthContext, id: u64) -> Result<(), VigilError> {
        let now = self.now();
        self.controller.reject_slash_proposal(&mut self.ledger, auth, id, now)
    }

    pub fn revert_slash_proposal(&mut self, auth: &AuthContext, id: u64) -> Result<(), VigilError> {
        let now = self.now();
        self.controller.revert_slash_proposal(&mut self.ledger, auth, id, now)
    }

    pub fn execute_slash_proposal(&mut self, auth: &AuthContext, id: u64) -> Result<SlashSplit, VigilError> {
        let now = self.now();
        self.controller.execute_slash_proposal(&mut self.ledger, auth, id, now)
    }

    pub fn submit_evidence(&mut self, auth: &AuthContext, id: u64, evidence: Vec<String>) -> Result<(), VigilError> {
        let now = self.now();
        self.controller
            .submit_evidence(&mut self.ledger, auth, id, evidence, now)
    }

    pub fn review_slash_proposal_parameters(
        &mut self,
        auth: &AuthContext,
        id: u64,
        subject: Option<Subject>,
        reason: Option<ReasonCode>,
        evidence: Vec<String>,
    ) -> Result<(), VigilError> {
        let now = self.now();
        self.controller.review_slash_proposal_parameters(
            &mut self.ledger,
            auth,
            id,
            subject,
            reason,
            evidence,
            now,
        )
    }

    pub fn get_slashed_stake_value(&self, id: u64) -> Result<Amount, VigilError> {
        self.controller.get_slashed_stake_value(&self.ledger, id)
    }

    pub fn current_state(&self, id: u64) -> ProposalState {
        self.controller.current_state(id)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Journal pending events and overwrite the stored snapshot in one
    /// atomic store write.
    ///
    /// Events leave the in-memory journal only after the store accepts the
    /// write, so a failed persist can be retried without losing them.
    /// Returns the sequence number of the last journaled event.
    pub async fn persist(&mut self, store: &dyn SnapshotStore) -> Result<u64, VigilError> {
        let encoded = self
            .ledger
            .pending_events()
            .iter()
            .map(serde_json::to_vec)
            .collect::<Result<Vec<_>, _>>()?;
        let snapshot = self.snapshot().to_bytes()?;
        let last_seq = store.commit(&encoded, &snapshot).await?;
        self.take_events();
        tracing::debug!("Persisted snapshot with {} new events (last seq {})", encoded.len(), last_seq);
        Ok(last_seq)
    }

    /// Load the stored snapshot, migrating older layouts.
    ///
    /// Returns `None` if the store has never been written.
    pub async fn load(
        store: &dyn SnapshotStore,
        validator: Arc<dyn StakeSubjectValidator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Option<Self>, VigilError> {
        let bytes = match store.load_snapshot().await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let snapshot = schema::decode_snapshot(&bytes)?;
        Ok(Some(Self::from_snapshot(snapshot, validator, clock)?))
    }

    /// Read journaled events starting at sequence `from`.
    pub async fn read_events(
        store: &dyn SnapshotStore,
        from: u64,
        limit: usize,
    ) -> Result<Vec<(u64, EngineEvent)>, VigilError> {
        let raw = store.read_events(from, limit).await?;
        let mut events = Vec::with_capacity(raw.len());
        for (seq, bytes) in raw {
            let event: EngineEvent = serde_json::from_slice(&bytes)?;
            events.push((seq, event));
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::registry::StaticSubjectRegistry;
    use vigil_core::subject::SubjectType;

    use async_trait::async_trait;

    use crate::clock::ManualClock;
    use crate::memory::MemoryStore;
    use crate::slashing::PenaltyMode;
    use crate::staking::{MAX_WITHDRAWAL_DELAY, MIN_WITHDRAWAL_DELAY};

    fn subject() -> Subject {
        Subject::new(SubjectType::Scanner, 1)
    }

    fn registry() -> Arc<dyn StakeSubjectValidator> {
        Arc::new(StaticSubjectRegistry::new().with_subject(subject(), 10, 10_000))
    }

    fn engine(delay: u64, clock: &ManualClock) -> StakingEngine {
        let mut params = SlashingParams::default();
        params.penalties.insert(
            ReasonCode::new("misconduct"),
            SlashPenalty::new(PenaltyMode::CurrentStake, 20).unwrap(),
        );
        StakingEngine::new(registry(), delay, params, Arc::new(clock.clone())).unwrap()
    }

    /// Store that refuses every write.
    struct UnavailableStore;

    #[async_trait]
    impl SnapshotStore for UnavailableStore {
        async fn save_snapshot(&self, _bytes: &[u8]) -> Result<(), VigilError> {
            Err(VigilError::Storage("disk full".into()))
        }

        async fn load_snapshot(&self) -> Result<Option<Vec<u8>>, VigilError> {
            Ok(None)
        }

        async fn append_events(&self, _events: &[Vec<u8>]) -> Result<u64, VigilError> {
            Err(VigilError::Storage("disk full".into()))
        }

        async fn commit(&self, _events: &[Vec<u8>], _snapshot: &[u8]) -> Result<u64, VigilError> {
            Err(VigilError::Storage("disk full".into()))
        }

        async fn read_events(&self, _from: u64, _limit: usize) -> Result<Vec<(u64, Vec<u8>)>, VigilError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_withdrawal_delay_enforced_for_each_bound() {
        for delay in [0, MIN_WITHDRAWAL_DELAY, MAX_WITHDRAWAL_DELAY] {
            let clock = ManualClock::new(1_000);
            let mut e = engine(delay, &clock);
            let alice = Account::from_label("alice");
            e.mint(alice, 100).unwrap();
            e.deposit(&subject(), 100, alice).unwrap();

            let unlock = e.initiate_withdrawal(&subject(), 100, alice).unwrap();
            assert_eq!(unlock, 1_000 + delay);
            if delay > 0 {
                clock.set(unlock - 1);
                assert!(matches!(
                    e.withdraw(&subject(), alice),
                    Err(VigilError::WithdrawalNotReady { .. })
                ));
            }
            clock.set(unlock);
            assert_eq!(e.withdraw(&subject(), alice).unwrap(), 100);
            assert_eq!(e.balance_of(&alice), 100);
        }
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_state() {
        let clock = ManualClock::new(0);
        let mut e = engine(0, &clock);
        let alice = Account::from_label("alice");
        let root = AuthContext::root(Account::from_label("root"));
        e.mint(alice, 1_000).unwrap();
        e.deposit(&subject(), 400, alice).unwrap();
        e.reward(&subject(), 40, alice).unwrap();
        e.propose_slash(&root, subject(), ReasonCode::new("misconduct"), vec!["x".into()], 0)
            .unwrap();

        let snapshot = e.snapshot();
        let restored = StakingEngine::from_snapshot(snapshot.clone(), registry(), Arc::new(clock)).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.current_state(1), ProposalState::Created);
        assert_eq!(restored.ledger().available_reward(&subject(), &alice).unwrap(), 40);
    }

    #[test]
    fn test_corrupt_snapshot_fails_invariants() {
        let clock = ManualClock::new(0);
        let mut e = engine(0, &clock);
        let alice = Account::from_label("alice");
        e.mint(alice, 100).unwrap();
        e.deposit(&subject(), 100, alice).unwrap();

        let mut snapshot = e.snapshot();
        snapshot.pools[0].pool.total_active_shares += 1;
        assert!(matches!(
            StakingEngine::from_snapshot(snapshot, registry(), Arc::new(clock)),
            Err(VigilError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(0);
        let mut e = engine(0, &clock);
        let admin = AuthContext::new(Account::from_label("admin")).with(Capability::Admin);
        e.set_delay(&admin, MIN_WITHDRAWAL_DELAY).unwrap();
        e.mint(Account::from_label("bob"), 50).unwrap();
        e.deposit(&subject(), 50, Account::from_label("bob")).unwrap();

        let last = e.persist(&store).await.unwrap();
        assert_eq!(last, 2);

        let loaded = StakingEngine::load(&store, registry(), Arc::new(clock))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.ledger().withdrawal_delay(), MIN_WITHDRAWAL_DELAY);
        assert_eq!(loaded.snapshot(), e.snapshot());

        let events = StakingEngine::read_events(&store, 1, 10).await.unwrap();
        let names: Vec<&str> = events.iter().map(|(_, e)| e.name()).collect();
        assert_eq!(names, vec!["DelaySet", "StakeDeposited"]);
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_events_for_retry() {
        let clock = ManualClock::new(0);
        let mut e = engine(0, &clock);
        let bob = Account::from_label("bob");
        e.mint(bob, 50).unwrap();
        e.deposit(&subject(), 50, bob).unwrap();

        assert!(matches!(
            e.persist(&UnavailableStore).await,
            Err(VigilError::Storage(_))
        ));
        assert_eq!(e.ledger().pending_events().len(), 1);

        let store = MemoryStore::new();
        assert_eq!(e.persist(&store).await.unwrap(), 1);
        assert!(e.ledger().pending_events().is_empty());
        let events = StakingEngine::read_events(&store, 1, 10).await.unwrap();
        assert_eq!(events[0].1.name(), "StakeDeposited");
        assert_eq!(
            StakingEngine::load(&store, registry(), Arc::new(clock))
                .await
                .unwrap()
                .unwrap()
                .snapshot(),
            e.snapshot()
        );
    }

    #[test]
    fn test_manual_unfreeze_refused_while_proposal_open() {
        let clock = ManualClock::new(0);
        let mut e = engine(0, &clock);
        let alice = Account::from_label("alice");
        let root = AuthContext::root(Account::from_label("root"));
        let slasher = AuthContext::new(Account::from_label("slasher")).with(Capability::Slasher);
        e.mint(alice, 1_000).unwrap();
        e.deposit(&subject(), 1_000, alice).unwrap();
        e.initiate_withdrawal(&subject(), 1_000, alice).unwrap();

        let id = e
            .propose_slash(&root, subject(), ReasonCode::new("misconduct"), vec!["x".into()], 0)
            .unwrap();
        e.mark_as_in_review_slash_proposal(&root, id).unwrap();
        e.mark_as_reviewed_slash_proposal(&root, id).unwrap();

        assert!(matches!(
            e.freeze(&slasher, &subject(), false),
            Err(VigilError::StakeFrozen(_))
        ));
        let nobody = AuthContext::new(Account::from_label("nobody"));
        assert!(matches!(
            e.freeze(&nobody, &subject(), false),
            Err(VigilError::Unauthorized { .. })
        ));
        assert!(e.ledger().pool(&subject()).unwrap().frozen);
        assert!(matches!(
            e.withdraw(&subject(), alice),
            Err(VigilError::StakeFrozen(_))
        ));

        // 20% of 1000 goes before the holder can leave.
        e.execute_slash_proposal(&root, id).unwrap();
        assert_eq!(e.withdraw(&subject(), alice).unwrap(), 800);

        // With nothing open the manual toggle works both ways.
        e.freeze(&slasher, &subject(), true).unwrap();
        e.freeze(&slasher, &subject(), false).unwrap();
        assert!(!e.ledger().pool(&subject()).unwrap().frozen);
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let store = MemoryStore::new();
        let loaded = StakingEngine::load(&store, registry(), Arc::new(ManualClock::new(0)))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
