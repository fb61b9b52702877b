// crates/vigil-economics/tests/ledger_properties.rs
//
// Property tests for the stake ledger: conservation under random operation
// sequences, atomic rejection, reward fairness, and slash dilution.
//
// Sequences are driven by a seeded StdRng so failures are reproducible.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vigil_core::{Account, AuthContext, Capability, ShareKind, StaticSubjectRegistry, Subject, SubjectType};
use vigil_economics::{
    Clock, ManualClock, SlashingParams, StakingEngine, MIN_WITHDRAWAL_DELAY,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn subjects() -> [Subject; 2] {
    [
        Subject::new(SubjectType::Scanner, 11),
        Subject::new(SubjectType::DelegatorScannerPool, 12),
    ]
}

fn holders() -> Vec<Account> {
    (0..4).map(|i| Account::from_label(&format!("holder-{}", i))).collect()
}

fn slasher() -> AuthContext {
    AuthContext::new(Account::from_label("slasher")).with(Capability::Slasher)
}

fn engine(clock: &ManualClock) -> StakingEngine {
    let mut registry = StaticSubjectRegistry::new();
    for subject in subjects() {
        registry.register(subject, 0, 50_000, true);
    }
    StakingEngine::new(
        Arc::new(registry),
        MIN_WITHDRAWAL_DELAY,
        SlashingParams::default(),
        Arc::new(clock.clone()),
    )
    .unwrap()
}

/// Apply one random operation. Returns whether it succeeded.
fn random_op(rng: &mut StdRng, e: &mut StakingEngine, clock: &ManualClock) -> bool {
    let subjects = subjects();
    let holders = holders();
    let subject = subjects[rng.gen_range(0..subjects.len())];
    let who = holders[rng.gen_range(0..holders.len())];
    let other = holders[rng.gen_range(0..holders.len())];

    let result = match rng.gen_range(0..10) {
        0 | 1 => e.deposit(&subject, rng.gen_range(0..2_000), who).map(|_| ()),
        2 => {
            let active = e.ledger().holder(&subject, &who).map(|h| h.active_shares).unwrap_or(0);
            let shares = if active > 0 { rng.gen_range(0..=active) } else { 1 };
            e.initiate_withdrawal(&subject, shares, who).map(|_| ())
        }
        3 => e.withdraw(&subject, who).map(|_| ()),
        4 => e.reward(&subject, rng.gen_range(0..500), who),
        5 => e.release_reward(&subject, who).map(|_| ()),
        6 => {
            let kind = if rng.gen_bool(0.5) { ShareKind::Active } else { ShareKind::Inactive };
            e.transfer(&subject, who, other, kind, rng.gen_range(0..300))
        }
        7 => e.freeze(&slasher(), &subject, rng.gen_bool(0.5)),
        8 => e.slash(&slasher(), &subject, rng.gen_range(0..400), other).map(|_| ()),
        _ => {
            clock.advance(rng.gen_range(0..2 * MIN_WITHDRAWAL_DELAY));
            Ok(())
        }
    };
    result.is_ok()
}

// ---------------------------------------------------------------------------
// Conservation
// ---------------------------------------------------------------------------

#[test]
fn test_random_sequences_conserve_shares_and_custody() {
    for seed in [1u64, 7, 42, 1_234, 99_999] {
        let mut rng = StdRng::seed_from_u64(seed);
        let clock = ManualClock::new(1_700_000_000);
        let mut e = engine(&clock);
        for holder in holders() {
            e.mint(holder, 1_000_000).unwrap();
        }
        let supply = e.ledger().token().total_supply();

        let mut successes = 0;
        for step in 0..400 {
            if random_op(&mut rng, &mut e, &clock) {
                successes += 1;
            }
            if let Err(err) = e.check_invariants() {
                panic!("seed {} step {}: {}", seed, step, err);
            }
            assert_eq!(e.ledger().token().total_supply(), supply);
        }
        assert!(successes > 100, "seed {} only {} ops succeeded", seed, successes);
    }
}

#[test]
fn test_rejected_operations_change_nothing() {
    let mut rng = StdRng::seed_from_u64(2024);
    let clock = ManualClock::new(0);
    let mut e = engine(&clock);
    for holder in holders() {
        e.mint(holder, 5_000).unwrap();
    }

    let mut rejections = 0;
    for _ in 0..500 {
        let before = e.snapshot();
        let now_before = clock.now();
        if !random_op(&mut rng, &mut e, &clock) {
            rejections += 1;
            assert_eq!(e.snapshot(), before);
            assert_eq!(clock.now(), now_before);
        }
    }
    assert!(rejections > 0);
}

// ---------------------------------------------------------------------------
// Rewards
// ---------------------------------------------------------------------------

#[test]
fn test_reward_split_is_proportional() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..200 {
        let clock = ManualClock::new(0);
        let mut e = engine(&clock);
        let subject = subjects()[0];
        let (a, b) = (holders()[0], holders()[1]);
        let payer = Account::from_label("payer");

        let s1: u128 = rng.gen_range(1..20_000);
        let s2: u128 = rng.gen_range(1..20_000);
        let r: u128 = rng.gen_range(0..1_000_000);
        e.mint(a, s1).unwrap();
        e.mint(b, s2).unwrap();
        e.mint(payer, r).unwrap();
        e.deposit(&subject, s1, a).unwrap();
        e.deposit(&subject, s2, b).unwrap();
        // Two reward events with no balance change in between.
        let first = rng.gen_range(0..=r);
        e.reward(&subject, first, payer).unwrap();
        e.reward(&subject, r - first, payer).unwrap();

        let paid_a = e.release_reward(&subject, a).unwrap();
        let paid_b = e.release_reward(&subject, b).unwrap();
        assert_eq!(paid_a, r * s1 / (s1 + s2), "s1={} s2={} r={}", s1, s2, r);
        assert_eq!(paid_b, r * s2 / (s1 + s2), "s1={} s2={} r={}", s1, s2, r);
        // Dust stays below the number of holders.
        assert!(r - (paid_a + paid_b) < 2);
        e.check_invariants().unwrap();
    }
}

#[test]
fn test_reward_pays_exact_floor_when_scale_is_not_divisible() {
    let clock = ManualClock::new(0);
    let mut e = engine(&clock);
    let subject = subjects()[0];
    let (a, b) = (holders()[0], holders()[1]);
    e.mint(a, 3).unwrap();
    e.mint(b, 6).unwrap();
    e.deposit(&subject, 3, a).unwrap();
    e.deposit(&subject, 6, b).unwrap();

    let payer = Account::from_label("payer");
    e.mint(payer, 3).unwrap();
    e.reward(&subject, 3, payer).unwrap();

    assert_eq!(e.release_reward(&subject, a).unwrap(), 1);
    assert_eq!(e.release_reward(&subject, b).unwrap(), 2);
    assert_eq!(e.ledger().pool(&subject).unwrap().reward_reserve, 0);
    e.check_invariants().unwrap();
}

#[test]
fn test_late_depositor_earns_nothing_from_earlier_rewards() {
    let clock = ManualClock::new(0);
    let mut e = engine(&clock);
    let subject = subjects()[0];
    let (early, late) = (holders()[0], holders()[1]);
    e.mint(early, 1_000).unwrap();
    e.mint(late, 1_000).unwrap();

    e.deposit(&subject, 100, early).unwrap();
    e.reward(&subject, 50, early).unwrap();
    e.deposit(&subject, 100, late).unwrap();

    assert_eq!(e.ledger().available_reward(&subject, &late).unwrap(), 0);
    assert_eq!(e.ledger().available_reward(&subject, &early).unwrap(), 50);
}

#[test]
fn test_inactive_shares_stop_earning() {
    let clock = ManualClock::new(0);
    let mut e = engine(&clock);
    let subject = subjects()[0];
    let (a, b) = (holders()[0], holders()[1]);
    e.mint(a, 1_000).unwrap();
    e.mint(b, 1_000).unwrap();
    e.deposit(&subject, 100, a).unwrap();
    e.deposit(&subject, 100, b).unwrap();

    e.initiate_withdrawal(&subject, 100, a).unwrap();
    e.reward(&subject, 30, b).unwrap();
    assert_eq!(e.ledger().available_reward(&subject, &a).unwrap(), 0);
    assert_eq!(e.ledger().available_reward(&subject, &b).unwrap(), 30);
}

// ---------------------------------------------------------------------------
// Slashing
// ---------------------------------------------------------------------------

#[test]
fn test_slash_dilutes_value_not_shares() {
    let mut rng = StdRng::seed_from_u64(77);
    for _ in 0..100 {
        let clock = ManualClock::new(0);
        let mut e = engine(&clock);
        let subject = subjects()[1];
        let hs = holders();
        for h in &hs {
            e.mint(*h, 10_000).unwrap();
            e.deposit(&subject, rng.gen_range(1..5_000), *h).unwrap();
        }
        // One holder already waiting to withdraw is slashed too.
        let waiting = e.ledger().holder(&subject, &hs[0]).unwrap().active_shares;
        e.initiate_withdrawal(&subject, waiting, hs[0]).unwrap();

        let before = e.ledger().pool(&subject).unwrap().clone();
        let amount = rng.gen_range(0..before.total_active_stake * 2);
        e.freeze(&slasher(), &subject, true).unwrap();
        let split = e.slash(&slasher(), &subject, amount, hs[1]).unwrap();
        e.freeze(&slasher(), &subject, false).unwrap();

        let after = e.ledger().pool(&subject).unwrap().clone();
        let slashed = amount.min(before.total_active_stake);
        assert_eq!(split.total(), slashed);
        assert_eq!(after.total_active_stake, before.total_active_stake - slashed);
        assert_eq!(after.total_active_shares, before.total_active_shares);
        assert_eq!(after.total_inactive_shares, before.total_inactive_shares);

        let supply = before.total_active_shares + before.total_inactive_shares;
        let expected = waiting * after.total_active_stake / supply;
        clock.advance(MIN_WITHDRAWAL_DELAY);
        assert_eq!(e.withdraw(&subject, hs[0]).unwrap(), expected);
        e.check_invariants().unwrap();
    }
}
