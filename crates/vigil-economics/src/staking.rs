// crates/vigil-economics/src/staking.rs
//
// The stake ledger: per-subject share pools, delayed withdrawal, lazy reward
// accrual, slashing and freeze locks.
//
// Every operation follows the same order:
//   1. check authorization and preconditions against current state,
//   2. compute the new pool and holder records on copies,
//   3. check the token balance that will fund the movement,
//   4. commit the new records,
//   5. move tokens.
// A call that returns an error has therefore changed nothing, and ledger
// accounting is always final before any token leaves or enters custody.
//
// Withdrawal delay bounds:
//   MIN_WITHDRAWAL_DELAY = 1 day
//   MAX_WITHDRAWAL_DELAY = 90 days
// The delay configured at construction may be anything in [0, MAX]; `set_delay`
// enforces the full [MIN, MAX] range.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use vigil_core::auth::{AuthContext, Capability};
use vigil_core::error::VigilError;
use vigil_core::identity::Account;
use vigil_core::subject::{ShareKind, Subject};
use vigil_core::subject_key::{self, ShareId};
use vigil_core::traits::{StakeSubjectValidator, StakeThreshold};

use crate::events::{EngineEvent, LedgerEvent};
use crate::math;
use crate::pool::{HolderBalance, StakePool};
use crate::rewards;
use crate::token::{Amount, Shares, TokenBank};
use crate::treasury::{SlashSplit, Treasury};

/// Seconds in one day.
pub const DAY: u64 = 86_400;

/// Smallest delay `set_delay` accepts: 1 day.
pub const MIN_WITHDRAWAL_DELAY: u64 = DAY;

/// Largest withdrawal delay: 90 days.
pub const MAX_WITHDRAWAL_DELAY: u64 = 90 * DAY;

/// Owns every pool, every holder position and the token custody behind them.
pub struct StakeLedger {
    pools: BTreeMap<Subject, StakePool>,
    holders: BTreeMap<(Subject, Account), HolderBalance>,
    withdrawal_delay: u64,
    token: TokenBank,
    custody: Account,
    validator: Arc<dyn StakeSubjectValidator>,
    journal: Vec<EngineEvent>,
}

impl fmt::Debug for StakeLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StakeLedger")
            .field("pools", &self.pools.len())
            .field("holders", &self.holders.len())
            .field("withdrawal_delay", &self.withdrawal_delay)
            .finish()
    }
}

impl StakeLedger {
    /// Create an empty ledger.
    ///
    /// # Errors
    /// `DelayOutOfBounds` if `withdrawal_delay > MAX_WITHDRAWAL_DELAY`.
    pub fn new(
        validator: Arc<dyn StakeSubjectValidator>,
        withdrawal_delay: u64,
    ) -> Result<Self, VigilError> {
        Self::from_parts(validator, withdrawal_delay, TokenBank::new(), BTreeMap::new(), BTreeMap::new())
    }

    /// Reassemble a ledger from persisted parts.
    pub fn from_parts(
        validator: Arc<dyn StakeSubjectValidator>,
        withdrawal_delay: u64,
        token: TokenBank,
        pools: BTreeMap<Subject, StakePool>,
        holders: BTreeMap<(Subject, Account), HolderBalance>,
    ) -> Result<Self, VigilError> {
        if withdrawal_delay > MAX_WITHDRAWAL_DELAY {
            return Err(VigilError::DelayOutOfBounds {
                delay: withdrawal_delay,
                min: 0,
                max: MAX_WITHDRAWAL_DELAY,
            });
        }
        Ok(Self {
            pools,
            holders,
            withdrawal_delay,
            token,
            custody: Account::staking_custody(),
            validator,
            journal: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn token(&self) -> &TokenBank {
        &self.token
    }

    pub fn token_mut(&mut self) -> &mut TokenBank {
        &mut self.token
    }

    pub fn validator(&self) -> &Arc<dyn StakeSubjectValidator> {
        &self.validator
    }

    pub fn withdrawal_delay(&self) -> u64 {
        self.withdrawal_delay
    }

    /// Account holding all pool principal and reward reserves.
    pub fn custody(&self) -> Account {
        self.custody
    }

    pub fn pool(&self, subject: &Subject) -> Option<&StakePool> {
        self.pools.get(subject)
    }

    pub fn pools(&self) -> impl Iterator<Item = (&Subject, &StakePool)> {
        self.pools.iter()
    }

    pub fn holder(&self, subject: &Subject, account: &Account) -> Option<&HolderBalance> {
        self.holders.get(&(*subject, *account))
    }

    pub fn holders(&self) -> impl Iterator<Item = (&(Subject, Account), &HolderBalance)> {
        self.holders.iter()
    }

    /// Holders of one subject's pool.
    pub fn holders_of<'a>(
        &'a self,
        subject: &'a Subject,
    ) -> impl Iterator<Item = (&'a Account, &'a HolderBalance)> + 'a {
        self.holders
            .iter()
            .filter(move |((s, _), _)| s == subject)
            .map(|((_, account), balance)| (account, balance))
    }

    /// Append an event to the pending journal.
    pub(crate) fn record(&mut self, event: impl Into<EngineEvent>) {
        self.journal.push(event.into());
    }

    /// Events recorded since the last drain, oldest first.
    pub fn pending_events(&self) -> &[EngineEvent] {
        &self.journal
    }

    /// Drain the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.journal)
    }

    fn pool_or_default(&self, subject: &Subject) -> StakePool {
        self.pools.get(subject).cloned().unwrap_or_default()
    }

    fn holder_or_default(&self, subject: &Subject, account: &Account) -> HolderBalance {
        self.holders
            .get(&(*subject, *account))
            .cloned()
            .unwrap_or_default()
    }

    fn commit_holder(&mut self, subject: Subject, account: Account, balance: HolderBalance) {
        if balance.is_empty() {
            self.holders.remove(&(subject, account));
        } else {
            self.holders.insert((subject, account), balance);
        }
    }

    fn activated_threshold(&self, subject: &Subject) -> Result<StakeThreshold, VigilError> {
        self.validator
            .stake_threshold(subject)
            .filter(|t| t.activated)
            .ok_or_else(|| VigilError::SubjectInactiveOrNotFound(subject.to_string()))
    }

    // ------------------------------------------------------------------
    // Holder operations
    // ------------------------------------------------------------------

    /// Deposit `amount` tokens into a subject's pool for `depositor`.
    ///
    /// The deposit is capped at the room left under the subject's maximum
    /// stake. A fully capped deposit returns 0 shares and moves nothing.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0`.
    /// - `SubjectInactiveOrNotFound` if the registry does not accept deposits.
    /// - `PoolDepleted` if the pool has shares but no stake behind them.
    /// - `InsufficientBalance` if the depositor cannot fund the deposit.
    pub fn deposit(
        &mut self,
        subject: &Subject,
        amount: Amount,
        depositor: Account,
        now: u64,
    ) -> Result<Shares, VigilError> {
        if amount == 0 {
            return Err(VigilError::ZeroAmount);
        }
        let threshold = self.activated_threshold(subject)?;
        let mut pool = self.pool_or_default(subject);

        let room = threshold.max.saturating_sub(pool.total_active_stake);
        let capped = amount.min(room);
        if capped < amount {
            tracing::warn!(
                "Deposit to {} capped at max stake {}: requested {}, accepted {}",
                subject,
                threshold.max,
                amount,
                capped
            );
        }
        if capped == 0 {
            self.record(LedgerEvent::MaxStakeReached {
                subject: *subject,
                max: threshold.max,
            });
            return Ok(0);
        }

        let shares = pool.stake_to_shares(capped)?;
        self.token.ensure_balance(&depositor, capped)?;

        let mut holder = self.holder_or_default(subject, &depositor);
        rewards::settle(&pool, &mut holder)?;
        holder.active_shares = math::add(holder.active_shares, shares, "holder active shares")?;
        pool.total_active_shares = math::add(pool.total_active_shares, shares, "pool active shares")?;
        pool.total_active_stake = math::add(pool.total_active_stake, capped, "pool stake")?;

        self.pools.insert(*subject, pool);
        self.commit_holder(*subject, depositor, holder);
        self.token.transfer(&depositor, &self.custody, capped)?;

        if capped < amount {
            self.record(LedgerEvent::MaxStakeReached {
                subject: *subject,
                max: threshold.max,
            });
        }
        self.record(LedgerEvent::StakeDeposited {
            subject: *subject,
            share_id: subject_key::active_share_id(subject),
            depositor,
            amount: capped,
            shares,
        });
        tracing::info!(
            "Deposit: {} staked {} on {} for {} shares (t={})",
            depositor,
            capped,
            subject,
            shares,
            now
        );
        Ok(shares)
    }

    /// Move `shares` of the holder's active shares to inactive and start (or
    /// extend) the withdrawal timer.
    ///
    /// A second call while shares are already pending adds to the inactive
    /// balance and moves the unlock time to the later of the two.
    ///
    /// # Returns
    /// The holder's unlock timestamp.
    ///
    /// # Errors
    /// `NoActiveShares` if `shares == 0` or the holder has fewer active shares.
    pub fn initiate_withdrawal(
        &mut self,
        subject: &Subject,
        shares: Shares,
        holder_account: Account,
        now: u64,
    ) -> Result<u64, VigilError> {
        let mut holder = self.holder_or_default(subject, &holder_account);
        if shares == 0 || holder.active_shares < shares {
            return Err(VigilError::NoActiveShares(format!(
                "{} holds {} active shares in {}, requested {}",
                holder_account, holder.active_shares, subject, shares
            )));
        }
        let mut pool = self.pool_or_default(subject);
        let unlock = now
            .checked_add(self.withdrawal_delay)
            .ok_or(VigilError::ArithmeticOverflow("unlock time"))?;

        rewards::settle(&pool, &mut holder)?;
        holder.active_shares = math::sub(holder.active_shares, shares, "holder active shares")?;
        holder.inactive_shares = math::add(holder.inactive_shares, shares, "holder inactive shares")?;
        holder.pending_unlock = holder.pending_unlock.max(unlock);
        pool.total_active_shares = math::sub(pool.total_active_shares, shares, "pool active shares")?;
        pool.total_inactive_shares =
            math::add(pool.total_inactive_shares, shares, "pool inactive shares")?;

        let unlock_time = holder.pending_unlock;
        self.pools.insert(*subject, pool);
        self.commit_holder(*subject, holder_account, holder);

        self.record(LedgerEvent::WithdrawalInitiated {
            subject: *subject,
            holder: holder_account,
            shares,
            unlock_time,
        });
        tracing::info!(
            "Withdrawal initiated: {} moved {} shares of {} to inactive, unlocks at {}",
            holder_account,
            shares,
            subject,
            unlock_time
        );
        Ok(unlock_time)
    }

    /// Burn all of the holder's inactive shares and pay out their value at
    /// the pool's current exchange rate.
    ///
    /// # Errors
    /// `NoInactiveShares`, `StakeFrozen`, `WithdrawalNotReady`, in that order.
    pub fn withdraw(
        &mut self,
        subject: &Subject,
        holder_account: Account,
        now: u64,
    ) -> Result<Amount, VigilError> {
        let mut holder = self.holder_or_default(subject, &holder_account);
        if holder.inactive_shares == 0 {
            return Err(VigilError::NoInactiveShares(format!(
                "{} has no inactive shares in {}",
                holder_account, subject
            )));
        }
        let mut pool = self.pool_or_default(subject);
        if pool.frozen {
            return Err(VigilError::StakeFrozen(subject.to_string()));
        }
        if now < holder.pending_unlock {
            return Err(VigilError::WithdrawalNotReady {
                unlock_at: holder.pending_unlock,
                now,
            });
        }

        let shares = holder.inactive_shares;
        let amount = pool.shares_to_stake(shares)?;
        self.token.ensure_balance(&self.custody, amount)?;

        pool.total_inactive_shares = math::sub(pool.total_inactive_shares, shares, "pool inactive shares")?;
        pool.total_active_stake = math::sub(pool.total_active_stake, amount, "pool stake")?;
        holder.inactive_shares = 0;
        holder.pending_unlock = 0;

        self.pools.insert(*subject, pool);
        self.commit_holder(*subject, holder_account, holder);
        self.token.transfer(&self.custody, &holder_account, amount)?;

        self.record(LedgerEvent::WithdrawalExecuted {
            subject: *subject,
            holder: holder_account,
            shares,
            amount,
        });
        tracing::info!(
            "Withdrawal executed: {} burned {} shares of {} for {}",
            holder_account,
            shares,
            subject,
            amount
        );
        Ok(amount)
    }

    /// Distribute `amount` tokens from `payer` over the pool's active shares.
    ///
    /// A zero amount is a no-op.
    ///
    /// # Errors
    /// `NoActiveShares` if the pool has no active shares; the reward is
    /// rejected rather than held undistributed.
    pub fn reward(
        &mut self,
        subject: &Subject,
        amount: Amount,
        payer: Account,
        now: u64,
    ) -> Result<(), VigilError> {
        if amount == 0 {
            return Ok(());
        }
        let mut pool = self.pool_or_default(subject);
        if pool.total_active_shares == 0 {
            return Err(VigilError::NoActiveShares(format!(
                "{} has no active shares to reward",
                subject
            )));
        }
        rewards::distribute(&mut pool, amount)?;
        self.token.ensure_balance(&payer, amount)?;

        pool.reward_reserve = math::add(pool.reward_reserve, amount, "reward reserve")?;

        self.pools.insert(*subject, pool);
        self.token.transfer(&payer, &self.custody, amount)?;

        self.record(LedgerEvent::Rewarded {
            subject: *subject,
            payer,
            amount,
        });
        tracing::info!("Reward: {} distributed {} to {} (t={})", payer, amount, subject, now);
        Ok(())
    }

    /// Pay out everything the holder has earned in the pool.
    ///
    /// Idempotent: a second call with no reward in between releases 0.
    pub fn release_reward(&mut self, subject: &Subject, holder_account: Account) -> Result<Amount, VigilError> {
        let mut pool = match self.pools.get(subject) {
            Some(pool) => pool.clone(),
            None => return Ok(0),
        };
        let mut holder = self.holder_or_default(subject, &holder_account);
        rewards::settle(&pool, &mut holder)?;

        let amount = holder.accrued_rewards;
        holder.accrued_rewards = 0;
        pool.reward_reserve = math::sub(pool.reward_reserve, amount, "reward reserve")?;
        self.token.ensure_balance(&self.custody, amount)?;

        self.pools.insert(*subject, pool);
        self.commit_holder(*subject, holder_account, holder);

        if amount > 0 {
            self.token.transfer(&self.custody, &holder_account, amount)?;
            self.record(LedgerEvent::Released {
                subject: *subject,
                holder: holder_account,
                amount,
            });
            tracing::info!("Reward released: {} received {} from {}", holder_account, amount, subject);
        }
        Ok(amount)
    }

    /// Move shares of one kind between holders, settling both first.
    ///
    /// Inactive shares carry the sender's unlock time: the receiver's unlock
    /// becomes the later of its own and the sender's.
    ///
    /// # Errors
    /// `ZeroAmount`, or `NoActiveShares` / `NoInactiveShares` if the sender
    /// holds fewer shares of `kind` than requested.
    pub fn transfer(
        &mut self,
        subject: &Subject,
        from: Account,
        to: Account,
        kind: ShareKind,
        shares: Shares,
    ) -> Result<(), VigilError> {
        if shares == 0 {
            return Err(VigilError::ZeroAmount);
        }
        let mut sender = self.holder_or_default(subject, &from);
        let held = sender.shares(kind);
        if held < shares {
            let msg = format!("{} holds {} {} shares in {}, requested {}", from, held, kind, subject, shares);
            return Err(match kind {
                ShareKind::Active => VigilError::NoActiveShares(msg),
                ShareKind::Inactive => VigilError::NoInactiveShares(msg),
            });
        }
        if from == to {
            return Ok(());
        }

        let pool = self.pool_or_default(subject);
        let mut receiver = self.holder_or_default(subject, &to);
        rewards::settle(&pool, &mut sender)?;
        rewards::settle(&pool, &mut receiver)?;

        *sender.shares_mut(kind) = math::sub(held, shares, "sender shares")?;
        *receiver.shares_mut(kind) = math::add(receiver.shares(kind), shares, "receiver shares")?;
        if kind == ShareKind::Inactive {
            receiver.pending_unlock = receiver.pending_unlock.max(sender.pending_unlock);
            if sender.inactive_shares == 0 {
                sender.pending_unlock = 0;
            }
        }

        self.commit_holder(*subject, from, sender);
        self.commit_holder(*subject, to, receiver);

        self.record(LedgerEvent::SharesTransferred {
            subject: *subject,
            kind,
            from,
            to,
            shares,
        });
        tracing::info!("Share transfer: {} {} shares of {} from {} to {}", shares, kind, subject, from, to);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Privileged operations
    // ------------------------------------------------------------------

    /// Remove up to `amount` from a frozen pool's stake, paying the proposer
    /// share and the treasury.
    ///
    /// Shares are not burned: every holder, active or inactive, loses value
    /// in proportion to shares held.
    ///
    /// # Errors
    /// `Unauthorized` without `Capability::Slasher`; `StakeNotFrozen` if the
    /// pool is not frozen.
    pub fn slash(
        &mut self,
        auth: &AuthContext,
        subject: &Subject,
        amount: Amount,
        proposer: Account,
        treasury: &Treasury,
    ) -> Result<SlashSplit, VigilError> {
        auth.require(Capability::Slasher)?;
        let mut pool = self.pool_or_default(subject);
        if !pool.frozen {
            return Err(VigilError::StakeNotFrozen(subject.to_string()));
        }

        let slashed = amount.min(pool.total_active_stake);
        let split = treasury.split(slashed)?;
        self.token.ensure_balance(&self.custody, slashed)?;

        pool.total_active_stake = math::sub(pool.total_active_stake, slashed, "pool stake")?;
        self.pools.insert(*subject, pool);

        self.token.transfer(&self.custody, &proposer, split.proposer)?;
        self.token.transfer(&self.custody, &treasury.account, split.treasury)?;

        self.record(LedgerEvent::Slashed {
            subject: *subject,
            proposer,
            amount: slashed,
            proposer_share: split.proposer,
            treasury_share: split.treasury,
        });
        tracing::warn!(
            "Slashed {} from {} (requested {}): proposer {} receives {}, treasury receives {}",
            slashed,
            subject,
            amount,
            proposer,
            split.proposer,
            split.treasury
        );
        Ok(split)
    }

    /// Set or clear a pool's freeze flag. Freezing blocks only `withdraw`.
    ///
    /// # Errors
    /// `Unauthorized` without `Capability::Slasher`.
    pub fn freeze(&mut self, auth: &AuthContext, subject: &Subject, frozen: bool) -> Result<(), VigilError> {
        auth.require(Capability::Slasher)?;
        let mut pool = self.pool_or_default(subject);
        pool.frozen = frozen;
        self.pools.insert(*subject, pool);

        self.record(LedgerEvent::Froze {
            subject: *subject,
            frozen,
        });
        tracing::info!("Pool {} {}", subject, if frozen { "frozen" } else { "unfrozen" });
        Ok(())
    }

    /// Change the withdrawal delay for future `initiate_withdrawal` calls.
    ///
    /// # Errors
    /// `Unauthorized` without `Capability::Admin`; `DelayOutOfBounds` outside
    /// `[MIN_WITHDRAWAL_DELAY, MAX_WITHDRAWAL_DELAY]`.
    pub fn set_delay(&mut self, auth: &AuthContext, seconds: u64) -> Result<(), VigilError> {
        auth.require(Capability::Admin)?;
        if !(MIN_WITHDRAWAL_DELAY..=MAX_WITHDRAWAL_DELAY).contains(&seconds) {
            return Err(VigilError::DelayOutOfBounds {
                delay: seconds,
                min: MIN_WITHDRAWAL_DELAY,
                max: MAX_WITHDRAWAL_DELAY,
            });
        }
        self.withdrawal_delay = seconds;
        self.record(LedgerEvent::DelaySet { delay: seconds });
        tracing::info!("Withdrawal delay set to {}s", seconds);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current value of the holder's active shares.
    pub fn active_stake_of(&self, subject: &Subject, account: &Account) -> Result<Amount, VigilError> {
        let shares = self.holder(subject, account).map(|h| h.active_shares).unwrap_or(0);
        self.shares_to_stake(subject, shares)
    }

    /// Current value of the holder's inactive shares.
    pub fn inactive_stake_of(&self, subject: &Subject, account: &Account) -> Result<Amount, VigilError> {
        let shares = self.holder(subject, account).map(|h| h.inactive_shares).unwrap_or(0);
        self.shares_to_stake(subject, shares)
    }

    pub fn shares_to_stake(&self, subject: &Subject, shares: Shares) -> Result<Amount, VigilError> {
        match self.pools.get(subject) {
            Some(pool) => pool.shares_to_stake(shares),
            None => Ok(0),
        }
    }

    pub fn stake_to_shares(&self, subject: &Subject, amount: Amount) -> Result<Shares, VigilError> {
        match self.pools.get(subject) {
            Some(pool) => pool.stake_to_shares(amount),
            None => Ok(amount),
        }
    }

    /// Opaque share identifier for a subject's active or inactive shares.
    pub fn share_id(&self, subject: &Subject, kind: ShareKind) -> ShareId {
        subject_key::share_id(subject, kind)
    }

    /// Value of the pool's active shares.
    pub fn active_stake_for(&self, subject: &Subject) -> Result<Amount, VigilError> {
        match self.pools.get(subject) {
            Some(pool) => pool.shares_to_stake(pool.total_active_shares),
            None => Ok(0),
        }
    }

    /// True if the pool's active stake meets the subject's minimum.
    pub fn is_staked_over_min(&self, subject: &Subject) -> Result<bool, VigilError> {
        let threshold = match self.validator.stake_threshold(subject) {
            Some(t) => t,
            None => return Ok(false),
        };
        let active = self.active_stake_for(subject)?;
        Ok(active > 0 && active >= threshold.min)
    }

    /// Reward the holder could release right now.
    pub fn available_reward(&self, subject: &Subject, account: &Account) -> Result<Amount, VigilError> {
        match (self.pools.get(subject), self.holder(subject, account)) {
            (Some(pool), Some(holder)) => rewards::claimable(pool, holder),
            _ => Ok(0),
        }
    }

    /// Verify the ledger's conservation invariants.
    ///
    /// - per pool, holder share balances sum to the pool's share supplies,
    /// - per pool, released-able rewards never exceed the reward reserve,
    /// - a pool with no shares holds no stake,
    /// - custody holds exactly the principal plus reward reserves.
    pub fn check_invariants(&self) -> Result<(), VigilError> {
        let mut sums: BTreeMap<Subject, (Shares, Shares, Amount)> = BTreeMap::new();
        for ((subject, _), holder) in &self.holders {
            let pool = self.pools.get(subject).ok_or_else(|| {
                VigilError::InvariantViolation(format!("holder record for missing pool {}", subject))
            })?;
            let entry = sums.entry(*subject).or_default();
            entry.0 = math::add(entry.0, holder.active_shares, "active share sum")?;
            entry.1 = math::add(entry.1, holder.inactive_shares, "inactive share sum")?;
            entry.2 = math::add(entry.2, rewards::claimable(pool, holder)?, "claimable sum")?;
        }

        let mut custody_expected: Amount = 0;
        for (subject, pool) in &self.pools {
            let (active, inactive, claimable) = sums.get(subject).copied().unwrap_or_default();
            if active != pool.total_active_shares || inactive != pool.total_inactive_shares {
                return Err(VigilError::InvariantViolation(format!(
                    "{}: holders hold {}/{} shares, pool records {}/{}",
                    subject, active, inactive, pool.total_active_shares, pool.total_inactive_shares
                )));
            }
            if claimable > pool.reward_reserve {
                return Err(VigilError::InvariantViolation(format!(
                    "{}: claimable rewards {} exceed reserve {}",
                    subject, claimable, pool.reward_reserve
                )));
            }
            if pool.share_supply()? == 0 && pool.total_active_stake != 0 {
                return Err(VigilError::InvariantViolation(format!(
                    "{}: {} stake with no shares outstanding",
                    subject, pool.total_active_stake
                )));
            }
            custody_expected = math::add(custody_expected, pool.total_active_stake, "custody")?;
            custody_expected = math::add(custody_expected, pool.reward_reserve, "custody")?;
        }

        let custody = self.token.balance_of(&self.custody);
        if custody != custody_expected {
            return Err(VigilError::InvariantViolation(format!(
                "custody holds {}, pools account for {}",
                custody, custody_expected
            )));
        }
        Ok(())
    }
}
