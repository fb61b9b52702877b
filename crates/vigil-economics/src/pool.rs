// crates/vigil-economics/src/pool.rs
//
// Per-subject pool state and per-holder balances.
//
// A pool's `total_active_stake` is the principal it holds. That principal
// backs every outstanding share, active and inactive alike, until inactive
// shares are withdrawn. Slashing lowers the principal and leaves the share
// supply alone, so the loss lands on every holder in proportion to shares,
// including holders already waiting to withdraw.

use serde::{Deserialize, Serialize};

use vigil_core::error::VigilError;
use vigil_core::subject::ShareKind;

use crate::math::{self, mul_div};
use crate::token::{Amount, Shares};

/// Accounting state of one subject's stake pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePool {
    /// Principal currently held for the pool.
    pub total_active_stake: Amount,
    /// Supply of active (reward-earning) shares.
    pub total_active_shares: Shares,
    /// Supply of inactive (withdrawal-pending) shares.
    pub total_inactive_shares: Shares,
    /// While true, withdrawals are blocked.
    pub frozen: bool,
    /// Lifetime reward per active share, scaled by `REWARD_SCALE`.
    pub acc_reward_per_share: u128,
    /// Fractional part of the accumulator, in units of `1 / remainder_base`.
    #[serde(default)]
    pub reward_remainder: u128,
    /// Active share supply the remainder is expressed against.
    #[serde(default)]
    pub remainder_base: Shares,
    /// Reward tokens received and not yet released to holders.
    pub reward_reserve: Amount,
}

impl StakePool {
    /// Active plus inactive shares.
    pub fn share_supply(&self) -> Result<Shares, VigilError> {
        math::add(self.total_active_shares, self.total_inactive_shares, "share supply")
    }

    /// Supply of one share kind.
    pub fn total_shares(&self, kind: ShareKind) -> Shares {
        match kind {
            ShareKind::Active => self.total_active_shares,
            ShareKind::Inactive => self.total_inactive_shares,
        }
    }

    /// Value of `shares` at the pool's current exchange rate (floor).
    pub fn shares_to_stake(&self, shares: Shares) -> Result<Amount, VigilError> {
        let supply = self.share_supply()?;
        if supply == 0 {
            return Ok(0);
        }
        mul_div(shares, self.total_active_stake, supply)
    }

    /// Shares minted for a deposit of `amount` at the current exchange rate.
    ///
    /// The first deposit into an empty pool mints 1:1. Later deposits round
    /// down, in the pool's favour.
    ///
    /// # Errors
    /// `PoolDepleted` if shares are outstanding but the principal is zero.
    pub fn stake_to_shares(&self, amount: Amount) -> Result<Shares, VigilError> {
        let supply = self.share_supply()?;
        if supply == 0 {
            return Ok(amount);
        }
        if self.total_active_stake == 0 {
            return Err(VigilError::PoolDepleted(format!(
                "{} shares outstanding against zero stake",
                supply
            )));
        }
        mul_div(amount, supply, self.total_active_stake)
    }
}

/// One account's position in one pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderBalance {
    pub active_shares: Shares,
    pub inactive_shares: Shares,
    /// Accumulator value at the last reward settlement.
    pub reward_debt: u128,
    /// Rewards settled but not yet released.
    pub accrued_rewards: Amount,
    /// Timestamp (seconds) at which inactive shares may be withdrawn.
    pub pending_unlock: u64,
}

impl HolderBalance {
    pub fn shares(&self, kind: ShareKind) -> Shares {
        match kind {
            ShareKind::Active => self.active_shares,
            ShareKind::Inactive => self.inactive_shares,
        }
    }

    pub fn shares_mut(&mut self, kind: ShareKind) -> &mut Shares {
        match kind {
            ShareKind::Active => &mut self.active_shares,
            ShareKind::Inactive => &mut self.inactive_shares,
        }
    }

    /// True if the record carries nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        self.active_shares == 0
            && self.inactive_shares == 0
            && self.accrued_rewards == 0
            && self.pending_unlock == 0
    }
}
