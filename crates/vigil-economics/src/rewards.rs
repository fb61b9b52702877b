// crates/vigil-economics/src/rewards.rs
//
// Lazy pro-rata reward accounting.
//
// Each pool keeps one accumulator, the lifetime reward paid per active share
// scaled by REWARD_SCALE. The accumulator is stored as an integer part
// (`acc_reward_per_share`) plus a remainder over the active share supply at
// the last distribution (`reward_remainder / remainder_base`), so a reward of
// `r` over `T` shares advances it by exactly `r * SCALE / T`. Each holder
// keeps the accumulator value at its last settlement (`reward_debt`),
// rounded up to a whole scaled unit. A holder's pending reward is therefore
//
//   floor(active_shares * (acc + remainder / base - reward_debt) / REWARD_SCALE)
//
// which costs O(1) per holder and never iterates over the pool. Holders
// whose balance stays fixed between two rewards receive exactly
// `floor(r * s / T)`. Any change to a holder's active share balance must
// settle first against the old balance (accrue-then-mutate), or the new
// balance would be credited with rewards distributed before it existed.

use primitive_types::{U256, U512};

use vigil_core::error::VigilError;

use crate::math::{self, mul_div};
use crate::pool::{HolderBalance, StakePool};
use crate::token::{Amount, Shares};

/// Fixed-point scale of the reward accumulator (10^18).
pub const REWARD_SCALE: u128 = 1_000_000_000_000_000_000;

/// Advance the pool's accumulator by `amount` spread over its active shares.
///
/// A remainder carried from an earlier distribution over a different share
/// supply is rebased onto the current supply first, rounding down.
///
/// # Errors
/// `NoActiveShares` if the pool has no active shares to credit.
pub fn distribute(pool: &mut StakePool, amount: Amount) -> Result<(), VigilError> {
    let total = pool.total_active_shares;
    if total == 0 {
        return Err(VigilError::NoActiveShares(
            "cannot distribute a reward to a pool without active shares".to_string(),
        ));
    }

    let carried = if pool.remainder_base == 0 || pool.reward_remainder == 0 {
        0
    } else if pool.remainder_base == total {
        pool.reward_remainder
    } else {
        mul_div(pool.reward_remainder, total, pool.remainder_base)?
    };

    let numerator = U256::from(amount).full_mul(U256::from(REWARD_SCALE)) + U512::from(carried);
    let divisor = U512::from(total);
    let increment = math::narrow(numerator / divisor, "reward accumulator increment")?;
    let remainder = math::narrow(numerator % divisor, "reward accumulator remainder")?;

    pool.acc_reward_per_share = math::add(pool.acc_reward_per_share, increment, "reward accumulator")?;
    pool.reward_remainder = remainder;
    pool.remainder_base = total;
    Ok(())
}

/// Accumulator snapshot a holder settles to: the integer part, plus one if a
/// fractional part is outstanding.
pub fn settled_debt(pool: &StakePool) -> Result<u128, VigilError> {
    if pool.reward_remainder == 0 {
        Ok(pool.acc_reward_per_share)
    } else {
        math::add(pool.acc_reward_per_share, 1, "reward debt")
    }
}

/// Reward earned by `active_shares` since the accumulator stood at `reward_debt`.
///
/// Zero if the debt is ahead of the accumulator.
pub fn pending_reward(pool: &StakePool, active_shares: Shares, reward_debt: u128) -> Result<Amount, VigilError> {
    if active_shares == 0 || reward_debt > pool.acc_reward_per_share {
        return Ok(0);
    }
    let whole = pool.acc_reward_per_share - reward_debt;
    if pool.reward_remainder == 0 || pool.remainder_base == 0 {
        return mul_div(active_shares, whole, REWARD_SCALE);
    }

    let base = U512::from(pool.remainder_base);
    let delta = U512::from(whole) * base + U512::from(pool.reward_remainder);
    let numerator = U512::from(active_shares) * delta;
    let denominator = base * U512::from(REWARD_SCALE);
    math::narrow(numerator / denominator, "pending reward")
}

/// Move a holder's pending reward into `accrued_rewards` and snapshot the
/// accumulator. Must run before any change to `holder.active_shares`.
pub fn settle(pool: &StakePool, holder: &mut HolderBalance) -> Result<(), VigilError> {
    let pending = pending_reward(pool, holder.active_shares, holder.reward_debt)?;
    holder.accrued_rewards = math::add(holder.accrued_rewards, pending, "accrued rewards")?;
    holder.reward_debt = settled_debt(pool)?;
    Ok(())
}

/// Everything a holder could release right now: settled plus pending.
pub fn claimable(pool: &StakePool, holder: &HolderBalance) -> Result<Amount, VigilError> {
    let pending = pending_reward(pool, holder.active_shares, holder.reward_debt)?;
    math::add(holder.accrued_rewards, pending, "claimable rewards")
}
