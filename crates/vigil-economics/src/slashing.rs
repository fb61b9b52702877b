// crates/vigil-economics/src/slashing.rs
//
// Slash reasons, penalty modes and penalty computation.
//
// Each reason code is bound to a penalty: a mode naming the base amount and
// a percentage of it. Three modes exist:
//   MinStake    : percent of the subject's configured minimum stake
//   MaxStake    : percent of the subject's configured maximum stake
//   CurrentStake: percent of the pool's stake at execution time
//
// Every mode is clamped to `max_slashable_stake_percent` of the pool's stake
// and evaluated when the proposal executes, never when it is proposed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use vigil_core::error::VigilError;
use vigil_core::traits::StakeThreshold;

use crate::math;
use crate::token::Amount;
use crate::treasury::Treasury;

/// Default cap on the fraction of a pool one slash may take, in percent.
pub const DEFAULT_MAX_SLASHABLE_STAKE_PERCENT: u8 = 90;

/// Name of a slashable offense, e.g. `OPERATIONAL` or `MISCONDUCT`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReasonCode(pub String);

impl ReasonCode {
    /// Reason codes are case-insensitive; they are stored upper-case.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base amount a penalty percentage applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyMode {
    MinStake,
    MaxStake,
    CurrentStake,
}

impl fmt::Display for PenaltyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PenaltyMode::MinStake => write!(f, "min_stake"),
            PenaltyMode::MaxStake => write!(f, "max_stake"),
            PenaltyMode::CurrentStake => write!(f, "current_stake"),
        }
    }
}

impl std::str::FromStr for PenaltyMode {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "min_stake" | "min" => Ok(PenaltyMode::MinStake),
            "max_stake" | "max" => Ok(PenaltyMode::MaxStake),
            "current_stake" | "current" => Ok(PenaltyMode::CurrentStake),
            other => Err(VigilError::InvalidConfig(format!(
                "unknown penalty mode '{}'",
                other
            ))),
        }
    }
}

/// Penalty bound to a reason code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashPenalty {
    pub mode: PenaltyMode,
    pub percent: u8,
}

impl SlashPenalty {
    /// # Errors
    /// `InvalidConfig` if `percent > 100`.
    pub fn new(mode: PenaltyMode, percent: u8) -> Result<Self, VigilError> {
        if percent > 100 {
            return Err(VigilError::InvalidConfig(format!(
                "penalty percent must be at most 100, got {}",
                percent
            )));
        }
        Ok(Self { mode, percent })
    }
}

/// Parameters of the slash proposal machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashingParams {
    pub treasury: Treasury,
    pub max_slashable_stake_percent: u8,
    /// Smallest bond a proposer may post.
    pub min_bond: Amount,
    /// Whether a rejected proposal's bond goes to the treasury (otherwise it
    /// is returned to the proposer).
    pub forfeit_bond_on_reject: bool,
    pub penalties: BTreeMap<ReasonCode, SlashPenalty>,
}

impl SlashingParams {
    /// Check percentages are within [0, 100].
    pub fn validate(&self) -> Result<(), VigilError> {
        if self.max_slashable_stake_percent > 100 {
            return Err(VigilError::InvalidConfig(format!(
                "max_slashable_stake_percent must be at most 100, got {}",
                self.max_slashable_stake_percent
            )));
        }
        if self.treasury.proposer_percent > 100 {
            return Err(VigilError::InvalidConfig(format!(
                "proposer_percent must be at most 100, got {}",
                self.treasury.proposer_percent
            )));
        }
        if let Some((reason, penalty)) = self.penalties.iter().find(|(_, p)| p.percent > 100) {
            return Err(VigilError::InvalidConfig(format!(
                "penalty for {} is {}%",
                reason, penalty.percent
            )));
        }
        Ok(())
    }

    pub fn penalty(&self, reason: &ReasonCode) -> Result<SlashPenalty, VigilError> {
        self.penalties
            .get(reason)
            .copied()
            .ok_or_else(|| VigilError::UnknownSlashReason(reason.to_string()))
    }
}

impl Default for SlashingParams {
    fn default() -> Self {
        Self {
            treasury: Treasury::default(),
            max_slashable_stake_percent: DEFAULT_MAX_SLASHABLE_STAKE_PERCENT,
            min_bond: 0,
            forfeit_bond_on_reject: true,
            penalties: BTreeMap::new(),
        }
    }
}

/// Compute the amount to slash from a pool.
///
/// # Arguments
/// - `penalty`: Mode and percentage bound to the proposal's reason.
/// - `threshold`: The subject's registry bounds (for the min/max modes).
/// - `total_active_stake`: The pool's stake at execution time.
/// - `max_slashable_stake_percent`: Safety cap on `total_active_stake`.
///
/// # Returns
/// The slash amount. Never exceeds `total_active_stake`.
pub fn compute_slash_value(
    penalty: &SlashPenalty,
    threshold: &StakeThreshold,
    total_active_stake: Amount,
    max_slashable_stake_percent: u8,
) -> Result<Amount, VigilError> {
    let base = match penalty.mode {
        PenaltyMode::MinStake => threshold.min,
        PenaltyMode::MaxStake => threshold.max,
        PenaltyMode::CurrentStake => total_active_stake,
    };
    let value = math::percent_of(base, penalty.percent)?;
    let cap = math::percent_of(total_active_stake, max_slashable_stake_percent)?;
    Ok(value.min(cap))
}
