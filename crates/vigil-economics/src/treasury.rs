// crates/vigil-economics/src/treasury.rs
//
// Destination of slash proceeds.
//
// An executed slash pays `proposer_percent` of the slashed amount to the
// proposal's author and the remainder to the treasury account. Forfeited
// proposal bonds also go to the treasury.

use serde::{Deserialize, Serialize};

use vigil_core::error::VigilError;
use vigil_core::identity::Account;

use crate::math;
use crate::token::Amount;

/// Default share of a slash paid to the proposer, in percent.
pub const DEFAULT_PROPOSER_PERCENT: u8 = 10;

/// The treasury account and the proposer reward rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    pub account: Account,
    pub proposer_percent: u8,
}

/// How a slashed amount was divided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashSplit {
    pub proposer: Amount,
    pub treasury: Amount,
}

impl SlashSplit {
    pub fn total(&self) -> Amount {
        self.proposer.saturating_add(self.treasury)
    }
}

impl Treasury {
    /// Create a treasury.
    ///
    /// # Errors
    /// `InvalidConfig` if `proposer_percent > 100`.
    pub fn new(account: Account, proposer_percent: u8) -> Result<Self, VigilError> {
        if proposer_percent > 100 {
            return Err(VigilError::InvalidConfig(format!(
                "proposer_percent must be at most 100, got {}",
                proposer_percent
            )));
        }
        Ok(Self {
            account,
            proposer_percent,
        })
    }

    /// Divide `slashed` between proposer (floor) and treasury (remainder).
    pub fn split(&self, slashed: Amount) -> Result<SlashSplit, VigilError> {
        let proposer = math::percent_of(slashed, self.proposer_percent)?;
        let treasury = math::sub(slashed, proposer, "treasury share")?;
        Ok(SlashSplit { proposer, treasury })
    }
}

impl Default for Treasury {
    fn default() -> Self {
        Self {
            account: Account::from_label("treasury"),
            proposer_percent: DEFAULT_PROPOSER_PERCENT,
        }
    }
}
