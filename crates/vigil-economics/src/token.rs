// crates/vigil-economics/src/token.rs
//
// Staking token balances.
//
// The staking token is an external fungible token. `TokenBank` is the
// in-process balance book that stands in for it: every custody movement the
// ledger and the slashing controller make (pulling deposits, rewards and
// bonds; paying out withdrawals, rewards, slashes and refunds) is a
// `transfer` between accounts here.
//
// All accounting uses the smallest token unit. 1 VGL = 10^18 units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::error::VigilError;
use vigil_core::identity::Account;

use crate::math;

/// Number of base units in one VGL. 1 VGL = 10^18 units.
pub const UNITS_PER_VGL: u128 = 1_000_000_000_000_000_000;

/// Type alias for token amounts in base units.
pub type Amount = u128;

/// Type alias for pool share counts.
pub type Shares = u128;

/// Balance book for the staking token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBank {
    balances: BTreeMap<Account, Amount>,
    total_supply: Amount,
}

impl TokenBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of an account (zero if it never held tokens).
    pub fn balance_of(&self, account: &Account) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Create new tokens in an account.
    pub fn mint(&mut self, to: Account, amount: Amount) -> Result<(), VigilError> {
        let supply = math::add(self.total_supply, amount, "token supply")?;
        let balance = math::add(self.balance_of(&to), amount, "token balance")?;
        self.total_supply = supply;
        self.balances.insert(to, balance);
        debug!(account = %to, amount, "Minted tokens");
        Ok(())
    }

    /// Fail with `InsufficientBalance` unless `account` holds at least `amount`.
    ///
    /// Callers run this before mutating their own state so the later
    /// `transfer` cannot fail halfway through an operation.
    pub fn ensure_balance(&self, account: &Account, amount: Amount) -> Result<(), VigilError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(VigilError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    /// Move tokens between accounts. A zero amount is a no-op.
    pub fn transfer(&mut self, from: &Account, to: &Account, amount: Amount) -> Result<(), VigilError> {
        if amount == 0 || from == to {
            return self.ensure_balance(from, amount);
        }
        self.ensure_balance(from, amount)?;
        let to_balance = math::add(self.balance_of(to), amount, "token balance")?;

        let from_balance = self.balance_of(from) - amount;
        if from_balance == 0 {
            self.balances.remove(from);
        } else {
            self.balances.insert(*from, from_balance);
        }
        self.balances.insert(*to, to_balance);
        debug!(from = %from, to = %to, amount, "Token transfer");
        Ok(())
    }

    /// All non-zero balances.
    pub fn balances(&self) -> impl Iterator<Item = (&Account, &Amount)> {
        self.balances.iter()
    }
}

/// Render a base-unit amount as a decimal VGL string, trimming trailing zeros.
pub fn format_vgl(amount: Amount) -> String {
    let whole = amount / UNITS_PER_VGL;
    let frac = amount % UNITS_PER_VGL;
    if frac == 0 {
        format!("{} VGL", whole)
    } else {
        let frac_str = format!("{:018}", frac);
        let trimmed = frac_str.trim_end_matches('0');
        format!("{}.{} VGL", whole, trimmed)
    }
}

/// Parse an amount. A bare integer is base units; a `vgl` suffix takes a
/// decimal VGL value (`1.5vgl`, `2 VGL`).
pub fn parse_vgl(input: &str) -> Result<Amount, VigilError> {
    let s = input.trim();
    let invalid = || VigilError::Serialization(format!("invalid amount: {}", input));
    let lower = s.to_ascii_lowercase();
    let Some(value) = lower.strip_suffix("vgl") else {
        return s.parse::<Amount>().map_err(|_| invalid());
    };
    let value = value.trim();
    let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
    if whole.is_empty() || frac.len() > 18 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let whole: Amount = whole.parse().map_err(|_| invalid())?;
    let frac: Amount = if frac.is_empty() {
        0
    } else {
        format!("{:0<18}", frac).parse().map_err(|_| invalid())?
    };
    whole
        .checked_mul(UNITS_PER_VGL)
        .and_then(|w| w.checked_add(frac))
        .ok_or(VigilError::ArithmeticOverflow("amount"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Account {
        Account::from_label("alice")
    }

    fn bob() -> Account {
        Account::from_label("bob")
    }

    #[test]
    fn test_new_bank_is_empty() {
        let bank = TokenBank::new();
        assert_eq!(bank.total_supply(), 0);
        assert_eq!(bank.balance_of(&alice()), 0);
    }

    #[test]
    fn test_mint_and_transfer() {
        let mut bank = TokenBank::new();
        bank.mint(alice(), 100).unwrap();
        bank.transfer(&alice(), &bob(), 40).unwrap();
        assert_eq!(bank.balance_of(&alice()), 60);
        assert_eq!(bank.balance_of(&bob()), 40);
        assert_eq!(bank.total_supply(), 100);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut bank = TokenBank::new();
        bank.mint(alice(), 10).unwrap();
        let result = bank.transfer(&alice(), &bob(), 11);
        assert_eq!(
            result,
            Err(VigilError::InsufficientBalance {
                requested: 11,
                available: 10
            })
        );
        // Balances should be unchanged
        assert_eq!(bank.balance_of(&alice()), 10);
        assert_eq!(bank.balance_of(&bob()), 0);
    }

    #[test]
    fn test_transfer_full_balance_drops_entry() {
        let mut bank = TokenBank::new();
        bank.mint(alice(), 5).unwrap();
        bank.transfer(&alice(), &bob(), 5).unwrap();
        assert_eq!(bank.balances().count(), 1);
    }

    #[test]
    fn test_zero_transfer_is_noop() {
        let mut bank = TokenBank::new();
        bank.transfer(&alice(), &bob(), 0).unwrap();
        assert_eq!(bank.balances().count(), 0);
    }

    #[test]
    fn test_mint_overflow() {
        let mut bank = TokenBank::new();
        bank.mint(alice(), u128::MAX).unwrap();
        assert!(bank.mint(bob(), 1).is_err());
        assert_eq!(bank.balance_of(&bob()), 0);
    }

    #[test]
    fn test_format_vgl() {
        assert_eq!(format_vgl(42 * UNITS_PER_VGL), "42 VGL");
        assert_eq!(format_vgl(UNITS_PER_VGL + UNITS_PER_VGL / 2), "1.5 VGL");
        assert_eq!(format_vgl(0), "0 VGL");
    }

    #[test]
    fn test_parse_vgl() {
        assert_eq!(parse_vgl("1500").unwrap(), 1_500);
        assert_eq!(parse_vgl("2vgl").unwrap(), 2 * UNITS_PER_VGL);
        assert_eq!(parse_vgl("1.5 VGL").unwrap(), 3 * UNITS_PER_VGL / 2);
        assert_eq!(parse_vgl("0.000000000000000001vgl").unwrap(), 1);
        assert!(parse_vgl("1.0000000000000000001vgl").is_err());
        assert!(parse_vgl("-3").is_err());
        assert!(parse_vgl(".5vgl").is_err());
        assert_eq!(parse_vgl(&format_vgl(1_250)).unwrap(), 1_250);
    }
}
