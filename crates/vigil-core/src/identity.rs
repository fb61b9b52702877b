// crates/vigil-core/src/identity.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash_parts;
use crate::error::VigilError;

/// Domain separator for label-derived accounts.
const ACCOUNT_LABEL_DOMAIN: &[u8] = b"vigil:account:";

/// An account on the Vigil network: a 32-byte address.
///
/// Accounts hold tokens in the `TokenBank` and shares in stake pools. The
/// ledger itself owns two reserved accounts: the staking custody account that
/// holds all pool principal and undistributed rewards, and the slashing escrow
/// that holds proposal bonds.
///
/// Serialized as a `0x`-prefixed hex string so accounts can key JSON maps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Account(pub [u8; 32]);

impl Account {
    /// Derive a deterministic account from a human-readable label.
    ///
    /// Used by the CLI (`--as alice`) and configuration files so operators
    /// can name accounts without handling raw addresses.
    pub fn from_label(label: &str) -> Self {
        Self(hash_parts(&[ACCOUNT_LABEL_DOMAIN, label.as_bytes()]))
    }

    /// Reserved account holding pool principal and undistributed rewards.
    pub fn staking_custody() -> Self {
        Self::from_label("__staking_custody")
    }

    /// Reserved account holding slash proposal bonds.
    pub fn slashing_escrow() -> Self {
        Self::from_label("__slashing_escrow")
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Short display form: first 4 and last 2 bytes.
    pub fn short(&self) -> String {
        format!("0x{}..{}", hex::encode(&self.0[..4]), hex::encode(&self.0[30..]))
    }
}

impl FromStr for Account {
    type Err = VigilError;

    /// Parse a 32-byte hex address, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            VigilError::Serialization(format!("account address must be 32 bytes: {}", s))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.short())
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Account::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_is_deterministic() {
        assert_eq!(Account::from_label("alice"), Account::from_label("alice"));
        assert_ne!(Account::from_label("alice"), Account::from_label("bob"));
    }

    #[test]
    fn test_reserved_accounts_are_distinct() {
        assert_ne!(Account::staking_custody(), Account::slashing_escrow());
        assert_ne!(Account::staking_custody(), Account::from_label("alice"));
    }

    #[test]
    fn test_hex_parse_roundtrip() {
        let account = Account::from_label("carol");
        let parsed: Account = account.to_hex().parse().unwrap();
        assert_eq!(parsed, account);

        let unprefixed: Account = hex::encode(account.0).parse().unwrap();
        assert_eq!(unprefixed, account);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("0xdeadbeef".parse::<Account>().is_err());
        assert!("not-hex".parse::<Account>().is_err());
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let account = Account::from_label("dave");
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, format!("\"{}\"", account.to_hex()));
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
