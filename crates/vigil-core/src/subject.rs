// crates/vigil-core/src/subject.rs
//
// Stake subjects: the entities third parties can stake on.
//
// A subject is identified by `(subject_type, subject_id)`. Whether a subject
// exists, and the bounds on the stake it may carry, is owned by the external
// registry behind `StakeSubjectValidator`. The ledger treats subjects as
// opaque keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VigilError;

/// Kinds of stake subjects on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// A scanner node watching a chain for threats.
    Scanner,
    /// A detection agent (bot) run by scanners.
    Agent,
    /// A node-runner pool grouping scanners under one owner.
    ScannerPool,
    /// Delegated stake on a scanner pool.
    DelegatorScannerPool,
}

impl SubjectType {
    /// All subject types, in wire-code order.
    pub const ALL: [SubjectType; 4] = [
        SubjectType::Scanner,
        SubjectType::Agent,
        SubjectType::ScannerPool,
        SubjectType::DelegatorScannerPool,
    ];

    /// The wire code of this subject type.
    pub fn code(&self) -> u8 {
        match self {
            SubjectType::Scanner => 0,
            SubjectType::Agent => 1,
            SubjectType::ScannerPool => 2,
            SubjectType::DelegatorScannerPool => 3,
        }
    }
}

impl TryFrom<u8> for SubjectType {
    type Error = VigilError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SubjectType::Scanner),
            1 => Ok(SubjectType::Agent),
            2 => Ok(SubjectType::ScannerPool),
            3 => Ok(SubjectType::DelegatorScannerPool),
            other => Err(VigilError::InvalidSubjectType(other)),
        }
    }
}

impl FromStr for SubjectType {
    type Err = VigilError;

    /// Accepts the snake_case name (`scanner`, `agent`, `scanner_pool`,
    /// `delegator_scanner_pool`) or the numeric wire code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scanner" => Ok(SubjectType::Scanner),
            "agent" => Ok(SubjectType::Agent),
            "scanner_pool" => Ok(SubjectType::ScannerPool),
            "delegator_scanner_pool" => Ok(SubjectType::DelegatorScannerPool),
            other => {
                let code: u8 = other.parse().map_err(|_| VigilError::InvalidSubjectType(u8::MAX))?;
                SubjectType::try_from(code)
            }
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectType::Scanner => write!(f, "scanner"),
            SubjectType::Agent => write!(f, "agent"),
            SubjectType::ScannerPool => write!(f, "scanner_pool"),
            SubjectType::DelegatorScannerPool => write!(f, "delegator_scanner_pool"),
        }
    }
}

/// A 256-bit subject identifier (big-endian).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectId(pub [u8; 32]);

impl SubjectId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex with leading zero bytes stripped.
    pub fn to_hex(&self) -> String {
        let first = self.0.iter().position(|b| *b != 0).unwrap_or(31);
        format!("0x{}", hex::encode(&self.0[first..]))
    }
}

impl From<u64> for SubjectId {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl FromStr for SubjectId {
    type Err = VigilError;

    /// Parse a decimal `u64` or a `0x`-prefixed hex value of up to 32 bytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex_part) = s.strip_prefix("0x") {
            let padded = if hex_part.len() % 2 == 1 {
                format!("0{}", hex_part)
            } else {
                hex_part.to_string()
            };
            let raw = hex::decode(&padded)?;
            if raw.len() > 32 {
                return Err(VigilError::Serialization(format!(
                    "subject id wider than 256 bits: {}",
                    s
                )));
            }
            let mut bytes = [0u8; 32];
            bytes[32 - raw.len()..].copy_from_slice(&raw);
            return Ok(Self(bytes));
        }
        let value: u64 = s
            .parse()
            .map_err(|_| VigilError::Serialization(format!("invalid subject id: {}", s)))?;
        Ok(Self::from(value))
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.to_hex())
    }
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        SubjectId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A stake target: `(subject_type, subject_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub subject_type: SubjectType,
    pub subject_id: SubjectId,
}

impl Subject {
    /// Subject with a small numeric ID.
    pub fn new(subject_type: SubjectType, subject_id: u64) -> Self {
        Self::with_id(subject_type, SubjectId::from(subject_id))
    }

    pub fn with_id(subject_type: SubjectType, subject_id: SubjectId) -> Self {
        Self {
            subject_type,
            subject_id,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.subject_id)
    }
}

impl FromStr for Subject {
    type Err = VigilError;

    /// Parse `type:id`, e.g. `scanner:0xabc` or `agent:42`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, id) = s
            .split_once(':')
            .ok_or_else(|| VigilError::Serialization(format!("expected <type>:<id>, got {}", s)))?;
        Ok(Self::with_id(ty.parse()?, id.parse()?))
    }
}

/// Which side of a pool a share sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    /// Earning rewards, backed by staked value.
    Active,
    /// Withdrawal initiated: no new rewards, still slashable.
    Inactive,
}

impl FromStr for ShareKind {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ShareKind::Active),
            "inactive" => Ok(ShareKind::Inactive),
            other => Err(VigilError::Serialization(format!("invalid share kind: {}", other))),
        }
    }
}

impl fmt::Display for ShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareKind::Active => write!(f, "active"),
            ShareKind::Inactive => write!(f, "inactive"),
        }
    }
}
