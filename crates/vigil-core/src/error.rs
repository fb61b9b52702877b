// crates/vigil-core/src/error.rs

use thiserror::Error;

use crate::auth::Capability;

/// Protocol-wide error types for the Vigil staking ledger.
///
/// Every variant is deterministic: resubmitting the same call against the same
/// state fails the same way. A call that returns an error has not mutated any
/// ledger or proposal state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VigilError {
    /// The `u8` does not name a known subject type.
    #[error("Invalid subject type: {0}")]
    InvalidSubjectType(u8),

    /// The subject is unknown to the registry or staking is not activated for it.
    #[error("Stake inactive or subject not found: {0}")]
    SubjectInactiveOrNotFound(String),

    /// A zero amount was passed where a positive one is required.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Not enough active shares for the operation (holder balance, or an
    /// empty pool receiving a reward).
    #[error("No active shares: {0}")]
    NoActiveShares(String),

    /// Holder has no (or not enough) inactive shares.
    #[error("No inactive shares: {0}")]
    NoInactiveShares(String),

    /// The withdrawal delay has not elapsed yet.
    #[error("Withdrawal not ready: unlocks at {unlock_at}, now {now}")]
    WithdrawalNotReady { unlock_at: u64, now: u64 },

    /// The pool is frozen pending a slash review.
    #[error("Stake frozen: {0}")]
    StakeFrozen(String),

    /// Slashing requires the pool to be frozen first.
    #[error("Stake not frozen: {0}")]
    StakeNotFrozen(String),

    /// The pool has outstanding shares but no stake left to back them.
    #[error("Pool depleted: {0}")]
    PoolDepleted(String),

    /// A token account does not hold enough to cover a transfer.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    /// Withdrawal delay outside the permitted bounds.
    #[error("Delay {delay}s outside bounds [{min}s, {max}s]")]
    DelayOutOfBounds { delay: u64, min: u64, max: u64 },

    /// The caller lacks a capability required by the operation.
    #[error("Unauthorized: missing capability {capability}")]
    Unauthorized { capability: Capability },

    /// No penalty is configured for the slash reason.
    #[error("Unknown slash reason: {0}")]
    UnknownSlashReason(String),

    /// Evidence list is empty, too long, or contains an oversized entry.
    #[error("Invalid evidence: {0}")]
    InvalidEvidence(String),

    /// The proposal bond is below the configured minimum.
    #[error("Bond too small: provided {provided}, minimum {minimum}")]
    BondTooSmall { provided: u128, minimum: u128 },

    /// No proposal with the given ID exists.
    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    /// The requested proposal state transition is not permitted.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Configuration value rejected at construction time.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Checked arithmetic overflowed.
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// An accounting invariant does not hold.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Storage layer error (RocksDB).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persisted data carries a schema version this build cannot read.
    #[error("Unsupported schema version {found} (supported up to {supported})")]
    SchemaVersion { found: u32, supported: u32 },
}

impl From<serde_json::Error> for VigilError {
    fn from(e: serde_json::Error) -> Self {
        VigilError::Serialization(e.to_string())
    }
}

impl From<hex::FromHexError> for VigilError {
    fn from(e: hex::FromHexError) -> Self {
        VigilError::Serialization(format!("hex decode: {}", e))
    }
}
