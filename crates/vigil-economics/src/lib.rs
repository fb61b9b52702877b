// crates/vigil-economics/src/lib.rs
//
// vigil-economics: share-based stake pools, reward accrual, slashing, and the
// slash proposal state machine for the Vigil staking ledger.
//
// All token values are tracked in base units (the smallest unit of VGL).
// 1 VGL = 10^18 units.

pub mod clock;
pub mod controller;
pub mod engine;
pub mod events;
pub mod math;
pub mod memory;
pub mod pool;
pub mod proposal;
pub mod rewards;
pub mod schema;
pub mod shared;
pub mod slashing;
pub mod staking;
pub mod token;
pub mod treasury;

// Re-export key types for ergonomic access from downstream crates.
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerState, SlashingController};
pub use engine::StakingEngine;
pub use events::{EngineEvent, LedgerEvent, SlashingEvent};
pub use memory::MemoryStore;
pub use pool::{HolderBalance, StakePool};
pub use proposal::{Evidence, ProposalState, SlashProposal, MAX_EVIDENCE_ENTRIES, MAX_EVIDENCE_LENGTH};
pub use rewards::REWARD_SCALE;
pub use schema::{decode_snapshot, EngineSnapshot, CURRENT_SCHEMA_VERSION};
pub use shared::SharedEngine;
pub use slashing::{compute_slash_value, PenaltyMode, ReasonCode, SlashPenalty, SlashingParams};
pub use staking::{StakeLedger, MAX_WITHDRAWAL_DELAY, MIN_WITHDRAWAL_DELAY};
pub use token::{format_vgl, parse_vgl, Amount, Shares, TokenBank, UNITS_PER_VGL};
pub use treasury::{SlashSplit, Treasury};
