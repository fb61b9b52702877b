// crates/vigil-economics/src/schema.rs
//
// Versioned snapshot format and load-time migration.
//
// Every persisted snapshot carries `schema_version`. Decoding first reads
// only that field, then parses the body with the matching layout and
// migrates it forward to CURRENT_SCHEMA_VERSION. Migration runs once, at
// load; the next save writes the current layout.
//
// Version history:
//   1: pools without reward accounting; holder unlock as an optional time
//   2: reward accumulator and reserve per pool; reward debt and accrued
//       rewards per holder; unlock as a plain timestamp (0 = none)

use serde::{Deserialize, Serialize};

use vigil_core::error::VigilError;
use vigil_core::identity::Account;
use vigil_core::subject::Subject;

use crate::controller::ControllerState;
use crate::pool::{HolderBalance, StakePool};
use crate::token::TokenBank;

/// Layout version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// One pool in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub subject: Subject,
    pub pool: StakePool,
}

/// One holder position in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderRecord {
    pub subject: Subject,
    pub account: Account,
    pub balance: HolderBalance,
}

/// Full persisted engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub schema_version: u32,
    pub withdrawal_delay: u64,
    pub token: TokenBank,
    pub pools: Vec<PoolRecord>,
    pub holders: Vec<HolderRecord>,
    pub controller: ControllerState,
}

impl EngineSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, VigilError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Deserialize)]
struct VersionHeader {
    #[serde(default = "unversioned")]
    schema_version: u32,
}

/// Snapshots written before versioning are version 1.
fn unversioned() -> u32 {
    1
}

/// Decode a snapshot of any supported version into the current layout.
pub fn decode_snapshot(bytes: &[u8]) -> Result<EngineSnapshot, VigilError> {
    let header: VersionHeader = serde_json::from_slice(bytes)?;
    match header.schema_version {
        1 => {
            let old: v1::Snapshot = serde_json::from_slice(bytes)?;
            tracing::info!(
                "Migrating snapshot from schema v1 to v{} ({} pools, {} holders)",
                CURRENT_SCHEMA_VERSION,
                old.pools.len(),
                old.holders.len()
            );
            Ok(migrate_v1(old))
        }
        CURRENT_SCHEMA_VERSION => Ok(serde_json::from_slice(bytes)?),
        found => Err(VigilError::SchemaVersion {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        }),
    }
}

fn migrate_v1(old: v1::Snapshot) -> EngineSnapshot {
    EngineSnapshot {
        schema_version: CURRENT_SCHEMA_VERSION,
        withdrawal_delay: old.withdrawal_delay,
        token: old.token,
        pools: old
            .pools
            .into_iter()
            .map(|r| PoolRecord {
                subject: r.subject,
                pool: StakePool {
                    total_active_stake: r.pool.total_active_stake,
                    total_active_shares: r.pool.total_active_shares,
                    total_inactive_shares: r.pool.total_inactive_shares,
                    frozen: r.pool.frozen,
                    acc_reward_per_share: 0,
                    reward_remainder: 0,
                    remainder_base: 0,
                    reward_reserve: 0,
                },
            })
            .collect(),
        holders: old
            .holders
            .into_iter()
            .map(|r| HolderRecord {
                subject: r.subject,
                account: r.account,
                balance: HolderBalance {
                    active_shares: r.balance.active_shares,
                    inactive_shares: r.balance.inactive_shares,
                    reward_debt: 0,
                    accrued_rewards: 0,
                    pending_unlock: r.balance.pending_unlock.unwrap_or(0),
                },
            })
            .collect(),
        controller: old.controller,
    }
}

/// Version 1 layout.
pub mod v1 {
    use serde::{Deserialize, Serialize};

    use vigil_core::identity::Account;
    use vigil_core::subject::Subject;

    use crate::controller::ControllerState;
    use crate::token::{Amount, Shares, TokenBank};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Pool {
        pub total_active_stake: Amount,
        pub total_active_shares: Shares,
        pub total_inactive_shares: Shares,
        pub frozen: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Holder {
        pub active_shares: Shares,
        pub inactive_shares: Shares,
        pub pending_unlock: Option<u64>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PoolRecord {
        pub subject: Subject,
        pub pool: Pool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HolderRecord {
        pub subject: Subject,
        pub account: Account,
        pub balance: Holder,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Snapshot {
        pub schema_version: u32,
        pub withdrawal_delay: u64,
        pub token: TokenBank,
        pub pools: Vec<PoolRecord>,
        pub holders: Vec<HolderRecord>,
        pub controller: ControllerState,
    }
}
