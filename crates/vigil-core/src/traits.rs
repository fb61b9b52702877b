// crates/vigil-core/src/traits.rs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VigilError;
use crate::subject::Subject;

/// Stake bounds a registry assigns to a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeThreshold {
    /// Minimum stake the subject needs to be considered staked.
    pub min: u128,
    /// Maximum stake the subject's pool accepts.
    pub max: u128,
    /// Whether deposits are currently accepted for the subject.
    pub activated: bool,
}

/// Oracle for subject existence and stake bounds.
///
/// Implemented by the external subject registries (scanners, agents, pools).
/// `vigil_core::registry::StaticSubjectRegistry` is an in-memory implementation.
pub trait StakeSubjectValidator: Send + Sync {
    /// Stake bounds for the subject, or `None` if the subject is unknown.
    fn stake_threshold(&self, subject: &Subject) -> Option<StakeThreshold>;

    /// True if the subject exists and accepts deposits.
    fn is_stake_activated(&self, subject: &Subject) -> bool {
        self.stake_threshold(subject)
            .map(|t| t.activated)
            .unwrap_or(false)
    }
}

/// Trait for persistent engine snapshots and the event journal.
///
/// Implemented by vigil-store (RocksDB backend). Payloads are opaque bytes so
/// the store does not depend on the economics types it persists.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Overwrite the current snapshot.
    async fn save_snapshot(&self, bytes: &[u8]) -> Result<(), VigilError>;

    /// Load the current snapshot, if one was ever saved.
    async fn load_snapshot(&self) -> Result<Option<Vec<u8>>, VigilError>;

    /// Append events to the journal. Returns the sequence number of the last one.
    async fn append_events(&self, events: &[Vec<u8>]) -> Result<u64, VigilError>;

    /// Append events and overwrite the snapshot as one atomic write. Either
    /// both land or neither does. Returns the sequence number of the last
    /// event.
    async fn commit(&self, events: &[Vec<u8>], snapshot: &[u8]) -> Result<u64, VigilError>;

    /// Read up to `limit` journal entries starting at sequence `from`.
    async fn read_events(&self, from: u64, limit: usize) -> Result<Vec<(u64, Vec<u8>)>, VigilError>;
}
