// crates/vigil-store/src/lib.rs
//
// vigil-store: Storage layer for the Vigil staking ledger.
//
// Provides a RocksDB-backed SnapshotStore holding the latest engine
// snapshot and an append-only, sequence-numbered event journal.

pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use rocks::RocksStore;
