// crates/vigil-core/src/lib.rs
//
// vigil-core: Core types, traits, and authorization primitives for the Vigil
// staking ledger.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines stake subjects and their packed share identifiers, accounts,
// the protocol-wide error type, the authorization context passed into
// privileged operations, and the collaborator traits (subject registry,
// snapshot store) the ledger consumes.

pub mod auth;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod registry;
pub mod subject;
pub mod subject_key;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use vigil_core::Subject;`

// Subject types
pub use subject::{ShareKind, Subject, SubjectId, SubjectType};
pub use subject_key::{active_share_id, inactive_share_id, share_id, ShareId};

// Identity and authorization
pub use auth::{AuthContext, Capability};
pub use identity::Account;

// Error type
pub use error::VigilError;

// Traits and the in-memory registry
pub use registry::{StaticSubjectRegistry, SubjectEntry};
pub use traits::{SnapshotStore, StakeSubjectValidator, StakeThreshold};
