// crates/vigil-core/src/auth.rs
//
// Explicit authorization context for privileged operations.
//
// Instead of a global role registry, every privileged call receives an
// `AuthContext` naming the caller and the capabilities it holds. The check
// happens once, at the call boundary, before any state is read or mutated.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VigilError;
use crate::identity::Account;

/// A privilege that gates one family of operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Tune parameters: withdrawal delay, slash penalties.
    Admin,
    /// Move slash proposals through review (in-review, reviewed, dismiss,
    /// reject, revert) and attach evidence.
    Arbiter,
    /// Freeze and slash pools; execute reviewed slash proposals.
    Slasher,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Admin => write!(f, "admin"),
            Capability::Arbiter => write!(f, "arbiter"),
            Capability::Slasher => write!(f, "slasher"),
        }
    }
}

/// The caller of an operation and the capabilities it has been granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub caller: Account,
    capabilities: BTreeSet<Capability>,
}

impl AuthContext {
    /// A context with no capabilities.
    pub fn new(caller: Account) -> Self {
        Self {
            caller,
            capabilities: BTreeSet::new(),
        }
    }

    /// Builder: grant one capability.
    pub fn with(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// A context holding every capability. Used by tests and bootstrap.
    pub fn root(caller: Account) -> Self {
        Self::new(caller)
            .with(Capability::Admin)
            .with(Capability::Arbiter)
            .with(Capability::Slasher)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Fail with `Unauthorized` unless the capability is held.
    pub fn require(&self, capability: Capability) -> Result<(), VigilError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(VigilError::Unauthorized { capability })
        }
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.capabilities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_capability() {
        let ctx = AuthContext::new(Account::from_label("eve"));
        assert_eq!(
            ctx.require(Capability::Slasher),
            Err(VigilError::Unauthorized {
                capability: Capability::Slasher
            })
        );
    }

    #[test]
    fn test_with_grants_only_named_capability() {
        let ctx = AuthContext::new(Account::from_label("arb")).with(Capability::Arbiter);
        assert!(ctx.require(Capability::Arbiter).is_ok());
        assert!(ctx.require(Capability::Admin).is_err());
        assert!(ctx.require(Capability::Slasher).is_err());
    }

    #[test]
    fn test_root_has_everything() {
        let ctx = AuthContext::root(Account::from_label("root"));
        assert_eq!(ctx.capabilities().count(), 3);
    }
}
