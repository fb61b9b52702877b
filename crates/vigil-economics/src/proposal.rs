// crates/vigil-economics/src/proposal.rs
//
// Slash proposal records and their lifecycle.
//
// Valid transitions:
//   Undefined -> Created
//   Created   -> InReview | Rejected | Dismissed
//   InReview  -> Reviewed | Reverted
//   Reviewed  -> Executed | Reverted
//
// Rejected, Dismissed, Executed and Reverted are terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use vigil_core::error::VigilError;
use vigil_core::identity::Account;
use vigil_core::subject::Subject;

use crate::slashing::ReasonCode;
use crate::token::Amount;

/// Maximum number of evidence strings accepted per submission.
pub const MAX_EVIDENCE_ENTRIES: usize = 5;

/// Maximum length (in characters) of a single evidence string.
pub const MAX_EVIDENCE_LENGTH: usize = 200;

/// Lifecycle states of a slash proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Undefined,
    Created,
    Rejected,
    Dismissed,
    InReview,
    Reviewed,
    Executed,
    Reverted,
}

impl ProposalState {
    /// True for states no transition leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalState::Rejected
                | ProposalState::Dismissed
                | ProposalState::Executed
                | ProposalState::Reverted
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle.
    pub fn can_transition_to(&self, next: ProposalState) -> bool {
        matches!(
            (self, next),
            (ProposalState::Undefined, ProposalState::Created)
                | (ProposalState::Created, ProposalState::InReview)
                | (ProposalState::Created, ProposalState::Rejected)
                | (ProposalState::Created, ProposalState::Dismissed)
                | (ProposalState::InReview, ProposalState::Reviewed)
                | (ProposalState::InReview, ProposalState::Reverted)
                | (ProposalState::Reviewed, ProposalState::Executed)
                | (ProposalState::Reviewed, ProposalState::Reverted)
        )
    }

    /// `Ok(())` if `self -> next` is allowed, `InvalidTransition` otherwise.
    pub fn check_transition(&self, next: ProposalState) -> Result<(), VigilError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(VigilError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalState::Undefined => write!(f, "Undefined"),
            ProposalState::Created => write!(f, "Created"),
            ProposalState::Rejected => write!(f, "Rejected"),
            ProposalState::Dismissed => write!(f, "Dismissed"),
            ProposalState::InReview => write!(f, "InReview"),
            ProposalState::Reviewed => write!(f, "Reviewed"),
            ProposalState::Executed => write!(f, "Executed"),
            ProposalState::Reverted => write!(f, "Reverted"),
        }
    }
}

/// One piece of evidence attached to a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub submitter: Account,
    pub content: String,
    pub submitted_at: u64,
}

/// A request to slash a subject's pool, moving through review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashProposal {
    pub id: u64,
    pub proposer: Account,
    pub subject: Subject,
    pub reason: ReasonCode,
    pub state: ProposalState,
    /// Bond pulled from the proposer at creation. Zero once refunded,
    /// returned or forfeited.
    pub bond_amount: Amount,
    pub evidence: Vec<Evidence>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl SlashProposal {
    /// True while the proposal holds its subject's pool frozen.
    pub fn is_open(&self) -> bool {
        !self.state.is_terminal() && self.state != ProposalState::Undefined
    }
}

/// Validate a batch of evidence strings.
///
/// A batch holds at most `MAX_EVIDENCE_ENTRIES` entries of at most
/// `MAX_EVIDENCE_LENGTH` characters each. `required` rejects an empty batch.
pub fn validate_evidence(entries: &[String], required: bool) -> Result<(), VigilError> {
    if required && entries.is_empty() {
        return Err(VigilError::InvalidEvidence(
            "at least one evidence entry is required".to_string(),
        ));
    }
    if entries.len() > MAX_EVIDENCE_ENTRIES {
        return Err(VigilError::InvalidEvidence(format!(
            "{} entries exceeds the limit of {}",
            entries.len(),
            MAX_EVIDENCE_ENTRIES
        )));
    }
    for (i, entry) in entries.iter().enumerate() {
        let len = entry.chars().count();
        if len > MAX_EVIDENCE_LENGTH {
            return Err(VigilError::InvalidEvidence(format!(
                "entry {} is {} characters, limit is {}",
                i, len, MAX_EVIDENCE_LENGTH
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ProposalState; 8] = [
        ProposalState::Undefined,
        ProposalState::Created,
        ProposalState::Rejected,
        ProposalState::Dismissed,
        ProposalState::InReview,
        ProposalState::Reviewed,
        ProposalState::Executed,
        ProposalState::Reverted,
    ];

    #[test]
    fn test_valid_edge_count() {
        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(edges, 8);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL.iter() {
                assert!(!from.can_transition_to(*to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_no_self_loops() {
        for state in ALL.iter() {
            assert!(!state.can_transition_to(*state));
        }
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = ProposalState::Created
            .check_transition(ProposalState::Executed)
            .unwrap_err();
        assert_eq!(
            err,
            VigilError::InvalidTransition {
                from: "Created".to_string(),
                to: "Executed".to_string(),
            }
        );
    }

    #[test]
    fn test_evidence_limits() {
        assert!(validate_evidence(&[], false).is_ok());
        assert!(validate_evidence(&[], true).is_err());

        let six: Vec<String> = (0..6).map(|i| format!("e{}", i)).collect();
        assert!(validate_evidence(&six, true).is_err());
        assert!(validate_evidence(&six[..5], true).is_ok());

        let exact = "x".repeat(MAX_EVIDENCE_LENGTH);
        assert!(validate_evidence(&[exact], true).is_ok());
        let long = "x".repeat(MAX_EVIDENCE_LENGTH + 1);
        assert!(matches!(
            validate_evidence(&[long], true),
            Err(VigilError::InvalidEvidence(_))
        ));
    }

    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&ProposalState::InReview).unwrap();
        assert_eq!(json, "\"in_review\"");
    }
}
