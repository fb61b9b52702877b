// crates/vigil-economics/src/events.rs
//
// Events recorded by the stake ledger and the slash proposal machine.
//
// Operations append events to the ledger's pending journal in the order the
// effects happened. The engine drains the journal after each call and hands
// it to the snapshot store.

use serde::{Deserialize, Serialize};

use vigil_core::identity::Account;
use vigil_core::subject::{ShareKind, Subject};
use vigil_core::subject_key::ShareId;

use crate::proposal::ProposalState;
use crate::slashing::{ReasonCode, SlashPenalty};
use crate::token::{Amount, Shares};

/// Stake ledger events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    StakeDeposited {
        subject: Subject,
        share_id: ShareId,
        depositor: Account,
        amount: Amount,
        shares: Shares,
    },
    WithdrawalInitiated {
        subject: Subject,
        holder: Account,
        shares: Shares,
        unlock_time: u64,
    },
    WithdrawalExecuted {
        subject: Subject,
        holder: Account,
        shares: Shares,
        amount: Amount,
    },
    Rewarded {
        subject: Subject,
        payer: Account,
        amount: Amount,
    },
    Released {
        subject: Subject,
        holder: Account,
        amount: Amount,
    },
    Slashed {
        subject: Subject,
        proposer: Account,
        amount: Amount,
        proposer_share: Amount,
        treasury_share: Amount,
    },
    Froze {
        subject: Subject,
        frozen: bool,
    },
    MaxStakeReached {
        subject: Subject,
        max: Amount,
    },
    DelaySet {
        delay: u64,
    },
    SharesTransferred {
        subject: Subject,
        kind: ShareKind,
        from: Account,
        to: Account,
        shares: Shares,
    },
}

/// Slash proposal machine events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashingEvent {
    MachineCreated {
        proposal_id: u64,
        subject: Subject,
    },
    SlashProposalCreated {
        proposal_id: u64,
        proposer: Account,
        subject: Subject,
        reason: ReasonCode,
        bond: Amount,
    },
    StateTransition {
        proposal_id: u64,
        from: ProposalState,
        to: ProposalState,
    },
    EvidenceSubmitted {
        proposal_id: u64,
        submitter: Account,
        evidence: Vec<String>,
    },
    SlashPenaltySet {
        reason: ReasonCode,
        penalty: SlashPenalty,
    },
    SlashProposalUpdated {
        proposal_id: u64,
        subject: Subject,
        reason: ReasonCode,
    },
    BondReturned {
        proposal_id: u64,
        to: Account,
        amount: Amount,
    },
    BondForfeited {
        proposal_id: u64,
        amount: Amount,
    },
}

/// Any event the engine journals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    Ledger(LedgerEvent),
    Slashing(SlashingEvent),
}

impl EngineEvent {
    /// Short event name for logs and tables.
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::Ledger(e) => match e {
                LedgerEvent::StakeDeposited { .. } => "StakeDeposited",
                LedgerEvent::WithdrawalInitiated { .. } => "WithdrawalInitiated",
                LedgerEvent::WithdrawalExecuted { .. } => "WithdrawalExecuted",
                LedgerEvent::Rewarded { .. } => "Rewarded",
                LedgerEvent::Released { .. } => "Released",
                LedgerEvent::Slashed { .. } => "Slashed",
                LedgerEvent::Froze { .. } => "Froze",
                LedgerEvent::MaxStakeReached { .. } => "MaxStakeReached",
                LedgerEvent::DelaySet { .. } => "DelaySet",
                LedgerEvent::SharesTransferred { .. } => "SharesTransferred",
            },
            EngineEvent::Slashing(e) => match e {
                SlashingEvent::MachineCreated { .. } => "MachineCreated",
                SlashingEvent::SlashProposalCreated { .. } => "SlashProposalCreated",
                SlashingEvent::StateTransition { .. } => "StateTransition",
                SlashingEvent::EvidenceSubmitted { .. } => "EvidenceSubmitted",
                SlashingEvent::SlashPenaltySet { .. } => "SlashPenaltySet",
                SlashingEvent::SlashProposalUpdated { .. } => "SlashProposalUpdated",
                SlashingEvent::BondReturned { .. } => "BondReturned",
                SlashingEvent::BondForfeited { .. } => "BondForfeited",
            },
        }
    }
}

impl From<LedgerEvent> for EngineEvent {
    fn from(e: LedgerEvent) -> Self {
        EngineEvent::Ledger(e)
    }
}

impl From<SlashingEvent> for EngineEvent {
    fn from(e: SlashingEvent) -> Self {
        EngineEvent::Slashing(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::subject::SubjectType;

    #[test]
    fn test_event_json_roundtrip_with_large_amount() {
        let event: EngineEvent = LedgerEvent::Rewarded {
            subject: Subject::new(SubjectType::Scanner, 7),
            payer: Account::from_label("payer"),
            amount: u128::MAX,
        }
        .into();
        let json = serde_json::to_vec(&event).unwrap();
        let back: EngineEvent = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.name(), "Rewarded");
    }

    #[test]
    fn test_transition_event_name() {
        let event: EngineEvent = SlashingEvent::StateTransition {
            proposal_id: 1,
            from: ProposalState::Created,
            to: ProposalState::InReview,
        }
        .into();
        assert_eq!(event.name(), "StateTransition");
    }
}
