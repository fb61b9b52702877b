// crates/vigil-economics/src/controller.rs
//
// SlashingController: the slash proposal state machine.
//
// The controller is the only component that freezes and slashes pools on
// behalf of a dispute. It acts on the ledger with its own Slasher capability;
// callers authorize against the controller with the capability each
// transition requires:
//   propose                    any account posting a bond
//   in-review, reviewed        Arbiter
//   dismiss, reject, revert    Arbiter
//   execute                    Slasher
//   set_penalty                Admin
//
// Freeze bookkeeping: the controller counts open proposals per subject. The
// first open proposal freezes the pool; the pool is unfrozen only when the
// last one closes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vigil_core::auth::{AuthContext, Capability};
use vigil_core::error::VigilError;
use vigil_core::identity::Account;
use vigil_core::subject::Subject;

use crate::events::SlashingEvent;
use crate::proposal::{validate_evidence, Evidence, ProposalState, SlashProposal};
use crate::slashing::{compute_slash_value, ReasonCode, SlashPenalty, SlashingParams};
use crate::staking::StakeLedger;
use crate::token::Amount;
use crate::treasury::SlashSplit;

/// Persisted controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub params: SlashingParams,
    pub next_id: u64,
    pub proposals: Vec<SlashProposal>,
}

/// Owns slash proposals and drives them through review.
#[derive(Debug, Clone)]
pub struct SlashingController {
    params: SlashingParams,
    proposals: BTreeMap<u64, SlashProposal>,
    next_id: u64,
    open_by_subject: BTreeMap<Subject, u32>,
    escrow: Account,
    machine: AuthContext,
}

impl SlashingController {
    /// Create a controller with no proposals.
    pub fn new(params: SlashingParams) -> Result<Self, VigilError> {
        Self::from_state(ControllerState {
            params,
            next_id: 1,
            proposals: Vec::new(),
        })
    }

    /// Rebuild a controller from persisted state, recounting open proposals.
    pub fn from_state(state: ControllerState) -> Result<Self, VigilError> {
        state.params.validate()?;
        let escrow = Account::slashing_escrow();
        let mut open_by_subject = BTreeMap::new();
        let mut proposals = BTreeMap::new();
        for proposal in state.proposals {
            if proposal.id >= state.next_id {
                return Err(VigilError::InvariantViolation(format!(
                    "proposal id {} not below next id {}",
                    proposal.id, state.next_id
                )));
            }
            if proposal.is_open() {
                *open_by_subject.entry(proposal.subject).or_insert(0) += 1;
            }
            proposals.insert(proposal.id, proposal);
        }
        Ok(Self {
            params: state.params,
            proposals,
            next_id: state.next_id,
            open_by_subject,
            escrow,
            machine: AuthContext::new(escrow).with(Capability::Slasher),
        })
    }

    /// Snapshot of the persisted state.
    pub fn to_state(&self) -> ControllerState {
        ControllerState {
            params: self.params.clone(),
            next_id: self.next_id,
            proposals: self.proposals.values().cloned().collect(),
        }
    }

    pub fn params(&self) -> &SlashingParams {
        &self.params
    }

    /// Account holding proposal bonds.
    pub fn escrow(&self) -> Account {
        self.escrow
    }

    pub fn proposal(&self, id: u64) -> Option<&SlashProposal> {
        self.proposals.get(&id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &SlashProposal> {
        self.proposals.values()
    }

    pub fn proposals_for<'a>(&'a self, subject: &'a Subject) -> impl Iterator<Item = &'a SlashProposal> + 'a {
        self.proposals.values().filter(move |p| &p.subject == subject)
    }

    /// State of a proposal; `Undefined` for an id never created.
    pub fn current_state(&self, id: u64) -> ProposalState {
        self.proposals
            .get(&id)
            .map(|p| p.state)
            .unwrap_or(ProposalState::Undefined)
    }

    /// Number of non-terminal proposals against a subject.
    pub fn open_proposals(&self, subject: &Subject) -> u32 {
        self.open_by_subject.get(subject).copied().unwrap_or(0)
    }

    /// Bond held in escrow across all proposals.
    pub fn escrowed_bonds(&self) -> Amount {
        self.proposals.values().map(|p| p.bond_amount).sum()
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    /// Bind a penalty to a reason code.
    pub fn set_penalty(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        reason: ReasonCode,
        penalty: SlashPenalty,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Admin)?;
        let penalty = SlashPenalty::new(penalty.mode, penalty.percent)?;
        self.params.penalties.insert(reason.clone(), penalty);
        tracing::info!("Slash penalty for {} set to {}% of {}", reason, penalty.percent, penalty.mode);
        ledger.record(SlashingEvent::SlashPenaltySet { reason, penalty });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Open a proposal to slash `subject` for `reason`.
    ///
    /// Pulls `bond` from the caller into escrow and freezes the pool.
    ///
    /// # Errors
    /// `UnknownSlashReason`, `SubjectInactiveOrNotFound`, `InvalidEvidence`,
    /// `BondTooSmall`, `InsufficientBalance`.
    pub fn propose_slash(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        subject: Subject,
        reason: ReasonCode,
        evidence: Vec<String>,
        bond: Amount,
        now: u64,
    ) -> Result<u64, VigilError> {
        self.params.penalty(&reason)?;
        if ledger.validator().stake_threshold(&subject).is_none() {
            return Err(VigilError::SubjectInactiveOrNotFound(subject.to_string()));
        }
        validate_evidence(&evidence, true)?;
        if bond < self.params.min_bond {
            return Err(VigilError::BondTooSmall {
                provided: bond,
                minimum: self.params.min_bond,
            });
        }
        let proposer = auth.caller;
        ledger.token().ensure_balance(&proposer, bond)?;

        let id = self.next_id;
        self.next_id += 1;
        let proposal = SlashProposal {
            id,
            proposer,
            subject,
            reason: reason.clone(),
            state: ProposalState::Created,
            bond_amount: bond,
            evidence: evidence
                .iter()
                .map(|content| Evidence {
                    submitter: proposer,
                    content: content.clone(),
                    submitted_at: now,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.proposals.insert(id, proposal);

        ledger.record(SlashingEvent::MachineCreated {
            proposal_id: id,
            subject,
        });
        ledger.record(SlashingEvent::SlashProposalCreated {
            proposal_id: id,
            proposer,
            subject,
            reason: reason.clone(),
            bond,
        });
        ledger.record(SlashingEvent::StateTransition {
            proposal_id: id,
            from: ProposalState::Undefined,
            to: ProposalState::Created,
        });
        ledger.record(SlashingEvent::EvidenceSubmitted {
            proposal_id: id,
            submitter: proposer,
            evidence,
        });
        tracing::info!(
            "Proposal {}: State transition: {} -> {} ({} against {}, bond {})",
            id,
            ProposalState::Undefined,
            ProposalState::Created,
            reason,
            subject,
            bond
        );

        self.open(ledger, &subject)?;
        ledger.token_mut().transfer(&proposer, &self.escrow, bond)?;
        Ok(id)
    }

    /// Created -> InReview. Refunds the bond to the proposer.
    pub fn mark_as_in_review_slash_proposal(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        now: u64,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Arbiter)?;
        self.check(id, ProposalState::InReview)?;
        self.apply(ledger, id, ProposalState::InReview, now)?;
        self.return_bond(ledger, id)
    }

    /// InReview -> Reviewed.
    pub fn mark_as_reviewed_slash_proposal(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        now: u64,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Arbiter)?;
        self.check(id, ProposalState::Reviewed)?;
        self.apply(ledger, id, ProposalState::Reviewed, now)?;
        Ok(())
    }

    /// Created -> Dismissed. Returns the bond and releases the freeze.
    pub fn dismiss_slash_proposal(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        now: u64,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Arbiter)?;
        self.check(id, ProposalState::Dismissed)?;
        let subject = self.apply(ledger, id, ProposalState::Dismissed, now)?;
        self.return_bond(ledger, id)?;
        self.close(ledger, &subject)
    }

    /// Created -> Rejected. The bond is forfeited to the treasury when
    /// `forfeit_bond_on_reject` is set, returned otherwise.
    pub fn reject_slash_proposal(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        now: u64,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Arbiter)?;
        self.check(id, ProposalState::Rejected)?;
        let subject = self.apply(ledger, id, ProposalState::Rejected, now)?;
        if self.params.forfeit_bond_on_reject {
            self.forfeit_bond(ledger, id)?;
        } else {
            self.return_bond(ledger, id)?;
        }
        self.close(ledger, &subject)
    }

    /// InReview | Reviewed -> Reverted. Releases the freeze.
    pub fn revert_slash_proposal(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        now: u64,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Arbiter)?;
        self.check(id, ProposalState::Reverted)?;
        let subject = self.apply(ledger, id, ProposalState::Reverted, now)?;
        self.return_bond(ledger, id)?;
        self.close(ledger, &subject)
    }

    /// Reviewed -> Executed. Slashes the pool by the penalty evaluated now,
    /// then releases the freeze.
    pub fn execute_slash_proposal(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        now: u64,
    ) -> Result<SlashSplit, VigilError> {
        auth.require(Capability::Slasher)?;
        let proposal = self.check(id, ProposalState::Executed)?.clone();
        let amount = self.get_slashed_stake_value(ledger, id)?;

        let split = ledger.slash(
            &self.machine,
            &proposal.subject,
            amount,
            proposal.proposer,
            &self.params.treasury,
        )?;
        self.apply(ledger, id, ProposalState::Executed, now)?;
        self.close(ledger, &proposal.subject)?;
        Ok(split)
    }

    // ------------------------------------------------------------------
    // Evidence and review
    // ------------------------------------------------------------------

    /// Attach evidence to an open proposal. Allowed for arbiters and for the
    /// proposal's own proposer.
    pub fn submit_evidence(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        evidence: Vec<String>,
        now: u64,
    ) -> Result<(), VigilError> {
        let proposal = self.proposals.get(&id).ok_or(VigilError::ProposalNotFound(id))?;
        if !auth.has(Capability::Arbiter) && auth.caller != proposal.proposer {
            return Err(VigilError::Unauthorized {
                capability: Capability::Arbiter,
            });
        }
        if proposal.state.is_terminal() {
            return Err(VigilError::InvalidEvidence(format!(
                "proposal {} is {}",
                id, proposal.state
            )));
        }
        validate_evidence(&evidence, true)?;
        self.append_evidence(ledger, id, auth.caller, evidence, now)
    }

    /// Adjust an in-review proposal's subject and/or reason.
    ///
    /// Retargeting moves the freeze from the old subject to the new one.
    pub fn review_slash_proposal_parameters(
        &mut self,
        ledger: &mut StakeLedger,
        auth: &AuthContext,
        id: u64,
        subject: Option<Subject>,
        reason: Option<ReasonCode>,
        evidence: Vec<String>,
        now: u64,
    ) -> Result<(), VigilError> {
        auth.require(Capability::Arbiter)?;
        let proposal = self.proposals.get(&id).ok_or(VigilError::ProposalNotFound(id))?;
        if proposal.state != ProposalState::InReview {
            return Err(VigilError::InvalidTransition {
                from: proposal.state.to_string(),
                to: ProposalState::InReview.to_string(),
            });
        }
        let old_subject = proposal.subject;
        let new_subject = subject.unwrap_or(old_subject);
        let new_reason = reason.unwrap_or_else(|| proposal.reason.clone());
        self.params.penalty(&new_reason)?;
        if ledger.validator().stake_threshold(&new_subject).is_none() {
            return Err(VigilError::SubjectInactiveOrNotFound(new_subject.to_string()));
        }
        validate_evidence(&evidence, true)?;

        if let Some(p) = self.proposals.get_mut(&id) {
            p.subject = new_subject;
            p.reason = new_reason.clone();
            p.updated_at = now;
        }
        if new_subject != old_subject {
            self.open(ledger, &new_subject)?;
            self.close(ledger, &old_subject)?;
        }
        ledger.record(SlashingEvent::SlashProposalUpdated {
            proposal_id: id,
            subject: new_subject,
            reason: new_reason.clone(),
        });
        tracing::info!("Proposal {} updated: {} for {}", id, new_subject, new_reason);
        self.append_evidence(ledger, id, auth.caller, evidence, now)
    }

    /// Slash amount the proposal would take if executed now.
    pub fn get_slashed_stake_value(&self, ledger: &StakeLedger, id: u64) -> Result<Amount, VigilError> {
        let proposal = self.proposals.get(&id).ok_or(VigilError::ProposalNotFound(id))?;
        let penalty = self.params.penalty(&proposal.reason)?;
        let threshold = ledger
            .validator()
            .stake_threshold(&proposal.subject)
            .ok_or_else(|| VigilError::SubjectInactiveOrNotFound(proposal.subject.to_string()))?;
        let total_active_stake = ledger
            .pool(&proposal.subject)
            .map(|p| p.total_active_stake)
            .unwrap_or(0);
        compute_slash_value(
            &penalty,
            &threshold,
            total_active_stake,
            self.params.max_slashable_stake_percent,
        )
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate `id`'s current state may move to `to`.
    fn check(&self, id: u64, to: ProposalState) -> Result<&SlashProposal, VigilError> {
        let proposal = self.proposals.get(&id).ok_or(VigilError::ProposalNotFound(id))?;
        proposal.state.check_transition(to)?;
        Ok(proposal)
    }

    /// Move a checked proposal to `to`. Returns its subject.
    fn apply(
        &mut self,
        ledger: &mut StakeLedger,
        id: u64,
        to: ProposalState,
        now: u64,
    ) -> Result<Subject, VigilError> {
        let proposal = self.proposals.get_mut(&id).ok_or(VigilError::ProposalNotFound(id))?;
        let from = proposal.state;
        proposal.state = to;
        proposal.updated_at = now;
        let subject = proposal.subject;

        ledger.record(SlashingEvent::StateTransition {
            proposal_id: id,
            from,
            to,
        });
        tracing::info!("Proposal {}: State transition: {} -> {}", id, from, to);
        Ok(subject)
    }

    fn append_evidence(
        &mut self,
        ledger: &mut StakeLedger,
        id: u64,
        submitter: Account,
        evidence: Vec<String>,
        now: u64,
    ) -> Result<(), VigilError> {
        let proposal = self.proposals.get_mut(&id).ok_or(VigilError::ProposalNotFound(id))?;
        proposal.evidence.extend(evidence.iter().map(|content| Evidence {
            submitter,
            content: content.clone(),
            submitted_at: now,
        }));
        proposal.updated_at = now;
        ledger.record(SlashingEvent::EvidenceSubmitted {
            proposal_id: id,
            submitter,
            evidence,
        });
        Ok(())
    }

    fn return_bond(&mut self, ledger: &mut StakeLedger, id: u64) -> Result<(), VigilError> {
        let proposal = self.proposals.get_mut(&id).ok_or(VigilError::ProposalNotFound(id))?;
        let amount = std::mem::take(&mut proposal.bond_amount);
        if amount == 0 {
            return Ok(());
        }
        let to = proposal.proposer;
        ledger.token_mut().transfer(&self.escrow, &to, amount)?;
        ledger.record(SlashingEvent::BondReturned {
            proposal_id: id,
            to,
            amount,
        });
        tracing::debug!("Proposal {}: bond {} returned to {}", id, amount, to);
        Ok(())
    }

    fn forfeit_bond(&mut self, ledger: &mut StakeLedger, id: u64) -> Result<(), VigilError> {
        let proposal = self.proposals.get_mut(&id).ok_or(VigilError::ProposalNotFound(id))?;
        let amount = std::mem::take(&mut proposal.bond_amount);
        if amount == 0 {
            return Ok(());
        }
        let treasury = self.params.treasury.account;
        ledger.token_mut().transfer(&self.escrow, &treasury, amount)?;
        ledger.record(SlashingEvent::BondForfeited {
            proposal_id: id,
            amount,
        });
        tracing::info!("Proposal {}: bond {} forfeited to treasury", id, amount);
        Ok(())
    }

    /// Count a new open proposal against `subject`, freezing on the first.
    fn open(&mut self, ledger: &mut StakeLedger, subject: &Subject) -> Result<(), VigilError> {
        let count = self.open_by_subject.entry(*subject).or_insert(0);
        *count += 1;
        if *count == 1 {
            ledger.freeze(&self.machine, subject, true)?;
        }
        Ok(())
    }

    /// Release one open proposal against `subject`, unfreezing on the last.
    fn close(&mut self, ledger: &mut StakeLedger, subject: &Subject) -> Result<(), VigilError> {
        let remaining = match self.open_by_subject.get_mut(subject) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.open_by_subject.remove(subject);
            ledger.freeze(&self.machine, subject, false)?;
        }
        Ok(())
    }
}
