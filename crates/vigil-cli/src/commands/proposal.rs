// crates/vigil-cli/src/commands/proposal.rs
//
// `vigil proposal ...`: drive slash proposals through their lifecycle.
//
// Created -> InReview -> Reviewed -> Executed, with Dismissed/Rejected from
// Created and Reverted from InReview or Reviewed.

use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use vigil_core::Subject;
use vigil_economics::{format_vgl, parse_vgl, Amount, ReasonCode, SlashProposal, StakingEngine};

use crate::commands::stake::format_time;
use crate::output::{format_json, print_result, print_rows, OutputFormat};
use crate::session::Session;

/// Slash proposal subcommands.
#[derive(Debug, Subcommand)]
pub enum ProposalCmd {
    /// Open a slash proposal, posting a bond. Freezes the subject's pool.
    Propose {
        #[arg(long)]
        subject: Subject,
        #[arg(long)]
        reason: String,
        /// Evidence entry; repeat for several.
        #[arg(long = "evidence", required = true)]
        evidence: Vec<String>,
        #[arg(long, value_parser = parse_vgl)]
        bond: Amount,
    },
    /// Created -> InReview (Arbiter). Refunds the bond.
    InReview { id: u64 },
    /// InReview -> Reviewed (Arbiter).
    Reviewed { id: u64 },
    /// Created -> Dismissed (Arbiter). Returns the bond.
    Dismiss { id: u64 },
    /// Created -> Rejected (Arbiter). The bond may be forfeited.
    Reject { id: u64 },
    /// Reviewed -> Executed (Slasher). Slashes the pool.
    Execute { id: u64 },
    /// InReview/Reviewed -> Reverted (Arbiter).
    Revert { id: u64 },
    /// Attach evidence to an open proposal (Arbiter or proposer).
    Evidence {
        id: u64,
        #[arg(long = "text", required = true)]
        text: Vec<String>,
    },
    /// Change subject or reason while in review (Arbiter).
    Update {
        id: u64,
        #[arg(long)]
        subject: Option<Subject>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long = "evidence")]
        evidence: Vec<String>,
    },
    /// Show one proposal with its evidence and current slash value.
    Show { id: u64 },
    /// List proposals.
    List {
        #[arg(long)]
        subject: Option<Subject>,
    },
}

#[derive(Debug, Tabled, Serialize)]
struct ProposalRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Proposer")]
    proposer: String,
    #[tabled(rename = "Bond")]
    bond: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&SlashProposal> for ProposalRow {
    fn from(p: &SlashProposal) -> Self {
        Self {
            id: p.id,
            state: p.state.to_string(),
            subject: p.subject.to_string(),
            reason: p.reason.to_string(),
            proposer: p.proposer.short(),
            bond: format_vgl(p.bond_amount),
            updated: format_time(p.updated_at),
        }
    }
}

/// JSON view for `show`. Serialized directly so u128 amounts survive.
#[derive(Serialize)]
struct ProposalView<'a> {
    proposal: &'a SlashProposal,
    slash_value: Option<String>,
}

/// Run the proposal subcommand.
pub async fn run(cmd: &ProposalCmd, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let auth = session.auth.clone();
    let format = session.format;
    let engine = &mut session.engine;

    let transitioned = match cmd {
        ProposalCmd::Propose {
            subject,
            reason,
            evidence,
            bond,
        } => {
            let id = engine.propose_slash(&auth, *subject, ReasonCode::new(reason), evidence.clone(), *bond)?;
            Some(id)
        }
        ProposalCmd::InReview { id } => {
            engine.mark_as_in_review_slash_proposal(&auth, *id)?;
            Some(*id)
        }
        ProposalCmd::Reviewed { id } => {
            engine.mark_as_reviewed_slash_proposal(&auth, *id)?;
            Some(*id)
        }
        ProposalCmd::Dismiss { id } => {
            engine.dismiss_slash_proposal(&auth, *id)?;
            Some(*id)
        }
        ProposalCmd::Reject { id } => {
            engine.reject_slash_proposal(&auth, *id)?;
            Some(*id)
        }
        ProposalCmd::Execute { id } => {
            let split = engine.execute_slash_proposal(&auth, *id)?;
            tracing::info!(
                "Proposal {} executed: {} slashed",
                id,
                format_vgl(split.total())
            );
            Some(*id)
        }
        ProposalCmd::Revert { id } => {
            engine.revert_slash_proposal(&auth, *id)?;
            Some(*id)
        }
        ProposalCmd::Evidence { id, text } => {
            engine.submit_evidence(&auth, *id, text.clone())?;
            Some(*id)
        }
        ProposalCmd::Update {
            id,
            subject,
            reason,
            evidence,
        } => {
            let reason = reason.as_deref().map(ReasonCode::new);
            engine.review_slash_proposal_parameters(&auth, *id, *subject, reason, evidence.clone())?;
            Some(*id)
        }
        ProposalCmd::Show { id } => {
            show(engine, format, *id)?;
            None
        }
        ProposalCmd::List { subject } => {
            let rows: Vec<ProposalRow> = engine
                .controller()
                .proposals()
                .filter(|p| subject.map_or(true, |s| p.subject == s))
                .map(ProposalRow::from)
                .collect();
            print_rows(format, &rows);
            None
        }
    };

    if let Some(id) = transitioned {
        if let Some(proposal) = session.engine.controller().proposal(id) {
            print_result(
                format,
                &format!("Proposal {}: {}", id, proposal.state),
                &ProposalRow::from(proposal),
            );
        }
    }

    Ok(())
}

fn show(engine: &StakingEngine, format: OutputFormat, id: u64) -> Result<(), Box<dyn std::error::Error>> {
    let proposal = engine
        .controller()
        .proposal(id)
        .ok_or(vigil_core::VigilError::ProposalNotFound(id))?;
    let value = if proposal.is_open() {
        Some(engine.get_slashed_stake_value(id)?)
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let view = ProposalView {
                proposal,
                slash_value: value.map(|v| v.to_string()),
            };
            println!("{}", format_json(&view));
        }
        OutputFormat::Table => {
            print_rows(format, &[ProposalRow::from(proposal)]);
            if let Some(value) = value {
                println!("Slash value if executed now: {}", format_vgl(value));
            }
            println!("Evidence:");
            for e in &proposal.evidence {
                println!("  [{}] {}: {}", format_time(e.submitted_at), e.submitter.short(), e.content);
            }
        }
    }
    Ok(())
}
