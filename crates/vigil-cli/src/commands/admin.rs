// crates/vigil-cli/src/commands/admin.rs
//
// `vigil admin {set-delay, freeze, slash, set-penalty}`: privileged ledger
// commands. Capabilities come from the `[roles]` config section.

use clap::Subcommand;

use vigil_core::Subject;
use vigil_economics::{format_vgl, parse_vgl, Amount, PenaltyMode, ReasonCode, SlashPenalty};

use crate::config::resolve_account;
use crate::output::print_result;
use crate::session::Session;

/// Admin subcommands.
#[derive(Debug, Subcommand)]
pub enum AdminCmd {
    /// Set the withdrawal delay in seconds (Admin).
    SetDelay {
        #[arg(long)]
        seconds: u64,
    },
    /// Freeze or unfreeze a pool (Slasher).
    Freeze {
        #[arg(long)]
        subject: Subject,
        /// Unfreeze instead.
        #[arg(long)]
        off: bool,
    },
    /// Slash a frozen pool directly (Slasher).
    Slash {
        #[arg(long)]
        subject: Subject,
        #[arg(long, value_parser = parse_vgl)]
        amount: Amount,
        /// Account receiving the proposer share.
        #[arg(long)]
        proposer: String,
    },
    /// Bind a reason code to a penalty (Admin).
    SetPenalty {
        #[arg(long)]
        reason: String,
        /// `min_stake`, `max_stake` or `current_stake`.
        #[arg(long)]
        mode: PenaltyMode,
        #[arg(long)]
        percent: u8,
    },
}

/// Run the admin subcommand.
pub async fn run(cmd: &AdminCmd, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let auth = session.auth.clone();
    let format = session.format;
    match cmd {
        AdminCmd::SetDelay { seconds } => {
            session.engine.set_delay(&auth, *seconds)?;
            print_result(
                format,
                &format!("Withdrawal delay set to {}s", seconds),
                &serde_json::json!({ "delay": seconds }),
            );
        }
        AdminCmd::Freeze { subject, off } => {
            let frozen = !off;
            session.engine.freeze(&auth, subject, frozen)?;
            print_result(
                format,
                &format!("{} {}", subject, if frozen { "frozen" } else { "unfrozen" }),
                &serde_json::json!({ "subject": subject, "frozen": frozen }),
            );
        }
        AdminCmd::Slash {
            subject,
            amount,
            proposer,
        } => {
            let proposer = resolve_account(proposer);
            let split = session.engine.slash(&auth, subject, *amount, proposer)?;
            print_result(
                format,
                &format!(
                    "Slashed {} from {} ({} to proposer, {} to treasury)",
                    format_vgl(split.total()),
                    subject,
                    format_vgl(split.proposer),
                    format_vgl(split.treasury)
                ),
                &serde_json::json!({
                    "subject": subject,
                    "proposer_share": split.proposer.to_string(),
                    "treasury_share": split.treasury.to_string(),
                }),
            );
        }
        AdminCmd::SetPenalty { reason, mode, percent } => {
            let reason = ReasonCode::new(reason);
            let penalty = SlashPenalty::new(*mode, *percent)?;
            session.engine.set_penalty(&auth, reason.clone(), penalty)?;
            print_result(
                format,
                &format!("Penalty for {} set to {}% of {}", reason, percent, mode),
                &serde_json::json!({ "reason": reason, "penalty": penalty }),
            );
        }
    }

    Ok(())
}
