// crates/vigil-cli/src/commands/reward.rs
//
// `vigil reward {distribute, claim, available}`: reward commands.

use clap::Subcommand;

use vigil_core::Subject;
use vigil_economics::{format_vgl, parse_vgl, Amount};

use crate::config::resolve_account;
use crate::output::print_result;
use crate::session::Session;

/// Reward subcommands.
#[derive(Debug, Subcommand)]
pub enum RewardCmd {
    /// Pay tokens to a pool's active shareholders, pro rata.
    Distribute {
        #[arg(long)]
        subject: Subject,
        #[arg(long, value_parser = parse_vgl)]
        amount: Amount,
    },
    /// Release the caller's accrued rewards.
    Claim {
        #[arg(long)]
        subject: Subject,
    },
    /// Show rewards available to an account.
    Available {
        #[arg(long)]
        subject: Subject,
        /// Account to inspect; defaults to the caller.
        #[arg(long)]
        account: Option<String>,
    },
}

/// Run the reward subcommand.
pub async fn run(cmd: &RewardCmd, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let caller = session.caller();
    let format = session.format;
    match cmd {
        RewardCmd::Distribute { subject, amount } => {
            session.engine.reward(subject, *amount, caller)?;
            print_result(
                format,
                &format!("Distributed {} to holders of {}", format_vgl(*amount), subject),
                &serde_json::json!({ "subject": subject, "amount": amount.to_string() }),
            );
        }
        RewardCmd::Claim { subject } => {
            let amount = session.engine.release_reward(subject, caller)?;
            print_result(
                format,
                &format!("Released {} from {}", format_vgl(amount), subject),
                &serde_json::json!({ "subject": subject, "amount": amount.to_string() }),
            );
        }
        RewardCmd::Available { subject, account } => {
            let account = account.as_deref().map(resolve_account).unwrap_or(caller);
            let amount = session.engine.ledger().available_reward(subject, &account)?;
            print_result(
                format,
                &format!("{} can release {} from {}", account.short(), format_vgl(amount), subject),
                &serde_json::json!({ "subject": subject, "account": account, "amount": amount.to_string() }),
            );
        }
    }

    Ok(())
}
