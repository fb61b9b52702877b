// crates/vigil-cli/src/commands/stake.rs
//
// `vigil stake {deposit, unstake, withdraw, transfer, info}`: staking commands
// run as the calling account.

use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

use vigil_core::{ShareKind, Subject};
use vigil_economics::{format_vgl, parse_vgl, Amount, Shares};

use crate::config::resolve_account;
use crate::output::{print_result, print_rows};
use crate::session::Session;

/// Staking subcommands.
#[derive(Debug, Subcommand)]
pub enum StakeCmd {
    /// Deposit tokens into a subject's pool for active shares.
    Deposit {
        /// Subject as `<type>:<id>`, e.g. `scanner:0xabc`.
        #[arg(long)]
        subject: Subject,
        /// Amount in base units, or with a `vgl` suffix.
        #[arg(long, value_parser = parse_vgl)]
        amount: Amount,
    },
    /// Convert active shares to inactive and start the withdrawal delay.
    Unstake {
        #[arg(long)]
        subject: Subject,
        #[arg(long)]
        shares: Shares,
    },
    /// Burn matured inactive shares and receive their value.
    Withdraw {
        #[arg(long)]
        subject: Subject,
    },
    /// Move shares to another account.
    Transfer {
        #[arg(long)]
        subject: Subject,
        /// Recipient address or label.
        #[arg(long)]
        to: String,
        #[arg(long)]
        shares: Shares,
        /// `active` or `inactive`.
        #[arg(long, default_value = "active")]
        kind: ShareKind,
    },
    /// Show holdings in a subject's pool.
    Info {
        #[arg(long)]
        subject: Subject,
        /// Account to inspect; defaults to every holder.
        #[arg(long)]
        account: Option<String>,
    },
}

#[derive(Debug, Tabled, Serialize)]
struct HolderRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Active shares")]
    active_shares: String,
    #[tabled(rename = "Active stake")]
    active_stake: String,
    #[tabled(rename = "Inactive shares")]
    inactive_shares: String,
    #[tabled(rename = "Inactive stake")]
    inactive_stake: String,
    #[tabled(rename = "Unlocks")]
    unlocks: String,
    #[tabled(rename = "Rewards")]
    rewards: String,
}

/// Run the stake subcommand.
pub async fn run(cmd: &StakeCmd, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let caller = session.caller();
    let format = session.format;
    match cmd {
        StakeCmd::Deposit { subject, amount } => {
            let shares = session.engine.deposit(subject, *amount, caller)?;
            print_result(
                format,
                &format!("Deposited {} into {} for {} shares", format_vgl(*amount), subject, shares),
                &serde_json::json!({ "subject": subject, "amount": amount.to_string(), "shares": shares.to_string() }),
            );
        }
        StakeCmd::Unstake { subject, shares } => {
            let unlock = session.engine.initiate_withdrawal(subject, *shares, caller)?;
            print_result(
                format,
                &format!("{} shares of {} unlock at {}", shares, subject, format_time(unlock)),
                &serde_json::json!({ "subject": subject, "shares": shares.to_string(), "unlock_time": unlock }),
            );
        }
        StakeCmd::Withdraw { subject } => {
            let amount = session.engine.withdraw(subject, caller)?;
            print_result(
                format,
                &format!("Withdrew {} from {}", format_vgl(amount), subject),
                &serde_json::json!({ "subject": subject, "amount": amount.to_string() }),
            );
        }
        StakeCmd::Transfer {
            subject,
            to,
            shares,
            kind,
        } => {
            let to = resolve_account(to);
            session.engine.transfer(subject, caller, to, *kind, *shares)?;
            print_result(
                format,
                &format!("Transferred {} {} shares of {} to {}", shares, kind, subject, to.short()),
                &serde_json::json!({ "subject": subject, "to": to, "kind": kind, "shares": shares.to_string() }),
            );
        }
        StakeCmd::Info { subject, account } => {
            let ledger = session.engine.ledger();
            let accounts = match account {
                Some(a) => vec![resolve_account(a)],
                None => ledger.holders_of(subject).map(|(a, _)| *a).collect(),
            };
            let mut rows = Vec::with_capacity(accounts.len());
            for account in accounts {
                let holder = ledger.holder(subject, &account).cloned().unwrap_or_default();
                rows.push(HolderRow {
                    account: account.short(),
                    active_shares: holder.active_shares.to_string(),
                    active_stake: format_vgl(ledger.active_stake_of(subject, &account)?),
                    inactive_shares: holder.inactive_shares.to_string(),
                    inactive_stake: format_vgl(ledger.inactive_stake_of(subject, &account)?),
                    unlocks: if holder.inactive_shares == 0 {
                        "-".to_string()
                    } else {
                        format_time(holder.pending_unlock)
                    },
                    rewards: format_vgl(ledger.available_reward(subject, &account)?),
                });
            }
            print_rows(format, &rows);
        }
    }

    Ok(())
}

/// Render a unix timestamp as RFC 3339.
pub fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| Utc.timestamp_opt(s, 0).single())
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}
