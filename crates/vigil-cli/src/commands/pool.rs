// crates/vigil-cli/src/commands/pool.rs
//
// `vigil pool`: list stake pools.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use vigil_core::Subject;
use vigil_economics::format_vgl;

use crate::output::print_rows;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct PoolCmd {
    /// Show one subject's pool only.
    #[arg(long)]
    pub subject: Option<Subject>,
}

#[derive(Debug, Tabled, Serialize)]
struct PoolRow {
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Stake")]
    stake: String,
    #[tabled(rename = "Active shares")]
    active_shares: String,
    #[tabled(rename = "Inactive shares")]
    inactive_shares: String,
    #[tabled(rename = "Reward reserve")]
    reward_reserve: String,
    #[tabled(rename = "Frozen")]
    frozen: bool,
    #[tabled(rename = "Over min")]
    over_min: bool,
}

/// Run the pool command.
pub async fn run(cmd: &PoolCmd, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = session.engine.ledger();
    let mut rows = Vec::new();
    for (subject, pool) in ledger.pools() {
        if cmd.subject.is_some_and(|s| s != *subject) {
            continue;
        }
        rows.push(PoolRow {
            subject: subject.to_string(),
            stake: format_vgl(pool.total_active_stake),
            active_shares: pool.total_active_shares.to_string(),
            inactive_shares: pool.total_inactive_shares.to_string(),
            reward_reserve: format_vgl(pool.reward_reserve),
            frozen: pool.frozen,
            over_min: ledger.is_staked_over_min(subject)?,
        });
    }
    print_rows(session.format, &rows);
    Ok(())
}
