// crates/vigil-cli/src/commands/account.rs
//
// `vigil mint` and `vigil balance`: token balances.

use clap::Args;

use vigil_core::Capability;
use vigil_economics::{format_vgl, parse_vgl, Amount};

use crate::config::resolve_account;
use crate::output::print_result;
use crate::session::Session;

#[derive(Debug, Args)]
pub struct MintCmd {
    /// Recipient address or label.
    pub to: String,
    #[arg(value_parser = parse_vgl)]
    pub amount: Amount,
}

#[derive(Debug, Args)]
pub struct BalanceCmd {
    /// Account to inspect; defaults to the caller.
    pub account: Option<String>,
}

/// Create tokens out of thin air. Admin only.
pub async fn mint(cmd: &MintCmd, session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    session.auth.require(Capability::Admin)?;
    let to = resolve_account(&cmd.to);
    session.engine.mint(to, cmd.amount)?;
    print_result(
        session.format,
        &format!("Minted {} to {}", format_vgl(cmd.amount), to.short()),
        &serde_json::json!({ "to": to, "amount": cmd.amount.to_string() }),
    );
    Ok(())
}

pub async fn balance(cmd: &BalanceCmd, session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let account = cmd.account.as_deref().map(resolve_account).unwrap_or(session.caller());
    let amount = session.engine.balance_of(&account);
    print_result(
        session.format,
        &format!("{}: {}", account, format_vgl(amount)),
        &serde_json::json!({ "account": account, "balance": amount.to_string() }),
    );
    Ok(())
}
