// crates/vigil-cli/src/main.rs
//
// CLI entrypoint for the Vigil staking ledger.
//
// Each invocation opens the RocksDB-backed ledger under the data directory,
// runs one command as the `--as` account, and persists the resulting
// snapshot and events.

mod commands;
mod config;
mod output;
mod session;

use clap::{Parser, Subcommand};
use commands::account::{BalanceCmd, MintCmd};
use commands::admin::AdminCmd;
use commands::events::EventsCmd;
use commands::pool::PoolCmd;
use commands::proposal::ProposalCmd;
use commands::reward::RewardCmd;
use commands::stake::StakeCmd;
use config::{resolve_account, VigilConfig};
use output::OutputFormat;
use session::Session;

/// Vigil: share-based staking ledger with bonded slash proposals.
#[derive(Parser, Debug)]
#[command(name = "vigil", version = "0.1.0", about = "Vigil staking ledger CLI")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "vigil.toml")]
    config: String,

    /// Override the configured data directory.
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Account to act as (32-byte hex address or label).
    #[arg(long = "as", global = true, default_value = "admin")]
    caller: String,

    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Mint tokens to an account (Admin).
    Mint(MintCmd),

    /// Show an account's token balance.
    Balance(BalanceCmd),

    /// Staking: deposit, unstake, withdraw, transfer, info.
    #[command(subcommand)]
    Stake(StakeCmd),

    /// Rewards: distribute, claim, available.
    #[command(subcommand)]
    Reward(RewardCmd),

    /// List stake pools.
    Pool(PoolCmd),

    /// Privileged ledger operations.
    #[command(subcommand)]
    Admin(AdminCmd),

    /// Slash proposals.
    #[command(subcommand)]
    Proposal(ProposalCmd),

    /// Read the event journal.
    Events(EventsCmd),
}

impl Commands {
    /// Whether the command can change ledger state.
    fn mutates(&self) -> bool {
        match self {
            Commands::Balance(_) | Commands::Pool(_) | Commands::Events(_) => false,
            Commands::Stake(StakeCmd::Info { .. }) => false,
            Commands::Reward(RewardCmd::Available { .. }) => false,
            Commands::Proposal(ProposalCmd::Show { .. } | ProposalCmd::List { .. }) => false,
            _ => true,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logging is set up first so the fallback can be reported.
    let loaded = VigilConfig::load(&cli.config);
    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "warn".to_string());

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            tracing::debug!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!("Could not load config from {}: {}. Using defaults.", cli.config, e);
            VigilConfig::default()
        }
    };

    let data_dir = match &cli.data_dir {
        Some(dir) => std::path::PathBuf::from(dir),
        None => config.data_dir_path(),
    };
    let caller = resolve_account(&cli.caller);
    let format = OutputFormat::from_json_flag(cli.json);
    let mut session = Session::open(&config, &data_dir, caller, format).await?;

    match &cli.command {
        Commands::Mint(cmd) => commands::account::mint(cmd, &mut session).await?,
        Commands::Balance(cmd) => commands::account::balance(cmd, &session).await?,
        Commands::Stake(cmd) => commands::stake::run(cmd, &mut session).await?,
        Commands::Reward(cmd) => commands::reward::run(cmd, &mut session).await?,
        Commands::Pool(cmd) => commands::pool::run(cmd, &session).await?,
        Commands::Admin(cmd) => commands::admin::run(cmd, &mut session).await?,
        Commands::Proposal(cmd) => commands::proposal::run(cmd, &mut session).await?,
        Commands::Events(cmd) => commands::events::run(cmd, &session).await?,
    }

    if cli.command.mutates() {
        let seq = session.commit().await?;
        tracing::debug!("Ledger persisted (journal at seq {})", seq);
    }

    Ok(())
}
