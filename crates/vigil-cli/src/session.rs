// crates/vigil-cli/src/session.rs
//
// One CLI invocation: open the store, load (or create) the engine, run a
// command as the calling account, persist.

use std::path::Path;
use std::sync::Arc;

use vigil_core::{Account, AuthContext, StakeSubjectValidator};
use vigil_economics::{StakingEngine, SystemClock};
use vigil_store::RocksStore;

use crate::config::VigilConfig;
use crate::output::OutputFormat;

pub struct Session {
    pub engine: StakingEngine,
    pub auth: AuthContext,
    pub format: OutputFormat,
    store: RocksStore,
}

impl Session {
    /// Open the ledger under `data_dir`. A fresh ledger takes its withdrawal
    /// delay and slashing parameters from `config`; an existing one keeps
    /// what its snapshot holds.
    pub async fn open(
        config: &VigilConfig,
        data_dir: &Path,
        caller: Account,
        format: OutputFormat,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("ledger");
        let store = RocksStore::open(&db_path.to_string_lossy())?;

        let registry: Arc<dyn StakeSubjectValidator> = Arc::new(config.registry()?);
        let clock = Arc::new(SystemClock);
        let engine = match StakingEngine::load(&store, registry.clone(), clock.clone()).await? {
            Some(engine) => {
                tracing::debug!("Loaded ledger from {}", db_path.display());
                engine
            }
            None => {
                tracing::info!("Creating new ledger at {}", db_path.display());
                StakingEngine::new(
                    registry,
                    config.ledger.withdrawal_delay,
                    config.slashing_params()?,
                    clock,
                )?
            }
        };

        Ok(Self {
            engine,
            auth: config.auth_for(caller),
            format,
            store,
        })
    }

    pub fn caller(&self) -> Account {
        self.auth.caller
    }

    /// Persist the engine. Returns the last journal sequence number.
    pub async fn commit(mut self) -> Result<u64, Box<dyn std::error::Error>> {
        let seq = self.engine.persist(&self.store).await?;
        Ok(seq)
    }

    pub fn store(&self) -> &RocksStore {
        &self.store
    }
}
