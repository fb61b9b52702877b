// crates/vigil-cli/src/config.rs
//
// Runtime configuration for the vigil CLI.
// Loaded from a TOML file or populated with sensible defaults.
//
// Amounts accept either an integer (base units) or a string understood by
// `parse_vgl`, e.g. `min_bond = "100vgl"`. Accounts accept a 32-byte hex
// address or a label, which is hashed into an address.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use vigil_core::{Account, AuthContext, Capability, StaticSubjectRegistry, Subject, SubjectId, SubjectType, VigilError};
use vigil_economics::slashing::DEFAULT_MAX_SLASHABLE_STAKE_PERCENT;
use vigil_economics::treasury::DEFAULT_PROPOSER_PERCENT;
use vigil_economics::{
    parse_vgl, Amount, PenaltyMode, ReasonCode, SlashPenalty, SlashingParams, Treasury, MIN_WITHDRAWAL_DELAY,
};

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct VigilConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub slashing: SlashingConfig,

    /// Static subject registry.
    #[serde(default)]
    pub subjects: Vec<SubjectConfig>,

    #[serde(default)]
    pub roles: RolesConfig,
}

/// `[ledger]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Withdrawal delay in seconds for a freshly created ledger.
    #[serde(default = "default_withdrawal_delay")]
    pub withdrawal_delay: u64,
}

/// `[slashing]` section. Only applied when a new ledger is created; an
/// existing ledger keeps the parameters stored in its snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashingConfig {
    #[serde(default = "default_treasury")]
    pub treasury: String,

    #[serde(default = "default_proposer_percent")]
    pub proposer_percent: u8,

    #[serde(default = "default_max_slashable_stake_percent")]
    pub max_slashable_stake_percent: u8,

    #[serde(default = "default_min_bond")]
    pub min_bond: AmountSetting,

    #[serde(default = "default_forfeit_bond_on_reject")]
    pub forfeit_bond_on_reject: bool,

    /// Reason code -> penalty.
    #[serde(default)]
    pub penalties: BTreeMap<String, PenaltyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PenaltyConfig {
    /// "min_stake", "max_stake" or "current_stake".
    pub mode: String,
    pub percent: u8,
}

/// One `[[subjects]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectConfig {
    pub subject_type: String,
    pub subject_id: String,
    #[serde(default = "default_zero_amount")]
    pub min_stake: AmountSetting,
    pub max_stake: AmountSetting,
    #[serde(default = "default_activated")]
    pub activated: bool,
}

/// `[roles]` section: accounts holding each capability.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub arbiters: Vec<String>,
    #[serde(default)]
    pub slashers: Vec<String>,
}

/// An amount written as base units or as a `parse_vgl` string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AmountSetting {
    Units(u64),
    Text(String),
}

impl AmountSetting {
    pub fn resolve(&self) -> Result<Amount, VigilError> {
        match self {
            AmountSetting::Units(units) => Ok(*units as Amount),
            AmountSetting::Text(text) => parse_vgl(text),
        }
    }
}

fn default_data_dir() -> String {
    "~/.vigil/data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_withdrawal_delay() -> u64 {
    MIN_WITHDRAWAL_DELAY
}

fn default_treasury() -> String {
    "treasury".to_string()
}

fn default_proposer_percent() -> u8 {
    DEFAULT_PROPOSER_PERCENT
}

fn default_max_slashable_stake_percent() -> u8 {
    DEFAULT_MAX_SLASHABLE_STAKE_PERCENT
}

fn default_min_bond() -> AmountSetting {
    AmountSetting::Units(0)
}

fn default_zero_amount() -> AmountSetting {
    AmountSetting::Units(0)
}

fn default_forfeit_bond_on_reject() -> bool {
    true
}

fn default_activated() -> bool {
    true
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            ledger: LedgerConfig::default(),
            slashing: SlashingConfig::default(),
            subjects: Vec::new(),
            roles: RolesConfig::default(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            withdrawal_delay: default_withdrawal_delay(),
        }
    }
}

impl Default for SlashingConfig {
    fn default() -> Self {
        Self {
            treasury: default_treasury(),
            proposer_percent: default_proposer_percent(),
            max_slashable_stake_percent: default_max_slashable_stake_percent(),
            min_bond: default_min_bond(),
            forfeit_bond_on_reject: default_forfeit_bond_on_reject(),
            penalties: BTreeMap::new(),
        }
    }
}

impl VigilConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: VigilConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// `data_dir` with a leading `~/` expanded to the home directory.
    pub fn data_dir_path(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }

    /// Build the subject registry from `[[subjects]]`.
    pub fn registry(&self) -> Result<StaticSubjectRegistry, VigilError> {
        let mut registry = StaticSubjectRegistry::new();
        for entry in &self.subjects {
            let subject_type: SubjectType = entry.subject_type.parse()?;
            let subject_id: SubjectId = entry.subject_id.parse()?;
            let min = entry.min_stake.resolve()?;
            let max = entry.max_stake.resolve()?;
            if min > max {
                return Err(VigilError::InvalidConfig(format!(
                    "subject {}:{} has min_stake {} above max_stake {}",
                    subject_type, subject_id, min, max
                )));
            }
            registry.register(Subject::with_id(subject_type, subject_id), min, max, entry.activated);
        }
        Ok(registry)
    }

    /// Build slashing parameters from `[slashing]`.
    pub fn slashing_params(&self) -> Result<SlashingParams, VigilError> {
        let s = &self.slashing;
        let mut penalties = BTreeMap::new();
        for (reason, penalty) in &s.penalties {
            let mode: PenaltyMode = penalty.mode.parse()?;
            penalties.insert(ReasonCode::new(reason), SlashPenalty::new(mode, penalty.percent)?);
        }
        let params = SlashingParams {
            treasury: Treasury::new(resolve_account(&s.treasury), s.proposer_percent)?,
            max_slashable_stake_percent: s.max_slashable_stake_percent,
            min_bond: s.min_bond.resolve()?,
            forfeit_bond_on_reject: s.forfeit_bond_on_reject,
            penalties,
        };
        params.validate()?;
        Ok(params)
    }

    /// Authorization context for `caller`, with every capability `[roles]`
    /// grants it.
    pub fn auth_for(&self, caller: Account) -> AuthContext {
        let mut auth = AuthContext::new(caller);
        let grants = [
            (&self.roles.admins, Capability::Admin),
            (&self.roles.arbiters, Capability::Arbiter),
            (&self.roles.slashers, Capability::Slasher),
        ];
        for (accounts, capability) in grants {
            if accounts.iter().any(|a| resolve_account(a) == caller) {
                auth = auth.with(capability);
            }
        }
        auth
    }
}

/// A 32-byte hex address, or else a label hashed into one.
pub fn resolve_account(value: &str) -> Account {
    value
        .parse::<Account>()
        .unwrap_or_else(|_| Account::from_label(value))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::StakeSubjectValidator;
    use vigil_economics::UNITS_PER_VGL;

    const SAMPLE: &str = r#"
data_dir = "/tmp/vigil"
log_level = "debug"

[ledger]
withdrawal_delay = 172800

[slashing]
treasury = "dao"
proposer_percent = 20
min_bond = "100vgl"
forfeit_bond_on_reject = false

[slashing.penalties.operational]
mode = "min_stake"
percent = 10

[slashing.penalties.misconduct]
mode = "current"
percent = 50

[[subjects]]
subject_type = "scanner"
subject_id = "0xabc"
min_stake = "500vgl"
max_stake = "10000vgl"

[[subjects]]
subject_type = "agent"
subject_id = "7"
max_stake = 1000
activated = false

[roles]
admins = ["admin"]
arbiters = ["arbiter", "admin"]
slashers = ["slasher"]
"#;

    fn sample() -> VigilConfig {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config: VigilConfig = toml::from_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.ledger.withdrawal_delay, MIN_WITHDRAWAL_DELAY);
        assert_eq!(config.slashing.proposer_percent, DEFAULT_PROPOSER_PERCENT);
        assert!(config.subjects.is_empty());

        let params = config.slashing_params().unwrap();
        assert_eq!(params, SlashingParams::default());
    }

    #[test]
    fn test_sample_parses() {
        let config = sample();
        assert_eq!(config.data_dir_path(), PathBuf::from("/tmp/vigil"));
        assert_eq!(config.ledger.withdrawal_delay, 172_800);

        let params = config.slashing_params().unwrap();
        assert_eq!(params.treasury.account, Account::from_label("dao"));
        assert_eq!(params.treasury.proposer_percent, 20);
        assert_eq!(params.min_bond, 100 * UNITS_PER_VGL);
        assert!(!params.forfeit_bond_on_reject);
        let penalty = params.penalty(&ReasonCode::new("misconduct")).unwrap();
        assert_eq!(penalty.mode, PenaltyMode::CurrentStake);
        assert_eq!(penalty.percent, 50);
    }

    #[test]
    fn test_registry_from_subjects() {
        let registry = sample().registry().unwrap();
        let scanner = Subject::new(SubjectType::Scanner, 0xabc);
        let threshold = registry.stake_threshold(&scanner).unwrap();
        assert_eq!(threshold.min, 500 * UNITS_PER_VGL);
        assert_eq!(threshold.max, 10_000 * UNITS_PER_VGL);
        assert!(threshold.activated);

        let agent = Subject::new(SubjectType::Agent, 7);
        let threshold = registry.stake_threshold(&agent).unwrap();
        assert_eq!((threshold.min, threshold.max), (0, 1_000));
        assert!(!threshold.activated);
    }

    #[test]
    fn test_registry_rejects_inverted_bounds() {
        let mut config = sample();
        config.subjects[0].min_stake = AmountSetting::Text("20000vgl".into());
        assert!(matches!(config.registry(), Err(VigilError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_penalty_mode_is_rejected() {
        let mut config = sample();
        config.slashing.penalties.insert(
            "spam".into(),
            PenaltyConfig {
                mode: "everything".into(),
                percent: 5,
            },
        );
        assert!(config.slashing_params().is_err());
    }

    #[test]
    fn test_roles_grant_capabilities() {
        let config = sample();
        let admin = config.auth_for(Account::from_label("admin"));
        assert!(admin.has(Capability::Admin));
        assert!(admin.has(Capability::Arbiter));
        assert!(!admin.has(Capability::Slasher));

        let nobody = config.auth_for(Account::from_label("nobody"));
        assert_eq!(nobody.capabilities().count(), 0);
    }

    #[test]
    fn test_resolve_account_hex_or_label() {
        let account = Account::from_label("alice");
        assert_eq!(resolve_account(&account.to_hex()), account);
        assert_eq!(resolve_account("alice"), account);
    }
}
