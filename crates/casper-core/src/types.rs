use crate::domain::{Address, Hash, Quorum};
use crate::error::{CasperError, CasperResult};
use serde::{Deserialize, Serialize};

/// One token unit at 18 decimals
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator for reward shares
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Token identity carried by the ledger adapter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "CasperToken".to_string(),
            symbol: "CPT".to_string(),
            decimals: 18,
        }
    }
}

/// Validator active from dynasty 0
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub address: Address,
    pub stake: u128,
}

/// Casper configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CasperConfig {
    pub token: TokenMetadata,
    /// Deposits must be strictly above this amount
    pub min_deposit: u128,
    /// Blocks per epoch (checkpoint interval)
    pub epoch_length: u64,
    /// Dynasties between a withdrawal request and the release of stake
    pub withdrawal_delay: u64,
    /// Stake fraction required for justification
    pub quorum: Quorum,
    /// Challenger share of confiscated stake (basis points, 400 = 4%)
    pub slashing_reward_bps: u32,
    /// Block hash of the genesis checkpoint
    pub genesis_hash: Hash,
    pub genesis_validators: Vec<GenesisValidator>,
    /// Buffered events per subscriber
    pub event_channel_capacity: usize,
}

impl Default for CasperConfig {
    fn default() -> Self {
        Self {
            token: TokenMetadata::default(),
            min_deposit: 10 * TOKEN_UNIT,
            epoch_length: 10_368_000,
            withdrawal_delay: 540,
            quorum: Quorum::TWO_THIRDS,
            slashing_reward_bps: 400,
            genesis_hash: [0u8; 32],
            genesis_validators: Vec::new(),
            event_channel_capacity: 1024,
        }
    }
}

impl CasperConfig {
    /// Defaults overridden by `CASPER_*` environment variables.
    pub fn from_env() -> CasperResult<Self> {
        let mut config = Self::default();
        if let Some(v) = env_var("CASPER_MIN_DEPOSIT")? {
            config.min_deposit = v;
        }
        if let Some(v) = env_var("CASPER_EPOCH_LENGTH")? {
            config.epoch_length = v;
        }
        if let Some(v) = env_var("CASPER_WITHDRAWAL_DELAY")? {
            config.withdrawal_delay = v;
        }
        if let Some(v) = env_var("CASPER_SLASHING_REWARD_BPS")? {
            config.slashing_reward_bps = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CasperResult<()> {
        if self.epoch_length == 0 {
            return Err(invalid("epoch_length must be positive"));
        }
        let Quorum {
            numerator,
            denominator,
        } = self.quorum;
        if numerator == 0 || denominator == 0 || numerator > denominator {
            return Err(invalid("quorum must be a fraction in (0, 1]"));
        }
        if u128::from(self.slashing_reward_bps) > BPS_DENOMINATOR {
            return Err(invalid("slashing_reward_bps exceeds 10000"));
        }
        if self.event_channel_capacity == 0 {
            return Err(invalid("event_channel_capacity must be positive"));
        }
        for (i, v) in self.genesis_validators.iter().enumerate() {
            if v.stake == 0 {
                return Err(invalid("genesis validator with zero stake"));
            }
            if self.genesis_validators[..i]
                .iter()
                .any(|other| other.address == v.address)
            {
                return Err(invalid("duplicate genesis validator"));
            }
        }
        Ok(())
    }

    /// Challenger share of a confiscated amount
    pub fn challenger_reward(&self, confiscated: u128) -> u128 {
        confiscated / BPS_DENOMINATOR * u128::from(self.slashing_reward_bps)
            + confiscated % BPS_DENOMINATOR * u128::from(self.slashing_reward_bps)
                / BPS_DENOMINATOR
    }
}

fn invalid(reason: &str) -> CasperError {
    CasperError::InvalidConfig {
        reason: reason.to_string(),
    }
}

fn env_var<T: std::str::FromStr>(key: &str) -> CasperResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(&format!("{key} is not a valid number"))),
        Err(_) => Ok(None),
    }
}
