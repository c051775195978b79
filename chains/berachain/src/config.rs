use crate::pipeline::PipelineConfig;
use crate::registry::{ContractRegistry, Token, Vault};
use crate::workflow::{ApprovalPolicy, FarmSettings};
use anyhow::{Context, Result};
use config::{Config, File};
use core_logic::{ChainConfig, ConfigError, GasConfig, GasConfigToml, RunnerConfig, WalletSource};
use ethers::types::{Address, U256};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://rpc.berachain.com";
pub const BERACHAIN_CHAIN_ID: u64 = 80094;

/// `[chain]` table. Omitted keys fall back to Berachain mainnet.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChainSection {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: Option<u64>,
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            name: "berachain".to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: Some(BERACHAIN_CHAIN_ID),
        }
    }
}

impl From<&ChainSection> for ChainConfig {
    fn from(section: &ChainSection) -> Self {
        ChainConfig {
            name: section.name.clone(),
            rpc_url: section.rpc_url.clone(),
            chain_id: section.chain_id,
        }
    }
}

/// Token and vault tables have no per-key defaults: `name` and `address`
/// are required wherever an entry is written out.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TokenEntry {
    pub name: String,
    pub address: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct VaultEntry {
    pub name: String,
    pub address: String,
}

fn default_decimals() -> u32 {
    18
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FarmConfig {
    pub chain: ChainSection,
    pub wallet: WalletSource,
    pub gas: GasConfigToml,
    /// Dust threshold in whole reward-token units, as a decimal string.
    pub min_amount: String,
    pub approval_policy: ApprovalPolicy,
    pub confirmation_timeout_secs: u64,
    pub receipt_poll_ms: u64,
    pub request_timeout_secs: u64,
    pub interval_secs: u64,
    pub jitter_secs: u64,
    pub reward_token: TokenEntry,
    pub staking_vault: VaultEntry,
    pub vaults: Vec<VaultEntry>,
    pub tokens: Vec<TokenEntry>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        let vault = |name: &str, address: &str| VaultEntry {
            name: name.to_string(),
            address: address.to_string(),
        };
        let token = |name: &str, address: &str, decimals: u32| TokenEntry {
            name: name.to_string(),
            address: address.to_string(),
            decimals,
        };

        Self {
            chain: ChainSection::default(),
            wallet: WalletSource::default(),
            gas: GasConfigToml::default(),
            min_amount: "0.0001".to_string(),
            approval_policy: ApprovalPolicy::Optimistic,
            confirmation_timeout_secs: 120,
            receipt_poll_ms: 2_000,
            request_timeout_secs: 30,
            interval_secs: 3_600,
            jitter_secs: 0,
            reward_token: token("iBGT", "0xac03CABA51e17c86c921E1f6CBFBdC91F8BB2E6b", 18),
            staking_vault: vault("iBGT", "0x75F3Be06b02E235f6d0E7EF2D462b29739168301"),
            vaults: vec![
                vault("WBTC_WBERA", "0x78beda3a06443f51718d746aDe95b5fAc094633E"),
                vault("WETH_WBERA", "0x0dF14916796854d899576CBde69a35bAFb923c22"),
                vault("HONEY_WBERA", "0xe2d8941dfb85435419D90397b09D18024ebeef2C"),
                vault("iBGT", "0x75F3Be06b02E235f6d0E7EF2D462b29739168301"),
            ],
            tokens: vec![
                token("WBTC", "0x0555E30da8f98308EdB960aa94C0Db47230d2B9c", 8),
                token("WETH", "0x2F6F07CDcf3588944Bf4C42aC74ff24bF56e7590", 18),
                token("HONEY", "0xFCBD14DC51f0A4d49d5E53C2E0950e0bC26d0Dce", 18),
                token("WBERA", "0x6969696969696969696969696969696969696969", 18),
                token("BGT", "0x656b95E550C07a9ffe548bd4085c72418Ceb1dba", 18),
            ],
        }
    }
}

impl FarmConfig {
    /// Loads `path` if it exists, falling back to built-in defaults.
    /// `RPC_URL` in the environment overrides the file.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        let mut config: FarmConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config {}", path))?;

        if let Ok(url) = std::env::var("RPC_URL") {
            if !url.trim().is_empty() {
                config.chain.rpc_url = url;
            }
        }

        Ok(config)
    }

    /// Rejects configurations the farmer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.chain.rpc_url.starts_with("http://") && !self.chain.rpc_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidRpcUrl {
                url: self.chain.rpc_url.clone(),
            });
        }
        if self.vaults.is_empty() {
            return Err(ConfigError::MissingField {
                field: "vaults".to_string(),
            });
        }

        let gas = self.gas_config()?;
        if gas.ceiling().wei() == 0 {
            return Err(invalid("gas.max_gwei", "must be a positive number"));
        }
        for (field, limit) in [
            ("gas.limit_harvest", gas.limit_harvest()),
            ("gas.limit_approve", gas.limit_approve()),
            ("gas.limit_stake", gas.limit_stake()),
        ] {
            if limit == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        if self.confirmation_timeout_secs == 0 {
            return Err(invalid("confirmation_timeout_secs", "must be greater than zero"));
        }
        if self.receipt_poll_ms == 0 {
            return Err(invalid("receipt_poll_ms", "must be greater than zero"));
        }

        self.registry()?;
        self.dust_threshold()?;
        Ok(())
    }

    pub fn gas_config(&self) -> Result<GasConfig, ConfigError> {
        GasConfig::try_from(self.gas.clone())
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig::from(&self.chain)
    }

    pub fn registry(&self) -> Result<ContractRegistry, ConfigError> {
        let vaults = self
            .vaults
            .iter()
            .enumerate()
            .map(|(i, v)| parse_vault(&format!("vaults[{}]", i), v))
            .collect::<Result<Vec<_>, _>>()?;

        let tokens = self
            .tokens
            .iter()
            .enumerate()
            .map(|(i, t)| parse_token(&format!("tokens[{}]", i), t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ContractRegistry {
            vaults,
            reward_token: parse_token("reward_token", &self.reward_token)?,
            staking_vault: parse_vault("staking_vault", &self.staking_vault)?,
            tokens,
        })
    }

    /// `min_amount` in reward-token base units.
    pub fn dust_threshold(&self) -> Result<U256, ConfigError> {
        ethers::utils::parse_units(self.min_amount.trim(), self.reward_token.decimals)
            .map(Into::into)
            .map_err(|e| invalid("min_amount", &e.to_string()))
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.receipt_poll_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn farm_settings(&self) -> Result<FarmSettings, ConfigError> {
        Ok(FarmSettings {
            gas: self.gas_config()?,
            dust_threshold: self.dust_threshold()?,
            approval_policy: self.approval_policy,
        })
    }

    /// Scheduler settings; `once` and `interval_override` come from the CLI.
    pub fn runner_config(&self, once: bool, interval_override: Option<u64>) -> RunnerConfig {
        RunnerConfig {
            interval: Duration::from_secs(interval_override.unwrap_or(self.interval_secs)),
            max_jitter: Duration::from_secs(self.jitter_secs),
            max_runs: once.then_some(1),
        }
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| ConfigError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn parse_vault(field: &str, entry: &VaultEntry) -> Result<Vault, ConfigError> {
    Ok(Vault {
        name: entry.name.clone(),
        address: parse_address(field, &entry.address)?,
    })
}

fn parse_token(field: &str, entry: &TokenEntry) -> Result<Token, ConfigError> {
    if entry.decimals > 77 {
        return Err(invalid(field, "decimals must fit in a uint256"));
    }
    Ok(Token {
        name: entry.name.clone(),
        address: parse_address(field, &entry.address)?,
        decimals: entry.decimals,
    })
}
