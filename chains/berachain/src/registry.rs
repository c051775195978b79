//! Static registry of the tokens and Infrared vaults the farmer touches.
//!
//! Built once from [`crate::config::FarmConfig`] at startup and never mutated.

use core_logic::ConfigError;
use ethers::types::{Address, U256};

/// Decimals of Infrared vault stake shares (LP receipt tokens).
pub const VAULT_SHARE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub address: Address,
    pub decimals: u32,
}

impl Token {
    /// One whole token expressed in base units (10^decimals).
    pub fn one_unit(&self) -> U256 {
        U256::exp10(self.decimals as usize)
    }

    /// `amount` in whole tokens, e.g. `1.500000000000000000`.
    pub fn format(&self, amount: U256) -> String {
        format_amount(amount, self.decimals)
    }
}

pub fn format_amount(amount: U256, decimals: u32) -> String {
    ethers::utils::format_units(amount, decimals).unwrap_or_else(|_| amount.to_string())
}

/// An Infrared reward vault: `getReward()`, `stake(uint256)`, `balanceOf(address)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone)]
pub struct ContractRegistry {
    /// Vaults harvested each run, in this order.
    pub vaults: Vec<Vault>,
    /// Token paid out by `getReward` and re-staked.
    pub reward_token: Token,
    /// Vault receiving the re-staked reward token.
    pub staking_vault: Vault,
    /// Other known tokens, for balance logging.
    pub tokens: Vec<Token>,
}

impl ContractRegistry {
    /// Looks up a harvest vault by its pool name (e.g. `HONEY_WBERA`).
    pub fn pool_vault(&self, pool: &str) -> Option<&Vault> {
        self.vaults.iter().find(|v| v.name.eq_ignore_ascii_case(pool))
    }

    /// Narrows the harvest list to `pools`, keeping their given order.
    /// An empty selection keeps every vault.
    pub fn only_vaults(&self, pools: &[String]) -> Result<Self, ConfigError> {
        if pools.is_empty() {
            return Ok(self.clone());
        }

        let vaults = pools
            .iter()
            .map(|pool| {
                self.pool_vault(pool)
                    .cloned()
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: "vault".to_string(),
                        reason: format!("unknown pool '{}'", pool),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            vaults,
            ..self.clone()
        })
    }
}
