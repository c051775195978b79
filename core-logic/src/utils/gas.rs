//! # Core Logic - Gas Configuration
//!
//! Gas ceiling and per-call gas limits, plus the admission check that gates
//! every submission. Chain crates fetch the live gas price themselves and
//! hand it to [`admit`].
//!
//! The ceiling is held as an exact wei amount. It is parsed from its decimal
//! gwei form with integer arithmetic, never through a float.

use crate::error::ConfigError;
use ethers::types::U256;
use ethers::utils::{format_units, parse_units};
use serde::Deserialize;
use std::fmt;

const DEFAULT_CEILING_WEI: u128 = 20_000_000_000;

/// Gas limits for each kind of state-changing call the farmer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallGasLimits {
    pub harvest: u64,
    pub approve: u64,
    pub stake: u64,
}

impl Default for CallGasLimits {
    fn default() -> Self {
        Self {
            harvest: 400_000,
            approve: 100_000,
            stake: 300_000,
        }
    }
}

/// Maximum gas price a submission may pay, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GasCeiling(u128);

impl GasCeiling {
    pub fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Parses a decimal gwei amount such as `"20"` or `"0.5"`.
    pub fn from_gwei(gwei: &str) -> Result<Self, ConfigError> {
        gwei_to_wei(gwei).map(Self)
    }

    pub fn wei(&self) -> u128 {
        self.0
    }
}

impl Default for GasCeiling {
    fn default() -> Self {
        Self(DEFAULT_CEILING_WEI)
    }
}

impl fmt::Display for GasCeiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match format_units(U256::from(self.0), "gwei") {
            Ok(gwei) => write!(f, "{} gwei", gwei),
            Err(_) => write!(f, "{} wei", self.0),
        }
    }
}

/// Configuration for gas management
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GasConfig {
    pub ceiling: GasCeiling,
    pub limits: CallGasLimits,
}

impl GasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ceiling(mut self, ceiling: GasCeiling) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn with_limits(mut self, limits: CallGasLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn ceiling(&self) -> GasCeiling {
        self.ceiling
    }

    pub fn limit_harvest(&self) -> u64 {
        self.limits.harvest
    }

    pub fn limit_approve(&self) -> u64 {
        self.limits.approve
    }

    pub fn limit_stake(&self) -> u64 {
        self.limits.stake
    }
}

/// Converts a decimal gwei string to wei without rounding.
///
/// Rejects negative values and amounts that do not fit in a `u128`.
pub fn gwei_to_wei(gwei: &str) -> Result<u128, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: "gas.max_gwei".to_string(),
        reason,
    };

    let gwei = gwei.trim();
    if gwei.starts_with('-') {
        return Err(invalid(format!("'{}' is negative", gwei)));
    }

    let wei: U256 = parse_units(gwei, "gwei")
        .map_err(|e| invalid(e.to_string()))?
        .into();

    u128::try_from(wei).map_err(|_| invalid(format!("'{}' is too large", gwei)))
}

/// Returns `false` when the current gas price is strictly above the ceiling.
/// A price exactly at the ceiling is admitted.
pub fn admit(current_gas_price_wei: u128, ceiling: GasCeiling) -> bool {
    current_gas_price_wei <= ceiling.wei()
}

/// Deserialize helper for GasConfig from TOML.
///
/// `max_gwei` is read as a string so that `"12.000000001"` survives exactly;
/// plain TOML numbers are accepted too.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GasConfigToml {
    pub max_gwei: Option<String>,
    pub limit_harvest: Option<u64>,
    pub limit_approve: Option<u64>,
    pub limit_stake: Option<u64>,
}

impl TryFrom<GasConfigToml> for GasConfig {
    type Error = ConfigError;

    fn try_from(toml: GasConfigToml) -> Result<Self, Self::Error> {
        let defaults = CallGasLimits::default();
        let ceiling = match toml.max_gwei.as_deref() {
            Some(gwei) => GasCeiling::from_gwei(gwei)?,
            None => GasCeiling::default(),
        };

        Ok(Self {
            ceiling,
            limits: CallGasLimits {
                harvest: toml.limit_harvest.unwrap_or(defaults.harvest),
                approve: toml.limit_approve.unwrap_or(defaults.approve),
                stake: toml.limit_stake.unwrap_or(defaults.stake),
            },
        })
    }
}
