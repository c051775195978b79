//! # Core Logic - Shared Utilities for Chain Agents
//!
//! Chain-agnostic building blocks used by the agents under `chains/`.
//!
//! ## Modules
//!
//! - [`config`] - Shared configuration primitives (wallet source, chain endpoint)
//! - [`error`] - Typed error handling with thiserror
//! - [`security`] - Wallet decryption (scrypt + AES-256-GCM)
//! - [`traits`] - The [`Workflow`] trait driven by the runner
//! - `utils` - Gas admission, logging, key loading and scheduling

pub mod config;
pub mod error;
pub mod security;
pub mod traits;
pub(crate) mod utils;

pub use config::{ChainConfig, WalletSource};
pub use error::{ConfigError, CoreError, NetworkError, SecurityError, WalletError};
pub use security::SecurityUtils;
pub use traits::{RunStats, Workflow};

// Utils are pub(crate) - only export specific public utilities
pub use utils::{
    admit, gwei_to_wei, setup_logger, CallGasLimits, GasCeiling, GasConfig, GasConfigToml,
    PrivateKey, RunnerConfig, WalletManager, WorkerRunner,
};
