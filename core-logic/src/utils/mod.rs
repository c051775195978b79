//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod gas;
pub(crate) mod logger;
pub(crate) mod runner;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use gas::{admit, gwei_to_wei, CallGasLimits, GasCeiling, GasConfig, GasConfigToml};
pub use logger::setup_logger;
pub use runner::{RunnerConfig, WorkerRunner};
pub use wallet_manager::{PrivateKey, WalletManager};
