//! # Berachain Farmer
//!
//! Unattended yield farming on Berachain Infrared vaults: harvest rewards
//! from every configured vault, then stake the accumulated reward token.
//!
//! ## Modules
//!
//! - [`config`] - TOML configuration and validation
//! - [`registry`] - Vault and token addresses
//! - [`contracts`] - ABI encoding of the contract methods we call
//! - [`gateway`] - JSON-RPC access and typed contract calls
//! - [`client`] - Connected RPC plus signing account
//! - [`pipeline`] - Gas admission, signing, broadcast and confirmation
//! - [`workflow`] - The harvest → check → approve → stake state machine

pub mod client;
pub mod config;
pub mod contracts;
pub mod gateway;
pub mod pipeline;
pub mod registry;
pub mod workflow;

pub use client::ChainClient;
pub use config::FarmConfig;
pub use gateway::{ChainRpc, ContractCallGateway, HttpRpc};
pub use pipeline::{PipelineConfig, SubmitOutcome, TransactionPipeline, TxFailure};
pub use registry::ContractRegistry;
pub use workflow::{
    ApprovalPolicy, FarmSettings, SkipReason, Step, StepRecord, StepResult, WorkflowState,
    WorkflowTrace, YieldFarmer,
};
