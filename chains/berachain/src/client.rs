//! The connected chain handle shared by the pipeline and the workflow.

use crate::gateway::{ChainRpc, HttpRpc};
use anyhow::{Context, Result};
use core_logic::{ChainConfig, PrivateKey};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::time::Duration;
use tracing::info;

/// RPC handle, signing account and chain id for one process run.
///
/// Built once at startup and passed by reference to the pipeline and the
/// workflow. Nothing inside is mutated after construction.
#[derive(Debug)]
pub struct ChainClient<R, S> {
    rpc: R,
    signer: S,
    chain_id: u64,
}

impl<R, S> ChainClient<R, S>
where
    R: ChainRpc,
    S: Signer,
{
    pub fn new(rpc: R, signer: S, chain_id: u64) -> Self {
        Self {
            rpc,
            signer,
            chain_id,
        }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl ChainClient<HttpRpc, LocalWallet> {
    /// Connects to the configured endpoint and binds the key to its chain id.
    ///
    /// Any failure here is fatal for the process: there is nothing useful
    /// the farmer can do without a reachable node and a valid key.
    pub async fn connect(
        chain: &ChainConfig,
        key: &PrivateKey,
        request_timeout: Duration,
    ) -> Result<Self> {
        let rpc = HttpRpc::new(&chain.rpc_url, request_timeout)?;

        let chain_id = rpc
            .chain_id()
            .await
            .with_context(|| format!("RPC not connected: {}", chain.rpc_url))?;

        if let Some(expected) = chain.chain_id {
            if expected != chain_id {
                anyhow::bail!(
                    "Chain id mismatch for {}: expected {}, endpoint reports {}",
                    chain.name,
                    expected,
                    chain_id
                );
            }
        }

        let wallet = key
            .expose_hex()
            .parse::<LocalWallet>()
            .context("Failed to build signer from private key")?
            .with_chain_id(chain_id);

        info!(
            "Blockchain connected: {} (chain {}) as {:?}",
            chain.name,
            chain_id,
            wallet.address()
        );

        Ok(Self::new(rpc, wallet, chain_id))
    }
}
