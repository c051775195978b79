//! Transaction submission pipeline.
//!
//! `submit` takes one state-changing call from calldata to a confirmed
//! receipt: gas admission, nonce fetch, signing, broadcast and a bounded
//! wait for the receipt. Outcomes are returned, never thrown: callers decide
//! whether to continue.

use crate::client::ChainClient;
use crate::gateway::ChainRpc;
use core_logic::{admit, GasCeiling, NetworkError};
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256, U64};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// How long to wait for a receipt before giving up on a broadcast tx.
    pub confirmation_timeout: Duration,
    /// Pause between receipt polls.
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TxFailure {
    /// Mined, but execution failed. The nonce is spent.
    #[error("transaction {hash:?} reverted")]
    Reverted { hash: TxHash, block: Option<U64> },

    /// No receipt within the confirmation window. Outcome unknown.
    #[error("no receipt for {hash:?} after {waited:?}")]
    TimedOut { hash: TxHash, waited: Duration },

    /// RPC or signer failure before the transaction reached the network.
    #[error("{stage} failed: {reason}")]
    Connection { stage: &'static str, reason: String },
}

impl TxFailure {
    fn connection(stage: &'static str, err: impl ToString) -> Self {
        TxFailure::Connection {
            stage,
            reason: err.to_string(),
        }
    }
}

impl From<NetworkError> for TxFailure {
    fn from(e: NetworkError) -> Self {
        TxFailure::connection("rpc", e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Confirmed(TransactionReceipt),
    /// Gas price above the ceiling. Nothing was signed and no nonce was used.
    AdmissionRejected { gas_price: U256, ceiling: GasCeiling },
    Failed(TxFailure),
}

impl SubmitOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmitOutcome::Confirmed(_))
    }
}

pub struct TransactionPipeline<'a, R, S> {
    client: &'a ChainClient<R, S>,
    config: PipelineConfig,
}

impl<'a, R, S> TransactionPipeline<'a, R, S>
where
    R: ChainRpc,
    S: Signer,
{
    pub fn new(client: &'a ChainClient<R, S>, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    /// Submits `data` to `to` and waits for its receipt.
    pub async fn submit(
        &self,
        to: Address,
        data: Bytes,
        gas_limit: u64,
        ceiling: GasCeiling,
    ) -> SubmitOutcome {
        let gas_price = match self.client.rpc().gas_price().await {
            Ok(price) => price,
            Err(e) => return SubmitOutcome::Failed(e.into()),
        };

        // Prices beyond u128 are far above any ceiling
        let price_wei = u128::try_from(gas_price).unwrap_or(u128::MAX);
        if !admit(price_wei, ceiling) {
            warn!(
                "Gas too high, skipping: {} gwei > ceiling {}",
                format_gwei(gas_price),
                ceiling
            );
            return SubmitOutcome::AdmissionRejected { gas_price, ceiling };
        }

        let hash = match self.sign_and_send(to, data, gas_limit, gas_price).await {
            Ok(hash) => hash,
            Err(failure) => return SubmitOutcome::Failed(failure),
        };

        match self.wait_for_receipt(hash).await {
            Ok(receipt) if receipt.status == Some(U64::zero()) => {
                SubmitOutcome::Failed(TxFailure::Reverted {
                    hash,
                    block: receipt.block_number,
                })
            }
            Ok(receipt) => SubmitOutcome::Confirmed(receipt),
            Err(failure) => SubmitOutcome::Failed(failure),
        }
    }

    async fn sign_and_send(
        &self,
        to: Address,
        data: Bytes,
        gas_limit: u64,
        gas_price: U256,
    ) -> Result<TxHash, TxFailure> {
        let from = self.client.address();

        // Fetched per call, never cached: another sender on this account
        // would otherwise leave us with a stale nonce.
        let nonce = self.client.rpc().transaction_count(from).await?;

        let tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(data)
            .value(U256::zero())
            .nonce(nonce)
            .gas(gas_limit)
            .gas_price(gas_price)
            .chain_id(self.client.chain_id())
            .into();

        let signature = self
            .client
            .signer()
            .sign_transaction(&tx)
            .await
            .map_err(|e| TxFailure::connection("signing", e))?;
        let raw = tx.rlp_signed(&signature);

        let hash = self.client.rpc().send_raw_transaction(raw).await?;
        info!("Tx sent: {:?} (nonce {})", hash, nonce);

        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TransactionReceipt, TxFailure> {
        let timeout = self.config.confirmation_timeout;

        let poll = async {
            loop {
                match self.client.rpc().transaction_receipt(hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    Err(e) => debug!("Receipt poll for {:?} failed: {}", hash, e),
                }
                tokio::time::sleep(self.config.poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| TxFailure::TimedOut {
                hash,
                waited: timeout,
            })
    }
}

fn format_gwei(wei: U256) -> String {
    ethers::utils::format_units(wei, "gwei").unwrap_or_else(|_| wei.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_confirmation_timeout() {
        assert_eq!(
            PipelineConfig::default().confirmation_timeout,
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_failure_messages() {
        let failure = TxFailure::connection("signing", "bad key");
        assert_eq!(failure.to_string(), "signing failed: bad key");
    }

    #[test]
    fn test_format_gwei() {
        assert_eq!(format_gwei(U256::from(1_500_000_000u64)), "1.500000000");
    }
}
