//! Chain access: the JSON-RPC surface ([`ChainRpc`]) and the typed contract
//! call layer on top of it ([`ContractCallGateway`]).

use crate::contracts::{ContractCall, ContractMethod};
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::NetworkError;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockNumber, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256,
};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// The RPC operations the farmer needs. Every call may fail with a
/// [`NetworkError`]; callers decide whether that is fatal.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn chain_id(&self) -> Result<u64, NetworkError>;

    async fn gas_price(&self) -> Result<U256, NetworkError>;

    /// Transaction count of `address` including pending transactions.
    async fn transaction_count(&self, address: Address) -> Result<U256, NetworkError>;

    /// Read-only `eth_call`.
    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, NetworkError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, NetworkError>;

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, NetworkError>;
}

/// Contract-level calls: `call` for reads, `prepare` for write payloads.
#[async_trait]
pub trait ContractCallGateway {
    /// Executes a read-only method and decodes its `uint256` result.
    /// Write methods are refused before anything reaches the node.
    async fn call(&self, call: &ContractCall) -> Result<U256, NetworkError>;

    /// Builds the calldata for a state-changing method.
    fn prepare(&self, call: &ContractCall) -> Bytes;

    /// `balanceOf(account)` on an ERC-20 token or a vault.
    async fn balance_of(&self, contract: Address, account: Address) -> Result<U256, NetworkError>;
}

#[async_trait]
impl<R> ContractCallGateway for R
where
    R: ChainRpc + ?Sized,
{
    async fn call(&self, call: &ContractCall) -> Result<U256, NetworkError> {
        if !call.method.is_read_only() {
            return Err(NetworkError::rpc(
                call.method.signature(),
                "state-changing method cannot be executed through eth_call",
            ));
        }
        let output = self.eth_call(call.to, call.method.encode()).await?;
        ContractMethod::decode_uint(&output)
            .map_err(|e| NetworkError::invalid_response(call.method.signature(), e))
    }

    fn prepare(&self, call: &ContractCall) -> Bytes {
        call.method.encode()
    }

    async fn balance_of(&self, contract: Address, account: Address) -> Result<U256, NetworkError> {
        self.call(&ContractCall::new(contract, ContractMethod::BalanceOf { account }))
            .await
    }
}

/// [`ChainRpc`] over an ethers HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpRpc {
    provider: Provider<Http>,
    endpoint: String,
}

impl HttpRpc {
    pub fn new(rpc_url: &str, request_timeout: Duration) -> Result<Self> {
        let url: Url = rpc_url.parse().context("Invalid RPC URL")?;

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        let provider = Provider::new(Http::new_with_client(url, client));

        Ok(Self {
            provider,
            endpoint: rpc_url.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainRpc for HttpRpc {
    async fn chain_id(&self) -> Result<u64, NetworkError> {
        let id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| NetworkError::ConnectionRefused {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;
        u64::try_from(id).map_err(|_| NetworkError::invalid_response("eth_chainId", id))
    }

    async fn gas_price(&self) -> Result<U256, NetworkError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| NetworkError::rpc("eth_gasPrice", e))
    }

    async fn transaction_count(&self, address: Address) -> Result<U256, NetworkError> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| NetworkError::rpc("eth_getTransactionCount", e))
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, NetworkError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| NetworkError::rpc("eth_call", e))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, NetworkError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| NetworkError::rpc("eth_sendRawTransaction", e))?;
        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, NetworkError> {
        self.provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| NetworkError::rpc("eth_getTransactionReceipt", e))
    }
}
