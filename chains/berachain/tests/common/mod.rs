#![allow(dead_code)]

use async_trait::async_trait;
use berachain_farmer::registry::{Token, Vault};
use berachain_farmer::{
    ApprovalPolicy, ChainClient, ChainRpc, ContractRegistry, FarmSettings, PipelineConfig,
};
use core_logic::{GasCeiling, GasConfig, NetworkError};
use ethers::abi;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Transaction, TransactionReceipt, TxHash, U256, U64};
use ethers::utils::{keccak256, rlp};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub const CHAIN_ID: u64 = 80094;
pub const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const ONE_GWEI: u64 = 1_000_000_000;

pub fn twenty_gwei() -> GasCeiling {
    GasCeiling::from_wei(20 * ONE_GWEI as u128)
}

/// 0.0001 of an 18-decimal token.
pub fn dust() -> U256 {
    U256::from(100_000_000_000_000u64)
}

pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(18)
}

pub fn vault_a() -> Address {
    Address::from_low_u64_be(0xa)
}
pub fn vault_b() -> Address {
    Address::from_low_u64_be(0xb)
}
pub fn vault_c() -> Address {
    Address::from_low_u64_be(0xc)
}
pub fn reward_token() -> Address {
    Address::from_low_u64_be(0x1b)
}
pub fn staking_vault() -> Address {
    Address::from_low_u64_be(0x5a)
}

pub fn selector(signature: &str) -> [u8; 4] {
    ethers::utils::id(signature)
}

#[derive(Default)]
struct MockState {
    gas_price: U256,
    nonce: U256,
    nonce_queries: usize,
    eth_calls: usize,
    reads: HashMap<(Address, [u8; 4]), U256>,
    failing_reads: HashSet<(Address, [u8; 4])>,
    reverting: HashSet<Address>,
    sent: Vec<Bytes>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    withhold_receipts: bool,
    fail_sends: bool,
}

/// In-memory node: answers reads from a table, mines every broadcast
/// transaction immediately and reverts those sent to flagged addresses.
pub struct MockRpc {
    state: Mutex<MockState>,
}

impl MockRpc {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                gas_price: U256::from(ONE_GWEI),
                ..Default::default()
            }),
        }
    }

    pub fn with_gas_price(self, wei: U256) -> Self {
        self.state.lock().unwrap().gas_price = wei;
        self
    }

    pub fn with_read(self, to: Address, signature: &str, value: U256) -> Self {
        self.state
            .lock()
            .unwrap()
            .reads
            .insert((to, selector(signature)), value);
        self
    }

    pub fn with_failing_read(self, to: Address, signature: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_reads
            .insert((to, selector(signature)));
        self
    }

    pub fn with_revert(self, to: Address) -> Self {
        self.state.lock().unwrap().reverting.insert(to);
        self
    }

    pub fn withholding_receipts(self) -> Self {
        self.state.lock().unwrap().withhold_receipts = true;
        self
    }

    pub fn failing_sends(self) -> Self {
        self.state.lock().unwrap().fail_sends = true;
        self
    }

    /// Simulates a transaction from this account sent by someone else.
    pub fn bump_nonce(&self) {
        let mut state = self.state.lock().unwrap();
        state.nonce += U256::one();
    }

    pub fn nonce(&self) -> U256 {
        self.state.lock().unwrap().nonce
    }

    pub fn nonce_queries(&self) -> usize {
        self.state.lock().unwrap().nonce_queries
    }

    pub fn eth_calls(&self) -> usize {
        self.state.lock().unwrap().eth_calls
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|raw| decode_raw(raw))
            .collect()
    }
}

#[async_trait]
impl ChainRpc for MockRpc {
    async fn chain_id(&self) -> Result<u64, NetworkError> {
        Ok(CHAIN_ID)
    }

    async fn gas_price(&self) -> Result<U256, NetworkError> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn transaction_count(&self, _address: Address) -> Result<U256, NetworkError> {
        let mut state = self.state.lock().unwrap();
        state.nonce_queries += 1;
        Ok(state.nonce)
    }

    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, NetworkError> {
        let mut state = self.state.lock().unwrap();
        state.eth_calls += 1;
        let mut key = [0u8; 4];
        key.copy_from_slice(&data[..4]);

        if state.failing_reads.contains(&(to, key)) {
            return Err(NetworkError::rpc("eth_call", "connection reset"));
        }
        let value = state.reads.get(&(to, key)).copied().unwrap_or_default();
        Ok(abi::encode(&[abi::Token::Uint(value)]).into())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash, NetworkError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(NetworkError::rpc("eth_sendRawTransaction", "broken pipe"));
        }

        let tx = decode_raw(&raw);
        let hash = TxHash::from(keccak256(&raw));
        let reverted = tx.to.is_some_and(|to| state.reverting.contains(&to));

        state.nonce += U256::one();
        let block = U64::from(state.sent.len() as u64 + 1);
        state.sent.push(raw);

        if !state.withhold_receipts {
            state.receipts.insert(
                hash,
                TransactionReceipt {
                    transaction_hash: hash,
                    block_number: Some(block),
                    status: Some(U64::from(if reverted { 0 } else { 1 })),
                    ..Default::default()
                },
            );
        }

        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, NetworkError> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }
}

pub fn decode_raw(raw: &Bytes) -> Transaction {
    rlp::decode::<Transaction>(raw.as_ref()).unwrap()
}

pub fn wallet() -> LocalWallet {
    TEST_KEY.parse::<LocalWallet>().unwrap().with_chain_id(CHAIN_ID)
}

pub fn client(rpc: MockRpc) -> ChainClient<MockRpc, LocalWallet> {
    ChainClient::new(rpc, wallet(), CHAIN_ID)
}

pub fn fast_pipeline() -> PipelineConfig {
    PipelineConfig {
        confirmation_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(10),
    }
}

pub fn registry() -> ContractRegistry {
    let vault = |name: &str, address: Address| Vault {
        name: name.to_string(),
        address,
    };

    ContractRegistry {
        vaults: vec![
            vault("A", vault_a()),
            vault("B", vault_b()),
            vault("C", vault_c()),
        ],
        reward_token: Token {
            name: "iBGT".to_string(),
            address: reward_token(),
            decimals: 18,
        },
        staking_vault: vault("iBGT", staking_vault()),
        tokens: vec![],
    }
}

pub fn settings(approval_policy: ApprovalPolicy) -> FarmSettings {
    FarmSettings {
        gas: GasConfig::new(),
        dust_threshold: dust(),
        approval_policy,
    }
}

/// First argument word of the calldata, as a uint.
pub fn first_arg(tx: &Transaction) -> U256 {
    U256::from_big_endian(&tx.input[4..36])
}

pub fn second_arg(tx: &Transaction) -> U256 {
    U256::from_big_endian(&tx.input[36..68])
}
