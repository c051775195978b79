mod common;

use berachain_farmer::contracts::{ContractCall, ContractMethod};
use berachain_farmer::ContractCallGateway;
use common::{reward_token, tokens, MockRpc};
use core_logic::NetworkError;
use ethers::types::{Address, U256};

fn owner() -> Address {
    Address::from_low_u64_be(0x77)
}

#[tokio::test]
async fn test_balance_of_decodes_the_node_answer() {
    let rpc = MockRpc::new().with_read(reward_token(), "balanceOf(address)", tokens(7));

    let balance = rpc.balance_of(reward_token(), owner()).await.unwrap();

    assert_eq!(balance, tokens(7));
    assert_eq!(rpc.eth_calls(), 1);
}

#[tokio::test]
async fn test_allowance_is_read_through_call() {
    let rpc = MockRpc::new().with_read(reward_token(), "allowance(address,address)", U256::MAX);
    let call = ContractCall::new(
        reward_token(),
        ContractMethod::Allowance {
            owner: owner(),
            spender: Address::zero(),
        },
    );

    assert_eq!(rpc.call(&call).await.unwrap(), U256::MAX);
}

#[tokio::test]
async fn test_write_methods_never_reach_eth_call() {
    let rpc = MockRpc::new();
    let writes = [
        ContractMethod::GetReward,
        ContractMethod::Stake { amount: tokens(1) },
        ContractMethod::Approve {
            spender: owner(),
            amount: U256::MAX,
        },
    ];

    for method in writes {
        let signature = method.signature();
        let err = rpc
            .call(&ContractCall::new(reward_token(), method))
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Rpc { method, .. } if method == signature));
    }
    assert_eq!(rpc.eth_calls(), 0);
}

#[tokio::test]
async fn test_prepare_encodes_write_calldata() {
    let rpc = MockRpc::new();
    let call = ContractCall::new(reward_token(), ContractMethod::GetReward);

    assert_eq!(rpc.prepare(&call).to_vec(), vec![0x3d, 0x18, 0xb9, 0x12]);
}
