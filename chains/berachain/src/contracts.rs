//! Typed descriptors for the handful of contract methods the farmer calls.
//!
//! Each [`ContractMethod`] knows its canonical signature and argument
//! encoding, so calldata is built without a JSON ABI at runtime.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Address, Bytes, U256};
use ethers::utils::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractMethod {
    /// Infrared vault: claim accrued rewards.
    GetReward,
    /// Infrared vault: stake `amount` of the staking token.
    Stake { amount: U256 },
    /// ERC-20 / vault: balance of `account`.
    BalanceOf { account: Address },
    /// ERC-20: remaining allowance `owner` granted to `spender`.
    Allowance { owner: Address, spender: Address },
    /// ERC-20: set `spender`'s allowance to `amount`.
    Approve { spender: Address, amount: U256 },
}

impl ContractMethod {
    pub fn signature(&self) -> &'static str {
        match self {
            ContractMethod::GetReward => "getReward()",
            ContractMethod::Stake { .. } => "stake(uint256)",
            ContractMethod::BalanceOf { .. } => "balanceOf(address)",
            ContractMethod::Allowance { .. } => "allowance(address,address)",
            ContractMethod::Approve { .. } => "approve(address,uint256)",
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        id(self.signature())
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ContractMethod::BalanceOf { .. } | ContractMethod::Allowance { .. }
        )
    }

    fn args(&self) -> Vec<Token> {
        match self {
            ContractMethod::GetReward => vec![],
            ContractMethod::Stake { amount } => vec![Token::Uint(*amount)],
            ContractMethod::BalanceOf { account } => vec![Token::Address(*account)],
            ContractMethod::Allowance { owner, spender } => {
                vec![Token::Address(*owner), Token::Address(*spender)]
            }
            ContractMethod::Approve { spender, amount } => {
                vec![Token::Address(*spender), Token::Uint(*amount)]
            }
        }
    }

    /// Selector followed by the ABI-encoded arguments.
    pub fn encode(&self) -> Bytes {
        let mut data = self.selector().to_vec();
        data.extend(abi::encode(&self.args()));
        data.into()
    }

    /// Decodes the single `uint256` returned by the read-only methods.
    pub fn decode_uint(output: &[u8]) -> Result<U256, abi::Error> {
        abi::decode(&[ParamType::Uint(256)], output)?
            .into_iter()
            .next()
            .and_then(Token::into_uint)
            .ok_or(abi::Error::InvalidData)
    }
}

/// A method bound to the contract it is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub method: ContractMethod,
}

impl ContractCall {
    pub fn new(to: Address, method: ContractMethod) -> Self {
        Self { to, method }
    }
}
