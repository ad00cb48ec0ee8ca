use chain_crypto::Address;
use revm_primitives::U256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("account {addr} has insufficient balance: have {have}, need {need}")]
    InsufficientBalance { addr: Address, have: U256, need: U256 },

    #[error("account {addr} balance overflow: {have} + {amount} exceeds u256::MAX")]
    BalanceOverflow { addr: Address, have: U256, amount: U256 },

    #[error(transparent)]
    Store(#[from] chain_kvstore::StoreError),
}

pub type Result<T> = std::result::Result<T, AccountError>;
