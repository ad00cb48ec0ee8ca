use thiserror::Error;

/// Pre-execution errors reject the transaction outright: no state
/// changes, no nonce bump. Runtime errors revert the current frame but
/// still bump the nonce and charge gas — they are a property of
/// executing the call, not of the call's validity.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("bad nonce: expected {expected}, got {got}")]
    BadNonce { expected: u64, got: u64 },

    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: revm_primitives::U256, need: revm_primitives::U256 },

    #[error("gas limit exceeds block gas limit")]
    GasLimitExceeded,

    #[error("out of gas")]
    OutOfGas,

    #[error("call depth exceeded")]
    CallDepthExceeded,

    #[error("reverted: {0:?}")]
    Revert(Vec<u8>),

    #[error(transparent)]
    Account(#[from] chain_account::AccountError),

    #[error(transparent)]
    Contract(#[from] chain_contracts::ContractError),

    #[error(transparent)]
    Store(#[from] chain_kvstore::StoreError),
}

pub type Result<T> = std::result::Result<T, ExecError>;
