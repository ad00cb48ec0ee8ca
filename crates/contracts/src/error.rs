use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("no contract registered at this address")]
    NoSuchContract,

    #[error("selector {0:#010x} not found on this contract")]
    SelectorNotFound(u32),

    #[error("bad argument encoding: {0}")]
    BadArgumentEncoding(String),

    #[error("static call attempted to change state")]
    StaticCallStateChange,

    #[error("execution reverted")]
    Revert(Vec<u8>),

    #[error("duplicate selector {0:#010x} registered on the same contract")]
    DuplicateSelector(u32),

    #[error("unknown native contract type tag {0}")]
    UnknownTypeTag(u8),

    #[error(transparent)]
    Account(#[from] chain_account::AccountError),

    #[error(transparent)]
    SafeVar(#[from] chain_safevar::SafeVarError),

    #[error(transparent)]
    Codec(#[from] chain_codec::CodecError),

    #[error(transparent)]
    Store(#[from] chain_kvstore::StoreError),
}

pub type Result<T> = std::result::Result<T, ContractError>;
