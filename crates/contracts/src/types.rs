use chain_crypto::{Address, Hash};

/// What kind of contract is registered at an address: a native type
/// built into this binary, or EVM bytecode interpreted by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    Native,
    Evm,
}

/// A closed enumeration of native contract type tags — adding a type
/// means adding a variant here plus a load/dump/dispatch arm in the
/// registry, never open trait-object inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeTypeTag {
    Erc20,
    ContractManager,
}

impl NativeTypeTag {
    pub fn as_byte(self) -> u8 {
        match self {
            NativeTypeTag::Erc20 => 1,
            NativeTypeTag::ContractManager => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(NativeTypeTag::Erc20),
            2 => Some(NativeTypeTag::ContractManager),
            _ => None,
        }
    }
}

/// Registry entry for a deployed contract, as durably recorded under
/// the contract-registry prefix.
#[derive(Debug, Clone)]
pub struct ContractRecord {
    pub address: Address,
    pub kind: ContractKind,
    pub type_tag: Option<NativeTypeTag>,
}

/// A log emitted during a call, ordered within its transaction by
/// emit time and carrying the `(blockIndex, txIndex, logIndex)` total
/// order once appended to the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub emitter: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

/// Whether a call frame may mutate state. A static frame reaching the
/// mutating selector table, SSTORE, CREATE, SELFDESTRUCT, or a balance
/// transfer must fail with `StaticCallStateChange`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    StaticCall,
}
