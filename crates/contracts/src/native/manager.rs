//! The reserved contract-manager address: the single entry point for
//! deploying new native contracts. A transaction to this address with
//! `selector(createErc20) || encoded-constructor-args` derives the new
//! contract's address the same way EVM `CREATE` does, so native and EVM
//! deployments are indistinguishable to a block explorer.

use chain_codec::abi::{self, AbiType, AbiValue};
use chain_crypto::Address;
use revm_primitives::U256;

use crate::error::{ContractError, Result};
use crate::native::erc20::NativeErc20;
use crate::types::NativeTypeTag;

/// The result of a successful deploy dispatch: the new contract's
/// address, its type tag, and the constructed instance ready for the
/// registry to insert.
pub struct Deployment {
    pub address: Address,
    pub type_tag: NativeTypeTag,
    pub erc20: NativeErc20,
}

/// Decodes a `createErc20(string,string,uint8,uint256)` call and
/// derives the new contract's address via `keccak(rlp(sender,
/// sender_nonce))[12..]` — the same CREATE rule a `CREATE` opcode uses,
/// so a native deploy and an EVM deploy are address-compatible.
pub fn dispatch_create(sender: Address, sender_nonce: u64, selector: [u8; 4], args: &[u8]) -> Result<Deployment> {
    if selector != abi::selector("createErc20(string,string,uint8,uint256)") {
        return Err(ContractError::SelectorNotFound(u32::from_be_bytes(selector)));
    }
    let values = abi::decode_params(
        &[AbiType::String, AbiType::String, AbiType::Uint256 /* decimals packed as uint256 slot */, AbiType::Uint256],
        args,
    )?;
    let name = match &values[0] {
        AbiValue::String(s) => s.clone(),
        _ => return Err(ContractError::BadArgumentEncoding("expected string name".into())),
    };
    let symbol = match &values[1] {
        AbiValue::String(s) => s.clone(),
        _ => return Err(ContractError::BadArgumentEncoding("expected string symbol".into())),
    };
    let decimals = match &values[2] {
        AbiValue::Uint256(v) => v.to::<u8>(),
        _ => return Err(ContractError::BadArgumentEncoding("expected uint8 decimals".into())),
    };
    let initial_supply = match &values[3] {
        AbiValue::Uint256(v) => *v,
        _ => return Err(ContractError::BadArgumentEncoding("expected uint256 initial supply".into())),
    };

    let address = Address::derive_create(&sender, sender_nonce);
    let erc20 = NativeErc20::new(name, symbol, decimals, sender, initial_supply);
    Ok(Deployment { address, type_tag: NativeTypeTag::Erc20, erc20 })
}
