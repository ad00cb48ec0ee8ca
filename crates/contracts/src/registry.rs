//! Maps a contract address to its concrete implementation. Native
//! contracts are a closed enum, not trait objects — adding a type means
//! adding a variant plus a load/dump/dispatch arm here, never open
//! inheritance (see the module doc on [`crate::types::NativeTypeTag`]).

use std::collections::HashMap;
use std::sync::Arc;

use chain_crypto::Address;
use chain_kvstore::{prefix, KVStore, WriteBatch};
use chain_safevar::NativeContract;
use tracing::{info, warn};

use crate::error::{ContractError, Result};
use crate::native::erc20::NativeErc20;
use crate::native::manager;
use crate::precompiles;
use crate::reserved;
use crate::types::{CallKind, ContractKind, ContractRecord, Log, NativeTypeTag};

const STATE_FIELD_TAG: &[u8] = b"state";

fn state_key(addr: &Address) -> Vec<u8> {
    let mut key = addr.as_bytes().to_vec();
    key.extend_from_slice(STATE_FIELD_TAG);
    key
}

enum NativeContractInstance {
    Erc20(NativeErc20),
}

impl NativeContractInstance {
    fn type_tag(&self) -> NativeTypeTag {
        match self {
            NativeContractInstance::Erc20(_) => NativeTypeTag::Erc20,
        }
    }

    fn dump(&self) -> Vec<u8> {
        match self {
            NativeContractInstance::Erc20(c) => c.dump(),
        }
    }

    fn load(tag: NativeTypeTag, bytes: &[u8]) -> Result<Self> {
        match tag {
            NativeTypeTag::Erc20 => Ok(NativeContractInstance::Erc20(NativeErc20::load(bytes)?)),
            NativeTypeTag::ContractManager => {
                Err(ContractError::UnknownTypeTag(tag.as_byte()))
            }
        }
    }

    fn dispatch(&self, caller: Address, selector: [u8; 4], args: &[u8], is_static: bool) -> Result<(Vec<u8>, Vec<Log>)> {
        match self {
            NativeContractInstance::Erc20(c) => c.dispatch(caller, selector, args, is_static),
        }
    }

    fn commit(&self) {
        match self {
            NativeContractInstance::Erc20(c) => c.commit(),
        }
    }

    fn revert(&self) {
        match self {
            NativeContractInstance::Erc20(c) => c.revert(),
        }
    }

    fn touched_count(&self) -> usize {
        match self {
            NativeContractInstance::Erc20(c) => c.touched_count(),
        }
    }
}

pub struct ContractRegistry {
    kv: Arc<KVStore>,
    native: HashMap<Address, NativeContractInstance>,
    evm_code: HashMap<Address, Vec<u8>>,
}

impl ContractRegistry {
    /// Rebuilds the native contract map from `CONTRACT_REGISTRY`: each
    /// entry is `addr -> typeTag`, and the type tag selects the
    /// constructor that rehydrates state from `CONTRACT_STATE ++ addr`.
    /// An unrecognized type tag is a fatal startup error — it means the
    /// store was written by a newer binary.
    pub fn load(kv: Arc<KVStore>) -> Result<Self> {
        let mut native = HashMap::new();
        for (addr_bytes, tag_bytes) in kv.scan_prefix(prefix::CONTRACT_REGISTRY)? {
            let addr = Address::from_slice(&addr_bytes);
            let tag_byte = *tag_bytes.first().ok_or_else(|| ContractError::UnknownTypeTag(0))?;
            let tag = NativeTypeTag::from_byte(tag_byte).ok_or(ContractError::UnknownTypeTag(tag_byte))?;
            let blob = kv
                .get(prefix::CONTRACT_STATE, &state_key(&addr))?
                .ok_or_else(|| ContractError::BadArgumentEncoding(format!("missing state for {addr}")))?;
            let instance = NativeContractInstance::load(tag, &blob)?;
            info!(%addr, ?tag, "rehydrated native contract");
            native.insert(addr, instance);
        }
        Ok(Self { kv, native, evm_code: HashMap::new() })
    }

    pub fn is_registered(&self, addr: Address) -> bool {
        self.native.contains_key(&addr) || self.evm_code.contains_key(&addr) || reserved::is_precompile(addr)
    }

    pub fn record(&self, addr: Address) -> Option<ContractRecord> {
        if let Some(instance) = self.native.get(&addr) {
            return Some(ContractRecord { address: addr, kind: ContractKind::Native, type_tag: Some(instance.type_tag()) });
        }
        if self.evm_code.contains_key(&addr) {
            return Some(ContractRecord { address: addr, kind: ContractKind::Evm, type_tag: None });
        }
        None
    }

    pub fn evm_code(&self, addr: Address) -> Option<&[u8]> {
        self.evm_code.get(&addr).map(Vec::as_slice)
    }

    pub fn insert_evm_code(&mut self, addr: Address, code: Vec<u8>) {
        self.evm_code.insert(addr, code);
    }

    /// Deploys a native contract via the contract-manager address. Every
    /// `Err` path returns before the new contract is inserted into the
    /// in-memory map, so a failed deploy never needs to be unwound — the
    /// insertion on `Ok` is final.
    pub fn deploy_native(&mut self, sender: Address, sender_nonce: u64, selector: [u8; 4], args: &[u8]) -> Result<Address> {
        let deployment = manager::dispatch_create(sender, sender_nonce, selector, args)?;
        if self.native.contains_key(&deployment.address) || self.evm_code.contains_key(&deployment.address) {
            return Err(ContractError::BadArgumentEncoding("contract address collision".into()));
        }
        let address = deployment.address;
        self.native.insert(address, NativeContractInstance::Erc20(deployment.erc20));
        Ok(address)
    }

    /// Dispatch per §4.5: reserved addresses first, then native by
    /// selector, then EVM (handled by the caller via `evm_code`), else
    /// `NoSuchContract`. Precompiles are resolved before the native map
    /// so no registered contract can shadow one.
    pub fn call(&self, addr: Address, caller: Address, input: &[u8], call_kind: CallKind) -> Result<(Vec<u8>, Vec<Log>)> {
        if let Some(result) = precompiles::dispatch(addr, input) {
            return result.map(|bytes| (bytes, vec![]));
        }
        if addr == reserved::contract_manager() {
            warn!("contract manager address called via `call`, not deploy_native");
            return Err(ContractError::SelectorNotFound(0));
        }
        if let Some(instance) = self.native.get(&addr) {
            if input.len() < 4 {
                return Err(ContractError::BadArgumentEncoding("calldata shorter than a selector".into()));
            }
            let mut selector = [0u8; 4];
            selector.copy_from_slice(&input[..4]);
            let is_static = call_kind == CallKind::StaticCall;
            let (mut output, mut logs) = instance.dispatch(caller, selector, &input[4..], is_static)?;
            for log in &mut logs {
                log.emitter = addr;
            }
            output.shrink_to_fit();
            return Ok((output, logs));
        }
        if self.evm_code.contains_key(&addr) {
            return Err(ContractError::BadArgumentEncoding(
                "EVM contract calls are routed through EVMHost, not ContractRegistry::call".into(),
            ));
        }
        Err(ContractError::NoSuchContract)
    }

    pub fn commit_native(&self, addr: Address) {
        if let Some(instance) = self.native.get(&addr) {
            instance.commit();
        }
    }

    /// Number of `SafeField`s the last dispatched call wrote to — call
    /// before `commit_native`/`revert_native` clears the overlay, 0 for
    /// an unregistered or non-native address.
    pub fn touched_count(&self, addr: Address) -> usize {
        self.native.get(&addr).map(|instance| instance.touched_count()).unwrap_or(0)
    }

    pub fn revert_native(&self, addr: Address) {
        if let Some(instance) = self.native.get(&addr) {
            instance.revert();
        }
    }

    /// Flushes every native contract's registry record and state blob
    /// into one write batch for the executor to apply alongside the
    /// account store's flush.
    pub fn flush(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (addr, instance) in &self.native {
            batch.put(prefix::CONTRACT_REGISTRY, addr.as_bytes().to_vec(), vec![instance.type_tag().as_byte()]);
            batch.put(prefix::CONTRACT_STATE, state_key(addr), instance.dump());
        }
        batch
    }

    pub fn kv(&self) -> &Arc<KVStore> {
        &self.kv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_codec::abi::{self, AbiValue};
    use revm_primitives::U256;

    fn open_registry() -> (ContractRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(KVStore::open(dir.path()).unwrap());
        (ContractRegistry::load(kv).unwrap(), dir)
    }

    #[test]
    fn deploy_then_call_balance_of() {
        let (mut registry, _dir) = open_registry();
        let sender = Address::new([1u8; 20]);
        let args = abi::encode_params(&[
            AbiValue::String("Token".into()),
            AbiValue::String("TKN".into()),
            AbiValue::Uint256(U256::from(18u64)),
            AbiValue::Uint256(U256::from(1_000u64)),
        ]);
        let token_addr = registry
            .deploy_native(sender, 0, abi::selector("createErc20(string,string,uint8,uint256)"), &args)
            .unwrap();

        let mut input = abi::selector("balanceOf(address)").to_vec();
        input.extend_from_slice(&abi::encode_params(&[AbiValue::Address(sender)]));
        let (output, _logs) = registry.call(token_addr, sender, &input, CallKind::Call).unwrap();
        let decoded = abi::decode_params(&[abi::AbiType::Uint256], &output).unwrap();
        assert_eq!(decoded[0], AbiValue::Uint256(U256::from(1_000u64)));
    }

    #[test]
    fn flush_and_reload_rehydrates_contract() {
        let dir = tempfile::tempdir().unwrap();
        let sender = Address::new([2u8; 20]);
        let token_addr;
        {
            let kv = Arc::new(KVStore::open(dir.path()).unwrap());
            let mut registry = ContractRegistry::load(kv.clone()).unwrap();
            let args = abi::encode_params(&[
                AbiValue::String("Token".into()),
                AbiValue::String("TKN".into()),
                AbiValue::Uint256(U256::from(18u64)),
                AbiValue::Uint256(U256::from(500u64)),
            ]);
            token_addr = registry
                .deploy_native(sender, 0, abi::selector("createErc20(string,string,uint8,uint256)"), &args)
                .unwrap();
            kv.write_batch(registry.flush()).unwrap();
        }
        {
            let kv = Arc::new(KVStore::open(dir.path()).unwrap());
            let registry = ContractRegistry::load(kv).unwrap();
            assert!(registry.is_registered(token_addr));
            let mut input = abi::selector("balanceOf(address)").to_vec();
            input.extend_from_slice(&abi::encode_params(&[AbiValue::Address(sender)]));
            let (output, _) = registry.call(token_addr, sender, &input, CallKind::Call).unwrap();
            let decoded = abi::decode_params(&[abi::AbiType::Uint256], &output).unwrap();
            assert_eq!(decoded[0], AbiValue::Uint256(U256::from(500u64)));
        }
    }

    #[test]
    fn deploy_native_rejects_an_address_collision_without_inserting() {
        let (mut registry, _dir) = open_registry();
        let sender = Address::new([3u8; 20]);
        let args = abi::encode_params(&[
            AbiValue::String("Token".into()),
            AbiValue::String("TKN".into()),
            AbiValue::Uint256(U256::from(18u64)),
            AbiValue::Uint256(U256::from(1u64)),
        ]);
        let selector = abi::selector("createErc20(string,string,uint8,uint256)");
        let addr = registry.deploy_native(sender, 0, selector, &args).unwrap();
        assert!(registry.is_registered(addr));

        let err = registry.deploy_native(sender, 0, selector, &args).unwrap_err();
        assert!(matches!(err, ContractError::BadArgumentEncoding(_)));
        assert!(registry.is_registered(addr));
    }
}
