//! Bridges the `revm` interpreter to this core's own state: accounts
//! come from [`chain_account::AccountStore`], contract storage from a
//! dedicated KV prefix. `EvmHost` is `Clone` (every field is `Arc`-backed)
//! the same way the upstream EVM executor this is adapted from is —
//! `revm::Evm::builder().with_db` takes its database by value.
//!
//! Atomicity across a reverted frame is the executor's job, not this
//! host's: the executor checkpoints the touched accounts via
//! [`chain_account::AccountStore::checkpoint`] before invoking the EVM
//! and restores them on revert, the same way it guards a native call.

use std::collections::HashMap;
use std::sync::Arc;

use chain_account::AccountStore;
use chain_crypto::Address;
use chain_kvstore::{prefix, KVStore};
use parking_lot::RwLock;
use revm::primitives::{
    AccountInfo, Address as RevmAddress, Bytecode, Bytes, ExecutionResult, Output, TransactTo, B256,
    U256 as RevmU256,
};
use revm::{Database, DatabaseCommit, Evm};
use tracing::warn;

use crate::error::{ContractError, Result};
use crate::types::Log;

fn to_revm_address(addr: Address) -> RevmAddress {
    RevmAddress::from_slice(addr.as_bytes())
}

fn from_revm_address(addr: RevmAddress) -> Address {
    Address::from_slice(addr.as_slice())
}

fn storage_key(addr: &Address, index: RevmU256) -> Vec<u8> {
    let mut key = addr.as_bytes().to_vec();
    key.extend_from_slice(&index.to_be_bytes::<32>());
    key
}

/// Fixed per-transaction context the interpreter reads back through
/// `getTxContext`/`BLOCKHASH`/`ORIGIN` — set once before `execute`.
#[derive(Debug, Clone, Copy)]
pub struct TxContext {
    pub chain_id: u64,
    pub block_number: u64,
    pub timestamp: u64,
    pub block_gas_limit: u64,
    pub coinbase: Address,
}

#[derive(Clone)]
pub struct EvmHost {
    account_store: Arc<AccountStore>,
    kv: Arc<KVStore>,
    block_hashes: Arc<RwLock<HashMap<u64, [u8; 32]>>>,
}

/// What actually happened, translated from `revm::ExecutionResult` so
/// nothing upstream needs to depend on `revm` types directly.
pub enum EvmOutcome {
    Success { output: Vec<u8>, gas_used: u64, logs: Vec<Log>, created_address: Option<Address> },
    Revert { output: Vec<u8>, gas_used: u64 },
    Halt { gas_used: u64, reason: String },
}

impl EvmHost {
    pub fn new(account_store: Arc<AccountStore>, kv: Arc<KVStore>) -> Self {
        Self { account_store, kv, block_hashes: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Only the last 256 blocks are reachable via `BLOCKHASH`, per the
    /// EVM convention.
    pub fn record_block_hash(&self, number: u64, hash: [u8; 32]) {
        let mut hashes = self.block_hashes.write();
        hashes.insert(number, hash);
        if number > 256 {
            let cutoff = number - 256;
            hashes.retain(|&k, _| k > cutoff);
        }
    }

    /// `tx.value` and `tx.gas_price` are always zero here: the caller
    /// (the executor) has already moved value via `sub_balance`/
    /// `add_balance` and already charged/refunds gas itself, against
    /// the same account store this host reads `basic()` from. Letting
    /// revm's own transaction processing additionally move value or
    /// charge/refund gas would double both, since `DatabaseCommit::commit`
    /// writes revm's computed balances back absolutely rather than
    /// relatively. Only code-execution semantics — storage, logs,
    /// output, gas metering — are this host's job; balance bookkeeping
    /// belongs to `chain_account::AccountStore` exclusively.
    fn run(&self, ctx: TxContext, caller: Address, to: TransactTo, data: Vec<u8>, gas_limit: u64) -> Result<EvmOutcome> {
        let mut evm = Evm::builder()
            .with_db(self.clone())
            .modify_block_env(|b| {
                b.number = RevmU256::from(ctx.block_number);
                b.timestamp = RevmU256::from(ctx.timestamp);
                b.gas_limit = RevmU256::from(ctx.block_gas_limit);
                b.coinbase = to_revm_address(ctx.coinbase);
            })
            .modify_tx_env(|tx| {
                tx.caller = to_revm_address(caller);
                tx.transact_to = to;
                tx.data = Bytes::from(data);
                tx.value = RevmU256::ZERO;
                tx.gas_limit = gas_limit;
                tx.gas_price = RevmU256::ZERO;
            })
            .modify_cfg_env(|cfg| {
                cfg.chain_id = ctx.chain_id;
            })
            .build();

        let result = evm
            .transact_commit()
            .map_err(|e| ContractError::BadArgumentEncoding(format!("evm error: {e:?}")))?;
        Ok(translate(result))
    }

    /// Runs `init_code` as a CREATE and commits the resulting state
    /// immediately — the caller must have already checkpointed every
    /// account it wants to be able to restore on revert, and must have
    /// already transferred any sent value natively.
    pub fn deploy(&self, ctx: TxContext, deployer: Address, init_code: Vec<u8>, gas_limit: u64) -> Result<EvmOutcome> {
        self.run(ctx, deployer, TransactTo::Create, init_code, gas_limit)
    }

    /// Runs a CALL against the code already deployed at `to`. Any sent
    /// value must already have been transferred natively by the caller.
    pub fn call(&self, ctx: TxContext, caller: Address, to: Address, input: Vec<u8>, gas_limit: u64) -> Result<EvmOutcome> {
        self.run(ctx, caller, TransactTo::Call(to_revm_address(to)), input, gas_limit)
    }
}

fn translate(result: ExecutionResult) -> EvmOutcome {
    match result {
        ExecutionResult::Success { output, gas_used, logs, .. } => {
            let (return_data, created_address) = match output {
                Output::Call(bytes) => (bytes.to_vec(), None),
                Output::Create(bytes, addr) => (bytes.to_vec(), addr.map(from_revm_address)),
            };
            let logs = logs
                .into_iter()
                .map(|log| Log {
                    emitter: from_revm_address(log.address),
                    topics: log.data.topics().iter().map(|t| t.0).collect(),
                    data: log.data.data.to_vec(),
                })
                .collect();
            EvmOutcome::Success { output: return_data, gas_used, logs, created_address }
        }
        ExecutionResult::Revert { output, gas_used } => EvmOutcome::Revert { output: output.to_vec(), gas_used },
        ExecutionResult::Halt { reason, gas_used } => {
            warn!(?reason, "evm execution halted");
            EvmOutcome::Halt { gas_used, reason: format!("{reason:?}") }
        }
    }
}

impl Database for EvmHost {
    type Error = ContractError;

    fn basic(&mut self, address: RevmAddress) -> std::result::Result<Option<AccountInfo>, Self::Error> {
        let addr = from_revm_address(address);
        if !self.account_store.exists(addr)? {
            return Ok(None);
        }
        let balance = self.account_store.balance_of(addr)?;
        let nonce = self.account_store.nonce_of(addr)?;
        let code_bytes = self.account_store.get_code(addr)?;
        let code = if code_bytes.is_empty() { None } else { Some(Bytecode::new_raw(Bytes::from(code_bytes))) };
        let code_hash = code.as_ref().map(|c| c.hash_slow()).unwrap_or(revm::primitives::KECCAK_EMPTY);
        Ok(Some(AccountInfo { balance, nonce, code_hash, code }))
    }

    fn code_by_hash(&mut self, _code_hash: B256) -> std::result::Result<Bytecode, Self::Error> {
        Ok(Bytecode::default())
    }

    fn storage(&mut self, address: RevmAddress, index: RevmU256) -> std::result::Result<RevmU256, Self::Error> {
        let addr = from_revm_address(address);
        let key = storage_key(&addr, index);
        match self.kv.get(prefix::EVM_STORAGE, &key)? {
            Some(bytes) => {
                let mut buf = [0u8; 32];
                buf.copy_from_slice(&bytes);
                Ok(RevmU256::from_be_bytes(buf))
            }
            None => Ok(RevmU256::ZERO),
        }
    }

    fn block_hash(&mut self, number: u64) -> std::result::Result<B256, Self::Error> {
        Ok(self.block_hashes.read().get(&number).map(|h| B256::from_slice(h)).unwrap_or(B256::ZERO))
    }
}

impl DatabaseCommit for EvmHost {
    fn commit(&mut self, changes: HashMap<RevmAddress, revm::primitives::Account>) {
        let mut batch = chain_kvstore::WriteBatch::new();
        for (revm_addr, account) in changes {
            let addr = from_revm_address(revm_addr);
            if account.is_selfdestructed() {
                let _ = self.account_store.set_balance(addr, RevmU256::ZERO);
                continue;
            }
            if let Err(e) = self.account_store.set_balance(addr, account.info.balance) {
                warn!(%addr, error = %e, "failed to commit evm balance change");
            }
            if let Err(e) = self.account_store.set_nonce(addr, account.info.nonce) {
                warn!(%addr, error = %e, "failed to commit evm nonce change");
            }
            if let Some(code) = &account.info.code {
                if !code.is_empty() {
                    let _ = self.account_store.set_code(addr, code.bytecode().to_vec());
                }
            }
            for (key, slot) in account.storage {
                if !slot.is_changed() {
                    continue;
                }
                let k = storage_key(&addr, key);
                if slot.present_value.is_zero() {
                    batch.delete(prefix::EVM_STORAGE, k);
                } else {
                    batch.put(prefix::EVM_STORAGE, k, slot.present_value.to_be_bytes::<32>().to_vec());
                }
            }
        }
        if let Err(e) = self.kv.write_batch(batch) {
            warn!(error = %e, "failed to flush evm storage batch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::Address;

    fn ctx() -> TxContext {
        TxContext { chain_id: 1337, block_number: 1, timestamp: 0, block_gas_limit: 30_000_000, coinbase: Address::zero() }
    }

    fn open_host() -> (EvmHost, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(KVStore::open(dir.path()).unwrap());
        let accounts = Arc::new(AccountStore::new(kv.clone()));
        (EvmHost::new(accounts, kv), dir)
    }

    #[test]
    fn call_to_empty_account_with_no_code_returns_empty_output() {
        let (host, _dir) = open_host();
        let caller = Address::new([1u8; 20]);
        let to = Address::new([2u8; 20]);
        host.account_store.add_balance(caller, RevmU256::from(1_000_000u64)).unwrap();
        let outcome = host.call(ctx(), caller, to, vec![], 100_000).unwrap();
        match outcome {
            EvmOutcome::Success { output, .. } => assert!(output.is_empty()),
            _ => panic!("expected success calling an empty account"),
        }
    }
}
