//! Ties `chain_account`, `chain_contracts`, and `chain_crypto` together
//! into the per-transaction and per-block apply loop described in
//! §4.7: validate, debit prepaid gas, transfer value, dispatch, commit
//! or restore, bump nonce exactly once.

use std::sync::Arc;

use chain_account::AccountStore;
use chain_contracts::{CallKind, ContractRegistry, EvmHost, EvmOutcome, Log, TxContext};
use chain_crypto::Address;
use chain_kvstore::KVStore;
use parking_lot::RwLock;
use revm_primitives::U256;
use tracing::{debug, info_span};

use crate::callframe;
use crate::error::{ExecError, Result};
use crate::transaction::Transaction;
use crate::types::{BlockContext, TxReceipt};

/// Whether the dispatched body reverted in a way that refunds unused gas
/// (an explicit `Revert`/native error) or consumed the entire gas limit
/// (an EVM halt — out-of-gas, invalid opcode, stack over/underflow).
enum Outcome {
    Success { output: Vec<u8>, gas_used: u64, logs: Vec<Log>, created_address: Option<Address> },
    Reverted { output: Vec<u8>, gas_used: u64 },
    Halted { gas_used: u64 },
}

pub struct Executor {
    accounts: Arc<AccountStore>,
    registry: RwLock<ContractRegistry>,
    evm: EvmHost,
    kv: Arc<KVStore>,
}

impl Executor {
    pub fn new(kv: Arc<KVStore>) -> Result<Self> {
        let accounts = Arc::new(AccountStore::new(kv.clone()));
        let registry = ContractRegistry::load(kv.clone())?;
        let evm = EvmHost::new(accounts.clone(), kv.clone());
        Ok(Self { accounts, registry: RwLock::new(registry), evm, kv })
    }

    pub fn accounts(&self) -> &Arc<AccountStore> {
        &self.accounts
    }

    /// Installs already-deployed EVM bytecode at `addr` outside the
    /// normal CREATE flow — for genesis contracts and precompile-adjacent
    /// fixtures that exist from block zero rather than being deployed by
    /// a transaction.
    pub fn install_evm_code(&self, addr: Address, code: Vec<u8>) -> Result<()> {
        self.accounts.set_code(addr, code.clone())?;
        self.registry.write().insert_evm_code(addr, code);
        Ok(())
    }

    fn tx_context(&self, block: &BlockContext) -> TxContext {
        TxContext {
            chain_id: block.chain_id,
            block_number: block.number,
            timestamp: block.timestamp,
            block_gas_limit: block.gas_limit,
            coinbase: block.coinbase,
        }
    }

    /// Applies one transaction per the algorithm in §4.7. Pre-execution
    /// validation failures (`InvalidSignature`, `BadNonce`,
    /// `InsufficientBalance`, `GasLimitExceeded`) return `Err` with no
    /// state touched at all — the caller should not include the
    /// transaction in the block. Every other outcome, including a
    /// reverted call, is `Ok(TxReceipt)` because the transaction was
    /// admitted: the nonce bumped and gas was spent.
    pub fn apply_transaction(&self, tx: &Transaction, block: &BlockContext) -> Result<TxReceipt> {
        let _span = info_span!("apply_transaction").entered();
        callframe::check_depth(0)?;

        let from = tx.sender().map_err(|_| ExecError::InvalidSignature)?;
        let expected_nonce = self.accounts.nonce_of(from)?;
        if tx.nonce != expected_nonce {
            return Err(ExecError::BadNonce { expected: expected_nonce, got: tx.nonce });
        }
        if tx.gas_limit > block.gas_limit {
            return Err(ExecError::GasLimitExceeded);
        }
        let gas_cost = U256::from(tx.gas_limit).saturating_mul(U256::from(tx.gas_price));
        let upfront = gas_cost.saturating_add(tx.value);
        let balance = self.accounts.balance_of(from)?;
        if balance < upfront {
            return Err(ExecError::InsufficientBalance { have: balance, need: upfront });
        }

        // Admitted: gas is always charged and the nonce always bumps
        // from here on, no matter what the dispatched call does.
        self.accounts.sub_balance(from, gas_cost)?;
        let chk_from = self.accounts.checkpoint(from)?;

        let ctx = self.tx_context(block);
        let result = if let Some(to) = tx.to {
            self.dispatch_to(from, &chk_from, to, tx, &ctx)
        } else {
            self.dispatch_create(from, &chk_from, tx, &ctx)
        };

        let tx_hash = tx.hash();
        let receipt = match result {
            Ok((outcome, created_address)) => {
                let gas_used = match &outcome {
                    Outcome::Success { gas_used, .. } => *gas_used,
                    Outcome::Reverted { gas_used, .. } => *gas_used,
                    Outcome::Halted { gas_used } => *gas_used,
                };
                let refundable = !matches!(outcome, Outcome::Halted { .. });
                if refundable {
                    let unused = tx.gas_limit.saturating_sub(gas_used);
                    self.accounts.add_balance(from, U256::from(unused).saturating_mul(U256::from(tx.gas_price)))?;
                }
                let (success, output, logs) = match outcome {
                    Outcome::Success { output, logs, .. } => (true, output, logs),
                    Outcome::Reverted { output, .. } => (false, output, vec![]),
                    Outcome::Halted { .. } => (false, vec![], vec![]),
                };
                debug!(%tx_hash, success, gas_used, "transaction applied");
                TxReceipt { tx_hash, success, gas_used, output, logs, contract_address: created_address }
            }
            Err(ExecError::Store(e)) => return Err(ExecError::Store(e)),
            Err(_) => {
                self.accounts.restore(from, chk_from);
                TxReceipt { tx_hash, success: false, gas_used: tx.gas_limit, output: vec![], logs: vec![], contract_address: None }
            }
        };

        self.accounts.set_nonce(from, tx.nonce + 1)?;
        Ok(receipt)
    }

    fn dispatch_create(&self, from: Address, chk_from: &chain_account::AccountSnapshot, tx: &Transaction, ctx: &TxContext) -> Result<(Outcome, Option<Address>)> {
        let new_addr = chain_crypto::Address::derive_create(&from, tx.nonce);
        let chk_new = self.accounts.checkpoint(new_addr)?;
        if tx.value > U256::ZERO {
            self.accounts.sub_balance(from, tx.value)?;
            self.accounts.add_balance(new_addr, tx.value)?;
        }
        match self.evm.deploy(*ctx, from, tx.data.clone(), tx.gas_limit) {
            Ok(EvmOutcome::Success { output, gas_used, logs, created_address }) => {
                let addr = created_address.unwrap_or(new_addr);
                self.registry.write().insert_evm_code(addr, output.clone());
                Ok((Outcome::Success { output, gas_used, logs, created_address: Some(addr) }, Some(addr)))
            }
            Ok(EvmOutcome::Revert { output, gas_used }) => {
                self.accounts.restore(new_addr, chk_new);
                self.accounts.restore(from, chk_from.clone());
                Ok((Outcome::Reverted { output, gas_used }, None))
            }
            Ok(EvmOutcome::Halt { gas_used, reason }) => {
                self.accounts.restore(new_addr, chk_new);
                self.accounts.restore(from, chk_from.clone());
                debug!(reason, "evm deploy halted");
                Ok((Outcome::Halted { gas_used }, None))
            }
            Err(e) => {
                self.accounts.restore(new_addr, chk_new);
                self.accounts.restore(from, chk_from.clone());
                Err(ExecError::Contract(e))
            }
        }
    }

    fn dispatch_to(&self, from: Address, chk_from: &chain_account::AccountSnapshot, to: Address, tx: &Transaction, ctx: &TxContext) -> Result<(Outcome, Option<Address>)> {
        if to == chain_contracts::reserved::contract_manager() {
            return self.dispatch_native_deploy(from, tx);
        }

        let chk_to = self.accounts.checkpoint(to)?;
        if tx.value > U256::ZERO {
            self.accounts.sub_balance(from, tx.value)?;
            self.accounts.add_balance(to, tx.value)?;
        } else {
            self.accounts.touch(to)?;
        }

        let is_evm = self.registry.read().evm_code(to).is_some();
        if is_evm {
            return match self.evm.call(*ctx, from, to, tx.data.clone(), tx.gas_limit) {
                Ok(EvmOutcome::Success { output, gas_used, logs, .. }) => Ok((Outcome::Success { output, gas_used, logs, created_address: None }, None)),
                Ok(EvmOutcome::Revert { output, gas_used }) => {
                    self.accounts.restore(to, chk_to);
                    self.accounts.restore(from, chk_from.clone());
                    Ok((Outcome::Reverted { output, gas_used }, None))
                }
                Ok(EvmOutcome::Halt { gas_used, reason }) => {
                    self.accounts.restore(to, chk_to);
                    self.accounts.restore(from, chk_from.clone());
                    debug!(reason, "evm call halted");
                    Ok((Outcome::Halted { gas_used }, None))
                }
                Err(e) => {
                    self.accounts.restore(to, chk_to);
                    self.accounts.restore(from, chk_from.clone());
                    Err(ExecError::Contract(e))
                }
            };
        }

        let registered = self.registry.read().is_registered(to);
        if !registered {
            // Plain value transfer to an account with no code.
            return Ok((Outcome::Success { output: vec![], gas_used: chain_contracts::gas::BASE_CALL_GAS, logs: vec![], created_address: None }, None));
        }

        // Precompiles charge their own dedicated gas entries; every other
        // native contract charges the generic per-byte dispatch cost plus
        // a per-write surcharge for the SafeVar fields the call actually
        // touched (below, once the call has run and before its overlay
        // is committed or discarded).
        let base_gas = chain_contracts::gas::precompile_gas(to, tx.data.len())
            .unwrap_or_else(|| chain_contracts::gas::dispatch_gas(tx.data.len()));
        match self.registry.read().call(to, from, &tx.data, CallKind::Call) {
            Ok((output, logs)) => {
                let writes_gas = chain_contracts::gas::writes_gas(self.registry.read().touched_count(to));
                self.registry.read().commit_native(to);
                Ok((Outcome::Success { output, gas_used: base_gas + writes_gas, logs, created_address: None }, None))
            }
            Err(e) => {
                self.registry.read().revert_native(to);
                self.accounts.restore(to, chk_to);
                self.accounts.restore(from, chk_from.clone());
                Ok((Outcome::Reverted { output: revert_payload(&e), gas_used: base_gas.min(tx.gas_limit) }, None))
            }
        }
    }

    fn dispatch_native_deploy(&self, from: Address, tx: &Transaction) -> Result<(Outcome, Option<Address>)> {
        if tx.data.len() < 4 {
            return Err(ExecError::Contract(chain_contracts::ContractError::BadArgumentEncoding("calldata shorter than a selector".into())));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&tx.data[..4]);
        let dispatch_gas = chain_contracts::gas::dispatch_gas(tx.data.len());
        match self.registry.write().deploy_native(from, tx.nonce, selector, &tx.data[4..]) {
            Ok(addr) => Ok((Outcome::Success { output: addr.as_bytes().to_vec(), gas_used: dispatch_gas, logs: vec![], created_address: Some(addr) }, Some(addr))),
            Err(e) => Ok((Outcome::Reverted { output: revert_payload(&e), gas_used: dispatch_gas.min(tx.gas_limit) }, None)),
        }
    }

    /// Read-only call: checkpoints and unconditionally restores every
    /// account it touches, so no result of a view call is ever visible
    /// to a later transaction.
    pub fn view_call(&self, to: Address, caller: Address, data: &[u8]) -> Result<Vec<u8>> {
        let chk_to = self.accounts.checkpoint(to)?;
        let result = if self.registry.read().evm_code(to).is_some() {
            let ctx = TxContext { chain_id: 0, block_number: 0, timestamp: 0, block_gas_limit: u64::MAX, coinbase: Address::zero() };
            self.evm
                .call(ctx, caller, to, data.to_vec(), 30_000_000)
                .map(|outcome| match outcome {
                    EvmOutcome::Success { output, .. } => output,
                    EvmOutcome::Revert { output, .. } => output,
                    EvmOutcome::Halt { .. } => vec![],
                })
                .map_err(ExecError::Contract)
        } else {
            self.registry.read().call(to, caller, data, CallKind::StaticCall).map(|(out, _)| out).map_err(ExecError::Contract)
        };
        self.registry.read().revert_native(to);
        self.accounts.restore(to, chk_to);
        result
    }

    /// Applies every transaction in sequence, then flushes the account
    /// store, contract registry, and EVM storage batch together in one
    /// write. A fatal store error aborts the whole block: nothing is
    /// flushed, matching §7's "StoreIOError — fatal; halt rather than
    /// commit partial state."
    pub fn apply_block(&self, txs: &[Transaction], block: &BlockContext) -> Result<Vec<TxReceipt>> {
        let _span = info_span!("apply_block", number = block.number).entered();
        let mut receipts = Vec::with_capacity(txs.len());
        for tx in txs {
            match self.apply_transaction(tx, block) {
                Ok(receipt) => receipts.push(receipt),
                Err(ExecError::Store(e)) => return Err(ExecError::Store(e)),
                Err(_) => continue,
            }
        }
        let mut batch = self.accounts.flush();
        batch.extend(self.registry.read().flush());
        self.kv.write_batch(batch)?;
        Ok(receipts)
    }
}

fn revert_payload(err: &chain_contracts::ContractError) -> Vec<u8> {
    match err {
        chain_contracts::ContractError::Revert(bytes) => bytes.clone(),
        other => other.to_string().into_bytes(),
    }
}
