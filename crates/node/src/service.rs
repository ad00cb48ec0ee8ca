use std::sync::Arc;

use chain_crypto::Address;
use chain_executor::{BlockContext, Executor, Transaction, TxReceipt};
use chain_kvstore::KVStore;
use tracing::info;

use crate::config::Config;

/// Orchestrates the store and executor `chain-node` wraps. No
/// network/consensus/RPC loop lives here — those are out of scope; this
/// is the library surface an (out-of-scope) RPC front-end would call
/// into.
pub struct NodeService {
    config: Config,
    executor: Executor,
}

impl NodeService {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        info!(chain_id = config.chain.id, "initializing node");
        config.validate()?;

        if let Some(parent) = config.storage.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!(db_path = ?config.storage.db_path, "opening store");
        let kv = Arc::new(KVStore::open(&config.storage.db_path)?);
        let executor = Executor::new(kv)?;
        info!("executor ready");

        Ok(Self { config, executor })
    }

    /// Applies every transaction in `txs` against `block` and flushes
    /// the resulting state in one batch. See `Executor::apply_block`.
    pub fn apply_block(&self, txs: &[Transaction], block: &BlockContext) -> anyhow::Result<Vec<TxReceipt>> {
        Ok(self.executor.apply_block(txs, block)?)
    }

    /// Validates and applies a single transaction, returning its
    /// receipt. A pre-execution rejection (bad nonce, bad signature,
    /// insufficient balance, gas limit exceeded) is returned as `Err`
    /// with no state touched.
    pub fn validate_transaction(&self, tx: &Transaction, block: &BlockContext) -> anyhow::Result<TxReceipt> {
        Ok(self.executor.apply_transaction(tx, block)?)
    }

    /// Read-only call against deployed contract state; never mutates
    /// anything a later transaction could observe.
    pub fn view_call(&self, to: Address, caller: Address, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(self.executor.view_call(to, caller, data)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}
