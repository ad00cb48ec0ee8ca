use chain_contracts::Log;
use chain_crypto::{Address, Hash};

/// Fixed facts about the block a transaction executes in — everything
/// the EVM's `getTxContext`/`BLOCKHASH` callbacks need.
#[derive(Debug, Clone, Copy)]
pub struct BlockContext {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub coinbase: Address,
    pub chain_id: u64,
}

#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: Hash,
    pub success: bool,
    pub gas_used: u64,
    pub output: Vec<u8>,
    pub logs: Vec<Log>,
    pub contract_address: Option<Address>,
}
