//! Executor (L4): applies a signed transaction end to end against
//! `chain_account::AccountStore` and `chain_contracts::ContractRegistry`/
//! `EvmHost`, matching §4.7's validate/debit/transfer/dispatch/commit
//! sequence.

mod callframe;
pub mod error;
mod executor;
mod transaction;
mod types;

pub use callframe::MAX_CALL_DEPTH;
pub use error::{ExecError, Result};
pub use executor::Executor;
pub use transaction::Transaction;
pub use types::{BlockContext, TxReceipt};
