//! ContractRegistry, EVMHost, and Precompiles (L2/L3): routes a call to
//! a native contract's selector table, to the EVM interpreter, or to a
//! fixed-address precompile, and bridges the two execution models to
//! the same account and storage state.

pub mod error;
pub mod evmhost;
mod native;
pub mod precompiles;
pub mod registry;
pub mod reserved;
pub mod types;
pub mod gas;

pub use error::{ContractError, Result};
pub use evmhost::{EvmHost, EvmOutcome, TxContext};
pub use native::erc20::NativeErc20;
pub use registry::ContractRegistry;
pub use types::{CallKind, ContractKind, ContractRecord, Log, NativeTypeTag};
