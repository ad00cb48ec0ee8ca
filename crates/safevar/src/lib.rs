//! SafeVar (L1): transactional overlay wrapper for native-contract
//! persistent fields. A contract's state lives in `SafeVar<T>` fields;
//! writes land in a per-field overlay until the owning call frame
//! commits or reverts, which is how the executor gets atomic native
//! contract calls without a full state snapshot per field.

pub mod error;
mod safevar;

pub use error::{Result, SafeVarError};
pub use safevar::{NativeContract, SafeField, SafeMap, SafeVar};
