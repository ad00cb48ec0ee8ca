//! TypedCodec (L1): the two encodings the execution core depends on —
//! big-endian fixed-width storage keys, and the Ethereum call ABI used by
//! both native and EVM contracts.

pub mod abi;
pub mod error;
pub mod storage;

pub use error::{CodecError, Result};
