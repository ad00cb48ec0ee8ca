//! Keccak-256, secp256k1 recoverable signatures and address derivation —
//! the L0 crypto primitives the rest of the execution core is built on.

mod address;
mod error;
mod hash;
pub mod rlp;
mod signature;

pub use address::Address;
pub use error::{CryptoError, Result};
pub use hash::{hash_pair, keccak256, Hash};
pub use signature::{recover_address, recover_public_key, verify_address, KeyPair, Signature};
