//! Storage encoding: big-endian fixed-width integers and raw bytes for
//! addresses/hashes, chosen so numeric keys sort lexicographically in a
//! `scanPrefix` the way `luxtensor-storage::db`'s `height.to_be_bytes()`
//! index key does.

use chain_crypto::{Address, Hash};
use revm_primitives::U256;

pub fn encode_u8(v: u8) -> [u8; 1] {
    [v]
}

pub fn decode_u8(bytes: &[u8]) -> u8 {
    bytes[0]
}

pub fn encode_u64(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

pub fn decode_u64(bytes: &[u8; 8]) -> u64 {
    u64::from_be_bytes(*bytes)
}

pub fn encode_u256(v: U256) -> [u8; 32] {
    v.to_be_bytes()
}

pub fn decode_u256(bytes: &[u8; 32]) -> U256 {
    U256::from_be_bytes(*bytes)
}

pub fn encode_address(addr: &Address) -> [u8; 20] {
    *addr.as_bytes()
}

pub fn decode_address(bytes: &[u8; 20]) -> Address {
    Address::new(*bytes)
}

pub fn encode_hash(hash: &Hash) -> [u8; 32] {
    *hash
}

pub fn decode_hash(bytes: &[u8; 32]) -> Hash {
    *bytes
}
