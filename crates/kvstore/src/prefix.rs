//! The reserved key-prefix table. This is the single source of truth for
//! where every logical table lives inside the one physical KVStore —
//! nothing outside this module should hard-code a prefix byte string.

/// Block headers/bodies by height.
pub const BLOCKS: [u8; 2] = [0x00, 0x01];
/// Block-hash -> height map.
pub const BLOCK_HASH_INDEX: [u8; 2] = [0x00, 0x02];
/// Accounts (balance + nonce).
pub const ACCOUNTS: [u8; 2] = [0x00, 0x03];
/// Tx-hash -> block-location index.
pub const TX_INDEX: [u8; 2] = [0x00, 0x04];
/// Consensus (validator set, signatures) — external collaborator's table;
/// reserved here so its prefix never collides with the core's.
pub const CONSENSUS: [u8; 2] = [0x00, 0x05];
/// Contract state, sub-keyed `CONTRACT_STATE ++ addr(20) ++ field-tag ++ subkey`.
pub const CONTRACT_STATE: [u8; 2] = [0x00, 0x06];
/// Contract registry: addr -> type tag.
pub const CONTRACT_REGISTRY: [u8; 2] = [0x00, 0x07];
/// Event/log archive.
pub const EVENTS: [u8; 2] = [0x00, 0x08];
/// EVM account storage: `EVM_STORAGE ++ addr(20) ++ key(32) -> value(32)`.
pub const EVM_STORAGE: [u8; 2] = [0x00, 0x09];

/// Concatenate a reserved prefix with a caller-supplied key suffix.
pub fn key(prefix: [u8; 2], suffix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + suffix.len());
    out.extend_from_slice(&prefix);
    out.extend_from_slice(suffix);
    out
}
