use sha3::{Digest, Keccak256};

/// 32-byte opaque digest used throughout the core for tx hashes, code
/// hashes and storage keys.
pub type Hash = [u8; 32];

/// Keccak-256, the only hash function the EVM and the chain's own wire
/// formats agree on.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Hash two children into a Merkle parent using a domain-separated leaf
/// tag, matching the second-preimage-resistant convention used for the
/// account-state root in `chain-account`.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(left);
    buf.extend_from_slice(right);
    keccak256(&buf)
}
