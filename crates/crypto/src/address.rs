use crate::hash::{keccak256, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account/contract identifier, derived from a public key or a
/// create operation — never constructed from untrusted wire bytes without
/// going through [`Address::from_public_key`] or a create derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn zero() -> Self {
        Self([0u8; 20])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn from_slice(slice: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&slice[..20]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive an address from an uncompressed secp256k1 public key
    /// (65 bytes, `0x04` prefix): last 20 bytes of `keccak256(pubkey[1..])`.
    pub fn from_public_key(public_key: &[u8]) -> crate::Result<Self> {
        if public_key.len() != 65 || public_key[0] != 0x04 {
            return Err(crate::CryptoError::InvalidPublicKey);
        }
        let hash = keccak256(&public_key[1..]);
        Ok(Self::from_slice(&hash[12..]))
    }

    /// CREATE address: `keccak256(rlp(sender, nonce))[12..]`.
    pub fn derive_create(sender: &Address, nonce: u64) -> Self {
        let encoded = crate::rlp::rlp_encode_list(&[
            crate::rlp::rlp_encode_bytes(sender.as_bytes()),
            crate::rlp::rlp_encode_u64(nonce),
        ]);
        Self::from_slice(&keccak256(&encoded)[12..])
    }

    /// CREATE2 address: `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`.
    pub fn derive_create2(sender: &Address, salt: &Hash, init_code: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
        buf.push(0xff);
        buf.extend_from_slice(sender.as_bytes());
        buf.extend_from_slice(salt);
        buf.extend_from_slice(&keccak256(init_code));
        Self::from_slice(&keccak256(&buf)[12..])
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
