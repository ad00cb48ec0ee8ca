use crate::address::Address;
use crate::error::{CryptoError, Result};
use crate::hash::Hash;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, Secp256k1, SecretKey,
};
use zeroize::Zeroize;

/// A recoverable secp256k1 signature in compact `r ++ s` form plus a
/// recovery id, the form the wire transaction carries as `(v, r, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl Signature {
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }
}

/// Signing key pair. The secret scalar is overwritten with a dummy value
/// on drop so it does not linger in freed memory.
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let dummy = [0x01u8; 32];
        if let Ok(dummy_key) = SecretKey::from_slice(&dummy) {
            self.secret_key = dummy_key;
        }
        let mut bytes = self.secret_key.secret_bytes();
        bytes.zeroize();
    }
}

impl KeyPair {
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::rngs::OsRng);
        Self { secret_key, public_key }
    }

    pub fn from_secret(bytes: &[u8; 32]) -> Result<Self> {
        let secret_key =
            SecretKey::from_slice(bytes).map_err(|e| CryptoError::Secp256k1(e.to_string()))?;
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self { secret_key, public_key })
    }

    pub fn address(&self) -> Address {
        let uncompressed = self.public_key.serialize_uncompressed();
        Address::from_public_key(&uncompressed).expect("valid uncompressed key")
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.serialize_uncompressed().to_vec()
    }

    /// Sign a 32-byte digest, normalizing to low-S (BIP-62) to reject the
    /// `(r, n-s)` malleable counterpart of every valid signature.
    pub fn sign(&self, digest: &Hash) -> Result<Signature> {
        let secp = Secp256k1::new();
        let message =
            Message::from_digest_slice(digest).map_err(|e| CryptoError::Secp256k1(e.to_string()))?;
        let recoverable = secp.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = recoverable.serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Ok(Signature { r, s, recovery_id: recovery_id.to_i32() as u8 })
    }
}

/// Recover the public key that produced `signature` over `digest`.
pub fn recover_public_key(digest: &Hash, signature: &Signature) -> Result<PublicKey> {
    let secp = Secp256k1::new();
    let message =
        Message::from_digest_slice(digest).map_err(|e| CryptoError::Secp256k1(e.to_string()))?;
    let recovery_id = RecoveryId::from_i32(signature.recovery_id as i32)
        .map_err(|_| CryptoError::InvalidRecoveryId(signature.recovery_id))?;
    let recoverable = RecoverableSignature::from_compact(&signature.to_compact(), recovery_id)
        .map_err(|e| CryptoError::Secp256k1(e.to_string()))?;
    secp.recover_ecdsa(&message, &recoverable)
        .map_err(|e| CryptoError::Secp256k1(e.to_string()))
}

/// Recover the 20-byte address behind a signature over `digest`. This is
/// the ecrecover-precompile equivalent and the path every `Transaction`
/// uses to obtain its trusted `from` field — `from` is never read off the
/// wire directly.
pub fn recover_address(digest: &Hash, signature: &Signature) -> Result<Address> {
    let pubkey = recover_public_key(digest, signature)?;
    Address::from_public_key(&pubkey.serialize_uncompressed())
}

/// Verify a non-recoverable-style check: does `signature` over `digest`
/// match `expected`? Used by contract code paths that only need a
/// yes/no answer (e.g. the ecrecover precompile callers in EVM contracts).
pub fn verify_address(digest: &Hash, signature: &Signature, expected: &Address) -> bool {
    matches!(recover_address(digest, signature), Ok(addr) if &addr == expected)
}
