use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("secp256k1 error: {0}")]
    Secp256k1(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature length: expected 64 or 65, got {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
