use chain_codec::storage;
use chain_crypto::Hash;
use revm_primitives::U256;

/// A fixed-width snapshot of one address's top-level state. An account
/// with zero balance, zero nonce, and no code is indistinguishable from
/// one that was never touched — `AccountStore` decides existence, this
/// type just carries the fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub code_hash: Hash,
    pub code: Vec<u8>,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: U256) -> Self {
        Self { balance, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code.is_empty()
    }

    /// 40-byte record: nonce (8) || balance (32). Code and code_hash are
    /// stored separately since they're large and immutable after
    /// contract creation — every balance/nonce write would otherwise
    /// rewrite the whole code blob.
    pub(crate) fn encode_header(&self) -> [u8; 40] {
        let mut out = [0u8; 40];
        out[..8].copy_from_slice(&storage::encode_u64(self.nonce));
        out[8..40].copy_from_slice(&storage::encode_u256(self.balance));
        out
    }

    pub(crate) fn decode_header(bytes: &[u8; 40]) -> (u64, U256) {
        let mut nonce_bytes = [0u8; 8];
        nonce_bytes.copy_from_slice(&bytes[..8]);
        let mut balance_bytes = [0u8; 32];
        balance_bytes.copy_from_slice(&bytes[8..40]);
        (storage::decode_u64(&nonce_bytes), storage::decode_u256(&balance_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrips() {
        let a = Account { nonce: 7, balance: U256::from(12345u64), ..Account::new() };
        let (nonce, balance) = Account::decode_header(&a.encode_header());
        assert_eq!(nonce, 7);
        assert_eq!(balance, U256::from(12345u64));
    }

    #[test]
    fn fresh_account_is_empty() {
        assert!(Account::new().is_empty());
    }

    #[test]
    fn funded_account_is_not_empty() {
        assert!(!Account::with_balance(U256::from(1u64)).is_empty());
    }
}
