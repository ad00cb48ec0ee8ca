use chain_crypto::{keccak256, recover_address, rlp, Address, Hash, Signature};
use revm_primitives::U256;

use crate::error::{ExecError, Result};

fn rlp_encode_u256(v: U256) -> Vec<u8> {
    let bytes = v.to_be_bytes::<32>();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(32);
    rlp::rlp_encode_bytes(&bytes[start..])
}

/// A signed call: `from` is never trusted off the wire, only recovered
/// from `signature` over the signing digest.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
    pub data: Vec<u8>,
    pub chain_id: u64,
    pub signature: Signature,
}

impl Transaction {
    fn field_list(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::rlp_encode_u64(self.nonce),
            rlp::rlp_encode_u128(self.gas_price),
            rlp::rlp_encode_u64(self.gas_limit),
            rlp::rlp_encode_bytes(self.to.map(|a| *a.as_bytes()).unwrap_or([0u8; 20]).as_slice()),
            rlp_encode_u256(self.value),
            rlp::rlp_encode_bytes(&self.data),
            rlp::rlp_encode_u64(self.chain_id),
        ]
    }

    /// The digest actually signed: the field list RLP-encoded with the
    /// chain id mixed in, so a signature from one chain can't replay on
    /// another (EIP-155 style).
    pub fn signing_digest(&self) -> Hash {
        keccak256(&rlp::rlp_encode_list(&self.field_list()))
    }

    /// The transaction's identity hash: the signing digest plus the
    /// signature itself, so two transactions with identical fields but
    /// different signers still hash differently.
    pub fn hash(&self) -> Hash {
        let mut fields = self.field_list();
        fields.push(rlp::rlp_encode_bytes(&self.signature.r));
        fields.push(rlp::rlp_encode_bytes(&self.signature.s));
        fields.push(rlp::rlp_encode_u64(self.signature.recovery_id as u64));
        keccak256(&rlp::rlp_encode_list(&fields))
    }

    pub fn sender(&self) -> Result<Address> {
        recover_address(&self.signing_digest(), &self.signature).map_err(|_| ExecError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    fn signed(keypair: &KeyPair, nonce: u64, to: Option<Address>, value: U256) -> Transaction {
        let mut tx = Transaction {
            to,
            value,
            gas_limit: 21_000,
            gas_price: 1,
            nonce,
            data: vec![],
            chain_id: 1337,
            signature: Signature { r: [0; 32], s: [0; 32], recovery_id: 0 },
        };
        let digest = tx.signing_digest();
        tx.signature = keypair.sign(&digest).unwrap();
        tx
    }

    #[test]
    fn sender_recovers_signer_address() {
        let keypair = KeyPair::generate();
        let tx = signed(&keypair, 0, Some(Address::new([9u8; 20])), U256::from(1u64));
        assert_eq!(tx.sender().unwrap(), keypair.address());
    }

    #[test]
    fn different_nonces_produce_different_hashes() {
        let keypair = KeyPair::generate();
        let a = signed(&keypair, 0, None, U256::ZERO);
        let b = signed(&keypair, 1, None, U256::ZERO);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn tampering_with_value_invalidates_sender_recovery() {
        let keypair = KeyPair::generate();
        let mut tx = signed(&keypair, 0, None, U256::from(100u64));
        tx.value = U256::from(999u64);
        assert_ne!(tx.sender().unwrap(), keypair.address());
    }
}
