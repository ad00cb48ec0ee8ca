//! Fixed-address pseudo-contracts evaluated in-process rather than as
//! bytecode: ecrecover, keccak, abi-pack-hash, deterministic random.

use chain_crypto::{keccak256, recover_address, Signature};

use crate::error::Result;

/// Standard ecrecover layout: `hash(32) || v(32) || r(32) || s(32)`.
/// Returns the signer's address left-padded to 32 bytes, or all zero
/// bytes if the signature does not recover (never errors — this
/// matches how the real ecrecover precompile fails silently).
pub fn ecrecover(input: &[u8]) -> Vec<u8> {
    if input.len() < 128 {
        return vec![0u8; 32];
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&input[0..32]);
    let v = input[63];
    let recovery_id = match v {
        27 => 0u8,
        28 => 1u8,
        0 | 1 => v,
        _ => return vec![0u8; 32],
    };
    let mut r = [0u8; 32];
    r.copy_from_slice(&input[64..96]);
    let mut s = [0u8; 32];
    s.copy_from_slice(&input[96..128]);
    let signature = Signature { r, s, recovery_id };

    match recover_address(&digest, &signature) {
        Ok(addr) => {
            let mut out = vec![0u8; 32];
            out[12..].copy_from_slice(addr.as_bytes());
            out
        }
        Err(_) => vec![0u8; 32],
    }
}

/// `keccak256(input)`.
pub fn keccak(input: &[u8]) -> Vec<u8> {
    keccak256(input).to_vec()
}

/// Hashes already tightly-packed bytes the caller assembled (as
/// opposed to the standard head/tail ABI encoding) — used for leaf and
/// commitment hashes where Solidity's `abi.encodePacked` convention
/// applies. Distinct gas entry from plain `keccak`, same digest.
pub fn abi_pack_hash(input: &[u8]) -> Vec<u8> {
    keccak256(input).to_vec()
}

/// A value deterministic in its input, suitable for on-chain use where
/// every validator must compute the same output: callers are expected
/// to supply reproducible entropy (block hash, tx hash, a nonce) as
/// `input` rather than relying on this precompile for entropy itself.
pub fn deterministic_random(input: &[u8]) -> Vec<u8> {
    let mut buf = input.to_vec();
    buf.extend_from_slice(b"chain-deterministic-random");
    keccak256(&buf).to_vec()
}

/// Routes a call to the precompile at `addr`, if any.
pub fn dispatch(addr: chain_crypto::Address, input: &[u8]) -> Option<Result<Vec<u8>>> {
    use crate::reserved;
    if addr == reserved::ecrecover_precompile() {
        Some(Ok(ecrecover(input)))
    } else if addr == reserved::keccak_precompile() {
        Some(Ok(keccak(input)))
    } else if addr == reserved::abi_pack_hash_precompile() {
        Some(Ok(abi_pack_hash(input)))
    } else if addr == reserved::deterministic_random_precompile() {
        Some(Ok(deterministic_random(input)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_crypto::KeyPair;

    #[test]
    fn ecrecover_recovers_known_signer() {
        let keypair = KeyPair::generate();
        let digest = keccak256(b"message");
        let sig = keypair.sign(&digest).unwrap();

        let mut input = vec![0u8; 128];
        input[0..32].copy_from_slice(&digest);
        input[63] = 27 + sig.recovery_id;
        input[64..96].copy_from_slice(&sig.r);
        input[96..128].copy_from_slice(&sig.s);

        let out = ecrecover(&input);
        assert_eq!(&out[12..], keypair.address().as_bytes());
    }

    #[test]
    fn ecrecover_on_garbage_returns_zero() {
        let input = vec![0u8; 128];
        assert_eq!(ecrecover(&input), vec![0u8; 32]);
    }

    #[test]
    fn keccak_matches_direct_hash() {
        assert_eq!(keccak(b"abc"), keccak256(b"abc").to_vec());
    }

    #[test]
    fn deterministic_random_is_a_function_of_input_only() {
        assert_eq!(deterministic_random(b"seed"), deterministic_random(b"seed"));
        assert_ne!(deterministic_random(b"seed"), keccak(b"seed"));
    }
}
