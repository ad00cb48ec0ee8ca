//! Reserved protocol addresses — a compile-time constant table, not a
//! process-global singleton. `ContractRegistry` consults this table
//! before checking the native/EVM maps.

use chain_crypto::Address;

fn reserved(tag: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = tag;
    Address::new(bytes)
}

/// Matches the EVM convention of low, easy-to-remember precompile
/// addresses — ecrecover at `0x…01`, keccak at `0x…04` — so the chain's
/// custom precompiles slot in alongside the usual suspects rather than
/// colliding with them.
pub fn ecrecover_precompile() -> Address {
    reserved(0x01)
}

pub fn keccak_precompile() -> Address {
    reserved(0x04)
}

pub fn contract_manager() -> Address {
    reserved(0x10)
}

pub fn consensus() -> Address {
    reserved(0x11)
}

pub fn abi_pack_hash_precompile() -> Address {
    reserved(0x05)
}

pub fn deterministic_random_precompile() -> Address {
    reserved(0x06)
}

pub fn is_precompile(addr: Address) -> bool {
    addr == ecrecover_precompile()
        || addr == keccak_precompile()
        || addr == abi_pack_hash_precompile()
        || addr == deterministic_random_precompile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_addresses_are_distinct() {
        let all = [
            contract_manager(),
            consensus(),
            ecrecover_precompile(),
            keccak_precompile(),
            abi_pack_hash_precompile(),
            deterministic_random_precompile(),
        ];
        for i in 0..all.len() {
            for j in 0..all.len() {
                if i != j {
                    assert_ne!(all[i], all[j]);
                }
            }
        }
    }
}
