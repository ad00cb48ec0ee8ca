//! Gas schedule for native contract calls. The source left this
//! unspecified beyond "native calls consume gas"; this schedule keeps
//! native and EVM accounting on the same footing — a fixed dispatch
//! cost plus a linear charge for calldata and for each persistent
//! write — without pretending to reproduce EVM opcode-level costs for
//! code that never runs the interpreter.

use chain_crypto::Address;

use crate::reserved;

pub const BASE_CALL_GAS: u64 = 21_000;
pub const PER_CALLDATA_BYTE_GAS: u64 = 16;
pub const PER_SAFEVAR_WRITE_GAS: u64 = 5_000;

pub const ECRECOVER_PRECOMPILE_GAS: u64 = 3_000;
pub const KECCAK_PRECOMPILE_BASE_GAS: u64 = 30;
pub const KECCAK_PRECOMPILE_PER_WORD_GAS: u64 = 6;
pub const ABI_PACK_HASH_PRECOMPILE_GAS: u64 = 100;
pub const DETERMINISTIC_RANDOM_PRECOMPILE_GAS: u64 = 200;

/// Gas charged for dispatching a native call before the handler runs,
/// not counting the persistent writes it performs.
pub fn dispatch_gas(calldata_len: usize) -> u64 {
    BASE_CALL_GAS + calldata_len as u64 * PER_CALLDATA_BYTE_GAS
}

/// Additional gas for `touched` SafeVar writes a call performed.
pub fn writes_gas(touched_fields: usize) -> u64 {
    touched_fields as u64 * PER_SAFEVAR_WRITE_GAS
}

pub fn keccak_precompile_gas(input_len: usize) -> u64 {
    let words = input_len.div_ceil(32) as u64;
    KECCAK_PRECOMPILE_BASE_GAS + words * KECCAK_PRECOMPILE_PER_WORD_GAS
}

/// Gas for a call landing on one of the fixed-address precompiles,
/// `None` if `addr` is not one of them — the caller falls back to
/// `dispatch_gas` for everything else.
pub fn precompile_gas(addr: Address, input_len: usize) -> Option<u64> {
    if addr == reserved::ecrecover_precompile() {
        Some(ECRECOVER_PRECOMPILE_GAS)
    } else if addr == reserved::keccak_precompile() {
        Some(keccak_precompile_gas(input_len))
    } else if addr == reserved::abi_pack_hash_precompile() {
        Some(ABI_PACK_HASH_PRECOMPILE_GAS)
    } else if addr == reserved::deterministic_random_precompile() {
        Some(DETERMINISTIC_RANDOM_PRECOMPILE_GAS)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precompile_gas_matches_each_reserved_address() {
        assert_eq!(precompile_gas(reserved::ecrecover_precompile(), 128), Some(ECRECOVER_PRECOMPILE_GAS));
        assert_eq!(precompile_gas(reserved::keccak_precompile(), 64), Some(keccak_precompile_gas(64)));
        assert_eq!(precompile_gas(reserved::abi_pack_hash_precompile(), 0), Some(ABI_PACK_HASH_PRECOMPILE_GAS));
        assert_eq!(precompile_gas(reserved::deterministic_random_precompile(), 0), Some(DETERMINISTIC_RANDOM_PRECOMPILE_GAS));
    }

    #[test]
    fn precompile_gas_is_none_for_an_ordinary_address() {
        assert_eq!(precompile_gas(reserved::contract_manager(), 0), None);
    }

    #[test]
    fn keccak_precompile_gas_scales_with_word_count() {
        assert_eq!(keccak_precompile_gas(0), KECCAK_PRECOMPILE_BASE_GAS);
        assert_eq!(keccak_precompile_gas(32), KECCAK_PRECOMPILE_BASE_GAS + KECCAK_PRECOMPILE_PER_WORD_GAS);
        assert_eq!(keccak_precompile_gas(33), KECCAK_PRECOMPILE_BASE_GAS + 2 * KECCAK_PRECOMPILE_PER_WORD_GAS);
    }

    #[test]
    fn writes_gas_scales_linearly_with_touched_fields() {
        assert_eq!(writes_gas(0), 0);
        assert_eq!(writes_gas(3), 3 * PER_SAFEVAR_WRITE_GAS);
    }
}
