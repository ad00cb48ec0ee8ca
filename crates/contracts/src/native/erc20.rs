//! A standard fungible token implemented as a native contract: every
//! balance and allowance is a `SafeVar`, so a failed call leaves no
//! partial transfer behind even though nothing here touches the EVM.

use std::collections::HashMap;

use chain_codec::abi::{self, AbiType, AbiValue};
use chain_crypto::Address;
use chain_safevar::{NativeContract, SafeField, SafeMap, SafeVar};
use revm_primitives::U256;

use crate::error::{ContractError, Result};
use crate::types::Log;

pub struct NativeErc20 {
    pub name: SafeVar<String>,
    pub symbol: SafeVar<String>,
    pub decimals: SafeVar<u8>,
    pub total_supply: SafeVar<U256>,
    pub balances: SafeMap<Address, U256>,
    pub allowances: SafeMap<(Address, Address), U256>,
}

impl NativeContract for NativeErc20 {
    fn fields(&self) -> Vec<&dyn SafeField> {
        vec![
            &self.name,
            &self.symbol,
            &self.decimals,
            &self.total_supply,
            &self.balances,
            &self.allowances,
        ]
    }
}

fn transfer_event_topic() -> chain_crypto::Hash {
    chain_crypto::keccak256(b"Transfer(address,address,uint256)")
}

fn approval_event_topic() -> chain_crypto::Hash {
    chain_crypto::keccak256(b"Approval(address,address,uint256)")
}

impl NativeErc20 {
    pub fn new(name: String, symbol: String, decimals: u8, mint_to: Address, initial_supply: U256) -> Self {
        let mut balances = HashMap::new();
        balances.insert(mint_to, initial_supply);
        Self {
            name: SafeVar::new(name),
            symbol: SafeVar::new(symbol),
            decimals: SafeVar::new(decimals),
            total_supply: SafeVar::new(initial_supply),
            balances: SafeVar::new(balances),
            allowances: SafeVar::new(HashMap::new()),
        }
    }

    pub(crate) fn balance_of(&self, addr: Address) -> U256 {
        self.balances.map_get(&addr).unwrap_or(U256::ZERO)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.map_get(&(owner, spender)).unwrap_or(U256::ZERO)
    }

    fn move_balance(&self, from: Address, to: Address, amount: U256) -> Result<()> {
        let from_balance = self.balance_of(from);
        let next_from = from_balance
            .checked_sub(amount)
            .ok_or_else(|| ContractError::Revert(b"ERC20: transfer amount exceeds balance".to_vec()))?;
        let next_to = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| ContractError::Revert(b"ERC20: balance overflow".to_vec()))?;
        self.balances.map_insert(from, next_from);
        self.balances.map_insert(to, next_to);
        Ok(())
    }

    /// Dispatches one ABI-encoded call. `is_static` rejects any
    /// selector from the mutating table before it runs, matching the
    /// registry's view/mutating split for EVM `staticcall` parity.
    pub fn dispatch(&self, caller: Address, selector: [u8; 4], args: &[u8], is_static: bool) -> Result<(Vec<u8>, Vec<Log>)> {
        match selector {
            s if s == abi::selector("name()") => Ok((encode_string(self.name.get()), vec![])),
            s if s == abi::selector("symbol()") => Ok((encode_string(self.symbol.get()), vec![])),
            s if s == abi::selector("decimals()") => Ok((encode_u256(U256::from(self.decimals.get())), vec![])),
            s if s == abi::selector("totalSupply()") => Ok((encode_u256(self.total_supply.get()), vec![])),
            s if s == abi::selector("balanceOf(address)") => {
                let values = abi::decode_params(&[AbiType::Address], args)?;
                let addr = expect_address(&values[0])?;
                Ok((encode_u256(self.balance_of(addr)), vec![]))
            }
            s if s == abi::selector("allowance(address,address)") => {
                let values = abi::decode_params(&[AbiType::Address, AbiType::Address], args)?;
                let owner = expect_address(&values[0])?;
                let spender = expect_address(&values[1])?;
                Ok((encode_u256(self.allowance(owner, spender)), vec![]))
            }
            s if s == abi::selector("mint(address,uint256)") => {
                reject_static(is_static)?;
                let values = abi::decode_params(&[AbiType::Address, AbiType::Uint256], args)?;
                let to = expect_address(&values[0])?;
                let amount = expect_uint256(&values[1])?;
                // No access control — this core has no privileged-caller
                // concept yet, so mint is open. Exists to exercise the
                // SafeVar overflow-rejection path end to end.
                self.total_supply.checked_add(amount)?;
                let next_balance = self
                    .balance_of(to)
                    .checked_add(amount)
                    .ok_or_else(|| ContractError::Revert(b"ERC20: balance overflow".to_vec()))?;
                self.balances.map_insert(to, next_balance);
                let log = Log {
                    emitter: Address::zero(),
                    topics: vec![transfer_event_topic(), addr_topic(Address::zero()), addr_topic(to)],
                    data: encode_u256(amount),
                };
                Ok((encode_bool(true), vec![log]))
            }
            s if s == abi::selector("transfer(address,uint256)") => {
                reject_static(is_static)?;
                let values = abi::decode_params(&[AbiType::Address, AbiType::Uint256], args)?;
                let to = expect_address(&values[0])?;
                let amount = expect_uint256(&values[1])?;
                self.move_balance(caller, to, amount)?;
                let log = Log {
                    emitter: Address::zero(),
                    topics: vec![transfer_event_topic(), addr_topic(caller), addr_topic(to)],
                    data: encode_u256(amount),
                };
                Ok((encode_bool(true), vec![log]))
            }
            s if s == abi::selector("approve(address,uint256)") => {
                reject_static(is_static)?;
                let values = abi::decode_params(&[AbiType::Address, AbiType::Uint256], args)?;
                let spender = expect_address(&values[0])?;
                let amount = expect_uint256(&values[1])?;
                self.allowances.map_insert((caller, spender), amount);
                let log = Log {
                    emitter: Address::zero(),
                    topics: vec![approval_event_topic(), addr_topic(caller), addr_topic(spender)],
                    data: encode_u256(amount),
                };
                Ok((encode_bool(true), vec![log]))
            }
            s if s == abi::selector("transferFrom(address,address,uint256)") => {
                reject_static(is_static)?;
                let values =
                    abi::decode_params(&[AbiType::Address, AbiType::Address, AbiType::Uint256], args)?;
                let from = expect_address(&values[0])?;
                let to = expect_address(&values[1])?;
                let amount = expect_uint256(&values[2])?;
                let remaining = self.allowance(from, caller);
                let next_remaining = remaining
                    .checked_sub(amount)
                    .ok_or_else(|| ContractError::Revert(b"ERC20: insufficient allowance".to_vec()))?;
                self.allowances.map_insert((from, caller), next_remaining);
                self.move_balance(from, to, amount)?;
                let log = Log {
                    emitter: Address::zero(),
                    topics: vec![transfer_event_topic(), addr_topic(from), addr_topic(to)],
                    data: encode_u256(amount),
                };
                Ok((encode_bool(true), vec![log]))
            }
            other => Err(ContractError::SelectorNotFound(u32::from_be_bytes(other))),
        }
    }
}

impl NativeErc20 {
    /// Serializes every field to a flat byte blob for the single
    /// `b"state"` field-tag entry under this contract's `0x0006 ‖ addr`
    /// prefix range. Manual framing, not bincode — keeps the on-disk
    /// format identical to the big-endian fixed-width storage encoding
    /// the rest of the core uses for numeric keys.
    pub fn dump(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_string(&mut out, &self.name.get());
        write_string(&mut out, &self.symbol.get());
        out.push(self.decimals.get());
        out.extend_from_slice(&chain_codec::storage::encode_u256(self.total_supply.get()));

        let balances = self.balances.get();
        out.extend_from_slice(&(balances.len() as u64).to_be_bytes());
        for (addr, amount) in &balances {
            out.extend_from_slice(addr.as_bytes());
            out.extend_from_slice(&chain_codec::storage::encode_u256(*amount));
        }

        let allowances = self.allowances.get();
        out.extend_from_slice(&(allowances.len() as u64).to_be_bytes());
        for ((owner, spender), amount) in &allowances {
            out.extend_from_slice(owner.as_bytes());
            out.extend_from_slice(spender.as_bytes());
            out.extend_from_slice(&chain_codec::storage::encode_u256(*amount));
        }
        out
    }

    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut cursor = 0usize;
        let name = read_string(bytes, &mut cursor)?;
        let symbol = read_string(bytes, &mut cursor)?;
        let decimals = *bytes.get(cursor).ok_or_else(too_short)?;
        cursor += 1;
        let total_supply = read_u256(bytes, &mut cursor)?;

        let balance_count = read_u64(bytes, &mut cursor)?;
        let mut balances = HashMap::with_capacity(balance_count as usize);
        for _ in 0..balance_count {
            let addr = read_address(bytes, &mut cursor)?;
            let amount = read_u256(bytes, &mut cursor)?;
            balances.insert(addr, amount);
        }

        let allowance_count = read_u64(bytes, &mut cursor)?;
        let mut allowances = HashMap::with_capacity(allowance_count as usize);
        for _ in 0..allowance_count {
            let owner = read_address(bytes, &mut cursor)?;
            let spender = read_address(bytes, &mut cursor)?;
            let amount = read_u256(bytes, &mut cursor)?;
            allowances.insert((owner, spender), amount);
        }

        Ok(Self {
            name: SafeVar::new(name),
            symbol: SafeVar::new(symbol),
            decimals: SafeVar::new(decimals),
            total_supply: SafeVar::new(total_supply),
            balances: SafeVar::new(balances),
            allowances: SafeVar::new(allowances),
        })
    }
}

fn too_short() -> ContractError {
    ContractError::BadArgumentEncoding("truncated native contract state blob".into())
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn read_string(bytes: &[u8], cursor: &mut usize) -> Result<String> {
    let len = read_u32(bytes, cursor)? as usize;
    let end = *cursor + len;
    let s = bytes.get(*cursor..end).ok_or_else(too_short)?;
    *cursor = end;
    String::from_utf8(s.to_vec()).map_err(|e| ContractError::BadArgumentEncoding(e.to_string()))
}

fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32> {
    let end = *cursor + 4;
    let slice = bytes.get(*cursor..end).ok_or_else(too_short)?;
    *cursor = end;
    Ok(u32::from_be_bytes(slice.try_into().unwrap()))
}

fn read_u64(bytes: &[u8], cursor: &mut usize) -> Result<u64> {
    let end = *cursor + 8;
    let slice = bytes.get(*cursor..end).ok_or_else(too_short)?;
    *cursor = end;
    Ok(u64::from_be_bytes(slice.try_into().unwrap()))
}

fn read_u256(bytes: &[u8], cursor: &mut usize) -> Result<U256> {
    let end = *cursor + 32;
    let slice = bytes.get(*cursor..end).ok_or_else(too_short)?;
    *cursor = end;
    let arr: [u8; 32] = slice.try_into().unwrap();
    Ok(chain_codec::storage::decode_u256(&arr))
}

fn read_address(bytes: &[u8], cursor: &mut usize) -> Result<Address> {
    let end = *cursor + 20;
    let slice = bytes.get(*cursor..end).ok_or_else(too_short)?;
    *cursor = end;
    Ok(Address::from_slice(slice))
}

fn reject_static(is_static: bool) -> Result<()> {
    if is_static {
        Err(ContractError::StaticCallStateChange)
    } else {
        Ok(())
    }
}

fn addr_topic(addr: Address) -> chain_crypto::Hash {
    let mut topic = [0u8; 32];
    topic[12..].copy_from_slice(addr.as_bytes());
    topic
}

fn expect_address(v: &AbiValue) -> Result<Address> {
    match v {
        AbiValue::Address(a) => Ok(*a),
        _ => Err(ContractError::BadArgumentEncoding("expected address".into())),
    }
}

fn expect_uint256(v: &AbiValue) -> Result<U256> {
    match v {
        AbiValue::Uint256(u) => Ok(*u),
        _ => Err(ContractError::BadArgumentEncoding("expected uint256".into())),
    }
}

fn encode_u256(v: U256) -> Vec<u8> {
    abi::encode_params(&[AbiValue::Uint256(v)])
}

fn encode_bool(v: bool) -> Vec<u8> {
    abi::encode_params(&[AbiValue::Bool(v)])
}

fn encode_string(v: String) -> Vec<u8> {
    abi::encode_params(&[AbiValue::String(v)])
}
