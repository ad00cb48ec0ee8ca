//! The standard Ethereum call ABI: a 4-byte selector followed by
//! head/tail encoding with 32-byte-aligned slots for static types and
//! length-prefixed tails for dynamic types. Must round-trip exactly with
//! third-party EVM bytecode, so this follows the Solidity ABI spec to the
//! byte rather than inventing a simplified wire format.

use crate::error::{CodecError, Result};
use chain_crypto::{keccak256, Address};
use revm_primitives::U256;

pub const WORD: usize = 32;

/// The 4-byte selector identifying a contract call's target function:
/// the first 4 bytes of `keccak256("name(type1,type2,...)")`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Uint256,
    Address,
    Bool,
    Bytes,
    String,
    Array(Box<AbiType>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint256(U256),
    Address(Address),
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    fn is_dynamic(&self) -> bool {
        matches!(self, AbiValue::Bytes(_) | AbiValue::String(_) | AbiValue::Array(_))
    }

    fn encode_static(&self) -> [u8; WORD] {
        let mut word = [0u8; WORD];
        match self {
            AbiValue::Uint256(v) => word = v.to_be_bytes(),
            AbiValue::Address(a) => word[12..].copy_from_slice(a.as_bytes()),
            AbiValue::Bool(b) => word[31] = *b as u8,
            _ => unreachable!("encode_static called on a dynamic value"),
        }
        word
    }

    /// The bytes this value contributes to the tail region when dynamic:
    /// a length word followed by the (padded) payload.
    fn encode_tail(&self) -> Vec<u8> {
        match self {
            AbiValue::Bytes(data) => encode_length_prefixed(data),
            AbiValue::String(s) => encode_length_prefixed(s.as_bytes()),
            AbiValue::Array(items) => {
                let mut out = pad_left_u256(U256::from(items.len() as u64)).to_vec();
                out.extend_from_slice(&encode_params(items));
                out
            }
            _ => unreachable!("encode_tail called on a static value"),
        }
    }
}

fn pad_left_u256(v: U256) -> [u8; WORD] {
    v.to_be_bytes()
}

fn encode_length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut out = pad_left_u256(U256::from(data.len() as u64)).to_vec();
    out.extend_from_slice(data);
    let padding = (WORD - (data.len() % WORD)) % WORD;
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

/// Encode a list of already-typed values as the ABI argument block (no
/// selector prefix) — used both for calldata and for ABI-encoded event
/// data / return values.
pub fn encode_params(values: &[AbiValue]) -> Vec<u8> {
    let head_size = values.len() * WORD;
    let mut heads = Vec::with_capacity(head_size);
    let mut tails = Vec::new();
    let mut tail_offset = head_size;

    for v in values {
        if v.is_dynamic() {
            heads.extend_from_slice(&pad_left_u256(U256::from(tail_offset as u64)));
            let tail = v.encode_tail();
            tail_offset += tail.len();
            tails.extend_from_slice(&tail);
        } else {
            heads.extend_from_slice(&v.encode_static());
        }
    }

    let mut out = heads;
    out.extend_from_slice(&tails);
    out
}

/// Encode a full call: 4-byte selector followed by the ABI-encoded
/// arguments.
pub fn encode_call(selector: [u8; 4], values: &[AbiValue]) -> Vec<u8> {
    let mut out = selector.to_vec();
    out.extend_from_slice(&encode_params(values));
    out
}

/// Split `calldata` into its 4-byte selector and argument block.
pub fn split_selector(calldata: &[u8]) -> Result<([u8; 4], &[u8])> {
    if calldata.len() < 4 {
        return Err(CodecError::MissingSelector);
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&calldata[..4]);
    Ok((sel, &calldata[4..]))
}

/// Decode an argument block against the expected type list.
/// `decode(encode(x)) == x` for every supported type.
pub fn decode_params(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>> {
    let mut out = Vec::with_capacity(types.len());
    let mut head_cursor = 0usize;
    for ty in types {
        let word = read_word(data, head_cursor)?;
        head_cursor += WORD;
        out.push(decode_one(ty, data, &word)?);
    }
    Ok(out)
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; WORD]> {
    if data.len() < at + WORD {
        return Err(CodecError::BufferTooShort { need: at + WORD, got: data.len() });
    }
    let mut w = [0u8; WORD];
    w.copy_from_slice(&data[at..at + WORD]);
    Ok(w)
}

fn decode_one(ty: &AbiType, data: &[u8], head_word: &[u8; WORD]) -> Result<AbiValue> {
    match ty {
        AbiType::Uint256 => Ok(AbiValue::Uint256(U256::from_be_bytes(*head_word))),
        AbiType::Address => Ok(AbiValue::Address(Address::from_slice(&head_word[12..]))),
        AbiType::Bool => Ok(AbiValue::Bool(head_word[31] != 0)),
        AbiType::Bytes => {
            let offset = U256::from_be_bytes(*head_word).to::<usize>();
            let (len, payload) = read_length_prefixed(data, offset)?;
            Ok(AbiValue::Bytes(payload[..len].to_vec()))
        }
        AbiType::String => {
            let offset = U256::from_be_bytes(*head_word).to::<usize>();
            let (len, payload) = read_length_prefixed(data, offset)?;
            let s = String::from_utf8(payload[..len].to_vec())
                .map_err(|e| CodecError::BadArgumentEncoding(e.to_string()))?;
            Ok(AbiValue::String(s))
        }
        AbiType::Array(elem_ty) => {
            let offset = U256::from_be_bytes(*head_word).to::<usize>();
            let len_word = read_word(data, offset)?;
            let len = U256::from_be_bytes(len_word).to::<usize>();
            let elems_data = &data[offset + WORD..];
            let types: Vec<AbiType> = std::iter::repeat(*elem_ty.clone()).take(len).collect();
            Ok(AbiValue::Array(decode_params(&types, elems_data)?))
        }
    }
}

fn read_length_prefixed(data: &[u8], offset: usize) -> Result<(usize, &[u8])> {
    let len_word = read_word(data, offset)?;
    let len = U256::from_be_bytes(len_word).to::<usize>();
    let payload_start = offset + WORD;
    if data.len() < payload_start + len {
        return Err(CodecError::BufferTooShort { need: payload_start + len, got: data.len() });
    }
    Ok((len, &data[payload_start..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_function() {
        // keccak256("transfer(address,uint256)")[..4] = 0xa9059cbb
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn roundtrip_static_values() {
        let values = vec![
            AbiValue::Uint256(U256::from(42u64)),
            AbiValue::Address(Address::new([1u8; 20])),
            AbiValue::Bool(true),
        ];
        let encoded = encode_params(&values);
        let decoded = decode_params(&[AbiType::Uint256, AbiType::Address, AbiType::Bool], &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn roundtrip_dynamic_bytes_and_string() {
        let values = vec![
            AbiValue::Bytes(vec![1, 2, 3, 4, 5]),
            AbiValue::String("hello world".to_string()),
        ];
        let encoded = encode_params(&values);
        let decoded = decode_params(&[AbiType::Bytes, AbiType::String], &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn roundtrip_array_of_uint256() {
        let values = vec![AbiValue::Array(vec![
            AbiValue::Uint256(U256::from(1u64)),
            AbiValue::Uint256(U256::from(2u64)),
            AbiValue::Uint256(U256::from(3u64)),
        ])];
        let encoded = encode_params(&values);
        let decoded = decode_params(&[AbiType::Array(Box::new(AbiType::Uint256))], &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn encoding_is_deterministic() {
        let values = vec![AbiValue::Uint256(U256::from(7u64))];
        assert_eq!(encode_params(&values), encode_params(&values));
    }

    #[test]
    fn transfer_call_matches_erc20_layout() {
        let sel = selector("transfer(address,uint256)");
        let call = encode_call(
            sel,
            &[AbiValue::Address(Address::new([0xAA; 20])), AbiValue::Uint256(U256::from(1_000_000_000u64))],
        );
        assert_eq!(call.len(), 4 + 32 + 32);
        let (got_sel, body) = split_selector(&call).unwrap();
        assert_eq!(got_sel, sel);
        let decoded = decode_params(&[AbiType::Address, AbiType::Uint256], body).unwrap();
        assert_eq!(decoded[1], AbiValue::Uint256(U256::from(1_000_000_000u64)));
    }
}
