//! Minimal RLP encoding — only the subset needed for CREATE address
//! derivation and EIP-155 transaction signing (`rlp([sender, nonce])` and
//! the transaction field list). Adapted from the teacher's
//! `luxtensor-core::rlp` helpers.

fn to_minimal_be(val: u64) -> Vec<u8> {
    if val == 0 {
        return vec![];
    }
    let full = val.to_be_bytes();
    let start = full.iter().position(|&b| b != 0).unwrap_or(7);
    full[start..].to_vec()
}

pub fn rlp_encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] <= 0x7f {
        return data.to_vec();
    }
    if data.is_empty() {
        return vec![0x80];
    }
    if data.len() <= 55 {
        let mut out = vec![0x80 + data.len() as u8];
        out.extend_from_slice(data);
        out
    } else {
        let len_bytes = to_minimal_be(data.len() as u64);
        let mut out = vec![0xb7 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(data);
        out
    }
}

pub fn rlp_encode_u64(val: u64) -> Vec<u8> {
    if val == 0 {
        return vec![0x80];
    }
    rlp_encode_bytes(&to_minimal_be(val))
}

pub fn rlp_encode_u128(val: u128) -> Vec<u8> {
    if val == 0 {
        return vec![0x80];
    }
    let full = val.to_be_bytes();
    let start = full.iter().position(|&b| b != 0).unwrap_or(16);
    rlp_encode_bytes(&full[start..])
}

pub fn rlp_encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.iter().flat_map(|i| i.iter().copied()).collect();
    if payload.len() <= 55 {
        let mut out = vec![0xc0 + payload.len() as u8];
        out.extend_from_slice(&payload);
        out
    } else {
        let len_bytes = to_minimal_be(payload.len() as u64);
        let mut out = vec![0xf7 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(&payload);
        out
    }
}
