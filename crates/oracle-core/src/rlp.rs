//! Minimal RLP primitives shared by the header canonicalizer and the
//! proof bundle encoder.
//!
//! Trie nodes arrive from `eth_getProof` as raw RLP blobs; the verifier
//! contract expects them re-embedded as *decoded* structures inside one
//! outer list. [`RlpItem`] models that nested shape and round-trips it.

use alloy_primitives::U256;
use alloy_rlp::{Buf, Header as RlpHeader};
use thiserror::Error;

/// Errors from RLP item decoding.
#[derive(Debug, Error)]
pub enum RlpError {
    #[error("invalid RLP: {0}")]
    Decode(String),

    #[error("trailing bytes after RLP item")]
    TrailingBytes,
}

/// A fully decoded RLP value: either a byte string or a list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Decode a single RLP item consuming the whole input.
    pub fn decode(data: &[u8]) -> Result<Self, RlpError> {
        let mut buf = data;
        let item = Self::decode_one(&mut buf)?;
        if !buf.is_empty() {
            return Err(RlpError::TrailingBytes);
        }
        Ok(item)
    }

    fn decode_one(buf: &mut &[u8]) -> Result<Self, RlpError> {
        let header = RlpHeader::decode(buf).map_err(|e| RlpError::Decode(e.to_string()))?;

        if buf.len() < header.payload_length {
            return Err(RlpError::Decode("not enough data for payload".to_string()));
        }

        if header.list {
            let mut payload = &buf[..header.payload_length];
            buf.advance(header.payload_length);

            let mut items = Vec::new();
            while !payload.is_empty() {
                items.push(Self::decode_one(&mut payload)?);
            }
            Ok(RlpItem::List(items))
        } else {
            let bytes = buf[..header.payload_length].to_vec();
            buf.advance(header.payload_length);
            Ok(RlpItem::Bytes(bytes))
        }
    }

    /// RLP-encode this item.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RlpItem::Bytes(data) => out.extend_from_slice(&encode_bytes(data)),
            RlpItem::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    item.encode_into(&mut payload);
                }
                encode_list_header(out, payload.len());
                out.extend_from_slice(&payload);
            }
        }
    }
}

/// RLP-encode a byte string.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    if len == 1 && data[0] < 0x80 {
        vec![data[0]]
    } else if len <= 55 {
        let mut result = Vec::with_capacity(len + 1);
        #[allow(clippy::cast_possible_truncation)]
        result.push(0x80 + len as u8);
        result.extend_from_slice(data);
        result
    } else {
        let len_bytes = encode_length(len);
        let mut result = Vec::with_capacity(1 + len_bytes.len() + len);
        #[allow(clippy::cast_possible_truncation)]
        result.push(0xb7 + len_bytes.len() as u8);
        result.extend_from_slice(&len_bytes);
        result.extend_from_slice(data);
        result
    }
}

/// RLP-encode an unsigned integer as its minimal big-endian byte string.
///
/// Zero encodes as the empty string (`0x80`), per canonical RLP rules.
pub fn encode_uint(value: U256) -> Vec<u8> {
    if value.is_zero() {
        return vec![0x80];
    }
    let bytes = value.to_be_bytes::<32>();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(31);
    encode_bytes(&bytes[start..])
}

/// Write an RLP list header for a payload of the given length.
pub fn encode_list_header(out: &mut Vec<u8>, payload_len: usize) {
    if payload_len <= 55 {
        #[allow(clippy::cast_possible_truncation)]
        out.push(0xc0 + payload_len as u8);
    } else {
        let len_bytes = encode_length(payload_len);
        #[allow(clippy::cast_possible_truncation)]
        out.push(0xf7 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn encode_length(len: usize) -> Vec<u8> {
    if len <= 0xff {
        vec![len as u8]
    } else if len <= 0xffff {
        vec![(len >> 8) as u8, (len & 0xff) as u8]
    } else if len <= 0xff_ffff {
        vec![
            (len >> 16) as u8,
            ((len >> 8) & 0xff) as u8,
            (len & 0xff) as u8,
        ]
    } else {
        vec![
            (len >> 24) as u8,
            ((len >> 16) & 0xff) as u8,
            ((len >> 8) & 0xff) as u8,
            (len & 0xff) as u8,
        ]
    }
}
