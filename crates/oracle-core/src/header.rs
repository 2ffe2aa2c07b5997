//! Block header canonicalization.
//!
//! Reproduces the exact RLP encoding that hashes (keccak256) to a chain's
//! reported block hash, across hard forks. Fields introduced by later
//! protocol upgrades are appended only when the source block carries them;
//! zero-valued quantities encode as the RLP empty string.
//!
//! ## Field order
//!
//! 0. parent_hash          8. number              15. base_fee_per_gas (EIP-1559)
//! 1. sha3_uncles          9. gas_limit           16. withdrawals_root (EIP-4895)
//! 2. miner               10. gas_used            17. blob_gas_used (EIP-4844)
//! 3. state_root          11. timestamp           18. excess_blob_gas (EIP-4844)
//! 4. transactions_root   12. extra_data          19. parent_beacon_block_root (EIP-4788)
//! 5. receipts_root       13. mix_hash
//! 6. logs_bloom          14. nonce
//! 7. difficulty

use alloy_primitives::{keccak256, Address, Bytes, B256, B64, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rlp::{encode_bytes, encode_list_header, encode_uint};

/// Errors from header canonicalization.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("hash mismatch: expected {expected}, got {got}")]
    HashMismatch { expected: String, got: String },
}

/// A block record as returned by a chain data source (`eth_getBlockByNumber`).
///
/// Every header field is optional: pre-fork blocks simply lack the later
/// fields, and the canonicalizer skips absent fields entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    /// Source-reported block hash; the canonical encoding must hash to this.
    pub hash: B256,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha3_uncles: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miner: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_root: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_root: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipts_root: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_bloom: Option<Bytes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<U256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<U256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<U256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<U256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Bytes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<B256>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<B64>,

    /// Added by EIP-1559; absent in legacy headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,

    /// Added by EIP-4895; absent in legacy headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<B256>,

    /// Added by EIP-4844; absent in legacy headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,

    /// Added by EIP-4844; absent in legacy headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,

    /// Added by EIP-4788; absent in legacy headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
}

impl RawBlock {
    /// Block number as u64, zero if absent.
    pub fn number_u64(&self) -> u64 {
        self.number.map(|n| n.saturating_to::<u64>()).unwrap_or(0)
    }
}

/// Named options for the header encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncodeOptions {
    /// Compatibility divergence: encode the nonce as the all-zero 8-byte
    /// placeholder regardless of the source value. Some verifier contracts
    /// accept only this relaxed form; it breaks hash equality against any
    /// chain whose blocks carry a real nonce, so `encode_checked` still
    /// enforces the hash check on top of it.
    pub force_zero_nonce: bool,
}

/// Produce the canonical RLP header encoding for a raw block record.
///
/// Fields absent from the record are skipped entirely (not zero-filled),
/// which keeps pre-fork headers encodable. Zero-valued quantities encode
/// as the RLP empty string; fixed-width byte fields keep their width.
pub fn canonicalize(block: &RawBlock, options: &HeaderEncodeOptions) -> Vec<u8> {
    let mut fields: Vec<Vec<u8>> = Vec::with_capacity(20);

    push_hash(&mut fields, &block.parent_hash);
    push_hash(&mut fields, &block.sha3_uncles);
    if let Some(miner) = &block.miner {
        fields.push(encode_bytes(miner.as_slice()));
    }
    push_hash(&mut fields, &block.state_root);
    push_hash(&mut fields, &block.transactions_root);
    push_hash(&mut fields, &block.receipts_root);
    if let Some(bloom) = &block.logs_bloom {
        fields.push(encode_bytes(bloom));
    }
    push_quantity(&mut fields, &block.difficulty);
    push_quantity(&mut fields, &block.number);
    push_quantity(&mut fields, &block.gas_limit);
    push_quantity(&mut fields, &block.gas_used);
    push_quantity(&mut fields, &block.timestamp);
    if let Some(extra) = &block.extra_data {
        fields.push(encode_bytes(extra));
    }
    push_hash(&mut fields, &block.mix_hash);
    if let Some(nonce) = &block.nonce {
        if options.force_zero_nonce {
            fields.push(encode_bytes(&[0u8; 8]));
        } else {
            fields.push(encode_bytes(nonce.as_slice()));
        }
    }

    // Forks are cumulative: the post-fork tail ends at the first absent
    // field, so a gap never shifts later fields into earlier positions.
    let tail = [
        block.base_fee_per_gas.map(encode_uint),
        block.withdrawals_root.map(|h| encode_bytes(h.as_slice())),
        block.blob_gas_used.map(encode_uint),
        block.excess_blob_gas.map(encode_uint),
        block
            .parent_beacon_block_root
            .map(|h| encode_bytes(h.as_slice())),
    ];
    for field in tail {
        match field {
            Some(encoded) => fields.push(encoded),
            None => break,
        }
    }

    let payload_len: usize = fields.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_len + 5);
    encode_list_header(&mut out, payload_len);
    for field in fields {
        out.extend_from_slice(&field);
    }
    out
}

/// Canonicalize and verify that the encoding hashes to the source-reported
/// block hash. Every proof-generation path must use this form: a mismatch
/// means the proof is doomed and the attempt must abort.
pub fn encode_checked(
    block: &RawBlock,
    options: &HeaderEncodeOptions,
) -> Result<Vec<u8>, HeaderError> {
    let encoded = canonicalize(block, options);
    let got = keccak256(&encoded);
    if got != block.hash {
        return Err(HeaderError::HashMismatch {
            expected: format!("0x{}", hex::encode(block.hash)),
            got: format!("0x{}", hex::encode(got)),
        });
    }
    Ok(encoded)
}

fn push_hash(fields: &mut Vec<Vec<u8>>, value: &Option<B256>) {
    if let Some(hash) = value {
        fields.push(encode_bytes(hash.as_slice()));
    }
}

fn push_quantity(fields: &mut Vec<Vec<u8>>, value: &Option<U256>) {
    if let Some(quantity) = value {
        fields.push(encode_uint(*quantity));
    }
}
