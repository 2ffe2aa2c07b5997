//! Proof bundle assembly.
//!
//! `eth_getProof` returns each trie node as an RLP blob. The verifier
//! contract wants one RLP list of *decoded* node structures:
//! `[accountNodes, storageNodesForKey0, storageNodesForKey1, ...]` with the
//! storage sections in the exact order the keys were submitted. The RPC is
//! not trusted to preserve that order; sections are re-matched by key.

use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rlp::{RlpError, RlpItem};
use crate::slot::StorageKey;

/// Errors from proof bundle assembly.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("storage proof missing for key {0}")]
    MissingStorageProof(StorageKey),

    #[error("duplicate storage proof for key {0}")]
    DuplicateStorageProof(StorageKey),

    #[error("invalid proof node: {0}")]
    InvalidNode(#[from] RlpError),
}

/// One storage entry of an `eth_getProof` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProofEntry {
    /// Storage key; some nodes return it as a short hex quantity rather
    /// than a full 32-byte word.
    pub key: U256,
    pub value: U256,
    pub proof: Vec<Bytes>,
}

/// An `eth_getProof` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthProofResponse {
    pub account_proof: Vec<Bytes>,
    pub storage_proof: Vec<StorageProofEntry>,
}

/// Decoded account and storage proof sections, in submitted key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofBundle {
    account_nodes: Vec<RlpItem>,
    storage_sections: Vec<Vec<RlpItem>>,
}

impl ProofBundle {
    /// Build a bundle from an RPC response, re-matching storage sections
    /// against the submitted key order.
    pub fn from_rpc(response: &EthProofResponse, keys: &[StorageKey]) -> Result<Self, BundleError> {
        let account_nodes = decode_nodes(&response.account_proof)?;

        let mut storage_sections = Vec::with_capacity(keys.len());
        for key in keys {
            let wanted = U256::from_be_slice(key.as_slice());
            let mut section = None;
            for entry in &response.storage_proof {
                if entry.key == wanted {
                    if section.is_some() {
                        return Err(BundleError::DuplicateStorageProof(*key));
                    }
                    section = Some(decode_nodes(&entry.proof)?);
                }
            }
            match section {
                Some(nodes) => storage_sections.push(nodes),
                None => return Err(BundleError::MissingStorageProof(*key)),
            }
        }

        Ok(Self {
            account_nodes,
            storage_sections,
        })
    }

    /// Encode the bundle as the verifier's outer RLP list.
    pub fn encode(&self) -> Vec<u8> {
        let mut sections = Vec::with_capacity(1 + self.storage_sections.len());
        sections.push(RlpItem::List(self.account_nodes.clone()));
        for nodes in &self.storage_sections {
            sections.push(RlpItem::List(nodes.clone()));
        }
        RlpItem::List(sections).encode()
    }
}

fn decode_nodes(blobs: &[Bytes]) -> Result<Vec<RlpItem>, RlpError> {
    blobs.iter().map(|blob| RlpItem::decode(blob)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn key(byte: u8) -> StorageKey {
        B256::repeat_byte(byte)
    }

    fn entry(key: StorageKey, proof: Vec<Bytes>) -> StorageProofEntry {
        StorageProofEntry {
            key: U256::from_be_slice(key.as_slice()),
            value: U256::ZERO,
            proof,
        }
    }

    #[test]
    fn minimal_bundle_golden_bytes() {
        // Single account node [0x01, 0x02], no storage keys:
        // node c2 01 02, account section c3 c2 01 02, outer c4 c3 c2 01 02.
        let response = EthProofResponse {
            account_proof: vec![Bytes::from(vec![0xc2, 0x01, 0x02])],
            storage_proof: vec![],
        };
        let bundle = ProofBundle::from_rpc(&response, &[]).expect("bundle");
        assert_eq!(bundle.encode(), vec![0xc4, 0xc3, 0xc2, 0x01, 0x02]);
    }

    #[test]
    fn storage_sections_follow_submitted_key_order() {
        let node_a = Bytes::from(vec![0xc2, 0x0a, 0x0a]);
        let node_b = Bytes::from(vec![0xc2, 0x0b, 0x0b]);
        // RPC returns b before a; submitted order is a then b.
        let response = EthProofResponse {
            account_proof: vec![Bytes::from(vec![0xc2, 0x01, 0x02])],
            storage_proof: vec![
                entry(key(0xbb), vec![node_b.clone()]),
                entry(key(0xaa), vec![node_a.clone()]),
            ],
        };

        let bundle =
            ProofBundle::from_rpc(&response, &[key(0xaa), key(0xbb)]).expect("bundle");
        let encoded = bundle.encode();

        let RlpItem::List(sections) = RlpItem::decode(&encoded).expect("decode") else {
            panic!("outer item must be a list");
        };
        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections[1],
            RlpItem::List(vec![RlpItem::decode(&node_a).unwrap()])
        );
        assert_eq!(
            sections[2],
            RlpItem::List(vec![RlpItem::decode(&node_b).unwrap()])
        );
    }

    #[test]
    fn missing_storage_proof_is_rejected() {
        let response = EthProofResponse {
            account_proof: vec![Bytes::from(vec![0xc2, 0x01, 0x02])],
            storage_proof: vec![entry(key(0xaa), vec![Bytes::from(vec![0xc2, 0x0a, 0x0a])])],
        };
        let result = ProofBundle::from_rpc(&response, &[key(0xaa), key(0xbb)]);
        assert!(matches!(
            result,
            Err(BundleError::MissingStorageProof(k)) if k == key(0xbb)
        ));
    }

    #[test]
    fn duplicate_storage_proof_is_rejected() {
        let node = Bytes::from(vec![0xc2, 0x0a, 0x0a]);
        let response = EthProofResponse {
            account_proof: vec![Bytes::from(vec![0xc2, 0x01, 0x02])],
            storage_proof: vec![
                entry(key(0xaa), vec![node.clone()]),
                entry(key(0xaa), vec![node]),
            ],
        };
        let result = ProofBundle::from_rpc(&response, &[key(0xaa)]);
        assert!(matches!(
            result,
            Err(BundleError::DuplicateStorageProof(k)) if k == key(0xaa)
        ));
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let account_node = Bytes::from(vec![0xc2, 0x01, 0x02]);
        let storage_node = Bytes::from(vec![0xc3, 0x81, 0x80, 0x05]);
        let response = EthProofResponse {
            account_proof: vec![account_node.clone()],
            storage_proof: vec![entry(key(0x11), vec![storage_node.clone()])],
        };
        let bundle = ProofBundle::from_rpc(&response, &[key(0x11)]).expect("bundle");

        let decoded = RlpItem::decode(&bundle.encode()).expect("decode");
        let expected = RlpItem::List(vec![
            RlpItem::List(vec![RlpItem::decode(&account_node).unwrap()]),
            RlpItem::List(vec![RlpItem::decode(&storage_node).unwrap()]),
        ]);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn short_quantity_keys_still_match() {
        // A key of 0x...0001 may come back as "0x1"; U256 comparison is
        // value-based so it matches the full-width submitted key.
        let mut raw = [0u8; 32];
        raw[31] = 1;
        let submitted = B256::from(raw);
        let response = EthProofResponse {
            account_proof: vec![Bytes::from(vec![0xc2, 0x01, 0x02])],
            storage_proof: vec![StorageProofEntry {
                key: U256::from(1u64),
                value: U256::ZERO,
                proof: vec![Bytes::from(vec![0xc2, 0x0a, 0x0a])],
            }],
        };
        assert!(ProofBundle::from_rpc(&response, &[submitted]).is_ok());
    }
}
