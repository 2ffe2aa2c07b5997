//! Commitment event scanning and aggregation.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use tracing::debug;

use oracle_client::{ChainClient, RpcLog};
use oracle_core::abi::IBlockHashOracle;

use crate::error::ConsensusError;

/// Scan window knobs. Defaults cover one day of 12s blocks in chunks the
/// common log-range caps accept.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub lookback_blocks: u64,
    pub chunk_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            lookback_blocks: 7200,
            chunk_size: 1024,
        }
    }
}

/// One observed commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment {
    pub committer: Address,
    pub number: u64,
    pub hash: B256,
}

/// Committer sets per `(number, hash)` pair, rebuilt fresh each scan.
pub type CommitmentMap = BTreeMap<(u64, B256), BTreeSet<Address>>;

/// Extract a commitment from a `CommitBlockHash` log.
///
/// Two emission shapes exist in the wild: the hash either rides as a
/// fourth topic or as the first word of the data section. Anything else
/// (wrong signature topic, short data) is skipped.
pub fn normalize_log(log: &RpcLog) -> Option<Commitment> {
    if log.topics.first() != Some(&IBlockHashOracle::CommitBlockHash::SIGNATURE_HASH) {
        return None;
    }
    let committer = Address::from_word(*log.topics.get(1)?);
    let number = U256::from_be_slice(log.topics.get(2)?.as_slice()).saturating_to::<u64>();
    let hash = match log.topics.get(3) {
        Some(topic) => *topic,
        None => {
            if log.data.len() < 32 {
                return None;
            }
            B256::from_slice(&log.data[..32])
        }
    };
    Some(Commitment {
        committer,
        number,
        hash,
    })
}

/// Scan the oracle's commitment events over a bounded trailing window,
/// paginating backward from the chain head, and aggregate committer sets
/// per `(number, hash)` pair.
pub async fn scan_commitments<C: ChainClient + ?Sized>(
    client: &C,
    oracle: Address,
    config: &ScanConfig,
) -> Result<CommitmentMap, ConsensusError> {
    let latest = client.block_number().await?;
    let floor = latest.saturating_sub(config.lookback_blocks);
    let chunk = config.chunk_size.max(1);

    let mut map = CommitmentMap::new();
    let mut upper = latest;
    loop {
        let lower = upper.saturating_sub(chunk - 1).max(floor);
        let logs = client.get_logs(oracle, lower, upper).await?;
        debug!(lower, upper, count = logs.len(), "scanned log chunk");
        for log in &logs {
            if let Some(commitment) = normalize_log(log) {
                map.entry((commitment.number, commitment.hash))
                    .or_default()
                    .insert(commitment.committer);
            }
        }
        if lower <= floor {
            break;
        }
        upper = lower - 1;
    }
    Ok(map)
}
