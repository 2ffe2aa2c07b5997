//! Threshold selection and apply submission.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

use oracle_client::{send_transaction, ChainClient, SubmitOptions, Wallet};
use oracle_core::abi::IBlockHashOracle;

use crate::error::ConsensusError;
use crate::scan::CommitmentMap;

/// A `(number, hash)` pair whose committer set met the threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyApply {
    pub number: u64,
    pub hash: B256,
    /// Ascending by numeric address value.
    pub committers: Vec<Address>,
}

/// Read the oracle's committer threshold.
pub async fn read_threshold<C: ChainClient + ?Sized>(
    client: &C,
    oracle: Address,
) -> Result<u64, ConsensusError> {
    let data = IBlockHashOracle::thresholdCall {}.abi_encode();
    let ret = client.call(oracle, Bytes::from(data)).await?;
    let decoded = IBlockHashOracle::thresholdCall::abi_decode_returns(&ret, true)
        .map_err(|e| ConsensusError::Abi(e.to_string()))?;
    Ok(decoded._0.saturating_to())
}

/// Read the applied hash for a block number, `None` when the oracle has
/// none. The contract reverts for unknown numbers, so any EVM-side call
/// failure (and an all-zero return) counts as absent.
pub async fn applied_hash<C: ChainClient + ?Sized>(
    client: &C,
    oracle: Address,
    number: u64,
) -> Result<Option<B256>, ConsensusError> {
    let data = IBlockHashOracle::get_block_hashCall {
        number: U256::from(number),
    }
    .abi_encode();
    let ret = match client.call(oracle, Bytes::from(data)).await {
        Ok(ret) => ret,
        Err(err) if err.is_execution_error() => return Ok(None),
        Err(err) => return Err(ConsensusError::Client(err)),
    };
    let decoded = IBlockHashOracle::get_block_hashCall::abi_decode_returns(&ret, true)
        .map_err(|e| ConsensusError::Abi(e.to_string()))?;
    if decoded._0 == B256::ZERO {
        return Ok(None);
    }
    Ok(Some(decoded._0))
}

/// Select the pairs ready to apply: committer set at or above the
/// threshold and no hash applied yet for that number.
///
/// The existence pre-check is best effort: a competing keeper can apply
/// between this read and our submission, in which case the transaction
/// reverts and the error surfaces to the caller. The contract stays the
/// authority.
pub async fn select_ready<C: ChainClient + ?Sized>(
    client: &C,
    oracle: Address,
    commitments: &CommitmentMap,
    threshold: u64,
) -> Result<Vec<ReadyApply>, ConsensusError> {
    let mut ready = Vec::new();
    for ((number, hash), committers) in commitments {
        let count = u64::try_from(committers.len()).unwrap_or(u64::MAX);
        if count < threshold {
            debug!(number, count, threshold, "below threshold");
            continue;
        }
        if applied_hash(client, oracle, *number).await?.is_some() {
            debug!(number, "hash already applied, skipping");
            continue;
        }
        // BTreeSet iterates in byte order, which for fixed-width
        // addresses equals ascending numeric order.
        ready.push(ReadyApply {
            number: *number,
            hash: *hash,
            committers: committers.iter().copied().collect(),
        });
    }
    Ok(ready)
}

/// Submit one `apply` transaction and wait for confirmation.
pub async fn apply_ready<C, W>(
    client: &C,
    wallet: &W,
    oracle: Address,
    ready: &ReadyApply,
    options: &SubmitOptions,
) -> Result<B256, ConsensusError>
where
    C: ChainClient + ?Sized,
    W: Wallet + ?Sized,
{
    let data = IBlockHashOracle::applyCall {
        number: U256::from(ready.number),
        hash: ready.hash,
        committers: ready.committers.clone(),
    }
    .abi_encode();

    let receipt = send_transaction(client, wallet, oracle, Bytes::from(data), options).await?;
    info!(
        number = ready.number,
        hash = %ready.hash,
        committers = ready.committers.len(),
        tx = %receipt.transaction_hash,
        "block hash applied"
    );
    Ok(receipt.transaction_hash)
}
