//! The watch loop: periodically apply the destination oracle's pending
//! block hash and prove the configured storage slots against it.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use oracle_client::{
    send_transaction, ChainClient, SubmitOptions, TransactionReceipt, Wallet,
};
use oracle_core::abi::{IBlockHashOracle, IRollupBlockOracle};
use oracle_core::{HeaderEncodeOptions, StorageKey};

use crate::config::AppConfig;
use crate::error::KeeperError;
use crate::prover::{generate_proof, submit_proof};

/// Loop state, explicit and owned by the caller.
#[derive(Debug, Default)]
pub struct KeeperState {
    last_update: Option<Instant>,
}

impl KeeperState {
    pub fn due(&self, interval: Duration) -> bool {
        match self.last_update {
            Some(at) => at.elapsed() >= interval,
            None => true,
        }
    }

    pub fn mark_updated(&mut self) {
        self.last_update = Some(Instant::now());
    }
}

/// Pull the applied block number out of an apply receipt.
///
/// Oracles report it either through `ApplyBlockHash` (number in the first
/// indexed slot) or by re-emitting `CommitBlockHash` (number in the
/// second).
pub fn applied_number_from_receipt(receipt: &TransactionReceipt) -> Option<u64> {
    for log in &receipt.logs {
        let number_topic = match log.topics.first() {
            Some(t) if *t == IBlockHashOracle::ApplyBlockHash::SIGNATURE_HASH => log.topics.get(1),
            Some(t) if *t == IBlockHashOracle::CommitBlockHash::SIGNATURE_HASH => log.topics.get(2),
            _ => None,
        };
        if let Some(topic) = number_topic {
            return Some(U256::from_be_slice(topic.as_slice()).saturating_to());
        }
    }
    None
}

/// One keeper iteration: apply on the destination oracle, then prove the
/// configured slots at the block number the apply pinned.
pub async fn prove_once<S, D, W>(
    source: &S,
    destination: &D,
    wallet: &W,
    rollup_oracle: Address,
    state_prover: Address,
    account: Address,
    keys: &[StorageKey],
    encode_options: &HeaderEncodeOptions,
    submit: &SubmitOptions,
) -> Result<B256, KeeperError>
where
    S: ChainClient + ?Sized,
    D: ChainClient + ?Sized,
    W: Wallet + ?Sized,
{
    let data = IRollupBlockOracle::applyCall {}.abi_encode();
    let receipt =
        send_transaction(destination, wallet, rollup_oracle, Bytes::from(data), submit).await?;
    let number =
        applied_number_from_receipt(&receipt).ok_or(KeeperError::AppliedNumberMissing)?;
    info!(number, tx = %receipt.transaction_hash, "block hash applied on destination");

    let proofs = generate_proof(source, account, keys, number, encode_options).await?;
    submit_proof(destination, wallet, state_prover, &proofs, submit).await
}

/// Run the watch loop forever. Iteration failures are logged and retried
/// on the next due tick; only setup errors escape.
pub async fn run<S, D, W>(
    source: &S,
    destination: &D,
    wallet: &W,
    cfg: &AppConfig,
) -> Result<(), KeeperError>
where
    S: ChainClient + ?Sized,
    D: ChainClient + ?Sized,
    W: Wallet + ?Sized,
{
    let keys = cfg
        .storage_keys()
        .map_err(|e| KeeperError::Config(e.to_string()))?;
    let encode_options = HeaderEncodeOptions {
        force_zero_nonce: cfg.prover.force_zero_nonce,
    };
    let submit = SubmitOptions {
        receipt_timeout: Duration::from_secs(cfg.keeper.receipt_timeout_secs),
        ..SubmitOptions::default()
    };
    let interval = Duration::from_secs(cfg.keeper.update_interval_secs);
    let poll = Duration::from_millis(cfg.keeper.poll_interval_ms);

    let mut state = KeeperState::default();
    loop {
        if state.due(interval) {
            match prove_once(
                source,
                destination,
                wallet,
                cfg.contracts.rollup_oracle,
                cfg.contracts.state_prover,
                cfg.contracts.proved_account,
                &keys,
                &encode_options,
                &submit,
            )
            .await
            {
                Ok(tx) => {
                    info!(tx = %tx, "keeper update complete");
                    state.mark_updated();
                }
                Err(e) => {
                    error!(error = %e, "keeper update failed; will retry");
                }
            }
        }
        sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use oracle_client::RpcLog;

    fn receipt_with(logs: Vec<RpcLog>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: B256::repeat_byte(0x01),
            block_number: Some(U256::from(10u64)),
            status: Some(U256::from(1u64)),
            logs,
        }
    }

    fn number_topic(number: u64) -> B256 {
        B256::from(U256::from(number).to_be_bytes::<32>())
    }

    #[test]
    fn extracts_number_from_apply_event() {
        let receipt = receipt_with(vec![RpcLog {
            address: Address::repeat_byte(0x0a),
            topics: vec![
                IBlockHashOracle::ApplyBlockHash::SIGNATURE_HASH,
                number_topic(777),
            ],
            data: Bytes::new(),
            block_number: None,
        }]);
        assert_eq!(applied_number_from_receipt(&receipt), Some(777));
    }

    #[test]
    fn extracts_number_from_commit_event() {
        let receipt = receipt_with(vec![RpcLog {
            address: Address::repeat_byte(0x0a),
            topics: vec![
                IBlockHashOracle::CommitBlockHash::SIGNATURE_HASH,
                Address::repeat_byte(0x01).into_word(),
                number_topic(888),
            ],
            data: Bytes::new(),
            block_number: None,
        }]);
        assert_eq!(applied_number_from_receipt(&receipt), Some(888));
    }

    #[test]
    fn unrelated_logs_yield_no_number() {
        let receipt = receipt_with(vec![RpcLog {
            address: Address::repeat_byte(0x0a),
            topics: vec![B256::repeat_byte(0xee), number_topic(999)],
            data: Bytes::new(),
            block_number: None,
        }]);
        assert_eq!(applied_number_from_receipt(&receipt), None);
    }

    #[test]
    fn state_is_due_initially_and_after_interval() {
        let state = KeeperState::default();
        assert!(state.due(Duration::from_secs(3600)));

        let mut state = KeeperState::default();
        state.mark_updated();
        assert!(!state.due(Duration::from_secs(3600)));
        assert!(state.due(Duration::ZERO));
    }
}
