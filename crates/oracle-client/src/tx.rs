//! Build, sign, submit and confirm one transaction.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::error::ClientError;
use crate::types::{TransactionReceipt, TxRequest};
use crate::wallet::Wallet;
use crate::ChainClient;

/// Headroom over the node's gas estimate.
const GAS_MULTIPLIER_NUM: u64 = 3;
const GAS_MULTIPLIER_DEN: u64 = 2;

/// Submission knobs. Defaults: 2s receipt poll, 120s confirmation window.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub poll_interval: Duration,
    pub receipt_timeout: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

/// Send a contract call and wait for its receipt.
///
/// Gas is the node estimate with 1.5x headroom; nonce and gas price come
/// from the client at call time. The receipt is polled until the timeout;
/// a mined-but-reverted transaction is an error.
pub async fn send_transaction<C: ChainClient + ?Sized, W: Wallet + ?Sized>(
    client: &C,
    wallet: &W,
    to: Address,
    data: Bytes,
    options: &SubmitOptions,
) -> Result<TransactionReceipt, ClientError> {
    let from = wallet.address();
    let nonce = client.transaction_count(from).await?;
    let estimate = client.estimate_gas(from, to, data.clone()).await?;
    let gas = estimate
        .saturating_mul(GAS_MULTIPLIER_NUM)
        .div_euclid(GAS_MULTIPLIER_DEN);
    let gas_price = client.gas_price().await?;
    let chain_id = client.chain_id().await?;

    let tx = TxRequest {
        to,
        data,
        value: U256::ZERO,
        nonce,
        gas,
        gas_price,
        chain_id,
    };
    let raw = wallet.sign_transaction(&tx)?;
    let hash = client.send_raw_transaction(raw).await?;
    info!(%hash, %to, nonce, gas, "transaction submitted");

    let deadline = Instant::now() + options.receipt_timeout;
    loop {
        if let Some(receipt) = client.transaction_receipt(hash).await? {
            if !receipt.succeeded() {
                return Err(ClientError::Reverted(hash));
            }
            debug!(%hash, block = ?receipt.block_number, "transaction confirmed");
            return Ok(receipt);
        }
        if Instant::now() >= deadline {
            return Err(ClientError::ReceiptTimeout(hash));
        }
        sleep(options.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChainClient;
    use crate::wallet::MockWallet;
    use alloy_primitives::Address;

    #[tokio::test]
    async fn pipeline_submits_and_confirms_against_mock() {
        let client = MockChainClient::new();
        let wallet = MockWallet::new(Address::repeat_byte(0x11));
        client.set_nonce(wallet.address(), 7);

        let receipt = send_transaction(
            &client,
            &wallet,
            Address::repeat_byte(0x22),
            Bytes::from(vec![0x01, 0x02, 0x03, 0x04]),
            &SubmitOptions::default(),
        )
        .await
        .expect("submit");

        assert!(receipt.succeeded());
        assert_eq!(client.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn receipt_carries_staged_logs() {
        let client = MockChainClient::new();
        let wallet = MockWallet::new(Address::repeat_byte(0x11));
        client.stage_receipt_logs(vec![crate::types::RpcLog {
            address: Address::repeat_byte(0x22),
            topics: vec![],
            data: Bytes::new(),
            block_number: None,
        }]);

        let receipt = send_transaction(
            &client,
            &wallet,
            Address::repeat_byte(0x22),
            Bytes::new(),
            &SubmitOptions::default(),
        )
        .await
        .expect("submit");

        assert_eq!(receipt.logs.len(), 1);
    }
}
