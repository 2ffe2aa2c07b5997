//! Wire types shared by the client trait and its implementations.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// An unsigned legacy transaction, ready for a wallet to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub nonce: u64,
    pub gas: u64,
    pub gas_price: U256,
    pub chain_id: u64,
}

/// One log entry, either from `eth_getLogs` or a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U256>,
}

/// A transaction receipt; present only once the transaction is mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<U256>,
    #[serde(default)]
    pub logs: Vec<RpcLog>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == Some(U256::from(1u64))
    }
}
