//! Deterministic in-memory chain client for tests.
//!
//! State is staged up front (blocks, proofs, logs, call returns) and read
//! back through the [`ChainClient`] trait. Submitted raw transactions are
//! recorded and mined immediately: each send produces a success receipt
//! carrying any logs staged via [`MockChainClient::stage_receipt_logs`].

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;

use oracle_core::{EthProofResponse, RawBlock, StorageKey};

use crate::error::ClientError;
use crate::types::{RpcLog, TransactionReceipt};
use crate::ChainClient;

#[derive(Default)]
struct MockState {
    chain_id: u64,
    latest_block: u64,
    blocks: HashMap<u64, RawBlock>,
    proofs: HashMap<(Address, u64), EthProofResponse>,
    logs: Vec<(u64, RpcLog)>,
    call_returns: HashMap<(Address, Bytes), Bytes>,
    gas_price: U256,
    estimate: u64,
    nonces: HashMap<Address, u64>,
    sent: Vec<Bytes>,
    receipts: HashMap<B256, TransactionReceipt>,
    staged_receipt_logs: Vec<RpcLog>,
}

/// In-memory [`ChainClient`].
pub struct MockChainClient {
    state: Mutex<MockState>,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: 1,
                gas_price: U256::from(1_000_000_000u64),
                estimate: 100_000,
                ..MockState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.lock().chain_id = chain_id;
    }

    pub fn set_latest_block(&self, number: u64) {
        self.lock().latest_block = number;
    }

    pub fn insert_block(&self, number: u64, block: RawBlock) {
        self.lock().blocks.insert(number, block);
    }

    pub fn insert_proof(&self, address: Address, block_number: u64, proof: EthProofResponse) {
        self.lock().proofs.insert((address, block_number), proof);
    }

    pub fn push_log(&self, block_number: u64, log: RpcLog) {
        self.lock().logs.push((block_number, log));
    }

    /// Stage the return data for an exact `(to, calldata)` pair. Calls
    /// with no staged return fail like an EVM revert.
    pub fn set_call_return(&self, to: Address, data: Bytes, ret: Bytes) {
        self.lock().call_returns.insert((to, data), ret);
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.lock().nonces.insert(address, nonce);
    }

    /// Logs attached to the receipt of the next submitted transaction.
    pub fn stage_receipt_logs(&self, logs: Vec<RpcLog>) {
        self.lock().staged_receipt_logs = logs;
    }

    /// Raw transactions submitted so far, in order.
    pub fn sent_transactions(&self) -> Vec<Bytes> {
        self.lock().sent.clone()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(self.lock().chain_id)
    }

    async fn block_number(&self) -> Result<u64, ClientError> {
        Ok(self.lock().latest_block)
    }

    async fn get_block_by_number(&self, number: u64) -> Result<RawBlock, ClientError> {
        self.lock()
            .blocks
            .get(&number)
            .cloned()
            .ok_or(ClientError::MissingResult("eth_getBlockByNumber"))
    }

    async fn get_proof(
        &self,
        address: Address,
        _keys: &[StorageKey],
        block_number: u64,
    ) -> Result<EthProofResponse, ClientError> {
        self.lock()
            .proofs
            .get(&(address, block_number))
            .cloned()
            .ok_or(ClientError::MissingResult("eth_getProof"))
    }

    async fn get_logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RpcLog>, ClientError> {
        Ok(self
            .lock()
            .logs
            .iter()
            .filter(|(number, log)| {
                *number >= from_block && *number <= to_block && log.address == address
            })
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError> {
        self.lock()
            .call_returns
            .get(&(to, data))
            .cloned()
            .ok_or(ClientError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            })
    }

    async fn estimate_gas(
        &self,
        _from: Address,
        _to: Address,
        _data: Bytes,
    ) -> Result<u64, ClientError> {
        Ok(self.lock().estimate)
    }

    async fn gas_price(&self) -> Result<U256, ClientError> {
        Ok(self.lock().gas_price)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ClientError> {
        Ok(self.lock().nonces.get(&address).copied().unwrap_or(0))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ClientError> {
        let mut state = self.lock();
        let hash = keccak256(&raw);
        state.sent.push(raw);
        state.latest_block += 1;
        let logs = std::mem::take(&mut state.staged_receipt_logs);
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U256::from(state.latest_block)),
            status: Some(U256::from(1u64)),
            logs,
        };
        state.receipts.insert(hash, receipt);
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        Ok(self.lock().receipts.get(&hash).cloned())
    }
}
