//! JSON-RPC 2.0 chain client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use oracle_core::{EthProofResponse, RawBlock, StorageKey};

use crate::error::ClientError;
use crate::types::{RpcLog, TransactionReceipt};
use crate::ChainClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`ChainClient`] speaking JSON-RPC 2.0 to a single endpoint.
pub struct HttpChainClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl HttpChainClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn request_opt<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<T>, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, ClientError> {
        self.request_opt(method, params)
            .await?
            .ok_or(ClientError::MissingResult(method))
    }
}

fn quantity(value: u64) -> Value {
    Value::String(format!("0x{value:x}"))
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        let id: U256 = self.request("eth_chainId", json!([])).await?;
        Ok(id.saturating_to())
    }

    async fn block_number(&self) -> Result<u64, ClientError> {
        let number: U256 = self.request("eth_blockNumber", json!([])).await?;
        Ok(number.saturating_to())
    }

    async fn get_block_by_number(&self, number: u64) -> Result<RawBlock, ClientError> {
        self.request("eth_getBlockByNumber", json!([quantity(number), false]))
            .await
    }

    async fn get_proof(
        &self,
        address: Address,
        keys: &[StorageKey],
        block_number: u64,
    ) -> Result<EthProofResponse, ClientError> {
        self.request(
            "eth_getProof",
            json!([address, keys, quantity(block_number)]),
        )
        .await
    }

    async fn get_logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RpcLog>, ClientError> {
        self.request(
            "eth_getLogs",
            json!([{
                "address": address,
                "fromBlock": quantity(from_block),
                "toBlock": quantity(to_block),
            }]),
        )
        .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<u64, ClientError> {
        let gas: U256 = self
            .request(
                "eth_estimateGas",
                json!([{ "from": from, "to": to, "data": data }]),
            )
            .await?;
        Ok(gas.saturating_to())
    }

    async fn gas_price(&self) -> Result<U256, ClientError> {
        self.request("eth_gasPrice", json!([])).await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ClientError> {
        let count: U256 = self
            .request("eth_getTransactionCount", json!([address, "latest"]))
            .await?;
        Ok(count.saturating_to())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ClientError> {
        self.request("eth_sendRawTransaction", json!([raw])).await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        self.request_opt("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}
