//! Chain collaborators for the block hash oracle keeper.
//!
//! The keeper never talks to a chain or a key directly; it goes through
//! the [`ChainClient`] and [`Wallet`] traits. Production wiring uses
//! [`HttpChainClient`] over JSON-RPC; tests use the deterministic
//! in-memory [`MockChainClient`] and [`MockWallet`].

#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use oracle_core::{EthProofResponse, RawBlock, StorageKey};

mod error;
mod http;
mod mock;
mod tx;
mod types;
mod wallet;

pub use error::ClientError;
pub use http::HttpChainClient;
pub use mock::MockChainClient;
pub use tx::{send_transaction, SubmitOptions};
pub use types::{RpcLog, TransactionReceipt, TxRequest};
pub use wallet::{MockWallet, PrivateKeyWallet, Wallet};

/// Read and submit operations against one chain endpoint.
///
/// All I/O in the keeper is sequential: callers await each operation to
/// completion before issuing the next.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ClientError>;

    async fn block_number(&self) -> Result<u64, ClientError>;

    /// Fetch a block header record; transaction bodies are never needed.
    async fn get_block_by_number(&self, number: u64) -> Result<RawBlock, ClientError>;

    async fn get_proof(
        &self,
        address: Address,
        keys: &[StorageKey],
        block_number: u64,
    ) -> Result<EthProofResponse, ClientError>;

    async fn get_logs(
        &self,
        address: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RpcLog>, ClientError>;

    /// `eth_call` against latest state. EVM-side failures surface as
    /// [`ClientError::Rpc`].
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError>;

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<u64, ClientError>;

    async fn gas_price(&self) -> Result<U256, ClientError>;

    async fn transaction_count(&self, address: Address) -> Result<u64, ClientError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ClientError>;

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ClientError>;
}
