use alloy_primitives::B256;
use thiserror::Error;

/// Errors from chain RPC, signing and transaction confirmation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("rpc response for {0} carried no result")]
    MissingResult(&'static str),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("transaction {0} not confirmed within the receipt timeout")]
    ReceiptTimeout(B256),

    #[error("transaction {0} reverted")]
    Reverted(B256),
}

impl ClientError {
    /// True when an `eth_call` failed inside the EVM rather than in
    /// transport. Callers treating a revert as "value absent" key off this.
    pub fn is_execution_error(&self) -> bool {
        matches!(self, ClientError::Rpc { .. })
    }
}
