use oracle_client::ClientError;
use thiserror::Error;

/// Errors from the consensus engine.
#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("abi decode error: {0}")]
    Abi(String),
}
