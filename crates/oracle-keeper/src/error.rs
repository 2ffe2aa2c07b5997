use oracle_client::ClientError;
use oracle_consensus::ConsensusError;
use oracle_core::{BundleError, HeaderError};
use thiserror::Error;

/// Errors from keeper orchestration.
#[derive(Debug, Error)]
pub enum KeeperError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("proof file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("proof file is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("apply receipt carried no block number")]
    AppliedNumberMissing,

    #[error("config error: {0}")]
    Config(String),
}
