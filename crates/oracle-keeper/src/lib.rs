//! Keeper orchestration: configuration, proof generation, the consensus
//! apply path and the watch loop.

#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

pub mod config;
pub mod error;
pub mod keeper;
pub mod prover;

pub use error::KeeperError;
