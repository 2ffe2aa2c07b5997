//! Commit/threshold/apply consensus over observed block hashes.
//!
//! Committers emit `CommitBlockHash` events on the oracle contract; this
//! crate scans a bounded window of those events, aggregates them per
//! `(number, hash)` pair, selects the pairs whose committer set meets the
//! on-chain threshold and are not yet applied, and submits `apply`.
//! All state is rebuilt from chain reads on every run.

#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

mod engine;
mod error;
mod scan;

pub use engine::{apply_ready, applied_hash, read_threshold, select_ready, ReadyApply};
pub use error::ConsensusError;
pub use scan::{normalize_log, scan_commitments, Commitment, CommitmentMap, ScanConfig};
