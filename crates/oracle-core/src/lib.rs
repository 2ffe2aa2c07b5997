//! Encoding engine for the block hash oracle: canonical header RLP,
//! storage slot key derivation, proof bundle assembly and the verifier
//! contract ABI.

#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

pub mod abi;
pub mod bundle;
pub mod header;
pub mod rlp;
pub mod slot;

pub use bundle::{BundleError, EthProofResponse, ProofBundle, StorageProofEntry};
pub use header::{canonicalize, encode_checked, HeaderEncodeOptions, HeaderError, RawBlock};
pub use rlp::{RlpError, RlpItem};
pub use slot::{mapping_key, SlotKey, SlotPath, StorageKey};
