//! Proof generation and submission.
//!
//! The two artifacts travel either in-process or through a pair of hex
//! text files, so generation and submission can run as separate one-shots
//! (generate on a trusted box, submit from wherever the key lives).

use std::path::Path;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use tracing::info;

use oracle_client::{send_transaction, ChainClient, SubmitOptions, Wallet};
use oracle_core::abi::IStateProver;
use oracle_core::{encode_checked, HeaderEncodeOptions, ProofBundle, StorageKey};

use crate::error::KeeperError;

const HEADER_FILE: &str = "header.txt";
const PROOF_FILE: &str = "proof.txt";

/// The two blobs the prover contract consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proofs {
    pub header_rlp: Vec<u8>,
    pub proof_rlp: Vec<u8>,
}

impl Proofs {
    /// Write `header.txt` and `proof.txt` (lowercase hex, no 0x prefix).
    pub fn write_to_dir(&self, dir: &Path) -> Result<(), KeeperError> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(HEADER_FILE), hex::encode(&self.header_rlp))?;
        std::fs::write(dir.join(PROOF_FILE), hex::encode(&self.proof_rlp))?;
        Ok(())
    }

    pub fn read_from_dir(dir: &Path) -> Result<Self, KeeperError> {
        let header_hex = std::fs::read_to_string(dir.join(HEADER_FILE))?;
        let proof_hex = std::fs::read_to_string(dir.join(PROOF_FILE))?;
        Ok(Self {
            header_rlp: hex::decode(header_hex.trim())?,
            proof_rlp: hex::decode(proof_hex.trim())?,
        })
    }
}

/// Build the proof pair for one block: fetch the header, canonicalize it
/// against the reported hash, fetch the storage proof and bundle it.
pub async fn generate_proof<C: ChainClient + ?Sized>(
    client: &C,
    account: Address,
    keys: &[StorageKey],
    block_number: u64,
    options: &HeaderEncodeOptions,
) -> Result<Proofs, KeeperError> {
    let block = client.get_block_by_number(block_number).await?;
    let header_rlp = encode_checked(&block, options)?;

    let response = client.get_proof(account, keys, block_number).await?;
    let bundle = ProofBundle::from_rpc(&response, keys)?;

    info!(
        block_number,
        account = %account,
        keys = keys.len(),
        header_bytes = header_rlp.len(),
        "proof generated"
    );
    Ok(Proofs {
        header_rlp,
        proof_rlp: bundle.encode(),
    })
}

/// Submit `prove(header, proof)` and wait for confirmation.
pub async fn submit_proof<C, W>(
    client: &C,
    wallet: &W,
    prover: Address,
    proofs: &Proofs,
    options: &SubmitOptions,
) -> Result<B256, KeeperError>
where
    C: ChainClient + ?Sized,
    W: Wallet + ?Sized,
{
    let data = IStateProver::proveCall {
        block_header_rlp: proofs.header_rlp.clone().into(),
        proof_rlp: proofs.proof_rlp.clone().into(),
    }
    .abi_encode();

    let receipt = send_transaction(client, wallet, prover, Bytes::from(data), options).await?;
    info!(prover = %prover, tx = %receipt.transaction_hash, "proof submitted");
    Ok(receipt.transaction_hash)
}
