//! Signing wallet seam.
//!
//! The keeper only needs an address and a way to turn a [`TxRequest`]
//! into raw transaction bytes; key handling lives behind this trait.

use alloy_primitives::{keccak256, Address, Bytes, U256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey};

use oracle_core::rlp::{encode_bytes, encode_list_header, encode_uint};

use crate::error::ClientError;
use crate::types::TxRequest;

pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    fn sign_transaction(&self, tx: &TxRequest) -> Result<Bytes, ClientError>;
}

/// Wallet over a raw secp256k1 private key, producing EIP-155 legacy
/// transactions.
pub struct PrivateKeyWallet {
    key: SigningKey,
    address: Address,
}

impl PrivateKeyWallet {
    pub fn from_hex(key_hex: &str) -> Result<Self, ClientError> {
        let stripped = key_hex.trim().trim_start_matches("0x");
        let bytes = hex::decode(stripped)
            .map_err(|e| ClientError::Signer(format!("private key is not hex: {e}")))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| ClientError::Signer(format!("invalid private key: {e}")))?;

        let pubkey = key.verifying_key().to_encoded_point(false);
        let digest = keccak256(&pubkey.as_bytes()[1..]);
        let address = Address::from_slice(&digest[12..]);
        Ok(Self { key, address })
    }
}

impl Wallet for PrivateKeyWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_transaction(&self, tx: &TxRequest) -> Result<Bytes, ClientError> {
        // EIP-155 signing payload: [nonce, gasPrice, gas, to, value, data,
        // chainId, 0, 0].
        let sighash = keccak256(&encode_legacy(tx, None));
        let (signature, recovery) = self
            .key
            .sign_prehash_recoverable(sighash.as_slice())
            .map_err(|e| ClientError::Signer(e.to_string()))?;
        let (signature, recovery) = normalize(signature, recovery);

        let v = u64::from(recovery.to_byte()) + tx.chain_id * 2 + 35;
        let r = U256::from_be_slice(&signature.r().to_bytes());
        let s = U256::from_be_slice(&signature.s().to_bytes());
        Ok(Bytes::from(encode_legacy(tx, Some((v, r, s)))))
    }
}

/// Ethereum accepts only low-S signatures; flip S and the recovery bit
/// when the signer produced the high form.
fn normalize(signature: Signature, recovery: RecoveryId) -> (Signature, RecoveryId) {
    match signature.normalize_s() {
        Some(normalized) => {
            let flipped = RecoveryId::from_byte(recovery.to_byte() ^ 1).unwrap_or(recovery);
            (normalized, flipped)
        }
        None => (signature, recovery),
    }
}

fn encode_legacy(tx: &TxRequest, signature: Option<(u64, U256, U256)>) -> Vec<u8> {
    let mut fields: Vec<Vec<u8>> = vec![
        encode_uint(U256::from(tx.nonce)),
        encode_uint(tx.gas_price),
        encode_uint(U256::from(tx.gas)),
        encode_bytes(tx.to.as_slice()),
        encode_uint(tx.value),
        encode_bytes(&tx.data),
    ];
    match signature {
        Some((v, r, s)) => {
            fields.push(encode_uint(U256::from(v)));
            fields.push(encode_uint(r));
            fields.push(encode_uint(s));
        }
        None => {
            fields.push(encode_uint(U256::from(tx.chain_id)));
            fields.push(encode_uint(U256::ZERO));
            fields.push(encode_uint(U256::ZERO));
        }
    }

    let payload_len: usize = fields.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload_len + 4);
    encode_list_header(&mut out, payload_len);
    for field in fields {
        out.extend_from_slice(&field);
    }
    out
}

/// Deterministic wallet for tests: the "signature" is a keccak-derived
/// digest of the request fields, so two identical requests produce
/// identical raw bytes and distinct requests almost surely differ.
pub struct MockWallet {
    address: Address,
}

impl MockWallet {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl Wallet for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_transaction(&self, tx: &TxRequest) -> Result<Bytes, ClientError> {
        let mut preimage = Vec::new();
        preimage.extend_from_slice(self.address.as_slice());
        preimage.extend_from_slice(tx.to.as_slice());
        preimage.extend_from_slice(&tx.nonce.to_be_bytes());
        preimage.extend_from_slice(&tx.gas.to_be_bytes());
        preimage.extend_from_slice(&tx.gas_price.to_be_bytes::<32>());
        preimage.extend_from_slice(&tx.value.to_be_bytes::<32>());
        preimage.extend_from_slice(&tx.chain_id.to_be_bytes());
        preimage.extend_from_slice(&tx.data);

        let digest = keccak256(&preimage);
        let mut raw = digest.to_vec();
        raw.extend_from_slice(&tx.data);
        Ok(Bytes::from(raw))
    }
}
