use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use alloy_primitives::{Address, U256};
use oracle_core::{SlotPath, StorageKey};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,
    pub contracts: ContractsConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub prover: ProverConfig,
    #[serde(default)]
    pub keeper: KeeperConfig,
}

/// One chain endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub rpc_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    /// Consensus oracle on the destination chain (commit/apply/threshold).
    pub block_hash_oracle: Address,
    /// Destination-chain oracle with the no-arg apply.
    pub rollup_oracle: Address,
    /// State prover consuming header and proof blobs.
    pub state_prover: Address,
    /// Account on the source chain whose storage is proven.
    pub proved_account: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Raw private key; usually an `env:VAR` reference.
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProverConfig {
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
    #[serde(default)]
    pub force_zero_nonce: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            force_zero_nonce: false,
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,
    #[serde(default = "default_lookback")]
    pub lookback_blocks: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval(),
            poll_interval_ms: default_poll_interval(),
            receipt_timeout_secs: default_receipt_timeout(),
            lookback_blocks: default_lookback(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("proofs")
}
fn default_update_interval() -> u64 {
    3600
}
fn default_poll_interval() -> u64 {
    12_000
}
fn default_receipt_timeout() -> u64 {
    120
}
fn default_lookback() -> u64 {
    7200
}
fn default_chunk_size() -> u64 {
    1024
}

/// One storage slot to prove: a base slot plus mapping keys in order.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotSpec {
    pub base_slot: u64,
    #[serde(default)]
    pub keys: Vec<KeySpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum KeySpec {
    /// Decimal or 0x-prefixed integer key.
    Uint(String),
    Address(Address),
}

impl SlotSpec {
    pub fn storage_key(&self) -> Result<StorageKey> {
        let mut path = SlotPath::new(U256::from(self.base_slot));
        for key in &self.keys {
            path = match key {
                KeySpec::Uint(raw) => {
                    let value: U256 = raw
                        .parse()
                        .with_context(|| format!("invalid uint slot key: {raw}"))?;
                    path.key_uint(value)
                }
                KeySpec::Address(addr) => path.key_address(*addr),
            };
        }
        Ok(path.derive())
    }
}

impl AppConfig {
    pub fn from_toml(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config file: {}", path.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("failed parsing config toml")?;

        // Env overrides (explicit) first.
        if let Ok(v) = env::var("SOURCE_RPC_URL") {
            if !v.trim().is_empty() {
                cfg.source.rpc_url = v;
            }
        }
        if let Ok(v) = env::var("DEST_RPC_URL") {
            if !v.trim().is_empty() {
                cfg.destination.rpc_url = v;
            }
        }

        // Resolve env:VAR references.
        cfg.source.rpc_url = resolve_env_ref(&cfg.source.rpc_url)?;
        cfg.destination.rpc_url = resolve_env_ref(&cfg.destination.rpc_url)?;
        cfg.wallet.private_key = resolve_env_ref(&cfg.wallet.private_key)?;

        if cfg.keeper.update_interval_secs == 0 {
            return Err(anyhow!("keeper.update_interval_secs must be > 0"));
        }
        if cfg.keeper.chunk_size == 0 {
            return Err(anyhow!("keeper.chunk_size must be > 0"));
        }
        // Slot specs must resolve; fail at load rather than mid-loop.
        for slot in &cfg.prover.slots {
            slot.storage_key()?;
        }

        Ok(cfg)
    }

    /// Resolved storage keys in config order.
    pub fn storage_keys(&self) -> Result<Vec<StorageKey>> {
        self.prover.slots.iter().map(SlotSpec::storage_key).collect()
    }
}

pub fn resolve_env_ref(value: &str) -> Result<String> {
    const PREFIX: &str = "env:";
    if let Some(var) = value.strip_prefix(PREFIX) {
        let var = var.trim();
        if var.is_empty() {
            return Err(anyhow!("invalid env ref: {value}"));
        }
        return env::var(var).with_context(|| format!("missing env var {var} for {value}"));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASE_CONFIG: &str = r#"
[source]
rpc_url = "http://source.example"

[destination]
rpc_url = "env:KEEPER_TEST_DEST_URL"

[contracts]
block_hash_oracle = "0x0000000000000000000000000000000000000001"
rollup_oracle = "0x0000000000000000000000000000000000000002"
state_prover = "0x0000000000000000000000000000000000000003"
proved_account = "0x0000000000000000000000000000000000000004"

[wallet]
private_key = "0x4646464646464646464646464646464646464646464646464646464646464646"

[[prover.slots]]
base_slot = 2

[[prover.slots]]
base_slot = 3
keys = [
    { type = "address", value = "0x0000000000000000000000000000000000000005" },
    { type = "uint", value = "42" },
]
"#;

    #[test]
    fn resolve_env_ref_reads_env_var() {
        env::set_var("KEEPER_TEST_ENV_REF", "http://example.com");
        let resolved = resolve_env_ref("env:KEEPER_TEST_ENV_REF").unwrap();
        assert_eq!(resolved, "http://example.com");
    }

    #[test]
    fn from_toml_resolves_refs_and_defaults() {
        env::set_var("KEEPER_TEST_DEST_URL", "http://dest.example");

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{BASE_CONFIG}").unwrap();

        let cfg = AppConfig::from_toml(f.path()).unwrap();
        assert_eq!(cfg.destination.rpc_url, "http://dest.example");
        assert_eq!(cfg.keeper.update_interval_secs, 3600);
        assert_eq!(cfg.keeper.chunk_size, 1024);
        assert!(!cfg.prover.force_zero_nonce);
        assert_eq!(cfg.storage_keys().unwrap().len(), 2);
    }

    #[test]
    fn bare_slot_key_is_base_word() {
        let slot = SlotSpec {
            base_slot: 2,
            keys: vec![],
        };
        let key = slot.storage_key().unwrap();
        assert_eq!(key.as_slice()[31], 2);
    }

    #[test]
    fn invalid_uint_key_fails_at_load() {
        env::set_var("KEEPER_TEST_DEST_URL", "http://dest.example");

        let broken = BASE_CONFIG.replace("value = \"42\"", "value = \"not-a-number\"");
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{broken}").unwrap();

        assert!(AppConfig::from_toml(f.path()).is_err());
    }
}
