use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use oracle_client::{HttpChainClient, PrivateKeyWallet, SubmitOptions, Wallet};
use oracle_consensus::{apply_ready, read_threshold, scan_commitments, select_ready, ScanConfig};
use oracle_core::HeaderEncodeOptions;
use oracle_keeper::config::AppConfig;
use oracle_keeper::keeper;
use oracle_keeper::prover::{generate_proof, submit_proof, Proofs};

const DEFAULT_CONFIG: &str = "configs/keeper.toml";

#[derive(Parser, Debug)]
#[command(name = "oracle-keeper")]
struct Args {
    #[command(subcommand)]
    command: Option<Cli>,
}

#[derive(Parser, Debug)]
#[command(name = "oracle-keeper")]
enum Cli {
    /// Run the keeper loop: apply on the destination oracle and prove the
    /// configured slots on every interval (default).
    Watch {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// One-shot: scan commitments and apply every pair that meets the
    /// threshold.
    Apply {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
    /// One-shot: generate header.txt and proof.txt for a block.
    Generate {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Source chain block number; defaults to the chain head.
        #[arg(long)]
        block: Option<u64>,
    },
    /// One-shot: submit previously generated proof files.
    Prove {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = Args::parse();
    let cmd = args.command.unwrap_or(Cli::Watch {
        config: PathBuf::from(DEFAULT_CONFIG),
    });

    match cmd {
        Cli::Watch { config } => run_watch(config).await,
        Cli::Apply { config } => run_apply(config).await,
        Cli::Generate { config, block } => run_generate(config, block).await,
        Cli::Prove { config } => run_prove(config).await,
    }
}

fn submit_options(cfg: &AppConfig) -> SubmitOptions {
    SubmitOptions {
        receipt_timeout: Duration::from_secs(cfg.keeper.receipt_timeout_secs),
        ..SubmitOptions::default()
    }
}

async fn run_watch(config_path: PathBuf) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    let source = HttpChainClient::new(&cfg.source.rpc_url)?;
    let destination = HttpChainClient::new(&cfg.destination.rpc_url)?;
    let wallet = PrivateKeyWallet::from_hex(&cfg.wallet.private_key)?;

    info!(
        source = %cfg.source.rpc_url,
        destination = %cfg.destination.rpc_url,
        keeper = %wallet.address(),
        "starting block hash oracle keeper"
    );

    keeper::run(&source, &destination, &wallet, &cfg)
        .await
        .context("keeper loop failed")
}

async fn run_apply(config_path: PathBuf) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    let destination = HttpChainClient::new(&cfg.destination.rpc_url)?;
    let wallet = PrivateKeyWallet::from_hex(&cfg.wallet.private_key)?;
    let oracle = cfg.contracts.block_hash_oracle;

    let scan = ScanConfig {
        lookback_blocks: cfg.keeper.lookback_blocks,
        chunk_size: cfg.keeper.chunk_size,
    };
    let commitments = scan_commitments(&destination, oracle, &scan).await?;
    let threshold = read_threshold(&destination, oracle).await?;
    info!(
        pairs = commitments.len(),
        threshold, "scanned commitment window"
    );

    let ready = select_ready(&destination, oracle, &commitments, threshold).await?;
    if ready.is_empty() {
        info!("nothing ready to apply");
        return Ok(());
    }

    let submit = submit_options(&cfg);
    for item in &ready {
        let tx = apply_ready(&destination, &wallet, oracle, item, &submit).await?;
        println!("applied block {} in tx {tx}", item.number);
    }
    Ok(())
}

async fn run_generate(config_path: PathBuf, block: Option<u64>) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    let source = HttpChainClient::new(&cfg.source.rpc_url)?;
    let keys = cfg.storage_keys()?;
    let options = HeaderEncodeOptions {
        force_zero_nonce: cfg.prover.force_zero_nonce,
    };

    let number = match block {
        Some(n) => n,
        None => {
            use oracle_client::ChainClient;
            source.block_number().await?
        }
    };

    let proofs = generate_proof(&source, cfg.contracts.proved_account, &keys, number, &options)
        .await
        .with_context(|| format!("proof generation for block {number} failed"))?;
    proofs.write_to_dir(&cfg.prover.output_dir)?;
    println!(
        "wrote proof files for block {number} to {}",
        cfg.prover.output_dir.display()
    );
    Ok(())
}

async fn run_prove(config_path: PathBuf) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    let destination = HttpChainClient::new(&cfg.destination.rpc_url)?;
    let wallet = PrivateKeyWallet::from_hex(&cfg.wallet.private_key)?;

    let proofs = Proofs::read_from_dir(&cfg.prover.output_dir)
        .with_context(|| format!("reading proof files from {}", cfg.prover.output_dir.display()))?;
    let tx = submit_proof(
        &destination,
        &wallet,
        cfg.contracts.state_prover,
        &proofs,
        &submit_options(&cfg),
    )
    .await?;
    println!("proof submitted in tx {tx}");
    Ok(())
}
