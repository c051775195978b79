use anyhow::{Context, Result};
use berachain_farmer::{
    ChainClient, ChainRpc, ContractCallGateway, ContractRegistry, FarmConfig, TransactionPipeline,
    YieldFarmer,
};
use clap::Parser;
use core_logic::{setup_logger, WalletManager, WalletSource, WorkerRunner};
use dialoguer::{theme::ColorfulTheme, Password};
use dotenv::dotenv;
use ethers::signers::Signer;
use std::env;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/berachain/config.toml")]
    config: String,
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
    /// Override the configured interval between cycles
    #[arg(long)]
    interval_secs: Option<u64>,
    /// Harvest only this pool (repeatable), e.g. --vault HONEY_WBERA
    #[arg(long = "vault")]
    vaults: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Keep guard alive for file logging
    let _log_guard = setup_logger("farmer");
    dotenv().ok();

    let args = Args::parse();
    info!("Loading config from: {}", args.config);

    let config = FarmConfig::load(&args.config)?;
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    let registry = config.registry()?.only_vaults(&args.vaults)?;
    info!(
        "Configuration loaded for {} ({} vaults, ceiling {})",
        config.chain.name,
        registry.vaults.len(),
        config.gas_config()?.ceiling()
    );

    let password = wallet_password(&config.wallet)?;
    let key = WalletManager::load_private_key(&config.wallet, password.as_deref())
        .context("Failed to load private key")?;

    let client = ChainClient::connect(&config.chain_config(), &key, config.request_timeout()).await?;
    drop(key);

    let settings = config.farm_settings()?;
    log_wallet_balances(&client, &registry).await;

    let pipeline = TransactionPipeline::new(&client, config.pipeline_config());
    let farmer = YieldFarmer::new(&client, &registry, pipeline, settings);

    let runner = config.runner_config(args.once, args.interval_secs);
    let token = WorkerRunner::shutdown_on_ctrl_c();
    WorkerRunner::run_periodic(&farmer, &runner, token).await?;

    Ok(())
}

/// `WALLET_PASSWORD` first, interactive prompt as fallback.
fn wallet_password(source: &WalletSource) -> Result<Option<String>> {
    if !source.needs_password() {
        return Ok(None);
    }

    if let Ok(password) = env::var("WALLET_PASSWORD") {
        return Ok(Some(password));
    }

    error!("WALLET_PASSWORD environment variable is not set.");
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter wallet password")
        .interact()
        .context("Cannot prompt for password (not a terminal). Set WALLET_PASSWORD")?;

    Ok(Some(password))
}

async fn log_wallet_balances<R: ChainRpc, S: Signer>(
    client: &ChainClient<R, S>,
    registry: &ContractRegistry,
) {
    for token in registry.tokens.iter().chain([&registry.reward_token]) {
        match client.rpc().balance_of(token.address, client.address()).await {
            Ok(balance) => info!("{} balance: {}", token.name, token.format(balance)),
            Err(e) => warn!("Failed to read {} balance: {}", token.name, e),
        }
    }
}
