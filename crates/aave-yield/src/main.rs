//! Aave v3 yield tracker CLI
//!
//! Fetches aToken balances and supply history over JSON-RPC and prints
//! balance, interest and APY per tracked asset.

use std::path::Path;
use std::sync::Arc;

use aave_yield::assets;
use aave_yield::calculator::SourceFactory;
use aave_yield::config::RpcSettings;
use aave_yield::display::{render_json, render_view};
use aave_yield::settings::account_key;
use aave_yield::{
    Address, AppConfig, Clock, EndpointConfig, FileSettingsStore, LedgerSource, PositionView,
    RpcLedgerSource, SettingsStore, SystemClock, YieldCalculator,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aave-yield")]
#[command(about = "Aave v3 supply balance, interest and APY tracker", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "aave-yield.toml")]
    config: String,

    /// Settings file path (overrides the config file)
    #[arg(long)]
    settings: Option<String>,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Subtract withdrawals from supplied amount and exposure
    #[arg(long)]
    include_withdrawals: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch balance, interest and APY
    Fetch {
        /// Account address (defaults to the last one used per asset)
        #[arg(short, long)]
        account: Option<String>,

        /// Asset symbol, or `all`
        #[arg(long, default_value = "all")]
        asset: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show or change the JSON-RPC endpoint
    #[command(subcommand)]
    Endpoint(EndpointCommands),

    /// List tracked assets
    Assets,
}

#[derive(Subcommand)]
enum EndpointCommands {
    /// Print the current endpoint
    Show,

    /// Use a new endpoint
    Set { url: String },

    /// Restore the default endpoint
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_exists = Path::new(&cli.config).exists();
    let mut config = if config_exists {
        AppConfig::load(&cli.config)?
    } else {
        AppConfig::default()
    };

    if let Some(log_level) = cli.log_level.clone() {
        config.monitoring.log_level = log_level;
    }
    if let Some(settings) = cli.settings.clone() {
        config.settings.path = settings.into();
    }
    if cli.include_withdrawals {
        config.yield_policy.include_withdrawals = true;
    }

    // Initialize logging
    init_logging(&config)?;

    if !config_exists {
        warn!("Config file not found, using defaults: {}", cli.config);
    }
    config.validate()?;

    let store: Arc<dyn SettingsStore> = Arc::new(FileSettingsStore::open(&config.settings.path)?);
    let endpoint = Arc::new(EndpointConfig::load(store.clone()));

    match cli.command {
        Commands::Fetch {
            account,
            asset,
            json,
        } => fetch(&config, store, endpoint, account.as_deref(), &asset, json).await,
        Commands::Endpoint(command) => {
            match command {
                EndpointCommands::Show => {}
                EndpointCommands::Set { url } => endpoint.set(&url)?,
                EndpointCommands::Reset => endpoint.reset_to_default()?,
            }
            let marker = if endpoint.is_default() { " (default)" } else { "" };
            println!("{}{}", endpoint.get(), marker);
            Ok(())
        }
        Commands::Assets => {
            for asset in &config.assets {
                println!(
                    "{:<6} underlying {}  aToken {}  decimals {}",
                    asset.symbol, asset.underlying, asset.a_token, asset.decimals
                );
            }
            Ok(())
        }
    }
}

async fn fetch(
    config: &AppConfig,
    store: Arc<dyn SettingsStore>,
    endpoint: Arc<EndpointConfig>,
    account: Option<&str>,
    symbol: &str,
    json: bool,
) -> Result<()> {
    let selected = assets::select(&config.assets, symbol);
    if selected.is_empty() {
        bail!("Unknown asset '{}'", symbol);
    }

    let rpc: RpcSettings = config.rpc.clone();
    let factory: SourceFactory =
        Arc::new(move |url: &str| Arc::new(RpcLedgerSource::new(url, &rpc)) as Arc<dyn LedgerSource>);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let calculator = Arc::new(YieldCalculator::new(
        config.pool.address,
        config.yield_policy,
        factory,
        &endpoint.get(),
        clock.clone(),
    ));
    endpoint.subscribe(calculator.clone());

    info!("Using endpoint {}", endpoint.get());

    let mut views = Vec::with_capacity(selected.len());
    for asset in selected {
        let key = account_key(&asset.symbol);
        let account_text = match account {
            Some(account) => account.to_string(),
            None => store.get(&key, ""),
        };
        if account_text.is_empty() {
            bail!("No account given for {} and none stored; pass --account", asset.symbol);
        }

        let address: Address = account_text
            .parse()
            .with_context(|| format!("Invalid account for {}", asset.symbol))?;
        store.set(&key, &account_text)?;

        calculator.refresh(&address, asset).await;
        views.push((asset.symbol.clone(), calculator.view(&asset.symbol)));
    }

    if json {
        println!("{}", render_json(&views)?);
    } else {
        let now = clock.now();
        for (symbol, view) in &views {
            print!("{}", render_view(symbol, view, now));
        }
    }

    let failed = views
        .iter()
        .filter(|(_, view)| matches!(view, PositionView::Failed { .. }))
        .count();
    if failed > 0 {
        bail!("{} of {} fetches failed", failed, views.len());
    }
    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = config
        .monitoring
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("aave_yield={}", log_level).into());

    // Logs go to stderr so JSON output stays parseable
    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
