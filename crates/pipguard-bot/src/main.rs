//! pipguard - automated TP securing for multi-leg positions.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Multi-account TP securing bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PIPGUARD_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Monitor only the named account
    #[arg(short, long)]
    account: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    pipguard_telemetry::init_logging()?;

    info!("Starting pipguard v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > PIPGUARD_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PIPGUARD_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = pipguard_bot::AppConfig::from_file(&config_path)?;

    if let Some(account) = &args.account {
        config.accounts.retain(|a| &a.name == account);
        if config.accounts.is_empty() {
            anyhow::bail!("account {account:?} not found in configuration");
        }
    }

    info!(
        accounts = config.accounts.len(),
        progressive = config.engine.progressive,
        "Configuration loaded"
    );

    let app = pipguard_bot::Application::new(config);
    app.run().await?;

    Ok(())
}
