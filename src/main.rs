use anyhow::Context;
use autotrader::config::{Cli, TraderConfig};
use autotrader::execution::{AutoTrader, TerminalPrompt};
use autotrader::BittrexClient;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = TraderConfig::load(cli).context("Invalid configuration")?;

    tracing::info!("🚀 AutoTrader starting");
    tracing::info!("📊 Configuration:");
    tracing::info!("  Market: {}", config.market);
    tracing::info!("  Units: {}", config.units);
    tracing::info!(
        "  Spread: +{}% / -{}%",
        config.spread.markup * rust_decimal::Decimal::ONE_HUNDRED,
        config.spread.markdown * rust_decimal::Decimal::ONE_HUNDRED
    );
    tracing::info!("  Method: {}", config.method);
    tracing::info!("  Delay: {:?}", config.delay);

    let client = BittrexClient::new(config.credentials.clone())
        .context("Failed to create Bittrex client")?;
    let mut trader = AutoTrader::new(&config, client, Box::new(TerminalPrompt::stdio()));

    trader.run().await.context("Trading stopped")?;

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autotrader=info")),
        )
        .init();
}
