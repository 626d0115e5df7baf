//! Spot/futures basis monitor - Entry Point

use anyhow::Result;
use basis_telemetry::LogTarget;
use clap::Parser;
use tracing::info;

/// Spot/futures basis monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via BASIS_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    basis_ws::init_crypto();

    let args = Args::parse();

    // Config path: CLI arg > BASIS_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("BASIS_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = basis_monitor::AppConfig::load(&config_path)?;

    let target = if config.render.enabled {
        LogTarget::Stderr
    } else {
        LogTarget::Stdout
    };
    basis_telemetry::init_logging(target)?;

    info!("Starting basis monitor v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %config_path, symbol = %config.symbol, "Configuration loaded");

    let app = basis_monitor::Application::new(config)?;
    app.run().await?;

    Ok(())
}
