//! fixprobe - Entry Point

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Gateway conformance probe
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via FIXPROBE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Determine config path: CLI arg > FIXPROBE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("FIXPROBE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let mut config = fixprobe_client::AppConfig::from_file(&config_path)?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    fixprobe_telemetry::init_logging(&config.log_level)?;
    info!(
        config_path = %config_path,
        "Starting fixprobe v{}",
        env!("CARGO_PKG_VERSION")
    );

    let outcome = fixprobe_client::App::new(config)?.run().await?;
    info!(?outcome, "Exiting");

    Ok(ExitCode::from(outcome.exit_code()))
}
