//! Parley Relay - Main entry point.

use anyhow::Result;
use parley_common::config::Config;
use parley_common::logging::init_logging;
use parley_common::util::mask_secret;
use parley_relay::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = std::time::Instant::now();

    // Load configuration
    let (config, load_report) = Config::load_with_env()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Parley Relay v{}", env!("CARGO_PKG_VERSION"));
    load_report.log();

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        anyhow::bail!("invalid configuration: {e}");
    }

    if let Some(key) = config.llm.api_key.as_deref() {
        tracing::info!(
            api_key = %mask_secret(key),
            base_url = %config.llm.base_url,
            "Completion API configured"
        );
    }

    let startup_duration = startup_start.elapsed();
    tracing::info!(
        duration_ms = startup_duration.as_millis() as u64,
        "Service initialized in {:?}",
        startup_duration
    );

    // Start the HTTP server
    start_server(&config).await
}
