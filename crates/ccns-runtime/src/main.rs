//! # CCNS Runtime Binary
//!
//! Runs the name service scenario once against a local transport.

use anyhow::{ensure, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ccns_runtime::{Deployment, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = RuntimeConfig::load().context("loading runtime configuration")?;

    info!("===========================================");
    info!("  CCNS Runtime v{}", ccns::VERSION);
    info!("  Domain: {}", config.network.domain_id);
    info!("===========================================");

    let deployment = Deployment::deploy(&config).context("deploying components")?;
    let report = deployment
        .run_scenario(config.registrant, &config.name)
        .await
        .with_context(|| format!("registering `{}`", config.name))?;

    for failed in &report.registration.failed {
        warn!(
            "Send to domain {} rejected: {}",
            failed.destination, failed.reason
        );
    }
    for failed in deployment.transport.failed() {
        warn!(
            "Delivery {} failed: {}",
            failed.delivery.message.message_id, failed.error
        );
    }

    info!(
        "`{}` -> source {} / destination {} ({} of {} delivered)",
        report.registration.name,
        report.source_owner,
        report.destination_owner,
        report.delivered,
        report.registration.fan_out()
    );
    ensure!(
        report.destination_owner == config.registrant,
        "`{}` did not resolve on the destination domain",
        config.name
    );

    Ok(())
}
