//! Manifest Controller
//!
//! Applies or deletes a multi-document manifest bundle against a cluster:
//! - Renders `${NAME}` placeholders from MANIFEST_VARS
//! - Resolves every kind through cluster discovery (CRDs included)
//! - Optionally waits for the deployed workload to appear
//!
//! Configuration is read from environment variables, see `config.rs`.

mod config;
mod controller;
mod error;
mod template;

use anyhow::Context;
use config::ControllerConfig;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("manifest_controller=info,manifest_engine=info")),
        )
        .init();

    info!("Starting Manifest Controller");

    let config = ControllerConfig::from_env().context("failed to load configuration")?;

    info!("Configuration:");
    info!("  Manifest: {}", config.manifest_path.display());
    info!("  Action: {:?}", config.action);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("from manifest"));
    info!("  Apply strategy: {:?}", config.engine.apply_strategy);

    let controller = Controller::connect(config)
        .await
        .context("failed to connect to cluster")?;
    controller
        .run()
        .await
        .context("manifest reconciliation failed")?;

    Ok(())
}
