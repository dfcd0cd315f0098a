//! Operator entry point.

use anyhow::Result;
use kube::Client;
use tracing::info;

use datastack_operator::config::ControllerConfig;
use datastack_operator::{observability, runtime};

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = ControllerConfig::from_env();
    observability::init(&config);
    info!("starting datastack operator");

    let client = Client::try_default().await?;
    runtime::run(client, config).await
}
