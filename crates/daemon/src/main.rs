// vaultsyncd: standalone mode entry point.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("starting standalone vaultsync daemon");
    vaultsync_daemon::runtime::run_standalone(None)
        .await
        .context("standalone daemon terminated unexpectedly")
}
