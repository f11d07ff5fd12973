//! Replica-set command handler

use anyhow::{Context, Result};
use tracing::info;

use soldcars_core::{ClusterBootstrap, Config};

use crate::output::Output;

/// Initiate the replica set if needed and wait for every member to serve
pub async fn replica(config: &Config, output: &Output) -> Result<()> {
    let settings = config.bootstrap_settings()?;
    let bootstrap = ClusterBootstrap::connect(&settings)?;
    info!(
        "Bootstrapping '{}' via {} (timeout {:?})",
        settings.replica_set,
        bootstrap.desired_config().contact_host(),
        bootstrap.timeout()
    );

    let result = bootstrap.run().await;
    bootstrap.into_admin().close().await;
    let elapsed = result.context("Replica set bootstrap failed")?;

    output.success(&format!(
        "Replica set '{}' is ready after {:.1}s",
        settings.replica_set,
        elapsed.as_secs_f64()
    ));
    Ok(())
}
