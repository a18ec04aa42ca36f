//! Plexus station binary
//!
//! Runs one station of the capability mesh, configured from `PLEXUS_*`
//! environment variables.

use plexus_node::{NodeConfig, StationNode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plexus_node=info,plexus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Plexus station");

    let config = NodeConfig::from_env()?;

    let node = StationNode::new(config).await?;
    node.run().await?;

    Ok(())
}
