//! Flurry Node binary
//!
//! `flurry-node <NODE_ID> <NETWORK_SIZE> [OPTIONS]`

use clap::Parser;
use flurry_node::{Node, NodeArgs};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flurry_node=info,flurry_consensus=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NodeArgs::parse().into_config()?;
    tracing::info!("Starting Flurry node {}", config.node_id);

    let node = Node::new(config)?;
    node.run().await?;

    Ok(())
}
