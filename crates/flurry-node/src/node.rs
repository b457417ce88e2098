//! Flurry Node - wires configuration, record, loops and the HTTP API.
//!
//! Architecture:
//! - One shared record store per process
//! - One background task per position with a running consensus loop
//! - HTTP API for peers and clients (`/propose`, `/relay`, `/record`, `/stats`)

use crate::api::{self, AppState};
use crate::client::{HttpPeerClient, PeerClient};
use crate::config::NodeConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::handler::QueryHandler;
use crate::record::RecordStore;
use crate::round::RoundCoordinator;
use crate::stats::RequestStats;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Assemble a query handler (and its engine) around `client`.
pub fn build_handler(config: &NodeConfig, client: Arc<dyn PeerClient>, stats: Arc<RequestStats>) -> QueryHandler {
    let engine = Engine::new(
        config.node_id,
        config.network_size,
        config.params,
        config.round_interval,
        Arc::new(RecordStore::new()),
        RoundCoordinator::new(client),
    );
    QueryHandler::new(engine, stats)
}

/// A flurry node instance talking HTTP to its peers.
pub struct Node {
    config: NodeConfig,
    handler: QueryHandler,
    client: Arc<dyn PeerClient>,
}

impl Node {
    /// Create a node. Fails if the configuration is invalid.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(RequestStats::new());
        let client: Arc<dyn PeerClient> = Arc::new(HttpPeerClient::new(
            config.addresses.clone(),
            config.timeouts,
            Arc::clone(&stats),
        ));
        let handler = build_handler(&config, Arc::clone(&client), stats);

        Ok(Self {
            config,
            handler,
            client,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn handler(&self) -> &QueryHandler {
        &self.handler
    }

    /// The HTTP API for this node.
    pub fn router(&self) -> Router {
        api::build_router(AppState {
            handler: self.handler.clone(),
            client: Arc::clone(&self.client),
        })
    }

    /// Bind the configured listen address and serve until the process exits.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let params = self.config.params;
        tracing::info!("Flurry node {} starting", self.config.node_id);
        tracing::info!("  API: http://{}", listener.local_addr()?);
        tracing::info!("  Network: {} nodes", self.config.network_size);
        tracing::info!(
            "  Sampling: {} peers, majority {}, decide after {} rounds",
            params.sample_size,
            params.majority_threshold,
            params.counter_threshold
        );

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flurry_consensus::{ConsensusParams, NodeId};

    #[test]
    fn invalid_config_is_refused() {
        let config = NodeConfig::new(NodeId(1), 3).with_params(ConsensusParams::new(2, 3, 3));
        assert!(Node::new(config).is_err());
    }

    #[tokio::test]
    async fn new_node_starts_empty() {
        let node = Node::new(NodeConfig::new(NodeId(2), 5)).unwrap();
        let snapshot = node.handler().snapshot().await;
        assert_eq!(snapshot.active_loops, 0);
        assert_eq!(snapshot.inbound_proposals, 0);
        assert_eq!(node.config().node_id, NodeId(2));
    }
}
