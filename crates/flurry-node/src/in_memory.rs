//! In-process network: peer queries call other nodes' handlers directly.
//!
//! Used for simulations and tests. Nodes can be switched offline to model
//! unreachable peers without sockets or timeouts.

use crate::client::{PeerClient, QueryMode};
use crate::config::NodeConfig;
use crate::handler::QueryHandler;
use crate::node::build_handler;
use crate::stats::RequestStats;
use async_trait::async_trait;
use flurry_consensus::{ConsensusParams, NodeId, PeerReply, Proposal};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Registry of every node's handler plus the set of offline nodes.
#[derive(Default)]
pub struct InMemoryNetwork {
    handlers: RwLock<HashMap<NodeId, QueryHandler>>,
    offline: RwLock<HashSet<NodeId>>,
}

impl InMemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A [`PeerClient`] for `node`, counting its outbound queries in `stats`.
    pub fn client_for(self: &Arc<Self>, stats: Arc<RequestStats>) -> Arc<InMemoryClient> {
        Arc::new(InMemoryClient {
            network: Arc::clone(self),
            stats,
        })
    }

    pub async fn register(&self, id: NodeId, handler: QueryHandler) {
        self.handlers.write().await.insert(id, handler);
    }

    /// Make `id` unreachable (`false`) or reachable again (`true`).
    pub async fn set_online(&self, id: NodeId, online: bool) {
        let mut offline = self.offline.write().await;
        if online {
            offline.remove(&id);
        } else {
            offline.insert(id);
        }
    }

    async fn deliver(&self, peer: NodeId, proposal: &Proposal) -> PeerReply {
        if self.offline.read().await.contains(&peer) {
            return PeerReply::Unreachable;
        }
        let handler = self.handlers.read().await.get(&peer).cloned();
        match handler {
            Some(handler) => PeerReply::from_accept(handler.on_propose(proposal.clone()).await),
            None => PeerReply::Unreachable,
        }
    }
}

/// One node's view of an [`InMemoryNetwork`].
pub struct InMemoryClient {
    network: Arc<InMemoryNetwork>,
    stats: Arc<RequestStats>,
}

#[async_trait]
impl PeerClient for InMemoryClient {
    async fn query(&self, peer: NodeId, proposal: &Proposal, _mode: QueryMode) -> PeerReply {
        self.stats.record_outbound();
        self.network.deliver(peer, proposal).await
    }
}

/// `network_size` nodes wired together over one [`InMemoryNetwork`].
pub struct InMemoryCluster {
    pub network: Arc<InMemoryNetwork>,
    handlers: Vec<QueryHandler>,
}

impl InMemoryCluster {
    /// Build and register every node `1..=network_size`.
    pub async fn new(network_size: usize, params: ConsensusParams, round_interval: Duration) -> crate::Result<Self> {
        let network = InMemoryNetwork::new();
        let mut handlers = Vec::with_capacity(network_size);

        for id in 1..=network_size as u32 {
            let config = NodeConfig::new(NodeId(id), network_size)
                .with_params(params)
                .with_round_interval(round_interval);
            config.validate()?;

            let stats = Arc::new(RequestStats::new());
            let client = network.client_for(Arc::clone(&stats));
            let handler = build_handler(&config, client, stats);
            network.register(NodeId(id), handler.clone()).await;
            handlers.push(handler);
        }

        Ok(Self { network, handlers })
    }

    /// Handler of node `id` (1-based). `None` outside `1..=len`.
    pub fn node(&self, id: u32) -> Option<&QueryHandler> {
        (id as usize).checked_sub(1).and_then(|idx| self.handlers.get(idx))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &QueryHandler)> {
        self.handlers
            .iter()
            .enumerate()
            .map(|(idx, h)| (NodeId(idx as u32 + 1), h))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flurry_consensus::Position;

    #[tokio::test]
    async fn offline_nodes_are_unreachable() {
        let cluster = InMemoryCluster::new(3, ConsensusParams::new(1, 2, 1), Duration::ZERO)
            .await
            .unwrap();
        let stats = Arc::new(RequestStats::new());
        let client = cluster.network.client_for(Arc::clone(&stats));
        let proposal = Proposal::new(Position(1), "x");

        cluster.network.set_online(NodeId(2), false).await;
        assert_eq!(client.query(NodeId(2), &proposal, QueryMode::Direct).await, PeerReply::Unreachable);
        assert!(cluster.node(2).unwrap().read(Position(1)).await.is_none());

        cluster.network.set_online(NodeId(2), true).await;
        assert_eq!(client.query(NodeId(2), &proposal, QueryMode::Direct).await, PeerReply::Agree);
        assert_eq!(stats.outbound_queries(), 2);
    }

    #[tokio::test]
    async fn unknown_node_is_unreachable() {
        let network = InMemoryNetwork::new();
        let client = network.client_for(Arc::new(RequestStats::new()));
        let reply = client
            .query(NodeId(4), &Proposal::new(Position(1), "x"), QueryMode::Relay)
            .await;
        assert_eq!(reply, PeerReply::Unreachable);
    }

    #[tokio::test]
    async fn node_lookup_is_one_based() {
        let cluster = InMemoryCluster::new(3, ConsensusParams::new(1, 2, 1), Duration::ZERO)
            .await
            .unwrap();
        assert!(cluster.node(0).is_none());
        assert!(cluster.node(4).is_none());
        let (id, last) = cluster.nodes().last().unwrap();
        assert_eq!(id, NodeId(3));
        assert!(std::ptr::eq(cluster.node(3).unwrap(), last));
    }
}
