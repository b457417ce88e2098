//! Outbound peer queries.
//!
//! A query sends one position/value pair to one peer and maps the answer to
//! a [`PeerReply`]. Transport failures of any kind become
//! [`PeerReply::Unreachable`] and are never reported as disagreement.

use crate::address::AddressTable;
use crate::config::QueryTimeouts;
use crate::stats::RequestStats;
use crate::wire::{ProposeRequest, ProposeResponse, PROPOSE_ENDPOINT};
use async_trait::async_trait;
use flurry_consensus::{NodeId, PeerReply, Proposal};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Which timeout budget a query runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Issued by this node's own consensus loop.
    Direct,
    /// Forwarded on behalf of another caller.
    Relay,
}

impl QueryMode {
    pub fn timeout(self, timeouts: &QueryTimeouts) -> Duration {
        match self {
            Self::Direct => timeouts.direct,
            Self::Relay => timeouts.relay,
        }
    }
}

/// Something that can ask a peer about a proposal.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Ask `peer` whether it agrees with `proposal`.
    async fn query(&self, peer: NodeId, proposal: &Proposal, mode: QueryMode) -> PeerReply;
}

/// [`PeerClient`] speaking JSON over HTTP to other nodes' `/propose`.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    http: reqwest::Client,
    addresses: AddressTable,
    timeouts: QueryTimeouts,
    stats: Arc<RequestStats>,
}

impl HttpPeerClient {
    pub fn new(addresses: AddressTable, timeouts: QueryTimeouts, stats: Arc<RequestStats>) -> Self {
        Self {
            http: reqwest::Client::new(),
            addresses,
            timeouts,
            stats,
        }
    }

    async fn post(&self, peer: NodeId, proposal: &Proposal, mode: QueryMode) -> crate::Result<bool> {
        let addr = self.addresses.get(peer)?;
        let url = format!("http://{}{}", addr, PROPOSE_ENDPOINT);
        let body = ProposeRequest::from(proposal.clone());

        let response = self
            .http
            .post(&url)
            .timeout(mode.timeout(&self.timeouts))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let answer: ProposeResponse = response.json().await?;
        Ok(answer.success)
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn query(&self, peer: NodeId, proposal: &Proposal, mode: QueryMode) -> PeerReply {
        self.stats.record_outbound();
        match self.post(peer, proposal, mode).await {
            Ok(accept) => PeerReply::from_accept(accept),
            Err(e) => {
                debug!("Peer {} unreachable for position {}: {}", peer, proposal.position, e);
                PeerReply::Unreachable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use flurry_consensus::Position;

    #[test]
    fn relay_gets_the_longer_timeout() {
        let timeouts = QueryTimeouts::default();
        assert!(QueryMode::Relay.timeout(&timeouts) > QueryMode::Direct.timeout(&timeouts));
    }

    #[tokio::test]
    async fn unknown_peer_is_unreachable_and_counted() {
        let stats = Arc::new(RequestStats::new());
        let client = HttpPeerClient::new(
            AddressTable::from_addresses(["127.0.0.1:1"]),
            QueryTimeouts::default(),
            Arc::clone(&stats),
        );
        let reply = client
            .query(NodeId(5), &Proposal::new(Position(1), "x"), QueryMode::Direct)
            .await;
        assert_eq!(reply, PeerReply::Unreachable);
        assert_eq!(stats.outbound_queries(), 1);
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpPeerClient::new(
            AddressTable::from_addresses([addr.to_string()]),
            QueryTimeouts::default(),
            Arc::new(RequestStats::new()),
        );
        let reply = client
            .query(NodeId(1), &Proposal::new(Position(1), "x"), QueryMode::Direct)
            .await;
        assert_eq!(reply, PeerReply::Unreachable);
    }

    /// Serve `router` on a loopback port and address it as node 1.
    async fn peer(router: axum::Router) -> AddressTable {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });
        AddressTable::from_addresses([addr.to_string()])
    }

    async fn ask(addresses: AddressTable, timeouts: QueryTimeouts) -> (PeerReply, u64) {
        let stats = Arc::new(RequestStats::new());
        let client = HttpPeerClient::new(addresses, timeouts, Arc::clone(&stats));
        let reply = client
            .query(NodeId(1), &Proposal::new(Position(1), "x"), QueryMode::Direct)
            .await;
        (reply, stats.outbound_queries())
    }

    #[tokio::test]
    async fn refusal_is_disagreement() {
        let addresses = peer(Router::new().route(
            PROPOSE_ENDPOINT,
            post(|| async { Json(ProposeResponse { success: false }) }),
        ))
        .await;
        assert_eq!(ask(addresses, QueryTimeouts::default()).await, (PeerReply::Disagree, 1));
    }

    #[tokio::test]
    async fn slow_peer_times_out_as_unreachable() {
        let addresses = peer(Router::new().route(
            PROPOSE_ENDPOINT,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(ProposeResponse { success: true })
            }),
        ))
        .await;
        let timeouts = QueryTimeouts {
            direct: Duration::from_millis(50),
            relay: Duration::from_millis(80),
        };
        assert_eq!(ask(addresses, timeouts).await, (PeerReply::Unreachable, 1));
    }

    #[tokio::test]
    async fn undecodable_body_is_unreachable() {
        let addresses = peer(Router::new().route(PROPOSE_ENDPOINT, post(|| async { "yes" }))).await;
        assert_eq!(ask(addresses, QueryTimeouts::default()).await, (PeerReply::Unreachable, 1));
    }

    #[tokio::test]
    async fn server_error_is_unreachable() {
        // The body would say `success: true`; the status wins.
        let addresses = peer(Router::new().route(
            PROPOSE_ENDPOINT,
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ProposeResponse { success: true }),
                )
            }),
        ))
        .await;
        assert_eq!(ask(addresses, QueryTimeouts::default()).await, (PeerReply::Unreachable, 1));
    }
}
