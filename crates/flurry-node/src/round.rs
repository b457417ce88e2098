//! One sampling round: fan out, wait for everyone, tally.

use crate::client::{PeerClient, QueryMode};
use crate::error::{Error, Result};
use flurry_consensus::{NodeId, PeerReply, Proposal, RoundTally};
use futures::future::join_all;
use std::sync::Arc;

/// Fans a proposal out to a sample and tallies the replies.
///
/// There is no early exit on an early majority: the round completes only
/// when every sampled peer has answered or timed out.
#[derive(Clone)]
pub struct RoundCoordinator {
    client: Arc<dyn PeerClient>,
}

impl RoundCoordinator {
    pub fn new(client: Arc<dyn PeerClient>) -> Self {
        Self { client }
    }

    /// Query every peer in `peers` concurrently and tally the replies.
    ///
    /// Individual peer failures are abstentions inside the tally. An `Err`
    /// means the round itself could not complete (a query task died).
    pub async fn run_round(&self, proposal: &Proposal, peers: &[NodeId]) -> Result<RoundTally> {
        let tasks = peers.iter().map(|&peer| {
            let client = Arc::clone(&self.client);
            let proposal = proposal.clone();
            tokio::spawn(async move { client.query(peer, &proposal, QueryMode::Direct).await })
        });

        let mut replies = Vec::with_capacity(peers.len());
        for joined in join_all(tasks).await {
            let reply: PeerReply = joined.map_err(|e| Error::RoundAborted(e.to_string()))?;
            replies.push(reply);
        }

        Ok(RoundTally::from_replies(replies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flurry_consensus::{Position, RoundOutcome};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Fixed answers per peer; peers not listed panic.
    struct Scripted(HashMap<NodeId, PeerReply>);

    #[async_trait]
    impl PeerClient for Scripted {
        async fn query(&self, peer: NodeId, _proposal: &Proposal, _mode: QueryMode) -> PeerReply {
            match self.0.get(&peer) {
                Some(reply) => *reply,
                None => panic!("unscripted peer {}", peer),
            }
        }
    }

    fn coordinator(script: &[(u32, PeerReply)]) -> RoundCoordinator {
        let map = script.iter().map(|(id, r)| (NodeId(*id), *r)).collect();
        RoundCoordinator::new(Arc::new(Scripted(map)))
    }

    #[tokio::test]
    async fn tallies_every_sampled_peer() {
        let round = coordinator(&[
            (2, PeerReply::Agree),
            (3, PeerReply::Disagree),
            (4, PeerReply::Unreachable),
        ]);
        let tally = round
            .run_round(&Proposal::new(Position(7), "red"), &[NodeId(2), NodeId(3), NodeId(4)])
            .await
            .unwrap();
        assert_eq!(tally.sampled, 3);
        assert_eq!(tally.agreed, 1);
        assert_eq!(tally.disagreed, 1);
        assert_eq!(tally.unreachable, 1);
        assert_eq!(tally.outcome(2), RoundOutcome::Disconfirm);
    }

    #[tokio::test]
    async fn empty_sample_is_an_empty_tally() {
        let round = coordinator(&[]);
        let tally = round.run_round(&Proposal::new(Position(1), "x"), &[]).await.unwrap();
        assert_eq!(tally, RoundTally::default());
    }

    #[tokio::test]
    async fn panicking_query_aborts_the_round() {
        let round = coordinator(&[(2, PeerReply::Agree)]);
        let err = round
            .run_round(&Proposal::new(Position(1), "x"), &[NodeId(2), NodeId(9)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RoundAborted(_)));
    }

    /// Agrees after a delay, to check the round waits for slow peers.
    struct Slow;

    #[async_trait]
    impl PeerClient for Slow {
        async fn query(&self, peer: NodeId, _proposal: &Proposal, _mode: QueryMode) -> PeerReply {
            tokio::time::sleep(Duration::from_millis(10 * peer.get() as u64)).await;
            PeerReply::Agree
        }
    }

    #[tokio::test]
    async fn waits_for_slowest_peer() {
        let round = RoundCoordinator::new(Arc::new(Slow));
        let tally = round
            .run_round(&Proposal::new(Position(1), "x"), &[NodeId(1), NodeId(5), NodeId(3)])
            .await
            .unwrap();
        assert_eq!(tally.agreed, 3);
    }
}
