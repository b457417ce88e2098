//! Inbound proposals: adopt an empty position or vote on a held one.

use crate::engine::Engine;
use crate::record::{Entry, ProposeOutcome, RecordStore};
use crate::stats::{RequestStats, StatsSnapshot};
use flurry_consensus::{Position, Proposal};
use std::sync::Arc;
use tracing::debug;

/// Entry point for every proposal, whether it comes from a peer's round or
/// from a client. The two are not distinguished.
#[derive(Clone)]
pub struct QueryHandler {
    engine: Engine,
    stats: Arc<RequestStats>,
}

impl QueryHandler {
    pub fn new(engine: Engine, stats: Arc<RequestStats>) -> Self {
        Self { engine, stats }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        self.engine.store()
    }

    pub fn stats(&self) -> &Arc<RequestStats> {
        &self.stats
    }

    /// Handle a proposal and return the `success` flag for the caller.
    ///
    /// - empty position: adopt, answer `true`, start a loop in the background
    /// - same value held: answer `true`, nothing changes
    /// - different value held: answer `false`, nothing changes
    ///
    /// The answer never waits on, or reports, the loop's decision.
    pub async fn on_propose(&self, proposal: Proposal) -> bool {
        self.stats.record_inbound();

        let outcome = self.store().propose(proposal.position, &proposal.value).await;
        debug!(
            "Proposal {:?} for position {}: {:?}",
            proposal.value.as_str(),
            proposal.position,
            outcome
        );

        if outcome == ProposeOutcome::Adopted {
            self.engine.spawn_loop(proposal.position, proposal.value);
        }
        outcome.accepted()
    }

    /// Local read of a position.
    pub async fn read(&self, position: Position) -> Option<Entry> {
        self.store().get(position).await
    }

    /// Counters plus loop/record gauges.
    pub async fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inbound_proposals: self.stats.inbound_proposals(),
            outbound_queries: self.stats.outbound_queries(),
            active_loops: self.engine.registry().active_count(),
            decided_positions: self.store().decided_count().await,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
