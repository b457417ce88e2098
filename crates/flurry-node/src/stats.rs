//! Process-wide request counters. Observability only.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the API layer and the peer client.
#[derive(Debug, Default)]
pub struct RequestStats {
    inbound_proposals: AtomicU64,
    outbound_queries: AtomicU64,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inbound(&self) {
        self.inbound_proposals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outbound(&self) {
        self.outbound_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inbound_proposals(&self) -> u64 {
        self.inbound_proposals.load(Ordering::Relaxed)
    }

    pub fn outbound_queries(&self) -> u64 {
        self.outbound_queries.load(Ordering::Relaxed)
    }
}

/// Snapshot served by `GET /stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub inbound_proposals: u64,
    pub outbound_queries: u64,
    pub active_loops: usize,
    pub decided_positions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let stats = RequestStats::new();
        stats.record_inbound();
        stats.record_outbound();
        stats.record_outbound();
        assert_eq!(stats.inbound_proposals(), 1);
        assert_eq!(stats.outbound_queries(), 2);
    }

    #[test]
    fn snapshot_uses_camel_case() {
        let snapshot = StatsSnapshot {
            inbound_proposals: 1,
            outbound_queries: 2,
            active_loops: 0,
            decided_positions: 3,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["outboundQueries"], 2);
        assert_eq!(json["decidedPositions"], 3);
    }
}
