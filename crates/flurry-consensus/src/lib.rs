//! Leaderless Sampling Consensus
//!
//! Every position in the shared record is decided independently. A node that
//! holds a tentative value for a position keeps polling small random samples
//! of the network:
//!
//! 1. Draw `sample_size` peers at random, never including itself
//! 2. Ask each whether it holds (or will adopt) the value
//! 3. If at least `majority_threshold` agree, the round **confirms**
//! 4. Otherwise the round **disconfirms** and the node drops its value
//!
//! After `counter_threshold` consecutive confirming rounds the value is
//! **decided** and the node stops sampling that position.
//!
//! # Metastability
//!
//! Each node's belief drifts toward whatever value most of the network holds.
//! Larger `counter_threshold` trades latency for a wider margin against
//! sampling noise. There is no leader, no term and no quorum log.
//!
//! This crate is the pure part of the protocol: no I/O, no clocks. The
//! networked node lives in `flurry-node`.

mod confidence;
mod error;
mod params;
mod sampler;
mod threshold;
mod types;

pub use confidence::{ConfidenceCounter, LoopState, Step};
pub use error::{Error, Result};
pub use params::ConsensusParams;
pub use sampler::{peer_universe, sample_peers, sample_peers_with};
pub use threshold::{agreements_needed, meets_majority, PeerReply, RoundOutcome, RoundTally};
pub use types::{NodeId, Position, Proposal, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_drive_counter_to_decision() {
        // N=5, sample 3, majority 2, counter 3: every peer agrees.
        let params = ConsensusParams::new(2, 3, 3);
        params.validate(5).unwrap();

        let mut counter = ConfidenceCounter::new(params.counter_threshold);
        let mut rounds = 0;
        while !counter.is_decided() {
            let peers = sample_peers(NodeId(1), 5, params.sample_size).unwrap();
            let tally = RoundTally::from_replies(peers.iter().map(|_| PeerReply::Agree));
            counter.observe(tally.outcome(params.majority_threshold));
            rounds += 1;
        }
        assert_eq!(rounds, 3);
    }

    #[test]
    fn rival_majority_in_sample_flips() {
        // Nodes 2 and 3 hold "blue", node 4 agrees with "red".
        let replies = [PeerReply::Disagree, PeerReply::Disagree, PeerReply::Agree];
        let tally = RoundTally::from_replies(replies);

        let mut counter = ConfidenceCounter::new(3);
        counter.observe(RoundOutcome::Confirm);
        assert_eq!(counter.observe(tally.outcome(2)), Step::Flipped);
        assert_eq!(counter.count(), 0);
    }
}
