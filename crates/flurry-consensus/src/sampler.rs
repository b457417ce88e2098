//! Random peer sampling for one round.
//!
//! The peer universe for node `s` in a network of `N` nodes is
//! `{1..=N} \ {s}`. A sample is a uniformly random permutation of that
//! universe truncated to the requested size, so it never contains the
//! sampling node and never repeats an ID.
//!
//! Draws are independent: [`sample_peers`] pulls fresh randomness from the
//! thread-local generator on every call, and consecutive samples may overlap.

use crate::error::{Error, Result};
use crate::types::NodeId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Every peer of `self_id` in a network of `network_size` nodes, in ID order.
pub fn peer_universe(self_id: NodeId, network_size: usize) -> Vec<NodeId> {
    (1..=network_size as u32)
        .map(NodeId)
        .filter(|id| *id != self_id)
        .collect()
}

/// Draw `sample_size` distinct peers of `self_id` using the thread RNG.
pub fn sample_peers(self_id: NodeId, network_size: usize, sample_size: usize) -> Result<Vec<NodeId>> {
    sample_peers_with(&mut rand::thread_rng(), self_id, network_size, sample_size)
}

/// Draw `sample_size` distinct peers of `self_id` using the given RNG.
///
/// Fails with [`Error::SampleTooLarge`] when `sample_size` exceeds the
/// `N - 1` peers available. Callers validate this once at startup, see
/// [`ConsensusParams::validate`](crate::ConsensusParams::validate).
pub fn sample_peers_with<R: Rng + ?Sized>(
    rng: &mut R,
    self_id: NodeId,
    network_size: usize,
    sample_size: usize,
) -> Result<Vec<NodeId>> {
    let mut universe = peer_universe(self_id, network_size);
    if sample_size > universe.len() {
        return Err(Error::SampleTooLarge {
            sample_size,
            available: universe.len(),
        });
    }

    universe.shuffle(rng);
    universe.truncate(sample_size);
    Ok(universe)
}
