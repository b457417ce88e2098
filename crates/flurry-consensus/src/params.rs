//! Protocol tunables and their startup validation.

use crate::error::{Error, Result};

/// The three tunables that drive every consensus loop.
///
/// `majority_threshold` and `sample_size` must be sized together: the
/// threshold is an absolute count of agreeing peers per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Minimum agreeing peers for a round to confirm.
    pub majority_threshold: usize,
    /// Peers queried per round.
    pub sample_size: usize,
    /// Consecutive confirming rounds required to decide.
    pub counter_threshold: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            majority_threshold: 2,
            sample_size: 3,
            counter_threshold: 3,
        }
    }
}

impl ConsensusParams {
    pub fn new(majority_threshold: usize, sample_size: usize, counter_threshold: usize) -> Self {
        Self {
            majority_threshold,
            sample_size,
            counter_threshold,
        }
    }

    /// Check the tunables against a network of `network_size` nodes.
    ///
    /// Rounds never re-check these, so a node must refuse to start when this
    /// fails.
    pub fn validate(&self, network_size: usize) -> Result<()> {
        if network_size < 2 {
            return Err(Error::InvalidParams(format!(
                "network needs at least 2 nodes, got {}",
                network_size
            )));
        }
        if self.sample_size == 0 {
            return Err(Error::InvalidParams("sample size must be at least 1".into()));
        }
        if self.sample_size > network_size - 1 {
            return Err(Error::SampleTooLarge {
                sample_size: self.sample_size,
                available: network_size - 1,
            });
        }
        if self.majority_threshold == 0 {
            return Err(Error::InvalidParams("majority threshold must be at least 1".into()));
        }
        if self.majority_threshold > self.sample_size {
            return Err(Error::InvalidParams(format!(
                "majority threshold {} exceeds sample size {}",
                self.majority_threshold, self.sample_size
            )));
        }
        if self.counter_threshold == 0 {
            return Err(Error::InvalidParams("counter threshold must be at least 1".into()));
        }
        Ok(())
    }
}
