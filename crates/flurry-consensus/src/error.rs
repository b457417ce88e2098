//! Error types for flurry-consensus.

use crate::types::NodeId;
use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the pure protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A sample was requested that is larger than the peer universe.
    #[error("sample of {sample_size} peers requested but only {available} peers exist")]
    SampleTooLarge { sample_size: usize, available: usize },

    /// Tunables are inconsistent with each other or with the network size.
    #[error("invalid consensus parameters: {0}")]
    InvalidParams(String),

    /// A node identity outside `1..=N`.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}
