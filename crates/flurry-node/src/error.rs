//! Error types for the flurry node.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a node.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Protocol-level error (sampling, parameters, unknown node)
    #[error("Consensus error: {0}")]
    Consensus(#[from] flurry_consensus::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A round could not be completed at all
    #[error("Round aborted: {0}")]
    RoundAborted(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
