//! Flurry Node - leaderless sampling consensus over HTTP
//!
//! A peer in a fixed-size network that agrees, independently for every
//! position of a shared record, on a single value.
//!
//! # Architecture
//!
//! - **Record**: position -> value held by this node
//! - **Handler**: adopts a value for an empty position or votes on a held one
//! - **Engine**: one background consensus loop per adopted position
//! - **Round**: fans a proposal out to a random sample and tallies replies
//! - **Client**: HTTP (or in-memory) peer queries
//! - **API**: `/propose`, `/relay`, `/record/{position}`, `/stats`, `/health`
//!
//! # Example
//!
//! ```no_run
//! use flurry_node::{Node, NodeConfig};
//! use flurry_consensus::NodeId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::new(NodeId(1), 5);
//!     let node = Node::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod in_memory;
pub mod node;
pub mod record;
pub mod round;
pub mod stats;
pub mod wire;

pub use address::AddressTable;
pub use client::{HttpPeerClient, PeerClient, QueryMode};
pub use config::{NodeArgs, NodeConfig, QueryTimeouts};
pub use engine::{Engine, LoopRegistry, LoopReport};
pub use error::{Error, Result};
pub use handler::QueryHandler;
pub use in_memory::{InMemoryCluster, InMemoryNetwork};
pub use node::Node;
pub use record::{Entry, ProposeOutcome, RecordStore};
pub use round::RoundCoordinator;
pub use stats::{RequestStats, StatsSnapshot};
