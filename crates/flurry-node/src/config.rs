//! Node configuration.
//!
//! Every option can come from the command line or from a `FLURRY_*`
//! environment variable. Validation happens once, here: rounds never
//! re-check the tunables.

use crate::address::{AddressTable, DEFAULT_TEMPLATE};
use crate::error::{Error, Result};
use clap::Parser;
use flurry_consensus::{ConsensusParams, NodeId};
use std::net::SocketAddr;
use std::time::Duration;

/// Command line / environment arguments for `flurry-node`.
#[derive(Debug, Clone, Parser)]
#[command(name = "flurry-node", version, about = "Leaderless sampling consensus node")]
pub struct NodeArgs {
    /// This node's ID, in 1..=NETWORK_SIZE
    #[arg(env = "FLURRY_NODE_ID")]
    pub node_id: u32,

    /// Total number of nodes in the network
    #[arg(env = "FLURRY_NETWORK_SIZE")]
    pub network_size: usize,

    /// HTTP listen address
    #[arg(long, env = "FLURRY_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Peer address template; `{id}` is replaced by the node ID
    #[arg(long, env = "FLURRY_ADDRESS_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub address_template: String,

    /// Explicit peer addresses in ID order (overrides the template)
    #[arg(long, env = "FLURRY_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Minimum agreeing peers for a round to confirm
    #[arg(long, env = "FLURRY_MAJORITY_THRESHOLD", default_value_t = 2)]
    pub majority_threshold: usize,

    /// Peers sampled per round
    #[arg(long, env = "FLURRY_SAMPLE_SIZE", default_value_t = 3)]
    pub sample_size: usize,

    /// Consecutive confirming rounds required to decide
    #[arg(long, env = "FLURRY_COUNTER_THRESHOLD", default_value_t = 3)]
    pub counter_threshold: usize,

    /// Timeout for a direct peer query, in milliseconds
    #[arg(long, env = "FLURRY_QUERY_TIMEOUT_MS", default_value_t = 200)]
    pub query_timeout_ms: u64,

    /// Timeout for a relayed peer query, in milliseconds
    #[arg(long, env = "FLURRY_RELAY_TIMEOUT_MS", default_value_t = 300)]
    pub relay_timeout_ms: u64,

    /// Pause between two rounds of the same position, in milliseconds
    #[arg(long, env = "FLURRY_ROUND_INTERVAL_MS", default_value_t = 50)]
    pub round_interval_ms: u64,
}

impl NodeArgs {
    /// Build and validate the runtime configuration.
    pub fn into_config(self) -> Result<NodeConfig> {
        let addresses = if self.peers.is_empty() {
            AddressTable::from_template(&self.address_template, self.network_size)
        } else {
            AddressTable::from_addresses(self.peers.into_iter().map(|p| p.trim().to_string()))
        };

        let config = NodeConfig {
            node_id: NodeId(self.node_id),
            network_size: self.network_size,
            listen_addr: self.listen,
            addresses,
            params: ConsensusParams::new(self.majority_threshold, self.sample_size, self.counter_threshold),
            timeouts: QueryTimeouts {
                direct: Duration::from_millis(self.query_timeout_ms),
                relay: Duration::from_millis(self.relay_timeout_ms),
            },
            round_interval: Duration::from_millis(self.round_interval_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Per-request timeouts for outbound peer queries.
///
/// Relayed requests get the longer budget so that the relaying node does not
/// time out just before the target node answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeouts {
    pub direct: Duration,
    pub relay: Duration,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            direct: Duration::from_millis(200),
            relay: Duration::from_millis(300),
        }
    }
}

/// Validated configuration for one node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub network_size: usize,
    pub listen_addr: SocketAddr,
    pub addresses: AddressTable,
    pub params: ConsensusParams,
    pub timeouts: QueryTimeouts,
    pub round_interval: Duration,
}

impl NodeConfig {
    /// Configuration for node `node_id` of `network_size` with default
    /// tunables and the default address template.
    pub fn new(node_id: NodeId, network_size: usize) -> Self {
        Self {
            node_id,
            network_size,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            addresses: AddressTable::from_template(DEFAULT_TEMPLATE, network_size),
            params: ConsensusParams::default(),
            timeouts: QueryTimeouts::default(),
            round_interval: Duration::from_millis(50),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: ConsensusParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_addresses(mut self, addresses: AddressTable) -> Self {
        self.addresses = addresses;
        self
    }

    #[must_use]
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: QueryTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn with_round_interval(mut self, interval: Duration) -> Self {
        self.round_interval = interval;
        self
    }

    /// Reject configurations the protocol cannot run with.
    pub fn validate(&self) -> Result<()> {
        let id = self.node_id.get() as usize;
        if id == 0 || id > self.network_size {
            return Err(Error::Config(format!(
                "node id {} outside 1..={}",
                id, self.network_size
            )));
        }
        if self.addresses.len() != self.network_size {
            return Err(Error::Config(format!(
                "address table has {} entries for a network of {}",
                self.addresses.len(),
                self.network_size
            )));
        }
        self.params
            .validate(self.network_size)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }
}
