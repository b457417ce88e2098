//! Static address table: node ID -> `host:port`.
//!
//! Built once at startup from the network size and never mutated.

use crate::error::Result;
use flurry_consensus::{Error as ConsensusError, NodeId};

/// Placeholder substituted with the node ID in address templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Default template: one container per node, all listening on 8000.
pub const DEFAULT_TEMPLATE: &str = "sm-server-{id}:8000";

/// Stable address for every node ID `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTable {
    addresses: Vec<String>,
}

impl AddressTable {
    /// Expand `template` for every ID in `1..=network_size`.
    pub fn from_template(template: &str, network_size: usize) -> Self {
        let addresses = (1..=network_size)
            .map(|id| template.replace(ID_PLACEHOLDER, &id.to_string()))
            .collect();
        Self { addresses }
    }

    /// Use an explicit list; the i-th entry belongs to node `i + 1`.
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of nodes in the table.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Address of `id`.
    pub fn get(&self, id: NodeId) -> Result<&str> {
        (id.get() as usize)
            .checked_sub(1)
            .and_then(|idx| self.addresses.get(idx))
            .map(String::as_str)
            .ok_or_else(|| ConsensusError::UnknownNode(id).into())
    }

    /// Iterate `(id, address)` pairs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.addresses
            .iter()
            .enumerate()
            .map(|(idx, addr)| (NodeId(idx as u32 + 1), addr.as_str()))
    }
}
