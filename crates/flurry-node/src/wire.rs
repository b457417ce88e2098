//! JSON bodies exchanged on the HTTP API.

use flurry_consensus::{NodeId, Position, Proposal, Value};
use serde::{Deserialize, Serialize};

pub const PROPOSE_ENDPOINT: &str = "/propose";
pub const RELAY_ENDPOINT: &str = "/relay";
pub const RECORD_ENDPOINT: &str = "/record";
pub const STATS_ENDPOINT: &str = "/stats";
pub const HEALTH_ENDPOINT: &str = "/health";

/// `POST /propose` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeRequest {
    pub position: Position,
    pub value: Value,
}

impl From<Proposal> for ProposeRequest {
    fn from(p: Proposal) -> Self {
        Self {
            position: p.position,
            value: p.value,
        }
    }
}

impl From<ProposeRequest> for Proposal {
    fn from(r: ProposeRequest) -> Self {
        Proposal {
            position: r.position,
            value: r.value,
        }
    }
}

/// Reply to `/propose` and `/relay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeResponse {
    pub success: bool,
}

/// `POST /relay` body: forward a proposal to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    pub target: NodeId,
    pub position: Position,
    pub value: Value,
}

/// `GET /record/{position}` reply when the position is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub position: Position,
    pub value: Value,
    pub decided: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propose_request_wire_shape() {
        let req: ProposeRequest = serde_json::from_str(r#"{"position":7,"value":"red"}"#).unwrap();
        assert_eq!(req.position, Position(7));
        assert_eq!(req.value, Value::from("red"));
        assert_eq!(
            serde_json::to_string(&ProposeResponse { success: true }).unwrap(),
            r#"{"success":true}"#
        );
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(serde_json::from_str::<ProposeRequest>(r#"{"position":"seven","value":"red"}"#).is_err());
        assert!(serde_json::from_str::<ProposeRequest>(r#"{"value":"red"}"#).is_err());
        assert!(serde_json::from_str::<ProposeRequest>(r#"{"position":7,"value":3}"#).is_err());
    }
}
