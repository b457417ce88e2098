//! flurry-client CLI tool
//!
//! Talks to a running flurry-node over its HTTP API.
//!
//! Usage:
//!   flurry-client propose <position> <value>
//!   flurry-client relay <target> <position> <value>
//!   flurry-client read <position>
//!   flurry-client stats
//!   flurry-client ping

use clap::{Parser, Subcommand};
use flurry_consensus::{NodeId, Position, Value};
use flurry_node::stats::StatsSnapshot;
use flurry_node::wire::{
    ProposeRequest, ProposeResponse, RecordResponse, RelayRequest, HEALTH_ENDPOINT, PROPOSE_ENDPOINT,
    RECORD_ENDPOINT, RELAY_ENDPOINT, STATS_ENDPOINT,
};
use reqwest::StatusCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flurry-client", version, about = "Query and drive a flurry node")]
struct Cli {
    /// Base URL of the node
    #[arg(long, env = "FLURRY_NODE", default_value = "http://127.0.0.1:8000")]
    node: String,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Propose a value for a position
    Propose { position: i64, value: String },
    /// Ask the node to forward a proposal to another node
    Relay { target: u32, position: i64, value: String },
    /// Show the value held for a position
    Read { position: i64 },
    /// Show request counters and loop gauges
    Stats,
    /// Check that the node is running
    Ping,
}

async fn run(cli: Cli) -> Result<bool, reqwest::Error> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(cli.timeout_ms))
        .build()?;
    let base = cli.node.trim_end_matches('/');

    match cli.command {
        Command::Propose { position, value } => {
            let body = ProposeRequest {
                position: Position(position),
                value: Value(value),
            };
            let answer: ProposeResponse = http
                .post(format!("{}{}", base, PROPOSE_ENDPOINT))
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            println!("{}", if answer.success { "accepted" } else { "rejected" });
            Ok(answer.success)
        }
        Command::Relay { target, position, value } => {
            let body = RelayRequest {
                target: NodeId(target),
                position: Position(position),
                value: Value(value),
            };
            let answer: ProposeResponse = http
                .post(format!("{}{}", base, RELAY_ENDPOINT))
                .json(&body)
                .send()
                .await?
                .json()
                .await?;
            println!("{}", if answer.success { "accepted" } else { "rejected" });
            Ok(answer.success)
        }
        Command::Read { position } => {
            let response = http
                .get(format!("{}{}/{}", base, RECORD_ENDPOINT, position))
                .send()
                .await?
                .error_for_status()?;
            if response.status() == StatusCode::NO_CONTENT {
                println!("(empty)");
                return Ok(false);
            }
            let record: RecordResponse = response.json().await?;
            let state = if record.decided { "decided" } else { "tentative" };
            println!("{} = {} ({})", record.position, record.value, state);
            Ok(true)
        }
        Command::Stats => {
            let stats: StatsSnapshot = http
                .get(format!("{}{}", base, STATS_ENDPOINT))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            println!("inbound proposals: {}", stats.inbound_proposals);
            println!("outbound queries:  {}", stats.outbound_queries);
            println!("active loops:      {}", stats.active_loops);
            println!("decided positions: {}", stats.decided_positions);
            Ok(true)
        }
        Command::Ping => {
            http.get(format!("{}{}", base, HEALTH_ENDPOINT))
                .send()
                .await?
                .error_for_status()?;
            println!("pong - flurry-node is running");
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let node = cli.node.clone();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Request to {} failed: {}", node, e);
            eprintln!("Is the flurry-node running?");
            std::process::exit(1);
        }
    }
}
