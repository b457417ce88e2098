//! HTTP API for flurry nodes.

use crate::client::{PeerClient, QueryMode};
use crate::handler::QueryHandler;
use crate::stats::StatsSnapshot;
use crate::wire::{
    ProposeRequest, ProposeResponse, RecordResponse, RelayRequest, HEALTH_ENDPOINT, PROPOSE_ENDPOINT,
    RECORD_ENDPOINT, RELAY_ENDPOINT, STATS_ENDPOINT,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use flurry_consensus::{PeerReply, Position, Proposal};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub handler: QueryHandler,
    /// Outbound client, used here only for relayed proposals.
    pub client: Arc<dyn PeerClient>,
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_ENDPOINT, get(health))
        .route(PROPOSE_ENDPOINT, post(propose))
        .route(RELAY_ENDPOINT, post(relay))
        .route(&format!("{}/:position", RECORD_ENDPOINT), get(read_record))
        .route(STATS_ENDPOINT, get(stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Malformed bodies get `400` and `success: false`; nothing is stored.
fn malformed(rejection: JsonRejection) -> Response {
    warn!("Rejected malformed request: {}", rejection.body_text());
    (StatusCode::BAD_REQUEST, Json(ProposeResponse { success: false })).into_response()
}

async fn propose(
    State(state): State<AppState>,
    body: Result<Json<ProposeRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(req) => req,
        Err(rejection) => return malformed(rejection),
    };

    let success = state.handler.on_propose(Proposal::from(req)).await;
    Json(ProposeResponse { success }).into_response()
}

async fn relay(
    State(state): State<AppState>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(req) => req,
        Err(rejection) => return malformed(rejection),
    };

    debug!("Relaying position {} to {}", req.position, req.target);
    let proposal = Proposal {
        position: req.position,
        value: req.value,
    };
    let reply = state.client.query(req.target, &proposal, QueryMode::Relay).await;
    let success = reply == PeerReply::Agree;
    Json(ProposeResponse { success }).into_response()
}

async fn read_record(State(state): State<AppState>, Path(position): Path<i64>) -> Response {
    let position = Position(position);
    match state.handler.read(position).await {
        Some(entry) => Json(RecordResponse {
            position,
            value: entry.value,
            decided: entry.decided,
        })
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.handler.snapshot().await)
}
