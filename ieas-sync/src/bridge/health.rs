//! Bridge liveness endpoint
//!
//! Reports which Immich instance the bridge relays to. It does not contact
//! that instance, so a healthy bridge can still answer 502 for assets.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::BridgeState;

#[derive(Debug, Serialize)]
pub struct BridgeHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Immich API base URL every proxied request goes to
    pub upstream: String,
}

/// GET /health
pub async fn bridge_health(State(state): State<BridgeState>) -> Json<BridgeHealth> {
    Json(BridgeHealth {
        status: "ok",
        service: "ieas-bridge",
        version: env!("CARGO_PKG_VERSION"),
        upstream: state.server.base_url().to_string(),
    })
}

pub fn health_routes() -> Router<BridgeState> {
    Router::new().route("/health", get(bridge_health))
}
