//! Bridge proxy
//!
//! Eagle imports items by URL and cannot send Immich's API key, so the
//! bridge exposes `GET /?type=IMAGE|VIDEO&id=<uuid>` without
//! authentication and streams the asset from Immich with the key attached.
//! It keeps no state between requests.

pub mod handler;
pub mod health;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::client::ServerClient;
use crate::models::AssetType;

/// State shared across bridge handlers
#[derive(Clone)]
pub struct BridgeState {
    /// Immich client used for every proxied fetch
    pub server: Arc<ServerClient>,
}

impl BridgeState {
    pub fn new(server: ServerClient) -> Self {
        Self {
            server: Arc::new(server),
        }
    }
}

/// Build the bridge router
pub fn build_router(state: BridgeState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(handler::proxy_asset))
        .merge(health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// URL under which the bridge serves one asset
pub fn asset_url(bridge_base: &str, asset_type: AssetType, asset_id: &str) -> String {
    format!(
        "{}/?type={}&id={}",
        bridge_base.trim_end_matches('/'),
        asset_type.as_str(),
        asset_id
    )
}

/// Serve the bridge until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    state: BridgeState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Bridge proxy listening on http://{}", addr);
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Bridge proxy stopped");
    Ok(())
}
