//! Asset proxy handler

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ieas_common::uuid_utils::is_canonical_v4;
use serde::Deserialize;
use serde_json::{json, Value};

use super::BridgeState;
use crate::error::{BridgeError, BridgeResult};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Query string of `GET /`
#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    #[serde(rename = "type", default)]
    pub asset_type: String,
    #[serde(default)]
    pub id: String,
}

/// GET /?type=IMAGE|VIDEO&id=<uuid>
///
/// IMAGE maps to the thumbnail endpoint, VIDEO to video playback.
pub async fn proxy_asset(
    State(state): State<BridgeState>,
    Query(query): Query<AssetQuery>,
) -> BridgeResult<Response> {
    if !is_canonical_v4(&query.id) {
        return Err(BridgeError::InvalidAssetId);
    }

    let upstream = match query.asset_type.as_str() {
        "IMAGE" => state.server.fetch_thumbnail(&query.id).await?,
        "VIDEO" => state.server.fetch_playback(&query.id).await?,
        other => return Err(BridgeError::InvalidAssetType(other.to_string())),
    };

    relay(upstream).await
}

/// Forward an upstream response
///
/// 200 streams the body through with the upstream content type. Anything
/// else relays the upstream JSON error body with the upstream status.
async fn relay(upstream: reqwest::Response) -> BridgeResult<Response> {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    if status != StatusCode::OK {
        let bytes = upstream.bytes().await.map_err(ieas_common::Error::from)?;
        let body: Value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({ "error": String::from_utf8_lossy(&bytes) }));

        tracing::debug!(status = %status, "Relaying upstream error");
        return Ok((status, Json(body)).into_response());
    }

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let body = Body::from_stream(upstream.bytes_stream());
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}
