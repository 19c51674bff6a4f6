//! Error types for the bridge proxy HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Bridge request error
///
/// Rendered as `{"error": "..."}` with the matching status code.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// `id` is not a canonical version-4 UUID (400)
    #[error("Invalid assetId")]
    InvalidAssetId,

    /// `type` is neither IMAGE nor VIDEO (400)
    #[error("Invalid asset type")]
    InvalidAssetType(String),

    /// Server could not be reached or its body could not be read (502)
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] ieas_common::Error),
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match self {
            BridgeError::InvalidAssetId | BridgeError::InvalidAssetType(_) => {
                StatusCode::BAD_REQUEST
            }
            BridgeError::Upstream(ref err) => {
                tracing::warn!(error = %err, "Bridge upstream request failed");
                StatusCode::BAD_GATEWAY
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for bridge handlers
pub type BridgeResult<T> = Result<T, BridgeError>;
