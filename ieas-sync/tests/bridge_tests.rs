//! Bridge proxy against a fake Immich upstream

mod helpers;

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Path, Query},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use helpers::{asset_id, spawn_upstream};
use http_body_util::BodyExt;
use ieas_sync::client::ServerClient;
use ieas_sync::{build_router, BridgeState};
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "test-api-key";
const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
const MP4_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == API_KEY)
        .unwrap_or(false)
}

async fn thumbnail(
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid API key", "statusCode": 401 })),
        )
            .into_response();
    }
    if query.get("size").map(String::as_str) != Some("thumbnail") {
        return (StatusCode::BAD_REQUEST, "size must be thumbnail").into_response();
    }

    match id.as_str() {
        id if id == asset_id(404) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Asset not found", "statusCode": 404 })),
        )
            .into_response(),
        id if id == asset_id(500) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "thumbnail generation crashed").into_response()
        }
        // Bare body without a content type
        id if id == asset_id(7) => Response::new(Body::from(JPEG_BYTES)),
        _ => ([("content-type", "image/jpeg")], JPEG_BYTES).into_response(),
    }
}

async fn playback(Path(_id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ([("content-type", "video/mp4")], MP4_BYTES).into_response()
}

async fn bridge() -> Router {
    let upstream = spawn_upstream(
        Router::new()
            .route("/api/assets/:id/thumbnail", get(thumbnail))
            .route("/api/assets/:id/video/playback", get(playback)),
    )
    .await;

    let server = ServerClient::for_streaming(&format!("{}/api", upstream), API_KEY).unwrap();
    build_router(BridgeState::new(server))
}

async fn get_uri(app: Router, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("JSON body")
}

#[tokio::test]
async fn test_image_streams_thumbnail_bytes() {
    let app = bridge().await;
    let uri = format!("/?type=IMAGE&id={}", asset_id(1));

    let (status, headers, body) = get_uri(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "image/jpeg");
    assert_eq!(body, JPEG_BYTES);
}

#[tokio::test]
async fn test_video_streams_playback_bytes() {
    let app = bridge().await;
    let uri = format!("/?type=VIDEO&id={}", asset_id(2));

    let (status, headers, body) = get_uri(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("content-type").unwrap(), "video/mp4");
    assert_eq!(body, MP4_BYTES);
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_octet_stream() {
    let app = bridge().await;
    let uri = format!("/?type=IMAGE&id={}", asset_id(7));

    let (status, headers, body) = get_uri(app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("content-type").unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body, JPEG_BYTES);
}

#[tokio::test]
async fn test_invalid_asset_id_rejected() {
    for id in [
        "",
        "not-a-uuid",
        // version 1
        "0f8fad5b-d9cb-169f-a165-70867728950e",
        // simple form, no hyphens
        "0f8fad5bd9cb469fa16570867728950e",
    ] {
        let app = bridge().await;
        let (status, _, body) = get_uri(app, &format!("/?type=IMAGE&id={}", id)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "id {:?}", id);
        assert_eq!(json_body(&body)["error"], "Invalid assetId");
    }
}

#[tokio::test]
async fn test_unknown_asset_type_rejected() {
    for asset_type in ["AUDIO", "image", ""] {
        let app = bridge().await;
        let uri = format!("/?type={}&id={}", asset_type, asset_id(1));
        let (status, _, body) = get_uri(app, &uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "type {:?}", asset_type);
        assert_eq!(json_body(&body)["error"], "Invalid asset type");
    }
}

#[tokio::test]
async fn test_upstream_json_error_relayed_with_status() {
    let app = bridge().await;
    let uri = format!("/?type=IMAGE&id={}", asset_id(404));

    let (status, _, body) = get_uri(app, &uri).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(&body),
        json!({ "message": "Asset not found", "statusCode": 404 })
    );
}

#[tokio::test]
async fn test_upstream_text_error_wrapped_as_json() {
    let app = bridge().await;
    let uri = format!("/?type=IMAGE&id={}", asset_id(500));

    let (status, _, body) = get_uri(app, &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&body),
        json!({ "error": "thumbnail generation crashed" })
    );
}

#[tokio::test]
async fn test_wrong_api_key_relays_unauthorized() {
    let upstream = spawn_upstream(
        Router::new().route("/api/assets/:id/thumbnail", get(thumbnail)),
    )
    .await;
    let server = ServerClient::for_streaming(&format!("{}/api", upstream), "wrong-key").unwrap();
    let app = build_router(BridgeState::new(server));

    let (status, _, body) = get_uri(app, &format!("/?type=IMAGE&id={}", asset_id(1))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(&body)["message"], "Invalid API key");
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    // Reserve a port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let server = ServerClient::for_streaming(&format!("http://{}/api", addr), API_KEY).unwrap();
    let app = build_router(BridgeState::new(server));

    let (status, _, body) = get_uri(app, &format!("/?type=VIDEO&id={}", asset_id(1))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json_body(&body)["error"]
        .as_str()
        .unwrap()
        .starts_with("Upstream request failed"));
}

#[tokio::test]
async fn test_health_reports_upstream() {
    let server = ServerClient::for_streaming("http://immich.lan:2283/api/", API_KEY).unwrap();
    let app = build_router(BridgeState::new(server));

    let (status, _, body) = get_uri(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ieas-bridge");
    assert_eq!(body["upstream"], "http://immich.lan:2283/api");
    assert!(body["version"].is_string());
}
