//! Shared test helpers: in-memory catalogs and fake upstream HTTP servers

#![allow(dead_code)]

pub mod fakes;

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port; returns `http://127.0.0.1:<port>`
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake upstream");
    });

    format!("http://{}", addr)
}

/// Deterministic version-4 UUID for test asset `n`
pub fn asset_id(n: u32) -> String {
    format!("00000000-0000-4000-8000-{:012}", n)
}
