//! ieas-sync - Immich to Eagle album sync service
//!
//! Runs three things side by side until Ctrl+C/SIGTERM:
//! - the bridge proxy Eagle imports assets through
//! - the correction worker patching item metadata on disk
//! - the reconciliation engine

use anyhow::{Context, Result};
use ieas_common::Settings;
use ieas_sync::bridge::{self, BridgeState};
use ieas_sync::client::{LibraryClient, ServerClient};
use ieas_sync::correction::{correction_channel, CorrectionWorker};
use ieas_sync::shutdown::cancel_on_signal;
use ieas_sync::{Engine, EngineConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ieas_sync=info,ieas_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let settings = Settings::load().context("Invalid configuration")?;
    info!("Eagle API: {}", settings.eagle_api_url());
    info!("Immich API: {}", settings.immich_api_url());

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    let library = LibraryClient::new(&settings.eagle_api_url(), &settings.eagle_api_key)
        .context("Failed to build Eagle client")?;
    let server = ServerClient::new(
        &settings.immich_api_url(),
        &settings.immich_api_key,
        settings.sync_concurrency,
    )
    .context("Failed to build Immich client")?;

    // Bridge proxy
    let bridge_server = ServerClient::for_streaming(&settings.immich_api_url(), &settings.immich_api_key)
        .context("Failed to build bridge upstream client")?;
    let listener = tokio::net::TcpListener::bind(settings.bridge_bind_addr())
        .await
        .with_context(|| format!("Failed to bind bridge to {}", settings.bridge_bind_addr()))?;
    let bridge_task = tokio::spawn(bridge::serve(
        listener,
        BridgeState::new(bridge_server),
        shutdown.clone(),
    ));
    info!("Bridge public URL: {}", settings.bridge_public_url());

    // Correction worker
    let (corrections, correction_rx) = correction_channel(settings.correction_queue_capacity);
    let worker = CorrectionWorker::start(&library, correction_rx)
        .await
        .context("Failed to resolve Eagle library path")?;
    let worker_task = tokio::spawn(worker.run());

    // Reconciliation engine
    let engine = Engine::new(
        library,
        server,
        corrections,
        EngineConfig {
            interval: settings.scan_interval(),
            concurrency: settings.sync_concurrency,
            page_size: settings.immich_page_size,
            bridge_url: settings.bridge_public_url(),
        },
    );
    engine.run(shutdown.clone()).await;

    // Dropping the engine closes the correction queue
    drop(engine);
    shutdown.cancel();

    if let Err(e) = worker_task.await {
        error!("Correction worker panicked: {}", e);
    }
    match bridge_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Bridge proxy error: {}", e),
        Err(e) => error!("Bridge proxy panicked: {}", e),
    }

    info!("Shutdown complete");
    Ok(())
}
