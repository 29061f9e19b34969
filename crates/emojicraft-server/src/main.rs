//! EmojiCraft game server.

mod api;
mod checkpoint;
mod telemetry;

use anyhow::Result;
use emojicraft_core::Settings;
use emojicraft_world::{load_world, FallbackGateway, GameEngine, PersistenceGateway};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const SETTINGS_ENV: &str = "EMOJICRAFT_SETTINGS";
const DEFAULT_SETTINGS_PATH: &str = "settings.json";

#[tokio::main]
async fn main() -> Result<()> {
    let settings_path = std::env::var(SETTINGS_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let loaded = Settings::load(&settings_path);
    let otel_endpoint = loaded.as_ref().ok().and_then(|s| s.server.otel_endpoint.clone());

    telemetry::init_telemetry(otel_endpoint.as_deref())?;
    let settings = Settings::or_default(&settings_path, loaded);

    info!(
        settings = %settings_path,
        width = settings.game.width,
        height = settings.game.height,
        round_secs = settings.game.round_duration_secs,
        "Starting EmojiCraft server"
    );

    let gateway: Arc<dyn PersistenceGateway> = Arc::new(FallbackGateway::from_config(&settings.persistence));

    let world = {
        let gateway = gateway.clone();
        let config = settings.game.clone();
        tokio::task::spawn_blocking(move || load_world(config, gateway.as_ref())).await?
    };

    let engine = Arc::new(GameEngine::new(settings.game.clone(), world));
    engine.launch();

    let checkpoints = Arc::new(checkpoint::CheckpointManager::new(engine.clone(), gateway));

    let stop_checkpoints = CancellationToken::new();
    let periodic = {
        let checkpoints = checkpoints.clone();
        let cancel = stop_checkpoints.clone();
        let interval = settings.persistence.checkpoint_interval_secs;
        tokio::spawn(async move { checkpoints.run_periodic(interval, cancel).await })
    };

    let app = api::router(api::AppState {
        engine,
        checkpoints: checkpoints.clone(),
    })
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.bind_address, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stop_checkpoints.cancel();
    if let Err(e) = periodic.await {
        warn!(error = %e, "Checkpoint task ended abnormally");
    }
    checkpoints.save_on_shutdown().await;

    telemetry::shutdown_telemetry();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
