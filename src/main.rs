//! Mergecast binary
//!
//! Wires up:
//! - Local working directory for uploads
//! - ffmpeg merge adapter
//! - GitHub contents publisher
//! - HTTP inbound adapter

use mergecast::adapters::{ffmpeg::FfmpegMerger, fs::TempStorage, github::GithubPublisher};
use mergecast::http::{router, AppState};
use mergecast::{Config, MergeService};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // 1. Adapters
    let storage = Arc::new(TempStorage::new(&config.upload_dir));
    if let Err(e) = storage.ensure_root().await {
        tracing::error!(error = %e, "failed to prepare upload directory");
        std::process::exit(1);
    }
    let merger = FfmpegMerger::new(&config.ffmpeg_path);
    let publisher = GithubPublisher::from_config(&config);

    // 2. Application service
    let service = MergeService::new(storage, merger, publisher);

    // 3. HTTP layer
    let state = AppState::new(service, &config.api_key, config.max_upload_bytes);
    let app = router(state);

    // 4. Start server
    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %address, error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    tracing::info!(
        address = %address,
        upload_dir = %config.upload_dir.display(),
        repo = %format!("{}/{}", config.github_owner, config.github_repo),
        "listening"
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutting down");
}
