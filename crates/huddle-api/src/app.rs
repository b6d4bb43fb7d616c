//! Application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use huddle_core::config::HuddleConfig;
use huddle_core::error::AppError;
use huddle_core::store::KvStore;
use huddle_store::MemoryKvStore;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application over the given store.
///
/// Must run inside a tokio runtime (the create limiter spawns a task).
pub fn build_app(config: Arc<HuddleConfig>, store: Arc<dyn KvStore>) -> Router {
    build_router(AppState::new(config, store))
}

/// Runs the Huddle server until interrupted.
pub async fn run_server(config: HuddleConfig) -> Result<(), AppError> {
    let config = Arc::new(config);
    let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    let app = build_app(Arc::clone(&config), store);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Huddle server listening");

    // Connect info feeds the peer-address fallback of `ClientIp`.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
