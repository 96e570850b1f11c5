//! Relay server lifecycle
//!
//! Owns the registry for the lifetime of the process: it is created before
//! the listener binds and dropped once the server has shut down.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::api::{cors_layer, create_router, AppState};
use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::relay::RoomRegistry;

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn run(config: RelayConfig) -> RelayResult<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { addr, source })?;

    serve(listener, &config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// Once `shutdown` fires every connection is dropped from the registry, which
/// ends open SSE streams and WebSocket tasks so graceful shutdown can finish.
pub async fn serve<F>(listener: TcpListener, config: &RelayConfig, shutdown: F) -> RelayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = Arc::new(RoomRegistry::new(config.queue_capacity));
    let state = Arc::new(AppState::new(Arc::clone(&registry)));
    let app = create_router(state, cors_layer(&config.client_origin));

    let addr = listener.local_addr().map_err(RelayError::Serve)?;
    info!(%addr, origin = ?config.client_origin, "relay listening");

    let drain = Arc::clone(&registry);
    let shutdown = async move {
        shutdown.await;
        drain.disconnect_all();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(RelayError::Serve)?;

    let stats = registry.stats();
    info!(
        events_sent = stats.events_sent,
        events_dropped = stats.events_dropped,
        "relay stopped"
    );
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
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
}
