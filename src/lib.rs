//! Backend for cooperative assemblies: members vote yes or no on topics
//! during time-boxed polls.
//!
//! Requests flow `routes` -> `handlers` -> services (`poll`, `services`) ->
//! `store`. Postgres is used when `DATABASE_URL` is set, otherwise data is
//! kept in memory for the lifetime of the process.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::Handle;
use tokio::signal;
use tracing::{info, warn};

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use clock::SystemClock;
use config::Config;
use error::ServerError;
use state::AppState;
use store::{MemoryStore, PgStore};

pub async fn start_server(config: Config) -> Result<(), ServerError> {
    info!("Initializing state...");
    let state = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.max_connections).await?;
            AppState::new(PgStore::new(pool), Arc::new(SystemClock))
        }
        None => AppState::new(MemoryStore::new(), Arc::new(SystemClock)),
    };

    let app = routes::create_routes(state);

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Binding to {address}");

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    axum_server::bind(address)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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

    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}
