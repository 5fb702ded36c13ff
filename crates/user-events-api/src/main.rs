//! User events API server entry point.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use user_events_aggregation::AggregationScheduler;
use user_events_api::config::ApiConfig;
use user_events_api::error::AppError;
use user_events_api::observability;
use user_events_api::routes;
use user_events_api::state::AppState;
use user_events_core::clock::SystemClock;
use user_events_core::repository::StoreHealth;
use user_events_store::PgEventStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "server exited with error");
        return Err(err);
    }
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let config = ApiConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        base_path = %config.base_path,
        "starting user events API server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgEventStore::new(pool));

    if config.run_migrations {
        store.run_migrations().await?;
        info!("database migrations applied");
    }

    let scheduler = AggregationScheduler::new(
        store.clone(),
        Arc::new(SystemClock),
        config.aggregation,
    );
    scheduler.start();

    observability::install()?;

    let app = routes::app(AppState::from_store(&store), &config.base_path)
        .layer(TraceLayer::new_for_http())
        .layer(config.cors.layer()?);

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = Arc::clone(&shutdown);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .await
    });

    let served = tokio::select! {
        result = &mut server => Some(result),
        () = shutdown_signal() => None,
    };

    let outcome = if let Some(result) = served {
        flatten(result)
    } else {
        info!(grace = ?config.shutdown_grace, "shutdown signal received, draining connections");
        shutdown.notify_one();
        match tokio::time::timeout(config.shutdown_grace, &mut server).await {
            Ok(result) => flatten(result),
            Err(_) => {
                warn!("grace period elapsed, aborting in-flight requests");
                server.abort();
                Ok(())
            }
        }
    };

    scheduler.stop();
    store.close().await;
    info!("server stopped");

    outcome
}

fn flatten(result: Result<std::io::Result<()>, tokio::task::JoinError>) -> Result<(), AppError> {
    match result {
        Ok(served) => served.map_err(AppError::from),
        Err(join) => Err(AppError::Server(std::io::Error::other(join))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
