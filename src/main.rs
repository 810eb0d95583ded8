//! Collocation Dash Back binary entrypoint wiring REST, SSE, and score store layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "couch-store")]
use collocation_dash_back::dao::score_store::couchdb::{CouchConfig, CouchScoreStore};
#[cfg(feature = "mongo-store")]
use collocation_dash_back::dao::score_store::mongodb::{MongoConfig, MongoScoreStore};
use collocation_dash_back::{
    config::AppConfig,
    dao::{
        score_store::{ScoreStore, memory::MemoryScoreStore},
        storage::StorageError,
    },
    routes,
    services::{session_reaper, storage_supervisor},
    state::{AppState, SharedState},
};

const SCORE_STORE_ENV: &str = "SCORE_STORE";

/// Score store selected through `SCORE_STORE`.
#[derive(Clone, Copy, Debug)]
enum StoreBackend {
    Memory,
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    let backend = resolve_backend();
    info!(?backend, "using score store backend");
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        connect_store(backend)
    }));
    tokio::spawn(session_reaper::run(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

fn default_backend() -> StoreBackend {
    #[cfg(feature = "mongo-store")]
    {
        StoreBackend::Mongo
    }
    #[cfg(not(feature = "mongo-store"))]
    {
        StoreBackend::Memory
    }
}

fn resolve_backend() -> StoreBackend {
    let Ok(value) = env::var(SCORE_STORE_ENV) else {
        return default_backend();
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "memory" => StoreBackend::Memory,
        #[cfg(feature = "mongo-store")]
        "mongo" | "mongodb" => StoreBackend::Mongo,
        #[cfg(feature = "couch-store")]
        "couch" | "couchdb" => StoreBackend::Couch,
        other => {
            let fallback = default_backend();
            warn!(value = other, ?fallback, "unsupported SCORE_STORE value");
            fallback
        }
    }
}

async fn connect_store(backend: StoreBackend) -> Result<Arc<dyn ScoreStore>, StorageError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryScoreStore::new())),
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            let config = MongoConfig::from_env().await?;
            Ok(Arc::new(MongoScoreStore::connect(config).await?))
        }
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            let config = CouchConfig::from_env()?;
            Ok(Arc::new(CouchScoreStore::connect(config).await?))
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
