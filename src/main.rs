//! trivia-back binary entrypoint wiring configuration, storage, the content provider and REST routes.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, header::HeaderName},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_back::{
    config::{AppConfig, StoreBackend},
    dao::quiz_store::{MemoryQuizStore, QuizStore},
    provider::OpenAiProvider,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    if config.admin_key.is_none() {
        warn!("ADMIN_API_KEY is not set; admin endpoints will reject every request");
    }
    if config.provider.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; quiz generation will fail");
    }

    let store = build_store(&config).await?;
    let provider = OpenAiProvider::new(config.provider.clone()).context("building provider")?;

    let port = config.port;
    let app = build_router(AppState::new(store, Arc::new(provider), config));

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

/// Connect the configured storage backend.
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn QuizStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            warn!("using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryQuizStore::new()))
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            use trivia_back::dao::quiz_store::mongodb::{MongoConfig, MongoQuizStore};

            let mongo_config =
                MongoConfig::from_uri(&config.store.mongo_uri, config.store.mongo_db.as_deref())
                    .await
                    .context("parsing MongoDB settings")?;
            let store = MongoQuizStore::connect(mongo_config)
                .await
                .context("connecting to MongoDB")?;
            info!("connected to MongoDB");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo-store"))]
        StoreBackend::Mongo => {
            anyhow::bail!("MongoDB storage requested but the `mongo-store` feature is disabled")
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    let cors = cors_layer(&state.config().allowed_origins);
    routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Permissive CORS unless explicit origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static("content-type")])
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
