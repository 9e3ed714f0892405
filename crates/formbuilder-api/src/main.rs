//! Form Builder API server

use formbuilder_api::config::Config;
use formbuilder_api::{build_router, AppState};
use formbuilder_core::{FormService, MemoryStore, PasswordHasher};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load();

    let store = Arc::new(MemoryStore::new());
    let service = FormService::new(store, PasswordHasher::default());
    let state = AppState::new(service);

    let origin = config.cors_origin.as_deref().and_then(|raw| {
        raw.parse()
            .map_err(|_| warn!("Invalid FORMBUILDER_CORS_ORIGIN `{raw}`, allowing any origin"))
            .ok()
    });
    let app = build_router(state, origin);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    info!("Form Builder API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
