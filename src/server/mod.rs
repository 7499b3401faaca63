//! HTTP surface.
//!
//! All endpoints are `POST` with JSON bodies. Success is 200 with a
//! `result` field; every failure is 400 with `{error, kind}`.

mod error;
mod handlers;
pub mod messages;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use error::ApiError;

use crate::core::pipeline::Pipeline;
use crate::core::remote::Connector;
use crate::error::Result;

/// Shared, immutable request context.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub connector: Arc<dyn Connector>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, connector: Arc<dyn Connector>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            connector,
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/cluster/clone-from-template",
            post(handlers::clone_from_template),
        )
        .route("/api/cluster/state", post(handlers::change_state))
        .route("/api/cluster/profiles", post(handlers::apply_profiles))
        .route("/api/cluster/run-status", post(handlers::run_status))
        .route("/api/clusters", post(handlers::list_clusters))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `listener` until Ctrl-C.
///
/// In-flight requests are allowed to finish on shutdown.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(address = %addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        // Without a signal handler the server runs until killed.
        Err(_) => std::future::pending::<()>().await,
    }
}
