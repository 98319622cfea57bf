//! HTTP server for the status endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use vitals::{Registry, ResponsePolicy};

/// State shared with the status route.
#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
    policy: ResponsePolicy,
}

/// Build the router serving `GET /status`.
pub fn router(registry: Arc<Registry>, policy: ResponsePolicy) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState { registry, policy })
}

/// HTTP server exposing the aggregate status endpoint.
pub struct StatusServer {
    registry: Arc<Registry>,
    policy: ResponsePolicy,
    listen_addr: String,
}

impl StatusServer {
    /// Create a new status server.
    pub fn new(registry: Arc<Registry>, policy: ResponsePolicy, listen_addr: String) -> Self {
        Self {
            registry,
            policy,
            listen_addr,
        }
    }

    /// Run the HTTP server
    pub async fn run(self) -> common::Result<()> {
        info!(listen_addr = %self.listen_addr, "Starting status HTTP server");

        let app = router(self.registry, self.policy);

        let listener = TcpListener::bind(&self.listen_addr).await?;
        info!(listen_addr = %self.listen_addr, "Status server listening");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Handler for the status endpoint.
///
/// Always produces a response: probe failures only ever show up as report
/// data plus the mapped status code, never as an internal server error.
async fn status_handler(State(state): State<AppState>) -> Response {
    let report = state.registry.run_all().await;
    let code = StatusCode::from_u16(state.policy.status_code(report.status))
        .unwrap_or(StatusCode::OK);
    (code, Json(report)).into_response()
}
