use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::catalog::catalog_router;
use super::reports::reports_router;
use super::session::session_router;
use crate::config::ServerConfig;
use crate::store::SqliteStore;

pub struct AppState {
    pub store: Arc<SqliteStore>,
    /// Lifetime of tokens issued by login.
    pub token_ttl: chrono::Duration,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<SqliteStore>, config: &ServerConfig) -> Self {
        Self {
            store,
            token_ttl: config.token_ttl(),
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", session_router())
        .nest("/api/v1", catalog_router())
        .nest("/api/v1", reports_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
