//! Application assembly: services wiring plus the route tree.

use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, routing::get, Router};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full application router with in-memory services.
pub fn build_app() -> Router {
    let services = Arc::new(services::build_services());

    Router::new()
        .route("/health", get(health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}

async fn health() -> StatusCode {
    StatusCode::OK
}
