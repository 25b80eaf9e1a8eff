//! Route definitions for the API.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Json, Router};

use super::handlers;
use super::middleware::auth::auth_middleware;
use super::middleware::rate_limit::{rate_limit_middleware, RateLimiter};
use super::middleware::request_id::request_id_middleware;
use super::SharedState;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    // Build the OpenAPI document once at startup
    let openapi = Arc::new(super::openapi::build_openapi());

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route(
            "/api/openapi.json",
            get(move || {
                let openapi = openapi.clone();
                async move { Json(openapi.as_ref().clone()) }
            }),
        )
        .nest("/api", api_routes(state.clone()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn api_routes(state: SharedState) -> Router<SharedState> {
    let auth_service = state.auth.clone();
    let auth_rate_limiter = Arc::new(RateLimiter::new(state.config.login_rate_limit, 60));

    Router::new()
        .nest(
            "/auth",
            handlers::auth::public_router().layer(middleware::from_fn_with_state(
                auth_rate_limiter,
                rate_limit_middleware,
            )),
        )
        .nest(
            "/auth",
            handlers::auth::protected_router().layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/tickets",
            handlers::tickets::router().layer(middleware::from_fn_with_state(
                auth_service.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/dashboard",
            handlers::dashboard::router().layer(middleware::from_fn_with_state(
                auth_service,
                auth_middleware,
            )),
        )
}
