//! Dashboard handlers.

use axum::{
    extract::{Extension, State},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use crate::api::SharedState;
use crate::error::Result;
use crate::models::session::Session;
use crate::services::dashboard_service::DashboardStats;

pub fn router() -> Router<SharedState> {
    Router::new().route("/stats", get(get_stats))
}

/// Ticket counts for the caller's role
#[utoipa::path(
    get,
    path = "/stats",
    context_path = "/api/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Role-scoped statistics", body = DashboardStats),
        (status = 401, description = "Missing or invalid token", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardStats>> {
    Ok(Json(state.dashboard.stats(&session).await?))
}

#[derive(OpenApi)]
#[openapi(paths(get_stats), components(schemas(DashboardStats)))]
pub struct DashboardApiDoc;
