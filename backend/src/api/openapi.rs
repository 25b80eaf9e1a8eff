//! OpenAPI document generated from handler annotations via utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

/// Root document; handler modules contribute their own paths and schemas.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Helpdesk API",
        description = "Multi-role support ticketing: tickets, notes, status workflow and dashboards.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "/", description = "Current server")),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and session"),
        (name = "tickets", description = "Tickets, status changes and notes"),
        (name = "dashboard", description = "Role-scoped statistics"),
        (name = "health", description = "Health and readiness checks"),
    ),
    components(schemas(ErrorResponse))
)]
pub struct ApiDoc;

/// Error body returned by every endpoint on failure.
#[derive(serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable code (e.g. "NOT_FOUND", "FORBIDDEN_TRANSITION")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Internal error detail, development only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the merged document.
pub fn build_openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();

    doc.merge(super::handlers::auth::AuthApiDoc::openapi());
    doc.merge(super::handlers::tickets::TicketsApiDoc::openapi());
    doc.merge(super::handlers::dashboard::DashboardApiDoc::openapi());
    doc.merge(super::handlers::health::HealthApiDoc::openapi());
    doc
}
