//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::extract::ApiJson;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::role::Role;
use crate::models::session::Session;
use crate::models::user::UserResponse;
use crate::services::auth_service::LoginCredentials;

/// Public auth routes (rate limited, no token required)
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Protected auth routes (token required)
pub fn protected_router() -> Router<SharedState> {
    Router::new().route("/me", get(me))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Role for this session; defaults to customer
    #[serde(default)]
    pub selected_role: Option<Role>,
    /// Shared secret required for agent and admin
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Create a customer account
#[utoipa::path(
    post,
    path = "/register",
    context_path = "/api/auth",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error", body = crate::api::openapi::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::api::openapi::ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Log in with credentials and an optional elevated role
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/api/auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = crate::api::openapi::ErrorResponse),
        (status = 403, description = "Invalid access code", body = crate::api::openapi::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::api::openapi::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let outcome = state
        .auth
        .login(LoginCredentials {
            email: &payload.email,
            password: &payload.password,
            selected_role: payload.selected_role.unwrap_or_default(),
            access_code: payload.access_code.as_deref(),
        })
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token.token,
        token_type: "Bearer".to_string(),
        expires_in: outcome.token.expires_in,
        user: UserResponse::with_role(&outcome.user, outcome.role),
    }))
}

/// Current account with the session's effective role
#[utoipa::path(
    get,
    path = "/me",
    context_path = "/api/auth",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::openapi::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserResponse>> {
    let user = state.auth.current_user(&session).await?;
    Ok(Json(UserResponse::with_role(&user, session.role)))
}

#[derive(OpenApi)]
#[openapi(
    paths(register, login, me),
    components(schemas(RegisterRequest, LoginRequest, LoginResponse, UserResponse, Role))
)]
pub struct AuthApiDoc;
