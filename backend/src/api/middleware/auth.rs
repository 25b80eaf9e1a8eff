//! Authentication middleware.
//!
//! Validates `Authorization: Bearer <jwt>` and inserts the decoded
//! [`Session`] into request extensions for handlers to extract.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::models::session::Session;
use crate::services::auth_service::AuthService;

/// Pull the bearer token out of an `Authorization` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware function - requires a valid token
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(header) => header,
        None => {
            return AppError::Unauthorized("Missing authorization header".to_string())
                .into_response()
        }
    };

    let token = match bearer_token(header) {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Invalid authorization header format".to_string())
                .into_response()
        }
    };

    let session: Session = match auth_service.validate_token(token) {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}
